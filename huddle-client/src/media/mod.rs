mod media_capability;
mod webrtc_media;

pub use media_capability::*;
pub use webrtc_media::*;
