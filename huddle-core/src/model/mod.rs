mod payload;
mod peer;
mod room;
mod signaling;

pub use payload::{IceCandidate, SdpType, SessionDescription, SignalPayload};
pub use peer::PeerId;
pub use room::RoomId;
pub use signaling::{ClientEvent, IceServerConfig, ServerEvent};
