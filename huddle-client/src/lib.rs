mod directory;
mod engine;
mod error;
mod media;
mod negotiation;

pub use directory::*;
pub use engine::*;
pub use error::*;
pub use media::*;
pub use negotiation::*;
