mod signal_relay;
mod ws_handler;

pub use signal_relay::*;
pub use ws_handler::*;
