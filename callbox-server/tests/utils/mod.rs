pub mod signal_helpers;

pub use mock_signaling::*;
pub use signal_helpers::*;
pub use ws_client::*;
