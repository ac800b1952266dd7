/// Tower middleware module
///
/// Layers wrapped around the router service in the connection loop.
pub mod tower_timeout_handler;

pub use tower_timeout_handler::{TimeoutLayer, TimeoutService};
