pub mod admin;
pub mod auth;
pub mod catalogue;
pub mod profile;
pub mod routes;
pub mod status;
pub mod utils;

pub use routes::{Router, build_api_router};
