pub mod headers;
pub mod json_response;
pub mod request;

pub use headers::*;
pub use json_response::*;
pub use request::*;
