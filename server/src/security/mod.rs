pub mod gate;
pub mod password;
pub mod token;

pub use gate::{Access, authenticate};
pub use password::{hash_password, verify_password};
pub use token::{Identity, TokenCodec, TokenError};
