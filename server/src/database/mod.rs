pub mod create;
pub mod error;
pub mod plans;
pub mod products;
pub mod ratings;
pub mod recipes;
pub mod usage;
pub mod users;

pub use create::{open_database, open_in_memory};
pub use error::{DbError, DbResult};

#[cfg(test)]
pub(crate) mod fixtures;
