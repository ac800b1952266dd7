use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// Classified storage failure.
///
/// Constraint violations are mapped to the domain variant they stand for at
/// the call site (a foreign-key failure while inserting recipe lines means a
/// product is missing; the same failure while deleting a product means it is
/// still in use).  Anything else stays `Sqlx` and is reported as the store
/// being unavailable.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("referenced {0} does not exist")]
    MissingDependency(&'static str),

    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("{0} is still in use")]
    InUse(&'static str),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Map a foreign-key violation to `on_fk`; any other error passes through.
pub(crate) fn on_foreign_key(e: sqlx::Error, on_fk: DbError) -> DbError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_foreign_key_violation() {
            return on_fk;
        }
    }
    DbError::Sqlx(e)
}

/// Map a unique/primary-key violation to `Duplicate(entity)`.
pub(crate) fn on_unique(e: sqlx::Error, entity: &'static str) -> DbError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return DbError::Duplicate(entity);
        }
    }
    DbError::Sqlx(e)
}

/// Parse a TEXT column that holds an id or enum value.
pub(crate) fn parse_column<T: FromStr>(column: &str, raw: &str) -> DbResult<T> {
    raw.parse()
        .map_err(|_| DbError::Corrupt(format!("{column} = {raw:?}")))
}

pub(crate) fn parse_decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    parse_column::<Decimal>(column, raw)
}
