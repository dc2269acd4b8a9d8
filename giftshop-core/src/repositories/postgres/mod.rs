// src/repositories/postgres/mod.rs

use std::str::FromStr;

use crate::Error;

pub mod user;
pub mod gift;
pub mod prize;
pub mod purchase;
pub mod task;
pub mod lootbox_task;

/// Decodes one of our TEXT-backed enums, naming the column on failure.
pub(crate) fn parse_column<T>(column: &str, raw: &str) -> Result<T, Error>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>()
        .map_err(|e| Error::Parse(format!("column '{}': {}", column, e)))
}
