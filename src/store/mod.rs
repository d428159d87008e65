//! Repository functions over the redb tables
//!
//! Every operation that reads and then writes runs inside one redb write
//! transaction, so concurrent requests never interleave halfway through an
//! update. Values are JSON strings; see [`crate::database`] for the layout.

pub mod apps;
pub mod records;
pub mod users;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppResult;

fn decode<T: DeserializeOwned>(raw: &str) -> AppResult<T> {
    Ok(serde_json::from_str(raw)?)
}

fn encode<T: Serialize>(value: &T) -> AppResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Exclusive upper bound for keys starting with `prefix`
///
/// `prefix` must end with `':'`; the bound replaces it with the next byte
/// (`';'`), so the range covers exactly the keys with that prefix.
fn prefix_end(prefix: &str) -> String {
    let mut end = prefix.trim_end_matches(':').to_string();
    end.push(';');
    end
}
