//! Wire-compatible message schemas exchanged with grid clients and the
//! configuration store.
//!
//! All types use camelCase field names to match the JSON the browser renderer
//! sends and expects.

pub mod config;
pub mod request;
pub mod response;

pub use config::{ConfigField, ConfigRecord};
pub use request::{GridRequest, RequestError, SessionState};
pub use response::{GridResponse, MetaData, StateSource, StateSources};

use serde::{Deserialize, Deserializer};

/// Deserializes a map-like field that older clients and stored records send as
/// an empty JSON array (`[]`) when it has no entries.
///
/// An empty array or `null` yields `T::default()`; anything else is decoded as `T`.
/// Relies on serde_json's `preserve_order` so ordered maps keep their key order.
pub(crate) fn empty_list_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    match raw {
        serde_json::Value::Null => Ok(T::default()),
        serde_json::Value::Array(ref items) if items.is_empty() => Ok(T::default()),
        other => T::deserialize(other).map_err(serde::de::Error::custom),
    }
}

/// Accepts integers sent either as JSON numbers or as numeric strings.
/// Unparseable values are treated as absent.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
