//! Serde support for partial updates.
//!
//! A patch field of type `Option<Option<T>>` distinguishes three states:
//! absent (`None`, leave the column alone), explicit `null` (`Some(None)`,
//! clear the column) and a value (`Some(Some(v))`). Use it as
//!
//! ```ignore
//! #[serde(default, deserialize_with = "ironlog_types::patch::nullable")]
//! pub notes: Option<Option<String>>,
//! ```

use serde::{Deserialize, Deserializer};

/// Deserializes a present field (possibly `null`) into `Some(..)`.
///
/// Absent fields never reach this function; `#[serde(default)]` fills them
/// with `None`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
