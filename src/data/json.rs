//! JSON emission helpers

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Serialize data structure to a pretty JSON string
pub fn to_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data).context("Failed to serialize to JSON")
}

/// Deserialize JSON bytes to data structure
pub fn from_json_slice<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).context("Failed to deserialize JSON")
}
