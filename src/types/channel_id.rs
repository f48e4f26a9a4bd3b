// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Energy channel identifier.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of one metered circuit on the controller.
///
/// The controller reports channel numbers as JSON integers in some messages
/// and as strings in others, so the identifier is normalized to its string
/// form. Commands send it back as an integer whenever it is numeric.
///
/// # Examples
///
/// ```
/// use niko_energy::types::ChannelId;
///
/// let id = ChannelId::from(3);
/// assert_eq!(id.as_str(), "3");
/// assert_eq!(id.wire_value(), serde_json::json!(3));
///
/// let named = ChannelId::new("meter-a");
/// assert_eq!(named.wire_value(), serde_json::json!("meter-a"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(String);

impl ChannelId {
    /// Creates a channel identifier from its textual form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric channel number, if the identifier is numeric.
    #[must_use]
    pub fn number(&self) -> Option<i64> {
        self.0.trim().parse().ok()
    }

    /// Returns the JSON value used for this channel in outbound commands.
    #[must_use]
    pub fn wire_value(&self) -> serde_json::Value {
        match self.number() {
            Some(n) => serde_json::Value::from(n),
            None => serde_json::Value::from(self.0.clone()),
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ChannelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for ChannelId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<u32> for ChannelId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl From<i32> for ChannelId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for ChannelId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Accepts both `"channel": 3` and `"channel": "3"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawChannelId {
    Int(i64),
    Uint(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for ChannelId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawChannelId::deserialize(deserializer)? {
            RawChannelId::Int(n) => Self(n.to_string()),
            RawChannelId::Uint(n) => Self(n.to_string()),
            RawChannelId::Text(s) => Self(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_from_integer_and_string() {
        let from_int: ChannelId = serde_json::from_str("12").unwrap();
        let from_str: ChannelId = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(from_int, from_str);
        assert_eq!(from_int.as_str(), "12");
    }

    #[test]
    fn deserialize_rejects_other_shapes() {
        assert!(serde_json::from_str::<ChannelId>("null").is_err());
        assert!(serde_json::from_str::<ChannelId>("[1]").is_err());
    }

    #[test]
    fn wire_value_is_numeric_when_possible() {
        assert_eq!(ChannelId::new("7").wire_value(), serde_json::json!(7));
        assert_eq!(ChannelId::new("x7").wire_value(), serde_json::json!("x7"));
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&ChannelId::from(4)).unwrap();
        assert_eq!(json, "\"4\"");
    }

    #[test]
    fn usable_as_map_key() {
        let map: std::collections::BTreeMap<ChannelId, u8> =
            serde_json::from_str(r#"{"1": 1, "2": 2}"#).unwrap();
        assert_eq!(map.get(&ChannelId::from(2)), Some(&2));
    }
}
