// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound message interpretation.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ProtocolError;
use crate::types::{ChannelId, ChannelSample};

/// Event name carrying live wattage.
const LIVE_EVENT: &str = "getlive";

/// A decoded message from the controller.
///
/// Only live power events are interpreted. Everything else is kept as
/// [`InboundEvent::Other`] so newer controller firmware does not break the
/// session.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// `{"event":"getlive","data":{"channel":..,"v":..}}`
    Live(ChannelSample),
    /// Any other message shape.
    Other,
}

impl InboundEvent {
    /// Interprets a decoded JSON object.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` when a `getlive` event lacks its channel or
    /// wattage, or the wattage is not a number (for example `"v": null`).
    ///
    /// # Examples
    ///
    /// ```
    /// use niko_energy::protocol::InboundEvent;
    /// use niko_energy::types::ChannelSample;
    ///
    /// let msg = serde_json::json!({"event": "getlive", "data": {"channel": 2, "v": 80}});
    /// assert_eq!(
    ///     InboundEvent::parse(&msg).unwrap(),
    ///     InboundEvent::Live(ChannelSample::new(2, 80.0)),
    /// );
    ///
    /// let other = serde_json::json!({"event": "systeminfo", "data": {}});
    /// assert_eq!(InboundEvent::parse(&other).unwrap(), InboundEvent::Other);
    /// ```
    pub fn parse(message: &Value) -> Result<Self, ProtocolError> {
        if message.get("event").and_then(Value::as_str) != Some(LIVE_EVENT) {
            return Ok(Self::Other);
        }

        let data = message
            .get("data")
            .ok_or_else(|| ProtocolError::MissingField("data".to_string()))?;

        let channel = match data.get("channel") {
            None | Some(Value::Null) => {
                return Err(ProtocolError::MissingField("data.channel".to_string()));
            }
            Some(raw) => ChannelId::deserialize(raw)?,
        };
        let raw = data
            .get("v")
            .ok_or_else(|| ProtocolError::MissingField("data.v".to_string()))?;
        let watts = raw.as_f64().ok_or_else(|| ProtocolError::InvalidValue {
            field: "data.v".to_string(),
            message: format!("expected a number, got {raw}"),
        })?;

        Ok(Self::Live(ChannelSample { channel, watts }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_string_channel() {
        let msg = json!({"event": "getlive", "data": {"channel": "3", "v": 12.5}});
        assert_eq!(
            InboundEvent::parse(&msg).unwrap(),
            InboundEvent::Live(ChannelSample::new(3, 12.5))
        );
    }

    #[test]
    fn ignores_other_events() {
        for msg in [
            json!({"event": "systeminfo"}),
            json!({"cmd": "getlive", "data": []}),
            json!({"data": {"channel": 1, "v": 1}}),
            json!({"event": 5}),
        ] {
            assert_eq!(InboundEvent::parse(&msg).unwrap(), InboundEvent::Other);
        }
    }

    #[test]
    fn null_wattage_is_rejected() {
        let msg = json!({"event": "getlive", "data": {"channel": 1, "v": null}});
        let err = InboundEvent::parse(&msg).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidValue { .. }));
    }

    #[test]
    fn string_wattage_is_rejected() {
        let msg = json!({"event": "getlive", "data": {"channel": 1, "v": "12"}});
        assert!(InboundEvent::parse(&msg).is_err());
    }

    #[test]
    fn missing_fields_are_reported() {
        let no_data = json!({"event": "getlive"});
        let no_channel = json!({"event": "getlive", "data": {"v": 3}});
        let no_watts = json!({"event": "getlive", "data": {"channel": 1}});

        assert!(matches!(
            InboundEvent::parse(&no_data),
            Err(ProtocolError::MissingField(field)) if field == "data"
        ));
        assert!(matches!(
            InboundEvent::parse(&no_channel),
            Err(ProtocolError::MissingField(field)) if field == "data.channel"
        ));
        assert!(matches!(
            InboundEvent::parse(&no_watts),
            Err(ProtocolError::MissingField(field)) if field == "data.v"
        ));
    }

    #[test]
    fn non_object_data_is_rejected() {
        let msg = json!({"event": "getlive", "data": [1, 2]});
        assert!(matches!(
            InboundEvent::parse(&msg),
            Err(ProtocolError::MissingField(_))
        ));
    }

    #[test]
    fn unusable_channel_is_rejected() {
        let msg = json!({"event": "getlive", "data": {"channel": [1], "v": 3}});
        assert!(matches!(
            InboundEvent::parse(&msg),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn negative_wattage_is_accepted() {
        let msg = json!({"event": "getlive", "data": {"channel": 1, "v": -40}});
        assert_eq!(
            InboundEvent::parse(&msg).unwrap(),
            InboundEvent::Live(ChannelSample::new(1, -40.0))
        );
    }
}
