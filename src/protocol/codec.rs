// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line-buffered JSON decoding.

use serde_json::Value;

use crate::error::ProtocolError;

/// Longest partial line kept between reads.
///
/// Once a line grows past this without a newline it is dropped, along with
/// the rest of it up to the next newline.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Splits a byte stream into newline-delimited JSON objects.
///
/// Reads from the socket may end anywhere, including inside a message, and
/// one read may carry several messages. The codec keeps the trailing partial
/// line between calls so every complete line is decoded exactly once.
///
/// Lines are trimmed; empty lines and lines not starting with `{` are
/// skipped. A line that is not UTF-8 or fails to parse is logged and
/// dropped without affecting its neighbours. A partial line longer than
/// [`MAX_LINE_BYTES`] is dropped as well.
///
/// # Examples
///
/// ```
/// use niko_energy::protocol::LineCodec;
///
/// let mut codec = LineCodec::new();
/// let first = codec.feed(b"{\"event\":\"getlive\",\"data\":{\"channel\":1,\"v\":120}}\n{\"event\":\"get");
/// assert_eq!(first.len(), 1);
///
/// let second = codec.feed(b"live\",\"data\":{\"channel\":2,\"v\":80}}\n");
/// assert_eq!(second.len(), 1);
/// assert!(codec.remainder().is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct LineCodec {
    pending: Vec<u8>,
    /// Skipping the tail of an oversized line.
    discarding: bool,
}

impl LineCodec {
    /// Creates a codec with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `data` and returns every JSON object completed by it.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Value> {
        let mut data = data;
        if self.discarding {
            let Some(end) = data.iter().position(|b| *b == b'\n') else {
                return Vec::new();
            };
            self.discarding = false;
            data = &data[end + 1..];
        }

        // Only the new bytes can hold a newline the buffer has not seen.
        let scanned = self.pending.len();
        self.pending.extend_from_slice(data);
        let messages = match data.iter().rposition(|b| *b == b'\n') {
            Some(last_newline) => {
                let complete: Vec<u8> = self.pending.drain(..=scanned + last_newline).collect();
                complete.split(|b| *b == b'\n').filter_map(decode_or_warn).collect()
            }
            None => Vec::new(),
        };

        if self.pending.len() > MAX_LINE_BYTES {
            let err = ProtocolError::LineTooLong {
                limit: MAX_LINE_BYTES,
            };
            tracing::warn!(error = %err, buffered = self.pending.len(), "Dropping oversized line");
            self.pending.clear();
            self.discarding = true;
        }

        messages
    }

    /// Returns the buffered bytes of the current incomplete line.
    #[must_use]
    pub fn remainder(&self) -> &[u8] {
        &self.pending
    }

    /// Discards any buffered partial line.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.discarding = false;
    }
}

fn decode_or_warn(line: &[u8]) -> Option<Value> {
    match decode_line(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                error = %e,
                line = %String::from_utf8_lossy(line).trim(),
                "Dropping undecodable line"
            );
            None
        }
    }
}

/// Decodes one line.
///
/// Returns `Ok(None)` for lines that are skipped without being an error.
fn decode_line(line: &[u8]) -> Result<Option<Value>, ProtocolError> {
    let text = std::str::from_utf8(line)?.trim();
    if !text.starts_with('{') {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(text)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_single_line() {
        let mut codec = LineCodec::new();
        let messages = codec.feed(b"{\"a\":1}\n");
        assert_eq!(messages, vec![json!({"a": 1})]);
        assert!(codec.remainder().is_empty());
    }

    #[test]
    fn keeps_partial_line_until_completed() {
        let mut codec = LineCodec::new();
        assert!(codec.feed(b"{\"a\":").is_empty());
        assert_eq!(codec.remainder(), b"{\"a\":");

        let messages = codec.feed(b"2}\r\n");
        assert_eq!(messages, vec![json!({"a": 2})]);
    }

    #[test]
    fn split_across_reads_yields_each_message_once() {
        let mut codec = LineCodec::new();
        let first =
            codec.feed(b"{\"event\":\"getlive\",\"data\":{\"channel\":1,\"v\":120}}\n{\"event\":\"get");
        let second = codec.feed(b"live\",\"data\":{\"channel\":2,\"v\":80}}\n");

        assert_eq!(first.len(), 1);
        assert_eq!(first[0]["data"]["channel"], json!(1));
        assert_eq!(second.len(), 1);
        assert_eq!(second[0]["data"]["channel"], json!(2));
    }

    #[test]
    fn malformed_line_does_not_affect_neighbours() {
        let mut codec = LineCodec::new();
        let messages = codec.feed(b"{\"a\":1}\nnot json\n{\"broken\":\n{\"b\":2}\n");
        assert_eq!(messages, vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[test]
    fn skips_blank_and_non_object_lines() {
        let mut codec = LineCodec::new();
        let messages = codec.feed(b"\r\n   \n[1,2]\nOK\n{\"c\":3}\n");
        assert_eq!(messages, vec![json!({"c": 3})]);
    }

    #[test]
    fn multiple_messages_in_one_read() {
        let mut codec = LineCodec::new();
        let messages = codec.feed(b"{\"n\":1}\r\n{\"n\":2}\r\n{\"n\":3}\r\n{\"n\":");
        assert_eq!(messages.len(), 3);
        assert_eq!(codec.remainder(), b"{\"n\":");
    }

    #[test]
    fn invalid_utf8_line_is_dropped() {
        let mut codec = LineCodec::new();
        let messages = codec.feed(b"{\"a\":\"\xff\xfe\"}\n{\"b\":2}\n");
        assert_eq!(messages, vec![json!({"b": 2})]);
    }

    #[test]
    fn invalid_utf8_is_a_protocol_error() {
        assert!(matches!(
            decode_line(b"{\"a\":\"\xc3\"}"),
            Err(ProtocolError::Utf8(_))
        ));
    }

    #[test]
    fn oversized_line_is_dropped_up_to_next_newline() {
        let mut codec = LineCodec::new();
        let chunk = vec![b'x'; 16 * 1024];

        assert!(codec.feed(b"{\"big\":\"").is_empty());
        for _ in 0..8 {
            assert!(codec.feed(&chunk).is_empty());
            assert!(codec.remainder().len() <= MAX_LINE_BYTES);
        }

        // The tail of the dropped line is skipped, the next line survives.
        let messages = codec.feed(b"xxxx\"}\n{\"after\":1}\n");
        assert_eq!(messages, vec![json!({"after": 1})]);
        assert!(codec.remainder().is_empty());
    }

    #[test]
    fn line_at_the_limit_is_kept() {
        let mut codec = LineCodec::new();
        let mut line = b"{\"pad\":\"".to_vec();
        line.resize(MAX_LINE_BYTES - 2, b'y');
        line.extend_from_slice(b"\"}");
        assert_eq!(line.len(), MAX_LINE_BYTES);

        assert!(codec.feed(&line).is_empty());
        assert_eq!(codec.remainder().len(), MAX_LINE_BYTES);

        let messages = codec.feed(b"\n");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["pad"].as_str().unwrap().len(), MAX_LINE_BYTES - 10);
    }

    #[test]
    fn newline_in_earlier_buffer_is_not_rescanned() {
        let mut codec = LineCodec::new();
        assert!(codec.feed(b"{\"a\":").is_empty());
        assert!(codec.feed(b"1").is_empty());
        assert_eq!(codec.feed(b"}\n{\"b\"").len(), 1);
        assert_eq!(codec.remainder(), b"{\"b\"");
    }

    #[test]
    fn clear_drops_partial_line() {
        let mut codec = LineCodec::new();
        codec.feed(b"{\"partial\":");
        codec.clear();
        assert!(codec.feed(b"}\n").is_empty());
    }
}
