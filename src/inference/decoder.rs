//! Line decoder for the chat stream.
//!
//! Network reads land at arbitrary byte boundaries, including in the middle
//! of a line or a multi-byte UTF-8 sequence. The decoder buffers raw bytes
//! and only hands out complete `\n`-terminated lines, so the event sequence
//! is the same no matter how the body was chunked.

use log::{debug, warn};

use super::types::{RawEvent, StreamEvent};

#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line it completed.
    /// The trailing partial line stays buffered.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..pos]).into_owned());
        }
        lines
    }

    /// Returns whatever is left once the source has ended, if anything.
    pub fn finish(self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.buffer).into_owned();
        if rest.trim().is_empty() { None } else { Some(rest) }
    }
}

/// Parses one line into a wire record.
///
/// Blank lines and SSE comments (`: heartbeat`) yield `None` silently.
/// Lines that are not valid JSON are logged and dropped.
pub fn parse_line(line: &str) -> Option<RawEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.starts_with(':') {
        debug!("SSE comment: {}", line);
        return None;
    }

    let data = line.strip_prefix("data:").map(str::trim_start).unwrap_or(line);
    match serde_json::from_str::<RawEvent>(data) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Failed to parse stream line ({}): {}", e, line);
            None
        }
    }
}

/// Convenience: decode a line straight into typed events.
pub fn decode_line(line: &str) -> Vec<StreamEvent> {
    parse_line(line)
        .map(RawEvent::into_events)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "data: {\"type\":\"start_response\"}\n\
                        \n\
                        data: {\"chunk\":\"Héllo \"}\n\
                        : heartbeat\n\
                        data: {\"chunk\":\"wörld\"}\n\
                        data: {\"done\":true}";

    fn decode_all(chunks: &[&[u8]]) -> Vec<StreamEvent> {
        let mut decoder = LineDecoder::new();
        let mut events = Vec::new();
        for chunk in chunks {
            for line in decoder.push(chunk) {
                events.extend(decode_line(&line));
            }
        }
        if let Some(rest) = decoder.finish() {
            events.extend(decode_line(&rest));
        }
        events
    }

    #[test]
    fn test_single_chunk() {
        let events = decode_all(&[BODY.as_bytes()]);
        assert_eq!(
            events,
            vec![
                StreamEvent::StartResponse,
                StreamEvent::Chunk("Héllo ".into()),
                StreamEvent::Chunk("wörld".into()),
                StreamEvent::Done,
            ]
        );
    }

    #[test]
    fn test_every_split_point_matches_single_chunk() {
        let bytes = BODY.as_bytes();
        let expected = decode_all(&[bytes]);
        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(decode_all(&[a, b]), expected, "split at byte {split}");
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let bytes = BODY.as_bytes();
        let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(decode_all(&chunks), decode_all(&[bytes]));
    }

    #[test]
    fn test_partial_line_stays_buffered() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"data: {\"chu").is_empty());
        let lines = decoder.push(b"nk\":\"x\"}\ndata: {");
        assert_eq!(lines, vec!["data: {\"chunk\":\"x\"}".to_string()]);
        assert_eq!(decoder.finish().as_deref(), Some("data: {"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let events = decode_all(&[b"data: {\"chunk\":\"a\"}\r\ndata: {\"done\":true}\r\n"]);
        assert_eq!(events, vec![StreamEvent::Chunk("a".into()), StreamEvent::Done]);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let body = b"data: {\"chunk\":\"a\"}\ndata: {not json\ngarbage\ndata: {\"chunk\":\"b\"}\n";
        assert_eq!(
            decode_all(&[body]),
            vec![StreamEvent::Chunk("a".into()), StreamEvent::Chunk("b".into())]
        );
    }

    #[test]
    fn test_line_without_data_prefix_still_parses() {
        assert_eq!(decode_line("{\"chunk\":\"z\"}"), vec![StreamEvent::Chunk("z".into())]);
    }

    #[test]
    fn test_finish_ignores_whitespace() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"data: {\"done\":true}\n  ");
        assert!(decoder.finish().is_none());
    }
}
