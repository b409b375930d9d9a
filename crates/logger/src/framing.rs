//! Line framing and decoding for raw serial input
//!
//! Bytes arrive in arbitrary chunks; lines are framed on `\n` with a
//! carry-over buffer so a line split across reads is reassembled. Control
//! characters (0-31, 255) are stripped before decoding, matching what the
//! AT1 meters emit between records.

/// Accumulates raw chunks and yields complete, cleaned lines
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of raw bytes; returns every line completed by it
    ///
    /// Empty lines (after cleaning) are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(i) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=i).collect();
            if let Some(line) = decode_line(&raw) {
                lines.push(line);
            }
        }
        lines
    }

    /// Bytes held for the next chunk
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Strip control characters and decode lossily as UTF-8
///
/// Returns `None` when nothing printable remains.
#[must_use]
pub fn decode_line(raw: &[u8]) -> Option<String> {
    let cleaned: Vec<u8> = raw
        .iter()
        .copied()
        .filter(|&b| (32..255).contains(&b))
        .collect();
    let line = String::from_utf8_lossy(&cleaned).trim().to_string();
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_line_split_across_chunks() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"$AT1A,123").is_empty());
        assert_eq!(framer.pending(), 9);
        let lines = framer.push(b",456\r\n$AT1A,789");
        assert_eq!(lines, vec!["$AT1A,123,456".to_string()]);
        assert_eq!(framer.pending(), 9);
    }

    #[test]
    fn yields_multiple_lines_from_one_chunk() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"one\r\ntwo\r\nthree\r\n");
        assert_eq!(lines, vec!["one", "two", "three"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn strips_control_characters() {
        assert_eq!(decode_line(b"\x00\x01data\x07line\r\n"), Some("dataline".to_string()));
        assert_eq!(decode_line(b"\xffdata\xff\n"), Some("data".to_string()));
    }

    #[test]
    fn blank_lines_are_dropped() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"\r\n\r\n\n").is_empty());
        assert_eq!(decode_line(b"\r\n"), None);
    }
}
