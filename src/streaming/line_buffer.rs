//! Line reassembly for upstream SSE bodies

/// Buffer for accumulating incomplete SSE lines across chunk boundaries.
///
/// Network chunks align neither with lines nor with UTF-8 code points, so
/// bytes are held until a `\n` arrives and only complete lines are decoded.
/// A trailing `\r` is stripped so `\r\n` bodies parse the same as `\n` ones.
///
/// # Example
/// ```
/// use chat_relay::streaming::SseLineBuffer;
///
/// let mut buffer = SseLineBuffer::new();
///
/// assert!(buffer.feed(b"data: {\"text\":\"hel").is_empty());
/// assert_eq!(buffer.feed(b"lo\"}\n"), vec!["data: {\"text\":\"hello\"}"]);
/// ```
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the buffer and return any complete, non-empty lines.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let mut line = &self.pending[start..end];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            // blank lines only separate events
            if !line.is_empty() {
                lines.push(String::from_utf8_lossy(line).into_owned());
            }
            start = end + 1;
        }
        self.pending.drain(..start);

        lines
    }

    /// Flush whatever is left once the body has ended.
    ///
    /// Some servers omit the final newline; the remainder is returned as a
    /// last line if it is not blank.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let text = String::from_utf8_lossy(&rest);
        let text = text.trim_end_matches(&['\r', '\n'][..]);
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}
