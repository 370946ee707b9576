//! Fixed-capacity text building for log fields.
use std::fmt;

/// Append-only string with a hard byte capacity.
///
/// Input past the capacity is cut at the last whole character and further
/// appends are ignored. Control characters are replaced with spaces so a
/// field always renders on one line.
#[derive(Debug, Clone)]
pub struct BoundedText {
    buf: String,
    cap: usize,
    truncated: bool,
}

impl BoundedText {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: String::with_capacity(cap),
            cap,
            truncated: false,
        }
    }

    pub fn push_str(&mut self, s: &str) -> &mut Self {
        for ch in s.chars() {
            if self.truncated {
                break;
            }
            self.push_char(ch);
        }
        self
    }

    fn push_char(&mut self, ch: char) {
        let ch = if ch.is_control() { ' ' } else { ch };
        if self.buf.len() + ch.len_utf8() > self.cap {
            self.truncated = true;
        } else {
            self.buf.push(ch);
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

impl fmt::Write for BoundedText {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // Truncation is the policy, not an error.
        self.push_str(s);
        Ok(())
    }
}

/// One-shot helper: `s` cut to at most `cap` bytes.
pub fn bounded(s: &str, cap: usize) -> String {
    let mut t = BoundedText::with_capacity(cap);
    t.push_str(s);
    t.finish()
}
