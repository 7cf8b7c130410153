//! Best-effort text decoding of received chunks.
//!
//! The remote sends whatever bytes it likes and a bounded read can cut a
//! multi-byte code point in half. The decoder holds such a trailing
//! fragment back until the next chunk and replaces genuinely invalid
//! sequences with U+FFFD.

use std::char::REPLACEMENT_CHARACTER;
use std::fmt;

use thiserror::Error;

/// Invalid UTF-8 seen in one decoded chunk.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// Byte offset of the first invalid sequence, counting carried-over bytes.
    pub offset: usize,
    /// Number of invalid sequences replaced in this chunk.
    pub invalid: usize,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received {} invalid UTF-8 sequence(s), first at byte {}",
            self.invalid, self.offset
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub error: Option<DecodeError>,
}

#[derive(Debug, Default)]
pub struct TextDecoder {
    pending: Vec<u8>,
}

impl TextDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of an incomplete code point waiting for the next chunk.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    pub fn decode(&mut self, chunk: &[u8]) -> Decoded {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut text = String::with_capacity(bytes.len());
        let mut error: Option<DecodeError> = None;
        let mut rest = &bytes[..];
        let mut offset = 0;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    let (valid, _) = rest.split_at(valid_up_to);
                    text.push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match e.error_len() {
                        None => {
                            self.pending = rest[valid_up_to..].to_vec();
                            break;
                        }
                        Some(len) => {
                            text.push(REPLACEMENT_CHARACTER);
                            let err = error.get_or_insert(DecodeError {
                                offset: offset + valid_up_to,
                                invalid: 0,
                            });
                            err.invalid += 1;
                            rest = &rest[valid_up_to + len..];
                            offset += valid_up_to + len;
                        }
                    }
                }
            }
        }

        Decoded { text, error }
    }

    /// Flushes a code point left incomplete by the end of the stream as a
    /// single U+FFFD. Empty when nothing is pending.
    pub fn finish(&mut self) -> Decoded {
        if self.pending.is_empty() {
            return Decoded {
                text: String::new(),
                error: None,
            };
        }
        self.pending.clear();
        Decoded {
            text: REPLACEMENT_CHARACTER.to_string(),
            error: Some(DecodeError {
                offset: 0,
                invalid: 1,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_plain_text_through() {
        let mut decoder = TextDecoder::new();
        let decoded = decoder.decode(b"ping\n");
        assert_eq!(decoded.text, "ping\n");
        assert_eq!(decoded.error, None);
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn holds_a_split_code_point_for_the_next_chunk() {
        let euro = "€".as_bytes();
        let mut decoder = TextDecoder::new();

        let first = decoder.decode(&[b'a', euro[0], euro[1]]);
        assert_eq!(first.text, "a");
        assert_eq!(first.error, None);
        assert_eq!(decoder.pending(), &euro[..2]);

        let second = decoder.decode(&[euro[2], b'b']);
        assert_eq!(second.text, "€b");
        assert_eq!(second.error, None);
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn replaces_invalid_bytes_and_reports_them() {
        let mut decoder = TextDecoder::new();
        let decoded = decoder.decode(b"ok\xffthen\xfe!");
        assert_eq!(decoded.text, "ok\u{FFFD}then\u{FFFD}!");
        assert_eq!(
            decoded.error,
            Some(DecodeError {
                offset: 2,
                invalid: 2
            })
        );
    }

    #[test]
    fn finish_reports_a_truncated_code_point() {
        let mut decoder = TextDecoder::new();
        assert_eq!(decoder.decode(b"abc\xe2\x82").text, "abc");

        let tail = decoder.finish();
        assert_eq!(tail.text, "\u{FFFD}");
        assert_eq!(
            tail.error,
            Some(DecodeError {
                offset: 0,
                invalid: 1
            })
        );
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn finish_is_empty_after_complete_text() {
        let mut decoder = TextDecoder::new();
        decoder.decode("done €".as_bytes());
        let tail = decoder.finish();
        assert!(tail.text.is_empty());
        assert_eq!(tail.error, None);
    }

    #[test]
    fn invalid_bytes_do_not_poison_the_next_chunk() {
        let mut decoder = TextDecoder::new();
        assert!(decoder.decode(b"\xc3(").error.is_some());

        let decoded = decoder.decode(b"fine");
        assert_eq!(decoded.text, "fine");
        assert_eq!(decoded.error, None);
    }
}
