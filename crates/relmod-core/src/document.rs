//! Config document reading and parsing.
//!
//! The mod config is JSON with comment support: `//` line comments and
//! `/* */` block comments are allowed anywhere outside string literals. A
//! stripping pre-pass blanks them out (preserving newlines so serde_json
//! error positions stay meaningful), then the text parses into a
//! [`serde_json::Value`] tree.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// Read the whole config file in one blocking call.
pub fn read_document(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    debug!("read {} bytes from {}", text.len(), path.display());
    Ok(text)
}

/// Parse comment-stripped text into a document tree.
pub fn parse_document(text: &str) -> Result<Value> {
    let stripped = strip_comments(text);
    Ok(serde_json::from_str(&stripped)?)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Code,
    Str,
    LineComment,
    BlockComment,
}

/// Blank out `//` and `/* */` comments outside string literals.
///
/// Comment bytes become spaces and newlines are kept, so byte/line positions
/// reported by the JSON parser still point at the user's text.
pub fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = bytes.to_vec();
    let mut state = State::Code;
    let mut pos = 0;

    while pos < bytes.len() {
        match state {
            State::Code => {
                // Hop to the next byte that can change state.
                let Some(rel) = memchr::memchr2(b'"', b'/', &bytes[pos..]) else {
                    break;
                };
                pos += rel;
                if bytes[pos] == b'"' {
                    state = State::Str;
                    pos += 1;
                } else if bytes.get(pos + 1) == Some(&b'/') {
                    state = State::LineComment;
                    out[pos] = b' ';
                    out[pos + 1] = b' ';
                    pos += 2;
                } else if bytes.get(pos + 1) == Some(&b'*') {
                    state = State::BlockComment;
                    out[pos] = b' ';
                    out[pos + 1] = b' ';
                    pos += 2;
                } else {
                    // A lone '/' is a JSON syntax error; leave it for the parser.
                    pos += 1;
                }
            }
            State::Str => {
                let Some(rel) = memchr::memchr2(b'"', b'\\', &bytes[pos..]) else {
                    break;
                };
                pos += rel;
                if bytes[pos] == b'\\' {
                    pos += 2; // skip the escaped byte
                } else {
                    state = State::Code;
                    pos += 1;
                }
            }
            State::LineComment => {
                let Some(rel) = memchr::memchr(b'\n', &bytes[pos..]) else {
                    blank_to_end(&mut out, pos);
                    break;
                };
                blank_range(&mut out, pos, pos + rel);
                state = State::Code;
                pos += rel + 1;
            }
            State::BlockComment => {
                let Some(rel) = memchr::memchr(b'*', &bytes[pos..]) else {
                    blank_to_end(&mut out, pos);
                    break;
                };
                blank_range(&mut out, pos, pos + rel);
                if bytes.get(pos + rel + 1) == Some(&b'/') {
                    out[pos + rel] = b' ';
                    out[pos + rel + 1] = b' ';
                    state = State::Code;
                    pos += rel + 2;
                } else {
                    out[pos + rel] = b' ';
                    pos += rel + 1;
                }
            }
        }
    }

    // Comment bytes were replaced with ASCII spaces, never split UTF-8.
    String::from_utf8(out).expect("comment stripping produced invalid utf-8")
}

fn blank_range(out: &mut [u8], start: usize, end: usize) {
    for byte in &mut out[start..end] {
        if *byte != b'\n' {
            *byte = b' ';
        }
    }
}

fn blank_to_end(out: &mut [u8], start: usize) {
    let end = out.len();
    blank_range(out, start, end);
}
