//! Request line parsing and grammar validation
//!
//! The only input the server looks at is the first line of whatever bytes
//! arrived. Headers are never parsed. The whole line must match
//!
//! ```text
//! GET <one or more spaces><zero or more /segments><spaces>HTTP/<digit>.<digit>[CR/LF...]
//! ```
//!
//! where a segment is made of ASCII letters, digits, `_`, `-` and `.`.
//! Dots are allowed anywhere in a segment, so `/a/../b` passes the grammar.
//! Nothing here guards against escaping the document root.

use core::fmt;
use std::sync::OnceLock;

use regex::bytes::Regex;

/// The single supported method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
}

/// Protocol version digits from `HTTP/<major>.<minor>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

/// A request line that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    /// Raw target, concatenated onto the document root as-is
    pub target: String,
    pub version: Version,
}

impl RequestLine {
    /// Parse and validate the first line of `received`
    pub fn parse(received: &[u8]) -> Result<Self, RequestError> {
        let line = first_line(received);
        let split = split_request_line(line);
        let version = validate(line)?;
        Self::from_parts(split.target, version)
    }

    fn from_parts(target: &[u8], version: Version) -> Result<Self, RequestError> {
        let target = std::str::from_utf8(target).map_err(|_| RequestError::Grammar)?;
        Ok(Self {
            method: Method::Get,
            target: target.to_string(),
            version,
        })
    }
}

/// Method and target tokens, before validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLine<'a> {
    pub method: &'a [u8],
    pub target: &'a [u8],
}

/// Why a request line was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// Nothing was received
    Empty,
    /// The line does not match the request grammar
    Grammar,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Empty => write!(f, "empty request"),
            RequestError::Grammar => write!(f, "malformed request line"),
        }
    }
}

impl std::error::Error for RequestError {}

/// Bytes up to (not including) the first LF, or everything if there is none
pub fn first_line(received: &[u8]) -> &[u8] {
    match received.iter().position(|&b| b == b'\n') {
        Some(end) => &received[..end],
        None => received,
    }
}

/// Split on the first two space characters
///
/// The target is whatever sits between them, so a doubled space after the
/// method yields an empty target.
pub fn split_request_line(line: &[u8]) -> SplitLine<'_> {
    let mut tokens = line.splitn(3, |&b| b == b' ');
    let method = tokens.next().unwrap_or_default();
    let target = tokens.next().unwrap_or_default();
    SplitLine { method, target }
}

fn grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^GET (?: *(?:/[A-Za-z0-9_.\-]*)*) *HTTP/([0-9])\.([0-9])[\r\n]*$")
            .expect("Failed to compile request grammar")
    })
}

/// Match the whole line against the request grammar
pub fn validate(line: &[u8]) -> Result<Version, RequestError> {
    if line.is_empty() {
        return Err(RequestError::Empty);
    }
    let caps = grammar().captures(line).ok_or(RequestError::Grammar)?;
    let digit = |i: usize| caps.get(i).map(|m| m.as_bytes()[0] - b'0');
    match (digit(1), digit(2)) {
        (Some(major), Some(minor)) => Ok(Version { major, minor }),
        _ => Err(RequestError::Grammar),
    }
}
