//! Per-connection request handling
//!
//! One request, one response, no keep-alive:
//!
//! ```text
//! AwaitRequest -> Parse -> Validate -> Resolve -+-> ServeFile --------+
//!                              |                +-> ServeDirectory ---+-> Respond
//!                              |                +-> NotFound ---------+
//!                              +--------------------> BadRequest -----+
//! ```
//!
//! ServeDirectory re-enters ServeFile when the directory holds an
//! `index.html`. Malformed requests and missing paths become 400/404
//! responses; only a failing receive or send escapes as an error. The
//! handler borrows the connection and never closes it; that is the
//! worker's job.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ServeError, ServeResult};
use crate::fs::FileSystem;
use crate::mime;
use crate::request::{self, RequestError, RequestLine};
use crate::response::Response;
use crate::transport::Connection;

/// Name served in place of a directory listing
pub const INDEX_FILE: &str = "index.html";

/// Which response class a connection received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 200 with a regular file's bytes
    File { path: PathBuf, bytes: usize },
    /// 200 with a directory's index.html
    IndexFile { path: PathBuf, bytes: usize },
    /// 200 with a generated listing
    Listing { path: PathBuf, entries: usize },
    /// 404
    NotFound { path: PathBuf },
    /// 400
    BadRequest(RequestError),
}

impl Outcome {
    pub fn status_code(&self) -> u16 {
        match self {
            Outcome::File { .. } | Outcome::IndexFile { .. } | Outcome::Listing { .. } => 200,
            Outcome::NotFound { .. } => 404,
            Outcome::BadRequest(_) => 400,
        }
    }
}

enum State {
    AwaitRequest,
    Parse { received: Vec<u8> },
    Validate { line: Vec<u8> },
    Resolve { request: RequestLine },
    ServeFile { path: PathBuf, index: bool },
    ServeDirectory { path: PathBuf },
    NotFound { path: PathBuf },
    BadRequest(RequestError),
    Respond { response: Response, outcome: Outcome },
}

/// Serves one request per connection out of a document root
pub struct RequestHandler<F> {
    doc_root: PathBuf,
    fs: F,
    max_request_bytes: usize,
}

impl<F: FileSystem> RequestHandler<F> {
    pub fn new(doc_root: impl Into<PathBuf>, fs: F, max_request_bytes: usize) -> Self {
        Self {
            doc_root: doc_root.into(),
            fs,
            max_request_bytes,
        }
    }

    pub fn doc_root(&self) -> &Path {
        &self.doc_root
    }

    /// Run one request/response cycle on `conn`
    ///
    /// Returns the response class that was sent, or the transport error
    /// that cut the cycle short.
    pub fn handle<C: Connection + ?Sized>(&self, conn: &mut C) -> ServeResult<Outcome> {
        let mut state = State::AwaitRequest;
        loop {
            state = match state {
                State::AwaitRequest => {
                    // One receive call; a longer request is cut at the limit.
                    let mut buf = vec![0u8; self.max_request_bytes];
                    let n = conn.receive(&mut buf).map_err(ServeError::Receive)?;
                    buf.truncate(n);
                    State::Parse { received: buf }
                }
                State::Parse { received } => State::Validate {
                    line: request::first_line(&received).to_vec(),
                },
                State::Validate { line } => match RequestLine::parse(&line) {
                    Ok(request) => {
                        debug!(uri = %request.target, version = ?request.version, "request");
                        State::Resolve { request }
                    }
                    Err(e) => State::BadRequest(e),
                },
                State::Resolve { request } => {
                    let path = self.resolve(&request.target);
                    if !self.fs.exists(&path) {
                        State::NotFound { path }
                    } else if self.fs.is_directory(&path) {
                        State::ServeDirectory { path }
                    } else {
                        State::ServeFile { path, index: false }
                    }
                }
                State::ServeDirectory { path } => self.serve_directory(path),
                State::ServeFile { path, index } => self.serve_file(path, index),
                State::NotFound { path } => State::Respond {
                    response: Response::not_found(),
                    outcome: Outcome::NotFound { path },
                },
                State::BadRequest(reason) => State::Respond {
                    response: Response::bad_request(),
                    outcome: Outcome::BadRequest(reason),
                },
                State::Respond { response, outcome } => {
                    response.write_to(conn).map_err(ServeError::Send)?;
                    return Ok(outcome);
                }
            };
        }
    }

    /// Document root with the target appended verbatim
    ///
    /// Plain concatenation, not `Path::join`: the target starts with `/`
    /// and must not replace the root. Parent segments are not collapsed.
    pub fn resolve(&self, target: &str) -> PathBuf {
        let mut joined = OsString::from(self.doc_root.as_os_str());
        joined.push(target);
        PathBuf::from(joined)
    }

    fn serve_directory(&self, path: PathBuf) -> State {
        let entries = match self.fs.list_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot list directory");
                return State::NotFound { path };
            }
        };

        if entries.iter().any(|name| name == INDEX_FILE) {
            return State::ServeFile {
                path: path.join(INDEX_FILE),
                index: true,
            };
        }

        debug!(path = %path.display(), entries = entries.len(), "generating listing");
        State::Respond {
            response: Response::directory_listing(&entries),
            outcome: Outcome::Listing {
                path,
                entries: entries.len(),
            },
        }
    }

    fn serve_file(&self, path: PathBuf, index: bool) -> State {
        let body = match self.fs.read_all(&path) {
            Ok(body) => body,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read file");
                return State::NotFound { path };
            }
        };

        let bytes = body.len();
        let response = Response::ok(mime::content_type_for(&path), body);
        let outcome = if index {
            Outcome::IndexFile { path, bytes }
        } else {
            Outcome::File { path, bytes }
        };
        State::Respond { response, outcome }
    }
}
