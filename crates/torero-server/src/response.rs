//! Response construction and serialization
//!
//! Three response shapes go on the wire:
//!
//! ```text
//! HTTP/1.0 200 OK\r\nContent-length: <n>\r\nContent-Type: <type>\r\n\r\n<body>
//! HTTP/1.0 400 BAD REQUEST\r\n\r\n
//! HTTP/1.0 404 PAGE NOT FOUND\r\nContent-length: <n>\r\nContent-Type: text/html\r\n\r\n<html body>
//! ```

use std::io;

use crate::transport::{send_all, Connection};

const PROTOCOL: &str = "HTTP/1.0";

/// Fixed body of every 404 response
pub const NOT_FOUND_BODY: &str = "<!DOCTYPE HTML PUBLIC -//IETF//DTD HTML 2.0//EN>\n\
<html>\n\
<header>\n\
<title>Page Not Found</title>\n\
</header>\n\
<body>\n\
<h1>\n\
HTTP ERROR 404\n\
</h1>\n\
<p>\n\
Page not Found\n\
</p>\n\
</body>\n\
</html>\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "BAD REQUEST",
            Status::NotFound => "PAGE NOT FOUND",
        }
    }
}

/// Status line, ordered headers, and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    headers: Vec<(&'static str, String)>,
    body: Vec<u8>,
}

impl Response {
    /// 200 with Content-length taken from the body
    pub fn ok(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self::with_body(Status::Ok, content_type.into(), body)
    }

    /// 400, status line only
    pub fn bad_request() -> Self {
        Self {
            status: Status::BadRequest,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// 404 with the fixed HTML body
    pub fn not_found() -> Self {
        Self::with_body(
            Status::NotFound,
            String::from("text/html"),
            NOT_FOUND_BODY.as_bytes().to_vec(),
        )
    }

    /// 200 listing one link per entry
    pub fn directory_listing<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut html = String::from("<html>\n<body>\n<ul>\n");
        for entry in entries {
            let name = escape_html(entry.as_ref());
            html.push_str(&format!("\t<li><a href=\"{0}\">{0}</a></li>\n", name));
        }
        html.push_str("</ul>\n</body>\n</html>");
        Self::with_body(Status::Ok, String::from("text/html"), html.into_bytes())
    }

    fn with_body(status: Status, content_type: String, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: vec![
                ("Content-length", body.len().to_string()),
                ("Content-Type", content_type),
            ],
            body,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Value of the first header with this name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Status line and headers, terminated by the blank line
    pub fn head(&self) -> Vec<u8> {
        let mut head = format!("{} {} {}\r\n", PROTOCOL, self.status.code(), self.status.reason());
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        head.into_bytes()
    }

    /// Complete wire form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.head();
        bytes.extend_from_slice(&self.body);
        bytes
    }

    /// Send head then body; returns total bytes written
    pub fn write_to<C: Connection + ?Sized>(&self, conn: &mut C) -> io::Result<usize> {
        let mut total = send_all(conn, &self.head())?;
        if !self.body.is_empty() {
            total += send_all(conn, &self.body)?;
        }
        Ok(total)
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
