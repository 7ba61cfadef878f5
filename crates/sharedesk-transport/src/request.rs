//! The HTTP upgrade request that opened a connection.
//!
//! Browsers cannot attach custom headers to a WebSocket upgrade, so
//! credentials arrive in one of three places: the query string, an
//! `Authorization` header (non-browser clients), or a cookie. The
//! transport captures all three when the upgrade completes and hands
//! them to the layers above as a [`HandshakeRequest`].

use cookie::Cookie;

/// An owned snapshot of the upgrade request: path, decoded query pairs,
/// headers, and the cookies parsed out of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeRequest {
    path: String,
    query: Vec<(String, String)>,
    /// Header names are stored lowercase.
    headers: Vec<(String, String)>,
    /// Valid cookies from every `Cookie` header, in order.
    cookies: Vec<(String, String)>,
}

impl HandshakeRequest {
    /// Builds a request from a `path?query` target.
    ///
    /// The query string is percent-decoded with `application/x-www-form-urlencoded`
    /// rules, so `?password=a%20b` yields `a b`.
    pub fn new(target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        Self {
            path: path.to_string(),
            query: query.map(parse_query).unwrap_or_default(),
            headers: Vec::new(),
            cookies: Vec::new(),
        }
    }

    /// Adds a header. Builder-style, mostly for tests and custom transports.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.push_header(name, value);
        self
    }

    pub(crate) fn push_header(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if name == "cookie" {
            self.cookies.extend(parse_cookies(value));
        }
        self.headers.push((name, value.to_string()));
    }

    /// The request path without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the first value of the named query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the first value of the named header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the value of the first cookie with the given name, across
    /// all `Cookie` headers. A surrounding pair of double quotes is
    /// stripped; cookies with malformed values are skipped.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

fn parse_cookies(header: &str) -> Vec<(String, String)> {
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .filter(|c| c.value_trimmed().bytes().all(is_cookie_value_byte))
        .map(|c| (c.name().to_string(), c.value_trimmed().to_string()))
        .collect()
}

/// RFC 6265 cookie-octet, widened to allow space and comma as browsers do.
fn is_cookie_value_byte(b: u8) -> bool {
    (0x20..0x7f).contains(&b) && b != b'"' && b != b';' && b != b'\\'
}
