use http::Method;
use smallvec::SmallVec;

/// Maximum number of headers/params stored inline before spilling to the heap.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Name/value pairs in arrival order. Lookups use "last write wins".
pub type ParamVec = SmallVec<[(String, String); MAX_INLINE_PARAMS]>;

/// Transport-independent HTTP request handed to handler chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    pub query: ParamVec,
    /// Header names are stored lowercase.
    pub headers: ParamVec,
    pub body: Vec<u8>,
}

impl Request {
    /// Build a request from a method and a request target (`/path?query`).
    ///
    /// The query string is decoded with `application/x-www-form-urlencoded`
    /// rules.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (target, ParamVec::new()),
        };
        Self {
            method,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query,
            headers: ParamVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Header value, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rfind(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Cookie value from the `Cookie` header.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.header("cookie")?.split(';').find_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k.trim() == name).then(|| v.trim())
        })
    }
}

/// Decode a raw query string.
#[must_use]
pub fn parse_query(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
