use serde::Serialize;

pub(crate) fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Response produced by a handler chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(200)
    }
}

impl Response {
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Replace the body and its content type.
    pub fn set_body(&mut self, content_type: &str, body: Vec<u8>) {
        self.set_header("Content-Type", content_type);
        self.body = body;
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// JSON response. A value that fails to serialize becomes a 500.
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(status: u16, body: &T) -> Self {
        let mut res = Self::new(status);
        match serde_json::to_vec(body) {
            Ok(bytes) => res.set_body("application/json", bytes),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response body");
                res.status = 500;
                res.set_body("text/plain", b"Internal Server Error".to_vec());
            }
        }
        res
    }

    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        let mut res = Self::new(status);
        res.set_body("text/plain; charset=utf-8", body.as_bytes().to_vec());
        res
    }

    #[must_use]
    pub fn reason(&self) -> &'static str {
        status_reason(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(503), "Service Unavailable");
    }

    #[test]
    fn test_json_sets_content_type() {
        let res = Response::json(201, &serde_json::json!({"ok": true}));
        assert_eq!(res.status, 201);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.body, br#"{"ok":true}"#);
    }

    #[test]
    fn test_set_header_replaces() {
        let mut res = Response::new(200);
        res.set_header("X-A", "1");
        res.set_header("x-a", "2");
        assert_eq!(res.headers.len(), 1);
        assert_eq!(res.header("X-A"), Some("2"));
    }
}
