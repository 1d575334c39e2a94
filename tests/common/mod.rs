#![allow(dead_code)]

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Send a raw HTTP/1.1 request and return the full response text.
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    /// `(status, content-type, body)` of a raw response.
    pub fn parse_parts(resp: &str) -> (u16, String, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut status = 0;
        let mut content_type = String::new();
        for line in head.lines() {
            if line.starts_with("HTTP/1.") {
                status = line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("0")
                    .parse()
                    .unwrap();
            } else if let Some((name, val)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-type") {
                    content_type = val.trim().to_string();
                }
            }
        }
        (status, content_type, body.to_string())
    }

    pub fn get(addr: &SocketAddr, path: &str, headers: &[(&str, &str)]) -> (u16, String, String) {
        let mut req = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
        for (name, value) in headers {
            req.push_str(&format!("{name}: {value}\r\n"));
        }
        req.push_str("\r\n");
        parse_parts(&send_request(addr, &req))
    }

    pub fn post(addr: &SocketAddr, path: &str, content_type: &str, body: &str) -> (u16, String, String) {
        let req = format!(
            "POST {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        parse_parts(&send_request(addr, &req))
    }
}

pub mod fixtures {
    use gantry::contract::{ContractDocument, Info};
    use gantry::registry::Registry;
    use gantry::router::LiveRouter;
    use gantry::schema::{SchemaCompiler, TypeNames};
    use std::sync::Arc;

    /// Registry with its own name table, so tests do not share component names.
    pub fn registry(prefix: &str) -> Registry<LiveRouter> {
        let doc = ContractDocument::new(Info {
            title: "Integration".into(),
            version: "1.0.0".into(),
            ..Info::default()
        });
        Registry::new(doc, LiveRouter::with_prefix(prefix))
            .with_compiler(SchemaCompiler::new(Arc::new(TypeNames::new())))
    }
}
