use super::request::{ParamVec, Request};
use super::response::Response;
use crate::router::LiveRouter;
use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Request body cap used unless [`HttpServer::with_max_body`] says otherwise.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// HTTP/1.1 transport for a [`LiveRouter`], backed by `tiny_http`.
pub struct HttpServer {
    router: Arc<LiveRouter>,
    access_log: bool,
    max_body: u64,
}

enum Rejection {
    Malformed(io::Error),
    TooLarge,
}

impl From<io::Error> for Rejection {
    fn from(e: io::Error) -> Self {
        Rejection::Malformed(e)
    }
}

/// Handle to a running HTTP server
///
/// Provides methods for waiting until the server is ready, stopping it gracefully,
/// or joining the server thread.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is bound to (useful after binding port 0).
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready to accept connections
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` error if the server doesn't become ready within ~250ms (50 attempts × 5ms).
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop accepting requests once SIGINT or SIGTERM arrives.
    ///
    /// # Errors
    ///
    /// When the signal handlers cannot be installed.
    pub fn stop_on_signals(&self) -> io::Result<()> {
        install_signal_handlers(&self.shutdown)
    }

    /// Stop the server gracefully and wait for the serving thread.
    pub fn stop(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if self.handle.join().is_err() {
            error!("HTTP server thread panicked during shutdown");
        }
    }

    /// Block until the server stops (signal or panic).
    ///
    /// # Errors
    ///
    /// Returns an error if the server thread panicked.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

#[cfg(unix)]
fn install_signal_handlers(flag: &Arc<AtomicBool>) -> io::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    signal_hook::flag::register(SIGTERM, Arc::clone(flag))?;
    signal_hook::flag::register(SIGINT, Arc::clone(flag))?;
    Ok(())
}

#[cfg(not(unix))]
fn install_signal_handlers(_flag: &Arc<AtomicBool>) -> io::Result<()> {
    Ok(())
}

impl HttpServer {
    #[must_use]
    pub fn new(router: Arc<LiveRouter>) -> Self {
        Self {
            router,
            access_log: false,
            max_body: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Reject request bodies larger than `bytes` with `413`.
    #[must_use]
    pub fn with_max_body(mut self, bytes: u64) -> Self {
        self.max_body = bytes;
        self
    }

    /// Log every request at info level.
    #[must_use]
    pub fn with_access_log(mut self, enabled: bool) -> Self {
        self.access_log = enabled;
        self
    }

    /// Bind `addr` and serve on a background thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the port cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let server = tiny_http::Server::http(addr).map_err(io::Error::other)?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "not an IP listener"))?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let router = self.router;
        let routes = router.len();
        let access_log = self.access_log;
        let max_body = self.max_body;
        let handle = thread::Builder::new()
            .name("gantry-http".into())
            .spawn(move || serve(&server, &router, &flag, access_log, max_body))?;

        info!(%addr, routes, max_body, "HTTP server listening");
        Ok(ServerHandle {
            addr,
            shutdown,
            handle,
        })
    }
}

fn serve(
    server: &tiny_http::Server,
    router: &LiveRouter,
    shutdown: &AtomicBool,
    access_log: bool,
    max_body: u64,
) {
    while !shutdown.load(Ordering::SeqCst) {
        let request = match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                error!(error = %e, "HTTP server accept failed");
                break;
            }
        };
        handle_request(request, router, access_log, max_body);
    }
    info!("HTTP server stopped");
}

fn handle_request(mut raw: tiny_http::Request, router: &LiveRouter, access_log: bool, max_body: u64) {
    let started = Instant::now();
    let response = match convert_request(&mut raw, max_body) {
        Ok(request) => router.dispatch(request),
        Err(Rejection::Malformed(e)) => {
            warn!(error = %e, "Rejected malformed request");
            Response::text(400, "Bad Request")
        }
        Err(Rejection::TooLarge) => {
            warn!(url = raw.url(), limit = max_body, "Rejected oversized request body");
            Response::text(413, "Payload Too Large")
        }
    };
    if access_log {
        info!(
            method = %raw.method(),
            url = raw.url(),
            status = response.status,
            latency_ms = started.elapsed().as_millis() as u64,
            "Request handled"
        );
    } else {
        debug!(status = response.status, url = raw.url(), "Writing response");
    }

    let mut out = tiny_http::Response::from_data(response.body).with_status_code(response.status);
    for (name, value) in &response.headers {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => out.add_header(header),
            Err(()) => warn!(header = %name, "Dropping invalid response header"),
        }
    }
    if let Err(e) = raw.respond(out) {
        debug!(error = %e, "Client went away before the response was written");
    }
}

fn convert_request(raw: &mut tiny_http::Request, max_body: u64) -> Result<Request, Rejection> {
    let method = http::Method::from_bytes(raw.method().as_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut request = Request::new(method, raw.url());
    let headers: ParamVec = raw
        .headers()
        .iter()
        .map(|h| {
            (
                h.field.as_str().as_str().to_ascii_lowercase(),
                h.value.as_str().to_string(),
            )
        })
        .collect();
    request.headers = headers;
    if raw.body_length().is_some_and(|len| len as u64 > max_body) {
        return Err(Rejection::TooLarge);
    }
    // one extra byte tells an exact fit from an overflow on chunked bodies
    raw.as_reader()
        .take(max_body.saturating_add(1))
        .read_to_end(&mut request.body)?;
    if request.body.len() as u64 > max_body {
        return Err(Rejection::TooLarge);
    }
    Ok(request)
}
