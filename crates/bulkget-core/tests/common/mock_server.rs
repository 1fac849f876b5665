//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed set of routes, one response per connection
//! (`Connection: close`). Unknown paths answer 404. Every request is counted
//! per path so tests can assert which URLs were (or were not) contacted.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Route {
    /// 200 with this body; HEAD gets the headers only.
    Body(Vec<u8>),
    /// This status with a short text body.
    Status(u16),
    /// Read the request, then say nothing for this long.
    Hang(Duration),
    /// 200 with `body`, written `chunk` bytes at a time with `delay` between writes.
    Trickle {
        body: Vec<u8>,
        chunk: usize,
        delay: Duration,
    },
}

pub struct MockServer {
    base: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockServer {
    /// Base URL with a trailing slash, e.g. "http://127.0.0.1:12345/".
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Absolute URL for `path` ("a.bin" or "/a.bin").
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    /// Requests seen for `path` (any method).
    pub fn hits(&self, path: &str) -> usize {
        let key = format!("/{}", path.trim_start_matches('/'));
        self.hits.lock().unwrap().get(&key).copied().unwrap_or(0)
    }

    /// Requests seen across all paths.
    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

/// Starts a server in a background thread. Runs until the process exits.
pub fn start(routes: Vec<(&str, Route)>) -> MockServer {
    let routes: HashMap<String, Route> = routes
        .into_iter()
        .map(|(p, r)| (format!("/{}", p.trim_start_matches('/')), r))
        .collect();
    let routes = Arc::new(routes);
    let hits = Arc::new(Mutex::new(HashMap::new()));

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let server_hits = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&server_hits);
            thread::spawn(move || handle(stream, &routes, &hits));
        }
    });
    MockServer {
        base: format!("http://127.0.0.1:{}/", port),
        hits,
    }
}

fn handle(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    hits: &Mutex<HashMap<String, usize>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path) = parse_request_line(request);
    let is_head = method.eq_ignore_ascii_case("HEAD");
    *hits.lock().unwrap().entry(path.to_string()).or_insert(0) += 1;

    match routes.get(path) {
        Some(Route::Body(body)) => respond(&mut stream, 200, body, is_head),
        Some(Route::Status(code)) => respond(&mut stream, *code, b"no such asset", is_head),
        Some(Route::Hang(d)) => thread::sleep(*d),
        Some(Route::Trickle { body, chunk, delay }) => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            if stream.write_all(head.as_bytes()).is_err() || is_head {
                return;
            }
            for piece in body.chunks((*chunk).max(1)) {
                if stream.write_all(piece).is_err() || stream.flush().is_err() {
                    return;
                }
                thread::sleep(*delay);
            }
        }
        None => respond(&mut stream, 404, b"no such asset", is_head),
    }
}

fn respond(stream: &mut TcpStream, code: u16, body: &[u8], is_head: bool) {
    let reason = match code {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        code,
        reason,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    if !is_head {
        let _ = stream.write_all(body);
    }
}

/// Returns (method, path) from the request line.
fn parse_request_line(request: &str) -> (&str, &str) {
    let line = request.lines().next().unwrap_or("");
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/");
    (method, path)
}
