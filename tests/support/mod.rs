//! Minimal blocking HTTP/1.1 stub server for integration tests.
//!
//! One request per connection, Content-Length bodies only. Each test gets its
//! own server on an ephemeral port; the accept thread lives until the test
//! process exits.

#![allow(dead_code)]

use std::io::{BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use rerank_bench::rerank::Ranking;
use rerank_bench::Reranker;

/// Maximum header section size (32 KiB)
const MAX_HEADER_SIZE: usize = 32 * 1024;

/// Parsed request
#[derive(Debug, Clone)]
pub struct StubRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl StubRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Canned response
pub struct StubResponse {
    pub status: u16,
    pub body: String,
}

impl StubResponse {
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Self {
            status,
            body: value.to_string(),
        }
    }
}

/// Running stub server
pub struct StubServer {
    pub url: String,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl StubServer {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&StubRequest) -> StubResponse + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                serve_one(stream, &handler, &log);
            }
        });

        Self { url, requests }
    }

    /// Requests seen so far, in arrival order
    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

fn serve_one<F>(stream: TcpStream, handler: &F, log: &Mutex<Vec<StubRequest>>)
where
    F: Fn(&StubRequest) -> StubResponse,
{
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);

    let response = match read_request(&mut reader) {
        Some(Ok(request)) => {
            let response = handler(&request);
            log.lock().unwrap().push(request);
            response
        }
        Some(Err(e)) => StubResponse::json(400, serde_json::json!({ "error": e })),
        None => return,
    };

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason(response.status),
        response.body.len()
    );
    let _ = writer.write_all(head.as_bytes());
    let _ = writer.write_all(response.body.as_bytes());
    let _ = writer.flush();
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn read_request(stream: &mut impl Read) -> Option<Result<StubRequest, String>> {
    let mut header_buf = Vec::with_capacity(4096);
    let mut byte = [0u8; 1];

    loop {
        match stream.read(&mut byte) {
            Ok(0) if header_buf.is_empty() => return None,
            Ok(0) => return Some(Err("Connection closed mid-request".to_string())),
            Ok(_) => {
                header_buf.push(byte[0]);
                if header_buf.len() > MAX_HEADER_SIZE {
                    return Some(Err("Headers too large".to_string()));
                }
                if header_buf.ends_with(b"\r\n\r\n") {
                    break;
                }
            }
            Err(_) if header_buf.is_empty() => return None,
            Err(e) => return Some(Err(format!("Read error: {}", e))),
        }
    }

    let mut parsed_headers = [httparse::EMPTY_HEADER; 64];
    let mut req = httparse::Request::new(&mut parsed_headers);
    match req.parse(&header_buf) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => return Some(Err("Incomplete HTTP request".to_string())),
        Err(e) => return Some(Err(format!("HTTP parse error: {}", e))),
    }

    let method = req.method.unwrap_or("").to_string();
    let path = req.path.unwrap_or("/").to_string();
    let headers: Vec<(String, String)> = req
        .headers
        .iter()
        .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = vec![0u8; content_length];
    if stream.read_exact(&mut body).is_err() {
        return Some(Err("Body shorter than Content-Length".to_string()));
    }

    Some(Ok(StubRequest {
        method,
        path,
        headers,
        body,
    }))
}

/// An address nothing listens on
pub fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Ranking in corpus order with the first `swap` pair exchanged
pub fn corpus_order(n: usize, swap: Option<(usize, usize)>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    if let Some((a, b)) = swap {
        order.swap(a, b);
    }
    order
}

/// `{results: [{index, score}]}` body for an ordering
pub fn rerank_body(order: &[usize]) -> serde_json::Value {
    let n = order.len();
    let results: Vec<serde_json::Value> = order
        .iter()
        .enumerate()
        .map(|(pos, &index)| {
            serde_json::json!({ "index": index, "score": (n - pos) as f64 / n as f64 })
        })
        .collect();
    serde_json::json!({ "results": results, "latency_ms": 1.0 })
}

/// In-process trusted provider ranking documents in corpus order
pub struct CorpusOrderTrusted;

impl Reranker for CorpusOrderTrusted {
    fn name(&self) -> &str {
        "stub-trusted"
    }

    fn rerank(&self, _query: &str, documents: &[String]) -> anyhow::Result<Ranking> {
        Ok(Ranking::from_order(&corpus_order(documents.len(), None)))
    }
}
