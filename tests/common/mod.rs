//! Shared test doubles: in-memory services and a local HTTP stub server

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use imgedit::{
    BackgroundRemovalService, DownloadResponse, EditRequest, EditedImage, ImageEditError,
    ImageEditService, InputImage, RawResponse, Result,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Write small placeholder images into `dir` and return their paths
pub fn write_inputs(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            std::fs::write(&path, format!("input:{}", name)).unwrap();
            path
        })
        .collect()
}

/// Deterministic edit result for an input: base64 of `EDITED:` + its bytes
pub fn echo_payload(bytes: &[u8]) -> Vec<u8> {
    let mut out = b"EDITED:".to_vec();
    out.extend_from_slice(bytes);
    out
}

pub fn b64(bytes: &[u8]) -> EditedImage {
    EditedImage {
        b64_json: STANDARD.encode(bytes),
    }
}

/// How the mock edit service answers
#[derive(Debug, Clone)]
pub enum EditBehavior {
    /// One result per input image, see [`echo_payload`]
    Echo,
    /// Fixed results regardless of inputs
    Results(Vec<EditedImage>),
    /// Fail like an HTTP error from the API
    Fail { status: u16 },
}

struct EditState {
    behavior: EditBehavior,
    calls: AtomicUsize,
    requests: Mutex<Vec<EditRequest>>,
}

/// In-memory [`ImageEditService`]; clones share call counters
#[derive(Clone)]
pub struct MockEditService {
    state: Arc<EditState>,
}

impl MockEditService {
    pub fn new(behavior: EditBehavior) -> Self {
        Self {
            state: Arc::new(EditState {
                behavior,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<EditRequest> {
        self.state.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ImageEditService for MockEditService {
    async fn edit(&self, request: EditRequest) -> Result<Vec<EditedImage>> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        self.state.requests.lock().unwrap().push(request.clone());

        match &self.state.behavior {
            EditBehavior::Echo => Ok(request
                .images
                .iter()
                .map(|image| b64(&echo_payload(&image.bytes)))
                .collect()),
            EditBehavior::Results(results) => Ok(results.clone()),
            EditBehavior::Fail { status } => Err(ImageEditError::Api {
                status: *status,
                body: "stub failure".to_string(),
            }),
        }
    }
}

/// How the mock removal service answers the download step
#[derive(Debug, Clone)]
pub enum DownloadBehavior {
    Chunks(Vec<Bytes>),
    Status { status: u16, text: String },
    /// First chunk arrives, then the stream fails
    BrokenStream(Bytes),
}

struct RemovalState {
    configured: bool,
    submit: RawResponse,
    download: DownloadBehavior,
    submit_calls: AtomicUsize,
    download_urls: Mutex<Vec<String>>,
    uploads: Mutex<Vec<InputImage>>,
}

/// In-memory [`BackgroundRemovalService`]; clones share call counters
#[derive(Clone)]
pub struct MockRemovalService {
    state: Arc<RemovalState>,
}

impl MockRemovalService {
    pub fn new(configured: bool, submit: RawResponse, download: DownloadBehavior) -> Self {
        Self {
            state: Arc::new(RemovalState {
                configured,
                submit,
                download,
                submit_calls: AtomicUsize::new(0),
                download_urls: Mutex::new(Vec::new()),
                uploads: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Configured service answering with a success JSON and the given chunks
    pub fn success(url: &str, chunks: &[&'static [u8]]) -> Self {
        let body = format!(r#"{{"status":"success","data":{{"url":"{}"}}}}"#, url);
        Self::new(
            true,
            RawResponse::new(200, body),
            DownloadBehavior::Chunks(chunks.iter().copied().map(Bytes::from_static).collect()),
        )
    }

    pub fn submit_calls(&self) -> usize {
        self.state.submit_calls.load(Ordering::SeqCst)
    }

    pub fn download_urls(&self) -> Vec<String> {
        self.state.download_urls.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<InputImage> {
        self.state.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackgroundRemovalService for MockRemovalService {
    fn is_configured(&self) -> bool {
        self.state.configured
    }

    async fn submit(&self, image: InputImage) -> Result<RawResponse> {
        self.state.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.state.uploads.lock().unwrap().push(image);
        Ok(self.state.submit.clone())
    }

    async fn download(&self, url: &str) -> Result<DownloadResponse> {
        self.state.download_urls.lock().unwrap().push(url.to_string());

        match &self.state.download {
            DownloadBehavior::Chunks(chunks) => Ok(DownloadResponse::Stream(
                stream::iter(chunks.clone().into_iter().map(Ok::<Bytes, ImageEditError>)).boxed(),
            )),
            DownloadBehavior::Status { status, text } => Ok(DownloadResponse::Failed {
                status: *status,
                text: text.clone(),
            }),
            DownloadBehavior::BrokenStream(first) => Ok(DownloadResponse::Stream(
                stream::iter(vec![
                    Ok(first.clone()),
                    Err(ImageEditError::unexpected_response("connection reset")),
                ])
                .boxed(),
            )),
        }
    }
}

/// One request received by [`StubServer`]
#[derive(Debug, Clone)]
pub struct StubRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl StubRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Canned response returned by [`StubServer`]
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl StubResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.into().into_bytes(),
        }
    }

    pub fn bytes(status: u16, body: &[u8]) -> Self {
        Self {
            status,
            content_type: "application/octet-stream",
            body: body.to_vec(),
        }
    }
}

type Handler = dyn Fn(&StubRequest, &str) -> StubResponse + Send + Sync;

/// Minimal HTTP/1.1 server on 127.0.0.1 answering one request per connection
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl StubServer {
    /// Start serving; the handler receives each request and the server base URL
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&StubRequest, &str) -> StubResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handler: Arc<Handler> = Arc::new(handler);
        let served_requests = Arc::clone(&requests);
        let served_base = base_url.clone();
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                let handler = Arc::clone(&handler);
                let requests = Arc::clone(&served_requests);
                let base = served_base.clone();
                tokio::spawn(async move {
                    let mut socket = socket;
                    let Some(request) = read_request(&mut socket).await else {
                        return;
                    };
                    let response = handler(&request, &base);
                    requests.lock().unwrap().push(request);
                    write_response(&mut socket, &response).await;
                });
            }
        });

        Self { base_url, requests }
    }

    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

async fn read_request(socket: &mut TcpStream) -> Option<StubRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok());
    let chunked = headers
        .iter()
        .any(|(k, v)| k == "transfer-encoding" && v.eq_ignore_ascii_case("chunked"));

    let body_start = head_end + 4;
    if let Some(len) = content_length {
        while buf.len() < body_start + len {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    } else if chunked {
        while !buf.ends_with(b"0\r\n\r\n") {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    Some(StubRequest {
        method,
        path,
        headers,
        body: buf[body_start.min(buf.len())..].to_vec(),
    })
}

async fn write_response(socket: &mut TcpStream, response: &StubResponse) {
    let head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.content_type,
        response.body.len()
    );
    let _ = socket.write_all(head.as_bytes()).await;
    let _ = socket.write_all(&response.body).await;
    let _ = socket.shutdown().await;
}
