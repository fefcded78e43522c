#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Minimal blocking HTTP stub standing in for the feed host, the metadata
/// API, and the webhook endpoint. Routes are matched by path prefix; every
/// request is recorded for later assertions.
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    routes: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl StubServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().expect("stub server addr");
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let routes: Arc<Mutex<Vec<(String, String, String)>>> = Arc::new(Mutex::new(Vec::new()));

        {
            let requests = Arc::clone(&requests);
            let routes = Arc::clone(&routes);
            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { continue };
                    handle_connection(stream, &requests, &routes);
                }
            });
        }

        Self {
            base_url: format!("http://{addr}"),
            requests,
            routes,
        }
    }

    pub fn route(&self, path_prefix: &str, content_type: &str, body: &str) {
        self.routes.lock().expect("routes lock").push((
            path_prefix.to_string(),
            content_type.to_string(),
            body.to_string(),
        ));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn hits(&self, path_prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.path.starts_with(path_prefix))
            .count()
    }

    pub fn posted_bodies(&self, path_prefix: &str) -> Vec<String> {
        self.requests()
            .iter()
            .filter(|r| r.method == "POST" && r.path.starts_with(path_prefix))
            .map(|r| r.body.clone())
            .collect()
    }
}

fn handle_connection(
    stream: TcpStream,
    requests: &Arc<Mutex<Vec<RecordedRequest>>>,
    routes: &Arc<Mutex<Vec<(String, String, String)>>>,
) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        return;
    };
    let method = method.to_string();
    let path = path.to_string();

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).is_err() || header.trim().is_empty() {
            break;
        }
        if let Some(value) = header
            .to_ascii_lowercase()
            .strip_prefix("content-length:")
            .map(str::trim)
        {
            content_length = value.parse().unwrap_or(0);
        }
    }

    let mut body = vec![0u8; content_length];
    if content_length > 0 && reader.read_exact(&mut body).is_err() {
        return;
    }
    let body = String::from_utf8_lossy(&body).into_owned();

    requests.lock().expect("requests lock").push(RecordedRequest {
        method,
        path: path.clone(),
        body,
    });

    let matched = routes
        .lock()
        .expect("routes lock")
        .iter()
        .find(|(prefix, _, _)| path.starts_with(prefix.as_str()))
        .cloned();

    let mut stream = reader.into_inner();
    let response = match matched {
        Some((_, content_type, payload)) => format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
            payload.len()
        ),
        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string(),
    };
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

pub fn feed_xml(entries: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015"
      xmlns:media="http://search.yahoo.com/mrss/"
      xmlns="http://www.w3.org/2005/Atom">
  <title>Channel feed</title>
  <updated>2024-01-02T00:00:00+00:00</updated>
{entries}
</feed>"#
    )
}

pub fn feed_entry(video_id: &str, title: &str, published: &str, updated: &str) -> String {
    format!(
        r#"<entry>
  <id>yt:video:{video_id}</id>
  <yt:videoId>{video_id}</yt:videoId>
  <title>{title}</title>
  <published>{published}</published>
  <updated>{updated}</updated>
  <media:group><media:title>{title}</media:title></media:group>
</entry>"#
    )
}
