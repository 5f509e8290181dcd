//! Minimal HTTP/1.1 front end for a [`Service`].
//!
//! Each method is routed at `/<name>` under the verb its definition names.
//! One request per connection; bodies are JSON.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::errors::ApiError;
use super::types::ErrorResponse;
use crate::runtime::{Service, Verb};

/// Request bodies above this size are rejected.
const MAX_BODY: usize = 1 << 20;
/// Request line plus headers.
const MAX_HEAD: u64 = 8 * 1024;
/// Time a client gets to send its whole request.
const READ_TIMEOUT: Duration = Duration::from_secs(10);

struct Request {
    method: String,
    path: String,
    body: Vec<u8>,
}

struct Response {
    status: u16,
    body: Vec<u8>,
    allow: Option<Verb>,
}

impl Response {
    fn json(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            body,
            allow: None,
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        let body = serde_json::to_vec(&ErrorResponse {
            error: message.into(),
        })
        .unwrap_or_default();
        Self::json(status, body)
    }
}

/// What came off the wire.
enum Incoming {
    /// Peer closed before sending a request line.
    Closed,
    /// Answered without reaching the service.
    Rejected(Response),
    Request(Request),
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        413 => "Payload Too Large",
        431 => "Request Header Fields Too Large",
        _ => "Internal Server Error",
    }
}

async fn read_request<R>(stream: R) -> std::io::Result<Incoming>
where
    R: AsyncRead + Unpin,
{
    let mut head = BufReader::new(stream).take(MAX_HEAD);
    let too_large = || Incoming::Rejected(Response::error(431, "request head too large"));

    let mut line = String::new();
    if head.read_line(&mut line).await? == 0 {
        return Ok(Incoming::Closed);
    }
    if head.limit() == 0 && !line.ends_with('\n') {
        return Ok(too_large());
    }
    let mut parts = line.split_whitespace();
    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        return Ok(Incoming::Rejected(Response::error(400, "malformed request line")));
    };
    let method = method.to_string();
    let path = path.split('?').next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if head.read_line(&mut header).await? == 0 {
            break;
        }
        if head.limit() == 0 && !header.ends_with('\n') {
            return Ok(too_large());
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                let Ok(length) = value.trim().parse() else {
                    let message = format!("invalid content-length {:?}", value.trim());
                    return Ok(Incoming::Rejected(Response::error(400, message)));
                };
                content_length = length;
            }
        }
    }

    if content_length > MAX_BODY {
        return Ok(Incoming::Rejected(Response::error(413, "request body too large")));
    }
    let mut reader = head.into_inner();
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).await?;
    Ok(Incoming::Request(Request { method, path, body }))
}

async fn route<S>(service: &S, request: Request) -> Response
where
    S: Service<Error = ApiError>,
{
    let name = request.path.trim_start_matches('/');
    let Some(definition) = service.method(name) else {
        return Response::error(404, format!("no route for {}", request.path));
    };
    if definition.verb.as_str() != request.method {
        let mut response = Response::error(
            405,
            format!("{} expects {}", request.path, definition.verb.as_str()),
        );
        response.allow = Some(definition.verb);
        return response;
    }

    match service.call_method(definition.name, request.body).await {
        Ok(body) => Response::json(200, body),
        Err(err) => {
            warn!(method = definition.name, %err, "request failed");
            Response::error(err.status(), err.to_string())
        }
    }
}

async fn write_response(stream: &mut TcpStream, response: Response) -> std::io::Result<()> {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n",
        response.status,
        reason(response.status),
        response.body.len(),
    );
    if let Some(verb) = response.allow {
        head.push_str(&format!("Allow: {}\r\n", verb.as_str()));
    }
    head.push_str("\r\n");
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&response.body).await?;
    stream.shutdown().await
}

async fn handle_connection<S>(service: Arc<S>, mut stream: TcpStream) -> std::io::Result<()>
where
    S: Service<Error = ApiError>,
{
    let incoming = match timeout(READ_TIMEOUT, read_request(&mut stream)).await {
        Ok(incoming) => incoming?,
        Err(_) => Incoming::Rejected(Response::error(408, "timed out reading request")),
    };
    let response = match incoming {
        Incoming::Closed => return Ok(()),
        Incoming::Rejected(response) => {
            debug!(status = response.status, "rejected request");
            response
        }
        Incoming::Request(request) => {
            debug!(method = %request.method, path = %request.path, "request");
            route(service.as_ref(), request).await
        }
    };
    write_response(&mut stream, response).await
}

/// Serve until `shutdown` resolves.
pub async fn serve<S, F>(listener: TcpListener, service: Arc<S>, shutdown: F) -> std::io::Result<()>
where
    S: Service<Error = ApiError> + 'static,
    F: Future<Output = ()>,
{
    info!(addr = %listener.local_addr()?, service = service.service_name(), "listening");
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let service = service.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_connection(service, stream).await {
                        warn!(%peer, %err, "connection error");
                    }
                });
            }
            _ = &mut shutdown => {
                info!("shutting down");
                return Ok(());
            }
        }
    }
}
