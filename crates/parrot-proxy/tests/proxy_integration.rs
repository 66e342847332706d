//! End-to-end tests: a real proxy listener in front of an in-process
//! upstream, driven over HTTP.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use parrot_proxy::config::ConnectionPoolConfig;
use parrot_proxy::filters::Filters;
use parrot_proxy::model::{HttpRequest, HttpResponse};
use parrot_proxy::proxy::{HyperOutboundClient, ProxyHandler, ProxyServer};
use parrot_proxy::recording::RequestLog;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Echoes the request it received as JSON.
async fn start_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let service = service_fn(|req: Request<hyper::body::Incoming>| async move {
                    let (parts, body) = req.into_parts();
                    let body = body.collect().await.unwrap().to_bytes();
                    let headers: Vec<String> =
                        parts.headers.keys().map(|k| k.as_str().to_string()).collect();
                    let echo = json!({
                        "method": parts.method.as_str(),
                        "path": parts.uri.path(),
                        "query": parts.uri.query(),
                        "headers": headers,
                        "body": String::from_utf8_lossy(&body),
                    });
                    let response = Response::builder()
                        .status(if parts.uri.path() == "/created" { 201 } else { 200 })
                        .header("Content-Type", "application/json")
                        .header("X-Upstream", "echo")
                        .body(Full::new(Bytes::from(echo.to_string())))
                        .unwrap();
                    Ok::<_, Infallible>(response)
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });
    addr
}

async fn start_proxy(filters: Filters) -> (SocketAddr, Arc<RequestLog>) {
    let log = Arc::new(RequestLog::new());
    let client = HyperOutboundClient::new(&ConnectionPoolConfig::default());
    let handler = Arc::new(ProxyHandler::new(
        Arc::clone(&log),
        Arc::new(filters),
        Arc::new(client),
    ));
    let server = ProxyServer::bind("127.0.0.1:0".parse().unwrap(), handler)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    (addr, log)
}

/// Client that sends traffic through the proxy.
fn proxied_client(proxy: SocketAddr) -> Client {
    Client::builder()
        .proxy(reqwest::Proxy::http(format!("http://{proxy}")).unwrap())
        .build()
        .unwrap()
}

/// Client that talks to the proxy's control paths directly.
fn control_client() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn test_forwards_to_upstream_and_strips_hop_by_hop_headers() {
    let upstream = start_upstream().await;
    let (proxy, log) = start_proxy(Filters::new()).await;

    let response = proxied_client(proxy)
        .post(format!("http://{upstream}/created?page=2"))
        .header("Proxy-Authorization", "Basic Zm9vOmJhcg==")
        .header("X-Custom", "kept")
        .body("hello")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["x-upstream"], "echo");
    let echo: Value = response.json().await.unwrap();
    assert_eq!(echo["method"], "POST");
    assert_eq!(echo["path"], "/created");
    assert_eq!(echo["query"], "page=2");
    assert_eq!(echo["body"], "hello");
    let headers: Vec<&str> = echo["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h.as_str().unwrap())
        .collect();
    assert!(headers.contains(&"x-custom"));
    assert!(!headers.contains(&"proxy-authorization"));

    let logged = log.snapshot();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].request.path_str(), "/created");
    assert_eq!(logged[0].response.status(), 201);
}

#[tokio::test]
async fn test_forwards_percent_encoded_path() {
    let upstream = start_upstream().await;
    let (proxy, log) = start_proxy(Filters::new()).await;

    let response = proxied_client(proxy)
        .get(format!("http://{upstream}/some%20path/file%3Fname"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let echo: Value = response.json().await.unwrap();
    assert_eq!(echo["path"], "/some%20path/file%3Fname");
    assert_eq!(echo["query"], Value::Null);
    assert_eq!(log.snapshot()[0].request.path_str(), "/some path/file?name");
}

#[tokio::test]
async fn test_control_paths() {
    let upstream = start_upstream().await;
    let (proxy, _log) = start_proxy(Filters::new()).await;
    let client = proxied_client(proxy);
    for path in ["/a", "/b", "/c"] {
        let response = client.get(format!("http://{upstream}{path}")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let control = control_client();
    let base = format!("http://{proxy}");

    let status = control.put(format!("{base}/status")).send().await.unwrap();
    assert_eq!(status.status(), StatusCode::OK);

    let retrieved = control
        .put(format!("{base}/retrieve"))
        .body(json!({"path": "/b"}).to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(retrieved.status(), StatusCode::OK);
    assert_eq!(
        retrieved.headers()["content-type"],
        "application/json; charset=utf-8"
    );
    let requests: Vec<HttpRequest> = retrieved.json().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path_str(), "/b");

    let verify = control
        .put(format!("{base}/verify"))
        .body(
            json!({"httpRequest": {"path": "/a"}, "times": {"atLeast": 1, "atMost": 1}})
                .to_string(),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(verify.status(), StatusCode::ACCEPTED);

    let verify = control
        .put(format!("{base}/verify"))
        .body(json!({"httpRequest": {"path": "/z"}}).to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(verify.status(), StatusCode::NOT_ACCEPTABLE);
    assert!(verify.text().await.unwrap().starts_with("Request not found"));

    let sequence = control
        .put(format!("{base}/verifySequence"))
        .body(json!({"httpRequests": [{"path": "/a"}, {"path": "/c"}]}).to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(sequence.status(), StatusCode::ACCEPTED);

    let sequence = control
        .put(format!("{base}/verifySequence"))
        .body(json!({"httpRequests": [{"path": "/c"}, {"path": "/a"}]}).to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(sequence.status(), StatusCode::NOT_ACCEPTABLE);

    let dump = control
        .put(format!("{base}/dumpToLog?type=java"))
        .send()
        .await
        .unwrap();
    assert_eq!(dump.status(), StatusCode::ACCEPTED);

    let clear = control
        .put(format!("{base}/clear"))
        .body(json!({"path": "/a"}).to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(clear.status(), StatusCode::ACCEPTED);
    let remaining: Vec<HttpRequest> = control
        .put(format!("{base}/retrieve"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(remaining.len(), 2);

    let reset = control.put(format!("{base}/reset")).send().await.unwrap();
    assert_eq!(reset.status(), StatusCode::ACCEPTED);

    let stop = control.put(format!("{base}/stop")).send().await.unwrap();
    assert_eq!(stop.status(), StatusCode::NOT_IMPLEMENTED);

    let bad = control
        .put(format!("{base}/verify"))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

fn drop_request(_: HttpRequest) -> Option<HttpRequest> {
    None
}

fn mark_filtered(_: &HttpRequest, response: HttpResponse) -> HttpResponse {
    response.with_header("X-Filtered", "true")
}

#[tokio::test]
async fn test_filters_short_circuit_and_rewrite_response() {
    let upstream = start_upstream().await;
    let filters = Filters::new()
        .with_request_filter(HttpRequest::new().with_path("/blocked/.*"), drop_request)
        .with_response_filter(HttpRequest::new(), mark_filtered);
    let (proxy, log) = start_proxy(filters).await;
    let client = proxied_client(proxy);

    let blocked = client
        .get(format!("http://{upstream}/blocked/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(blocked.status(), StatusCode::NOT_FOUND);

    let allowed = client.get(format!("http://{upstream}/open")).send().await.unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(allowed.headers()["x-filtered"], "true");

    let logged = log.snapshot();
    assert_eq!(logged.len(), 2);
    assert_eq!(logged[0].response.status(), 404);
    assert_eq!(logged[1].response.first_header("x-filtered"), Some("true"));
}

#[tokio::test]
async fn test_missing_host_is_bad_request() {
    let (proxy, log) = start_proxy(Filters::new()).await;

    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream
        .write_all(b"GET /no-host HTTP/1.0\r\n\r\n")
        .await
        .unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8_lossy(&raw);

    assert!(raw.starts_with("HTTP/1."), "unexpected response: {raw}");
    assert!(raw.contains(" 400 "), "unexpected response: {raw}");
    assert!(raw.contains("Host header is required"));
    assert!(log.is_empty());
}
