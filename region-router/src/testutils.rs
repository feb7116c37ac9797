use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderName, HeaderValue};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

pub const ECHO_URI_HEADER: HeaderName = HeaderName::from_static("x-echo-uri");

/// Storefront stand-in that echoes the request body and headers back, plus the
/// request's path and query in `x-echo-uri`.
pub struct TestUpstream {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

async fn echo_handler(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body_bytes = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_else(|_| Bytes::new());

    let mut response = Response::new(Full::new(body_bytes));
    *response.headers_mut() = parts.headers;
    if let Some(pq) = parts.uri.path_and_query()
        && let Ok(value) = HeaderValue::from_str(pq.as_str())
    {
        response.headers_mut().insert(ECHO_URI_HEADER, value);
    }

    Ok(response)
}

impl TestUpstream {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                tokio::spawn(async move {
                    let _ = Builder::new(TokioExecutor::new())
                        .serve_connection(TokioIo::new(stream), service_fn(echo_handler))
                        .await;
                });
            }
        });

        TestUpstream { addr, handle }
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }
}

impl Drop for TestUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
