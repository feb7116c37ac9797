use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::{Request, Response};
use hyper_util::client::legacy::Client;
use shared::http::{add_via_header, filter_hop_by_hop};
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::errors::RegionRouterError;

/// Forwards a request to the storefront upstream and collects the whole response.
///
/// The upstream URL's scheme and authority replace the request's; path and query are kept.
/// Hop-by-hop headers are filtered and a Via header is added in both directions.
///
/// `timeout_duration` covers the complete exchange, including reading the response body.
pub async fn send_to_upstream<C, B>(
    client: &Client<C, B>,
    upstream_url: &Url,
    request: Request<B>,
    timeout_duration: Duration,
) -> Result<Response<Bytes>, RegionRouterError>
where
    C: hyper_util::client::legacy::connect::Connect + Clone + Send + Sync + 'static,
    B: hyper::body::Body + Send + Unpin + 'static,
    B::Data: Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let upstream_identifier = upstream_url.host_str().unwrap_or(upstream_url.as_str());

    let mut url = upstream_url.clone();
    url.set_path(request.uri().path());
    url.set_query(request.uri().query());

    let (mut parts, body) = request.into_parts();
    let request_version = parts.version;
    filter_hop_by_hop(&mut parts.headers, request_version);
    add_via_header(&mut parts.headers, request_version);

    let mut req_builder = Request::builder()
        .method(parts.method)
        .uri(url.as_str())
        .version(parts.version);

    for (name, value) in parts.headers.iter() {
        req_builder = req_builder.header(name, value);
    }

    let upstream_request = req_builder
        .body(body)
        .map_err(|e| RegionRouterError::InternalError(format!("Failed to build request: {e}")))?;

    let exchange = async {
        let response = client.request(upstream_request).await.map_err(|e| {
            RegionRouterError::UpstreamRequestFailed(upstream_identifier.to_string(), e.to_string())
        })?;

        let (mut parts, body) = response.into_parts();
        let response_version = parts.version;
        filter_hop_by_hop(&mut parts.headers, response_version);
        add_via_header(&mut parts.headers, response_version);

        let body_bytes = body.collect().await?.to_bytes();
        Ok::<_, RegionRouterError>(Response::from_parts(parts, body_bytes))
    };

    timeout(timeout_duration, exchange)
        .await
        .map_err(|_| RegionRouterError::UpstreamTimeout(upstream_identifier.to_string()))?
}
