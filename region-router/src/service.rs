use crate::config::Config;
use crate::cookie::{self, CACHE_ID_COOKIE};
use crate::errors::RegionRouterError;
use crate::exclusions::Exclusions;
use crate::geo::{self, GeoHintProvider};
use crate::upstream::send_to_upstream;
use crate::metrics_defs::{REGION_DECISIONS, REQUEST_DURATION, UPSTREAM_ERRORS};
use crate::resolver::{self, Decision, RegionPolicy, RegionRequest};
use http::header::{HOST, LOCATION, SET_COOKIE};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use region_directory::RegionDirectory;
use shared::http::make_error_response;
use shared::{counter, histogram};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

pub type ResponseBody = BoxBody<Bytes, RegionRouterError>;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

struct ServiceInner {
    directory: RegionDirectory,
    geo: Box<dyn GeoHintProvider>,
    exclusions: Exclusions,
    policy: RegionPolicy,
    public_origin: Option<String>,
    upstream: Url,
    upstream_timeout: Duration,
    client: Client<HttpConnector, Full<Bytes>>,
}

/// Storefront-facing service. Every request is either excluded and forwarded as-is, or run
/// through the region resolver and then redirected or forwarded to the storefront upstream.
#[derive(Clone)]
pub struct RegionRouterService {
    inner: Arc<ServiceInner>,
}

impl RegionRouterService {
    pub fn new(config: &Config, directory: RegionDirectory) -> Result<Self, RegionRouterError> {
        let geo = geo::provider_from_config(&config.geo)?;
        tracing::info!(provider = geo.name(), "Using geo hint provider");

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(RegionRouterService {
            inner: Arc::new(ServiceInner {
                directory,
                geo,
                exclusions: Exclusions::new(&config.exclusions),
                policy: RegionPolicy::new(&config.default_region),
                public_origin: config
                    .public_origin
                    .as_deref()
                    .map(|o| o.trim_end_matches('/').to_string()),
                upstream: config.upstream.clone(),
                upstream_timeout: Duration::from_secs(config.upstream_timeout_secs),
                client,
            }),
        })
    }

    /// Serves one request whose body has already been read.
    pub async fn handle(&self, req: Request<Bytes>) -> Response<ResponseBody> {
        let start = Instant::now();
        let response = self.route(req).await;

        histogram!(REQUEST_DURATION, "status" => response.status().as_str().to_owned())
            .record(start.elapsed().as_secs_f64());
        response
    }

    async fn route(&self, req: Request<Bytes>) -> Response<ResponseBody> {
        if self.inner.exclusions.is_excluded(req.uri().path()) {
            counter!(REGION_DECISIONS, "decision" => "excluded").increment(1);
            return self.forward(req, None).await;
        }

        let existing_cache_id =
            cookie::read_cookie(req.headers(), CACHE_ID_COOKIE).map(str::to_owned);
        let cache_id = existing_cache_id
            .clone()
            .unwrap_or_else(cookie::new_cache_id);

        let snapshot = match self.inner.directory.resolve(&cache_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %req.uri().path(),
                    "Could not resolve region directory"
                );
                return make_error_response(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let geo = self.inner.geo.hints(req.headers());
        let origin = self.origin(&req);
        let region_request = RegionRequest {
            path: req.uri().path(),
            query: req.uri().query(),
            origin: &origin,
            cache_id: existing_cache_id.as_deref(),
            geo: &geo,
        };

        let decision = resolver::decide(&region_request, &snapshot, &self.inner.policy);
        counter!(REGION_DECISIONS, "decision" => decision.as_str()).increment(1);
        tracing::debug!(
            path = %req.uri().path(),
            decision = ?decision,
            "Resolved region"
        );

        match decision {
            Decision::Redirect { location } => redirect_response(&location),
            Decision::PassThrough => self.forward(req, None).await,
            Decision::PassThroughSetCookie => self.forward(req, Some(&cache_id)).await,
        }
    }

    /// Origin for redirect locations. The configured public origin wins; otherwise it is
    /// rebuilt from `x-forwarded-proto` and the Host header, which are client controlled.
    fn origin<B>(&self, req: &Request<B>) -> String {
        if let Some(origin) = &self.inner.public_origin {
            return origin.clone();
        }

        let host = req
            .headers()
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| req.uri().authority().map(|a| a.as_str()));

        let Some(host) = host else {
            // Relative redirect
            return String::new();
        };

        let scheme = req
            .headers()
            .get(FORWARDED_PROTO)
            .and_then(|p| p.to_str().ok())
            .and_then(|p| p.split(',').next())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .or_else(|| req.uri().scheme_str())
            .unwrap_or("http");

        format!("{scheme}://{host}")
    }

    async fn forward(
        &self,
        req: Request<Bytes>,
        set_cache_id: Option<&str>,
    ) -> Response<ResponseBody> {
        let req = req.map(Full::new);
        let result = send_to_upstream(
            &self.inner.client,
            &self.inner.upstream,
            req,
            self.inner.upstream_timeout,
        )
        .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let (kind, status) = match e {
                    RegionRouterError::UpstreamTimeout(_) => {
                        ("timeout", StatusCode::GATEWAY_TIMEOUT)
                    }
                    _ => ("request", StatusCode::BAD_GATEWAY),
                };
                counter!(UPSTREAM_ERRORS, "kind" => kind).increment(1);
                tracing::warn!(error = %e, "Forwarding to storefront failed");
                return make_error_response(status);
            }
        };

        let (mut parts, body) = response.into_parts();
        if let Some(cache_id) = set_cache_id {
            match cookie::cache_id_set_cookie(cache_id) {
                Ok(value) => {
                    parts.headers.append(SET_COOKIE, value);
                }
                Err(e) => tracing::error!(error = %e, "Invalid correlation cookie value"),
            }
        }

        Response::from_parts(parts, Full::new(body).map_err(|e| match e {}).boxed())
    }
}

fn redirect_response(location: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::TEMPORARY_REDIRECT)
        .header(LOCATION, location)
        .body(Empty::<Bytes>::new().map_err(|e| match e {}).boxed())
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, location, "Failed to build redirect");
            make_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

impl Service<Request<Incoming>> for RegionRouterService {
    type Response = Response<ResponseBody>;
    type Error = RegionRouterError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    tracing::debug!(error = %e, "Failed to read request body");
                    return Ok(make_error_response(StatusCode::BAD_REQUEST));
                }
            };

            Ok(service.handle(Request::from_parts(parts, body)).await)
        })
    }
}
