use http::HeaderMap;
use http::header::{COOKIE, HeaderValue, InvalidHeaderValue};
use std::time::Duration;
use uuid::Uuid;

/// Cookie correlating a client with cached catalog responses.
pub const CACHE_ID_COOKIE: &str = "_medusa_cache_id";
pub const CACHE_ID_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Returns the value of the first non-empty cookie called `name` across all Cookie headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| key.trim() == name && !value.trim().is_empty())
        .map(|(_, value)| value.trim().trim_matches('"'))
}

pub fn new_cache_id() -> String {
    Uuid::new_v4().to_string()
}

/// `Set-Cookie` value for the correlation cookie, scoped to the whole site.
pub fn cache_id_set_cookie(cache_id: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{CACHE_ID_COOKIE}={cache_id}; Path=/; Max-Age={}",
        CACHE_ID_MAX_AGE.as_secs()
    ))
}
