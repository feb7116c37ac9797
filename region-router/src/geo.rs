//! Geolocation hints supplied by the hosting platform.
//!
//! Each platform exposes the visitor's country differently. A `GeoHintProvider` is picked
//! once at startup from configuration and asked for hints on every request.

use crate::config::{GeoConfig, ValidationError};
use http::HeaderMap;
use http::header::HeaderName;

const VERCEL_COUNTRY: HeaderName = HeaderName::from_static("x-vercel-ip-country");
const CLOUDFLARE_COUNTRY: HeaderName = HeaderName::from_static("cf-ipcountry");

// Cloudflare reports unknown origins as XX and Tor exit nodes as T1.
const CLOUDFLARE_UNKNOWN: &[&str] = &["xx", "t1"];

/// Country hints for a single request, lowercased. Primary takes precedence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeoHints {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

pub trait GeoHintProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn hints(&self, headers: &HeaderMap) -> GeoHints;
}

fn header_country(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

pub struct VercelGeo;

impl GeoHintProvider for VercelGeo {
    fn name(&self) -> &'static str {
        "vercel"
    }

    fn hints(&self, headers: &HeaderMap) -> GeoHints {
        GeoHints {
            primary: header_country(headers, &VERCEL_COUNTRY),
            secondary: None,
        }
    }
}

pub struct CloudflareGeo;

impl GeoHintProvider for CloudflareGeo {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    fn hints(&self, headers: &HeaderMap) -> GeoHints {
        GeoHints {
            primary: header_country(headers, &CLOUDFLARE_COUNTRY)
                .filter(|c| !CLOUDFLARE_UNKNOWN.contains(&c.as_str())),
            secondary: None,
        }
    }
}

/// Reads hints from arbitrary headers, for platforms or proxies that set their own.
pub struct HeaderGeo {
    primary: HeaderName,
    secondary: Option<HeaderName>,
}

impl GeoHintProvider for HeaderGeo {
    fn name(&self) -> &'static str {
        "headers"
    }

    fn hints(&self, headers: &HeaderMap) -> GeoHints {
        GeoHints {
            primary: header_country(headers, &self.primary),
            secondary: self
                .secondary
                .as_ref()
                .and_then(|name| header_country(headers, name)),
        }
    }
}

pub struct NoGeo;

impl GeoHintProvider for NoGeo {
    fn name(&self) -> &'static str {
        "none"
    }

    fn hints(&self, _headers: &HeaderMap) -> GeoHints {
        GeoHints::default()
    }
}

fn parse_header_name(name: &str) -> Result<HeaderName, ValidationError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ValidationError::InvalidGeoHeader(name.to_string()))
}

pub fn provider_from_config(
    config: &GeoConfig,
) -> Result<Box<dyn GeoHintProvider>, ValidationError> {
    let provider: Box<dyn GeoHintProvider> = match config {
        GeoConfig::Vercel => Box::new(VercelGeo),
        GeoConfig::Cloudflare => Box::new(CloudflareGeo),
        GeoConfig::Headers { primary, secondary } => Box::new(HeaderGeo {
            primary: parse_header_name(primary)?,
            secondary: secondary.as_deref().map(parse_header_name).transpose()?,
        }),
        GeoConfig::None => Box::new(NoGeo),
    };

    Ok(provider)
}
