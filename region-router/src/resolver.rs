//! Region resolution and redirect policy.
//!
//! Given a request's path, query, correlation cookie and geo hints, together with the
//! current directory snapshot, decides whether the request is served as-is, served with a
//! fresh correlation cookie, or redirected to a region-prefixed URL. Pure and synchronous;
//! the HTTP service does all I/O around it.

use crate::exclusions::segments;
use crate::geo::GeoHints;
use region_directory::DirectorySnapshot;

/// The request attributes the policy looks at.
#[derive(Clone, Copy, Debug)]
pub struct RegionRequest<'a> {
    pub path: &'a str,
    /// Raw query string without the leading `?`
    pub query: Option<&'a str>,
    /// `scheme://host[:port]`, or empty for a relative redirect
    pub origin: &'a str,
    /// Existing correlation cookie, if the client sent one
    pub cache_id: Option<&'a str>,
    pub geo: &'a GeoHints,
}

/// Static settings of the policy.
#[derive(Clone, Debug)]
pub struct RegionPolicy {
    fallback_region: String,
}

impl RegionPolicy {
    pub fn new(fallback_region: &str) -> Self {
        RegionPolicy {
            fallback_region: fallback_region.trim().to_ascii_lowercase(),
        }
    }

    pub fn fallback_region(&self) -> &str {
        &self.fallback_region
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    PassThrough,
    /// Serve the request and set a new correlation cookie
    PassThroughSetCookie,
    /// Temporary, method-preserving (307) redirect
    Redirect { location: String },
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::PassThrough => "pass_through",
            Decision::PassThroughSetCookie => "set_cookie",
            Decision::Redirect { .. } => "redirect",
        }
    }
}

/// First path segment, lowercased.
fn first_segment(path: &str) -> Option<String> {
    segments(path).next().map(str::to_ascii_lowercase)
}

/// A path whose final segment contains a dot is treated as a file request.
fn is_static_asset(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|last| last.contains('.'))
}

/// Picks the country for a request. The first candidate present in the directory wins:
/// path prefix, primary hint, secondary hint, default region, then the directory's first entry.
///
/// The empty-string key a region without country codes leaves in the directory is never
/// picked, since redirecting to it would produce `//path` and loop.
pub fn resolve_country(
    path_country: Option<&str>,
    geo: &GeoHints,
    default_region: &str,
    snapshot: &DirectorySnapshot,
) -> Option<String> {
    [
        path_country,
        geo.primary.as_deref(),
        geo.secondary.as_deref(),
        Some(default_region),
    ]
    .into_iter()
    .flatten()
    .find(|candidate| !candidate.is_empty() && snapshot.contains(candidate))
    .or_else(|| snapshot.countries().find(|c| !c.is_empty()))
    .map(String::from)
}

/// `{origin}/{country}{path}{?query}`. The root path maps to `/{country}` without a trailing slash.
fn redirect_location(request: &RegionRequest<'_>, country: &str) -> String {
    let path = match request.path {
        "" | "/" => "",
        path => path,
    };

    let query = match request.query {
        Some(q) if !q.is_empty() => format!("?{q}"),
        _ => String::new(),
    };

    format!("{}/{country}{path}{query}", request.origin)
}

fn redirect(request: &RegionRequest<'_>, country: &str) -> Decision {
    Decision::Redirect {
        location: redirect_location(request, country),
    }
}

fn pass_with_cookie(request: &RegionRequest<'_>) -> Decision {
    match request.cache_id {
        Some(_) => Decision::PassThrough,
        None => Decision::PassThroughSetCookie,
    }
}

/// Decides how to serve `request` given the current directory.
pub fn decide(
    request: &RegionRequest<'_>,
    snapshot: &DirectorySnapshot,
    policy: &RegionPolicy,
) -> Decision {
    let path_country = first_segment(request.path);
    let fallback = policy.fallback_region();
    let on_fallback = path_country.as_deref() == Some(fallback);

    // No regions configured
    if snapshot.is_empty() {
        return if on_fallback {
            Decision::PassThrough
        } else {
            redirect(request, fallback)
        };
    }

    let country = resolve_country(path_country.as_deref(), request.geo, fallback, snapshot);

    if path_country.is_some() && path_country == country {
        return pass_with_cookie(request);
    }

    if is_static_asset(request.path) {
        return Decision::PassThrough;
    }

    match country {
        Some(country) => redirect(request, &country),
        None if on_fallback => pass_with_cookie(request),
        None => redirect(request, fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use region_directory::Region;
    use std::time::Instant;

    const ORIGIN: &str = "https://shop.example.com";

    fn snapshot(regions: &[(&str, &[&str])]) -> DirectorySnapshot {
        DirectorySnapshot::from_regions(
            regions
                .iter()
                .map(|(id, countries)| Region::new(*id, countries.iter().copied()))
                .collect(),
            Instant::now(),
        )
    }

    fn us_dk() -> DirectorySnapshot {
        snapshot(&[("reg_1", &["us"]), ("reg_2", &["dk"])])
    }

    fn request<'a>(path: &'a str, cache_id: Option<&'a str>, geo: &'a GeoHints) -> RegionRequest<'a> {
        RegionRequest {
            path,
            query: None,
            origin: ORIGIN,
            cache_id,
            geo,
        }
    }

    fn redirect_to(location: &str) -> Decision {
        Decision::Redirect {
            location: location.to_string(),
        }
    }

    fn no_geo() -> GeoHints {
        GeoHints::default()
    }

    #[test]
    fn test_default_region_redirect() {
        let geo = no_geo();
        let decision = decide(
            &request("/products/shirt", None, &geo),
            &us_dk(),
            &RegionPolicy::new("dk"),
        );
        assert_eq!(
            decision,
            redirect_to("https://shop.example.com/dk/products/shirt")
        );
    }

    #[test]
    fn test_prefixed_with_cookie_passes_through() {
        let geo = no_geo();
        let decision = decide(
            &request("/us/products/shirt", Some("cache-1"), &geo),
            &us_dk(),
            &RegionPolicy::new("dk"),
        );
        assert_eq!(decision, Decision::PassThrough);
    }

    #[test]
    fn test_prefixed_without_cookie_sets_cookie() {
        let geo = no_geo();
        let decision = decide(
            &request("/us/products/shirt", None, &geo),
            &us_dk(),
            &RegionPolicy::new("dk"),
        );
        assert_eq!(decision, Decision::PassThroughSetCookie);
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let geo = no_geo();
        let decision = decide(
            &request("/US/store", Some("c"), &geo),
            &us_dk(),
            &RegionPolicy::new("dk"),
        );
        assert_eq!(decision, Decision::PassThrough);
    }

    #[test]
    fn test_country_precedence() {
        let snapshot = snapshot(&[("reg_1", &["us", "ca"]), ("reg_2", &["dk", "se"])]);

        let geo = GeoHints {
            primary: Some("se".into()),
            secondary: Some("ca".into()),
        };
        // Path prefix beats geo hints
        assert_eq!(
            resolve_country(Some("dk"), &geo, "us", &snapshot).as_deref(),
            Some("dk")
        );
        // Unknown prefix falls through to the primary hint
        assert_eq!(
            resolve_country(Some("products"), &geo, "us", &snapshot).as_deref(),
            Some("se")
        );

        let geo = GeoHints {
            primary: Some("fr".into()),
            secondary: Some("ca".into()),
        };
        assert_eq!(
            resolve_country(None, &geo, "us", &snapshot).as_deref(),
            Some("ca")
        );

        let geo = GeoHints {
            primary: Some("fr".into()),
            secondary: None,
        };
        assert_eq!(
            resolve_country(None, &geo, "dk", &snapshot).as_deref(),
            Some("dk")
        );

        // Unknown default falls back to the first directory entry
        assert_eq!(
            resolve_country(None, &geo, "fr", &snapshot).as_deref(),
            Some("us")
        );

        assert_eq!(
            resolve_country(None, &geo, "fr", &DirectorySnapshot::empty()),
            None
        );
    }

    #[test]
    fn test_geo_hint_redirect() {
        let geo = GeoHints {
            primary: Some("us".into()),
            secondary: None,
        };
        let decision = decide(
            &request("/products/shirt", None, &geo),
            &us_dk(),
            &RegionPolicy::new("dk"),
        );
        assert_eq!(
            decision,
            redirect_to("https://shop.example.com/us/products/shirt")
        );
    }

    #[test]
    fn test_redirect_preserves_query() {
        let geo = no_geo();
        let mut req = request("/products", None, &geo);
        req.query = Some("page=2&sort=price");

        let decision = decide(&req, &us_dk(), &RegionPolicy::new("us"));
        assert_eq!(
            decision,
            redirect_to("https://shop.example.com/us/products?page=2&sort=price")
        );

        req.query = Some("");
        let decision = decide(&req, &us_dk(), &RegionPolicy::new("us"));
        assert_eq!(decision, redirect_to("https://shop.example.com/us/products"));
    }

    #[test]
    fn test_root_redirect_has_no_trailing_slash() {
        let geo = no_geo();
        let decision = decide(&request("/", None, &geo), &us_dk(), &RegionPolicy::new("dk"));
        assert_eq!(decision, redirect_to("https://shop.example.com/dk"));

        let mut req = request("/", None, &geo);
        req.query = Some("ref=ad");
        let decision = decide(&req, &us_dk(), &RegionPolicy::new("dk"));
        assert_eq!(decision, redirect_to("https://shop.example.com/dk?ref=ad"));
    }

    #[test]
    fn test_relative_redirect_without_origin() {
        let geo = no_geo();
        let mut req = request("/cart", None, &geo);
        req.origin = "";
        let decision = decide(&req, &us_dk(), &RegionPolicy::new("us"));
        assert_eq!(decision, redirect_to("/us/cart"));
    }

    #[test]
    fn test_static_assets_never_redirect() {
        let geo = GeoHints {
            primary: Some("us".into()),
            secondary: None,
        };
        for path in ["/logo.png", "/robots.txt", "/fonts/inter.woff2", "/dk/x/manifest.json"] {
            for cache_id in [None, Some("c")] {
                let decision = decide(
                    &request(path, cache_id, &geo),
                    &us_dk(),
                    &RegionPolicy::new("dk"),
                );
                assert!(
                    !matches!(decision, Decision::Redirect { .. }),
                    "{path} redirected: {decision:?}"
                );
            }
        }
    }

    #[test]
    fn test_unknown_prefix_is_kept_in_redirect() {
        let geo = no_geo();
        let decision = decide(
            &request("/fr/products", Some("c"), &geo),
            &us_dk(),
            &RegionPolicy::new("dk"),
        );
        assert_eq!(
            decision,
            redirect_to("https://shop.example.com/dk/fr/products")
        );
    }

    #[test]
    fn test_empty_directory() {
        let empty = DirectorySnapshot::empty();
        let policy = RegionPolicy::new("us");
        let geo = GeoHints {
            primary: Some("dk".into()),
            secondary: None,
        };

        for path in ["/", "/products/shirt", "/dk/products", "/logo.png"] {
            let decision = decide(&request(path, None, &geo), &empty, &policy);
            let expected_path = if path == "/" { "" } else { path };
            assert_eq!(
                decision,
                redirect_to(&format!("https://shop.example.com/us{expected_path}"))
            );
        }

        // The fallback-prefixed path itself passes, with or without a cookie
        for cache_id in [None, Some("c")] {
            let decision = decide(&request("/us/products", cache_id, &geo), &empty, &policy);
            assert_eq!(decision, Decision::PassThrough);
        }
        let decision = decide(&request("/us", None, &geo), &empty, &policy);
        assert_eq!(decision, Decision::PassThrough);
    }

    #[test]
    fn test_redirect_target_is_fixed_point() {
        let directories = [us_dk(), DirectorySnapshot::empty()];
        let geos = [
            no_geo(),
            GeoHints {
                primary: Some("us".into()),
                secondary: Some("dk".into()),
            },
        ];
        let paths = ["/", "/products/shirt", "/fr/collections", "/account?tab=orders"];

        for snapshot in &directories {
            for geo in &geos {
                for full_path in paths {
                    let (path, query) = match full_path.split_once('?') {
                        Some((p, q)) => (p, Some(q)),
                        None => (full_path, None),
                    };
                    let mut req = request(path, Some("c"), geo);
                    req.query = query;

                    let policy = RegionPolicy::new("dk");
                    let Decision::Redirect { location } = decide(&req, snapshot, &policy) else {
                        panic!("{full_path} should redirect");
                    };

                    let target = location.strip_prefix(ORIGIN).unwrap();
                    let (target_path, target_query) = match target.split_once('?') {
                        Some((p, q)) => (p, Some(q)),
                        None => (target, None),
                    };
                    assert_eq!(target_query, query);

                    let mut next = request(target_path, Some("c"), geo);
                    next.query = target_query;
                    assert_eq!(
                        decide(&next, snapshot, &policy),
                        Decision::PassThrough,
                        "{location} is not a fixed point"
                    );
                }
            }
        }
    }

    #[test]
    fn test_unresolved_country_uses_fallback() {
        // Regions without country codes leave only the empty key behind
        let quirky = snapshot(&[("reg_1", &[""])]);
        let geo = GeoHints {
            primary: Some("".into()),
            secondary: None,
        };
        let policy = RegionPolicy::new("us");

        assert!(!quirky.is_empty());
        assert_eq!(resolve_country(None, &geo, "us", &quirky), None);
        assert_eq!(resolve_country(Some(""), &geo, "", &quirky), None);

        let decision = decide(&request("/products", Some("c"), &geo), &quirky, &policy);
        assert_eq!(decision, redirect_to("https://shop.example.com/us/products"));

        let decision = decide(&request("/", None, &geo), &quirky, &policy);
        assert_eq!(decision, redirect_to("https://shop.example.com/us"));

        let decision = decide(&request("/us/products", Some("c"), &geo), &quirky, &policy);
        assert_eq!(decision, Decision::PassThrough);

        let decision = decide(&request("/us/products", None, &geo), &quirky, &policy);
        assert_eq!(decision, Decision::PassThroughSetCookie);

        // Static assets still pass before the fallback applies
        let decision = decide(&request("/logo.svg", None, &geo), &quirky, &policy);
        assert_eq!(decision, Decision::PassThrough);
    }
}
