//! C6 — the host router (spec.md §4.6).
//!
//! Resolves an inbound `Host` header to a [`Route`] from the global store's
//! directory: an exact match wins outright; failing that, the
//! longest-suffix left-wildcard route (`*.suffix`) wins. No match means the
//! request is not tenanted here.

use crate::model::Route;

/// Finds the route that should handle `host` among `routes` (typically the
/// global store's full route list).
pub fn resolve<'a>(routes: &'a [Route], host: &str) -> Option<&'a Route> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();

    if let Some(route) = routes.iter().find(|r| r.enabled && r.incoming_host.eq_ignore_ascii_case(&host)) {
        return Some(route);
    }

    routes
        .iter()
        .filter(|r| r.enabled)
        .filter_map(|r| {
            let suffix = r.incoming_host.strip_prefix("*.")?;
            if host.ends_with(suffix) && host.len() > suffix.len() {
                Some((suffix.len(), r))
            } else {
                None
            }
        })
        .max_by_key(|(len, _)| *len)
        .map(|(_, r)| r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OriginType;

    fn route(id: &str, host: &str) -> Route {
        Route {
            id: id.to_string(),
            incoming_host: host.to_string(),
            origin_type: OriginType::Url,
            origin_url: Some("https://origin.example".to_string()),
            origin_service_name: None,
            enabled: true,
        }
    }

    #[test]
    fn exact_match_wins_over_wildcard() {
        let routes = vec![route("wild", "*.example.com"), route("exact", "api.example.com")];
        let resolved = resolve(&routes, "api.example.com").unwrap();
        assert_eq!(resolved.id, "exact");
    }

    #[test]
    fn longest_wildcard_suffix_wins() {
        let routes = vec![route("short", "*.com"), route("long", "*.example.com")];
        let resolved = resolve(&routes, "api.example.com").unwrap();
        assert_eq!(resolved.id, "long");
    }

    #[test]
    fn no_match_returns_none() {
        let routes = vec![route("exact", "api.example.com")];
        assert!(resolve(&routes, "other.example.com").is_none());
    }

    #[test]
    fn disabled_routes_are_skipped() {
        let mut r = route("exact", "api.example.com");
        r.enabled = false;
        assert!(resolve(&[r], "api.example.com").is_none());
    }

    #[test]
    fn host_matching_is_case_insensitive_and_ignores_trailing_dot() {
        let routes = vec![route("exact", "api.example.com")];
        assert!(resolve(&routes, "API.EXAMPLE.COM.").is_some());
    }
}
