use super::{FieldMap, FieldValue, RawRequest};

/// Implements the projection rules of spec.md §4.1.
///
/// This is a pure function: no locks, no I/O, no fallible SQL lookups —
/// exactly the "no I/O on the evaluation path" contract of spec.md §5.
pub fn project(request: &RawRequest) -> FieldMap {
    let mut fields = FieldMap::new();

    fields.insert(
        "request.method".to_string(),
        FieldValue::Str(request.method.clone()),
    );
    fields.insert(
        "request.url".to_string(),
        FieldValue::Str(request.url.clone()),
    );

    // Every request header under request.headers.<lowercased-name>.
    for (name, value) in request.headers.iter() {
        fields.insert(format!("request.headers.{name}"), FieldValue::Str(value.clone()));
    }

    // request.cf.* from the open meta bag, plus the numeric threat-score
    // default (spec.md §4.1 "Normalize missing numeric threat score to 0").
    for (suffix, value) in &request.meta {
        fields.insert(format!("request.cf.{suffix}"), FieldValue::from(value));
    }
    fields
        .entry("request.cf.threatScore".to_string())
        .or_insert(FieldValue::Num(0.0));

    // derived.uri.* from the parsed URL.
    let (path, query_string, param_count) = parse_uri(&request.url);
    fields.insert("derived.uri.path".to_string(), FieldValue::Str(path));
    fields.insert(
        "derived.uri.query.string".to_string(),
        FieldValue::Str(query_string),
    );
    fields.insert(
        "derived.uri.query.param_count".to_string(),
        FieldValue::Num(param_count as f64),
    );

    // derived.body.has_body from content-length / transfer-encoding.
    let has_body = request
        .headers
        .get("content-length")
        .and_then(|v| v.parse::<u64>().ok())
        .map(|n| n > 0)
        .unwrap_or(false)
        || request
            .headers
            .get("transfer-encoding")
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false);
    fields.insert(
        "derived.body.has_body".to_string(),
        FieldValue::Bool(has_body),
    );

    fields
}

/// Parses `raw` as a URL, falling back to treating it as a bare path when it
/// has no scheme/authority (the common case for an ingested WAF request,
/// which carries only `path?query`, not a full absolute URL).
fn parse_uri(raw: &str) -> (String, String, usize) {
    let parsed = url::Url::parse(raw).or_else(|_| {
        let with_slash = if raw.starts_with('/') {
            raw.to_string()
        } else {
            format!("/{raw}")
        };
        url::Url::parse(&format!("http://placeholder.invalid{with_slash}"))
    });

    match parsed {
        Ok(url) => {
            let path = url.path().to_string();
            let query_string = url.query().unwrap_or("").to_string();
            let param_count = url.query_pairs().count();
            (path, query_string, param_count)
        }
        Err(_) => (raw.to_string(), String::new(), 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{HeaderMap, MetaValue};
    use std::collections::HashMap;

    fn req(url: &str) -> RawRequest {
        RawRequest {
            method: "GET".to_string(),
            url: url.to_string(),
            headers: HeaderMap::new(),
            meta: HashMap::new(),
        }
    }

    #[test]
    fn derives_path_and_query() {
        let fields = project(&req("/api/users?page=2&limit=10"));
        assert_eq!(
            fields.get("derived.uri.path").unwrap().as_str(),
            Some("/api/users")
        );
        assert_eq!(
            fields.get("derived.uri.query.string").unwrap().as_str(),
            Some("page=2&limit=10")
        );
        assert_eq!(
            fields.get("derived.uri.query.param_count").unwrap().as_number(),
            Some(2.0)
        );
    }

    #[test]
    fn missing_meta_threat_score_defaults_to_zero() {
        let fields = project(&req("/"));
        assert_eq!(
            fields.get("request.cf.threatScore").unwrap().as_number(),
            Some(0.0)
        );
        // Other meta-derived fields stay genuinely absent.
        assert!(fields.get("request.cf.country").is_none());
    }

    #[test]
    fn has_body_from_content_length() {
        let mut r = req("/upload");
        r.headers.insert("content-length", "128");
        let fields = project(&r);
        assert_eq!(fields.get("derived.body.has_body").unwrap(), &FieldValue::Bool(true));
    }

    #[test]
    fn has_body_from_chunked_transfer_encoding() {
        let mut r = req("/upload");
        r.headers.insert("transfer-encoding", "chunked");
        let fields = project(&r);
        assert_eq!(fields.get("derived.body.has_body").unwrap(), &FieldValue::Bool(true));
    }

    #[test]
    fn headers_are_projected_lowercased() {
        let mut r = req("/");
        r.headers.insert("User-Agent", "curl/8.0");
        let fields = project(&r);
        assert_eq!(
            fields.get("request.headers.user-agent").unwrap().as_str(),
            Some("curl/8.0")
        );
    }

    #[test]
    fn meta_copied_under_cf_prefix() {
        let mut r = req("/");
        r.meta.insert("country".to_string(), MetaValue::String("T1".to_string()));
        r.meta.insert(
            "botManagement.score".to_string(),
            MetaValue::Number(12.0),
        );
        let fields = project(&r);
        assert_eq!(
            fields.get("request.cf.country").unwrap().as_str(),
            Some("T1")
        );
        assert_eq!(
            fields.get("request.cf.botManagement.score").unwrap().as_number(),
            Some(12.0)
        );
    }
}
