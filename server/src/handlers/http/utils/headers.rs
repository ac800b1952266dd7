use hyper::header::{AUTHORIZATION, HeaderMap};
use tracing::{debug, warn};

/// Extract a header value as a string
pub fn get_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(|s| {
        debug!("Retrieved header: {}", name);
        s.to_string()
    })
}

/// Extract bearer token from Authorization header
/// Format: "Authorization: Bearer <token>"
pub fn get_bearer_token(headers: &HeaderMap) -> Option<String> {
    get_header_value(headers, AUTHORIZATION.as_str()).and_then(|auth| {
        match auth.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => {
                debug!("Bearer token extracted");
                Some(token.trim().to_string())
            }
            _ => {
                warn!("Invalid or missing Bearer token");
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use hyper::header::HeaderValue;

    use super::*;

    fn with_auth(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        assert_eq!(
            get_bearer_token(&with_auth("Bearer a.b.c")).as_deref(),
            Some("a.b.c")
        );
    }

    #[test]
    fn other_schemes_are_ignored() {
        assert_eq!(get_bearer_token(&with_auth("Basic abc")), None);
        assert_eq!(get_bearer_token(&with_auth("Bearer ")), None);
        assert_eq!(get_bearer_token(&HeaderMap::new()), None);
    }
}
