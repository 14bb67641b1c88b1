//! Cross-origin gate for the app's own routes.
//!
//! Requests without an `Origin` header (curl, server-to-server) always pass.
//! A present origin must be on the allowlist or be a `*.vercel.app` preview
//! deployment, otherwise the request is refused with 403.

use regex::Regex;
use std::sync::OnceLock;

use crate::config::CorsConfig;

pub const CORS_METHODS:         &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const CORS_ALLOWED_HEADERS: &str = "Content-Type, Authorization";

fn vercel_origin() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https://[-a-z0-9]+\.vercel\.app$").expect("static regex")
    })
}

#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    allowlist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsDecision {
    /// 403 "Not allowed by CORS".
    Forbidden,
    /// 204 answer to an `OPTIONS` preflight.
    Preflight { headers: Vec<(&'static str, String)> },
    /// Hand the request on, adding these headers to the response.
    Continue { headers: Vec<(&'static str, String)> },
}

impl CorsDecision {
    pub fn status(&self) -> u16 {
        match self {
            CorsDecision::Forbidden         => 403,
            CorsDecision::Preflight { .. }  => 204,
            CorsDecision::Continue { .. }   => 200,
        }
    }

    pub fn headers(&self) -> &[(&'static str, String)] {
        match self {
            CorsDecision::Forbidden => &[],
            CorsDecision::Preflight { headers } | CorsDecision::Continue { headers } => headers,
        }
    }
}

impl CorsPolicy {
    pub fn new(allowlist: Vec<String>) -> Self {
        Self { allowlist }
    }

    pub fn from_config(cfg: &CorsConfig) -> Self {
        Self::new(cfg.origins.clone())
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.allowlist.iter().any(|o| o == origin) || vercel_origin().is_match(origin)
    }

    pub fn evaluate(&self, method: &str, origin: Option<&str>) -> CorsDecision {
        let mut headers = Vec::new();
        if let Some(origin) = origin {
            if !self.is_allowed(origin) {
                tracing::debug!(origin, "origin refused");
                return CorsDecision::Forbidden;
            }
            headers.push(("Access-Control-Allow-Origin", origin.to_owned()));
            headers.push(("Access-Control-Allow-Methods", CORS_METHODS.to_owned()));
            headers.push(("Access-Control-Allow-Headers", CORS_ALLOWED_HEADERS.to_owned()));
        }

        if method.eq_ignore_ascii_case("OPTIONS") {
            CorsDecision::Preflight { headers }
        } else {
            CorsDecision::Continue { headers }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CorsPolicy {
        CorsPolicy::new(vec!["https://app.example.com".into()])
    }

    #[test]
    fn missing_origin_passes_without_headers() {
        assert_eq!(policy().evaluate("GET", None), CorsDecision::Continue { headers: vec![] });
        assert_eq!(policy().evaluate("OPTIONS", None).status(), 204);
    }

    #[test]
    fn unknown_origin_is_forbidden() {
        let decision = policy().evaluate("GET", Some("https://evil.example.com"));
        assert_eq!(decision, CorsDecision::Forbidden);
        assert_eq!(decision.status(), 403);
    }

    #[test]
    fn allowlisted_origin_gets_headers() {
        let decision = policy().evaluate("POST", Some("https://app.example.com"));
        assert_eq!(decision.status(), 200);
        assert_eq!(decision.headers(), &[
            ("Access-Control-Allow-Origin", "https://app.example.com".to_owned()),
            ("Access-Control-Allow-Methods", CORS_METHODS.to_owned()),
            ("Access-Control-Allow-Headers", CORS_ALLOWED_HEADERS.to_owned()),
        ]);
    }

    #[test]
    fn vercel_previews_are_allowed() {
        let p = CorsPolicy::default();
        assert!(p.is_allowed("https://my-app-git-main.vercel.app"));
        assert!(p.is_allowed("HTTPS://My-App.VERCEL.app"));
        assert!(!p.is_allowed("http://my-app.vercel.app"));
        assert!(!p.is_allowed("https://a.b.vercel.app"));
        assert!(!p.is_allowed("https://my-app.vercel.app.evil.com"));
    }

    #[test]
    fn preflight_from_allowed_origin() {
        let decision = policy().evaluate("options", Some("https://app.example.com"));
        assert!(matches!(decision, CorsDecision::Preflight { ref headers } if headers.len() == 3));
    }
}
