//! Incoming request representation and parsing helpers.
//!
//! The framework core is host-agnostic: whatever HTTP (or CLI) front end is
//! in use parses its native request into a [`Request`] and hands it to the
//! service. Header keys are lowercased at construction so lookups stay
//! case-insensitive.

use http::Method;
use serde_json::Value;
use std::collections::HashMap;

/// The synthetic pseudo-method used for command-line invocations that share
/// the route table with HTTP routes.
pub fn cli_method() -> Method {
    Method::from_bytes(b"CLI").unwrap_or(Method::GET)
}

/// A parsed incoming request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Raw path, possibly with a query string; normalized during resolution.
    pub path: String,
    /// Header map with lowercase keys.
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    /// JSON body, when one was supplied.
    pub body: Option<Value>,
    /// Originating client address, used for token fingerprint binding.
    pub client_ip: String,
    /// Language the session is pinned to, if any.
    pub session_language: Option<String>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let query_params = parse_query_params(&path);
        Self {
            method,
            path,
            headers: HashMap::new(),
            cookies: HashMap::new(),
            query_params,
            body: None,
            client_ip: String::new(),
            session_language: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        if name.eq_ignore_ascii_case("cookie") {
            self.cookies = parse_cookies(&self.headers);
        }
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = ip.into();
        self
    }

    pub fn with_session_language(mut self, iso: impl Into<String>) -> Self {
        self.session_language = Some(iso.into());
        self
    }

    /// Header lookup; `name` may be any case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// The token from an `Authorization: Bearer <token>` header.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.header("authorization")
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.header("user-agent").unwrap_or("")
    }

    /// Whether a resolution miss should produce an API 404 envelope instead
    /// of the browser-facing error module: JSON content type, or a path
    /// whose first normalized segment is `api`.
    #[must_use]
    pub fn looks_like_api_call(&self, normalized_path: &str) -> bool {
        let json_content = self
            .header("content-type")
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);
        json_content
            || normalized_path == "api"
            || normalized_path.starts_with("api/")
    }
}

/// Split a `Cookie` header into name/value pairs.
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim().to_string();
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse and URL-decode the query string portion of a path.
pub fn parse_query_params(path: &str) -> HashMap<String, String> {
    match path.find('?') {
        Some(pos) => url::form_urlencoded::parse(path[pos + 1..].as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        None => HashMap::new(),
    }
}
