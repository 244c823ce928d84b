//! Response types and the API envelope.
//!
//! Every API-shaped response — success or error — shares one envelope:
//!
//! ```json
//! {
//!   "result": ...,
//!   "code": 200,
//!   "status": "success",
//!   "core": { "generation": "0.0042 sec.", "memory": "18.3 MB" },
//!   "debug": { ... }
//! }
//! ```
//!
//! Callers never need a separate parser for errors. The `debug` block is
//! attached only in developer mode; the `core` block is filled at emission
//! time so `generation` covers the whole request.

use serde::Serialize;
use serde_json::{json, Value};
use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::time::Instant;

/// Frame cap for the `debug.trace` block.
pub const MAX_TRACE_FRAMES: usize = 15;

/// Output format of an envelope response. JSON is the default; the
/// alternates re-render the same envelope shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Xml,
    Text,
    Html,
}

impl ResponseFormat {
    /// Pick a format from an `Accept` header value.
    pub fn negotiate(accept: Option<&str>) -> Self {
        match accept {
            Some(a) if a.contains("application/xml") || a.contains("text/xml") => {
                ResponseFormat::Xml
            }
            Some(a) if a.contains("text/html") => ResponseFormat::Html,
            Some(a) if a.contains("text/plain") => ResponseFormat::Text,
            _ => ResponseFormat::Json,
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
            ResponseFormat::Xml => "application/xml",
            ResponseFormat::Text => "text/plain",
            ResponseFormat::Html => "text/html",
        }
    }
}

/// Identifies the action an envelope was produced by.
#[derive(Debug, Clone, Serialize)]
pub struct Caller {
    pub module: String,
    pub controller: String,
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

/// Developer-mode diagnostic block.
///
/// Contains the bearer token and a stack trace; the developer flag gating
/// this block must never be set in production.
#[derive(Debug, Clone, Serialize)]
pub struct DebugBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<Caller>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer: Option<String>,
    pub method: String,
    pub uri: String,
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_language: Option<String>,
    pub trace: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl DebugBlock {
    pub fn capture(
        caller: Option<Caller>,
        request: &crate::server::request::Request,
        error: Option<ErrorDetail>,
    ) -> Self {
        Self {
            caller,
            bearer: request.bearer_token().map(str::to_string),
            method: request.method.to_string(),
            uri: request.path.clone(),
            headers: request.headers.clone(),
            session_language: request.session_language.clone(),
            trace: capture_trace(),
            error,
        }
    }
}

/// Capture the current stack, truncated to [`MAX_TRACE_FRAMES`] frames.
fn capture_trace() -> Vec<String> {
    let raw = Backtrace::force_capture().to_string();
    raw.lines()
        .map(str::trim)
        .filter(|l| {
            l.split(':')
                .next()
                .map(|n| n.chars().all(|c| c.is_ascii_digit()) && !n.is_empty())
                .unwrap_or(false)
        })
        .take(MAX_TRACE_FRAMES)
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
enum Payload {
    Envelope {
        result: Value,
        code: u16,
        status: String,
        debug: Option<DebugBlock>,
    },
    Html(String),
    Text(String),
    Redirect(String),
}

/// A terminal response value.
///
/// The dispatch pipeline returns these instead of writing output or raising
/// out-of-band; "emit and stop" is modeled as "return the response".
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    payload: Payload,
    format: ResponseFormat,
}

impl Response {
    /// An envelope response; the HTTP status mirrors `code`.
    pub fn envelope(code: u16, status: impl Into<String>, result: Value) -> Self {
        Self {
            status: code,
            headers: Vec::new(),
            payload: Payload::Envelope {
                result,
                code,
                status: status.into(),
                debug: None,
            },
            format: ResponseFormat::Json,
        }
    }

    pub fn envelope_success(result: Value) -> Self {
        Self::envelope(200, "success", result)
    }

    pub fn envelope_error(code: u16, result: impl Into<Value>) -> Self {
        Self::envelope(code, "error", result.into())
    }

    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            payload: Payload::Html(body.into()),
            format: ResponseFormat::Html,
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            payload: Payload::Text(body.into()),
            format: ResponseFormat::Text,
        }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            status: 302,
            headers: vec![("location".to_string(), location.clone())],
            payload: Payload::Redirect(location),
            format: ResponseFormat::Html,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Re-render the envelope in another format (JSON default).
    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        if matches!(self.payload, Payload::Envelope { .. }) {
            self.format = format;
        }
        self
    }

    /// Attach the developer diagnostic block. No-op for non-envelope bodies.
    pub fn attach_debug(&mut self, block: DebugBlock) {
        if let Payload::Envelope { debug, .. } = &mut self.payload {
            *debug = Some(block);
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        matches!(self.payload, Payload::Redirect(_))
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match &self.payload {
            Payload::Redirect(l) => Some(l.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn envelope_code(&self) -> Option<u16> {
        match &self.payload {
            Payload::Envelope { code, .. } => Some(*code),
            _ => None,
        }
    }

    #[must_use]
    pub fn envelope_status(&self) -> Option<&str> {
        match &self.payload {
            Payload::Envelope { status, .. } => Some(status.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn envelope_result(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Envelope { result, .. } => Some(result),
            _ => None,
        }
    }

    #[must_use]
    pub fn has_debug(&self) -> bool {
        matches!(
            &self.payload,
            Payload::Envelope { debug: Some(_), .. }
        )
    }

    /// The full envelope value as it will be emitted, with the `core` block
    /// computed against `started`.
    #[must_use]
    pub fn envelope_value(&self, started: Instant) -> Option<Value> {
        match &self.payload {
            Payload::Envelope {
                result,
                code,
                status,
                debug,
            } => {
                let mut envelope = json!({
                    "result": result,
                    "code": code,
                    "status": status,
                    "core": core_stats(started),
                });
                if let Some(block) = debug {
                    if let (Some(obj), Ok(dbg)) =
                        (envelope.as_object_mut(), serde_json::to_value(block))
                    {
                        obj.insert("debug".to_string(), dbg);
                    }
                }
                Some(envelope)
            }
            _ => None,
        }
    }

    /// Materialize the response for emission.
    #[must_use]
    pub fn render(&self, started: Instant) -> RenderedResponse {
        let (content_type, body) = match &self.payload {
            Payload::Envelope { .. } => {
                let envelope = self
                    .envelope_value(started)
                    .unwrap_or(Value::Null);
                let body = match self.format {
                    ResponseFormat::Json => envelope.to_string(),
                    ResponseFormat::Xml => value_to_xml("response", &envelope),
                    ResponseFormat::Text => {
                        serde_json::to_string_pretty(&envelope).unwrap_or_default()
                    }
                    ResponseFormat::Html => format!(
                        "<!doctype html><html><body><pre>{}</pre></body></html>",
                        escape_html(
                            &serde_json::to_string_pretty(&envelope).unwrap_or_default()
                        )
                    ),
                };
                (self.format.content_type(), body)
            }
            Payload::Html(body) => ("text/html", body.clone()),
            Payload::Text(body) => ("text/plain", body.clone()),
            Payload::Redirect(_) => ("text/html", String::new()),
        };

        let mut headers = self.headers.clone();
        headers.push(("content-type".to_string(), content_type.to_string()));

        RenderedResponse {
            status: self.status,
            headers,
            body,
        }
    }
}

/// Wire-ready response: status, headers (content type included), body.
#[derive(Debug, Clone)]
pub struct RenderedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// The envelope `core` block.
fn core_stats(started: Instant) -> Value {
    let memory = memory_stats::memory_stats()
        .map(|s| humanize_bytes(s.physical_mem))
        .unwrap_or_else(|| "unknown".to_string());
    json!({
        "generation": format!("{:.4} sec.", started.elapsed().as_secs_f64()),
        "memory": memory,
    })
}

fn humanize_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Minimal XML rendering of a JSON value; arrays emit repeated `<item>`
/// elements, map keys become element names verbatim.
fn value_to_xml(tag: &str, value: &Value) -> String {
    let inner = match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => escape_html(s),
        Value::Array(items) => items
            .iter()
            .map(|v| value_to_xml("item", v))
            .collect::<String>(),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| value_to_xml(k, v))
            .collect::<String>(),
    };
    format!("<{tag}>{inner}</{tag}>")
}
