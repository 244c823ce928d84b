//! # Server Module
//!
//! Host-agnostic request/response types and the front-controller service
//! that drives the request lifecycle. The actual HTTP listener is a host
//! concern; it parses its native request into [`request::Request`] and
//! writes out the [`response::RenderedResponse`] the service returns.

pub mod request;
pub mod response;
pub mod service;

pub use request::{cli_method, parse_cookies, parse_query_params, Request};
pub use response::{RenderedResponse, Response, ResponseFormat};
pub use service::{AppService, Lifecycle, RouterState, SharedRouter};
