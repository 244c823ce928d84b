//! # Middleware Module
//!
//! Pluggable hooks around action invocation. The only middleware the
//! framework installs by itself is [`AuthMiddleware`]; hosts may add their
//! own (metrics, audit logging) through
//! [`ModuleRunner::add_middleware`](crate::dispatcher::ModuleRunner::add_middleware).

mod auth;
mod core;

pub use auth::AuthMiddleware;
pub use core::Middleware;
