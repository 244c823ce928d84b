//! # Dispatcher Module
//!
//! The dispatch boundary between the router and registered controllers.
//!
//! Once a request resolves to a module descriptor, the [`ModuleRunner`]:
//!
//! 1. looks up the concrete controller from `(module, controller)` — a miss
//!    is a 500, there is no dynamic class loading to fall back on
//! 2. calls the controller's `init()` lifecycle hook
//! 3. runs the middleware chain (authorization short-circuits here)
//! 4. materializes the action's declared parameter bindings
//! 5. invokes the action and maps its outcome to a terminal response
//!
//! Any panic inside an action is caught at this boundary and converted to a
//! structured 500 envelope. In developer mode the envelope carries the real
//! failure and a truncated trace; in production it carries a generic
//! message and nothing else.

mod core;

pub use core::{
    ActionContext, ActionError, ActionOutcome, ModuleRunner, ShellViewRenderer, ViewPayload,
    ViewRenderer,
};
