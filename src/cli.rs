//! Command-line entry points sharing the HTTP route table.
//!
//! Routes declared with the synthetic `CLI` pseudo-method resolve through
//! the same table and dispatch pipeline as HTTP routes; `portico routes`
//! additionally dumps the loaded table for inspection.
//!
//! Hosts embed this by parsing their process arguments and handing them to
//! [`run`]:
//!
//! ```rust,ignore
//! use clap::Parser;
//!
//! let cli = portico::cli::Cli::parse();
//! std::process::exit(portico::cli::run(&service, cli));
//! ```

use crate::server::request::{cli_method, Request};
use crate::server::service::AppService;
use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "portico", about = "Route table inspection and CLI dispatch")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every registered route in registration order.
    Routes,
    /// Resolve and dispatch a CLI route.
    Call {
        /// Route path, e.g. `reports/rebuild`.
        path: String,
        /// JSON body handed to the action.
        #[arg(long)]
        body: Option<String>,
    },
}

/// Execute a parsed command against an assembled service. Returns the
/// process exit code.
pub fn run(service: &AppService, cli: Cli) -> i32 {
    match cli.command {
        Command::Routes => {
            let state = service.router_state();
            let table = state.router.table();
            println!("[routes] count={}", table.len());
            let mut methods: Vec<_> = table.methods().collect();
            methods.sort_by_key(|m| m.as_str().to_string());
            for method in methods {
                for entry in table.entries(method) {
                    println!(
                        "[route] {} /{} -> {}.{}::{}",
                        method, entry.pattern, entry.module, entry.controller, entry.action
                    );
                }
            }
            0
        }
        Command::Call { path, body } => {
            let mut request = Request::new(cli_method(), path);
            if let Some(raw) = body {
                match serde_json::from_str::<Value>(&raw) {
                    Ok(value) => request.body = Some(value),
                    Err(e) => {
                        eprintln!("invalid --body JSON: {e}");
                        return 2;
                    }
                }
            }
            let rendered = service.respond(request);
            println!("{}", rendered.body);
            if rendered.status < 400 {
                0
            } else {
                1
            }
        }
    }
}
