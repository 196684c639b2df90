#![doc = include_str!("../README.md")]

//! # Gatelink
//!
//! A synchronous gateway-interface bridge between an embedding host
//! process and request handlers written against a standard
//! request/response calling convention.
//!
//! ## Features
//! - Per-request environment construction from host-supplied fields
//! - Buffer-, descriptor-, or absent request input, selected exclusively
//! - Buffered and incrementally produced response bodies, one buffer out
//! - Guaranteed release of body-sequence resources on every exit path
//! - A single failure boundary: the host always gets a usable response
//! - Startup-time handler resolution by dotted `"module.attribute"` path
//!
//! ## Example
//! ```no_run
//! use gatelink::{BridgeConfig, Gateway, HostRequest, Registry};
//! # use gatelink::{AppBody, Environ, HandlerError, StartResponse};
//! # fn ping(_e: &mut Environ, s: StartResponse) -> Result<AppBody, HandlerError> {
//! #     s.start("200 OK", [("Content-Type", "text/plain")]);
//! #     Ok(AppBody::new("Pong!"))
//! # }
//!
//! let mut registry = Registry::new();
//! registry.register("hello", "ping_app", ping);
//!
//! let config = BridgeConfig::new().expect("no handler configured");
//! let gateway = Gateway::from_config(&config, &registry).expect("unresolvable handler");
//!
//! // Per request, the host calls:
//! let response = gateway.on_request(HostRequest::new().content("payload"));
//! ```
//!
//! ## Architecture
//! The bridge is built from a few small components:
//!
//! - [`Environ`]: the per-request environment handed to the handler
//! - [`StartResponse`]: the callback declaring status and headers
//! - [`AppBody`]: the handler's chunked body sequence with release hook
//! - [`Gateway`]: the entry point and the one failure boundary
//! - [`Registry`]: the startup handler resolution table
//!
//! ## Configuration
//! Bridge settings can be configured via:
//! - Environment variables (prefixed with `GATELINK_`)
//! - Configuration file (`gatelink.toml`)

pub use crate::body::{AppBody, Bytes};
pub use crate::config::BridgeConfig;
pub use crate::environ::{Environ, ErrorSink, HostRequest, RequestInput, PROTOCOL_VERSION};
pub use crate::error::{BridgeError, HandlerError, StartupError};
pub use crate::gateway::Gateway;
pub use crate::handler::Handler;
pub use crate::registry::Registry;
pub use crate::response::{BodyWriter, BridgedResponse, Headers, StartResponse};

mod body;
mod bridge;
mod config;
mod environ;
mod error;
mod gateway;
mod handler;
mod registry;
mod response;

// Re-export common types
pub use bytes;
