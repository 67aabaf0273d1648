//! CraftHub HTTP API service.
//!
//! This crate provides the HTTP API for the companion website, including:
//!
//! - Registration and login bridged to the game's authentication plugin
//! - The virtual-currency market and purchase ledger
//! - News, donor and playtime toplists, and the server-status snapshot
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **Session tokens** - HS256 JWTs issued at login, for player requests
//! 2. **Admin API key** - the `x-admin-key` header, for operator endpoints

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Some handlers need async only for routing

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fulfill;
pub mod handlers;
pub mod mojang;
pub mod poller;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use fulfill::{FulfillmentSink, LogSink};
pub use mojang::MojangClient;
pub use poller::{HttpStatusSource, StatusSample, StatusSource};
pub use routes::create_router;
pub use state::AppState;
