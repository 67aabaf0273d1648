//! API handlers.

// Allow precision loss in handlers - the totals we format fit easily in f64
#![allow(clippy::cast_precision_loss)]

pub mod admin;
pub mod auth;
pub mod health;
pub mod market;
pub mod news;
pub mod players;
pub mod server;
pub mod toplist;
