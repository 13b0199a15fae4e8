//! Claim check service: a TTL cache of authorization decisions in front of a
//! remote authority.
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
