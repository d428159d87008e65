//! Library exports for the app builder
//!
//! - [`layout`]: the layout document model, direct-manipulation arithmetic
//!   and the editing session
//! - [`client`]: the editor-side API client
//! - everything else: the axum service persisting apps, data records and users

pub mod ai;
pub mod auth;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod handler;
pub mod layout;
pub mod middleware;
pub mod model;
pub mod route;
pub mod store;
