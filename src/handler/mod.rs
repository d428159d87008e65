//! HTTP request handlers
//!
//! Handlers validate input, call into [`crate::store`] and shape the JSON
//! responses. Authentication is expressed through the
//! [`crate::middleware::AuthUser`] and [`crate::middleware::MaybeUser`]
//! extractors.

pub mod ai;
pub mod apps;
pub mod auth;
pub mod data;
