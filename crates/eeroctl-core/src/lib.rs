//! Core library for eeroctl.
//!
//! Everything the front-ends share: the cookie-authenticated API client,
//! the persisted session, configuration, payload models and the
//! wait-for-pause-then-unpause workflow.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod workflow;

pub use api::{ApiError, EeroClient, ResourceRef};
pub use auth::{PendingLogin, Session, SessionHandle};
pub use config::{Config, NamedProfile};

#[cfg(feature = "test-util")]
pub use api::transport::scripted as testing;
