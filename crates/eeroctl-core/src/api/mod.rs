//! REST API client module for the eero user API.
//!
//! This module provides the `EeroClient` for communicating with the
//! vendor API to list networks, devices and profiles and to pause them.
//!
//! The API authenticates with an `s` session cookie that the remote sets
//! after SMS verification and that is replayed on every later call.

pub mod client;
pub mod error;
pub mod resource;
pub mod transport;

pub use client::{EeroClient, DEFAULT_GET_RETRIES};
pub use error::ApiError;
pub use resource::ResourceRef;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, RequestBody, Transport};
