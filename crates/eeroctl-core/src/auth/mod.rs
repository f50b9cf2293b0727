//! Authentication module for managing the vendor session.
//!
//! This module provides:
//! - `Session`: cookie jar persisted to disk, holding the `s` session token
//! - `PendingLogin`: the transient state between `login` and `verify`
//!
//! The session lives in a shared `SessionHandle` handed to the API client.

pub mod pending;
pub mod session;

pub use pending::PendingLogin;
pub use session::{ReceivedCookie, Session, SessionError, SessionHandle, StoredCookie};
