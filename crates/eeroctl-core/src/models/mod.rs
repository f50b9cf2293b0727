//! Data models for eero API entities.
//!
//! Lenient views of the vendor payloads. Every field is optional or
//! defaulted and unknown fields are ignored, so new firmware fields never
//! break parsing:
//!
//! - `Account`, `NetworkSummary`, `Network`: account and network listings
//! - `Device`, `ProfileLink`, `EeroNode`: clients and mesh nodes
//! - `Profile`, `Schedule`, `NewSchedule`: device groups and their schedules

pub mod account;
pub mod device;
pub mod profile;

pub use account::{Account, Network, NetworkList, NetworkSummary};
pub use device::{Device, EeroNode, ProfileLink};
pub use profile::{NewSchedule, Profile, Schedule};

use crate::api::{ApiError, ResourceRef};

/// Parse an entity's `url` field into a validated reference
pub(crate) fn reference_of(url: Option<&str>, what: &str) -> Result<ResourceRef, ApiError> {
    match url {
        Some(u) => ResourceRef::parse(u),
        None => Err(ApiError::InvalidReference(format!("{} has no url", what))),
    }
}
