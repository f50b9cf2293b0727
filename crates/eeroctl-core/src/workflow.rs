//! Wait for a profile to be paused, then unpause it.
//!
//! A scheduling app pauses a profile on its own timetable; this workflow
//! watches for that pause and lifts it once, so the pause acts as a
//! trigger rather than a block. The loop is bounded and sequential:
//!
//! `Idle -> Polling -> Detected -> Acting -> Done`, or
//! `Polling -> Exhausted -> TimedOut` when the pause never shows up.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::{ApiError, EeroClient, ResourceRef};
use crate::config::{NamedProfile, PollConfig};
use crate::models::Device;

/// Something whose paused state can be observed and lifted
#[async_trait]
pub trait PauseTarget: Send + Sync {
    /// Name used in logs and errors
    fn label(&self) -> &str;

    async fn is_paused(&self) -> Result<bool, ApiError>;

    async fn unpause(&self) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl From<&PollConfig> for PollSettings {
    fn from(config: &PollConfig) -> Self {
        Self {
            interval: config.interval(),
            max_attempts: config.max_attempts,
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    /// Samples taken, including the one that saw the pause
    pub attempts: u32,
}

/// Poll `target` until it reads paused, then unpause it exactly once.
///
/// Errors while sampling are logged and polling continues; an error on the
/// last attempt is returned. Missing login aborts at once since waiting
/// cannot fix it. Running out of attempts is `ApiError::PollTimeout`.
pub async fn unpause_when_ready<T: PauseTarget + ?Sized>(
    target: &T,
    settings: &PollSettings,
    cancel: &CancellationToken,
) -> Result<PollReport, ApiError> {
    let max_attempts = settings.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        attempt += 1;
        info!(profile = target.label(), attempt, max_attempts, "Polling paused state");

        match target.is_paused().await {
            Ok(true) => {
                info!(profile = target.label(), "Paused, unpausing now");
                target.unpause().await?;
                info!(profile = target.label(), attempt, "Unpaused");
                return Ok(PollReport { attempts: attempt });
            }
            Ok(false) => {
                if attempt >= max_attempts {
                    warn!(profile = target.label(), attempt, "Never saw a pause, giving up");
                    return Err(ApiError::PollTimeout {
                        profile: target.label().to_string(),
                        attempts: attempt,
                    });
                }
            }
            Err(err @ ApiError::NotLoggedIn { .. }) => return Err(err),
            Err(err) => {
                warn!(profile = target.label(), attempt, error = %err, "Error during polling");
                if attempt >= max_attempts {
                    return Err(err);
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            _ = tokio::time::sleep(settings.interval) => {}
        }
    }
}

/// A named profile on a network, observed through its first device
pub struct ProfileTarget<'a> {
    client: &'a EeroClient,
    network: ResourceRef,
    profile: NamedProfile,
}

impl<'a> ProfileTarget<'a> {
    pub fn new(client: &'a EeroClient, network: ResourceRef, profile: NamedProfile) -> Self {
        Self {
            client,
            network,
            profile,
        }
    }

    pub fn profile(&self) -> &NamedProfile {
        &self.profile
    }

    /// First device assigned to the profile.
    /// Its paused flag mirrors the profile's.
    pub async fn device(&self) -> Result<Device, ApiError> {
        let devices = self.client.devices(&self.network).await?;
        devices
            .into_iter()
            .find(|d| d.in_profile(&self.profile.profile_url))
            .ok_or_else(|| {
                ApiError::NotFound(format!("No devices found in {} profile", self.profile.name))
            })
    }

    pub async fn set_paused(&self, paused: bool) -> Result<Value, ApiError> {
        self.client
            .set_paused(&self.profile.profile_url, paused)
            .await
    }
}

#[async_trait]
impl<'a> PauseTarget for ProfileTarget<'a> {
    fn label(&self) -> &str {
        &self.profile.name
    }

    async fn is_paused(&self) -> Result<bool, ApiError> {
        Ok(self.device().await?.paused)
    }

    async fn unpause(&self) -> Result<Value, ApiError> {
        self.set_paused(false).await
    }
}
