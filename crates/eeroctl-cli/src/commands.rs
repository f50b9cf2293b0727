//! One-shot subcommands, also reused by the shell.

use anyhow::{anyhow, bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use eeroctl_core::workflow::{self, PollSettings, ProfileTarget};
use eeroctl_core::{ApiError, Config, EeroClient};

use crate::console::Console;
use crate::shell::render;

/// Resolve a configured profile key
pub fn profile_target<'a>(
    client: &'a EeroClient,
    config: &Config,
    key: &str,
) -> Result<ProfileTarget<'a>> {
    let profile = config.profile(key).ok_or_else(|| {
        let known: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
        anyhow!("Unknown profile: {} (configured: {})", key, known.join(", "))
    })?;
    let network = profile
        .network()
        .or_else(|| config.network_ref())
        .ok_or_else(|| anyhow!("No network known for profile {}", key))?;
    Ok(ProfileTarget::new(client, network, profile.clone()))
}

/// Two-step SMS login. Prompts for anything not given.
pub async fn login(client: &EeroClient, console: &mut Console, phone: Option<String>) -> Result<()> {
    let phone = match phone {
        Some(phone) => phone,
        None => console
            .ask("Enter your phone # for SMS verification: ")
            .await?
            .unwrap_or_default(),
    };
    if phone.is_empty() {
        bail!("No phone # given");
    }
    client
        .login(&phone)
        .await
        .context("Failed to request verification code")?;

    let code = console
        .ask("Enter the code you received: ")
        .await?
        .unwrap_or_default();
    if code.is_empty() {
        bail!("No code entered");
    }
    client.verify(&code).await.context("Verify failed")?;
    println!("Logged in");
    Ok(())
}

pub fn logout(client: &EeroClient) -> Result<()> {
    client.logout().context("Failed to clear session")?;
    println!("Logged out");
    Ok(())
}

/// Print the device standing in for one profile, or for every configured profile
pub async fn status(client: &EeroClient, config: &Config, key: Option<&str>) -> Result<()> {
    let listing_all = key.is_none();
    let keys: Vec<&str> = match key {
        Some(key) => vec![key],
        None => config.profiles.keys().map(String::as_str).collect(),
    };
    if keys.is_empty() {
        bail!("No profiles configured");
    }

    for key in keys {
        let target = profile_target(client, config, key)?;
        match target.device().await {
            Ok(device) => println!("{}", render::device_status(&target.profile().name, &device)),
            // Listing everything: a profile without devices is not an error
            Err(ApiError::NotFound(message)) if listing_all => println!("{}", message),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

pub async fn set_paused(client: &EeroClient, config: &Config, key: &str, paused: bool) -> Result<()> {
    let target = profile_target(client, config, key)?;
    target.set_paused(paused).await.with_context(|| {
        format!(
            "Error {} {}",
            if paused { "pausing" } else { "unpausing" },
            target.profile().name
        )
    })?;
    println!(
        "{} {} successfully",
        target.profile().name,
        if paused { "paused" } else { "unpaused" }
    );
    Ok(())
}

/// Wait for the profile's scheduled pause, then lift it. Ctrl+C stops waiting.
pub async fn unpause_when_ready(client: &EeroClient, config: &Config, key: &str) -> Result<()> {
    let target = profile_target(client, config, key)?;
    let settings = PollSettings::from(&config.poll);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    println!(
        "Waiting for {} to be paused (every {}s, up to {} checks)...",
        target.profile().name,
        settings.interval.as_secs(),
        settings.max_attempts
    );
    let report = workflow::unpause_when_ready(&target, &settings, &cancel).await?;
    info!(attempts = report.attempts, "Unpause-when-ready finished");
    println!(
        "{} unpaused successfully after waiting for pause",
        target.profile().name
    );
    Ok(())
}
