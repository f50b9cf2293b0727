use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{error, info};

use eeroctl_core::models::Device;
use eeroctl_core::workflow::{self, PollSettings, ProfileTarget};
use eeroctl_core::{ApiError, PendingLogin};

use super::error::{success, RouteError};
use super::AppState;

type RouteResult = Result<Json<Value>, RouteError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    #[serde(default)]
    phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    #[serde(default)]
    code: Option<String>,
}

/// Resolve a profile key to something we can observe and pause
fn target<'a>(state: &'a AppState, key: &str) -> Result<ProfileTarget<'a>, RouteError> {
    let profile = state
        .config
        .profile(key)
        .ok_or_else(|| RouteError::unknown_profile(key))?;
    let network = profile
        .network()
        .or_else(|| state.config.network_ref())
        .ok_or_else(|| {
            RouteError::from(ApiError::InvalidReference(format!(
                "no network known for profile {}",
                key
            )))
        })?;
    Ok(ProfileTarget::new(&state.client, network, profile.clone()))
}

fn device_summary(device: &Device) -> Value {
    json!({
        "nickname": device.nickname,
        "mac": device.mac,
        "ip": device.ip,
        "connected": device.connected,
        "paused": device.paused,
    })
}

fn body(map: Map<String, Value>) -> Json<Value> {
    Json(Value::Object(map))
}

pub async fn status_all(State(state): State<Arc<AppState>>) -> RouteResult {
    let mut result = Map::new();
    for key in state.config.profiles.keys() {
        let target = target(&state, key)?;
        match target.device().await {
            Ok(device) => {
                result.insert(
                    key.clone(),
                    json!({ "name": target.profile().name, "device": device_summary(&device) }),
                );
            }
            Err(ApiError::NotFound(_)) => continue,
            Err(err) => {
                error!(error = %err, "Error getting all status");
                return Err(err.into());
            }
        }
    }
    Ok(body(result))
}

pub async fn status(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> RouteResult {
    let target = target(&state, &key)?;
    let device = target.device().await.map_err(|err| {
        error!(profile = %key, error = %err, "Error getting status");
        RouteError::from(err)
    })?;
    Ok(Json(json!({
        "profile": key,
        "name": target.profile().name,
        "device": device_summary(&device),
    })))
}

async fn set_paused(state: &AppState, key: String, paused: bool) -> RouteResult {
    let target = target(state, &key)?;
    let verb = if paused { "paused" } else { "unpaused" };
    target.set_paused(paused).await.map_err(|err| {
        error!(profile = %key, error = %err, "Error setting paused state");
        RouteError::from(err)
    })?;

    let mut result = success(format!("{} {} successfully", target.profile().name, verb));
    result.insert("profile".to_string(), Value::String(key));
    Ok(body(result))
}

pub async fn pause(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> RouteResult {
    set_paused(&state, key, true).await
}

pub async fn unpause(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> RouteResult {
    set_paused(&state, key, false).await
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginBody>, JsonRejection>,
) -> RouteResult {
    let Json(req) = payload?;
    let phone = req
        .phone_number
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| RouteError::bad_request("Phone number is required"))?;

    let mut pending = state.login.lock().await;
    state.client.login(&phone).await.map_err(|err| {
        error!(error = %err, "Error sending login code");
        RouteError::from(err)
    })?;
    let flow = PendingLogin::new(&phone);
    info!(identifier = %flow.masked_identifier(), "Verification code requested");
    *pending = Some(flow);

    let mut result = success("Verification code sent to your phone");
    result.insert("phoneNumber".to_string(), Value::String(phone));
    Ok(body(result))
}

pub async fn verify(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerifyBody>, JsonRejection>,
) -> RouteResult {
    let Json(req) = payload?;
    let code = req
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| RouteError::bad_request("Verification code is required"))?;

    let mut pending = state.login.lock().await;
    state.client.verify(&code).await.map_err(|err| {
        error!(error = %err, "Error verifying code");
        RouteError::from(err).with("hint", "Make sure the code is correct and hasn't expired")
    })?;
    *pending = None;

    Ok(body(success("Successfully authenticated! Cookie saved.")))
}

pub async fn auth_status(State(state): State<Arc<AppState>>) -> RouteResult {
    let authenticated = state.client.is_authenticated();
    let pending_verification = state
        .login
        .lock()
        .await
        .as_ref()
        .map(|p| !p.is_stale())
        .unwrap_or(false);
    let message = if authenticated {
        "Authenticated"
    } else {
        "Not authenticated - please login"
    };
    Ok(Json(json!({
        "authenticated": authenticated,
        "pending_verification": pending_verification,
        "message": message,
    })))
}

pub async fn unpause_when_ready(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> RouteResult {
    let target = target(&state, &key)?;
    let name = target.profile().name.clone();
    info!(profile = %name, "Starting unpause-when-ready");

    let settings = PollSettings::from(&state.config.poll);
    let cancel = state.shutdown.child_token();
    match workflow::unpause_when_ready(&target, &settings, &cancel).await {
        Ok(report) => {
            let mut result = success(format!(
                "{} unpaused successfully after waiting for pause",
                name
            ));
            result.insert("profile".to_string(), Value::String(key));
            result.insert("attempts".to_string(), json!(report.attempts));
            Ok(body(result))
        }
        Err(err) => {
            error!(profile = %name, error = %err, "Error in unpause-when-ready");
            Err(RouteError::from(err).with("profile", key))
        }
    }
}
