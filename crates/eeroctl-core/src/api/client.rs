//! API client for the eero user API.
//!
//! This module provides the `EeroClient` struct for making cookie-authenticated
//! requests: the SMS login flow, the generic verbs used to browse and mutate
//! resources, and thin helpers for accounts, networks, devices and profiles.

use std::sync::Arc;

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::auth::SessionHandle;
use crate::config::Config;
use crate::models::{Account, Device, EeroNode, Network, NewSchedule, Profile, Schedule};

use super::transport::{ApiRequest, ApiResponse, HttpTransport, RequestBody, Transport};
use super::{ApiError, ResourceRef};

// ============================================================================
// Constants
// ============================================================================

/// Retries used by `get_json` and the domain helpers
pub const DEFAULT_GET_RETRIES: u32 = 1;

/// Message for a rejected verification code
const VERIFY_REJECTED: &str = "You need to login() to set up your session";

/// Statuses accepted for GET, PUT and POST
const OK_ONLY: &[u16] = &[200];

/// Statuses accepted for DELETE
const DELETE_OK: &[u16] = &[200, 204];

/// API client for eero.
/// Clone is cheap - the transport and session are shared.
#[derive(Clone)]
pub struct EeroClient {
    transport: Arc<dyn Transport>,
    session: SessionHandle,
    endpoint: String,
    version: String,
}

impl EeroClient {
    /// Create a client talking HTTP to the configured endpoint
    pub fn new(config: &Config, session: SessionHandle) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(&config.client, config.timeout()).map_err(|source| {
            ApiError::Transport {
                method: "INIT",
                path: config.api_endpoint.clone(),
                source,
            }
        })?;
        Ok(Self::with_transport(config, session, Arc::new(transport)))
    }

    /// Create a client over any transport, sharing the given session
    pub fn with_transport(
        config: &Config,
        session: SessionHandle,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            transport,
            session,
            endpoint: config.api_endpoint.trim_end_matches('/').to_string(),
            version: config.api_version.clone(),
        }
    }

    /// Reference under the API version root, e.g. `versioned("account")`
    pub fn versioned(&self, suffix: &str) -> Result<ResourceRef, ApiError> {
        ResourceRef::parse(&format!("/{}/{}", self.version, suffix.trim_start_matches('/')))
    }

    // ===== Session =====

    /// Local check only: is there a plausible session token?
    pub fn is_authenticated(&self) -> bool {
        self.session.lock().is_authenticated()
    }

    /// Forget the session locally. Does not contact the remote.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session.lock().logout()?;
        Ok(())
    }

    /// Start the SMS login flow for a phone number or email
    pub async fn login(&self, identifier: &str) -> Result<Value, ApiError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ApiError::InvalidInput("login identifier is required".to_string()));
        }
        info!("Requesting verification code");
        self.post_form("login", vec![("login".to_string(), identifier.to_string())])
            .await
    }

    /// Submit the code sent by `login`. The session cookie arrives with the response.
    pub async fn verify(&self, code: &str) -> Result<Value, ApiError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ApiError::InvalidInput("verification code is required".to_string()));
        }
        match self
            .post_form("login/verify", vec![("code".to_string(), code.to_string())])
            .await
        {
            Ok(data) => {
                info!(authenticated = self.is_authenticated(), "Verification accepted");
                Ok(data)
            }
            Err(err) if err.is_unauthorized() => Err(ApiError::Auth(VERIFY_REJECTED.to_string())),
            Err(err) => Err(err),
        }
    }

    /// Ask the remote to extend the current session.
    ///
    /// A 401 here means the session is gone for good, so it is invalidated
    /// locally before the error is returned.
    pub async fn refresh(&self) -> Result<Value, ApiError> {
        match self.post_form("login/refresh", Vec::new()).await {
            Ok(data) => Ok(data),
            Err(err) => {
                if err.is_unauthorized() {
                    warn!("Session refresh rejected, logging out");
                    self.logout()?;
                }
                Err(err)
            }
        }
    }

    // ===== Generic verbs =====

    pub async fn get(&self, path: &ResourceRef) -> Result<Value, ApiError> {
        self.require_login("GET", path)?;
        let response = self.send(Method::GET, path, RequestBody::Empty).await?;
        Self::take_data("GET", path.as_str(), response, OK_ONLY)
    }

    /// GET with session refresh on failure.
    ///
    /// Makes at most `max_retries + 1` attempts. Between attempts the session
    /// is refreshed if it still looks authenticated; a failed refresh ends the
    /// loop with the refresh error. A 401 on the final attempt invalidates the
    /// session.
    pub async fn get_with_retry(
        &self,
        path: &ResourceRef,
        max_retries: u32,
    ) -> Result<Value, ApiError> {
        let mut remaining = max_retries;
        loop {
            let err = match self.get(path).await {
                Ok(data) => return Ok(data),
                Err(err) => err,
            };

            if remaining == 0 {
                if err.is_unauthorized() {
                    warn!(path = %path, "Still unauthorized after retries, logging out");
                    self.logout()?;
                } else {
                    debug!(path = %path, error = %err, "GET failed, no retries left");
                }
                return Err(err);
            }
            remaining -= 1;

            if self.is_authenticated() {
                warn!(path = %path, error = %err, remaining, "GET failed, refreshing session");
                self.refresh().await?;
            } else {
                debug!(path = %path, remaining, "GET failed without a session, retrying");
            }
        }
    }

    /// GET with the default retry budget
    pub async fn get_json(&self, path: &ResourceRef) -> Result<Value, ApiError> {
        self.get_with_retry(path, DEFAULT_GET_RETRIES).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &ResourceRef,
        body: &B,
    ) -> Result<Value, ApiError> {
        self.require_login("PUT", path)?;
        let body = Self::json_body(body)?;
        let response = self.send(Method::PUT, path, body).await?;
        Self::take_data("PUT", path.as_str(), response, OK_ONLY)
    }

    pub async fn post_to_url<B: Serialize + ?Sized>(
        &self,
        path: &ResourceRef,
        body: &B,
    ) -> Result<Value, ApiError> {
        self.require_login("POST", path)?;
        let body = Self::json_body(body)?;
        let response = self.send(Method::POST, path, body).await?;
        Self::take_data("POST", path.as_str(), response, OK_ONLY)
    }

    pub async fn delete(&self, path: &ResourceRef) -> Result<Value, ApiError> {
        self.require_login("DELETE", path)?;
        let response = self.send(Method::DELETE, path, RequestBody::Empty).await?;
        Self::take_data("DELETE", path.as_str(), response, DELETE_OK)
    }

    // ===== Data Fetching Methods =====

    pub async fn account(&self) -> Result<Account, ApiError> {
        self.get_as(&self.versioned("account")?).await
    }

    pub async fn networks(&self) -> Result<Value, ApiError> {
        self.get_json(&self.versioned("networks")?).await
    }

    pub async fn network(&self, network: &ResourceRef) -> Result<Network, ApiError> {
        self.get_as(network).await
    }

    pub async fn devices(&self, network: &ResourceRef) -> Result<Vec<Device>, ApiError> {
        self.get_as(&network.join("devices")?).await
    }

    pub async fn eeros(&self, network: &ResourceRef) -> Result<Vec<EeroNode>, ApiError> {
        self.get_as(&network.join("eeros")?).await
    }

    pub async fn profiles(&self, network: &ResourceRef) -> Result<Vec<Profile>, ApiError> {
        self.get_as(&network.join("profiles")?).await
    }

    pub async fn insights(&self, network: &ResourceRef) -> Result<Value, ApiError> {
        self.get_json(&network.join("insights")?).await
    }

    pub async fn device_blacklist(&self, network: &ResourceRef) -> Result<Value, ApiError> {
        self.get_json(&network.join("device_blacklist")?).await
    }

    pub async fn profile_schedules(&self, profile: &ResourceRef) -> Result<Vec<Schedule>, ApiError> {
        self.get_as(&profile.join("schedules")?).await
    }

    pub async fn eero_connections(&self, eero: &ResourceRef) -> Result<Value, ApiError> {
        self.get_json(&eero.join("connections")?).await
    }

    /// The API triggers a node reboot on GET
    pub async fn reboot_eero(&self, eero: &ResourceRef) -> Result<Value, ApiError> {
        self.get_json(&eero.join("reboot")?).await
    }

    pub async fn reboot(&self, eero_id: &str) -> Result<Value, ApiError> {
        self.reboot_eero(&self.versioned(&format!("eeros/{}", eero_id))?)
            .await
    }

    // ===== Mutations =====

    /// Pause internet access for a device or profile
    pub async fn pause(&self, target: &ResourceRef) -> Result<Value, ApiError> {
        self.set_paused(target, true).await
    }

    pub async fn unpause(&self, target: &ResourceRef) -> Result<Value, ApiError> {
        self.set_paused(target, false).await
    }

    pub async fn set_paused(&self, target: &ResourceRef, paused: bool) -> Result<Value, ApiError> {
        info!(resource = %target, paused, "Setting paused state");
        self.put(target, &serde_json::json!({ "paused": paused })).await
    }

    pub async fn block(&self, device: &ResourceRef) -> Result<Value, ApiError> {
        self.put(device, &serde_json::json!({ "blocked": true })).await
    }

    pub async fn unblock(&self, device: &ResourceRef) -> Result<Value, ApiError> {
        self.put(device, &serde_json::json!({ "blocked": false })).await
    }

    pub async fn delete_device(&self, device: &ResourceRef) -> Result<Value, ApiError> {
        self.delete(device).await
    }

    pub async fn eero_led(&self, eero: &ResourceRef, on: bool) -> Result<Value, ApiError> {
        self.put(&eero.join("led")?, &serde_json::json!({ "led_on": on }))
            .await
    }

    pub async fn create_schedule(
        &self,
        profile: &ResourceRef,
        schedule: &NewSchedule,
    ) -> Result<Value, ApiError> {
        self.post_to_url(&profile.join("schedules")?, schedule).await
    }

    pub async fn update_schedule(
        &self,
        schedule: &ResourceRef,
        changes: &Value,
    ) -> Result<Value, ApiError> {
        self.put(schedule, changes).await
    }

    pub async fn delete_schedule(&self, schedule: &ResourceRef) -> Result<Value, ApiError> {
        self.delete(schedule).await
    }

    // ===== Internals =====

    fn require_login(&self, method: &'static str, path: &ResourceRef) -> Result<(), ApiError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            debug!(method, path = %path, "Not logged in");
            Err(ApiError::NotLoggedIn {
                method,
                path: path.to_string(),
            })
        }
    }

    async fn get_as<T: DeserializeOwned>(&self, path: &ResourceRef) -> Result<T, ApiError> {
        let data = self.get_json(path).await?;
        serde_json::from_value(data).map_err(|e| ApiError::InvalidResponse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// POST a form to an unauthenticated login endpoint under the version root
    async fn post_form(
        &self,
        suffix: &str,
        fields: Vec<(String, String)>,
    ) -> Result<Value, ApiError> {
        let path = self.versioned(suffix)?;
        let body = if fields.is_empty() {
            RequestBody::Empty
        } else {
            RequestBody::Form(fields)
        };
        let response = self.send(Method::POST, &path, body).await?;
        Self::take_data("POST", suffix, response, OK_ONLY)
    }

    /// Send one request, attaching the jar's cookies and capturing new ones
    async fn send(
        &self,
        method: Method,
        path: &ResourceRef,
        body: RequestBody,
    ) -> Result<ApiResponse, ApiError> {
        let method_name = method_name(&method);
        let cookie = self.session.lock().cookie_header();
        let request = ApiRequest {
            method,
            url: format!("{}{}", self.endpoint, path),
            cookie,
            body,
        };

        debug!(method = method_name, path = %path, "Sending request");
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|source| ApiError::Transport {
                method: method_name,
                path: path.to_string(),
                source,
            })?;
        debug!(method = method_name, path = %path, status = response.status, "Response received");

        if !response.cookies.is_empty() {
            self.session.lock().absorb(&response.cookies)?;
        }
        Ok(response)
    }

    /// Check the status and unwrap the `data` member of the response envelope
    fn take_data(
        method: &'static str,
        path: &str,
        response: ApiResponse,
        accepted: &[u16],
    ) -> Result<Value, ApiError> {
        if !accepted.contains(&response.status) {
            return Err(ApiError::HttpStatus {
                method,
                path: path.to_string(),
                status: response.status,
                message: response.reason,
            });
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        let mut envelope: Value =
            serde_json::from_str(&response.body).map_err(|e| ApiError::InvalidResponse {
                path: path.to_string(),
                message: format!("{}: {}", e, ApiError::truncate_body(&response.body)),
            })?;
        Ok(envelope
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    fn json_body<B: Serialize + ?Sized>(body: &B) -> Result<RequestBody, ApiError> {
        serde_json::to_value(body)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::InvalidInput(e.to_string()))
    }
}

fn method_name(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::PUT => "PUT",
        Method::POST => "POST",
        Method::DELETE => "DELETE",
        _ => "REQUEST",
    }
}
