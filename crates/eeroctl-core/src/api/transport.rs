//! HTTP transport used by the API client.
//!
//! The client builds `ApiRequest`s and interprets `ApiResponse`s; the
//! transport only moves bytes. `HttpTransport` is the real one.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, Method};
use serde_json::Value;

use crate::auth::ReceivedCookie;
use crate::config::ClientIdentity;

use super::error::BoxError;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Form(Vec<(String, String)>),
    Json(Value),
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub cookie: Option<String>,
    pub body: RequestBody,
}

#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    pub reason: String,
    pub cookies: Vec<ReceivedCookie>,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Errors are network-level only; any HTTP status is a response.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, BoxError>;
}

/// `reqwest`-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(identity: &ClientIdentity, timeout: Duration) -> Result<Self, BoxError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "X-eero-client-version",
            header::HeaderValue::from_str(&identity.version)?,
        );
        headers.insert(
            "X-eero-client-os",
            header::HeaderValue::from_str(&identity.os)?,
        );
        headers.insert(
            "X-eero-client-os-version",
            header::HeaderValue::from_str(&identity.os_version)?,
        );
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(identity.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, BoxError> {
        let mut builder = self.client.request(request.method, &request.url);
        if let Some(cookie) = request.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Json(value) => builder.json(&value),
        };

        let response = builder.send().await?;
        let status = response.status();
        let cookies = response
            .cookies()
            .map(|c| ReceivedCookie {
                name: c.name().to_string(),
                value: c.value().to_string(),
                expires: cookie_expiry(c.max_age(), c.expires()),
            })
            .collect();
        let body = response.text().await?;

        Ok(ApiResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            cookies,
            body,
        })
    }
}

/// `Max-Age` wins over `Expires`, as browsers do
fn cookie_expiry(max_age: Option<Duration>, expires: Option<SystemTime>) -> Option<DateTime<Utc>> {
    match (max_age, expires) {
        (Some(age), _) => chrono::Duration::from_std(age)
            .ok()
            .and_then(|age| Utc::now().checked_add_signed(age)),
        (None, Some(at)) => Some(DateTime::<Utc>::from(at)),
        (None, None) => None,
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod scripted {
    //! Transport that replays canned responses and records what was sent.

    use std::collections::VecDeque;

    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;

    /// Canned outcome for one request
    pub enum Reply {
        Response(ApiResponse),
        Failure(String),
    }

    impl Reply {
        /// 200 with `{"meta": {...}, "data": data}`
        pub fn data(data: Value) -> Self {
            Self::status_with_body(200, json!({ "meta": { "code": 200 }, "data": data }).to_string())
        }

        pub fn status(code: u16) -> Self {
            Self::status_with_body(code, String::new())
        }

        pub fn status_with_body(code: u16, body: String) -> Self {
            let reason = reqwest::StatusCode::from_u16(code)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or_default()
                .to_string();
            Reply::Response(ApiResponse {
                status: code,
                reason,
                cookies: Vec::new(),
                body,
            })
        }

        /// Attach a `Set-Cookie` to the response
        pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
            if let Reply::Response(ref mut r) = self {
                r.cookies.push(ReceivedCookie {
                    name: name.to_string(),
                    value: value.to_string(),
                    expires: None,
                });
            }
            self
        }

        pub fn network_error(message: &str) -> Self {
            Reply::Failure(message.to_string())
        }
    }

    /// Replies are matched to requests by URL suffix, first match wins.
    /// A route can be scripted several times to change its answer over time.
    #[derive(Default)]
    pub struct ScriptedTransport {
        routes: Mutex<Vec<(Method, String, VecDeque<Reply>)>>,
        sent: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a reply for requests whose URL ends with `suffix`.
        /// The last queued reply for a route repeats once the queue drains.
        pub fn on(&self, method: Method, suffix: &str, reply: Reply) -> &Self {
            let mut routes = self.routes.lock();
            if let Some((_, _, queue)) = routes
                .iter_mut()
                .find(|(m, s, _)| *m == method && s == suffix)
            {
                queue.push_back(reply);
            } else {
                routes.push((method, suffix.to_string(), VecDeque::from([reply])));
            }
            self
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.sent.lock().clone()
        }

        pub fn count(&self, method: &Method, suffix: &str) -> usize {
            self.sent
                .lock()
                .iter()
                .filter(|r| r.method == *method && r.url.ends_with(suffix))
                .count()
        }

        fn clone_reply(reply: &Reply) -> Reply {
            match reply {
                Reply::Response(r) => Reply::Response(r.clone()),
                Reply::Failure(m) => Reply::Failure(m.clone()),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, BoxError> {
            self.sent.lock().push(request.clone());

            let reply = {
                let mut routes = self.routes.lock();
                let queue = routes
                    .iter_mut()
                    .find(|(m, s, _)| *m == request.method && request.url.ends_with(s.as_str()))
                    .map(|(_, _, q)| q);
                match queue {
                    Some(q) if q.len() > 1 => q.pop_front(),
                    Some(q) => q.front().map(Self::clone_reply),
                    None => None,
                }
            };

            match reply {
                Some(Reply::Response(r)) => Ok(r),
                Some(Reply::Failure(m)) => Err(m.into()),
                None => Err(format!("no scripted reply for {} {}", request.method, request.url).into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_expiry_prefers_max_age() {
        let expires = SystemTime::UNIX_EPOCH;
        let at = cookie_expiry(Some(Duration::from_secs(3600)), Some(expires)).unwrap();
        assert!(at > Utc::now() + chrono::Duration::minutes(59));

        let at = cookie_expiry(None, Some(expires)).unwrap();
        assert_eq!(at.timestamp(), 0);

        assert!(cookie_expiry(None, None).is_none());
    }
}
