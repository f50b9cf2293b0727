use std::fmt;

use serde::{Deserialize, Serialize};

use super::ApiError;

/// Opaque relative URL of a remote entity, e.g. `/2.2/networks/123/profiles/456`.
///
/// The client never interprets these beyond basic shape checks; they are
/// addresses handed back by the API and replayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceRef(String);

impl ResourceRef {
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let trimmed = raw.trim();
        let invalid = |why: &str| ApiError::InvalidReference(format!("{:?}: {}", raw, why));

        if !trimmed.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(invalid("contains whitespace"));
        }
        if trimmed.contains("://") || trimmed.contains('?') || trimmed.contains('#') {
            return Err(invalid("must be a bare path"));
        }
        let body = trimmed.trim_end_matches('/');
        if body.is_empty() {
            return Err(invalid("empty path"));
        }
        for segment in body[1..].split('/') {
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }
            if segment == "." || segment == ".." {
                return Err(invalid("relative path segment"));
            }
        }
        Ok(Self(body.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing numeric id, if the reference ends in one
    pub fn id(&self) -> Option<&str> {
        self.0
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
    }

    /// Append a sub-resource, e.g. `network.join("devices")`
    pub fn join(&self, suffix: &str) -> Result<Self, ApiError> {
        Self::parse(&format!("{}/{}", self.0, suffix.trim_start_matches('/')))
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ResourceRef {
    type Error = ApiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceRef> for String {
    fn from(value: ResourceRef) -> Self {
        value.0
    }
}

impl AsRef<str> for ResourceRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_references() {
        let r = ResourceRef::parse("/2.2/networks/13591687/profiles/24696147").unwrap();
        assert_eq!(r.as_str(), "/2.2/networks/13591687/profiles/24696147");
        assert_eq!(r.id(), Some("24696147"));

        // Trailing slash and surrounding whitespace are normalized away
        let r = ResourceRef::parse("  /2.2/account/ ").unwrap();
        assert_eq!(r.as_str(), "/2.2/account");
        assert_eq!(r.id(), None);
    }

    #[test]
    fn test_parse_rejects_malformed_references() {
        for bad in [
            "",
            "/",
            "//",
            "2.2/account",
            "/2.2//account",
            "/2.2/../account",
            "/2.2/acc ount",
            "https://api-user.e2ro.com/2.2/account",
            "/2.2/account?x=1",
        ] {
            assert!(
                matches!(ResourceRef::parse(bad), Err(ApiError::InvalidReference(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_join() {
        let network = ResourceRef::parse("/2.2/networks/42").unwrap();
        assert_eq!(network.join("devices").unwrap().as_str(), "/2.2/networks/42/devices");
        assert_eq!(network.join("/eeros").unwrap().as_str(), "/2.2/networks/42/eeros");
        assert!(network.join("../x").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ResourceRef = serde_json::from_str("\"/2.2/networks/1\"").unwrap();
        assert_eq!(ok.id(), Some("1"));
        assert!(serde_json::from_str::<ResourceRef>("\"networks/1\"").is_err());
    }
}
