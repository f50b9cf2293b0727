use serde::{Deserialize, Serialize};

use crate::api::{ApiError, ResourceRef};

use super::reference_of;

/// A client device on the network
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub connection_type: Option<String>,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub profile: Option<ProfileLink>,
}

/// Profile membership as embedded in a device payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileLink {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub paused: Option<bool>,
}

impl Device {
    pub fn reference(&self) -> Result<ResourceRef, ApiError> {
        reference_of(self.url.as_deref(), "device")
    }

    /// Whether this device belongs to the profile at `profile`
    pub fn in_profile(&self, profile: &ResourceRef) -> bool {
        self.profile
            .as_ref()
            .and_then(|p| p.url.as_deref())
            .and_then(|u| ResourceRef::parse(u).ok())
            .map(|r| r == *profile)
            .unwrap_or(false)
    }

    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .or(self.hostname.as_deref())
            .unwrap_or("--")
    }
}

/// A mesh node (an "eero")
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EeroNode {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
}

impl EeroNode {
    pub fn reference(&self) -> Result<ResourceRef, ApiError> {
        reference_of(self.url.as_deref(), "eero")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE_JSON: &str = r#"{
        "url": "/2.2/networks/1/devices/abc123",
        "mac": "aa:bb:cc:dd:ee:ff",
        "ip": "192.168.4.20",
        "nickname": "Den TV",
        "manufacturer": "Amazon",
        "device_type": "entertainment",
        "connection_type": "wireless",
        "connected": true,
        "paused": false,
        "profile": { "url": "/2.2/networks/1/profiles/9", "name": "Den", "paused": false },
        "usage": null
    }"#;

    #[test]
    fn test_parse_device() {
        let device: Device = serde_json::from_str(DEVICE_JSON).unwrap();
        assert_eq!(device.display_name(), "Den TV");
        assert!(device.connected);
        assert!(!device.paused);
        assert_eq!(device.reference().unwrap().as_str(), "/2.2/networks/1/devices/abc123");
    }

    #[test]
    fn test_in_profile() {
        let device: Device = serde_json::from_str(DEVICE_JSON).unwrap();
        let den = ResourceRef::parse("/2.2/networks/1/profiles/9").unwrap();
        let other = ResourceRef::parse("/2.2/networks/1/profiles/10").unwrap();
        assert!(device.in_profile(&den));
        assert!(!device.in_profile(&other));

        let loose = Device::default();
        assert!(!loose.in_profile(&den));
        assert_eq!(loose.display_name(), "--");
    }
}
