use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::{ApiError, ResourceRef};

use super::reference_of;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub networks: NetworkList,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkList {
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub data: Vec<NetworkSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSummary {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl NetworkSummary {
    pub fn reference(&self) -> Result<ResourceRef, ApiError> {
        reference_of(self.url.as_deref(), "network")
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }
}

impl Account {
    /// The only network, when the account has exactly one
    pub fn sole_network(&self) -> Option<&NetworkSummary> {
        match self.networks.data.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Sub-resources the network exposes, keyed by command name
    #[serde(default)]
    pub resources: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account() {
        let json = r#"{"name":"Pat","phone":{"value":"+15551234567"},"networks":{"count":2,"data":[
            {"url":"/2.2/networks/1","name":"Home","created":"2020-01-01"},
            {"url":"/2.2/networks/2","name":"Cabin"}]}}"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.networks.data.len(), 2);
        assert!(account.sole_network().is_none());
        assert_eq!(account.networks.data[1].display_name(), "Cabin");
        assert_eq!(
            account.networks.data[0].reference().unwrap().as_str(),
            "/2.2/networks/1"
        );
    }

    #[test]
    fn test_sole_network() {
        let json = r#"{"networks":{"data":[{"url":"/2.2/networks/7","name":"Home"}]}}"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.sole_network().unwrap().name.as_deref(), Some("Home"));
    }

    #[test]
    fn test_network_without_url_has_no_reference() {
        let summary = NetworkSummary::default();
        assert!(matches!(summary.reference(), Err(ApiError::InvalidReference(_))));
    }

    #[test]
    fn test_parse_network_resources() {
        let json = r#"{"url":"/2.2/networks/1","name":"Home","resources":{"devices":"/2.2/networks/1/devices","speedtest":"/2.2/networks/1/speedtest"}}"#;
        let network: Network = serde_json::from_str(json).unwrap();
        assert_eq!(network.resources.len(), 2);
        assert_eq!(network.resources["speedtest"], "/2.2/networks/1/speedtest");
    }
}
