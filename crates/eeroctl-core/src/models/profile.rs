use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{ApiError, ResourceRef};

use super::reference_of;

/// A group of devices that can be paused as a unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub devices: Vec<Value>,
    #[serde(default)]
    pub schedule: Vec<Value>,
}

impl Profile {
    pub fn reference(&self) -> Result<ResourceRef, ApiError> {
        reference_of(self.url.as_deref(), "profile")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// Body for creating a schedule. Times are `HH:MM`, days are lowercase names.
#[derive(Debug, Clone, Serialize)]
pub struct NewSchedule {
    pub name: String,
    pub enabled: bool,
    pub days: Vec<String>,
    pub start: String,
    pub end: String,
}

impl NewSchedule {
    pub fn new(name: &str, days: &[&str], start: &str, end: &str) -> Result<Self, ApiError> {
        for time in [start, end] {
            if !is_hh_mm(time) {
                return Err(ApiError::InvalidInput(format!(
                    "schedule time {:?} is not HH:MM",
                    time
                )));
            }
        }
        Ok(Self {
            name: name.to_string(),
            enabled: true,
            days: days.iter().map(|d| d.to_lowercase()).collect(),
            start: start.to_string(),
            end: end.to_string(),
        })
    }
}

fn is_hh_mm(s: &str) -> bool {
    let Some((h, m)) = s.split_once(':') else {
        return false;
    };
    let (Ok(h), Ok(m)) = (h.parse::<u8>(), m.parse::<u8>()) else {
        return false;
    };
    s.len() == 5 && h < 24 && m < 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile() {
        let json = r#"{"url":"/2.2/networks/1/profiles/9","name":"Den","paused":true,
            "devices":[{"url":"/2.2/networks/1/devices/a"}],"schedule":[]}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert!(profile.paused);
        assert_eq!(profile.devices.len(), 1);
        assert_eq!(profile.reference().unwrap().id(), Some("9"));
    }

    #[test]
    fn test_new_schedule() {
        let s = NewSchedule::new("Bedtime", &["Monday", "tuesday"], "21:30", "07:00").unwrap();
        assert!(s.enabled);
        assert_eq!(s.days, vec!["monday", "tuesday"]);

        assert!(NewSchedule::new("Bad", &["monday"], "9:30", "07:00").is_err());
        assert!(NewSchedule::new("Bad", &["monday"], "24:00", "07:00").is_err());
    }
}
