//! Plain-text rendering for the shell.

use serde_json::Value;

use eeroctl_core::models::{Device, EeroNode, Profile, Schedule};

/// Placeholder for missing values
const NONE: &str = "--";

/// Longest nickname/hostname shown before truncating
const MAX_NAME_LEN: usize = 32;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

fn or_none(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NONE)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Pretty JSON, as printed for raw API responses
pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Connected devices grouped by device type, groups in order of first appearance
pub fn group_connected(devices: &[Device]) -> Vec<(String, Vec<&Device>)> {
    let mut groups: Vec<(String, Vec<&Device>)> = Vec::new();
    for device in devices.iter().filter(|d| d.connected) {
        let kind = or_none(&device.device_type).to_string();
        match groups.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, members)) => members.push(device),
            None => groups.push((kind, vec![device])),
        }
    }
    groups
}

/// Device table with numbered rows, columns padded to their widest cell
pub fn device_table(groups: &[(String, Vec<&Device>)]) -> Vec<String> {
    const HEADERS: [&str; 9] = [
        "#",
        "NAME",
        "MANUFACTURER",
        "CONNECTION",
        "HOSTNAME",
        "TYPE",
        "PAUSED",
        "IP ADDRESS",
        "URL",
    ];

    let mut rows: Vec<[String; 9]> = Vec::new();
    for (kind, devices) in groups {
        for device in devices {
            rows.push([
                (rows.len() + 1).to_string(),
                truncate_string(or_none(&device.nickname), MAX_NAME_LEN),
                or_none(&device.manufacturer).to_string(),
                or_none(&device.connection_type).to_string(),
                truncate_string(or_none(&device.hostname), MAX_NAME_LEN),
                kind.clone(),
                yes_no(device.paused).to_string(),
                or_none(&device.ip).to_string(),
                or_none(&device.url).to_string(),
            ]);
        }
    }

    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
    widths[0] = widths[0].max(4);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[&str]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(line(&HEADERS));
    lines.push("-".repeat(widths.iter().sum::<usize>() + widths.len() - 1));
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        lines.push(line(&cells));
    }
    lines
}

pub fn eero_entry(index: usize, eero: &EeroNode) -> String {
    format!(
        "\n{}) Location: {}\n   Model: {}\n   Status: {}\n   URL: {}",
        index,
        or_none(&eero.location),
        or_none(&eero.model),
        or_none(&eero.status),
        or_none(&eero.url),
    )
}

pub fn profile_entry(index: usize, profile: &Profile) -> String {
    format!(
        "\n{}) Profile: {}\n   Paused: {}\n   Devices: {}\n   Schedules: {}\n   URL: {}",
        index,
        or_none(&profile.name),
        profile.paused,
        profile.devices.len(),
        profile.schedule.len(),
        or_none(&profile.url),
    )
}

pub fn schedule_entry(schedule: &Schedule) -> String {
    format!(
        "\nName: {}\nEnabled: {}\nDays: {}\nTime: {} - {}\nURL: {}",
        or_none(&schedule.name),
        schedule.enabled,
        schedule.days.join(", "),
        or_none(&schedule.start),
        or_none(&schedule.end),
        or_none(&schedule.url),
    )
}

/// One status line for a device standing in for a profile
pub fn device_status(label: &str, device: &Device) -> String {
    format!(
        "{}: {} ({}, {}, {}) paused={}",
        label,
        device.display_name(),
        or_none(&device.mac),
        or_none(&device.ip),
        if device.connected { "connected" } else { "offline" },
        device.paused,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn device(nickname: &str, kind: &str, connected: bool) -> Device {
        serde_json::from_value(json!({
            "url": format!("/2.2/networks/1/devices/{}", nickname),
            "nickname": nickname,
            "device_type": kind,
            "connected": connected,
        }))
        .unwrap()
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Café au lait", 7), "Café...");
    }

    #[test]
    fn test_group_connected_keeps_first_seen_order() {
        let devices = vec![
            device("tv", "entertainment", true),
            device("phone", "mobile", true),
            device("offline", "mobile", false),
            device("console", "entertainment", true),
        ];
        let groups = group_connected(&devices);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "entertainment");
        let names: Vec<_> = groups[0].1.iter().map(|d| d.display_name()).collect();
        assert_eq!(names, ["tv", "console"]);
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn test_device_table_numbers_rows_in_group_order() {
        let devices = vec![
            device("tv", "entertainment", true),
            device("phone", "mobile", true),
            device("console", "entertainment", true),
        ];
        let lines = device_table(&group_connected(&devices));
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("#    NAME"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].starts_with("1    tv"));
        assert!(lines[3].starts_with("2    console"));
        assert!(lines[4].starts_with("3    phone"));
        assert!(lines[2].contains(" No "));
        // Missing values render as a placeholder
        assert!(lines[2].contains("--"));
    }

    #[test]
    fn test_device_status() {
        let mut d = device("tv", "entertainment", true);
        d.paused = true;
        let line = device_status("Den TV", &d);
        assert_eq!(line, "Den TV: tv (--, --, connected) paused=true");
    }
}
