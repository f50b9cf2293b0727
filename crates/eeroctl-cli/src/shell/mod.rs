//! Interactive shell for browsing and controlling a network.
//!
//! Listings (`eeros`, `devices`, `profiles`, browsed resources) remember
//! what they printed so later commands can refer to entries by number.

pub mod command;
pub mod render;

use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use tracing::debug;

use eeroctl_core::models::Network;
use eeroctl_core::{ApiError, Config, EeroClient, ResourceRef};

use crate::commands;
use crate::console::Console;
use command::{Command, HELP};

const PROMPT: &str = "eero> ";

/// What a numbered entry in the last listing refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Device,
    Eero,
    Profile,
    Resource,
}

impl Kind {
    /// Printed when an index does not name an entry of this kind
    fn hint(self) -> &'static str {
        match self {
            Kind::Device => "Invalid device number. Run 'devices' first to see available devices.",
            Kind::Eero => "Invalid eero number. Run 'eeros' first.",
            Kind::Profile => "Invalid profile number. Run 'profiles' first.",
            Kind::Resource => "Invalid option number.",
        }
    }
}

#[derive(Debug, Clone)]
struct Choice {
    kind: Kind,
    url: String,
}

pub struct Shell {
    client: EeroClient,
    config: Config,
    console: Console,
    network: Option<ResourceRef>,
    /// Resources of the selected network, by name
    netops: BTreeMap<String, String>,
    /// Entries of the most recent listing, numbered from 1
    options: Vec<Choice>,
}

impl Shell {
    pub fn new(client: EeroClient, config: Config) -> Self {
        let network = config.network_ref();
        Self {
            client,
            config,
            console: Console::new(),
            network,
            netops: BTreeMap::new(),
            options: Vec::new(),
        }
    }

    pub async fn run(mut self) -> Result<()> {
        println!("Starting eero manager...");
        if let Err(err) = self.account().await {
            println!("Error: {:#}", err);
            if let Err(err) = self.login().await {
                println!("{:#}", err);
            }
        }

        while let Some(line) = self.console.ask(PROMPT).await? {
            let command = Command::parse(&line);
            if command == Command::Quit {
                break;
            }
            if let Err(err) = self.dispatch(command).await {
                println!("Error: {:#}", err);
            }
        }
        println!("exiting");
        Ok(())
    }

    async fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Empty | Command::Quit => {}
            Command::Help => println!("{}", HELP),
            Command::Login => self.login().await?,
            Command::Logout => commands::logout(&self.client)?,
            Command::Status => self.status().await?,
            Command::Account => self.account().await?,
            Command::Networks => print_json(&self.client.networks().await?),
            Command::Network => self.show_network().await?,
            Command::Eeros => self.eeros().await?,
            Command::Devices => self.devices().await?,
            Command::Profiles => self.profiles().await?,
            Command::Insights => {
                let network = self.network()?;
                print_json(&self.client.insights(&network).await?);
            }
            Command::Blacklist => {
                let network = self.network()?;
                print_json(&self.client.device_blacklist(&network).await?);
            }
            Command::Pause(n) | Command::Unpause(n) => {
                let paused = matches!(command, Command::Pause(_));
                let Some(device) = self.pick(n, Kind::Device) else {
                    return Ok(());
                };
                let response = self.client.set_paused(&device, paused).await?;
                println!(
                    "Device {} request sent",
                    if paused { "pause" } else { "unpause" }
                );
                println!("API Response:");
                print_json(&response);
            }
            Command::Delete(n) => {
                let Some(device) = self.pick(n, Kind::Device) else {
                    return Ok(());
                };
                print_json(&self.client.delete_device(&device).await?);
                println!("Device deleted successfully");
            }
            Command::RebootEero(n) => {
                let Some(eero) = self.pick(n, Kind::Eero) else {
                    return Ok(());
                };
                let response = self.client.reboot_eero(&eero).await?;
                println!("Eero rebooting...");
                print_json(&response);
            }
            Command::LedOn(n) | Command::LedOff(n) => {
                let on = matches!(command, Command::LedOn(_));
                let Some(eero) = self.pick(n, Kind::Eero) else {
                    return Ok(());
                };
                let response = self.client.eero_led(&eero, on).await?;
                println!("Eero LED turned {}", if on { "on" } else { "off" });
                print_json(&response);
            }
            Command::Connections(n) => {
                let Some(eero) = self.pick(n, Kind::Eero) else {
                    return Ok(());
                };
                let response = self.client.eero_connections(&eero).await?;
                println!("Devices connected to this eero:");
                print_json(&response);
            }
            Command::PauseProfile(n) | Command::UnpauseProfile(n) => {
                let paused = matches!(command, Command::PauseProfile(_));
                let Some(profile) = self.pick(n, Kind::Profile) else {
                    return Ok(());
                };
                let response = self.client.set_paused(&profile, paused).await?;
                println!(
                    "Profile {} successfully",
                    if paused { "paused" } else { "unpaused" }
                );
                print_json(&response);
            }
            Command::Schedules(n) => {
                let Some(profile) = self.pick(n, Kind::Profile) else {
                    return Ok(());
                };
                let schedules = self.client.profile_schedules(&profile).await?;
                println!("\n========== SCHEDULES ==========");
                for schedule in &schedules {
                    println!("{}", render::schedule_entry(schedule));
                }
            }
            Command::PauseNamed(key) => {
                commands::set_paused(&self.client, &self.config, &key, true).await?
            }
            Command::UnpauseNamed(key) => {
                commands::set_paused(&self.client, &self.config, &key, false).await?
            }
            Command::Browse(n) => self.browse(n).await?,
            Command::Path(path) => {
                let path = ResourceRef::parse(&path)?;
                print_json(&self.client.get_json(&path).await?);
            }
            Command::Resource(name) => match self.netops.get(&name) {
                Some(url) => {
                    debug!(command = %name, %url, "Network resource");
                    let path = ResourceRef::parse(url)?;
                    print_json(&self.client.get_json(&path).await?);
                }
                None => println!("Unknown command: {}. Type 'help' for commands.", name),
            },
        }
        Ok(())
    }

    /// Entry `n` of the last listing, if it is of the wanted kind. Prints a hint otherwise.
    fn pick(&self, n: usize, kind: Kind) -> Option<ResourceRef> {
        let picked = select(&self.options, n, Some(kind));
        if picked.is_none() {
            println!("{}", kind.hint());
        }
        picked
    }

    fn network(&self) -> Result<ResourceRef> {
        self.network
            .clone()
            .ok_or_else(|| anyhow!("No network selected. Run 'account' first."))
    }

    async fn login(&mut self) -> Result<()> {
        commands::login(&self.client, &mut self.console, None).await?;
        self.account().await
    }

    /// Load the account and pick the network to work with
    async fn account(&mut self) -> Result<()> {
        let account = self.client.account().await?;
        println!(
            "Logged into account {}",
            account.name.as_deref().unwrap_or_default()
        );

        if let Some(only) = account.sole_network() {
            self.network = Some(only.reference()?);
            return Ok(());
        }

        let networks = &account.networks.data;
        if networks.is_empty() {
            println!("No networks on this account");
            return Ok(());
        }
        for (i, net) in networks.iter().enumerate() {
            println!("{}) {}", i + 1, net.display_name());
        }
        let answer = self
            .console
            .ask(&format!("Enter the network to use: (1-{}) ", networks.len()))
            .await?
            .unwrap_or_default();
        match answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| networks.get(i))
        {
            Some(net) => {
                let reference = net.reference()?;
                println!("Using network: {} ({})", net.display_name(), reference);
                self.network = Some(reference);
            }
            None => println!("Not a valid network"),
        }
        Ok(())
    }

    async fn status(&self) -> Result<()> {
        let authenticated = self.client.is_authenticated();
        println!("Logged in: {}", if authenticated { "yes" } else { "no" });
        match &self.network {
            Some(network) if authenticated => {
                let details = self.client.network(network).await?;
                println!(
                    "Network: {} ({})",
                    details.name.as_deref().unwrap_or("(unnamed)"),
                    network
                );
            }
            Some(network) => println!("Network: {}", network),
            None => println!("Network: (none selected)"),
        }
        if authenticated && !self.config.profiles.is_empty() {
            commands::status(&self.client, &self.config, None).await?;
        }
        Ok(())
    }

    async fn show_network(&mut self) -> Result<()> {
        let network = self.network()?;
        let details = self
            .client
            .get_json(&network)
            .await
            .context("Failed to load network")?;
        print_json(&details);

        let resources = network_resources(&network, details)?;
        println!("===== Available commands for this network =====");
        for name in resources.keys() {
            println!("{}", name);
        }
        self.netops = resources;
        Ok(())
    }

    async fn eeros(&mut self) -> Result<()> {
        let network = self.network()?;
        let eeros = self.client.eeros(&network).await?;
        println!("===================== EEROS =====================");
        self.options.clear();
        for (i, eero) in eeros.iter().enumerate() {
            println!("{}", render::eero_entry(i + 1, eero));
            self.remember(Kind::Eero, eero.url.as_deref());
        }
        println!("\nUse 'reboot_eero <#>', 'led_on <#>', 'led_off <#>', or 'connections <#>'");
        Ok(())
    }

    async fn devices(&mut self) -> Result<()> {
        let network = self.network()?;
        let devices = self.client.devices(&network).await?;
        let groups = render::group_connected(&devices);
        println!();
        for line in render::device_table(&groups) {
            println!("{}", line);
        }
        self.options.clear();
        for device in groups.iter().flat_map(|(_, members)| members.iter()) {
            self.options.push(Choice {
                kind: Kind::Device,
                url: device.url.clone().unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn profiles(&mut self) -> Result<()> {
        let network = self.network()?;
        let profiles = self.client.profiles(&network).await?;
        println!("########### PROFILES ###############");
        self.options.clear();
        for (i, profile) in profiles.iter().enumerate() {
            println!("{}", render::profile_entry(i + 1, profile));
            self.remember(Kind::Profile, profile.url.as_deref());
        }
        println!("\nUse 'pause_profile <#>', 'unpause_profile <#>', or 'schedules <#>'");
        Ok(())
    }

    /// Fetch entry `n` of the last listing. Its resources become the new listing.
    async fn browse(&mut self, n: usize) -> Result<()> {
        let Some(path) = select(&self.options, n, None) else {
            println!("{}", Kind::Resource.hint());
            return Ok(());
        };
        debug!(option = n, %path, "Browsing option");
        let result = self.client.get_json(&path).await?;
        print_json(&result);

        if let Some(resources) = result.get("resources").and_then(Value::as_object) {
            self.options.clear();
            for (i, (name, url)) in resources.iter().enumerate() {
                println!("{}) {}", i + 1, name);
                self.remember(Kind::Resource, url.as_str());
            }
        }
        Ok(())
    }

    /// Numbering stays aligned with what was printed, even for entries without a url
    fn remember(&mut self, kind: Kind, url: Option<&str>) {
        self.options.push(Choice {
            kind,
            url: url.unwrap_or_default().to_string(),
        });
    }
}

/// Resource names and paths from a network payload
fn network_resources(
    network: &ResourceRef,
    details: Value,
) -> Result<BTreeMap<String, String>, ApiError> {
    let parsed: Network = serde_json::from_value(details).map_err(|e| ApiError::InvalidResponse {
        path: network.to_string(),
        message: e.to_string(),
    })?;
    Ok(parsed.resources)
}

/// Resolve a 1-based index into the last listing.
/// `kind` restricts the entry type; entries without a usable url never resolve.
fn select(options: &[Choice], n: usize, kind: Option<Kind>) -> Option<ResourceRef> {
    let choice = n.checked_sub(1).and_then(|i| options.get(i))?;
    if kind.is_some_and(|k| k != choice.kind) {
        return None;
    }
    ResourceRef::parse(&choice.url).ok()
}

fn print_json(value: &Value) {
    println!("{}", render::pretty(value));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<Choice> {
        vec![
            Choice {
                kind: Kind::Eero,
                url: "/2.2/eeros/1".to_string(),
            },
            Choice {
                kind: Kind::Device,
                url: "/2.2/networks/1/devices/abc".to_string(),
            },
            Choice {
                kind: Kind::Device,
                url: String::new(),
            },
        ]
    }

    #[test]
    fn test_select_by_kind() {
        let options = listing();
        assert_eq!(
            select(&options, 1, Some(Kind::Eero)).unwrap().as_str(),
            "/2.2/eeros/1"
        );
        assert_eq!(
            select(&options, 2, Some(Kind::Device)).unwrap().as_str(),
            "/2.2/networks/1/devices/abc"
        );
        // Browsing accepts any kind
        assert!(select(&options, 1, None).is_some());
    }

    #[test]
    fn test_select_rejects_bad_indices() {
        let options = listing();
        assert!(select(&options, 0, None).is_none());
        assert!(select(&options, 4, None).is_none());
        assert!(select(&options, 1, Some(Kind::Device)).is_none());
        assert!(select(&options, 2, Some(Kind::Profile)).is_none());
        assert!(select(&[], 1, None).is_none());
    }

    #[test]
    fn test_select_skips_entries_without_url() {
        let options = listing();
        assert!(select(&options, 3, Some(Kind::Device)).is_none());
        assert!(select(&options, 3, None).is_none());
    }

    #[test]
    fn test_network_resources() {
        let network = ResourceRef::parse("/2.2/networks/1").unwrap();
        let resources = network_resources(
            &network,
            serde_json::json!({ "resources": { "speedtest": "/2.2/networks/1/speedtest" } }),
        )
        .unwrap();
        assert_eq!(resources["speedtest"], "/2.2/networks/1/speedtest");

        let err = network_resources(&network, serde_json::json!({ "resources": ["speedtest"] }))
            .unwrap_err();
        match err {
            ApiError::InvalidResponse { path, .. } => assert_eq!(path, "/2.2/networks/1"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_hints_name_the_listing_command() {
        assert!(Kind::Device.hint().contains("'devices'"));
        assert!(Kind::Eero.hint().contains("'eeros'"));
        assert!(Kind::Profile.hint().contains("'profiles'"));
    }
}
