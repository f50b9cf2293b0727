//! Parsing of shell input lines.

/// One line of shell input, parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Login,
    Logout,
    Status,
    Account,
    Networks,
    Network,
    Eeros,
    Devices,
    Profiles,
    Insights,
    Blacklist,
    /// Pause the n-th listed device
    Pause(usize),
    Unpause(usize),
    Delete(usize),
    RebootEero(usize),
    LedOn(usize),
    LedOff(usize),
    Connections(usize),
    PauseProfile(usize),
    UnpauseProfile(usize),
    Schedules(usize),
    /// Pause a configured profile by key
    PauseNamed(String),
    UnpauseNamed(String),
    /// Fetch the n-th listed option
    Browse(usize),
    /// GET a literal resource path
    Path(String),
    /// Anything else: looked up among the network's resources
    Resource(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if line.starts_with('/') {
            return Command::Path(line.to_string());
        }
        if let Ok(n) = line.parse::<usize>() {
            return Command::Browse(n);
        }

        let mut words = line.split_whitespace();
        let word = words.next().unwrap_or_default();
        let arg = words.next();
        if words.next().is_some() {
            return Command::Resource(line.to_string());
        }

        match (word, arg) {
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit", None) => Command::Quit,
            ("login", None) => Command::Login,
            ("logout", None) => Command::Logout,
            ("status", None) => Command::Status,
            ("account", None) => Command::Account,
            ("networks", None) => Command::Networks,
            ("network", None) => Command::Network,
            ("eeros", None) => Command::Eeros,
            ("devices", None) => Command::Devices,
            ("profiles", None) => Command::Profiles,
            ("insights", None) => Command::Insights,
            ("blacklist", None) => Command::Blacklist,
            ("pause", Some(arg)) => match arg.parse() {
                Ok(n) => Command::Pause(n),
                Err(_) => Command::PauseNamed(arg.to_string()),
            },
            ("unpause", Some(arg)) => match arg.parse() {
                Ok(n) => Command::Unpause(n),
                Err(_) => Command::UnpauseNamed(arg.to_string()),
            },
            (word, Some(arg)) => match (word, arg.parse::<usize>()) {
                ("delete", Ok(n)) => Command::Delete(n),
                ("reboot_eero", Ok(n)) => Command::RebootEero(n),
                ("led_on", Ok(n)) => Command::LedOn(n),
                ("led_off", Ok(n)) => Command::LedOff(n),
                ("connections", Ok(n)) => Command::Connections(n),
                ("pause_profile", Ok(n)) => Command::PauseProfile(n),
                ("unpause_profile", Ok(n)) => Command::UnpauseProfile(n),
                ("schedules", Ok(n)) => Command::Schedules(n),
                _ => Command::Resource(line.to_string()),
            },
            (word, None) => Command::Resource(word.to_string()),
        }
    }
}

pub const HELP: &str = "\
Commands:
  account | networks | network | eeros | devices | profiles | insights | blacklist
  pause <#> | unpause <#> | delete <#>
  reboot_eero <#> | led_on <#> | led_off <#> | connections <#>
  pause_profile <#> | unpause_profile <#> | schedules <#>
  pause <name> | unpause <name>   (profiles from the config file)
  <#>            fetch the n-th item of the last listing
  /path          GET a resource path, e.g. /2.2/account
  <resource>     GET a network resource listed by 'network'
  status | login | logout | help | quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(Command::parse("help"), Command::Help);
        assert_eq!(Command::parse("?"), Command::Help);
        assert_eq!(Command::parse("  exit "), Command::Quit);
        assert_eq!(Command::parse("devices"), Command::Devices);
        assert_eq!(Command::parse("blacklist"), Command::Blacklist);
        assert_eq!(Command::parse(""), Command::Empty);
    }

    #[test]
    fn test_indexed_commands() {
        assert_eq!(Command::parse("pause 3"), Command::Pause(3));
        assert_eq!(Command::parse("unpause   12"), Command::Unpause(12));
        assert_eq!(Command::parse("delete 1"), Command::Delete(1));
        assert_eq!(Command::parse("reboot_eero 2"), Command::RebootEero(2));
        assert_eq!(Command::parse("led_off 2"), Command::LedOff(2));
        assert_eq!(Command::parse("schedules 4"), Command::Schedules(4));
        assert_eq!(Command::parse("7"), Command::Browse(7));
    }

    #[test]
    fn test_named_profiles() {
        assert_eq!(Command::parse("pause den"), Command::PauseNamed("den".into()));
        assert_eq!(Command::parse("unpause den"), Command::UnpauseNamed("den".into()));
    }

    #[test]
    fn test_paths_and_resources() {
        assert_eq!(
            Command::parse("/2.2/networks/1/devices"),
            Command::Path("/2.2/networks/1/devices".into())
        );
        assert_eq!(Command::parse("speedtest"), Command::Resource("speedtest".into()));
        // A non-numeric argument to an indexed command is not silently accepted
        assert_eq!(Command::parse("delete x"), Command::Resource("delete x".into()));
        assert_eq!(Command::parse("devices 1 2"), Command::Resource("devices 1 2".into()));
    }
}
