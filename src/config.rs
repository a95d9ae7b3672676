//! Configuration and CLI argument handling

use std::{ops::RangeInclusive, path::PathBuf, time::Duration};

use clap::Parser;
use serde::Serialize;

use crate::state::{BlockSelection, SiteGroup};

/// Allowed work interval length in minutes
pub const WORK_MINUTES: RangeInclusive<u64> = 5..=60;
/// Allowed break length in minutes
pub const BREAK_MINUTES: RangeInclusive<u64> = 5..=30;
/// Increment used by the duration adjusters
pub const MINUTES_STEP: u64 = 5;

/// Hosts file location for the current platform
pub fn default_hosts_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\Windows\System32\drivers\etc\hosts")
    } else {
        PathBuf::from("/etc/hosts")
    }
}

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "nuisance")]
#[command(about = "Focus session timer that blocks distracting sites while you work")]
#[command(version)]
pub struct Config {
    /// Port for the local control API
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Work interval in minutes
    #[arg(short, long = "work", default_value = "25")]
    pub work_minutes: u64,

    /// Break interval in minutes
    #[arg(short, long = "break", default_value = "5")]
    pub break_minutes: u64,

    /// Hosts file to edit
    #[arg(long, default_value_os_t = default_hosts_path())]
    pub hosts_file: PathBuf,

    /// Marker tagging the hosts lines owned by this program
    #[arg(long, default_value = "nuisance")]
    pub token: String,

    /// Site group to leave unblocked (repeatable)
    #[arg(long = "disable", value_enum)]
    pub disabled_groups: Vec<SiteGroup>,

    /// Extra hostname to block (repeatable)
    #[arg(long = "site")]
    pub sites: Vec<String>,

    /// Title of the timer window to keep on top
    #[arg(long, default_value = "Nuisance")]
    pub window_title: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn durations(&self) -> DurationSettings {
        DurationSettings::new(self.work_minutes, self.break_minutes)
    }

    /// Initial site selection from the group and site flags
    pub fn selection(&self) -> BlockSelection {
        let mut selection = BlockSelection::new();
        for group in &self.disabled_groups {
            selection.set_enabled(*group, false);
        }
        for site in &self.sites {
            selection.add_custom(site);
        }
        selection
    }
}

/// Work and break lengths in whole minutes, kept inside their ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationSettings {
    work_minutes: u64,
    break_minutes: u64,
}

impl DurationSettings {
    /// Out of range values are clamped
    pub fn new(work_minutes: u64, break_minutes: u64) -> Self {
        Self {
            work_minutes: clamp(work_minutes, &WORK_MINUTES),
            break_minutes: clamp(break_minutes, &BREAK_MINUTES),
        }
    }

    pub fn work_minutes(&self) -> u64 {
        self.work_minutes
    }

    pub fn break_minutes(&self) -> u64 {
        self.break_minutes
    }

    pub fn work(&self) -> Duration {
        Duration::from_secs(self.work_minutes * 60)
    }

    pub fn break_duration(&self) -> Duration {
        Duration::from_secs(self.break_minutes * 60)
    }

    pub fn set_work_minutes(&mut self, minutes: u64) {
        self.work_minutes = clamp(minutes, &WORK_MINUTES);
    }

    pub fn set_break_minutes(&mut self, minutes: u64) {
        self.break_minutes = clamp(minutes, &BREAK_MINUTES);
    }

    /// Step the work length up. Returns false when that would leave the range.
    pub fn increase_work(&mut self) -> bool {
        step(&mut self.work_minutes, &WORK_MINUTES, true)
    }

    pub fn decrease_work(&mut self) -> bool {
        step(&mut self.work_minutes, &WORK_MINUTES, false)
    }

    pub fn increase_break(&mut self) -> bool {
        step(&mut self.break_minutes, &BREAK_MINUTES, true)
    }

    pub fn decrease_break(&mut self) -> bool {
        step(&mut self.break_minutes, &BREAK_MINUTES, false)
    }
}

impl Default for DurationSettings {
    fn default() -> Self {
        Self::new(25, 5)
    }
}

fn clamp(value: u64, range: &RangeInclusive<u64>) -> u64 {
    value.clamp(*range.start(), *range.end())
}

fn step(value: &mut u64, range: &RangeInclusive<u64>, up: bool) -> bool {
    let next = if up {
        value.checked_add(MINUTES_STEP)
    } else {
        value.checked_sub(MINUTES_STEP)
    };
    match next {
        Some(next) if range.contains(&next) => {
            *value = next;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["nuisance"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.token, "nuisance");
        assert_eq!(config.hosts_file, default_hosts_path());
        assert_eq!(config.durations(), DurationSettings::new(25, 5));
        assert_eq!(config.selection(), BlockSelection::new());
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "nuisance",
            "--work",
            "50",
            "--break",
            "10",
            "--hosts-file",
            "/tmp/hosts",
            "--disable",
            "reddit",
            "--site",
            "news",
            "-v",
        ])
        .unwrap();

        assert_eq!(config.durations().work(), Duration::from_secs(50 * 60));
        assert_eq!(config.durations().break_minutes(), 10);
        assert_eq!(config.hosts_file, PathBuf::from("/tmp/hosts"));
        assert_eq!(config.log_level(), "debug");

        let selection = config.selection();
        assert!(!selection.is_enabled(SiteGroup::Reddit));
        assert_eq!(selection.custom_sites(), ["news.com".to_string()]);
    }

    #[test]
    fn test_unknown_group_is_rejected() {
        assert!(Config::try_parse_from(["nuisance", "--disable", "myspace"]).is_err());
    }

    #[test]
    fn test_durations_are_clamped() {
        let settings = DurationSettings::new(0, 90);
        assert_eq!(settings.work_minutes(), 5);
        assert_eq!(settings.break_minutes(), 30);
    }

    #[test]
    fn test_step_bounds() {
        let mut settings = DurationSettings::new(55, 10);
        assert!(settings.increase_work());
        assert_eq!(settings.work_minutes(), 60);
        assert!(!settings.increase_work());
        assert_eq!(settings.work_minutes(), 60);

        assert!(settings.decrease_break());
        assert_eq!(settings.break_minutes(), 5);
        assert!(!settings.decrease_break());

        let mut settings = DurationSettings::new(57, 5);
        assert!(!settings.increase_work());
        assert!(settings.decrease_work());
        assert_eq!(settings.work_minutes(), 52);
    }
}
