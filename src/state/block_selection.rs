//! Which sites a work interval blocks

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Placeholder shown in empty site inputs, never blocked
pub const PLACEHOLDER_SITE: &str = "www.example.com";

/// Named group of related hostnames that can be toggled together
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SiteGroup {
    Facebook,
    Youtube,
    Twitter,
    Reddit,
    Instagram,
    Tiktok,
    Whatsapp,
}

impl SiteGroup {
    pub const ALL: [SiteGroup; 7] = [
        SiteGroup::Facebook,
        SiteGroup::Youtube,
        SiteGroup::Twitter,
        SiteGroup::Reddit,
        SiteGroup::Instagram,
        SiteGroup::Tiktok,
        SiteGroup::Whatsapp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SiteGroup::Facebook => "facebook",
            SiteGroup::Youtube => "youtube",
            SiteGroup::Twitter => "twitter",
            SiteGroup::Reddit => "reddit",
            SiteGroup::Instagram => "instagram",
            SiteGroup::Tiktok => "tiktok",
            SiteGroup::Whatsapp => "whatsapp",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|group| group.as_str() == name)
    }

    /// Hostnames blocked when this group is enabled
    pub fn hosts(self) -> &'static [&'static str] {
        match self {
            SiteGroup::Facebook => &["www.facebook.com", "facebook.com"],
            SiteGroup::Youtube => &["www.youtube.com", "youtube.com", "m.youtube.com"],
            SiteGroup::Twitter => &["www.twitter.com", "twitter.com", "x.com", "www.x.com"],
            SiteGroup::Reddit => &["www.reddit.com", "reddit.com"],
            SiteGroup::Instagram => &["www.instagram.com", "instagram.com"],
            SiteGroup::Tiktok => &["www.tiktok.com", "tiktok.com"],
            SiteGroup::Whatsapp => &["www.web.whatsapp.com", "web.whatsapp.com"],
        }
    }
}

/// Normalize a user supplied hostname.
///
/// Rejects empty input, the placeholder and anything that would break a hosts
/// line. A bare name gets `.com` appended.
pub fn normalize_hostname(input: &str) -> Option<String> {
    let site = input.trim().to_lowercase();
    if site.is_empty() || site == PLACEHOLDER_SITE {
        return None;
    }
    if site.chars().any(|c| c.is_whitespace() || c == '#') {
        return None;
    }
    if site.contains('.') {
        Some(site)
    } else {
        Some(format!("{}.com", site))
    }
}

/// User's blocking configuration: toggled groups plus custom hostnames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSelection {
    groups: BTreeMap<SiteGroup, bool>,
    custom: Vec<String>,
}

impl BlockSelection {
    /// Every group enabled, no custom sites
    pub fn new() -> Self {
        Self {
            groups: SiteGroup::ALL.into_iter().map(|group| (group, true)).collect(),
            custom: Vec::new(),
        }
    }

    pub fn is_enabled(&self, group: SiteGroup) -> bool {
        self.groups.get(&group).copied().unwrap_or(false)
    }

    pub fn set_enabled(&mut self, group: SiteGroup, enabled: bool) {
        self.groups.insert(group, enabled);
    }

    /// Flip a group, returning its new state
    pub fn toggle(&mut self, group: SiteGroup) -> bool {
        let enabled = !self.is_enabled(group);
        self.set_enabled(group, enabled);
        enabled
    }

    pub fn groups(&self) -> &BTreeMap<SiteGroup, bool> {
        &self.groups
    }

    pub fn custom_sites(&self) -> &[String] {
        &self.custom
    }

    /// Add a custom hostname. Returns the normalized name if it was new.
    pub fn add_custom(&mut self, input: &str) -> Option<String> {
        let site = normalize_hostname(input)?;
        if self.custom.contains(&site) {
            return None;
        }
        self.custom.push(site.clone());
        Some(site)
    }

    pub fn remove_custom(&mut self, input: &str) -> bool {
        let Some(site) = normalize_hostname(input) else {
            return false;
        };
        let before = self.custom.len();
        self.custom.retain(|existing| *existing != site);
        self.custom.len() != before
    }

    /// Hostnames to block: enabled groups in declaration order, then custom
    /// sites, without duplicates
    pub fn sites(&self) -> Vec<String> {
        let mut sites: Vec<String> = Vec::new();
        let group_hosts = SiteGroup::ALL
            .into_iter()
            .filter(|group| self.is_enabled(*group))
            .flat_map(|group| group.hosts().iter().map(|host| host.to_string()));

        for site in group_hosts.chain(self.custom.iter().cloned()) {
            if !sites.contains(&site) {
                sites.push(site);
            }
        }
        sites
    }
}

impl Default for BlockSelection {
    fn default() -> Self {
        Self::new()
    }
}
