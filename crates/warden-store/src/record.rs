//! Store keys and the partial record they map to

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use warden_api::Settings;
use warden_util::Domain;

use crate::StoreResult;

/// Keys of the shared store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    TimeData,
    Limits,
    BlockedSites,
    Settings,
    ExtensionEnabled,
}

impl StoreKey {
    pub const ALL: &'static [StoreKey] = &[
        StoreKey::TimeData,
        StoreKey::Limits,
        StoreKey::BlockedSites,
        StoreKey::Settings,
        StoreKey::ExtensionEnabled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::TimeData => "timeData",
            StoreKey::Limits => "limits",
            StoreKey::BlockedSites => "blockedSites",
            StoreKey::Settings => "settings",
            StoreKey::ExtensionEnabled => "extensionEnabled",
        }
    }
}

/// Accumulated seconds per calendar day and domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeData(BTreeMap<String, BTreeMap<Domain, u64>>);

impl TimeData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds recorded for `domain` on `day` (0 if none)
    pub fn seconds(&self, day: &str, domain: &Domain) -> u64 {
        self.0
            .get(day)
            .and_then(|domains| domains.get(domain))
            .copied()
            .unwrap_or(0)
    }

    /// Add seconds for `domain` on `day`, creating entries as needed.
    /// Returns the new total.
    pub fn add(&mut self, day: &str, domain: &Domain, seconds: u64) -> u64 {
        let total = self
            .0
            .entry(day.to_string())
            .or_default()
            .entry(domain.clone())
            .or_insert(0);
        *total = total.saturating_add(seconds);
        *total
    }

    /// All totals for one day
    pub fn day(&self, day: &str) -> BTreeMap<Domain, u64> {
        self.0.get(day).cloned().unwrap_or_default()
    }

    pub fn days(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|d| d.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Daily budgets in minutes per domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Limits(BTreeMap<Domain, u32>);

impl Limits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, domain: &Domain) -> Option<u32> {
        self.0.get(domain).copied().filter(|minutes| *minutes > 0)
    }

    pub fn set(&mut self, domain: Domain, minutes: u32) {
        self.0.insert(domain, minutes);
    }

    pub fn remove(&mut self, domain: &Domain) -> Option<u32> {
        self.0.remove(domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Domain, u32)> {
        self.0.iter().map(|(domain, minutes)| (domain, *minutes))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(Domain, u32)> for Limits {
    fn from_iter<I: IntoIterator<Item = (Domain, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Domains subject to a permanent block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockList(BTreeSet<Domain>);

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, domain: &Domain) -> bool {
        self.0.contains(domain)
    }

    pub fn insert(&mut self, domain: Domain) -> bool {
        self.0.insert(domain)
    }

    pub fn remove(&mut self, domain: &Domain) -> bool {
        self.0.remove(domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Domain> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<Domain> for BlockList {
    fn from_iter<I: IntoIterator<Item = Domain>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A partial view of the store: only the requested keys are populated.
///
/// Absent keys read as first-run defaults through the accessor methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_data: Option<TimeData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<Limits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_sites: Option<BlockList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_enabled: Option<bool>,
}

impl StoreRecord {
    pub fn time_data(&self) -> TimeData {
        self.time_data.clone().unwrap_or_default()
    }

    pub fn limits(&self) -> Limits {
        self.limits.clone().unwrap_or_default()
    }

    pub fn blocked_sites(&self) -> BlockList {
        self.blocked_sites.clone().unwrap_or_default()
    }

    pub fn settings(&self) -> Settings {
        self.settings.unwrap_or_default()
    }

    pub fn extension_enabled(&self) -> bool {
        self.extension_enabled.unwrap_or(true)
    }

    /// Fill every absent key with its first-run default
    pub fn fill_defaults(&mut self, settings: Settings) {
        self.time_data.get_or_insert_with(TimeData::default);
        self.limits.get_or_insert_with(Limits::default);
        self.blocked_sites.get_or_insert_with(BlockList::default);
        self.settings.get_or_insert(settings);
        self.extension_enabled.get_or_insert(true);
    }

    /// Decode a stored JSON value into the field for `key`
    pub(crate) fn load_json(&mut self, key: StoreKey, json: &str) -> StoreResult<()> {
        match key {
            StoreKey::TimeData => self.time_data = Some(serde_json::from_str(json)?),
            StoreKey::Limits => self.limits = Some(serde_json::from_str(json)?),
            StoreKey::BlockedSites => self.blocked_sites = Some(serde_json::from_str(json)?),
            StoreKey::Settings => self.settings = Some(serde_json::from_str(json)?),
            StoreKey::ExtensionEnabled => {
                self.extension_enabled = Some(serde_json::from_str(json)?)
            }
        }
        Ok(())
    }

    /// Encode the populated fields as (key, JSON) pairs
    pub(crate) fn to_json_entries(&self) -> StoreResult<Vec<(StoreKey, String)>> {
        let mut entries = Vec::new();
        if let Some(v) = &self.time_data {
            entries.push((StoreKey::TimeData, serde_json::to_string(v)?));
        }
        if let Some(v) = &self.limits {
            entries.push((StoreKey::Limits, serde_json::to_string(v)?));
        }
        if let Some(v) = &self.blocked_sites {
            entries.push((StoreKey::BlockedSites, serde_json::to_string(v)?));
        }
        if let Some(v) = &self.settings {
            entries.push((StoreKey::Settings, serde_json::to_string(v)?));
        }
        if let Some(v) = &self.extension_enabled {
            entries.push((StoreKey::ExtensionEnabled, serde_json::to_string(v)?));
        }
        Ok(entries)
    }
}
