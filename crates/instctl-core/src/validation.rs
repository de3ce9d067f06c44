//! Request validation
//!
//! Two gates run before any provider client is built:
//! - [`RequestParams::require`] rejects requests with absent or empty parameters
//! - [`TimestampGate::check`] rejects a `secret` timestamp outside the tolerance window
//!
//! The timestamp gate is replay mitigation, not authentication.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Query parameters of one request
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    values: HashMap<String, String>,
}

impl RequestParams {
    /// Wrap a decoded query-string map
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Get a parameter, treating empty values as absent
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Fail with `MissingParameter` naming every absent or empty field
    pub fn require(&self, names: &[&str]) -> Result<()> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| self.get(name).is_none())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::missing(missing.join(", ")))
        }
    }

    /// Get a parameter that `require` has already checked
    pub fn required(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| Error::missing(name.to_string()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Region, profile and instance name identifying one instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceTarget {
    /// Provider region (e.g. "us-east-1")
    pub region: String,
    /// Credential profile name
    pub profile: String,
    /// Instance name; empty for account-wide calls such as listing
    pub name: String,
}

impl InstanceTarget {
    /// Create a target for one instance
    pub fn new(
        region: impl Into<String>,
        profile: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            profile: profile.into(),
            name: name.into(),
        }
    }

    /// Create an account-wide target with no instance name
    pub fn account(region: impl Into<String>, profile: impl Into<String>) -> Self {
        Self::new(region, profile, String::new())
    }
}

/// Freshness check for the `secret` timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampGate {
    tolerance_secs: u64,
}

impl TimestampGate {
    /// Create a gate accepting timestamps within `tolerance_secs` of now
    pub fn new(tolerance_secs: u64) -> Self {
        Self { tolerance_secs }
    }

    /// Configured tolerance in seconds
    pub fn tolerance_secs(&self) -> u64 {
        self.tolerance_secs
    }

    /// Check `secret` against `now` (Unix seconds).
    ///
    /// Accepts when `|now - secret| <= tolerance`. Returns the parsed timestamp.
    pub fn check(&self, secret: &str, now: i64) -> Result<i64> {
        let timestamp: i64 = secret
            .parse()
            .map_err(|_| Error::stale("Invalid timestamp format"))?;

        let skew = now.abs_diff(timestamp);
        if skew > self.tolerance_secs {
            return Err(Error::stale(format!(
                "Timestamp is {} seconds from server time (limit {})",
                skew, self.tolerance_secs
            )));
        }

        Ok(timestamp)
    }

    /// Check `secret` against the current wall clock
    pub fn check_now(&self, secret: &str) -> Result<i64> {
        self.check(secret, chrono::Utc::now().timestamp())
    }
}

/// Actions accepted by `/api/instance`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceAction {
    /// Reboot
    Reset,
    /// Stop
    PowerOff,
    /// Start
    PowerOn,
    /// Read instance details
    Status,
    /// Replace the static IP and sync DNS
    ChangeIp,
}

impl InstanceAction {
    /// Every action, in documentation order
    pub const ALL: [InstanceAction; 5] = [
        InstanceAction::Reset,
        InstanceAction::PowerOff,
        InstanceAction::PowerOn,
        InstanceAction::Status,
        InstanceAction::ChangeIp,
    ];

    /// Query-string spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceAction::Reset => "reset",
            InstanceAction::PowerOff => "poweroff",
            InstanceAction::PowerOn => "poweron",
            InstanceAction::Status => "status",
            InstanceAction::ChangeIp => "changeip",
        }
    }

    /// Name of the provider call, used as the error step
    pub fn provider_call(&self) -> &'static str {
        match self {
            InstanceAction::Reset => "reboot",
            InstanceAction::PowerOff => "stop",
            InstanceAction::PowerOn => "start",
            InstanceAction::Status => "status",
            InstanceAction::ChangeIp => "changeip",
        }
    }
}

impl FromStr for InstanceAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| Error::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for InstanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
