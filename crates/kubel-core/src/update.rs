//! # Update Check
//!
//! Compares the running version with a published release manifest. Fetching
//! the manifest is the app's job; downloading and installing releases is
//! not handled at all.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Version of this build.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Release manifest published next to the downloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateManifest {
    /// Version string (semver, optional `v` prefix)
    pub version: String,
    /// Release notes (markdown)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Download page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Compare two `major.minor.patch` strings; missing or non-numeric parts count as 0.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> (u32, u32, u32) {
        let parts: Vec<&str> = v.trim().trim_start_matches('v').split('.').collect();
        (
            parts.first().and_then(|s| s.parse().ok()).unwrap_or(0),
            parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0),
            parts
                .get(2)
                .and_then(|s| s.split(['-', '+']).next()?.parse().ok())
                .unwrap_or(0),
        )
    };

    parse(a).cmp(&parse(b))
}

/// True when `candidate` is strictly newer than `current`.
#[must_use]
pub fn is_newer_version(candidate: &str, current: &str) -> bool {
    compare_versions(candidate, current) == Ordering::Greater
}

/// Last thing the update check observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateEvent {
    #[default]
    None,
    UpdateAvailable,
    UpToDate,
    Error,
}

impl fmt::Display for UpdateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateEvent::None => write!(f, "none"),
            UpdateEvent::UpdateAvailable => write!(f, "update-available"),
            UpdateEvent::UpToDate => write!(f, "up-to-date"),
            UpdateEvent::Error => write!(f, "error"),
        }
    }
}

/// Update state reported to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateState {
    pub current_version: String,
    pub is_update_available: bool,
    pub update_version: Option<String>,
    pub notes: Option<String>,
    pub url: Option<String>,
    pub error: Option<String>,
    pub last_event: UpdateEvent,
}

impl UpdateState {
    /// State before any check ran.
    #[must_use]
    pub fn new(current_version: &str) -> Self {
        Self {
            current_version: current_version.to_string(),
            is_update_available: false,
            update_version: None,
            notes: None,
            url: None,
            error: None,
            last_event: UpdateEvent::None,
        }
    }

    /// State after a successful manifest fetch.
    #[must_use]
    pub fn from_check(current_version: &str, manifest: &UpdateManifest) -> Self {
        let available = is_newer_version(&manifest.version, current_version);
        Self {
            is_update_available: available,
            update_version: Some(manifest.version.clone()),
            notes: manifest.notes.clone(),
            url: manifest.url.clone(),
            last_event: if available {
                UpdateEvent::UpdateAvailable
            } else {
                UpdateEvent::UpToDate
            },
            ..Self::new(current_version)
        }
    }

    /// State after a failed check.
    #[must_use]
    pub fn failed(current_version: &str, error: impl fmt::Display) -> Self {
        Self {
            error: Some(error.to_string()),
            last_event: UpdateEvent::Error,
            ..Self::new(current_version)
        }
    }
}
