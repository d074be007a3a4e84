//! # Update Check
//!
//! Fetches the release manifest and compares it with the running version.
//! Only checks: downloading and installing are left to the platform
//! installer.
//!
//! ## Configuration
//!
//! - `KUBEL_UPDATE_URL`: URL of the JSON manifest (`{ "version", "notes"?, "url"? }`)

use kubel_core::{CURRENT_VERSION, KubelError, UpdateManifest, UpdateState};
use std::time::Duration;

/// Environment variable holding the manifest URL.
pub const UPDATE_URL_ENV: &str = "KUBEL_UPDATE_URL";

/// Default manifest location.
pub const DEFAULT_UPDATE_URL: &str =
    "https://github.com/kubel-project/kubel/releases/latest/download/latest.json";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Manifest URL from `KUBEL_UPDATE_URL`, or the default.
pub fn update_url_from_env() -> String {
    std::env::var(UPDATE_URL_ENV)
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_UPDATE_URL.to_string())
}

/// Download and decode the manifest.
pub async fn fetch_manifest(url: &str) -> Result<UpdateManifest, KubelError> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .map_err(|e| KubelError::UpdateError(e.to_string()))?;

    if !response.status().is_success() {
        return Err(KubelError::UpdateError(format!(
            "Failed to fetch manifest: {}",
            response.status()
        )));
    }

    response
        .json::<UpdateManifest>()
        .await
        .map_err(|e| KubelError::UpdateError(format!("Invalid manifest: {e}")))
}

/// Run one check; failures end up in the returned state.
pub async fn check_for_update(url: &str) -> UpdateState {
    tracing::info!("Checking for update (no-install) at {}", url);

    match fetch_manifest(url).await {
        Ok(manifest) => {
            let state = UpdateState::from_check(CURRENT_VERSION, &manifest);
            if state.is_update_available {
                tracing::info!("Update available: {} -> {}", CURRENT_VERSION, manifest.version);
            } else {
                tracing::info!("Already running latest version: {}", CURRENT_VERSION);
            }
            state
        }
        Err(e) => {
            tracing::warn!("Update check failed: {}", e);
            UpdateState::failed(CURRENT_VERSION, e)
        }
    }
}
