// src/config/validate.rs

use anyhow::{Result, anyhow};

use crate::config::settings::Settings;

/// Run basic semantic validation against resolved settings.
///
/// This checks:
/// - the poll interval is non-zero (a zero interval spins the scanner)
/// - at least one tracked extension is configured
/// - the proxy port and the child's port differ
pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.interval.is_zero() {
        return Err(anyhow!("poll interval must be greater than zero"));
    }

    if settings.extensions.is_empty() {
        return Err(anyhow!("at least one tracked file extension is required"));
    }

    if settings.port == settings.app_port {
        return Err(anyhow!(
            "proxy port and app port must differ (both are {})",
            settings.port
        ));
    }

    Ok(())
}
