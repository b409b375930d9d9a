//! Systemd unit lifecycle operations
//!
//! The OS service manager owns unit state; this module only issues
//! lifecycle requests and judges them by exit status. Callers decide which
//! failures are fatal (install) and which are tolerated (uninstall).

use async_trait::async_trait;

use atgmlogger_errors::Error;

use crate::process::run_checked;

/// Trait for issuing unit lifecycle requests to the service manager
#[async_trait]
pub trait UnitManager: Send + Sync {
    /// Reload the service manager's unit cache
    async fn daemon_reload(&self) -> Result<(), Error>;

    /// Enable a unit for boot-time activation
    async fn enable(&self, unit: &str) -> Result<(), Error>;

    /// Disable a unit
    async fn disable(&self, unit: &str) -> Result<(), Error>;

    /// Start a unit now
    async fn start(&self, unit: &str) -> Result<(), Error>;

    /// Stop a unit now
    async fn stop(&self, unit: &str) -> Result<(), Error>;

    /// Whether a unit is currently active
    async fn is_active(&self, unit: &str) -> bool;
}

/// `systemctl`-backed implementation
#[derive(Debug, Clone, Default)]
pub struct Systemctl;

impl Systemctl {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UnitManager for Systemctl {
    async fn daemon_reload(&self) -> Result<(), Error> {
        run_checked("systemctl", &["daemon-reload"]).await?;
        Ok(())
    }

    async fn enable(&self, unit: &str) -> Result<(), Error> {
        run_checked("systemctl", &["enable", unit]).await?;
        Ok(())
    }

    async fn disable(&self, unit: &str) -> Result<(), Error> {
        run_checked("systemctl", &["disable", unit]).await?;
        Ok(())
    }

    async fn start(&self, unit: &str) -> Result<(), Error> {
        run_checked("systemctl", &["start", unit]).await?;
        Ok(())
    }

    async fn stop(&self, unit: &str) -> Result<(), Error> {
        run_checked("systemctl", &["stop", unit]).await?;
        Ok(())
    }

    async fn is_active(&self, unit: &str) -> bool {
        crate::process::run_command("systemctl", &["is-active", "--quiet", unit])
            .await
            .map(|output| output.success())
            .unwrap_or(false)
    }
}
