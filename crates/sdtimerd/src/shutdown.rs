use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::info;

/// Ask the OS to power off. Only ever called after the grace period
/// elapsed without a cancel.
#[cfg(unix)]
pub async fn invoke() -> Result<()> {
    info!("issuing OS shutdown");
    // systemd hosts first, classic shutdown(8) as fallback.
    if let Ok(status) = Command::new("systemctl").arg("poweroff").status().await {
        if status.success() {
            return Ok(());
        }
    }
    let status = Command::new("shutdown")
        .args(["-h", "now"])
        .status()
        .await
        .context("spawning shutdown")?;
    anyhow::ensure!(status.success(), "shutdown exited with {status}");
    Ok(())
}

#[cfg(windows)]
pub async fn invoke() -> Result<()> {
    info!("issuing OS shutdown");
    let status = Command::new("shutdown")
        .args(["/s", "/t", "0", "/f"])
        .status()
        .await
        .context("spawning shutdown")?;
    anyhow::ensure!(status.success(), "shutdown exited with {status}");
    Ok(())
}
