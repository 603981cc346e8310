use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, warn};

/// Pauses and resumes external media playback around an alarm, via
/// `playerctl` (MPRIS). Remembers whether anything was actually playing
/// when the alarm hit, so a later resume never starts music the user had
/// stopped themselves.
pub struct MediaController {
    enabled: bool,
    was_playing: bool,
}

impl MediaController {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            was_playing: false,
        }
    }

    pub async fn pause(&mut self) {
        if !self.enabled {
            return;
        }
        self.was_playing = matches!(player_status().await.as_deref(), Some("Playing"));
        if !self.was_playing {
            debug!("no active playback to pause");
            return;
        }
        if let Err(e) = run_player(&["pause"]).await {
            warn!(error = %e, "pausing playback failed");
        }
    }

    pub async fn resume(&mut self) {
        if !self.enabled || !self.was_playing {
            return;
        }
        self.was_playing = false;
        if let Err(e) = run_player(&["play"]).await {
            warn!(error = %e, "resuming playback failed");
        }
    }
}

/// "Playing" / "Paused" / "Stopped", or None when no player (or no
/// playerctl) is around.
async fn player_status() -> Option<String> {
    let output = Command::new("playerctl").arg("status").output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

async fn run_player(args: &[&str]) -> Result<()> {
    let status = Command::new("playerctl")
        .args(args)
        .status()
        .await
        .context("spawning playerctl")?;
    anyhow::ensure!(status.success(), "playerctl exited with {status}");
    Ok(())
}
