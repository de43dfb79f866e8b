//! Provisioning progress reporting for newly created devices.

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::providers::{Device, DeviceProvider, DeviceState, ProviderError};

/// Polling interval while a device provisions.
const POLL_INTERVAL_SECS: u64 = 10;

/// Give up waiting after this long.
const PROVISION_TIMEOUT_SECS: u64 = 1800;

/// How the watcher polls and whether it draws a spinner.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    /// Delay between status polls.
    pub interval: Duration,
    /// Maximum time to wait for the device to become active.
    pub timeout: Duration,
    /// Draw the spinner on the terminal.
    pub draw: bool,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(PROVISION_TIMEOUT_SECS),
            draw: true,
        }
    }
}

fn describe(device: &Device) -> String {
    match device.provisioning_percentage {
        Some(pct) if device.state == DeviceState::Provisioning => {
            format!("{} is {} ({pct:.0}%)", device.hostname, device.state)
        }
        _ => format!("{} is {}", device.hostname, device.state),
    }
}

/// Poll a device until it is active, reporting each state on a spinner.
///
/// # Errors
/// Returns [`ProviderError::ProvisioningFailed`] if the device enters the
/// `failed` state, [`ProviderError::Timeout`] if it is not active in time,
/// or any error from polling the provider.
pub async fn watch_provisioning(
    provider: &dyn DeviceProvider,
    device: Device,
    settings: &WatchSettings,
) -> Result<Device, ProviderError> {
    let bar = if settings.draw {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.cyan} [{prefix}] {msg} [{elapsed}]")
    {
        bar.set_style(style);
    }
    bar.set_prefix(device.id.clone());
    bar.enable_steady_tick(Duration::from_millis(120));

    info!(device_id = %device.id, "Waiting for device to provision");
    let start = Instant::now();
    let mut current = device;

    loop {
        bar.set_message(describe(&current));

        match current.state {
            DeviceState::Active => {
                bar.finish_with_message(describe(&current));
                info!(device_id = %current.id, "Device is active");
                return Ok(current);
            }
            DeviceState::Failed => {
                bar.abandon_with_message(describe(&current));
                return Err(ProviderError::ProvisioningFailed(current.id));
            }
            _ => {}
        }

        if start.elapsed() >= settings.timeout {
            bar.abandon_with_message(describe(&current));
            return Err(ProviderError::Timeout(settings.timeout.as_secs()));
        }

        tokio::time::sleep(settings.interval).await;

        current = match provider.get_device(&current.id).await {
            Ok(device) => device,
            Err(e) => {
                bar.abandon();
                return Err(e);
            }
        };

        debug!(
            device_id = %current.id,
            state = %current.state,
            elapsed_secs = start.elapsed().as_secs(),
            "Polling device state"
        );
    }
}
