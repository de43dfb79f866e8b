//! Rendering of command results for the terminal.

use colored::{ColoredString, Colorize};
use serde_json::json;

use crate::providers::{Device, DeviceEvent, DeviceState};
use crate::router::Outcome;

/// Render an outcome as pretty-printed JSON.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_json(outcome: &Outcome) -> Result<String, serde_json::Error> {
    match outcome {
        Outcome::Devices(devices) => serde_json::to_string_pretty(devices),
        Outcome::Device(device) => serde_json::to_string_pretty(device),
        Outcome::Events(events) => serde_json::to_string_pretty(events),
        Outcome::Completed { action, device_id } => serde_json::to_string_pretty(&json!({
            "action": action.to_string(),
            "device_id": device_id,
        })),
    }
}

/// Render an outcome as human-readable text.
#[must_use]
pub fn render_text(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Devices(devices) => device_table(devices),
        Outcome::Device(device) => device_details(device),
        Outcome::Events(events) => event_table(events),
        Outcome::Completed { action, device_id } => {
            format!("{} Device {device_id} {}", "✓".green().bold(), action.done())
        }
    }
}

fn paint_state(state: DeviceState, width: usize) -> ColoredString {
    let text = format!("{:<width$}", state.to_string());
    match state {
        DeviceState::Active => text.green(),
        DeviceState::Failed => text.red(),
        DeviceState::Queued | DeviceState::Provisioning | DeviceState::Reinstalling => {
            text.yellow()
        }
        _ => text.normal(),
    }
}

fn device_table(devices: &[Device]) -> String {
    if devices.is_empty() {
        return "No devices found".bright_black().to_string();
    }

    let mut lines = vec![
        format!(
            "{:<38} {:<20} {:<14} {:<7} {:<14} {:<9} {:<16}",
            "ID", "HOSTNAME", "STATE", "LOCKED", "PLAN", "FACILITY", "IPv4"
        ),
        "-".repeat(124),
    ];
    for device in devices {
        lines.push(format!(
            "{:<38} {:<20} {} {:<7} {:<14} {:<9} {:<16}",
            device.id,
            device.hostname,
            paint_state(device.state, 14),
            device.locked,
            device.plan,
            device.facility,
            device.public_ipv4().unwrap_or_default()
        ));
    }
    lines.join("\n")
}

fn device_details(device: &Device) -> String {
    let billing = device
        .billing_cycle
        .map(|b| b.to_string())
        .unwrap_or_default();
    let created = device
        .created_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    let addresses = device
        .ip_addresses
        .iter()
        .map(|ip| ip.address.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines = vec![
        "Device Details:".bold().to_string(),
        format!("  ID:        {}", device.id),
        format!("  Hostname:  {}", device.hostname),
        format!("  State:     {}", paint_state(device.state, 0)),
    ];
    if let Some(pct) = device
        .provisioning_percentage
        .filter(|_| device.state == DeviceState::Provisioning)
    {
        lines.push(format!("  Progress:  {pct:.0}%"));
    }
    lines.extend([
        format!("  Locked:    {}", device.locked),
        format!("  Plan:      {}", device.plan),
        format!("  Facility:  {}", device.facility),
        format!("  OS:        {}", device.operating_system),
        format!("  Billing:   {billing}"),
        format!("  Spot:      {}", device.spot_instance),
        format!("  Addresses: {addresses}"),
        format!("  Created:   {created}"),
    ]);
    lines.join("\n")
}

fn event_table(events: &[DeviceEvent]) -> String {
    if events.is_empty() {
        return "No events found".bright_black().to_string();
    }

    let mut lines = vec![
        format!("{:<26} {:<24} {:<10} {}", "CREATED", "TYPE", "STATE", "MESSAGE"),
        "-".repeat(100),
    ];
    for event in events {
        lines.push(format!(
            "{:<26} {:<24} {:<10} {}",
            event
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_default(),
            event.event_type,
            event.state,
            event.body
        ));
    }
    lines.join("\n")
}
