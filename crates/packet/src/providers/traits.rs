//! Provider trait and common types for bare metal device APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API rejected the credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// API rejected the request parameters.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Device reached the `failed` state while provisioning.
    #[error("Device {0} failed to provision")]
    ProvisioningFailed(String),

    /// Operation timed out.
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Device lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    /// Waiting for hardware.
    Queued,
    /// Operating system is being installed.
    Provisioning,
    /// Device is up.
    Active,
    /// Power on in progress.
    PoweringOn,
    /// Power off in progress.
    PoweringOff,
    /// Device is powered off.
    Inactive,
    /// Device is being reinstalled.
    Reinstalling,
    /// Device is being torn down.
    Deprovisioning,
    /// Provisioning failed.
    Failed,
    /// Unknown state.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Provisioning => write!(f, "provisioning"),
            Self::Active => write!(f, "active"),
            Self::PoweringOn => write!(f, "powering_on"),
            Self::PoweringOff => write!(f, "powering_off"),
            Self::Inactive => write!(f, "inactive"),
            Self::Reinstalling => write!(f, "reinstalling"),
            Self::Deprovisioning => write!(f, "deprovisioning"),
            Self::Failed => write!(f, "failed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Billing cycle for a new device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    /// Billed per hour.
    #[default]
    Hourly,
    /// Billed per month.
    Monthly,
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hourly => write!(f, "hourly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

/// IP address assigned to a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress {
    /// Address without prefix length.
    pub address: String,
    /// 4 or 6.
    pub family: u8,
    /// Whether the address is publicly routable.
    pub public: bool,
}

/// A provisioned device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Unique device identifier.
    pub id: String,
    /// Device hostname.
    pub hostname: String,
    /// Current state.
    pub state: DeviceState,
    /// Whether the device is locked against deletion.
    pub locked: bool,
    /// Billing cycle, if reported.
    pub billing_cycle: Option<BillingCycle>,
    /// Plan slug (e.g. "baremetal_0").
    pub plan: String,
    /// Facility code (e.g. "ewr1").
    pub facility: String,
    /// Operating system slug (e.g. "centos_7").
    pub operating_system: String,
    /// Assigned addresses.
    pub ip_addresses: Vec<IpAddress>,
    /// Whether this is a spot instance.
    pub spot_instance: bool,
    /// Provisioning progress, 0-100.
    pub provisioning_percentage: Option<f64>,
    /// When the device was created.
    pub created_at: Option<DateTime<Utc>>,
}

impl Device {
    /// First public IPv4 address, if any.
    #[must_use]
    pub fn public_ipv4(&self) -> Option<&str> {
        self.ip_addresses
            .iter()
            .find(|ip| ip.family == 4 && ip.public)
            .map(|ip| ip.address.as_str())
    }
}

/// An event recorded against a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEvent {
    /// Event identifier.
    pub id: String,
    /// Event type (e.g. "provisioning.104").
    pub event_type: String,
    /// Event state.
    pub state: String,
    /// Human-readable description.
    pub body: String,
    /// When the event was recorded.
    pub created_at: Option<DateTime<Utc>>,
}

/// Request to create a new device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDeviceRequest {
    /// Project to create the device in.
    pub project_id: String,
    /// Hostname for the device.
    pub hostname: String,
    /// Plan slug.
    pub plan: String,
    /// Facility code.
    pub facility: String,
    /// Operating system slug.
    pub operating_system: String,
    /// Billing cycle.
    pub billing_cycle: BillingCycle,
    /// Network boot on every restart.
    pub always_pxe: bool,
    /// Resolved user data.
    pub userdata: String,
    /// Device tags.
    pub tags: Vec<String>,
    /// Provision as a spot instance.
    pub spot_instance: bool,
    /// Maximum spot bid.
    pub spot_price_max: f64,
}

/// Trait for bare metal device APIs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceProvider: Send + Sync {
    /// List all devices in a project.
    async fn list_devices(&self, project_id: &str) -> Result<Vec<Device>, ProviderError>;

    /// Get device by ID.
    async fn get_device(&self, device_id: &str) -> Result<Device, ProviderError>;

    /// Create a new device.
    async fn create_device(&self, req: &CreateDeviceRequest) -> Result<Device, ProviderError>;

    /// Delete a device.
    async fn delete_device(&self, device_id: &str) -> Result<(), ProviderError>;

    /// Lock a device against deletion.
    async fn lock_device(&self, device_id: &str) -> Result<(), ProviderError>;

    /// Unlock a device.
    async fn unlock_device(&self, device_id: &str) -> Result<(), ProviderError>;

    /// Power on a device.
    async fn power_on_device(&self, device_id: &str) -> Result<(), ProviderError>;

    /// Power off a device.
    async fn power_off_device(&self, device_id: &str) -> Result<(), ProviderError>;

    /// Reboot a device.
    async fn reboot_device(&self, device_id: &str) -> Result<(), ProviderError>;

    /// List events recorded for a device.
    async fn list_device_events(
        &self,
        device_id: &str,
    ) -> Result<Vec<DeviceEvent>, ProviderError>;
}
