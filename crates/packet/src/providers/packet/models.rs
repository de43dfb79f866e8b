//! Packet API request and response models.

use serde::{Deserialize, Serialize};

// ============================================================================
// Common types
// ============================================================================

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Error messages.
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Pagination metadata.
#[derive(Debug, Default, Deserialize)]
pub struct Meta {
    /// Link to the next page, absent on the last page.
    pub next: Option<Href>,
}

/// Link object.
#[derive(Debug, Deserialize)]
pub struct Href {
    /// Relative or absolute URL.
    pub href: String,
}

/// Slug reference (plan, operating system).
#[derive(Debug, Clone, Deserialize)]
pub struct SlugRef {
    /// Slug.
    pub slug: Option<String>,
}

/// Facility reference.
#[derive(Debug, Clone, Deserialize)]
pub struct FacilityRef {
    /// Facility code (e.g. "ewr1").
    pub code: Option<String>,
}

// ============================================================================
// Device types
// ============================================================================

/// Device resource from API.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceResource {
    /// Device ID.
    pub id: String,
    /// Hostname.
    #[serde(default)]
    pub hostname: String,
    /// State string.
    #[serde(default)]
    pub state: String,
    /// Lock flag.
    #[serde(default)]
    pub locked: bool,
    /// Billing cycle.
    pub billing_cycle: Option<String>,
    /// Plan.
    pub plan: Option<SlugRef>,
    /// Facility.
    pub facility: Option<FacilityRef>,
    /// Operating system.
    pub operating_system: Option<SlugRef>,
    /// Assigned addresses.
    #[serde(default)]
    pub ip_addresses: Vec<IpAddressResource>,
    /// Spot flag.
    #[serde(default)]
    pub spot_instance: bool,
    /// Provisioning progress.
    pub provisioning_percentage: Option<f64>,
    /// Creation timestamp.
    pub created_at: Option<String>,
}

/// IP address assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct IpAddressResource {
    /// Address.
    pub address: String,
    /// 4 or 6.
    pub address_family: u8,
    /// Public flag.
    #[serde(default)]
    pub public: bool,
}

/// Device list page.
#[derive(Debug, Deserialize)]
pub struct DeviceList {
    /// Devices on this page.
    #[serde(default)]
    pub devices: Vec<DeviceResource>,
    /// Pagination metadata.
    #[serde(default)]
    pub meta: Meta,
}

// ============================================================================
// Create Device request
// ============================================================================

/// Request body for creating a device.
#[derive(Debug, Serialize)]
pub struct CreateDeviceBody {
    /// Hostname.
    pub hostname: String,
    /// Plan slug.
    pub plan: String,
    /// Facility code.
    pub facility: String,
    /// Operating system slug.
    pub operating_system: String,
    /// "hourly" or "monthly".
    pub billing_cycle: String,
    /// Always network boot.
    pub always_pxe: bool,
    /// User data, omitted when empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub userdata: String,
    /// Tags.
    pub tags: Vec<String>,
    /// Spot flag.
    pub spot_instance: bool,
    /// Maximum spot bid, only sent for spot instances.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_price_max: Option<f64>,
}

// ============================================================================
// Update / action requests
// ============================================================================

/// Partial device update.
#[derive(Debug, Serialize)]
pub struct UpdateDeviceBody {
    /// Lock flag.
    pub locked: bool,
}

/// Device action request.
#[derive(Debug, Serialize)]
pub struct DeviceActionBody {
    /// Action type: `power_on`, `power_off`, `reboot`.
    #[serde(rename = "type")]
    pub action_type: String,
}

// ============================================================================
// Event types
// ============================================================================

/// Event resource from API.
#[derive(Debug, Clone, Deserialize)]
pub struct EventResource {
    /// Event ID.
    pub id: String,
    /// Event type.
    #[serde(rename = "type", default)]
    pub event_type: String,
    /// Event state.
    #[serde(default)]
    pub state: String,
    /// Description.
    #[serde(default)]
    pub body: String,
    /// Creation timestamp.
    pub created_at: Option<String>,
}

/// Event list.
#[derive(Debug, Deserialize)]
pub struct EventList {
    /// Events.
    #[serde(default)]
    pub events: Vec<EventResource>,
}
