//! Packet API client implementation.
//!
//! API Documentation: <https://metal.equinix.com/developers/api/>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use super::models::{
    CreateDeviceBody, DeviceActionBody, DeviceList, DeviceResource, ErrorResponse, EventList,
    EventResource, UpdateDeviceBody,
};
use crate::providers::traits::{
    BillingCycle, CreateDeviceRequest, Device, DeviceEvent, DeviceProvider, DeviceState,
    IpAddress, ProviderError,
};

/// Base URL for the Packet API.
pub const API_BASE_URL: &str = "https://api.packet.net";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size used when listing devices.
const PAGE_SIZE: u32 = 100;

/// Packet bare metal device API.
#[derive(Clone)]
pub struct Packet {
    /// HTTP client.
    client: Client,
    /// API token for authentication.
    api_key: String,
    /// API root, without trailing slash.
    base_url: String,
}

impl Packet {
    /// Create a new Packet client against the public API.
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, API_BASE_URL)
    }

    /// Create a new Packet client against a custom API root.
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the HTTP client cannot be created.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ProviderError::Config(format!("invalid API URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProviderError::Config(format!(
                "API URL must be http or https: {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("packet-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Build an authenticated request.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!(method = %method, url = %url, "API request");

        self.client
            .request(method, &url)
            .header("X-Auth-Token", &self.api_key)
            .header("Accept", "application/json")
    }

    /// Make an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let response = self.request(Method::GET, path).send().await?;
        Self::handle_response(response).await
    }

    /// Make an authenticated POST request.
    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ProviderError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        let response = self.request(Method::POST, path).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Make an authenticated request whose response body is ignored.
    async fn send_empty<B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ProviderError> {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(Self::error_for_status(status, &text))
        }
    }

    /// Handle API response, parsing JSON or error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "Failed to parse response");
                ProviderError::Serialization(e)
            })
        } else {
            Err(Self::error_for_status(status, &text))
        }
    }

    /// Map a non-success status and body to an error.
    fn error_for_status(status: StatusCode, body: &str) -> ProviderError {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .filter(|e| !e.errors.is_empty())
            .map_or_else(|| body.to_string(), |e| e.errors.join("; "));

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::Unauthorized(message)
            }
            StatusCode::NOT_FOUND => ProviderError::NotFound(message),
            StatusCode::UNPROCESSABLE_ENTITY => ProviderError::Validation(message),
            _ => ProviderError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Convert API device resource to our Device type.
    fn to_device(resource: &DeviceResource) -> Device {
        let state = serde_json::from_value(serde_json::Value::String(resource.state.clone()))
            .unwrap_or(DeviceState::Unknown);

        let billing_cycle = match resource.billing_cycle.as_deref() {
            Some("hourly") => Some(BillingCycle::Hourly),
            Some("monthly") => Some(BillingCycle::Monthly),
            _ => None,
        };

        Device {
            id: resource.id.clone(),
            hostname: resource.hostname.clone(),
            state,
            locked: resource.locked,
            billing_cycle,
            plan: resource
                .plan
                .as_ref()
                .and_then(|p| p.slug.clone())
                .unwrap_or_default(),
            facility: resource
                .facility
                .as_ref()
                .and_then(|f| f.code.clone())
                .unwrap_or_default(),
            operating_system: resource
                .operating_system
                .as_ref()
                .and_then(|os| os.slug.clone())
                .unwrap_or_default(),
            ip_addresses: resource
                .ip_addresses
                .iter()
                .map(|ip| IpAddress {
                    address: ip.address.clone(),
                    family: ip.address_family,
                    public: ip.public,
                })
                .collect(),
            spot_instance: resource.spot_instance,
            provisioning_percentage: resource.provisioning_percentage,
            created_at: parse_timestamp(resource.created_at.as_deref()),
        }
    }

    fn to_event(resource: &EventResource) -> DeviceEvent {
        DeviceEvent {
            id: resource.id.clone(),
            event_type: resource.event_type.clone(),
            state: resource.state.clone(),
            body: resource.body.clone(),
            created_at: parse_timestamp(resource.created_at.as_deref()),
        }
    }

    async fn device_action(&self, device_id: &str, action: &str) -> Result<(), ProviderError> {
        info!(device_id = %device_id, action, "Sending device action");
        let body = DeviceActionBody {
            action_type: action.to_string(),
        };
        self.send_empty(Method::POST, &format!("/devices/{device_id}/actions"), Some(&body))
            .await
    }

    async fn set_locked(&self, device_id: &str, locked: bool) -> Result<(), ProviderError> {
        info!(device_id = %device_id, locked, "Updating device lock");
        let body = UpdateDeviceBody { locked };
        self.send_empty(Method::PATCH, &format!("/devices/{device_id}"), Some(&body))
            .await
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<chrono::DateTime<chrono::Utc>> {
    value
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

#[async_trait]
impl DeviceProvider for Packet {
    async fn list_devices(&self, project_id: &str) -> Result<Vec<Device>, ProviderError> {
        let mut devices = Vec::new();
        let mut page = 1u32;

        loop {
            let list: DeviceList = self
                .get(&format!(
                    "/projects/{project_id}/devices?page={page}&per_page={PAGE_SIZE}"
                ))
                .await?;
            devices.extend(list.devices.iter().map(Self::to_device));

            let Some(next) = list.meta.next else {
                break;
            };
            debug!(next = %next.href, "Following next page");
            page += 1;
        }

        debug!(project_id = %project_id, count = devices.len(), "Listed devices");
        Ok(devices)
    }

    async fn get_device(&self, device_id: &str) -> Result<Device, ProviderError> {
        let device: DeviceResource = self.get(&format!("/devices/{device_id}")).await?;
        Ok(Self::to_device(&device))
    }

    async fn create_device(&self, req: &CreateDeviceRequest) -> Result<Device, ProviderError> {
        info!(
            project_id = %req.project_id,
            hostname = %req.hostname,
            plan = %req.plan,
            facility = %req.facility,
            "Creating device"
        );

        let body = CreateDeviceBody {
            hostname: req.hostname.clone(),
            plan: req.plan.clone(),
            facility: req.facility.clone(),
            operating_system: req.operating_system.clone(),
            billing_cycle: req.billing_cycle.to_string(),
            always_pxe: req.always_pxe,
            userdata: req.userdata.clone(),
            tags: req.tags.clone(),
            spot_instance: req.spot_instance,
            spot_price_max: req.spot_instance.then_some(req.spot_price_max),
        };

        let device: DeviceResource = self
            .post(&format!("/projects/{}/devices", req.project_id), &body)
            .await?;

        info!(device_id = %device.id, "Device created");
        Ok(Self::to_device(&device))
    }

    async fn delete_device(&self, device_id: &str) -> Result<(), ProviderError> {
        info!(device_id = %device_id, "Deleting device");
        self.send_empty::<()>(Method::DELETE, &format!("/devices/{device_id}"), None)
            .await
    }

    async fn lock_device(&self, device_id: &str) -> Result<(), ProviderError> {
        self.set_locked(device_id, true).await
    }

    async fn unlock_device(&self, device_id: &str) -> Result<(), ProviderError> {
        self.set_locked(device_id, false).await
    }

    async fn power_on_device(&self, device_id: &str) -> Result<(), ProviderError> {
        self.device_action(device_id, "power_on").await
    }

    async fn power_off_device(&self, device_id: &str) -> Result<(), ProviderError> {
        self.device_action(device_id, "power_off").await
    }

    async fn reboot_device(&self, device_id: &str) -> Result<(), ProviderError> {
        self.device_action(device_id, "reboot").await
    }

    async fn list_device_events(
        &self,
        device_id: &str,
    ) -> Result<Vec<DeviceEvent>, ProviderError> {
        let list: EventList = self.get(&format!("/devices/{device_id}/events")).await?;
        Ok(list.events.iter().map(Self::to_event).collect())
    }
}
