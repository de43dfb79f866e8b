//! Command routing for the `baremetal` command group.
//!
//! Every verb maps to exactly one [`DeviceProvider`] call. Errors from the
//! provider are returned unchanged. The local failures are reading the
//! user-data file for `create-device` and a device that was created but never
//! became active, which keeps the new device's id.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::progress::{watch_provisioning, WatchSettings};
use crate::providers::{
    BillingCycle, CreateDeviceRequest, Device, DeviceEvent, DeviceProvider, ProviderError,
};

/// Errors returned by the router.
#[derive(Error, Debug)]
pub enum CommandError {
    /// User-data file could not be read.
    #[error("Failed to read user data from {path}: {source}")]
    UserData {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Device was created but waiting for it to become active failed.
    #[error("Device {device_id} was created but did not become active: {source}")]
    Provisioning {
        device_id: String,
        source: ProviderError,
    },

    /// Provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Single-device operations that return nothing but success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAction {
    Delete,
    Lock,
    Unlock,
    PowerOn,
    PowerOff,
    Reboot,
}

impl DeviceAction {
    /// Past-tense description for confirmations.
    #[must_use]
    pub fn done(self) -> &'static str {
        match self {
            Self::Delete => "deleted",
            Self::Lock => "locked",
            Self::Unlock => "unlocked",
            Self::PowerOn => "powered on",
            Self::PowerOff => "powered off",
            Self::Reboot => "rebooted",
        }
    }
}

impl std::fmt::Display for DeviceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::Lock => write!(f, "lock"),
            Self::Unlock => write!(f, "unlock"),
            Self::PowerOn => write!(f, "power_on"),
            Self::PowerOff => write!(f, "power_off"),
            Self::Reboot => write!(f, "reboot"),
        }
    }
}

/// Per-invocation creation flags.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CreateOptions {
    /// Skip provisioning progress reporting.
    pub silent: bool,
    /// Provision as a spot instance.
    pub spot_instance: bool,
    /// Maximum spot bid.
    pub spot_price_max: f64,
}

/// Parameters of `create-device` before user data is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateDeviceInput {
    pub project_id: String,
    pub hostname: String,
    pub plan: String,
    pub facility: String,
    pub operating_system: String,
    pub billing_cycle: BillingCycle,
    pub always_pxe: bool,
    /// File to read user data from.
    pub file: Option<PathBuf>,
    /// Inline user data; overrides `file` when non-empty.
    pub userdata: Option<String>,
    pub options: CreateOptions,
}

impl CreateDeviceInput {
    fn into_request(self, userdata: String) -> CreateDeviceRequest {
        CreateDeviceRequest {
            project_id: self.project_id,
            hostname: self.hostname,
            plan: self.plan,
            facility: self.facility,
            operating_system: self.operating_system,
            billing_cycle: self.billing_cycle,
            always_pxe: self.always_pxe,
            userdata,
            tags: Vec::new(),
            spot_instance: self.options.spot_instance,
            spot_price_max: self.options.spot_price_max,
        }
    }
}

/// A fully resolved `baremetal` command.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    ListDevices { project_id: String },
    ListDevice { device_id: String },
    CreateDevice(CreateDeviceInput),
    Action { action: DeviceAction, device_id: String },
    ListEvents { device_id: String },
}

/// Result of a routed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Devices(Vec<Device>),
    Device(Device),
    Events(Vec<DeviceEvent>),
    Completed {
        action: DeviceAction,
        device_id: String,
    },
}

/// Resolve the user data sent with a new device.
///
/// A non-empty `userdata` wins and the file is never read. Otherwise a
/// non-empty `file` is read in full, with invalid UTF-8 sequences replaced
/// by U+FFFD. Otherwise the result is empty.
///
/// # Errors
/// Returns [`CommandError::UserData`] if the file cannot be read.
pub fn resolve_user_data(
    file: Option<&Path>,
    userdata: Option<&str>,
) -> Result<String, CommandError> {
    if let Some(inline) = userdata.filter(|s| !s.is_empty()) {
        return Ok(inline.to_string());
    }

    match file.filter(|p| !p.as_os_str().is_empty()) {
        Some(path) => {
            debug!(path = %path.display(), "Reading user data file");
            let bytes = std::fs::read(path).map_err(|source| CommandError::UserData {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        None => Ok(String::new()),
    }
}

/// Dispatches commands to a provider.
pub struct Router<'a> {
    provider: &'a dyn DeviceProvider,
    watch: WatchSettings,
}

impl<'a> Router<'a> {
    /// Create a router with default progress settings.
    #[must_use]
    pub fn new(provider: &'a dyn DeviceProvider) -> Self {
        Self {
            provider,
            watch: WatchSettings::default(),
        }
    }

    /// Override how the verbose creation path polls.
    #[must_use]
    pub fn with_watch_settings(mut self, watch: WatchSettings) -> Self {
        self.watch = watch;
        self
    }

    /// Run one command.
    ///
    /// # Errors
    /// Returns the provider's error unchanged, a user-data read error, or
    /// [`CommandError::Provisioning`] when a verbose creation fails after the
    /// device exists.
    pub async fn dispatch(&self, command: DeviceCommand) -> Result<Outcome, CommandError> {
        let outcome = match command {
            DeviceCommand::ListDevices { project_id } => {
                Outcome::Devices(self.provider.list_devices(&project_id).await?)
            }
            DeviceCommand::ListDevice { device_id } => {
                Outcome::Device(self.provider.get_device(&device_id).await?)
            }
            DeviceCommand::CreateDevice(input) => {
                Outcome::Device(self.create_device(input).await?)
            }
            DeviceCommand::Action { action, device_id } => {
                self.run_action(action, &device_id).await?;
                Outcome::Completed { action, device_id }
            }
            DeviceCommand::ListEvents { device_id } => {
                Outcome::Events(self.provider.list_device_events(&device_id).await?)
            }
        };
        Ok(outcome)
    }

    async fn run_action(&self, action: DeviceAction, device_id: &str) -> Result<(), ProviderError> {
        info!(device_id = %device_id, action = %action, "Running device action");
        match action {
            DeviceAction::Delete => self.provider.delete_device(device_id).await,
            DeviceAction::Lock => self.provider.lock_device(device_id).await,
            DeviceAction::Unlock => self.provider.unlock_device(device_id).await,
            DeviceAction::PowerOn => self.provider.power_on_device(device_id).await,
            DeviceAction::PowerOff => self.provider.power_off_device(device_id).await,
            DeviceAction::Reboot => self.provider.reboot_device(device_id).await,
        }
    }

    async fn create_device(&self, input: CreateDeviceInput) -> Result<Device, CommandError> {
        let userdata = resolve_user_data(input.file.as_deref(), input.userdata.as_deref())?;
        let silent = input.options.silent;
        let request = input.into_request(userdata);

        let device = self.provider.create_device(&request).await?;
        if silent {
            return Ok(device);
        }

        let device_id = device.id.clone();
        watch_provisioning(self.provider, device, &self.watch)
            .await
            .map_err(|source| {
                warn!(device_id = %device_id, error = %source, "Device created but not active");
                CommandError::Provisioning { device_id, source }
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::providers::{DeviceState, MockDeviceProvider};
    use tempfile::TempDir;

    fn device(id: &str, state: DeviceState) -> Device {
        Device {
            id: id.to_string(),
            hostname: "node-1".to_string(),
            state,
            locked: false,
            billing_cycle: Some(BillingCycle::Hourly),
            plan: "baremetal_0".to_string(),
            facility: "ewr1".to_string(),
            operating_system: "centos_7".to_string(),
            ip_addresses: vec![],
            spot_instance: false,
            provisioning_percentage: None,
            created_at: None,
        }
    }

    fn input(file: Option<PathBuf>, userdata: Option<&str>, silent: bool) -> CreateDeviceInput {
        CreateDeviceInput {
            project_id: "proj-1".to_string(),
            hostname: "node-1".to_string(),
            plan: "baremetal_0".to_string(),
            facility: "ewr1".to_string(),
            operating_system: "centos_7".to_string(),
            billing_cycle: BillingCycle::Hourly,
            always_pxe: false,
            file,
            userdata: userdata.map(str::to_string),
            options: CreateOptions {
                silent,
                spot_instance: true,
                spot_price_max: 0.25,
            },
        }
    }

    fn quiet_router(provider: &MockDeviceProvider) -> Router<'_> {
        Router::new(provider).with_watch_settings(WatchSettings {
            interval: Duration::ZERO,
            timeout: Duration::from_secs(60),
            draw: false,
        })
    }

    /// Mock that records every creation request and returns an active device.
    fn recording_provider() -> (MockDeviceProvider, Arc<Mutex<Vec<CreateDeviceRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        let mut provider = MockDeviceProvider::new();
        provider.expect_create_device().returning(move |req| {
            captured.lock().unwrap().push(req.clone());
            Ok(device("dev-1", DeviceState::Active))
        });
        (provider, seen)
    }

    #[test]
    fn test_userdata_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, "bar").unwrap();

        let resolved = resolve_user_data(Some(&path), Some("foo")).unwrap();
        assert_eq!(resolved, "foo");
    }

    #[test]
    fn test_userdata_skips_missing_file() {
        let resolved =
            resolve_user_data(Some(Path::new("missingfile.txt")), Some("foo")).unwrap();
        assert_eq!(resolved, "foo");
    }

    #[test]
    fn test_file_contents_used_without_userdata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, "#cloud-config\npackages:\n  - htop\n").unwrap();

        assert_eq!(
            resolve_user_data(Some(&path), None).unwrap(),
            "#cloud-config\npackages:\n  - htop\n"
        );
        assert_eq!(
            resolve_user_data(Some(&path), Some("")).unwrap(),
            "#cloud-config\npackages:\n  - htop\n"
        );
    }

    #[test]
    fn test_no_sources_yields_empty() {
        assert_eq!(resolve_user_data(None, None).unwrap(), "");
        assert_eq!(resolve_user_data(Some(Path::new("")), Some("")).unwrap(), "");
    }

    #[test]
    fn test_non_utf8_file_is_read_lossily() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"ab\xffcd").unwrap();

        assert_eq!(resolve_user_data(Some(&path), None).unwrap(), "ab\u{FFFD}cd");
    }

    #[tokio::test]
    async fn test_unreadable_file_makes_no_call() {
        let mut provider = MockDeviceProvider::new();
        provider.expect_create_device().never();

        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");
        let err = quiet_router(&provider)
            .dispatch(DeviceCommand::CreateDevice(input(
                Some(missing.clone()),
                None,
                true,
            )))
            .await
            .unwrap_err();

        match err {
            CommandError::UserData { path, source } => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_sends_resolved_request() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, "bar").unwrap();

        let (provider, seen) = recording_provider();
        let outcome = quiet_router(&provider)
            .dispatch(DeviceCommand::CreateDevice(input(Some(path), None, true)))
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Device(d) if d.id == "dev-1"));

        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.project_id, "proj-1");
        assert_eq!(req.userdata, "bar");
        assert!(req.tags.is_empty());
        assert!(req.spot_instance);
        assert!((req.spot_price_max - 0.25).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_silent_and_verbose_send_identical_requests() {
        let (provider, seen) = recording_provider();
        let router = quiet_router(&provider);

        router
            .dispatch(DeviceCommand::CreateDevice(input(None, Some("foo"), true)))
            .await
            .unwrap();
        router
            .dispatch(DeviceCommand::CreateDevice(input(None, Some("foo"), false)))
            .await
            .unwrap();

        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn test_silent_create_does_not_poll() {
        let mut provider = MockDeviceProvider::new();
        provider
            .expect_create_device()
            .times(1)
            .returning(|_| Ok(device("dev-1", DeviceState::Queued)));
        provider.expect_get_device().never();

        let outcome = quiet_router(&provider)
            .dispatch(DeviceCommand::CreateDevice(input(None, None, true)))
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Device(d) if d.state == DeviceState::Queued));
    }

    #[tokio::test]
    async fn test_verbose_create_waits_for_active() {
        let mut provider = MockDeviceProvider::new();
        provider
            .expect_create_device()
            .times(1)
            .returning(|_| Ok(device("dev-1", DeviceState::Queued)));
        provider
            .expect_get_device()
            .withf(|id| id == "dev-1")
            .returning(|id| Ok(device(id, DeviceState::Active)));

        let outcome = quiet_router(&provider)
            .dispatch(DeviceCommand::CreateDevice(input(None, None, false)))
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Device(d) if d.state == DeviceState::Active));
    }

    #[tokio::test]
    async fn test_failed_watch_reports_created_device() {
        let mut provider = MockDeviceProvider::new();
        provider
            .expect_create_device()
            .times(1)
            .returning(|_| Ok(device("dev-NEW", DeviceState::Queued)));
        provider.expect_get_device().returning(|_| {
            Err(ProviderError::Api {
                status: 503,
                message: "blip".to_string(),
            })
        });

        let err = quiet_router(&provider)
            .dispatch(DeviceCommand::CreateDevice(input(None, None, false)))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("dev-NEW"), "{err}");
        match err {
            CommandError::Provisioning { device_id, source } => {
                assert_eq!(device_id, "dev-NEW");
                assert!(matches!(source, ProviderError::Api { status: 503, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_watch_timeout_reports_created_device() {
        let mut provider = MockDeviceProvider::new();
        provider
            .expect_create_device()
            .returning(|_| Ok(device("dev-NEW", DeviceState::Provisioning)));
        provider.expect_get_device().never();

        let router = Router::new(&provider).with_watch_settings(WatchSettings {
            interval: Duration::ZERO,
            timeout: Duration::ZERO,
            draw: false,
        });
        let err = router
            .dispatch(DeviceCommand::CreateDevice(input(None, None, false)))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Device dev-NEW was created but did not become active: \
             Operation timed out after 0 seconds"
        );
    }

    #[tokio::test]
    async fn test_create_error_propagates_unchanged() {
        let mut provider = MockDeviceProvider::new();
        provider
            .expect_create_device()
            .returning(|_| Err(ProviderError::Validation("plan unavailable".to_string())));

        let err = quiet_router(&provider)
            .dispatch(DeviceCommand::CreateDevice(input(None, None, true)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::Provider(ProviderError::Validation(msg)) if msg == "plan unavailable"
        ));
    }

    #[tokio::test]
    async fn test_list_devices_uses_project_id() {
        let mut provider = MockDeviceProvider::new();
        provider
            .expect_list_devices()
            .withf(|project_id| project_id == "proj-1")
            .times(1)
            .returning(|_| Ok(vec![device("a", DeviceState::Active)]));

        let outcome = quiet_router(&provider)
            .dispatch(DeviceCommand::ListDevices {
                project_id: "proj-1".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Devices(list) if list.len() == 1));
    }

    #[tokio::test]
    async fn test_list_device_and_events() {
        let mut provider = MockDeviceProvider::new();
        provider
            .expect_get_device()
            .withf(|id| id == "dev-9")
            .times(1)
            .returning(|id| Ok(device(id, DeviceState::Inactive)));
        provider
            .expect_list_device_events()
            .withf(|id| id == "dev-9")
            .times(1)
            .returning(|_| Err(ProviderError::NotFound("device".to_string())));

        let router = quiet_router(&provider);
        let outcome = router
            .dispatch(DeviceCommand::ListDevice {
                device_id: "dev-9".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Device(d) if d.id == "dev-9"));

        let err = router
            .dispatch(DeviceCommand::ListEvents {
                device_id: "dev-9".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Provider(ProviderError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_each_action_calls_its_operation_once() {
        let actions = [
            DeviceAction::Delete,
            DeviceAction::Lock,
            DeviceAction::Unlock,
            DeviceAction::PowerOn,
            DeviceAction::PowerOff,
            DeviceAction::Reboot,
        ];

        for action in actions {
            let mut provider = MockDeviceProvider::new();
            let id_matches = |id: &str| id == "dev-7";
            match action {
                DeviceAction::Delete => {
                    provider
                        .expect_delete_device()
                        .withf(id_matches)
                        .times(1)
                        .returning(|_| Ok(()));
                }
                DeviceAction::Lock => {
                    provider
                        .expect_lock_device()
                        .withf(id_matches)
                        .times(1)
                        .returning(|_| Ok(()));
                }
                DeviceAction::Unlock => {
                    provider
                        .expect_unlock_device()
                        .withf(id_matches)
                        .times(1)
                        .returning(|_| Ok(()));
                }
                DeviceAction::PowerOn => {
                    provider
                        .expect_power_on_device()
                        .withf(id_matches)
                        .times(1)
                        .returning(|_| Ok(()));
                }
                DeviceAction::PowerOff => {
                    provider
                        .expect_power_off_device()
                        .withf(id_matches)
                        .times(1)
                        .returning(|_| Ok(()));
                }
                DeviceAction::Reboot => {
                    provider
                        .expect_reboot_device()
                        .withf(id_matches)
                        .times(1)
                        .returning(|_| Ok(()));
                }
            }

            let outcome = quiet_router(&provider)
                .dispatch(DeviceCommand::Action {
                    action,
                    device_id: "dev-7".to_string(),
                })
                .await
                .unwrap();
            assert_eq!(
                outcome,
                Outcome::Completed {
                    action,
                    device_id: "dev-7".to_string()
                }
            );
        }
    }

    #[tokio::test]
    async fn test_action_error_propagates_unchanged() {
        let mut provider = MockDeviceProvider::new();
        provider.expect_reboot_device().times(1).returning(|_| {
            Err(ProviderError::Api {
                status: 503,
                message: "maintenance".to_string(),
            })
        });

        let err = quiet_router(&provider)
            .dispatch(DeviceCommand::Action {
                action: DeviceAction::Reboot,
                device_id: "dev-7".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::Provider(ProviderError::Api { status: 503, .. })
        ));
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(DeviceAction::PowerOn.to_string(), "power_on");
        assert_eq!(DeviceAction::PowerOff.done(), "powered off");
    }
}
