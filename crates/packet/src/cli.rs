//! Command-line definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::{Config, ConfigError};
use crate::providers::BillingCycle;
use crate::router::{CreateDeviceInput, CreateOptions, DeviceAction, DeviceCommand};

/// Packet CLI - manage Packet bare metal resources.
#[derive(Parser, Debug)]
#[command(name = "packet", version)]
#[command(about = "Manage Packet bare metal resources")]
pub struct Cli {
    /// Packet API token (or set `PACKET_TOKEN` env var).
    #[arg(long, env = "PACKET_TOKEN", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// API root URL (or set `PACKET_API_URL` env var).
    #[arg(long, env = "PACKET_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Config file (default: ~/.packet/config.yaml).
    #[arg(long, env = "PACKET_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Enable verbose logging.
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage server devices.
    Baremetal {
        #[command(subcommand)]
        command: BaremetalCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum BaremetalCommand {
    /// Retrieve all devices in a project.
    ListDevices(ProjectArgs),

    /// Retrieve a device.
    ListDevice(DeviceArgs),

    /// Create a new device.
    CreateDevice(CreateDeviceArgs),

    /// Delete a device.
    DeleteDevice(DeviceArgs),

    /// Lock a device.
    LockDevice(DeviceArgs),

    /// Unlock a device.
    UnlockDevice(DeviceArgs),

    /// Power on a device.
    #[command(name = "poweron-device")]
    PowerOnDevice(DeviceArgs),

    /// Power off a device.
    #[command(name = "poweroff-device")]
    PowerOffDevice(DeviceArgs),

    /// Reboot a device.
    RebootDevice(DeviceArgs),

    /// View events by device ID.
    ListEvents(DeviceArgs),
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Specify the project ID (or set `PACKET_PROJECT_ID` env var).
    #[arg(long, env = "PACKET_PROJECT_ID")]
    pub project_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Device ID.
    #[arg(long)]
    pub device_id: String,
}

#[derive(Args, Debug)]
pub struct CreateDeviceArgs {
    /// The project ID (or set `PACKET_PROJECT_ID` env var).
    #[arg(long, env = "PACKET_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Hostname to assign to the created device.
    #[arg(long)]
    pub hostname: String,

    /// Server type to create the device.
    #[arg(long, default_value = "baremetal_0")]
    pub plan: String,

    /// DC location (e.g. sjc1, ewr1, ams1, nrt1).
    #[arg(long)]
    pub facility: String,

    /// Operating system to deploy to the server.
    #[arg(long, default_value = "centos_7")]
    pub os_type: String,

    /// Billing cycle.
    #[arg(long, value_enum, default_value_t = BillingCycle::Hourly)]
    pub billing: BillingCycle,

    /// Network boot on every restart (`--always-pxe` or `--always-pxe=true|false`).
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub always_pxe: bool,

    /// Read userdata from a file.
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Set userdata; overrides "--file" userdata.
    #[arg(long)]
    pub userdata: Option<String>,

    /// Omit provisioning logs.
    #[arg(
        short,
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub silent: bool,

    /// Create as a spot instance.
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub spot_instance: bool,

    /// Spot market price bid.
    #[arg(long, default_value_t = 0.0)]
    pub spot_price_max: f64,
}

impl BaremetalCommand {
    /// Resolve flags against configuration into a routable command.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingProjectId`] when a project-scoped verb
    /// has no project ID from any source.
    pub fn into_device_command(self, config: &Config) -> Result<DeviceCommand, ConfigError> {
        let action = |action, args: DeviceArgs| DeviceCommand::Action {
            action,
            device_id: args.device_id,
        };

        let command = match self {
            Self::ListDevices(args) => DeviceCommand::ListDevices {
                project_id: config.project_id(args.project_id.as_deref())?,
            },
            Self::ListDevice(args) => DeviceCommand::ListDevice {
                device_id: args.device_id,
            },
            Self::CreateDevice(args) => DeviceCommand::CreateDevice(CreateDeviceInput {
                project_id: config.project_id(args.project_id.as_deref())?,
                hostname: args.hostname,
                plan: args.plan,
                facility: args.facility,
                operating_system: args.os_type,
                billing_cycle: args.billing,
                always_pxe: args.always_pxe,
                file: args.file,
                userdata: args.userdata,
                options: CreateOptions {
                    silent: args.silent,
                    spot_instance: args.spot_instance,
                    spot_price_max: args.spot_price_max,
                },
            }),
            Self::DeleteDevice(args) => action(DeviceAction::Delete, args),
            Self::LockDevice(args) => action(DeviceAction::Lock, args),
            Self::UnlockDevice(args) => action(DeviceAction::Unlock, args),
            Self::PowerOnDevice(args) => action(DeviceAction::PowerOn, args),
            Self::PowerOffDevice(args) => action(DeviceAction::PowerOff, args),
            Self::RebootDevice(args) => action(DeviceAction::Reboot, args),
            Self::ListEvents(args) => DeviceCommand::ListEvents {
                device_id: args.device_id,
            },
        };
        Ok(command)
    }
}
