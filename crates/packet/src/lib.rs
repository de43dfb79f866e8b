//! Packet bare metal device management.
//!
//! This crate provides the `packet baremetal` command group: a thin command
//! router over the Packet device API, plus the HTTP client, configuration
//! and output helpers it needs.
//!
//! # Example
//!
//! ```rust,ignore
//! use packet::providers::packet::Packet;
//! use packet::router::{DeviceCommand, Router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = Packet::new("api_token")?;
//!
//!     let outcome = Router::new(&provider)
//!         .dispatch(DeviceCommand::ListDevices {
//!             project_id: "project-uuid".into(),
//!         })
//!         .await?;
//!
//!     println!("{}", packet::output::render_text(&outcome));
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod output;
pub mod progress;
pub mod providers;
pub mod router;

pub use providers::packet::Packet;
pub use providers::{CreateDeviceRequest, Device, DeviceEvent, DeviceProvider, DeviceState};
pub use router::{CommandError, DeviceCommand, Outcome, Router};
