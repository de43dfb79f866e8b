//! Packet bare metal provider.
//!
//! Implements the [`DeviceProvider`](crate::providers::DeviceProvider) trait
//! for the Packet (Equinix Metal) REST API. Authentication is a project or
//! user API token sent as `X-Auth-Token`.

mod client;
mod models;

pub use client::{Packet, API_BASE_URL};
