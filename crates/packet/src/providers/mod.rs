//! Provider abstractions for bare metal device APIs.

pub mod packet;
mod traits;

#[cfg(test)]
pub use traits::MockDeviceProvider;
pub use traits::{
    BillingCycle, CreateDeviceRequest, Device, DeviceEvent, DeviceProvider, DeviceState,
    IpAddress, ProviderError,
};
