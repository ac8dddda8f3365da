//! Decoding of Leaone body-composition scale advertisements.
//!
//! The scales broadcast weight, impedance and a packet counter inside
//! manufacturer specific data. [`LeaoneDeviceData`] locates and decodes those
//! payloads and merges them into one snapshot per scale.

pub mod error;
pub mod leaone;
pub mod models;
pub mod sensor;

pub use error::PayloadError;
pub use leaone::LeaoneDeviceData;
pub use models::{
    Advertisement, CanonicalPayload, DeviceState, Fragment, HardwareAddress, Snapshot,
    VendorIdentifier,
};
pub use sensor::{DeviceKey, NativeValue, SensorUpdate};
