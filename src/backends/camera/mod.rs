// SPDX-License-Identifier: GPL-3.0-only

//! Device control gateway abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  UI / CLI consumer  │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  Session + Pipeline │  ← Ordered effects, notifications
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ ControlGateway Trait│  ← Common interface
//! └──────────┬──────────┘
//!            │
//!       ┌────┴──────┐
//!       ▼           ▼
//!  ┌────────┐  ┌─────────┐
//!  │v4l2-ctl│  │Simulated│
//!  └────────┘  └─────────┘
//! ```

pub mod simulated;
pub mod types;
pub mod v4l2_ctl;

pub use simulated::SimulatedGateway;
pub use types::*;
pub use v4l2_ctl::V4l2CtlGateway;

use crate::errors::GatewayResult;

/// Translates named-control operations into device access
///
/// Every call may block for as long as the underlying mechanism takes
/// (an external process for [`V4l2CtlGateway`]). Implementations keep no
/// connection state between calls and are safe to call repeatedly.
pub trait ControlGateway: Send + Sync {
    // ===== Enumeration =====

    /// Enumerate camera devices in the order the system reports them
    ///
    /// # Returns
    /// * `Ok(vec![])` - The mechanism works but no camera is attached
    /// * `Err(GatewayError::Discovery)` - The mechanism itself is unusable
    fn discover_devices(&self) -> GatewayResult<Vec<Device>>;

    /// List the controls a device exposes
    ///
    /// Controls without a valid range are left out.
    fn list_controls(&self, device: &Device) -> GatewayResult<Vec<ControlDescriptor>>;

    // ===== Values =====

    /// Read the current value of a control
    ///
    /// Fails with `ControlUnavailable` when the control is not present on
    /// the device at call time.
    fn get_control(&self, device: &Device, control: &str) -> GatewayResult<i64>;

    /// Write a control value
    ///
    /// The value is clamped to the control's range before it reaches the
    /// device. Returns the value actually written.
    fn set_control(&self, device: &Device, control: &str, value: i64) -> GatewayResult<i64>;
}
