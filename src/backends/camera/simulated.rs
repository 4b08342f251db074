// SPDX-License-Identifier: GPL-3.0-only

//! In-memory control gateway
//!
//! Behaves like a set of attached cameras without touching hardware. Used by
//! the `demo` command and throughout the tests: it records every write, can
//! be told to reject writes for a control, and can lose controls between
//! calls to mimic a driver change.

use super::ControlGateway;
use super::types::{ControlDescriptor, Device};
use crate::errors::{GatewayError, GatewayResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// A write that reached the simulated hardware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlWrite {
    pub device: String,
    pub control: String,
    pub value: i64,
}

#[derive(Debug, Default)]
struct SimulatedState {
    devices: Vec<(Device, Vec<ControlDescriptor>)>,
    values: HashMap<(String, String), i64>,
    rejected: HashSet<(String, String)>,
    writes: Vec<ControlWrite>,
    discovery_failure: Option<String>,
}

impl SimulatedState {
    fn controls(&self, device: &Device) -> Option<&Vec<ControlDescriptor>> {
        self.devices
            .iter()
            .find(|(d, _)| d.path == device.path)
            .map(|(_, controls)| controls)
    }

    fn descriptor(&self, device: &Device, control: &str) -> GatewayResult<ControlDescriptor> {
        self.controls(device)
            .and_then(|controls| controls.iter().find(|c| c.name == control))
            .cloned()
            .ok_or_else(|| GatewayError::ControlUnavailable {
                device: device.path.clone(),
                control: control.to_string(),
            })
    }
}

/// Simulated cameras; clones share the same state
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two webcams, the second without optical zoom
    pub fn demo() -> Self {
        let common = || {
            vec![
                ControlDescriptor::integer("brightness", 0, 255, 128),
                ControlDescriptor::integer("contrast", 0, 255, 128),
                ControlDescriptor::integer("saturation", 0, 255, 128),
                ControlDescriptor::integer("sharpness", 0, 7, 3),
                ControlDescriptor::integer("white_balance_temperature", 2800, 6500, 4600),
            ]
        };

        let mut front = common();
        front.push(ControlDescriptor::integer("zoom_absolute", 100, 500, 100));
        front.push(ControlDescriptor::integer("focus_absolute", 0, 250, 0));

        Self::new()
            .with_device(Device::new("/dev/video0", "Simulated Webcam"), front)
            .with_device(Device::new("/dev/video2", "Simulated Document Camera"), common())
    }

    /// Builder form of [`SimulatedGateway::add_device`]
    pub fn with_device(self, device: Device, controls: Vec<ControlDescriptor>) -> Self {
        self.add_device(device, controls);
        self
    }

    /// Attach a device; its controls start at their listed value
    ///
    /// Controls are stored as given, so a descriptor with a broken range
    /// can be attached and checked for exclusion by `list_controls`.
    pub fn add_device(&self, device: Device, controls: Vec<ControlDescriptor>) {
        let mut state = self.state();
        for control in &controls {
            let initial = control.value.unwrap_or_else(|| control.default_or_min());
            state
                .values
                .insert((device.path.clone(), control.name.clone()), initial);
        }
        state.devices.retain(|(d, _)| d.path != device.path);
        state.devices.push((device, controls));
    }

    pub fn remove_device(&self, path: &str) {
        self.state().devices.retain(|(d, _)| d.path != path);
    }

    /// Make a control vanish from a device
    pub fn remove_control(&self, path: &str, control: &str) {
        let mut state = self.state();
        if let Some((_, controls)) = state.devices.iter_mut().find(|(d, _)| d.path == path) {
            controls.retain(|c| c.name != control);
        }
    }

    /// Reject every future write to a control
    pub fn reject_writes(&self, path: &str, control: &str) {
        self.state()
            .rejected
            .insert((path.to_string(), control.to_string()));
    }

    /// Make enumeration fail as if the tool were missing (`None` restores it)
    pub fn set_discovery_failure(&self, reason: Option<String>) {
        self.state().discovery_failure = reason;
    }

    /// Current simulated hardware value
    pub fn value(&self, path: &str, control: &str) -> Option<i64> {
        self.state()
            .values
            .get(&(path.to_string(), control.to_string()))
            .copied()
    }

    /// Writes in the order they happened
    pub fn writes(&self) -> Vec<ControlWrite> {
        self.state().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state().writes.clear();
    }

    fn state(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ControlGateway for SimulatedGateway {
    fn discover_devices(&self) -> GatewayResult<Vec<Device>> {
        let state = self.state();
        if let Some(reason) = &state.discovery_failure {
            return Err(GatewayError::Discovery(reason.clone()));
        }
        Ok(state.devices.iter().map(|(d, _)| d.clone()).collect())
    }

    fn list_controls(&self, device: &Device) -> GatewayResult<Vec<ControlDescriptor>> {
        let state = self.state();
        if let Some(reason) = &state.discovery_failure {
            return Err(GatewayError::Discovery(reason.clone()));
        }
        let Some(controls) = state.controls(device) else {
            return Err(GatewayError::Discovery(format!(
                "{} is not attached",
                device.path
            )));
        };

        Ok(controls
            .iter()
            .filter(|c| match ControlDescriptor::validate(Some(c.min), Some(c.max), c.default) {
                Ok(_) => true,
                Err(violation) => {
                    warn!(control = %c.name, %violation, "Control has an invalid range, skipping");
                    false
                }
            })
            .map(|c| {
                let mut listed = c.clone();
                listed.value = state
                    .values
                    .get(&(device.path.clone(), c.name.clone()))
                    .copied();
                listed
            })
            .collect())
    }

    fn get_control(&self, device: &Device, control: &str) -> GatewayResult<i64> {
        let state = self.state();
        let descriptor = state.descriptor(device, control)?;
        Ok(state
            .values
            .get(&(device.path.clone(), control.to_string()))
            .copied()
            .unwrap_or_else(|| descriptor.default_or_min()))
    }

    fn set_control(&self, device: &Device, control: &str, value: i64) -> GatewayResult<i64> {
        let mut state = self.state();
        let descriptor = state.descriptor(device, control)?;
        let clamped = descriptor.clamp(value);
        let key = (device.path.clone(), control.to_string());

        if state.rejected.contains(&key) {
            return Err(GatewayError::WriteRejected {
                control: control.to_string(),
                value: clamped,
                reason: "simulated rejection".to_string(),
            });
        }

        debug!(device_path = %device.path, control, value = clamped, "Simulated control write");
        state.values.insert(key, clamped);
        state.writes.push(ControlWrite {
            device: device.path.clone(),
            control: control.to_string(),
            value: clamped,
        });
        Ok(clamped)
    }
}
