// SPDX-License-Identifier: GPL-3.0-only

//! Ordered effects pipeline for the active camera
//!
//! Positions are implicit: an effect's position is its index, so the
//! sequence is always `0..len` with no gaps after any mutation.
//!
//! Every hardware write goes through a [`ControlGateway`]. A failed write
//! leaves the model exactly as it was and comes back as
//! [`PipelineError::Gateway`]; nothing here treats it as fatal.

use crate::backends::camera::{ControlDescriptor, ControlGateway, Device};
use crate::errors::{GatewayError, PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One pipeline entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// Name of the device control this effect drives
    pub control: String,
    pub enabled: bool,
    /// Tracked value, always inside the control's range
    pub value: i64,
}

/// A successful write made by [`EffectsPipeline::apply_all`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEffect {
    pub position: usize,
    pub control: String,
    pub value: i64,
}

/// A write that failed during [`EffectsPipeline::apply_all`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyFailure {
    pub position: usize,
    pub error: GatewayError,
}

/// Outcome of pushing the whole pipeline to hardware
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: Vec<AppliedEffect>,
    pub failures: Vec<ApplyFailure>,
    /// Disabled effects that were not written
    pub skipped: usize,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Effects for the selected device
///
/// Holds the device and the descriptors listed for it when it was
/// selected; all range checks use those descriptors.
#[derive(Debug, Clone, Default)]
pub struct EffectsPipeline {
    device: Option<Device>,
    controls: Vec<ControlDescriptor>,
    effects: Vec<Effect>,
}

impl EffectsPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Accessors =====

    pub fn device(&self) -> Option<&Device> {
        self.device.as_ref()
    }

    /// Descriptors of the selected device
    pub fn controls(&self) -> &[ControlDescriptor] {
        &self.controls
    }

    pub fn descriptor(&self, control: &str) -> Option<&ControlDescriptor> {
        self.controls.iter().find(|d| d.name == control)
    }

    /// Effects in pipeline order; an effect's index is its position
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn get(&self, position: usize) -> Option<&Effect> {
        self.effects.get(position)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    fn check(&self, position: usize) -> PipelineResult<()> {
        if position < self.effects.len() {
            Ok(())
        } else {
            Err(PipelineError::PositionOutOfRange {
                position,
                len: self.effects.len(),
            })
        }
    }

    fn active_device(&self) -> PipelineResult<&Device> {
        self.device.as_ref().ok_or(PipelineError::NoDevice)
    }

    // ===== Device lifecycle =====

    /// Re-scope the pipeline to `device` and its freshly listed controls
    ///
    /// Effects whose control the device does not list are dropped and
    /// returned; the rest keep their relative order and have their value
    /// clamped into the new range. No hardware writes happen here.
    pub fn reset_for_device(
        &mut self,
        device: Device,
        controls: Vec<ControlDescriptor>,
    ) -> Vec<Effect> {
        let (kept, dropped): (Vec<Effect>, Vec<Effect>) = std::mem::take(&mut self.effects)
            .into_iter()
            .partition(|effect| controls.iter().any(|d| d.name == effect.control));

        self.effects = kept
            .into_iter()
            .map(|mut effect| {
                if let Some(descriptor) = controls.iter().find(|d| d.name == effect.control) {
                    let clamped = descriptor.clamp(effect.value);
                    if clamped != effect.value {
                        debug!(
                            control = %effect.control,
                            old = effect.value,
                            new = clamped,
                            "Clamped effect into new device range"
                        );
                        effect.value = clamped;
                    }
                }
                effect
            })
            .collect();

        for effect in &dropped {
            info!(
                device_path = %device.path,
                control = %effect.control,
                "Dropped effect unsupported by device"
            );
        }

        self.device = Some(device);
        self.controls = controls;
        dropped
    }

    // ===== Mutations =====

    /// Append an effect for `control`, starting from its hardware value
    ///
    /// Adding a control that is already in the pipeline is allowed and
    /// creates an independent entry. Returns the new position.
    pub fn add<G: ControlGateway + ?Sized>(
        &mut self,
        gateway: &G,
        control: &str,
    ) -> PipelineResult<usize> {
        let device = self.active_device()?;
        let descriptor = self
            .descriptor(control)
            .ok_or_else(|| PipelineError::UnknownControl(control.to_string()))?;

        let current = gateway.get_control(device, control)?;
        let value = descriptor.clamp(current);

        self.effects.push(Effect {
            control: control.to_string(),
            enabled: true,
            value,
        });

        let position = self.effects.len() - 1;
        debug!(control, value, position, "Added effect");
        Ok(position)
    }

    /// Remove the effect at `position`; later effects shift down by one
    pub fn remove(&mut self, position: usize) -> PipelineResult<Effect> {
        self.check(position)?;
        let effect = self.effects.remove(position);
        debug!(control = %effect.control, position, "Removed effect");
        Ok(effect)
    }

    /// Relocate one effect from `from` to `to`, shifting the ones between
    pub fn move_effect(&mut self, from: usize, to: usize) -> PipelineResult<()> {
        self.check(from)?;
        self.check(to)?;
        if from != to {
            let effect = self.effects.remove(from);
            self.effects.insert(to, effect);
            debug!(from, to, "Moved effect");
        }
        Ok(())
    }

    /// Flip the enabled flag at `position`
    ///
    /// Enabling writes the stored value back to the device and keeps the
    /// value the device reports as written. Disabling does
    /// not touch the device: the control keeps its last written value and
    /// the pipeline simply stops re-applying it. Returns the new state.
    pub fn toggle<G: ControlGateway + ?Sized>(
        &mut self,
        gateway: &G,
        position: usize,
    ) -> PipelineResult<bool> {
        self.check(position)?;
        let effect = &self.effects[position];

        let mut value = effect.value;
        if !effect.enabled {
            let device = self.active_device()?;
            value = gateway.set_control(device, &effect.control, value)?;
        }

        let effect = &mut self.effects[position];
        effect.value = value;
        effect.enabled = !effect.enabled;
        debug!(control = %effect.control, enabled = effect.enabled, "Toggled effect");
        Ok(effect.enabled)
    }

    /// Set the value at `position`, clamped into the control's range
    ///
    /// Enabled effects are written immediately; if the write fails the
    /// previous value stays. Returns the stored value.
    pub fn configure<G: ControlGateway + ?Sized>(
        &mut self,
        gateway: &G,
        position: usize,
        value: i64,
    ) -> PipelineResult<i64> {
        self.check(position)?;
        let effect = &self.effects[position];
        let descriptor = self
            .descriptor(&effect.control)
            .ok_or_else(|| PipelineError::UnknownControl(effect.control.clone()))?;

        let mut stored = descriptor.clamp(value);
        if effect.enabled {
            let device = self.active_device()?;
            stored = gateway.set_control(device, &effect.control, stored)?;
        }

        self.effects[position].value = stored;
        Ok(stored)
    }

    /// Remove every effect without touching the device
    pub fn clear(&mut self) {
        self.effects.clear();
    }

    /// Write every enabled effect's value, top to bottom
    ///
    /// A failed write is recorded and the remaining effects are still
    /// applied.
    pub fn apply_all<G: ControlGateway + ?Sized>(&self, gateway: &G) -> PipelineResult<ApplyReport> {
        let device = self.active_device()?;
        let mut report = ApplyReport::default();

        for (position, effect) in self.effects.iter().enumerate() {
            if !effect.enabled {
                report.skipped += 1;
                continue;
            }

            match gateway.set_control(device, &effect.control, effect.value) {
                Ok(value) => report.applied.push(AppliedEffect {
                    position,
                    control: effect.control.clone(),
                    value,
                }),
                Err(error) => {
                    warn!(control = %effect.control, position, %error, "Failed to apply effect");
                    report.failures.push(ApplyFailure { position, error });
                }
            }
        }

        Ok(report)
    }
}
