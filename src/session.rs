// SPDX-License-Identifier: GPL-3.0-only

//! Application session
//!
//! One [`Session`] exists per running application. It owns the gateway, the
//! effects pipeline, and the last discovered device list, and tells its
//! subscribers about every change through [`SessionEvent`]s. All mutation
//! happens through `&mut Session`, so there is a single mutation context;
//! slow enumeration can run on a blocking task with
//! [`Session::discover_devices_task`] and be handed back with
//! [`Session::finish_discovery`].

use crate::backends::camera::{ControlGateway, Device, V4l2CtlGateway};
use crate::config::Config;
use crate::constants::EffectKind;
use crate::errors::{GatewayError, GatewayResult, PipelineError, PipelineResult};
use crate::pipelines::{ApplyReport, Effect, EffectsPipeline};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};

/// State change notification for presentation consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Device enumeration finished
    DevicesRefreshed(Vec<Device>),
    /// Device enumeration could not run; the device list is now empty
    DiscoveryFailed(String),
    /// The pipeline now targets `device`; `dropped` lists the controls whose
    /// effects were removed because the device lacks them
    DeviceSelected { device: Device, dropped: Vec<String> },
    EffectAdded {
        position: usize,
        control: String,
        value: i64,
    },
    EffectRemoved { position: usize, control: String },
    EffectMoved { from: usize, to: usize },
    EffectToggled { position: usize, enabled: bool },
    EffectConfigured { position: usize, value: i64 },
    PipelineCleared,
    PipelineApplied { applied: usize, failed: usize },
    /// A non-fatal device error the user should see
    Warning(GatewayError),
}

/// Gateway, pipeline and device list for one running application
pub struct Session<G: ControlGateway> {
    gateway: G,
    pipeline: EffectsPipeline,
    devices: Vec<Device>,
    restore_default_on_remove: bool,
    subscribers: Vec<UnboundedSender<SessionEvent>>,
}

impl Session<V4l2CtlGateway> {
    /// Session talking to real hardware through the configured tool
    pub fn from_config(config: &Config) -> Self {
        Session::new(V4l2CtlGateway::from_config(config))
            .with_restore_default_on_remove(config.restore_default_on_remove)
    }
}

impl<G: ControlGateway> Session<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            pipeline: EffectsPipeline::new(),
            devices: Vec::new(),
            restore_default_on_remove: false,
            subscribers: Vec::new(),
        }
    }

    pub fn with_restore_default_on_remove(mut self, restore: bool) -> Self {
        self.restore_default_on_remove = restore;
        self
    }

    /// Receive every future [`SessionEvent`]
    pub fn subscribe(&mut self) -> UnboundedReceiver<SessionEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: SessionEvent) {
        debug!(?event, "Session event");
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // ===== Accessors =====

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn pipeline(&self) -> &EffectsPipeline {
        &self.pipeline
    }

    /// Devices from the last successful enumeration
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn active_device(&self) -> Option<&Device> {
        self.pipeline.device()
    }

    /// Catalog effects the selected device supports
    pub fn available_effects(&self) -> Vec<EffectKind> {
        crate::constants::available_kinds(self.pipeline.controls())
    }

    // ===== Devices =====

    /// Enumerate devices on the calling thread
    pub fn refresh_devices(&mut self) -> GatewayResult<&[Device]> {
        let result = self.gateway.discover_devices();
        self.finish_discovery(result)
    }

    /// Store an enumeration result and notify subscribers
    pub fn finish_discovery(
        &mut self,
        result: GatewayResult<Vec<Device>>,
    ) -> GatewayResult<&[Device]> {
        match result {
            Ok(devices) => {
                info!(count = devices.len(), "Device list refreshed");
                self.devices = devices;
                self.emit(SessionEvent::DevicesRefreshed(self.devices.clone()));
                Ok(&self.devices)
            }
            Err(e) => {
                warn!(error = %e, "Device discovery failed");
                self.devices.clear();
                self.emit(SessionEvent::DiscoveryFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Select a device, re-scoping the pipeline to its controls
    ///
    /// Effects for controls the device lacks are dropped; the dropped
    /// control names are returned.
    pub fn select_device(&mut self, device: Device) -> PipelineResult<Vec<String>> {
        let controls = match self.gateway.list_controls(&device) {
            Ok(controls) => controls,
            Err(e) => {
                self.emit(SessionEvent::Warning(e.clone()));
                return Err(e.into());
            }
        };

        info!(device = %device, controls = controls.len(), "Selected device");
        let dropped: Vec<String> = self
            .pipeline
            .reset_for_device(device.clone(), controls)
            .into_iter()
            .map(|effect| effect.control)
            .collect();

        self.emit(SessionEvent::DeviceSelected {
            device,
            dropped: dropped.clone(),
        });
        Ok(dropped)
    }

    /// Re-list the selected device's controls and re-validate the pipeline
    pub fn refresh_controls(&mut self) -> PipelineResult<Vec<String>> {
        let device = self
            .pipeline
            .device()
            .cloned()
            .ok_or(PipelineError::NoDevice)?;
        self.select_device(device)
    }

    // ===== Pipeline =====

    pub fn add_effect(&mut self, control: &str) -> PipelineResult<usize> {
        let result = self.pipeline.add(&self.gateway, control);
        let position = self.observe(result)?;
        let value = self.pipeline.effects()[position].value;
        self.emit(SessionEvent::EffectAdded {
            position,
            control: control.to_string(),
            value,
        });
        Ok(position)
    }

    /// Add the catalog effect `kind`, using whichever of its control names
    /// the device lists
    pub fn add_catalog_effect(&mut self, kind: EffectKind) -> PipelineResult<usize> {
        let control = kind
            .resolve(self.pipeline.controls())
            .map(|d| d.name.clone())
            .ok_or_else(|| {
                PipelineError::UnknownControl(kind.control_names()[0].to_string())
            })?;
        self.add_effect(&control)
    }

    pub fn remove_effect(&mut self, position: usize) -> PipelineResult<Effect> {
        let effect = self.pipeline.remove(position)?;

        if self.restore_default_on_remove {
            self.restore_default(&effect.control);
        }

        self.emit(SessionEvent::EffectRemoved {
            position,
            control: effect.control.clone(),
        });
        Ok(effect)
    }

    fn restore_default(&mut self, control: &str) {
        let (Some(device), Some(default)) = (
            self.pipeline.device(),
            self.pipeline.descriptor(control).and_then(|d| d.default),
        ) else {
            return;
        };

        if let Err(e) = self.gateway.set_control(device, control, default) {
            warn!(control, error = %e, "Failed to restore control default");
            self.emit(SessionEvent::Warning(e));
        }
    }

    pub fn move_effect(&mut self, from: usize, to: usize) -> PipelineResult<()> {
        self.pipeline.move_effect(from, to)?;
        self.emit(SessionEvent::EffectMoved { from, to });
        Ok(())
    }

    pub fn toggle_effect(&mut self, position: usize) -> PipelineResult<bool> {
        let result = self.pipeline.toggle(&self.gateway, position);
        let enabled = self.observe(result)?;
        self.emit(SessionEvent::EffectToggled { position, enabled });
        Ok(enabled)
    }

    pub fn configure_effect(&mut self, position: usize, value: i64) -> PipelineResult<i64> {
        let result = self.pipeline.configure(&self.gateway, position, value);
        let value = self.observe(result)?;
        self.emit(SessionEvent::EffectConfigured { position, value });
        Ok(value)
    }

    pub fn clear_effects(&mut self) {
        self.pipeline.clear();
        self.emit(SessionEvent::PipelineCleared);
    }

    /// Push every enabled effect to the device, in order
    pub fn apply_all(&mut self) -> PipelineResult<ApplyReport> {
        let report = self.pipeline.apply_all(&self.gateway)?;
        for failure in &report.failures {
            self.emit(SessionEvent::Warning(failure.error.clone()));
        }
        self.emit(SessionEvent::PipelineApplied {
            applied: report.applied.len(),
            failed: report.failures.len(),
        });
        Ok(report)
    }

    /// Surface gateway failures as warnings
    ///
    /// A control that disappeared triggers a control refresh, which drops
    /// every effect the device no longer supports.
    fn observe<T>(&mut self, result: PipelineResult<T>) -> PipelineResult<T> {
        if let Err(PipelineError::Gateway(e)) = &result {
            let e = e.clone();
            self.emit(SessionEvent::Warning(e.clone()));
            if matches!(e, GatewayError::ControlUnavailable { .. })
                && let Err(refresh) = self.refresh_controls()
            {
                debug!(error = %refresh, "Control refresh after unavailable control failed");
            }
        }
        result
    }
}

impl<G: ControlGateway + Clone + 'static> Session<G> {
    /// Run device enumeration on a blocking task
    ///
    /// Must be called from within a tokio runtime. Hand the joined result to
    /// [`Session::finish_discovery`].
    pub fn discover_devices_task(&self) -> tokio::task::JoinHandle<GatewayResult<Vec<Device>>> {
        let gateway = self.gateway.clone();
        tokio::task::spawn_blocking(move || gateway.discover_devices())
    }
}

impl<G: ControlGateway> std::fmt::Debug for Session<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("devices", &self.devices.len())
            .field("active_device", &self.pipeline.device())
            .field("effects", &self.pipeline.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::SimulatedGateway;

    fn drain(rx: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn webcam() -> Device {
        Device::new("/dev/video0", "Simulated Webcam")
    }

    #[test]
    fn test_every_mutation_notifies() {
        let mut session = Session::new(SimulatedGateway::demo());
        let mut rx = session.subscribe();

        session.refresh_devices().unwrap();
        session.select_device(webcam()).unwrap();
        session.add_effect("brightness").unwrap();
        session.configure_effect(0, 300).unwrap();
        session.toggle_effect(0).unwrap();
        session.remove_effect(0).unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 6);
        assert!(matches!(events[0], SessionEvent::DevicesRefreshed(ref d) if d.len() == 2));
        assert_eq!(
            events[3],
            SessionEvent::EffectConfigured {
                position: 0,
                value: 255
            }
        );
        assert_eq!(
            events[5],
            SessionEvent::EffectRemoved {
                position: 0,
                control: "brightness".into()
            }
        );
    }

    #[test]
    fn test_failed_operation_does_not_emit_change() {
        let mut session = Session::new(SimulatedGateway::demo());
        session.select_device(webcam()).unwrap();
        let mut rx = session.subscribe();

        assert!(session.remove_effect(0).is_err());
        assert!(session.move_effect(0, 1).is_err());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_discovery_failure_clears_devices() {
        let gateway = SimulatedGateway::demo();
        let mut session = Session::new(gateway.clone());
        session.refresh_devices().unwrap();
        let mut rx = session.subscribe();

        gateway.set_discovery_failure(Some("v4l2-ctl not found".into()));
        assert!(session.refresh_devices().is_err());
        assert!(session.devices().is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![SessionEvent::DiscoveryFailed(
                "Device discovery failed: v4l2-ctl not found".into()
            )]
        );

        gateway.set_discovery_failure(None);
        assert_eq!(session.refresh_devices().map(|d| d.len()), Ok(2));
    }

    #[test]
    fn test_unplugged_device_leaves_device_list() {
        let gateway = SimulatedGateway::demo();
        let mut session = Session::new(gateway.clone());
        assert_eq!(session.refresh_devices().map(|d| d.len()), Ok(2));

        gateway.remove_device("/dev/video2");
        let paths: Vec<String> = session
            .refresh_devices()
            .unwrap()
            .iter()
            .map(|d| d.path.clone())
            .collect();
        assert_eq!(paths, vec!["/dev/video0".to_string()]);

        let unplugged = Device::new("/dev/video2", "Simulated Document Camera");
        assert!(matches!(
            session.select_device(unplugged),
            Err(PipelineError::Gateway(GatewayError::Discovery(_)))
        ));
        assert!(session.active_device().is_none());
    }

    #[test]
    fn test_vanished_control_drops_effect() {
        let gateway = SimulatedGateway::demo();
        let mut session = Session::new(gateway.clone());
        session.select_device(webcam()).unwrap();
        session.add_effect("zoom_absolute").unwrap();
        session.add_effect("brightness").unwrap();
        let mut rx = session.subscribe();

        gateway.remove_control("/dev/video0", "zoom_absolute");
        assert!(session.configure_effect(0, 200).is_err());

        let effects: Vec<&str> = session
            .pipeline()
            .effects()
            .iter()
            .map(|e| e.control.as_str())
            .collect();
        assert_eq!(effects, vec!["brightness"]);

        let events = drain(&mut rx);
        assert!(matches!(events[0], SessionEvent::Warning(GatewayError::ControlUnavailable { .. })));
        assert!(matches!(
            &events[1],
            SessionEvent::DeviceSelected { dropped, .. } if dropped == &vec!["zoom_absolute".to_string()]
        ));
    }

    #[test]
    fn test_restore_default_on_remove() {
        let gateway = SimulatedGateway::demo();
        let mut session = Session::new(gateway.clone()).with_restore_default_on_remove(true);
        session.select_device(webcam()).unwrap();
        session.add_effect("contrast").unwrap();
        session.configure_effect(0, 40).unwrap();

        session.remove_effect(0).unwrap();
        assert_eq!(gateway.value("/dev/video0", "contrast"), Some(128));
    }

    #[test]
    fn test_add_catalog_effect_resolves_control_name() {
        let mut session = Session::new(SimulatedGateway::demo());
        session.select_device(webcam()).unwrap();

        assert_eq!(session.add_catalog_effect(EffectKind::Zoom), Ok(0));
        assert_eq!(session.pipeline().effects()[0].control, "zoom_absolute");
        assert_eq!(
            session.add_catalog_effect(EffectKind::Gamma),
            Err(PipelineError::UnknownControl("gamma".into()))
        );
        assert!(session.available_effects().contains(&EffectKind::Focus));
    }

    #[tokio::test]
    async fn test_background_discovery() {
        let mut session = Session::new(SimulatedGateway::demo());
        let result = session.discover_devices_task().await.unwrap();
        let devices = session.finish_discovery(result).unwrap();
        assert_eq!(devices[0].path, "/dev/video0");
    }
}
