// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera control operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras and their controls
//! - Reading and writing single controls
//! - Applying an ordered list of effects
//! - A simulated walkthrough of the effects pipeline

use camera_controls::backends::camera::{ControlGateway, Device, SimulatedGateway};
use camera_controls::constants::{available_kinds, control_label};
use camera_controls::{AppError, AppResult, Config, EffectKind, Session, SessionEvent};
use tokio::sync::mpsc::UnboundedReceiver;

type CliResult = AppResult<()>;

/// List all available cameras
pub fn list_devices(config: &Config) -> CliResult {
    let mut session = Session::from_config(config);

    // Enumeration spawns the tool; keep it off the calling thread the same
    // way the tray window does
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let result = runtime
        .block_on(async { session.discover_devices_task().await })
        .map_err(|e| AppError::Other(format!("Device discovery task failed: {}", e)))?;
    let devices = session.finish_discovery(result)?.to_vec();

    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for device in &devices {
        match &device.bus_info {
            Some(bus) => println!("  {} [{}]", device, bus),
            None => println!("  {}", device),
        }

        let controls = match session.gateway().list_controls(device) {
            Ok(controls) => controls,
            Err(e) => {
                println!("      Controls unavailable: {}", e);
                println!();
                continue;
            }
        };

        let effects: Vec<&str> = available_kinds(&controls)
            .iter()
            .map(|kind| kind.display_name())
            .collect();
        if !effects.is_empty() {
            println!("      Effects: {}", effects.join(", "));
        }

        for control in &controls {
            let current = control
                .value
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_string());
            let default = control
                .default
                .map(|v| format!(" default={}", v))
                .unwrap_or_default();
            let inactive = if control.is_inactive() { " (inactive)" } else { "" };
            let read_only = if control.is_read_only() { " (read-only)" } else { "" };
            println!(
                "      {:<28} {:>6} [{}..{} step {}]{}{}{}",
                control.name,
                current,
                control.min,
                control.max,
                control.step,
                default,
                inactive,
                read_only
            );
        }
        println!();
    }

    Ok(())
}

/// Read a single control
pub fn get_control(config: &Config, device: Option<String>, control: &str) -> CliResult {
    let mut session = Session::from_config(config);
    let device = resolve_device(&mut session, device, config)?;

    let value = session.gateway().get_control(&device, control)?;
    println!("{}: {}", control, value);
    Ok(())
}

/// Write a single control
pub fn set_control(config: &Config, device: Option<String>, control: &str, value: i64) -> CliResult {
    let mut session = Session::from_config(config);
    let device = resolve_device(&mut session, device, config)?;

    let written = session.gateway().set_control(&device, control, value)?;
    if written != value {
        println!("{}: {} (clamped from {})", control, written, value);
    } else {
        println!("{}: {}", control, written);
    }
    Ok(())
}

/// Build a pipeline from `name=value` arguments and apply it in order
pub fn apply_effects(config: &Config, device: Option<String>, effects: &[String]) -> CliResult {
    let assignments = effects
        .iter()
        .map(|arg| parse_assignment(arg))
        .collect::<Result<Vec<_>, _>>()?;

    let mut session = Session::from_config(config);
    let device = resolve_device(&mut session, device, config)?;
    session.select_device(device.clone())?;

    println!("Applying {} effect(s) to {}", assignments.len(), device);

    let mut failures = 0;
    for (control, value) in &assignments {
        let outcome = session
            .add_effect(control)
            .and_then(|position| session.configure_effect(position, *value));
        match outcome {
            Ok(stored) => println!("  {:<28} {}", control_label(control), stored),
            Err(e) => {
                failures += 1;
                println!("  {:<28} skipped: {}", control_label(control), e);
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} effects failed", failures, assignments.len()).into());
    }
    Ok(())
}

/// Walk through the pipeline operations against simulated cameras
pub fn run_demo() -> CliResult {
    let mut session = Session::new(SimulatedGateway::demo());
    let mut events = session.subscribe();

    println!("== Device discovery");
    let devices = session.refresh_devices()?.to_vec();
    print_events(&mut events);

    let Some(webcam) = devices.first().cloned() else {
        return Err("simulated gateway has no devices".into());
    };
    session.select_device(webcam)?;
    print_events(&mut events);

    let menu: Vec<&str> = session
        .available_effects()
        .iter()
        .map(|kind| kind.display_name())
        .collect();
    println!("   Add-effect menu: {}", menu.join(", "));

    println!();
    println!("== Building the pipeline");
    session.add_catalog_effect(EffectKind::Brightness)?;
    session.configure_effect(0, 300)?;
    session.add_catalog_effect(EffectKind::Zoom)?;
    session.add_catalog_effect(EffectKind::Contrast)?;
    session.move_effect(1, 0)?;
    print_events(&mut events);
    print_pipeline(&session);

    println!();
    println!("== Disabling and re-enabling");
    session.toggle_effect(2)?;
    session.toggle_effect(2)?;
    session.apply_all()?;
    print_events(&mut events);

    println!();
    println!("== Switching to a camera without zoom");
    if let Some(second) = devices.get(1).cloned() {
        session.select_device(second)?;
        print_events(&mut events);
        print_pipeline(&session);
    }

    println!();
    println!("== Removing the first effect");
    session.remove_effect(0)?;
    print_events(&mut events);
    print_pipeline(&session);

    Ok(())
}

/// Pick the device a command should operate on
///
/// Order: explicit path, configured default, first discovered camera.
fn resolve_device<G: ControlGateway>(
    session: &mut Session<G>,
    requested: Option<String>,
    config: &Config,
) -> AppResult<Device> {
    let requested = requested.or_else(|| config.default_device.clone());

    let discovered = session.refresh_devices().map(|devices| devices.to_vec());

    match (requested, discovered) {
        (Some(path), Ok(devices)) => Ok(devices
            .into_iter()
            .find(|d| d.path == path)
            .unwrap_or_else(|| Device::new(path.clone(), path))),
        // The tool may still be able to address the node directly
        (Some(path), Err(_)) => Ok(Device::new(path.clone(), path)),
        (None, Ok(devices)) => devices
            .into_iter()
            .next()
            .ok_or_else(|| "No cameras found".into()),
        (None, Err(e)) => Err(e.into()),
    }
}

/// Parse `control=value`
fn parse_assignment(arg: &str) -> Result<(String, i64), String> {
    let (control, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected control=value, got '{}'", arg))?;
    let control = control.trim();
    if control.is_empty() {
        return Err(format!("missing control name in '{}'", arg));
    }
    let value = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid value in '{}'", arg))?;
    Ok((control.to_string(), value))
}

fn print_pipeline<G: ControlGateway>(session: &Session<G>) {
    println!("   Pipeline:");
    for (position, effect) in session.pipeline().effects().iter().enumerate() {
        println!(
            "     {}. {:<26} {:>5} {}",
            position,
            control_label(&effect.control),
            effect.value,
            if effect.enabled { "on" } else { "off" }
        );
    }
}

fn print_events(events: &mut UnboundedReceiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::DevicesRefreshed(devices) => {
                for device in devices {
                    println!("   found {}", device);
                }
            }
            SessionEvent::DiscoveryFailed(reason) => println!("   discovery failed: {}", reason),
            SessionEvent::DeviceSelected { device, dropped } => {
                println!("   selected {}", device);
                if !dropped.is_empty() {
                    println!("   dropped unsupported: {}", dropped.join(", "));
                }
            }
            SessionEvent::EffectAdded {
                position,
                control,
                value,
            } => println!("   added {} at {} (value {})", control, position, value),
            SessionEvent::EffectRemoved { position, control } => {
                println!("   removed {} from {}", control, position)
            }
            SessionEvent::EffectMoved { from, to } => println!("   moved {} -> {}", from, to),
            SessionEvent::EffectToggled { position, enabled } => println!(
                "   {} effect {}",
                if enabled { "enabled" } else { "disabled" },
                position
            ),
            SessionEvent::EffectConfigured { position, value } => {
                println!("   effect {} set to {}", position, value)
            }
            SessionEvent::PipelineCleared => println!("   pipeline cleared"),
            SessionEvent::PipelineApplied { applied, failed } => {
                println!("   applied {} effect(s), {} failed", applied, failed)
            }
            SessionEvent::Warning(e) => println!("   warning: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("brightness=150"), Ok(("brightness".into(), 150)));
        assert_eq!(parse_assignment("hue = -20"), Ok(("hue".into(), -20)));
        assert!(parse_assignment("brightness").is_err());
        assert!(parse_assignment("=5").is_err());
        assert!(parse_assignment("gain=loud").is_err());
    }

    #[test]
    fn test_resolve_device_prefers_discovered_name() {
        let mut session = Session::new(SimulatedGateway::demo());
        let device =
            resolve_device(&mut session, Some("/dev/video2".into()), &Config::default()).unwrap();
        assert_eq!(device.name, "Simulated Document Camera");

        let device = resolve_device(&mut session, None, &Config::default()).unwrap();
        assert_eq!(device.path, "/dev/video0");
    }

    #[test]
    fn test_resolve_device_without_cameras() {
        let mut session = Session::new(SimulatedGateway::new());
        assert!(matches!(
            resolve_device(&mut session, None, &Config::default()),
            Err(AppError::Other(ref msg)) if msg == "No cameras found"
        ));
    }

    #[test]
    fn test_demo_runs() {
        assert!(run_demo().is_ok());
    }
}
