// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end tests for the v4l2-ctl gateway against a scripted stand-in
#![cfg(unix)]

use camera_controls::backends::camera::ControlKind;
use camera_controls::{ControlGateway, Device, GatewayError, Session, V4l2CtlGateway};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const FAKE_TOOL: &str = r#"#!/bin/sh
LOG="$(dirname "$0")/writes.log"
case "$1" in
  --list-devices)
    printf 'HD Webcam (usb-0000:00:14.0-1):\n\t/dev/video0\n\t/dev/video1\n\t/dev/media0\n\n'
    printf 'Loopback (platform:v4l2loopback-000):\n\t/dev/video9\n\t/dev/video0\n'
    exit 0 ;;
  -d)
    dev="$2"; shift 2 ;;
esac
if [ "$dev" = "/dev/video9" ]; then
  echo $$ > "$(dirname "$0")/hung.pid"
  exec sleep 5
fi
case "$1" in
  --list-ctrls)
    printf 'User Controls\n\n'
    printf '                     brightness 0x00980900 (int)    : min=0 max=255 step=1 default=128 value=128\n'
    printf '                           gain 0x00980913 (int)    : min=0 max=100 step=1 default=0 value=0\n'
    printf '                 broken_control 0x00980999 (int)    : min=500 max=100 step=1 default=100 value=100\n'
    printf '\nCamera Controls\n\n'
    printf '                  zoom_absolute 0x009a090d (int)    : min=100 max=500 step=1 default=100 value=100\n'
    ;;
  --get-ctrl)
    case "$2" in
      brightness) echo "brightness: 128" ;;
      zoom_absolute) echo "zoom_absolute: 100" ;;
      *) echo "unknown control '$2'" >&2; exit 1 ;;
    esac ;;
  --set-ctrl)
    case "$2" in
      gain=*) echo "VIDIOC_S_EXT_CTRLS: failed: Permission denied" >&2; exit 255 ;;
    esac
    echo "$dev $2" >> "$LOG" ;;
esac
"#;

/// Behaves like v4l2-ctl on a machine without /dev/video0
const NO_CAMERA_TOOL: &str = r#"#!/bin/sh
echo 'Cannot open device /dev/video0, exiting.' >&2
exit 1
"#;

/// Write the fake tool into a fresh directory and return a gateway for it
fn fake_gateway(test: &str) -> (V4l2CtlGateway, PathBuf) {
    scripted_gateway(test, FAKE_TOOL)
}

fn scripted_gateway(test: &str, script_body: &str) -> (V4l2CtlGateway, PathBuf) {
    let dir = std::env::temp_dir().join(format!(
        "camera-controls-v4l2-{}-{}",
        std::process::id(),
        test
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let script = dir.join("v4l2-ctl.sh");
    std::fs::write(&script, script_body).unwrap();

    // Run through sh so the script needs no exec bit
    let gateway = V4l2CtlGateway::with_command(vec![
        "sh".to_string(),
        script.to_string_lossy().to_string(),
    ]);
    (gateway, dir)
}

fn writes(dir: &PathBuf) -> Vec<String> {
    std::fs::read_to_string(dir.join("writes.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn webcam() -> Device {
    Device::new("/dev/video0", "HD Webcam")
}

#[test]
fn test_discover_devices_dedupes_and_keeps_order() {
    let (gateway, _dir) = fake_gateway("discover");
    let devices = gateway.discover_devices().unwrap();

    let paths: Vec<&str> = devices.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(paths, vec!["/dev/video0", "/dev/video1", "/dev/video9"]);
    assert_eq!(devices[0].name, "HD Webcam");
    assert_eq!(devices[2].name, "Loopback");
}

#[test]
fn test_discover_without_cameras_is_empty() {
    let (gateway, _dir) = scripted_gateway("no-camera", NO_CAMERA_TOOL);
    assert_eq!(gateway.discover_devices(), Ok(vec![]));

    let mut session = Session::new(gateway);
    assert_eq!(session.refresh_devices().map(|d| d.len()), Ok(0));
}

#[test]
fn test_list_controls_excludes_invalid_ranges() {
    let (gateway, _dir) = fake_gateway("list");
    let controls = gateway.list_controls(&webcam()).unwrap();

    let names: Vec<&str> = controls.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["brightness", "gain", "zoom_absolute"]);
    assert_eq!(controls[2].kind, ControlKind::Integer);
    assert_eq!((controls[2].min, controls[2].max), (100, 500));
}

#[test]
fn test_get_control() {
    let (gateway, _dir) = fake_gateway("get");
    assert_eq!(gateway.get_control(&webcam(), "brightness"), Ok(128));
    assert_eq!(
        gateway.get_control(&webcam(), "hue"),
        Err(GatewayError::ControlUnavailable {
            device: "/dev/video0".into(),
            control: "hue".into(),
        })
    );
}

#[test]
fn test_set_control_clamps_before_writing() {
    let (gateway, dir) = fake_gateway("set");
    assert_eq!(gateway.set_control(&webcam(), "zoom_absolute", 9000), Ok(500));
    assert_eq!(gateway.set_control(&webcam(), "brightness", -3), Ok(0));
    assert_eq!(
        writes(&dir),
        vec!["/dev/video0 zoom_absolute=500", "/dev/video0 brightness=0"]
    );
}

#[test]
fn test_set_control_errors() {
    let (gateway, dir) = fake_gateway("set-errors");

    assert!(matches!(
        gateway.set_control(&webcam(), "gain", 10),
        Err(GatewayError::WriteRejected { ref reason, value: 10, .. }) if reason.contains("Permission denied")
    ));
    assert!(matches!(
        gateway.set_control(&webcam(), "hue", 10),
        Err(GatewayError::ControlUnavailable { .. })
    ));
    assert!(writes(&dir).is_empty());
}

#[test]
fn test_hung_tool_times_out() {
    let (gateway, dir) = fake_gateway("timeout");
    let gateway = gateway.with_timeout(Duration::from_millis(300));
    let stuck = Device::new("/dev/video9", "Loopback");

    let started = Instant::now();
    let result = gateway.list_controls(&stuck);
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(matches!(result, Err(GatewayError::Discovery(ref msg)) if msg.contains("did not finish")));

    // The stuck process is killed and reaped, not left behind
    let pid = std::fs::read_to_string(dir.join("hung.pid")).unwrap();
    if std::path::Path::new("/proc/self").exists() {
        let proc_entry = PathBuf::from(format!("/proc/{}", pid.trim()));
        assert!(!proc_entry.exists(), "tool process {} still present", pid.trim());
    }
}

#[test]
fn test_session_pipeline_over_tool() {
    let (gateway, dir) = fake_gateway("session");
    let mut session = Session::new(gateway);

    let device = session.refresh_devices().unwrap()[0].clone();
    session.select_device(device).unwrap();
    let position = session.add_effect("zoom_absolute").unwrap();
    assert_eq!(session.pipeline().effects()[position].value, 100);

    assert_eq!(session.configure_effect(position, 250), Ok(250));
    assert!(session.configure_effect(position, 600).is_ok());
    assert_eq!(
        writes(&dir),
        vec!["/dev/video0 zoom_absolute=250", "/dev/video0 zoom_absolute=500"]
    );
}
