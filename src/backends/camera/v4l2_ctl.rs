// SPDX-License-Identifier: GPL-3.0-only

//! Control gateway backed by the `v4l2-ctl` command-line tool
//!
//! Every operation spawns the tool once and parses its text output:
//!
//! - `--list-devices` for enumeration
//! - `-d <dev> --list-ctrls` for control descriptors
//! - `-d <dev> --get-ctrl <name>` / `--set-ctrl <name>=<value>` for values
//!
//! The tool command is configurable so sandboxed builds can go through a
//! host wrapper such as `flatpak-spawn --host v4l2-ctl`.

use super::ControlGateway;
use super::types::{ControlDescriptor, ControlKind, Device, RangeViolation};
use crate::config::Config;
use crate::constants::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_TOOL};
use crate::errors::{GatewayError, GatewayResult};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often a running tool is checked for exit
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Read a child pipe to the end on its own thread
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Failure to run the tool at all (as opposed to the tool reporting an error)
#[derive(Debug)]
enum ToolError {
    NotFound(String),
    Spawn(std::io::Error),
    TimedOut(Duration),
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::NotFound(program) => write!(f, "{} not found", program),
            ToolError::Spawn(e) => write!(f, "failed to run tool: {}", e),
            ToolError::TimedOut(timeout) => {
                write!(f, "tool did not finish within {} ms", timeout.as_millis())
            }
        }
    }
}

/// Gateway that shells out to `v4l2-ctl`
///
/// Cloning is cheap; clones share the descriptor cache used for clamping
/// writes.
#[derive(Debug, Clone)]
pub struct V4l2CtlGateway {
    /// Program followed by any leading arguments
    command: Arc<[String]>,
    timeout: Duration,
    /// Descriptors from the most recent listing, keyed by device path
    descriptors: Arc<Mutex<HashMap<String, Vec<ControlDescriptor>>>>,
}

impl Default for V4l2CtlGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl V4l2CtlGateway {
    /// Gateway running `v4l2-ctl` from `PATH`
    pub fn new() -> Self {
        Self::with_command(vec![DEFAULT_TOOL.to_string()])
    }

    /// Gateway running an explicit command (program plus leading arguments)
    pub fn with_command(command: Vec<String>) -> Self {
        let command = if command.is_empty() {
            vec![DEFAULT_TOOL.to_string()]
        } else {
            command
        };
        Self {
            command: command.into(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
            descriptors: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_command(config.tool_command.clone()).with_timeout(config.command_timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn program(&self) -> &str {
        &self.command[0]
    }

    /// Run the tool with `args`, killing it if it outlives the timeout
    fn run(&self, args: &[&str]) -> Result<Output, ToolError> {
        debug!(command = ?self.command, ?args, "Running control tool");

        let mut child = Command::new(self.program())
            .args(&self.command[1..])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ToolError::NotFound(self.program().to_string())
                } else {
                    ToolError::Spawn(e)
                }
            })?;

        // Drain both pipes while polling so a chatty tool cannot block on a
        // full pipe
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait().map_err(ToolError::Spawn)? {
                break status;
            }
            if Instant::now() >= deadline {
                warn!(pid = child.id(), ?args, "Control tool timed out, killing it");
                // The child is still unreaped here, so its pid cannot have
                // been recycled
                if let Err(e) = child.kill() {
                    debug!(error = %e, "Killing control tool failed");
                }
                let _ = child.wait();
                return Err(ToolError::TimedOut(self.timeout));
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        Ok(Output {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }

    /// Cached descriptor for a control, refreshing the cache once on a miss
    fn descriptor(&self, device: &Device, control: &str) -> GatewayResult<ControlDescriptor> {
        if let Some(descriptor) = self.cached(device, control) {
            return Ok(descriptor);
        }
        self.list_controls(device)?;
        self.cached(device, control)
            .ok_or_else(|| GatewayError::ControlUnavailable {
                device: device.path.clone(),
                control: control.to_string(),
            })
    }

    fn cached(&self, device: &Device, control: &str) -> Option<ControlDescriptor> {
        let cache = self.descriptors.lock().ok()?;
        cache
            .get(&device.path)?
            .iter()
            .find(|d| d.name == control)
            .cloned()
    }

    fn forget(&self, device: &Device) {
        if let Ok(mut cache) = self.descriptors.lock() {
            cache.remove(&device.path);
        }
    }
}

impl ControlGateway for V4l2CtlGateway {
    fn discover_devices(&self) -> GatewayResult<Vec<Device>> {
        let output = self
            .run(&["--list-devices"])
            .map_err(|e| GatewayError::Discovery(e.to_string()))?;

        // v4l2-ctl exits non-zero when /dev/video0 does not exist, which
        // just means there is no camera
        if !output.status.success() {
            debug!(
                status = ?output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Device listing exited with an error"
            );
        }

        let devices = parse_device_list(&String::from_utf8_lossy(&output.stdout));
        info!(count = devices.len(), "Discovered V4L2 devices");
        Ok(devices)
    }

    fn list_controls(&self, device: &Device) -> GatewayResult<Vec<ControlDescriptor>> {
        let output = self
            .run(&["-d", &device.path, "--list-ctrls"])
            .map_err(|e| GatewayError::Discovery(e.to_string()))?;

        if !output.status.success() {
            self.forget(device);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(device_path = %device.path, %stderr, "Listing controls failed");
            return Err(GatewayError::Discovery(format!(
                "listing controls on {} failed: {}",
                device.path, stderr
            )));
        }

        let descriptors = parse_control_list(&String::from_utf8_lossy(&output.stdout));
        debug!(device_path = %device.path, count = descriptors.len(), "Listed controls");

        if let Ok(mut cache) = self.descriptors.lock() {
            cache.insert(device.path.clone(), descriptors.clone());
        }
        Ok(descriptors)
    }

    fn get_control(&self, device: &Device, control: &str) -> GatewayResult<i64> {
        let output = self
            .run(&["-d", &device.path, "--get-ctrl", control])
            .map_err(|e| GatewayError::Discovery(e.to_string()))?;

        let unavailable = || GatewayError::ControlUnavailable {
            device: device.path.clone(),
            control: control.to_string(),
        };

        if !output.status.success() {
            debug!(
                device_path = %device.path,
                control,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Failed to get control"
            );
            return Err(unavailable());
        }

        parse_control_value(&String::from_utf8_lossy(&output.stdout)).ok_or_else(unavailable)
    }

    fn set_control(&self, device: &Device, control: &str, value: i64) -> GatewayResult<i64> {
        let descriptor = self.descriptor(device, control)?;
        let clamped = descriptor.clamp(value);
        if clamped != value {
            debug!(
                device_path = %device.path,
                control,
                requested = value,
                clamped,
                "Clamped control value to its range"
            );
        }

        let assignment = format!("{}={}", control, clamped);
        let output = self
            .run(&["-d", &device.path, "--set-ctrl", &assignment])
            .map_err(|e| GatewayError::WriteRejected {
                control: control.to_string(),
                value: clamped,
                reason: e.to_string(),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if stderr.contains("unknown control") {
            // Control went away since the last listing
            self.forget(device);
            return Err(GatewayError::ControlUnavailable {
                device: device.path.clone(),
                control: control.to_string(),
            });
        }

        // Older v4l2-ctl releases report ioctl failures on stderr but still
        // exit successfully
        if !output.status.success() || stderr.contains("failed") {
            warn!(
                device_path = %device.path,
                control,
                value = clamped,
                %stderr,
                "Control write rejected"
            );
            return Err(GatewayError::WriteRejected {
                control: control.to_string(),
                value: clamped,
                reason: if stderr.is_empty() {
                    format!("exit status {}", output.status)
                } else {
                    stderr
                },
            });
        }

        debug!(device_path = %device.path, control, value = clamped, "Set control");
        Ok(clamped)
    }
}

/// Parse `--list-devices` output
///
/// ```text
/// HD Webcam: HD Webcam (usb-0000:00:14.0-1):
///         /dev/video0
///         /dev/video1
///         /dev/media0
/// ```
///
/// Each `/dev/video*` node under a card header becomes a [`Device`];
/// duplicates keep their first position.
pub fn parse_device_list(stdout: &str) -> Vec<Device> {
    let mut devices = Vec::new();
    let mut seen = HashSet::new();
    let mut current: Option<(String, Option<String>)> = None;

    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if !trimmed.starts_with('/') {
            current = Some(parse_card_header(trimmed));
            continue;
        }

        if !trimmed.starts_with("/dev/video") {
            continue;
        }

        let Some((name, bus_info)) = current.as_ref() else {
            debug!(path = trimmed, "Device node without a card header, skipping");
            continue;
        };

        if seen.insert(trimmed.to_string()) {
            devices.push(Device {
                path: trimmed.to_string(),
                name: name.clone(),
                bus_info: bus_info.clone(),
            });
        }
    }

    devices
}

/// Split "Card Name (bus-info):" into its name and bus info
fn parse_card_header(header: &str) -> (String, Option<String>) {
    let header = header.trim_end_matches(':').trim();
    if header.ends_with(')')
        && let Some((name, bus)) = header.rsplit_once(" (")
    {
        return (name.trim().to_string(), Some(bus.trim_end_matches(')').to_string()));
    }
    (header.to_string(), None)
}

/// Parse `--list-ctrls` output into descriptors with a usable range
///
/// ```text
/// User Controls
///
///                      brightness 0x00980900 (int)    : min=0 max=255 step=1 default=128 value=128
///         white_balance_automatic 0x0098090c (bool)   : default=1 value=1
///            power_line_frequency 0x00980918 (menu)   : min=0 max=2 default=2 value=2 (60 Hz)
/// ```
///
/// Class headers and menu item lines are ignored. Booleans without an
/// explicit range get `[0, 1]`. Lines whose range is missing, inverted, or
/// does not contain the default are dropped.
pub fn parse_control_list(stdout: &str) -> Vec<ControlDescriptor> {
    let mut descriptors: Vec<ControlDescriptor> = Vec::new();

    for line in stdout.lines() {
        let Some(raw) = parse_control_line(line) else {
            continue;
        };

        let (mut min, mut max) = (raw.params.get("min").copied(), raw.params.get("max").copied());
        if raw.kind == ControlKind::Boolean && min.is_none() && max.is_none() {
            min = Some(0);
            max = Some(1);
        }
        let default = raw.params.get("default").copied();

        let (min, max) = match ControlDescriptor::validate(min, max, default) {
            Ok(range) => range,
            Err(RangeViolation::MissingRange) => {
                debug!(control = %raw.name, kind = %raw.kind, "Control has no range, skipping");
                continue;
            }
            Err(violation) => {
                warn!(control = %raw.name, %violation, "Control has an invalid range, skipping");
                continue;
            }
        };

        if descriptors.iter().any(|d| d.name == raw.name) {
            continue;
        }

        descriptors.push(ControlDescriptor {
            name: raw.name,
            id: raw.id,
            kind: raw.kind,
            min,
            max,
            step: raw.params.get("step").copied().filter(|s| *s > 0).unwrap_or(1),
            default,
            value: raw.params.get("value").copied(),
            flags: raw.flags,
        });
    }

    descriptors
}

struct RawControl {
    name: String,
    id: u32,
    kind: ControlKind,
    params: HashMap<String, i64>,
    flags: Vec<String>,
}

fn parse_control_line(line: &str) -> Option<RawControl> {
    let (head, params) = line.split_once(':')?;
    let mut head = head.split_whitespace();
    let name = head.next()?;
    let id = head.next()?.strip_prefix("0x")?;
    let kind = head.next()?.strip_prefix('(')?.strip_suffix(')')?;

    let id = u32::from_str_radix(id, 16).ok()?;
    let mut values = HashMap::new();
    let mut flags = Vec::new();

    for token in params.split_whitespace() {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        if key == "flags" {
            flags.extend(value.split(',').filter(|f| !f.is_empty()).map(str::to_string));
        } else if let Ok(value) = value.parse::<i64>() {
            values.insert(key.to_string(), value);
        }
    }

    Some(RawControl {
        name: name.to_string(),
        id,
        kind: ControlKind::parse(kind),
        params: values,
        flags,
    })
}

/// Parse `--get-ctrl` output ("brightness: 128")
pub fn parse_control_value(stdout: &str) -> Option<i64> {
    stdout.lines().find_map(|line| {
        let (_, value) = line.split_once(':')?;
        value.split_whitespace().next()?.parse().ok()
    })
}
