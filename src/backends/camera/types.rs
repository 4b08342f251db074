// SPDX-License-Identifier: GPL-3.0-only
// Shared types for the control gateway

//! Shared types for control gateways

use serde::{Deserialize, Serialize};

/// A camera input as reported by device enumeration
///
/// Devices are rediscovered on every enumeration; two instances with the
/// same path describe the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    /// Device node (e.g., /dev/video0)
    pub path: String,
    /// Card name (e.g., "HD Webcam")
    pub name: String,
    /// Bus information from the enumeration header (e.g., "usb-0000:00:14.0-1")
    pub bus_info: Option<String>,
}

impl Device {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            bus_info: None,
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.path)
    }
}

/// V4L2 control type as printed by the control listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlKind {
    Integer,
    Integer64,
    Boolean,
    Menu,
    IntegerMenu,
    Button,
    Other(String),
}

impl ControlKind {
    pub fn parse(type_name: &str) -> Self {
        match type_name.to_ascii_lowercase().as_str() {
            "int" | "integer" => ControlKind::Integer,
            "int64" => ControlKind::Integer64,
            "bool" => ControlKind::Boolean,
            "menu" => ControlKind::Menu,
            "intmenu" => ControlKind::IntegerMenu,
            "button" => ControlKind::Button,
            _ => ControlKind::Other(type_name.to_string()),
        }
    }
}

impl std::fmt::Display for ControlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlKind::Integer => write!(f, "int"),
            ControlKind::Integer64 => write!(f, "int64"),
            ControlKind::Boolean => write!(f, "bool"),
            ControlKind::Menu => write!(f, "menu"),
            ControlKind::IntegerMenu => write!(f, "intmenu"),
            ControlKind::Button => write!(f, "button"),
            ControlKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// One adjustable control exposed by a device
///
/// Only descriptors with a usable range are ever constructed by the
/// gateways: `min <= max`, and `min <= default <= max` when a default is
/// known. See [`ControlDescriptor::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlDescriptor {
    /// Control name, unique within a device (e.g., "brightness")
    pub name: String,
    /// V4L2 control ID
    pub id: u32,
    pub kind: ControlKind,
    pub min: i64,
    pub max: i64,
    pub step: i64,
    pub default: Option<i64>,
    /// Value at listing time
    pub value: Option<i64>,
    /// Flags such as "inactive" or "read-only"
    pub flags: Vec<String>,
}

/// Why a parsed control could not become a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeViolation {
    MissingRange,
    Inverted { min: i64, max: i64 },
    DefaultOutOfRange { min: i64, max: i64, default: i64 },
}

impl std::fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeViolation::MissingRange => write!(f, "missing min/max"),
            RangeViolation::Inverted { min, max } => write!(f, "min {} > max {}", min, max),
            RangeViolation::DefaultOutOfRange { min, max, default } => {
                write!(f, "default {} outside [{}, {}]", default, min, max)
            }
        }
    }
}

impl ControlDescriptor {
    /// Integer control with step 1 whose current value is its default
    pub fn integer(name: impl Into<String>, min: i64, max: i64, default: i64) -> Self {
        Self {
            name: name.into(),
            id: 0,
            kind: ControlKind::Integer,
            min,
            max,
            step: 1,
            default: Some(default),
            value: Some(default),
            flags: Vec::new(),
        }
    }

    /// Check a raw range before building a descriptor from it
    pub fn validate(
        min: Option<i64>,
        max: Option<i64>,
        default: Option<i64>,
    ) -> Result<(i64, i64), RangeViolation> {
        let (Some(min), Some(max)) = (min, max) else {
            return Err(RangeViolation::MissingRange);
        };
        if min > max {
            return Err(RangeViolation::Inverted { min, max });
        }
        if let Some(default) = default
            && !(min..=max).contains(&default)
        {
            return Err(RangeViolation::DefaultOutOfRange { min, max, default });
        }
        Ok((min, max))
    }

    /// Clamp a value into `[min, max]`
    pub fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }

    /// Default if known, otherwise the lower bound
    pub fn default_or_min(&self) -> i64 {
        self.default.unwrap_or(self.min)
    }

    /// Check if control is inactive (driver ignores writes for now)
    pub fn is_inactive(&self) -> bool {
        self.flags.iter().any(|f| f == "inactive")
    }

    pub fn is_read_only(&self) -> bool {
        self.flags.iter().any(|f| f == "read-only")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range() {
        assert_eq!(ControlDescriptor::validate(Some(0), Some(255), Some(128)), Ok((0, 255)));
        assert_eq!(ControlDescriptor::validate(Some(0), Some(255), None), Ok((0, 255)));
        assert_eq!(
            ControlDescriptor::validate(Some(500), Some(100), Some(100)),
            Err(RangeViolation::Inverted { min: 500, max: 100 })
        );
        assert_eq!(
            ControlDescriptor::validate(None, Some(100), None),
            Err(RangeViolation::MissingRange)
        );
        assert_eq!(
            ControlDescriptor::validate(Some(0), Some(10), Some(11)),
            Err(RangeViolation::DefaultOutOfRange {
                min: 0,
                max: 10,
                default: 11
            })
        );
    }

    #[test]
    fn test_control_flags() {
        let mut control = ControlDescriptor::integer("exposure_time_absolute", 3, 2047, 250);
        assert!(!control.is_inactive());
        assert!(!control.is_read_only());

        control.flags = vec!["inactive".into(), "read-only".into()];
        assert!(control.is_inactive());
        assert!(control.is_read_only());
    }

    #[test]
    fn test_control_kind_parse() {
        assert_eq!(ControlKind::parse("int"), ControlKind::Integer);
        assert_eq!(ControlKind::parse("BOOL"), ControlKind::Boolean);
        assert_eq!(ControlKind::parse("intmenu"), ControlKind::IntegerMenu);
        assert_eq!(ControlKind::parse("u8"), ControlKind::Other("u8".into()));
    }

    #[test]
    fn test_device_display() {
        let device = Device::new("/dev/video0", "HD Webcam");
        assert_eq!(device.to_string(), "HD Webcam (/dev/video0)");
    }
}
