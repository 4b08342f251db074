// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants and the effect catalog

use crate::backends::camera::types::ControlDescriptor;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Executable used when the configuration does not name one
pub const DEFAULT_TOOL: &str = "v4l2-ctl";

/// Upper bound on a single tool invocation
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Effects the "add effect" menu offers
///
/// Each kind maps to one V4L2 control. Drivers do not agree on every name
/// (newer kernels renamed `exposure_absolute` to `exposure_time_absolute`),
/// so a kind lists its candidates in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Brightness,
    Contrast,
    Saturation,
    Hue,
    Sharpness,
    Gamma,
    Zoom,
    Exposure,
    Gain,
    WhiteBalance,
    Focus,
    BacklightCompensation,
}

impl EffectKind {
    /// All catalog entries in menu order
    pub const ALL: [EffectKind; 12] = [
        EffectKind::Brightness,
        EffectKind::Contrast,
        EffectKind::Saturation,
        EffectKind::Hue,
        EffectKind::Sharpness,
        EffectKind::Gamma,
        EffectKind::Zoom,
        EffectKind::Exposure,
        EffectKind::Gain,
        EffectKind::WhiteBalance,
        EffectKind::Focus,
        EffectKind::BacklightCompensation,
    ];

    /// Get display name for the effect
    pub fn display_name(&self) -> &'static str {
        match self {
            EffectKind::Brightness => "Brightness",
            EffectKind::Contrast => "Contrast",
            EffectKind::Saturation => "Saturation",
            EffectKind::Hue => "Hue",
            EffectKind::Sharpness => "Sharpness",
            EffectKind::Gamma => "Gamma",
            EffectKind::Zoom => "Zoom",
            EffectKind::Exposure => "Exposure",
            EffectKind::Gain => "Gain",
            EffectKind::WhiteBalance => "White Balance",
            EffectKind::Focus => "Focus",
            EffectKind::BacklightCompensation => "Backlight Compensation",
        }
    }

    /// Candidate V4L2 control names, preferred first
    pub fn control_names(&self) -> &'static [&'static str] {
        match self {
            EffectKind::Brightness => &["brightness"],
            EffectKind::Contrast => &["contrast"],
            EffectKind::Saturation => &["saturation"],
            EffectKind::Hue => &["hue"],
            EffectKind::Sharpness => &["sharpness"],
            EffectKind::Gamma => &["gamma"],
            EffectKind::Zoom => &["zoom_absolute"],
            EffectKind::Exposure => &["exposure_time_absolute", "exposure_absolute"],
            EffectKind::Gain => &["gain", "analogue_gain"],
            EffectKind::WhiteBalance => &["white_balance_temperature"],
            EffectKind::Focus => &["focus_absolute"],
            EffectKind::BacklightCompensation => &["backlight_compensation"],
        }
    }

    /// Pick the first candidate control the device actually lists
    pub fn resolve<'a>(&self, descriptors: &'a [ControlDescriptor]) -> Option<&'a ControlDescriptor> {
        self.control_names()
            .iter()
            .find_map(|name| descriptors.iter().find(|d| d.name == *name))
    }

    /// Reverse lookup from a V4L2 control name
    pub fn from_control_name(name: &str) -> Option<EffectKind> {
        EffectKind::ALL
            .into_iter()
            .find(|kind| kind.control_names().contains(&name))
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Catalog entries supported by a device, in menu order
pub fn available_kinds(descriptors: &[ControlDescriptor]) -> Vec<EffectKind> {
    EffectKind::ALL
        .into_iter()
        .filter(|kind| kind.resolve(descriptors).is_some())
        .collect()
}

/// Human-readable label for any control name, catalog or not
///
/// `white_balance_temperature` becomes "White Balance Temperature".
pub fn control_label(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
