// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the effect catalog

use camera_controls::ControlDescriptor;
use camera_controls::EffectKind;
use camera_controls::constants::available_kinds;

#[test]
fn test_catalog_size() {
    // Twelve controls are offered in the add-effect menu
    assert_eq!(EffectKind::ALL.len(), 12);
}

#[test]
fn test_catalog_display_names() {
    for kind in EffectKind::ALL {
        let name = kind.display_name();
        assert!(!name.is_empty(), "Effect {:?} has empty display name", kind);
        assert_eq!(kind.to_string(), name);
    }
}

#[test]
fn test_catalog_round_trips_control_names() {
    for kind in EffectKind::ALL {
        for name in kind.control_names() {
            assert_eq!(EffectKind::from_control_name(name), Some(kind));
        }
    }
}

#[test]
fn test_available_kinds_for_typical_webcam() {
    let controls = vec![
        ControlDescriptor::integer("brightness", -64, 64, 0),
        ControlDescriptor::integer("contrast", 0, 95, 32),
        ControlDescriptor::integer("white_balance_temperature", 2800, 6500, 4600),
        ControlDescriptor::integer("exposure_time_absolute", 1, 5000, 156),
        ControlDescriptor::integer("pan_absolute", -36000, 36000, 0),
    ];

    assert_eq!(
        available_kinds(&controls),
        vec![
            EffectKind::Brightness,
            EffectKind::Contrast,
            EffectKind::Exposure,
            EffectKind::WhiteBalance,
        ]
    );
}
