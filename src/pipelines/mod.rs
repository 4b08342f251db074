// SPDX-License-Identifier: GPL-3.0-only

//! Effect pipelines
//!
//! An effects pipeline is an ordered list of control adjustments for the
//! selected camera. Entries map one-to-one onto independent hardware
//! controls, so order decides the sequence of writes and what the UI shows,
//! not a computed image.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ UI / CLI     │ ──▶ │ Effects Pipeline  │ ──▶ │ Gateway      │
//! │ add/remove/  │     │  - ordering       │     │  set_control │
//! │ move/toggle/ │     │  - range clamping │     │  (in order)  │
//! │ configure    │     │  - device reset   │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`effects`]: The pipeline model and its operations

pub mod effects;

pub use effects::{AppliedEffect, ApplyFailure, ApplyReport, Effect, EffectsPipeline};
