// SPDX-License-Identifier: GPL-3.0-only

//! Camera Controls - V4L2 control pipeline for the Linux desktop
//!
//! This library provides the backend of the camera controls utility: a
//! gateway that reads and writes V4L2 controls through `v4l2-ctl`, and an
//! ordered effects pipeline that the tray window renders and edits.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Control gateway trait, `v4l2-ctl` and simulated gateways
//! - [`pipelines`]: The effects pipeline model
//! - [`session`]: Per-application context owning gateway and pipeline
//! - [`constants`]: Effect catalog and tool defaults
//! - [`config`]: User configuration handling
//! - [`errors`]: Error taxonomy
//!
//! # Example
//!
//! ```no_run
//! use camera_controls::{Config, Session};
//!
//! let mut session = Session::from_config(&Config::default());
//! if let Some(device) = session.refresh_devices()?.first().cloned() {
//!     session.select_device(device)?;
//!     let position = session.add_effect("brightness")?;
//!     session.configure_effect(position, 150)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod session;

// Re-export commonly used types
pub use backends::camera::{
    ControlDescriptor, ControlGateway, Device, SimulatedGateway, V4l2CtlGateway,
};
pub use config::Config;
pub use constants::EffectKind;
pub use errors::{AppError, AppResult, GatewayError, PipelineError};
pub use pipelines::{ApplyReport, Effect, EffectsPipeline};
pub use session::{Session, SessionEvent};
