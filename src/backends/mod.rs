// SPDX-License-Identifier: GPL-3.0-only

//! Backend layer for camera control access
//!
//! The backend layer abstracts how control values reach the hardware,
//! providing a consistent API regardless of the underlying mechanism:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          Session / Effects Pipeline          │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │  V4L2 (v4l2-ctl) │  │    Simulated    │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Control gateway trait and its implementations

pub mod camera;
