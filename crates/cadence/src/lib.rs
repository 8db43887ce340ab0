//! # Cadence
//!
//! A retained scene graph shared between a control thread (which decides
//! what the scene should look like) and a graphics thread (which owns it).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                              CADENCE                                │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                     │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌───────────────┐  │
//! │  │ cadence_core    │     │ cadence_shared  │     │ cadence_scene │  │
//! │  │                 │     │                 │     │               │  │
//! │  │ • Arena         │────>│ • SgId          │────>│ • Components  │  │
//! │  │ • Spinlock      │     │ • SceneCommand  │     │ • Hierarchy   │  │
//! │  │ • Command queue │     │ • ReadbackEvent │     │ • Apply       │  │
//! │  └─────────────────┘     └─────────────────┘     └───────────────┘  │
//! │                                                                     │
//! │                 cadence: Session, ControlContext,                   │
//! │                          GraphicsContext, SessionConfig             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use cadence::{Session, SessionConfig};
//!
//! let (control, mut graphics) = Session::new(&SessionConfig::default()).split();
//!
//! let cube = control.create_transform("cube");
//! control.set_position(cube, glam::Vec3::Y);
//!
//! let report = graphics.frame();
//! assert_eq!(report.apply.applied, 2);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod control;
pub mod error;
pub mod graphics;
pub mod session;
pub mod signal;

pub use cadence_core as core;
pub use cadence_scene as scene;
pub use cadence_shared as shared;

pub use config::{FrameConfig, QueueConfig, SceneConfig, SessionConfig};
pub use control::ControlContext;
pub use error::{ConfigError, ConfigResult};
pub use graphics::{FrameReport, GraphicsContext};
pub use session::Session;
pub use signal::FrameSignal;
