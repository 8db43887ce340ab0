//! # Session
//!
//! Wires the two halves together. There are no globals: everything one
//! control thread and one graphics thread share lives behind the handles
//! returned by [`Session::split`].
//!
//! ```text
//!            ┌──────────── Arc<IdAllocator> ────────────┐
//!            │                                          │
//! ┌──────────┴─────────┐   commands (C→G)   ┌───────────┴─────────┐
//! │  ControlContext    │ ─────────────────> │  GraphicsContext    │
//! │  (producer API)    │ <───────────────── │  (ComponentManager) │
//! └──────────┬─────────┘   readback (G→C)   └───────────┬─────────┘
//!            │                                          │
//!            └──────────── Arc<FrameSignal> ────────────┘
//! ```

use std::sync::Arc;

use cadence_core::command_queue;
use cadence_scene::ComponentManager;
use cadence_shared::IdAllocator;

use crate::config::SessionConfig;
use crate::control::ControlContext;
use crate::graphics::GraphicsContext;
use crate::signal::FrameSignal;

/// A control/graphics pair built from one config.
pub struct Session {
    control: ControlContext,
    graphics: GraphicsContext,
}

impl Session {
    /// Builds both halves.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        let ids = Arc::new(IdAllocator::new());
        let signal = Arc::new(FrameSignal::new());
        let (command_writer, command_reader) =
            command_queue(config.queue.control_to_graphics_capacity);
        let (readback_writer, readback_reader) =
            command_queue(config.queue.graphics_to_control_capacity);

        let scene = ComponentManager::with_capacity(
            Arc::clone(&ids),
            config.scene.transform_capacity,
            config.scene.geometry_capacity,
        );

        tracing::debug!(
            commands = config.queue.control_to_graphics_capacity,
            readback = config.queue.graphics_to_control_capacity,
            "session created"
        );

        Self {
            control: ControlContext::new(ids, command_writer, readback_reader, Arc::clone(&signal)),
            graphics: GraphicsContext::new(
                scene,
                command_reader,
                readback_writer,
                signal,
                config.frame.log_frame_reports,
            ),
        }
    }

    /// Hands out the two halves, one per thread.
    #[must_use]
    pub fn split(self) -> (ControlContext, GraphicsContext) {
        (self.control, self.graphics)
    }

    /// Control half, for single-threaded use.
    #[must_use]
    pub fn control(&mut self) -> &mut ControlContext {
        &mut self.control
    }

    /// Graphics half, for single-threaded use.
    #[must_use]
    pub fn graphics(&mut self) -> &mut GraphicsContext {
        &mut self.graphics
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}
