//! # Graphics Context
//!
//! The consumer half of a session. Owns the component table outright; the
//! only way in from the control thread is the command queue.
//!
//! ```text
//! frame():
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. SWAP        control→graphics queue, producers keep going   │
//! │ 2. SIGNAL      bump frame counter, wake wait_next_frame()     │
//! │ 3. APPLY       decode and apply every record in push order    │
//! │ 4. CLEAR       read side empty, ready for the next swap       │
//! │ 5. MATRICES    rebuild_matrices from every stale root         │
//! │ 6. INSTANCES   rebuild stale geometry instance buffers        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use cadence_core::{CommandReader, CommandWriter};
use cadence_scene::{drain_commands, ApplyReport, ComponentManager, RebuildStats};

use crate::signal::FrameSignal;

/// What one [`GraphicsContext::frame`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number assigned at the swap.
    pub frame: u64,
    /// Command bytes taken by the swap.
    pub command_bytes: usize,
    /// Command outcomes.
    pub apply: ApplyReport,
    /// Matrix rebuild counters.
    pub rebuild: RebuildStats,
    /// Geometry instance buffers rebuilt.
    pub geometries_rebuilt: usize,
    /// Wall time for the whole frame.
    pub elapsed: Duration,
}

/// Frame driver for the graphics thread.
pub struct GraphicsContext {
    scene: ComponentManager,
    commands: CommandReader,
    readback: CommandWriter,
    signal: Arc<FrameSignal>,
    log_frame_reports: bool,
}

impl GraphicsContext {
    pub(crate) fn new(
        scene: ComponentManager,
        commands: CommandReader,
        readback: CommandWriter,
        signal: Arc<FrameSignal>,
        log_frame_reports: bool,
    ) -> Self {
        Self {
            scene,
            commands,
            readback,
            signal,
            log_frame_reports,
        }
    }

    /// Runs one frame. See the module diagram for the order of work.
    pub fn frame(&mut self) -> FrameReport {
        let started = Instant::now();

        let command_bytes = match self.commands.swap() {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::error!(%err, "command queue not drained, applying leftovers");
                self.commands.pending_bytes()
            }
        };
        let frame = self.signal.advance();

        let apply = drain_commands(&mut self.scene, &self.commands, &self.readback);
        self.commands.clear();

        let rebuild = self.scene.rebuild_all_matrices();
        let geometries_rebuilt = self.scene.rebuild_stale_geometries();

        let report = FrameReport {
            frame,
            command_bytes,
            apply,
            rebuild,
            geometries_rebuilt,
            elapsed: started.elapsed(),
        };

        if self.log_frame_reports {
            tracing::info!(
                frame,
                command_bytes,
                applied = apply.applied,
                rejected = apply.rejected,
                malformed = apply.malformed,
                visited = rebuild.visited,
                geometries_rebuilt,
                elapsed_us = u64::try_from(report.elapsed.as_micros()).unwrap_or(u64::MAX),
                "frame"
            );
        }
        report
    }

    /// The component table.
    #[must_use]
    pub fn scene(&self) -> &ComponentManager {
        &self.scene
    }

    /// The component table, mutably. For renderer-side bookkeeping such as
    /// [`cadence_scene::Geometry::take_instance_upload`].
    pub fn scene_mut(&mut self) -> &mut ComponentManager {
        &mut self.scene
    }

    /// Frames run so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.signal.current()
    }
}
