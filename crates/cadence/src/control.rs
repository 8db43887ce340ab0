//! # Control Context
//!
//! The producer half of a session. Every mutation is encoded into the
//! control→graphics queue and returns immediately; nothing here touches
//! the component table.
//!
//! Creation calls allocate the [`SgId`] on this side, so the handle is
//! usable in follow-up commands before the graphics thread has seen it.

use std::borrow::Cow;
use std::sync::Arc;

use cadence_core::{CommandReader, CommandWriter};
use cadence_shared::{IdAllocator, ReadbackEvent, SceneCommand, SgId};
use glam::{Quat, Vec3, Vec4};

use crate::signal::FrameSignal;

/// Producer API for the control thread.
pub struct ControlContext {
    ids: Arc<IdAllocator>,
    commands: CommandWriter,
    readback: CommandReader,
    signal: Arc<FrameSignal>,
}

impl ControlContext {
    pub(crate) fn new(
        ids: Arc<IdAllocator>,
        commands: CommandWriter,
        readback: CommandReader,
        signal: Arc<FrameSignal>,
    ) -> Self {
        Self {
            ids,
            commands,
            readback,
            signal,
        }
    }

    /// Encodes one command. Lower level than the named helpers below.
    pub fn push(&self, command: &SceneCommand<'_>) {
        command.write_parts(|kind, parts| self.commands.push_parts(kind, parts));
    }

    /// Bytes queued since the graphics thread last swapped.
    #[must_use]
    pub fn pending_bytes(&self) -> usize {
        self.commands.pending_bytes()
    }

    /// Another handle onto the command queue, for extra producer threads.
    #[must_use]
    pub fn command_writer(&self) -> CommandWriter {
        self.commands.clone()
    }

    /// The shared ID source.
    #[must_use]
    pub fn id_allocator(&self) -> &Arc<IdAllocator> {
        &self.ids
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Queues a new transform.
    pub fn create_transform(&self, name: &str) -> SgId {
        let id = self.ids.allocate();
        self.push(&SceneCommand::CreateTransform { id, name });
        id
    }

    /// Queues a new, empty geometry.
    pub fn create_geometry(&self, name: &str) -> SgId {
        let id = self.ids.allocate();
        self.push(&SceneCommand::CreateGeometry { id, name });
        id
    }

    /// Queues a new shader from vertex and fragment source.
    pub fn create_shader(&self, vertex: &str, fragment: &str) -> SgId {
        let id = self.ids.allocate();
        self.push(&SceneCommand::CreateShader {
            id,
            vertex,
            fragment,
        });
        id
    }

    /// Queues a new material. `shader` may be [`SgId::NULL`].
    pub fn create_material(&self, shader: SgId, name: &str) -> SgId {
        let id = self.ids.allocate();
        self.push(&SceneCommand::CreateMaterial { id, shader, name });
        id
    }

    /// Queues a new mesh bound to `geometry` and `material`.
    pub fn create_mesh(&self, geometry: SgId, material: SgId, name: &str) -> SgId {
        let id = self.ids.allocate();
        self.push(&SceneCommand::CreateMesh {
            id,
            geometry,
            material,
            name,
        });
        id
    }

    /// Queues a new zero-filled RGBA8 texture.
    pub fn create_texture(&self, width: u32, height: u32, name: &str) -> SgId {
        let id = self.ids.allocate();
        self.push(&SceneCommand::CreateTexture {
            id,
            width,
            height,
            name,
        });
        id
    }

    /// Renames any component.
    pub fn set_name(&self, id: SgId, name: &str) {
        self.push(&SceneCommand::SetName { id, name });
    }

    /// Destroys any component.
    pub fn destroy(&self, id: SgId) {
        self.push(&SceneCommand::Destroy { id });
    }

    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// Sets local translation.
    pub fn set_position(&self, id: SgId, position: Vec3) {
        self.push(&SceneCommand::SetPosition { id, position });
    }

    /// Sets local rotation.
    pub fn set_rotation(&self, id: SgId, rotation: Quat) {
        self.push(&SceneCommand::SetRotation { id, rotation });
    }

    /// Sets local scale.
    pub fn set_scale(&self, id: SgId, scale: Vec3) {
        self.push(&SceneCommand::SetScale { id, scale });
    }

    /// Attaches `child` under `parent`.
    pub fn add_child(&self, parent: SgId, child: SgId) {
        self.push(&SceneCommand::AddChild { parent, child });
    }

    /// Detaches `child` from `parent`.
    pub fn remove_child(&self, parent: SgId, child: SgId) {
        self.push(&SceneCommand::RemoveChild { parent, child });
    }

    /// Detaches every child of `parent`.
    pub fn remove_all_children(&self, parent: SgId) {
        self.push(&SceneCommand::RemoveAllChildren { parent });
    }

    /// Moves `child` under `parent`, or to the root for `None`.
    pub fn reparent(&self, child: SgId, parent: Option<SgId>) {
        self.push(&SceneCommand::Reparent {
            child,
            parent: SgId::from(parent),
        });
    }

    // =========================================================================
    // Geometry / material / texture
    // =========================================================================

    /// Replaces one vertex attribute stream.
    pub fn set_vertex_attribute(
        &self,
        geometry: SgId,
        location: u32,
        num_components: u32,
        data: &[f32],
    ) {
        self.push(&SceneCommand::SetVertexAttribute {
            geometry,
            location,
            num_components,
            data: Cow::Borrowed(data),
        });
    }

    /// Replaces the index buffer.
    pub fn set_indices(&self, geometry: SgId, indices: &[u32]) {
        self.push(&SceneCommand::SetIndices {
            geometry,
            indices: Cow::Borrowed(indices),
        });
    }

    /// Overrides the vertex draw count; `-1` derives it from the data.
    pub fn set_vertex_count(&self, geometry: SgId, count: i32) {
        self.push(&SceneCommand::SetVertexCount { geometry, count });
    }

    /// Overrides the index draw count; `-1` derives it from the data.
    pub fn set_indices_count(&self, geometry: SgId, count: i32) {
        self.push(&SceneCommand::SetIndicesCount { geometry, count });
    }

    /// Writes one `vec4` uniform slot.
    pub fn set_material_uniform(&self, material: SgId, slot: u32, value: Vec4) {
        self.push(&SceneCommand::SetMaterialUniform {
            material,
            slot,
            value,
        });
    }

    /// Rebinds a mesh, creating it if `mesh` is not live yet.
    pub fn update_mesh(&self, mesh: SgId, geometry: SgId, material: SgId) {
        self.push(&SceneCommand::UpdateMesh {
            mesh,
            geometry,
            material,
        });
    }

    /// Replaces a texture's pixels. Length must be `width * height * 4`.
    pub fn texture_write(&self, texture: SgId, pixels: &[u8]) {
        self.push(&SceneCommand::TextureWrite { texture, pixels });
    }

    /// Asks for a texture's pixels back. The reply arrives through
    /// [`ControlContext::poll_readback`] after the graphics thread's next
    /// frame.
    pub fn copy_texture_to_cpu(&self, texture: SgId) {
        self.push(&SceneCommand::CopyTextureToCpu { texture });
    }

    // =========================================================================
    // Replies and pacing
    // =========================================================================

    /// Takes every readback event the graphics thread has produced.
    pub fn poll_readback(&mut self) -> Vec<ReadbackEvent> {
        if let Err(err) = self.readback.swap() {
            tracing::warn!(%err, "readback queue was not drained");
        }

        let mut events = Vec::new();
        for record in self.readback.records() {
            match ReadbackEvent::decode(record.kind, record.payload) {
                Ok(event) => events.push(event),
                Err(err) => tracing::warn!(offset = record.offset, %err, "malformed readback"),
            }
        }
        self.readback.clear();
        events
    }

    /// Frames the graphics thread has started so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.signal.current()
    }

    /// Blocks until the graphics thread starts a frame after `last_seen`.
    pub fn wait_next_frame(&self, last_seen: u64) -> u64 {
        self.signal.wait_next_frame(last_seen)
    }

    /// The shared frame signal.
    #[must_use]
    pub fn frame_signal(&self) -> &Arc<FrameSignal> {
        &self.signal
    }
}
