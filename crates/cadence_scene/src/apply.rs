//! # Command Application
//!
//! Turns drained records into table mutations. This is the only code that
//! writes to the [`ComponentManager`].
//!
//! Failures are per command. A command naming a destroyed component is
//! expected (the producer can race a destroy), so it is logged and
//! skipped and the drain carries on.

use cadence_core::{CommandReader, CommandWriter};
use cadence_shared::{ReadbackEvent, SceneCommand};

use crate::component::ComponentKind;
use crate::error::{SceneError, SceneResult};
use crate::manager::ComponentManager;

/// Outcome counts for one drain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Commands applied.
    pub applied: usize,
    /// Commands that decoded but were rejected (unknown ID, cycle, ...).
    pub rejected: usize,
    /// Records that failed to decode.
    pub malformed: usize,
    /// Readback events pushed to the graphics→control queue.
    pub readbacks: usize,
}

impl ApplyReport {
    /// Every record seen.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.applied + self.rejected + self.malformed
    }
}

/// Applies one decoded command.
///
/// `readback` receives replies for commands that ask for data back.
///
/// Returns true if a readback event was pushed.
///
/// # Errors
///
/// Any [`crate::SceneError`] raised by the mutation. The table is
/// unchanged when an error is returned.
pub fn apply_command(
    scene: &mut ComponentManager,
    command: &SceneCommand<'_>,
    readback: &CommandWriter,
) -> SceneResult<bool> {
    match command {
        SceneCommand::CreateTransform { id, name } => {
            scene.insert(ComponentKind::Transform, *id, name)?;
        }
        SceneCommand::SetName { id, name } => scene.set_name(*id, name)?,
        SceneCommand::Destroy { id } => {
            scene.destroy(*id)?;
        }
        SceneCommand::AddChild { parent, child } => scene.add_child(*parent, *child)?,
        SceneCommand::RemoveChild { parent, child } => scene.remove_child(*parent, *child)?,
        SceneCommand::RemoveAllChildren { parent } => {
            scene.remove_all_children(*parent)?;
        }
        SceneCommand::Reparent { child, parent } => scene.reparent(*child, parent.non_null())?,
        SceneCommand::SetPosition { id, position } => scene.set_position(*id, *position)?,
        SceneCommand::SetRotation { id, rotation } => scene.set_rotation(*id, *rotation)?,
        SceneCommand::SetScale { id, scale } => scene.set_scale(*id, *scale)?,
        SceneCommand::CreateGeometry { id, name } => {
            scene.insert(ComponentKind::Geometry, *id, name)?;
        }
        SceneCommand::SetVertexAttribute {
            geometry,
            location,
            num_components,
            data,
        } => scene.set_vertex_attribute(*geometry, *location, *num_components, data)?,
        SceneCommand::SetIndices { geometry, indices } => scene.set_indices(*geometry, indices)?,
        SceneCommand::SetVertexCount { geometry, count } => {
            scene.set_vertex_count(*geometry, *count)?;
        }
        SceneCommand::SetIndicesCount { geometry, count } => {
            scene.set_indices_count(*geometry, *count)?;
        }
        SceneCommand::CreateShader {
            id,
            vertex,
            fragment,
        } => {
            scene.insert(ComponentKind::Shader, *id, "shader")?;
            let shader = scene.shader_mut(*id)?;
            shader.vertex_source = (*vertex).to_owned();
            shader.fragment_source = (*fragment).to_owned();
        }
        SceneCommand::CreateMaterial { id, shader, name } => {
            if !shader.is_null() {
                scene.shader(*shader)?;
            }
            scene.insert(ComponentKind::Material, *id, name)?;
            scene.set_material_shader(*id, *shader)?;
        }
        SceneCommand::SetMaterialUniform {
            material,
            slot,
            value,
        } => scene.set_material_uniform(*material, *slot, *value)?,
        SceneCommand::CreateMesh {
            id,
            geometry,
            material,
            name,
        } => {
            if scene.contains(*id) {
                return Err(SceneError::DuplicateId(*id));
            }
            scene.update_mesh(*id, *geometry, *material)?;
            scene.set_name(*id, name)?;
        }
        SceneCommand::UpdateMesh {
            mesh,
            geometry,
            material,
        } => scene.update_mesh(*mesh, *geometry, *material)?,
        SceneCommand::CreateTexture {
            id,
            width,
            height,
            name,
        } => {
            scene.insert(ComponentKind::Texture, *id, name)?;
            scene.resize_texture(*id, *width, *height)?;
        }
        SceneCommand::TextureWrite { texture, pixels } => scene.write_texture(*texture, pixels)?,
        SceneCommand::CopyTextureToCpu { texture } => {
            let source = scene.texture(*texture)?;
            let event = ReadbackEvent::TextureData {
                texture: *texture,
                width: source.width,
                height: source.height,
                pixels: source.pixels.clone(),
            };
            event.write_parts(|kind, parts| readback.push_parts(kind, parts));
            return Ok(true);
        }
    }
    Ok(false)
}

/// Decodes and applies every record on the read side, in push order.
///
/// Does not clear the reader; the caller does that once it is done with
/// the records.
pub fn drain_commands(
    scene: &mut ComponentManager,
    reader: &CommandReader,
    readback: &CommandWriter,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    for record in reader.records() {
        let command = match SceneCommand::decode(record.kind, record.payload) {
            Ok(command) => command,
            Err(err) => {
                tracing::warn!(offset = record.offset, kind = record.kind, %err, "malformed command");
                report.malformed += 1;
                continue;
            }
        };

        match apply_command(scene, &command, readback) {
            Ok(pushed_readback) => {
                report.applied += 1;
                if pushed_readback {
                    report.readbacks += 1;
                }
            }
            Err(err) => {
                tracing::warn!(kind = command.kind().name(), %err, "command skipped");
                report.rejected += 1;
            }
        }
    }

    tracing::debug!(
        applied = report.applied,
        rejected = report.rejected,
        malformed = report.malformed,
        "commands drained"
    );
    report
}
