//! Control→graphics command protocol.
//!
//! Every record is a fixed `#[repr(C)]` struct, optionally followed by one or
//! two variable-length trailers (a name, vertex data, pixels).
//!
//! ```text
//! SetPosition        [ id u64 | xyz f32x3 | pad u32 ]
//! SetVertexAttribute [ geometry u64 | location u32 | components u32 ] [ f32 ... ]
//! CreateShader       [ id u64 | vertex_len u32 | fragment_len u32 ] [ vertex ][ fragment ]
//! ```

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::id::SgId;

/// Command kind tag stored in each record header.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// Create a bare transform node.
    CreateTransform = 1,
    /// Rename any component.
    SetName = 2,
    /// Destroy any component.
    Destroy = 3,
    /// Attach a child under a parent.
    AddChild = 4,
    /// Detach a child from a parent.
    RemoveChild = 5,
    /// Detach every child of a parent.
    RemoveAllChildren = 6,
    /// Move a node under a new parent, or to the root with NULL.
    Reparent = 7,
    /// Set local translation.
    SetPosition = 8,
    /// Set local rotation.
    SetRotation = 9,
    /// Set local scale.
    SetScale = 10,
    /// Create an empty geometry.
    CreateGeometry = 11,
    /// Replace one vertex attribute array.
    SetVertexAttribute = 12,
    /// Replace the index array.
    SetIndices = 13,
    /// Override the vertex draw count.
    SetVertexCount = 14,
    /// Override the index draw count.
    SetIndicesCount = 15,
    /// Create a shader from source text.
    CreateShader = 16,
    /// Create a material bound to a shader.
    CreateMaterial = 17,
    /// Write one vec4 uniform slot.
    SetMaterialUniform = 18,
    /// Create a mesh (transform + geometry + material).
    CreateMesh = 19,
    /// Rebind a mesh's geometry and material.
    UpdateMesh = 20,
    /// Create an RGBA8 texture.
    CreateTexture = 21,
    /// Replace a texture's pixels.
    TextureWrite = 22,
    /// Request the texture's pixels on the readback queue.
    CopyTextureToCpu = 23,
}

impl CommandKind {
    /// Short name for logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateTransform => "CreateTransform",
            Self::SetName => "SetName",
            Self::Destroy => "Destroy",
            Self::AddChild => "AddChild",
            Self::RemoveChild => "RemoveChild",
            Self::RemoveAllChildren => "RemoveAllChildren",
            Self::Reparent => "Reparent",
            Self::SetPosition => "SetPosition",
            Self::SetRotation => "SetRotation",
            Self::SetScale => "SetScale",
            Self::CreateGeometry => "CreateGeometry",
            Self::SetVertexAttribute => "SetVertexAttribute",
            Self::SetIndices => "SetIndices",
            Self::SetVertexCount => "SetVertexCount",
            Self::SetIndicesCount => "SetIndicesCount",
            Self::CreateShader => "CreateShader",
            Self::CreateMaterial => "CreateMaterial",
            Self::SetMaterialUniform => "SetMaterialUniform",
            Self::CreateMesh => "CreateMesh",
            Self::UpdateMesh => "UpdateMesh",
            Self::CreateTexture => "CreateTexture",
            Self::TextureWrite => "TextureWrite",
            Self::CopyTextureToCpu => "CopyTextureToCpu",
        }
    }
}

impl TryFrom<u32> for CommandKind {
    type Error = ProtocolError;

    fn try_from(value: u32) -> ProtocolResult<Self> {
        Ok(match value {
            1 => Self::CreateTransform,
            2 => Self::SetName,
            3 => Self::Destroy,
            4 => Self::AddChild,
            5 => Self::RemoveChild,
            6 => Self::RemoveAllChildren,
            7 => Self::Reparent,
            8 => Self::SetPosition,
            9 => Self::SetRotation,
            10 => Self::SetScale,
            11 => Self::CreateGeometry,
            12 => Self::SetVertexAttribute,
            13 => Self::SetIndices,
            14 => Self::SetVertexCount,
            15 => Self::SetIndicesCount,
            16 => Self::CreateShader,
            17 => Self::CreateMaterial,
            18 => Self::SetMaterialUniform,
            19 => Self::CreateMesh,
            20 => Self::UpdateMesh,
            21 => Self::CreateTexture,
            22 => Self::TextureWrite,
            23 => Self::CopyTextureToCpu,
            other => return Err(ProtocolError::UnknownKind(other)),
        })
    }
}

// Fixed record parts. Fields are ordered so no implicit padding exists.

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct IdWire {
    id: u64,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct PairWire {
    first: u64,
    second: u64,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Vec3Wire {
    id: u64,
    value: [f32; 3],
    _pad: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct QuatWire {
    id: u64,
    value: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct VertexAttributeWire {
    geometry: u64,
    location: u32,
    num_components: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CountWire {
    geometry: u64,
    count: i32,
    _pad: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ShaderWire {
    id: u64,
    vertex_len: u32,
    fragment_len: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct UniformWire {
    material: u64,
    slot: u32,
    _pad: u32,
    value: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct MeshWire {
    mesh: u64,
    geometry: u64,
    material: u64,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct TextureWire {
    id: u64,
    width: u32,
    height: u32,
}

/// A decoded control→graphics command.
///
/// Text and pixel trailers borrow from the record. Numeric arrays are
/// copied out on decode because the record bytes carry no alignment.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneCommand<'a> {
    /// Create a transform node.
    CreateTransform {
        /// New ID.
        id: SgId,
        /// Display name.
        name: &'a str,
    },
    /// Rename a component.
    SetName {
        /// Target.
        id: SgId,
        /// New name.
        name: &'a str,
    },
    /// Destroy a component.
    Destroy {
        /// Target.
        id: SgId,
    },
    /// Attach `child` under `parent`.
    AddChild {
        /// New parent.
        parent: SgId,
        /// Node to attach.
        child: SgId,
    },
    /// Detach `child` from `parent`.
    RemoveChild {
        /// Current parent.
        parent: SgId,
        /// Node to detach.
        child: SgId,
    },
    /// Detach every child of `parent`.
    RemoveAllChildren {
        /// Parent to empty.
        parent: SgId,
    },
    /// Move `child` under `parent`. NULL parent makes it a root.
    Reparent {
        /// Node to move.
        child: SgId,
        /// New parent or NULL.
        parent: SgId,
    },
    /// Set local translation.
    SetPosition {
        /// Target transform.
        id: SgId,
        /// Local position.
        position: Vec3,
    },
    /// Set local rotation.
    SetRotation {
        /// Target transform.
        id: SgId,
        /// Local rotation.
        rotation: Quat,
    },
    /// Set local scale.
    SetScale {
        /// Target transform.
        id: SgId,
        /// Local scale.
        scale: Vec3,
    },
    /// Create an empty geometry.
    CreateGeometry {
        /// New ID.
        id: SgId,
        /// Display name.
        name: &'a str,
    },
    /// Replace one vertex attribute array.
    SetVertexAttribute {
        /// Target geometry.
        geometry: SgId,
        /// Attribute slot.
        location: u32,
        /// Floats per vertex.
        num_components: u32,
        /// Interleaving-free attribute data.
        data: Cow<'a, [f32]>,
    },
    /// Replace the index array.
    SetIndices {
        /// Target geometry.
        geometry: SgId,
        /// Triangle indices.
        indices: Cow<'a, [u32]>,
    },
    /// Override the vertex draw count (`-1` derives it from data).
    SetVertexCount {
        /// Target geometry.
        geometry: SgId,
        /// Count override.
        count: i32,
    },
    /// Override the index draw count (`-1` derives it from data).
    SetIndicesCount {
        /// Target geometry.
        geometry: SgId,
        /// Count override.
        count: i32,
    },
    /// Create a shader.
    CreateShader {
        /// New ID.
        id: SgId,
        /// Vertex stage source.
        vertex: &'a str,
        /// Fragment stage source.
        fragment: &'a str,
    },
    /// Create a material.
    CreateMaterial {
        /// New ID.
        id: SgId,
        /// Shader the material renders with (may be NULL).
        shader: SgId,
        /// Display name.
        name: &'a str,
    },
    /// Write one uniform slot.
    SetMaterialUniform {
        /// Target material.
        material: SgId,
        /// Slot index.
        slot: u32,
        /// Value.
        value: Vec4,
    },
    /// Create a mesh.
    CreateMesh {
        /// New ID.
        id: SgId,
        /// Geometry to draw (may be NULL).
        geometry: SgId,
        /// Material to draw with (may be NULL).
        material: SgId,
        /// Display name.
        name: &'a str,
    },
    /// Rebind a mesh. Creates the mesh if it does not exist yet.
    UpdateMesh {
        /// Target mesh.
        mesh: SgId,
        /// New geometry (may be NULL).
        geometry: SgId,
        /// New material (may be NULL).
        material: SgId,
    },
    /// Create an RGBA8 texture.
    CreateTexture {
        /// New ID.
        id: SgId,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Display name.
        name: &'a str,
    },
    /// Replace a texture's pixels.
    TextureWrite {
        /// Target texture.
        texture: SgId,
        /// RGBA8 bytes.
        pixels: &'a [u8],
    },
    /// Ask for the texture's pixels on the readback queue.
    CopyTextureToCpu {
        /// Target texture.
        texture: SgId,
    },
}

impl<'a> SceneCommand<'a> {
    /// The kind tag for this command.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::CreateTransform { .. } => CommandKind::CreateTransform,
            Self::SetName { .. } => CommandKind::SetName,
            Self::Destroy { .. } => CommandKind::Destroy,
            Self::AddChild { .. } => CommandKind::AddChild,
            Self::RemoveChild { .. } => CommandKind::RemoveChild,
            Self::RemoveAllChildren { .. } => CommandKind::RemoveAllChildren,
            Self::Reparent { .. } => CommandKind::Reparent,
            Self::SetPosition { .. } => CommandKind::SetPosition,
            Self::SetRotation { .. } => CommandKind::SetRotation,
            Self::SetScale { .. } => CommandKind::SetScale,
            Self::CreateGeometry { .. } => CommandKind::CreateGeometry,
            Self::SetVertexAttribute { .. } => CommandKind::SetVertexAttribute,
            Self::SetIndices { .. } => CommandKind::SetIndices,
            Self::SetVertexCount { .. } => CommandKind::SetVertexCount,
            Self::SetIndicesCount { .. } => CommandKind::SetIndicesCount,
            Self::CreateShader { .. } => CommandKind::CreateShader,
            Self::CreateMaterial { .. } => CommandKind::CreateMaterial,
            Self::SetMaterialUniform { .. } => CommandKind::SetMaterialUniform,
            Self::CreateMesh { .. } => CommandKind::CreateMesh,
            Self::UpdateMesh { .. } => CommandKind::UpdateMesh,
            Self::CreateTexture { .. } => CommandKind::CreateTexture,
            Self::TextureWrite { .. } => CommandKind::TextureWrite,
            Self::CopyTextureToCpu { .. } => CommandKind::CopyTextureToCpu,
        }
    }

    /// Serializes the command without allocating.
    ///
    /// `sink` receives the kind tag and the payload as consecutive parts,
    /// ready for `CommandWriter::push_parts`.
    pub fn write_parts<R>(&self, sink: impl FnOnce(u32, &[&[u8]]) -> R) -> R {
        use bytemuck::bytes_of;

        let kind = self.kind() as u32;
        match self {
            Self::CreateTransform { id, name }
            | Self::SetName { id, name }
            | Self::CreateGeometry { id, name } => {
                sink(kind, &[bytes_of(&IdWire { id: id.0 }), name.as_bytes()])
            }
            Self::Destroy { id }
            | Self::RemoveAllChildren { parent: id }
            | Self::CopyTextureToCpu { texture: id } => sink(kind, &[bytes_of(&IdWire { id: id.0 })]),
            Self::AddChild { parent, child } | Self::RemoveChild { parent, child } => {
                let wire = PairWire {
                    first: parent.0,
                    second: child.0,
                };
                sink(kind, &[bytes_of(&wire)])
            }
            Self::Reparent { child, parent } => {
                let wire = PairWire {
                    first: child.0,
                    second: parent.0,
                };
                sink(kind, &[bytes_of(&wire)])
            }
            Self::SetPosition { id, position: value } | Self::SetScale { id, scale: value } => {
                let wire = Vec3Wire {
                    id: id.0,
                    value: value.to_array(),
                    _pad: 0,
                };
                sink(kind, &[bytes_of(&wire)])
            }
            Self::SetRotation { id, rotation } => {
                let wire = QuatWire {
                    id: id.0,
                    value: rotation.to_array(),
                };
                sink(kind, &[bytes_of(&wire)])
            }
            Self::SetVertexAttribute {
                geometry,
                location,
                num_components,
                data,
            } => {
                let wire = VertexAttributeWire {
                    geometry: geometry.0,
                    location: *location,
                    num_components: *num_components,
                };
                sink(kind, &[bytes_of(&wire), bytemuck::cast_slice::<f32, u8>(data)])
            }
            Self::SetIndices { geometry, indices } => sink(
                kind,
                &[
                    bytes_of(&IdWire { id: geometry.0 }),
                    bytemuck::cast_slice::<u32, u8>(indices),
                ],
            ),
            Self::SetVertexCount { geometry, count } | Self::SetIndicesCount { geometry, count } => {
                let wire = CountWire {
                    geometry: geometry.0,
                    count: *count,
                    _pad: 0,
                };
                sink(kind, &[bytes_of(&wire)])
            }
            Self::CreateShader {
                id,
                vertex,
                fragment,
            } => {
                let wire = ShaderWire {
                    id: id.0,
                    vertex_len: u32::try_from(vertex.len()).unwrap_or(u32::MAX),
                    fragment_len: u32::try_from(fragment.len()).unwrap_or(u32::MAX),
                };
                sink(
                    kind,
                    &[bytes_of(&wire), vertex.as_bytes(), fragment.as_bytes()],
                )
            }
            Self::CreateMaterial { id, shader, name } => {
                let wire = PairWire {
                    first: id.0,
                    second: shader.0,
                };
                sink(kind, &[bytes_of(&wire), name.as_bytes()])
            }
            Self::SetMaterialUniform {
                material,
                slot,
                value,
            } => {
                let wire = UniformWire {
                    material: material.0,
                    slot: *slot,
                    _pad: 0,
                    value: value.to_array(),
                };
                sink(kind, &[bytes_of(&wire)])
            }
            Self::CreateMesh {
                id,
                geometry,
                material,
                name,
            } => {
                let wire = MeshWire {
                    mesh: id.0,
                    geometry: geometry.0,
                    material: material.0,
                };
                sink(kind, &[bytes_of(&wire), name.as_bytes()])
            }
            Self::UpdateMesh {
                mesh,
                geometry,
                material,
            } => {
                let wire = MeshWire {
                    mesh: mesh.0,
                    geometry: geometry.0,
                    material: material.0,
                };
                sink(kind, &[bytes_of(&wire)])
            }
            Self::CreateTexture {
                id,
                width,
                height,
                name,
            } => {
                let wire = TextureWire {
                    id: id.0,
                    width: *width,
                    height: *height,
                };
                sink(kind, &[bytes_of(&wire), name.as_bytes()])
            }
            Self::TextureWrite { texture, pixels } => {
                sink(kind, &[bytes_of(&IdWire { id: texture.0 }), *pixels])
            }
        }
    }

    /// Parses a record payload.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] for unknown kinds, short payloads,
    /// ragged numeric trailers or non-UTF-8 text.
    pub fn decode(kind: u32, payload: &'a [u8]) -> ProtocolResult<Self> {
        let kind = CommandKind::try_from(kind)?;
        let name = kind.name();

        Ok(match kind {
            CommandKind::CreateTransform | CommandKind::SetName | CommandKind::CreateGeometry => {
                let (wire, tail) = split::<IdWire>(name, payload)?;
                let id = SgId(wire.id);
                let text = text(name, tail)?;
                match kind {
                    CommandKind::CreateTransform => Self::CreateTransform { id, name: text },
                    CommandKind::SetName => Self::SetName { id, name: text },
                    _ => Self::CreateGeometry { id, name: text },
                }
            }
            CommandKind::Destroy => Self::Destroy {
                id: SgId(split::<IdWire>(name, payload)?.0.id),
            },
            CommandKind::RemoveAllChildren => Self::RemoveAllChildren {
                parent: SgId(split::<IdWire>(name, payload)?.0.id),
            },
            CommandKind::CopyTextureToCpu => Self::CopyTextureToCpu {
                texture: SgId(split::<IdWire>(name, payload)?.0.id),
            },
            CommandKind::AddChild => {
                let (wire, _) = split::<PairWire>(name, payload)?;
                Self::AddChild {
                    parent: SgId(wire.first),
                    child: SgId(wire.second),
                }
            }
            CommandKind::RemoveChild => {
                let (wire, _) = split::<PairWire>(name, payload)?;
                Self::RemoveChild {
                    parent: SgId(wire.first),
                    child: SgId(wire.second),
                }
            }
            CommandKind::Reparent => {
                let (wire, _) = split::<PairWire>(name, payload)?;
                Self::Reparent {
                    child: SgId(wire.first),
                    parent: SgId(wire.second),
                }
            }
            CommandKind::SetPosition => {
                let (wire, _) = split::<Vec3Wire>(name, payload)?;
                Self::SetPosition {
                    id: SgId(wire.id),
                    position: Vec3::from_array(wire.value),
                }
            }
            CommandKind::SetScale => {
                let (wire, _) = split::<Vec3Wire>(name, payload)?;
                Self::SetScale {
                    id: SgId(wire.id),
                    scale: Vec3::from_array(wire.value),
                }
            }
            CommandKind::SetRotation => {
                let (wire, _) = split::<QuatWire>(name, payload)?;
                Self::SetRotation {
                    id: SgId(wire.id),
                    rotation: Quat::from_array(wire.value),
                }
            }
            CommandKind::SetVertexAttribute => {
                let (wire, tail) = split::<VertexAttributeWire>(name, payload)?;
                Self::SetVertexAttribute {
                    geometry: SgId(wire.geometry),
                    location: wire.location,
                    num_components: wire.num_components,
                    data: Cow::Owned(elements(name, tail)?),
                }
            }
            CommandKind::SetIndices => {
                let (wire, tail) = split::<IdWire>(name, payload)?;
                Self::SetIndices {
                    geometry: SgId(wire.id),
                    indices: Cow::Owned(elements(name, tail)?),
                }
            }
            CommandKind::SetVertexCount => {
                let (wire, _) = split::<CountWire>(name, payload)?;
                Self::SetVertexCount {
                    geometry: SgId(wire.geometry),
                    count: wire.count,
                }
            }
            CommandKind::SetIndicesCount => {
                let (wire, _) = split::<CountWire>(name, payload)?;
                Self::SetIndicesCount {
                    geometry: SgId(wire.geometry),
                    count: wire.count,
                }
            }
            CommandKind::CreateShader => {
                let (wire, tail) = split::<ShaderWire>(name, payload)?;
                let vertex_len = wire.vertex_len as usize;
                let fragment_len = wire.fragment_len as usize;
                let expected = vertex_len + fragment_len;
                if tail.len() < expected {
                    return Err(ProtocolError::Truncated {
                        kind: name,
                        expected: std::mem::size_of::<ShaderWire>() + expected,
                        actual: payload.len(),
                    });
                }
                let (vertex, rest) = tail.split_at(vertex_len);
                Self::CreateShader {
                    id: SgId(wire.id),
                    vertex: text(name, vertex)?,
                    fragment: text(name, &rest[..fragment_len])?,
                }
            }
            CommandKind::CreateMaterial => {
                let (wire, tail) = split::<PairWire>(name, payload)?;
                Self::CreateMaterial {
                    id: SgId(wire.first),
                    shader: SgId(wire.second),
                    name: text(name, tail)?,
                }
            }
            CommandKind::SetMaterialUniform => {
                let (wire, _) = split::<UniformWire>(name, payload)?;
                Self::SetMaterialUniform {
                    material: SgId(wire.material),
                    slot: wire.slot,
                    value: Vec4::from_array(wire.value),
                }
            }
            CommandKind::CreateMesh => {
                let (wire, tail) = split::<MeshWire>(name, payload)?;
                Self::CreateMesh {
                    id: SgId(wire.mesh),
                    geometry: SgId(wire.geometry),
                    material: SgId(wire.material),
                    name: text(name, tail)?,
                }
            }
            CommandKind::UpdateMesh => {
                let (wire, _) = split::<MeshWire>(name, payload)?;
                Self::UpdateMesh {
                    mesh: SgId(wire.mesh),
                    geometry: SgId(wire.geometry),
                    material: SgId(wire.material),
                }
            }
            CommandKind::CreateTexture => {
                let (wire, tail) = split::<TextureWire>(name, payload)?;
                Self::CreateTexture {
                    id: SgId(wire.id),
                    width: wire.width,
                    height: wire.height,
                    name: text(name, tail)?,
                }
            }
            CommandKind::TextureWrite => {
                let (wire, tail) = split::<IdWire>(name, payload)?;
                Self::TextureWrite {
                    texture: SgId(wire.id),
                    pixels: tail,
                }
            }
        })
    }
}

/// Reads the fixed struct at the front of `payload`.
pub(crate) fn split<'p, T: Pod>(kind: &'static str, payload: &'p [u8]) -> ProtocolResult<(T, &'p [u8])> {
    let size = std::mem::size_of::<T>();
    if payload.len() < size {
        return Err(ProtocolError::Truncated {
            kind,
            expected: size,
            actual: payload.len(),
        });
    }
    let (head, tail) = payload.split_at(size);
    Ok((bytemuck::pod_read_unaligned(head), tail))
}

fn text<'p>(kind: &'static str, bytes: &'p [u8]) -> ProtocolResult<&'p str> {
    std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8 { kind })
}

fn elements<T: Pod>(kind: &'static str, bytes: &[u8]) -> ProtocolResult<Vec<T>> {
    let element = std::mem::size_of::<T>();
    if bytes.len() % element != 0 {
        return Err(ProtocolError::Misaligned {
            kind,
            len: bytes.len(),
            element,
        });
    }
    Ok(bytemuck::pod_collect_to_vec(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(command: &SceneCommand<'_>) -> (u32, Vec<u8>) {
        command.write_parts(|kind, parts| (kind, parts.concat()))
    }

    #[test]
    fn test_kind_tags_are_stable() {
        assert_eq!(CommandKind::CreateTransform as u32, 1);
        assert_eq!(CommandKind::CopyTextureToCpu as u32, 23);
        assert_eq!(CommandKind::try_from(19), Ok(CommandKind::CreateMesh));
        assert_eq!(CommandKind::try_from(0), Err(ProtocolError::UnknownKind(0)));
        assert_eq!(CommandKind::try_from(24), Err(ProtocolError::UnknownKind(24)));
    }

    #[test]
    fn test_wire_structs_have_no_padding() {
        assert_eq!(std::mem::size_of::<Vec3Wire>(), 24);
        assert_eq!(std::mem::size_of::<UniformWire>(), 32);
        assert_eq!(std::mem::size_of::<MeshWire>(), 24);
    }

    #[test]
    fn test_position_layout() {
        let (kind, bytes) = encode(&SceneCommand::SetPosition {
            id: SgId(3),
            position: Vec3::new(1.0, 2.0, 3.0),
        });
        assert_eq!(kind, CommandKind::SetPosition as u32);
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[..8], &3u64.to_ne_bytes());
        assert_eq!(&bytes[8..12], &1.0f32.to_ne_bytes());
    }

    #[test]
    fn test_vertex_attribute_decodes_from_unaligned_bytes() {
        let data = [0.5f32, 1.5, 2.5, 3.5, 4.5, 5.5];
        let (kind, bytes) = encode(&SceneCommand::SetVertexAttribute {
            geometry: SgId(8),
            location: 1,
            num_components: 3,
            data: Cow::Borrowed(&data),
        });

        // Shift by one byte so the floats are not 4-aligned.
        let mut shifted = vec![0u8];
        shifted.extend_from_slice(&bytes);
        let decoded = SceneCommand::decode(kind, &shifted[1..]).unwrap();

        match decoded {
            SceneCommand::SetVertexAttribute {
                geometry,
                location,
                num_components,
                data: decoded_data,
            } => {
                assert_eq!(geometry, SgId(8));
                assert_eq!(location, 1);
                assert_eq!(num_components, 3);
                assert_eq!(decoded_data.as_ref(), &data);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_shader_sources_split_correctly() {
        let (kind, bytes) = encode(&SceneCommand::CreateShader {
            id: SgId(2),
            vertex: "vs main",
            fragment: "fs",
        });
        let decoded = SceneCommand::decode(kind, &bytes).unwrap();
        assert_eq!(
            decoded,
            SceneCommand::CreateShader {
                id: SgId(2),
                vertex: "vs main",
                fragment: "fs",
            }
        );
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let err = SceneCommand::decode(CommandKind::SetRotation as u32, &[0; 10]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::Truncated {
                kind: "SetRotation",
                expected: 24,
                actual: 10,
            }
        );
    }

    #[test]
    fn test_ragged_indices_rejected() {
        let mut payload = 5u64.to_ne_bytes().to_vec();
        payload.extend_from_slice(&[1, 2, 3]);
        let err = SceneCommand::decode(CommandKind::SetIndices as u32, &payload).unwrap_err();
        assert!(matches!(err, ProtocolError::Misaligned { len: 3, element: 4, .. }));
    }

    #[test]
    fn test_invalid_name_rejected() {
        let mut payload = 5u64.to_ne_bytes().to_vec();
        payload.extend_from_slice(&[0xFF, 0xFE]);
        let err = SceneCommand::decode(CommandKind::SetName as u32, &payload).unwrap_err();
        assert_eq!(err, ProtocolError::InvalidUtf8 { kind: "SetName" });
    }
}
