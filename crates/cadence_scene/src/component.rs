//! # Component Kinds
//!
//! The small components live here. [`Transform`] and [`Geometry`] carry
//! enough behavior to get their own modules.

use std::fmt;

use cadence_shared::{SgId, MAX_NAME_LEN, MAX_UNIFORM_SLOTS};
use glam::Vec4;

use crate::geometry::Geometry;
use crate::table::TableRecord;
use crate::transform::Transform;

/// Tag for every component kind in the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// A scene-graph node.
    Transform,
    /// A scene-graph node that draws a geometry with a material.
    Mesh,
    /// Vertex data plus the instance buffer.
    Geometry,
    /// Shader reference plus uniforms.
    Material,
    /// Shader source.
    Shader,
    /// RGBA8 image.
    Texture,
}

impl ComponentKind {
    /// Lowercase name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Transform => "transform",
            Self::Mesh => "mesh",
            Self::Geometry => "geometry",
            Self::Material => "material",
            Self::Shader => "shader",
            Self::Texture => "texture",
        }
    }

    /// True for kinds that live in the transform hierarchy.
    #[inline]
    #[must_use]
    pub const fn is_node(self) -> bool {
        matches!(self, Self::Transform | Self::Mesh)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Clamps a name to [`MAX_NAME_LEN`] bytes on a character boundary.
#[must_use]
pub fn truncate_name(name: &str) -> String {
    if name.len() <= MAX_NAME_LEN {
        return name.to_owned();
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_owned()
}

/// Shader source pair. Compilation belongs to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct Shader {
    pub(crate) id: SgId,
    pub(crate) name: String,
    /// Vertex stage source.
    pub vertex_source: String,
    /// Fragment stage source.
    pub fragment_source: String,
}

impl Shader {
    /// Creates a shader with empty sources.
    #[must_use]
    pub fn new(id: SgId, name: &str) -> Self {
        Self {
            id,
            name: truncate_name(name),
            vertex_source: String::new(),
            fragment_source: String::new(),
        }
    }
}

/// A material: which shader to draw with and its uniform values.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub(crate) id: SgId,
    pub(crate) name: String,
    /// Shader used to draw (NULL until assigned).
    pub shader: SgId,
    /// vec4 uniform slots.
    pub uniforms: [Vec4; MAX_UNIFORM_SLOTS],
    /// Set when a uniform changed since the renderer last looked.
    pub uniforms_dirty: bool,
}

impl Material {
    /// Creates a material with zeroed uniforms.
    #[must_use]
    pub fn new(id: SgId, name: &str) -> Self {
        Self {
            id,
            name: truncate_name(name),
            shader: SgId::NULL,
            uniforms: [Vec4::ZERO; MAX_UNIFORM_SLOTS],
            uniforms_dirty: false,
        }
    }
}

/// An RGBA8 texture held on the CPU side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    pub(crate) id: SgId,
    pub(crate) name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 bytes, `width * height * 4` long.
    pub pixels: Vec<u8>,
    /// Set when pixels changed since the renderer last uploaded.
    pub upload_pending: bool,
}

impl Texture {
    /// Bytes per pixel.
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Creates a transparent-black texture.
    #[must_use]
    pub fn new(id: SgId, name: &str, width: u32, height: u32) -> Self {
        let len = Self::byte_len(width, height);
        Self {
            id,
            name: truncate_name(name),
            width,
            height,
            pixels: vec![0; len],
            upload_pending: true,
        }
    }

    /// Size in bytes of a `width` x `height` image.
    #[inline]
    #[must_use]
    pub const fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * Self::BYTES_PER_PIXEL
    }
}

macro_rules! impl_record {
    ($($ty:ty),*) => {
        $(
            impl TableRecord for $ty {
                #[inline]
                fn id(&self) -> SgId {
                    self.id
                }

                #[inline]
                fn name(&self) -> &str {
                    &self.name
                }

                fn set_name(&mut self, name: &str) {
                    self.name = truncate_name(name);
                }
            }
        )*
    };
}

impl_record!(Transform, Geometry, Material, Shader, Texture);

/// Borrowed view of any component, returned by
/// [`ComponentManager::get`](crate::ComponentManager::get).
#[derive(Clone, Copy, Debug)]
pub enum ComponentRef<'a> {
    /// A plain node.
    Transform(&'a Transform),
    /// A node with a mesh binding.
    Mesh(&'a Transform),
    /// Geometry.
    Geometry(&'a Geometry),
    /// Material.
    Material(&'a Material),
    /// Shader.
    Shader(&'a Shader),
    /// Texture.
    Texture(&'a Texture),
}

impl<'a> ComponentRef<'a> {
    /// Kind of the referenced component.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Transform(_) => ComponentKind::Transform,
            Self::Mesh(_) => ComponentKind::Mesh,
            Self::Geometry(_) => ComponentKind::Geometry,
            Self::Material(_) => ComponentKind::Material,
            Self::Shader(_) => ComponentKind::Shader,
            Self::Texture(_) => ComponentKind::Texture,
        }
    }

    fn record(&self) -> &'a dyn TableRecord {
        match *self {
            Self::Transform(t) | Self::Mesh(t) => t as &dyn TableRecord,
            Self::Geometry(g) => g as &dyn TableRecord,
            Self::Material(m) => m as &dyn TableRecord,
            Self::Shader(s) => s as &dyn TableRecord,
            Self::Texture(t) => t as &dyn TableRecord,
        }
    }

    /// ID of the referenced component.
    #[must_use]
    pub fn id(&self) -> SgId {
        self.record().id()
    }

    /// Name of the referenced component.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.record().name()
    }

    /// The node, if this is a transform or mesh.
    #[must_use]
    pub const fn as_transform(&self) -> Option<&'a Transform> {
        match *self {
            Self::Transform(t) | Self::Mesh(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names_untouched() {
        assert_eq!(truncate_name("cube"), "cube");
        assert_eq!(truncate_name(""), "");
    }

    #[test]
    fn test_long_names_truncated_on_char_boundary() {
        let ascii = "x".repeat(100);
        assert_eq!(truncate_name(&ascii).len(), MAX_NAME_LEN);

        // 'é' is two bytes; 32 of them straddle the limit.
        let accented = "é".repeat(32);
        let clamped = truncate_name(&accented);
        assert_eq!(clamped.len(), 62);
        assert!(clamped.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_texture_starts_zeroed() {
        let texture = Texture::new(SgId(1), "t", 4, 2);
        assert_eq!(texture.pixels.len(), 32);
        assert!(texture.pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ComponentKind::Mesh.to_string(), "mesh");
        assert!(ComponentKind::Mesh.is_node());
        assert!(!ComponentKind::Texture.is_node());
    }
}
