//! Error types for the scene crate.

use cadence_shared::{ProtocolError, SgId};
use thiserror::Error;

use crate::component::ComponentKind;

/// Errors raised by the component table and the command interpreter.
///
/// None of these are fatal. The interpreter logs them and moves on to the
/// next command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// No live component has this ID (never created, or already destroyed).
    #[error("component {0} not found")]
    NotFound(SgId),

    /// The ID exists but names a different kind of component.
    #[error("component {id} is a {found}, expected {expected}")]
    WrongKind {
        /// Offending ID.
        id: SgId,
        /// What the operation needed.
        expected: &'static str,
        /// What the table holds.
        found: ComponentKind,
    },

    /// A create command reused a live ID.
    #[error("component {0} already exists")]
    DuplicateId(SgId),

    /// NULL was passed where a real ID is required.
    #[error("NULL component ID")]
    NullId,

    /// Attaching would make a node its own ancestor.
    #[error("attaching {child} under {parent} would create a cycle")]
    CycleDetected {
        /// Requested parent.
        parent: SgId,
        /// Requested child.
        child: SgId,
    },

    /// The node is not a child of the given parent.
    #[error("{child} is not a child of {parent}")]
    NotAChild {
        /// Named parent.
        parent: SgId,
        /// Named child.
        child: SgId,
    },

    /// Vertex attribute slot or shape is invalid.
    #[error(
        "invalid vertex attribute on {geometry}: location {location}, \
         {num_components} components, {len} floats"
    )]
    InvalidVertexAttribute {
        /// Target geometry.
        geometry: SgId,
        /// Requested slot.
        location: u32,
        /// Floats per vertex.
        num_components: u32,
        /// Floats supplied.
        len: usize,
    },

    /// Uniform slot out of range.
    #[error("uniform slot {slot} out of range on {material}")]
    InvalidUniformSlot {
        /// Target material.
        material: SgId,
        /// Requested slot.
        slot: u32,
    },

    /// Pixel data does not match the texture's dimensions.
    #[error("texture {texture} expects {expected} bytes, got {actual}")]
    TextureSizeMismatch {
        /// Target texture.
        texture: SgId,
        /// `width * height * 4`.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },

    /// The record could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;
