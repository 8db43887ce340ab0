//! Limits shared by producer and consumer.

/// Vertex attribute slots per geometry (position, normal, uv, tangent, ...).
pub const MAX_VERTEX_ATTRIBUTES: usize = 8;

/// Longest component name in bytes. Longer names are truncated.
pub const MAX_NAME_LEN: usize = 63;

/// Uniform slots per material.
pub const MAX_UNIFORM_SLOTS: usize = 16;
