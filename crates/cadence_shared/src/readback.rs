//! Graphics→control readback protocol.
//!
//! Same record framing as the command protocol, travelling the other way.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::id::SgId;
use crate::protocol::split;

/// Kind tag for readback records.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadbackKind {
    /// Pixels of a texture requested with `CopyTextureToCpu`.
    TextureData = 1,
}

impl TryFrom<u32> for ReadbackKind {
    type Error = ProtocolError;

    fn try_from(value: u32) -> ProtocolResult<Self> {
        match value {
            1 => Ok(Self::TextureData),
            other => Err(ProtocolError::UnknownKind(other)),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct TextureDataWire {
    texture: u64,
    width: u32,
    height: u32,
}

/// A completed graphics-side request, owned by the control side once read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadbackEvent {
    /// Texture pixels are ready.
    TextureData {
        /// Texture that was read.
        texture: SgId,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// RGBA8 bytes, row-major.
        pixels: Vec<u8>,
    },
}

impl ReadbackEvent {
    /// The kind tag for this event.
    #[must_use]
    pub const fn kind(&self) -> ReadbackKind {
        match self {
            Self::TextureData { .. } => ReadbackKind::TextureData,
        }
    }

    /// Serializes the event as header plus trailer parts.
    pub fn write_parts<R>(&self, sink: impl FnOnce(u32, &[&[u8]]) -> R) -> R {
        match self {
            Self::TextureData {
                texture,
                width,
                height,
                pixels,
            } => {
                let wire = TextureDataWire {
                    texture: texture.0,
                    width: *width,
                    height: *height,
                };
                sink(
                    ReadbackKind::TextureData as u32,
                    &[bytemuck::bytes_of(&wire), pixels.as_slice()],
                )
            }
        }
    }

    /// Parses a readback record, copying the pixels out.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] for unknown kinds or short payloads.
    pub fn decode(kind: u32, payload: &[u8]) -> ProtocolResult<Self> {
        match ReadbackKind::try_from(kind)? {
            ReadbackKind::TextureData => {
                let (wire, pixels) = split::<TextureDataWire>("TextureData", payload)?;
                Ok(Self::TextureData {
                    texture: SgId(wire.texture),
                    width: wire.width,
                    height: wire.height,
                    pixels: pixels.to_vec(),
                })
            }
        }
    }
}
