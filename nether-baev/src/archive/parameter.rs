//! Tagged event parameters

use serde::{Deserialize, Serialize};

use crate::parameter_codes;

/// Event parameter value.
///
/// The tree form keeps the variant explicit (`{"kind": "vec3", "value": [x, y, z]}`)
/// so a vector is never confused with a list of floats. Floats are bit-exact in
/// that form and compare by bit pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Parameter {
    /// Type code 0
    U32(u32),
    /// Type code 1
    F32(#[serde(with = "super::float")] f32),
    /// Type code 3
    Vec3(#[serde(with = "super::float::vec3")] [f32; 3]),
    /// Type code 5
    String(String),
}

impl Parameter {
    /// On-disk type code
    pub fn code(&self) -> u32 {
        match self {
            Self::U32(_) => parameter_codes::U32,
            Self::F32(_) => parameter_codes::F32,
            Self::Vec3(_) => parameter_codes::VEC3,
            Self::String(_) => parameter_codes::STRING,
        }
    }

    /// Payload size following the 8-byte type header
    pub fn payload_size(&self) -> usize {
        match self {
            Self::U32(_) | Self::F32(_) => 4,
            Self::Vec3(_) => 12,
            Self::String(_) => 8,
        }
    }

    /// Size of the parameter record, padded to 8 bytes
    pub fn record_size(&self) -> usize {
        crate::align_up(8 + self.payload_size(), 8)
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::U32(a), Self::U32(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a.to_bits() == b.to_bits(),
            (Self::Vec3(a), Self::Vec3(b)) => a.map(f32::to_bits) == b.map(f32::to_bits),
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }
}
