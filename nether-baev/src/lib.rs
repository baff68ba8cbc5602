//! Nether-BAEV: BAEV (animation event archive) parser and writer for Nethercore
//!
//! This crate provides a pure Rust decoder and encoder for the binary animation
//! event archive container used by the asset pipeline. Archives map hashed
//! animation names to nodes, each node holding named events that fire at a
//! frame (triggers) or span a frame interval (holds), with typed parameters.
//!
//! # Key Features
//!
//! - **Strict decoding**: magic tags, array strides and declared file size are validated
//! - **Two-pass encoder**: layout computed first, then emitted at known offsets
//! - **Deduplicated strings**: a content-addressed string pool shared by the whole file
//! - **JSON projection**: lossless tree form with explicitly tagged parameters
//!
//! # BAEV Format Overview
//!
//! BAEV files contain:
//! - File header (`BFFH`) with a section table (`BFSI` entries) and a free-text annotation
//! - Container with a version, the event info buckets and the global node table
//! - Event info buckets: hash key + indices into the node table
//! - Nodes: hash key + event array
//! - Events: name + trigger array + hold array
//! - Parameters: type code + payload (u32, f32, vec3, string)
//! - String pool (null-terminated, deduplicated)
//!
//! Every array in the layout is an 16-byte descriptor (absolute offset, count,
//! element size) pointing at `count` contiguous elements elsewhere in the file.
//!
//! # Usage
//!
//! ```ignore
//! use nether_baev::{decode, encode};
//!
//! let data = std::fs::read("Player.root.baev").unwrap();
//! let archive = decode(&data).unwrap();
//!
//! println!("Version: {}", archive.container.version);
//! println!("Buckets: {}", archive.container.event_info.len());
//! println!("Nodes: {}", archive.container.nodes.len());
//!
//! let bytes = encode(&archive).unwrap();
//! assert_eq!(decode(&bytes).unwrap().container, archive.container);
//! ```

mod archive;
mod cursor;
mod decode;
mod encode;
mod error;
mod string_pool;
mod tree;

pub use archive::{
    Archive, ArrayDescriptor, Container, Event, EventInfoEntry, FileHeader, HoldEvent, Node,
    Parameter, SectionInfo, TriggerEvent, Version,
};
pub use cursor::{Cursor, Writer, align_up};
pub use decode::{DecodeOptions, decode, decode_with};
pub use encode::encode;
pub use error::{BaevError, Result};
pub use string_pool::StringPool;
pub use tree::{from_json_str, from_tree, to_json_string, to_tree};

// =============================================================================
// Magic Constants
// =============================================================================

/// File header magic "BFFH"
pub const FILE_MAGIC: &[u8; 4] = b"BFFH";

/// Section info magic "BFSI"
pub const SECTION_MAGIC: &[u8; 4] = b"BFSI";

// =============================================================================
// Record Sizes
// =============================================================================

/// File header size, including the annotation field
pub const FILE_HEADER_SIZE: usize = 0xA8;

/// Section info record size
pub const SECTION_INFO_SIZE: usize = 0x28;

/// Container record size
pub const CONTAINER_SIZE: usize = 0x38;

/// Event info (hash bucket) record size
pub const EVENT_INFO_SIZE: usize = 0x18;

/// Node index element size
pub const NODE_INDEX_SIZE: usize = 4;

/// Node record size
pub const NODE_SIZE: usize = 0x18;

/// Event record size
pub const EVENT_SIZE: usize = 0x30;

/// Trigger event record size
pub const TRIGGER_SIZE: usize = 0x18;

/// Hold event record size
pub const HOLD_SIZE: usize = 0x18;

/// Parameter pointer element size
pub const PARAMETER_POINTER_SIZE: usize = 8;

/// Annotation field length in the file header
pub const ANNOTATION_LEN: usize = 0x80;

/// Section name field length
pub const SECTION_NAME_LEN: usize = 0x10;

/// Alignment used for every region the encoder lays out
pub const DEFAULT_ALIGNMENT: u32 = 8;

// =============================================================================
// Parameter Type Codes
// =============================================================================

/// Parameter type codes as stored on disk
pub mod parameter_codes {
    /// Unsigned 32-bit integer
    pub const U32: u32 = 0;
    /// 32-bit float
    pub const F32: u32 = 1;
    /// Three 32-bit floats (x, y, z)
    pub const VEC3: u32 = 3;
    /// Offset of a null-terminated string in the pool
    pub const STRING: u32 = 5;
}

/// Annotation written by the resource converter into every archive it produces
pub const DEFAULT_ANNOTATION: &str =
    "Nintendo.AnimationEvent.ResourceConverter.Resource.AnimationEventArchiveResData";

/// Name of the section holding the container and all records
pub const DEFAULT_SECTION_NAME: &str = "Default";

/// Name of the section holding the string pool
pub const STRING_POOL_SECTION_NAME: &str = "StringPool";

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(FILE_MAGIC.len(), 4);
        assert_eq!(SECTION_MAGIC.len(), 4);
        assert!(DEFAULT_ANNOTATION.len() < ANNOTATION_LEN);
        assert!(STRING_POOL_SECTION_NAME.len() < SECTION_NAME_LEN);
    }

    #[test]
    fn test_record_sizes() {
        // header: 16 fixed + 16 array + 8 container offset + annotation
        assert_eq!(FILE_HEADER_SIZE, 16 + 16 + 8 + ANNOTATION_LEN);
        // section: 16 fixed + 8 base offset + name
        assert_eq!(SECTION_INFO_SIZE, 16 + 8 + SECTION_NAME_LEN);
        // container: head + version + reserved + pool + two arrays
        assert_eq!(CONTAINER_SIZE, 8 + 4 + 4 + 8 + 16 + 16);
        assert_eq!(EVENT_SIZE, 8 + 16 + 16 + 8);
    }
}
