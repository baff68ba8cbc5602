//! BAEV archive data structures

mod event;
pub(crate) mod float;
mod parameter;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cursor::{Cursor, Writer};
use crate::error::Result;
use crate::{DEFAULT_ALIGNMENT, DEFAULT_ANNOTATION, FILE_MAGIC};

pub use event::{Event, HoldEvent, Node, TriggerEvent};
pub use parameter::Parameter;

/// Decoded archive: file header plus the event container
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    pub header: FileHeader,
    pub container: Container,
}

impl Archive {
    /// Wrap a container with a default header.
    ///
    /// Offsets, sizes and sections are recomputed by the encoder, so only the
    /// annotation and alignment of the header matter when building archives.
    pub fn new(container: Container) -> Self {
        Self {
            header: FileHeader::default(),
            container,
        }
    }
}

/// Top-level file header (`BFFH`)
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    /// Magic tag, `BFFH` in valid files
    pub magic: [u8; 4],
    /// Offset of this header (always 0 in files written by the converter)
    pub offset: u32,
    /// Total file size in bytes
    pub file_size: u32,
    /// Base alignment
    pub alignment: u32,
    /// Section table
    pub sections: Vec<SectionInfo>,
    /// Absolute offset of the container
    pub container_offset: u64,
    /// Free-text annotation (0x80-byte field)
    pub annotation: String,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            magic: *FILE_MAGIC,
            offset: 0,
            file_size: 0,
            alignment: DEFAULT_ALIGNMENT,
            sections: Vec::new(),
            container_offset: 0,
            annotation: DEFAULT_ANNOTATION.to_string(),
        }
    }
}

/// Section table entry (`BFSI`)
#[derive(Debug, Clone, PartialEq)]
pub struct SectionInfo {
    pub magic: [u8; 4],
    /// Section byte offset within the file
    pub offset: u32,
    /// Section size in bytes
    pub size: u32,
    pub alignment: u32,
    /// Base offset for addressing inside the section
    pub base_offset: u64,
    /// Section name (0x10-byte field)
    pub name: String,
}

/// Out-of-line array: absolute offset of the first element, element count and
/// per-element size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArrayDescriptor {
    pub offset: u64,
    pub count: u32,
    pub element_size: u32,
}

impl ArrayDescriptor {
    /// Size of the descriptor itself
    pub const SIZE: usize = 16;

    pub fn new(offset: u64, count: usize, element_size: usize) -> Self {
        Self {
            offset,
            count: count as u32,
            element_size: element_size as u32,
        }
    }

    pub fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            offset: cursor.read_u64()?,
            count: cursor.read_u32()?,
            element_size: cursor.read_u32()?,
        })
    }

    pub fn write(&self, writer: &mut Writer) {
        writer.write_u64(self.offset);
        writer.write_u32(self.count);
        writer.write_u32(self.element_size);
    }
}

/// Archive version, stored on disk as `sub:u8, minor:u8, major:u16`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u16,
    pub minor: u8,
    pub sub: u8,
}

impl Version {
    pub const fn new(major: u16, minor: u8, sub: u8) -> Self {
        Self { major, minor, sub }
    }

    pub fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        let sub = cursor.read_u8()?;
        let minor = cursor.read_u8()?;
        let major = cursor.read_u16()?;
        Ok(Self { major, minor, sub })
    }

    pub fn write(&self, writer: &mut Writer) {
        writer.write_u8(self.sub);
        writer.write_u8(self.minor);
        writer.write_u16(self.major);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.sub)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let (Some(major), Some(minor), Some(sub), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("invalid version {s:?} (expected major.minor.sub)"));
        };
        let bad = |_| format!("invalid version {s:?}");
        Ok(Self {
            major: major.parse().map_err(bad)?,
            minor: minor.parse().map_err(bad)?,
            sub: sub.parse().map_err(bad)?,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

/// Event container: hash buckets plus the global node table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Container {
    pub version: Version,
    /// Reserved value following the version
    pub reserved: u32,
    /// Hash buckets
    pub event_info: Vec<EventInfoEntry>,
    /// Global node table, in file order
    pub nodes: Vec<Node>,
}

impl Container {
    /// Node at `index` in the node table
    pub fn resolve(&self, index: u32) -> Option<&Node> {
        self.nodes.get(index as usize)
    }

    /// Nodes referenced by a bucket, in bucket order.
    ///
    /// Indices outside the table are skipped; decoded containers never hold any.
    pub fn nodes_of<'a>(&'a self, entry: &'a EventInfoEntry) -> impl Iterator<Item = &'a Node> {
        entry.nodes.iter().filter_map(|&index| self.resolve(index))
    }

    /// First bucket with the given hash
    pub fn find_bucket(&self, hash: u32) -> Option<&EventInfoEntry> {
        self.event_info.iter().find(|entry| entry.hash == hash)
    }

    /// Total number of events across all nodes
    pub fn event_count(&self) -> usize {
        self.nodes.iter().map(|node| node.events.len()).sum()
    }
}

/// Hash bucket: a hash key and the node table indices it maps to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventInfoEntry {
    pub hash: u32,
    /// Indices into [`Container::nodes`]
    pub nodes: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_display_and_parse() {
        let version = Version::new(1, 2, 3);
        assert_eq!(version.to_string(), "1.2.3");
        assert_eq!("1.2.3".parse::<Version>().unwrap(), version);
        assert!("1.2".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
        assert!("1.300.0".parse::<Version>().is_err());
    }

    #[test]
    fn test_version_byte_order() {
        let mut writer = Writer::new();
        Version::new(1, 0, 0).write(&mut writer);
        let bytes = writer.into_bytes();
        assert_eq!(bytes, [0x00, 0x00, 0x01, 0x00]);

        let mut cursor = Cursor::new(&bytes);
        assert_eq!(Version::read(&mut cursor).unwrap(), Version::new(1, 0, 0));
    }

    #[test]
    fn test_resolve_nodes() {
        let container = Container {
            event_info: vec![EventInfoEntry {
                hash: 0x10,
                nodes: vec![1, 0],
            }],
            nodes: vec![Node::new(0xA), Node::new(0xB)],
            ..Default::default()
        };

        let bucket = container.find_bucket(0x10).unwrap();
        let hashes: Vec<u32> = container.nodes_of(bucket).map(|n| n.hash).collect();
        assert_eq!(hashes, vec![0xB, 0xA]);
        assert!(container.resolve(2).is_none());
        assert!(container.find_bucket(0x11).is_none());
    }
}
