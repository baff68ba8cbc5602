//! BAEV file decoder

use crate::archive::{Archive, ArrayDescriptor};
use crate::cursor::Cursor;
use crate::error::{BaevError, FieldContext, Result};

mod events;
mod header;

/// Decoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Validate magic tags, array element sizes and the declared file size.
    ///
    /// When disabled, mismatches are logged and decoding continues.
    pub strict: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl DecodeOptions {
    /// Options that tolerate unexpected magic tags and strides
    pub fn lenient() -> Self {
        Self { strict: false }
    }
}

/// Decode a BAEV file with strict validation
///
/// # Arguments
/// * `data` - Raw BAEV file bytes
///
/// # Returns
/// * `Ok(Archive)` - Fully decoded archive, node indices checked against the node table
/// * `Err(BaevError)` - Decode error with the offending offset and structure
pub fn decode(data: &[u8]) -> Result<Archive> {
    decode_with(data, &DecodeOptions::default())
}

/// Decode a BAEV file with explicit options
pub fn decode_with(data: &[u8], options: &DecodeOptions) -> Result<Archive> {
    let mut decoder = Decoder {
        cursor: Cursor::new(data),
        options: *options,
    };

    let header = decoder.file_header().field("file header")?;
    tracing::debug!(
        "BAEV header: {} bytes, {} sections, container at {:#x}",
        header.file_size,
        header.sections.len(),
        header.container_offset
    );

    let container_offset = usize::try_from(header.container_offset).unwrap_or(usize::MAX);
    decoder.cursor.seek(container_offset);
    let container = decoder.container().field("container")?;
    tracing::debug!(
        "BAEV container v{}: {} buckets, {} nodes, {} events",
        container.version,
        container.event_info.len(),
        container.nodes.len(),
        container.event_count()
    );

    Ok(Archive { header, container })
}

/// Decoding state: the cursor over the input plus options
pub(crate) struct Decoder<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) options: DecodeOptions,
}

impl<'a> Decoder<'a> {
    /// Run `f` at `offset`, restoring the cursor afterwards even on error
    pub(crate) fn at<T>(
        &mut self,
        offset: usize,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = self.cursor.position();
        self.cursor.seek(offset);
        let result = f(self);
        self.cursor.seek(saved);
        result
    }

    /// Read a 4-byte magic and compare it against `expected`
    pub(crate) fn magic(&mut self, expected: &[u8; 4]) -> Result<[u8; 4]> {
        let offset = self.cursor.position();
        let found = self.cursor.read_magic()?;
        if &found != expected {
            if self.options.strict {
                return Err(BaevError::UnexpectedMagic {
                    offset,
                    expected: *expected,
                    found,
                });
            }
            tracing::warn!(
                "Unexpected magic {:?} at {:#x} (expected {:?})",
                String::from_utf8_lossy(&found),
                offset,
                String::from_utf8_lossy(expected)
            );
        }
        Ok(found)
    }

    /// Read an array descriptor at the cursor and decode its elements.
    ///
    /// `stride` is the record size the format defines for the element type.
    /// Elements are read at `offset + i * element_size`; the cursor ends up
    /// just past the descriptor.
    pub(crate) fn array<T>(
        &mut self,
        stride: usize,
        mut read: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let descriptor_offset = self.cursor.position();
        let descriptor = ArrayDescriptor::read(&mut self.cursor)?;
        if descriptor.count == 0 {
            return Ok(Vec::new());
        }

        let mut step = descriptor.element_size as usize;
        if step != stride {
            if self.options.strict {
                return Err(BaevError::UnexpectedElementSize {
                    offset: descriptor_offset,
                    expected: stride,
                    found: step,
                });
            }
            tracing::warn!(
                "Array at {:#x} has element size {} (expected {})",
                descriptor_offset,
                step,
                stride
            );
            if step == 0 {
                step = stride;
            }
        }

        let start = usize::try_from(descriptor.offset).unwrap_or(usize::MAX);
        let count = descriptor.count as usize;
        let have = self.cursor.len().saturating_sub(start);
        let need = count.saturating_mul(step);
        if need > have {
            return Err(BaevError::TruncatedInput {
                offset: start,
                need,
                have,
            });
        }

        self.at(start, |decoder| {
            let mut elements = Vec::with_capacity(count);
            for i in 0..count {
                decoder.cursor.seek(start + i * step);
                elements.push(read(decoder)?);
            }
            Ok(elements)
        })
    }

    /// Follow a u64 absolute string offset at the cursor
    pub(crate) fn string_ref(&mut self) -> Result<String> {
        let offset = self.cursor.read_offset()?;
        self.at(offset, |decoder| decoder.cursor.read_cstring())
    }
}
