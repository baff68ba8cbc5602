//! File header and section table decoding

use super::Decoder;
use crate::archive::{FileHeader, SectionInfo};
use crate::error::{BaevError, FieldContext, Result};
use crate::{ANNOTATION_LEN, FILE_MAGIC, SECTION_INFO_SIZE, SECTION_MAGIC, SECTION_NAME_LEN};

impl Decoder<'_> {
    /// Parse the `BFFH` header at the cursor
    pub(crate) fn file_header(&mut self) -> Result<FileHeader> {
        let magic = self.magic(FILE_MAGIC)?;
        let offset = self.cursor.read_u32()?;
        let file_size = self.cursor.read_u32()?;
        let alignment = self.cursor.read_u32()?;

        // A buffer shorter than the declared size cannot be complete
        let declared = file_size as usize;
        if declared > self.cursor.len() {
            if self.options.strict {
                return Err(BaevError::TruncatedInput {
                    offset: 0,
                    need: declared,
                    have: self.cursor.len(),
                });
            }
            tracing::warn!(
                "Buffer is {} bytes but header declares {}",
                self.cursor.len(),
                declared
            );
        }

        let sections = self
            .array(SECTION_INFO_SIZE, Self::section_info)
            .field("section table")?;
        let container_offset = self.cursor.read_u64()?;
        let annotation = self
            .cursor
            .read_fixed_string(ANNOTATION_LEN)
            .field("annotation")?;

        Ok(FileHeader {
            magic,
            offset,
            file_size,
            alignment,
            sections,
            container_offset,
            annotation,
        })
    }

    /// Parse one `BFSI` section entry
    fn section_info(&mut self) -> Result<SectionInfo> {
        let magic = self.magic(SECTION_MAGIC)?;
        let offset = self.cursor.read_u32()?;
        let size = self.cursor.read_u32()?;
        let alignment = self.cursor.read_u32()?;
        let base_offset = self.cursor.read_u64()?;
        let name = self.cursor.read_fixed_string(SECTION_NAME_LEN)?;

        tracing::trace!(
            "Section {:?}: offset {:#x}, size {:#x}, base {:#x}",
            name,
            offset,
            size,
            base_offset
        );

        Ok(SectionInfo {
            magic,
            offset,
            size,
            alignment,
            base_offset,
            name,
        })
    }
}
