//! Deduplicated string pool builder

use hashbrown::HashMap;

/// Accumulates strings for the pool at the end of an archive.
///
/// Each distinct string is stored once, null-terminated, at the offset where it
/// was first interned. `finish` consumes the builder, so nothing can be added
/// after the pool bytes have been produced.
#[derive(Debug, Default)]
pub struct StringPool {
    data: Vec<u8>,
    offsets: HashMap<String, u32>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `s` to the pool and return its pool-relative offset.
    ///
    /// Interning the same string again returns the original offset.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&offset) = self.offsets.get(s) {
            return offset;
        }
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(s.as_bytes());
        self.data.push(0);
        self.offsets.insert(s.to_string(), offset);
        offset
    }

    /// Offset of a previously interned string
    pub fn offset_of(&self, s: &str) -> Option<u32> {
        self.offsets.get(s).copied()
    }

    /// Size of the pool in bytes, terminators included
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of distinct strings
    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    /// Produce the concatenated pool bytes
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_assigns_sequential_offsets() {
        let mut pool = StringPool::new();
        assert_eq!(pool.intern(""), 0);
        assert_eq!(pool.intern("Attack"), 1);
        assert_eq!(pool.intern("Idle"), 8);
        assert_eq!(pool.len(), 13);
    }

    #[test]
    fn test_intern_is_idempotent() {
        let mut pool = StringPool::new();
        let first = pool.intern("Footstep");
        let len = pool.len();

        assert_eq!(pool.intern("Footstep"), first);
        assert_eq!(pool.len(), len);
        assert_eq!(pool.count(), 1);

        let bytes = pool.finish();
        assert_eq!(bytes, b"Footstep\0");
    }

    #[test]
    fn test_first_seen_wins() {
        let mut pool = StringPool::new();
        pool.intern("b");
        pool.intern("a");
        pool.intern("b");

        assert_eq!(pool.offset_of("b"), Some(0));
        assert_eq!(pool.offset_of("a"), Some(2));
        assert_eq!(pool.offset_of("c"), None);
        assert_eq!(pool.finish(), b"b\0a\0");
    }
}
