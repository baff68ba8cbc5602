//! Layout pass: assigns an absolute offset to every region of the output

use crate::archive::{Container, Parameter};
use crate::cursor::align_up;
use crate::error::{BaevError, Result};
use crate::string_pool::StringPool;
use crate::{
    CONTAINER_SIZE, DEFAULT_ALIGNMENT, EVENT_INFO_SIZE, EVENT_SIZE, FILE_HEADER_SIZE, HOLD_SIZE,
    NODE_INDEX_SIZE, NODE_SIZE, PARAMETER_POINTER_SIZE, SECTION_INFO_SIZE, TRIGGER_SIZE,
};

/// Number of sections written: the record section and the string pool
pub(crate) const SECTION_COUNT: usize = 2;

/// Offsets of every region, mirroring the container's shape
#[derive(Debug)]
pub(crate) struct Layout {
    pub sections_offset: usize,
    pub container_offset: usize,
    pub buckets_offset: usize,
    /// Node index array offset per bucket
    pub index_offsets: Vec<usize>,
    pub node_table_offset: usize,
    pub nodes: Vec<NodeLayout>,
    pub string_pool_offset: usize,
    pub file_size: usize,
    /// Finished string pool bytes
    pub pool: Vec<u8>,
}

#[derive(Debug)]
pub(crate) struct NodeLayout {
    pub events_offset: usize,
    pub events: Vec<EventLayout>,
}

#[derive(Debug)]
pub(crate) struct EventLayout {
    /// Pool-relative name offset
    pub name: u32,
    pub triggers_offset: usize,
    pub holds_offset: usize,
    pub triggers: Vec<ParametersLayout>,
    pub holds: Vec<ParametersLayout>,
}

#[derive(Debug)]
pub(crate) struct ParametersLayout {
    /// Offset of the pointer array
    pub array_offset: usize,
    pub records: Vec<RecordLayout>,
}

#[derive(Debug)]
pub(crate) struct RecordLayout {
    pub offset: usize,
    /// Pool-relative offset for string parameters
    pub string: Option<u32>,
}

/// Hands out consecutive regions of the output file
struct Allocator {
    next: usize,
}

impl Allocator {
    fn take(&mut self, size: usize, align: usize) -> usize {
        let offset = align_up(self.next, align);
        self.next = offset + size;
        offset
    }

    fn region(&mut self, size: usize) -> usize {
        self.take(size, DEFAULT_ALIGNMENT as usize)
    }

    /// Empty arrays point at offset 0 and take no space
    fn array(&mut self, count: usize, stride: usize) -> usize {
        if count == 0 {
            return 0;
        }
        self.region(count * stride)
    }
}

/// Compute the layout for `container`, interning every string on the way
pub(crate) fn compute(container: &Container) -> Result<Layout> {
    let mut alloc = Allocator { next: 0 };
    let mut pool = StringPool::new();
    pool.intern("");

    alloc.region(FILE_HEADER_SIZE);
    let sections_offset = alloc.region(SECTION_COUNT * SECTION_INFO_SIZE);
    let container_offset = alloc.region(CONTAINER_SIZE);
    let buckets_offset = alloc.array(container.event_info.len(), EVENT_INFO_SIZE);

    // Index arrays are packed back to back; only the node table is realigned
    let index_offsets = container
        .event_info
        .iter()
        .map(|entry| match entry.nodes.len() {
            0 => 0,
            n => alloc.take(n * NODE_INDEX_SIZE, NODE_INDEX_SIZE),
        })
        .collect();

    let node_table_offset = alloc.array(container.nodes.len(), NODE_SIZE);

    let mut nodes = Vec::with_capacity(container.nodes.len());
    for node in &container.nodes {
        let events_offset = alloc.array(node.events.len(), EVENT_SIZE);
        let mut events = Vec::with_capacity(node.events.len());

        for event in &node.events {
            let name = intern(&mut pool, "event name", &event.name)?;
            let triggers_offset = alloc.array(event.triggers.len(), TRIGGER_SIZE);
            let holds_offset = alloc.array(event.holds.len(), HOLD_SIZE);

            let triggers = event
                .triggers
                .iter()
                .map(|t| parameters(&mut alloc, &mut pool, &t.parameters))
                .collect::<Result<Vec<_>>>()?;
            let holds = event
                .holds
                .iter()
                .map(|h| parameters(&mut alloc, &mut pool, &h.parameters))
                .collect::<Result<Vec<_>>>()?;

            events.push(EventLayout {
                name,
                triggers_offset,
                holds_offset,
                triggers,
                holds,
            });
        }

        nodes.push(NodeLayout {
            events_offset,
            events,
        });
    }

    let string_pool_offset = alloc.region(pool.len());
    let pool = pool.finish();
    let file_size = string_pool_offset + pool.len();
    if u32::try_from(file_size).is_err() {
        return Err(BaevError::FieldTooLong {
            field: "file size",
            len: file_size,
            max: u32::MAX as usize,
        });
    }

    tracing::debug!(
        "BAEV layout: node table at {:#x}, string pool at {:#x} ({} bytes), {} bytes total",
        node_table_offset,
        string_pool_offset,
        pool.len(),
        file_size
    );

    Ok(Layout {
        sections_offset,
        container_offset,
        buckets_offset,
        index_offsets,
        node_table_offset,
        nodes,
        string_pool_offset,
        file_size,
        pool,
    })
}

/// Pointer array followed by the records it points to
fn parameters(
    alloc: &mut Allocator,
    pool: &mut StringPool,
    parameters: &[Parameter],
) -> Result<ParametersLayout> {
    let array_offset = alloc.array(parameters.len(), PARAMETER_POINTER_SIZE);
    let records = parameters
        .iter()
        .map(|parameter| -> Result<RecordLayout> {
            let offset = alloc.region(parameter.record_size());
            let string = match parameter {
                Parameter::String(s) => Some(intern(pool, "string parameter", s)?),
                _ => None,
            };
            Ok(RecordLayout { offset, string })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ParametersLayout {
        array_offset,
        records,
    })
}

fn intern(pool: &mut StringPool, field: &'static str, s: &str) -> Result<u32> {
    if s.as_bytes().contains(&0) {
        return Err(BaevError::InteriorNul { field });
    }
    Ok(pool.intern(s))
}
