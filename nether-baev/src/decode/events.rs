//! Container, node table and event decoding

use super::Decoder;
use crate::archive::{
    Container, Event, EventInfoEntry, HoldEvent, Node, Parameter, TriggerEvent, Version,
};
use crate::error::{BaevError, FieldContext, Result};
use crate::{
    EVENT_INFO_SIZE, EVENT_SIZE, HOLD_SIZE, NODE_INDEX_SIZE, NODE_SIZE, PARAMETER_POINTER_SIZE,
    TRIGGER_SIZE, parameter_codes,
};

/// Bucket as stored on disk, before its indices are checked against the node table
struct RawBucket {
    hash: u32,
    indices: Vec<u32>,
}

impl Decoder<'_> {
    /// Parse the container at the cursor
    pub(crate) fn container(&mut self) -> Result<Container> {
        let head_offset = self.cursor.read_u64()?;
        let version = Version::read(&mut self.cursor)?;
        let reserved = self.cursor.read_u32()?;
        let string_pool_offset = self.cursor.read_u64()?;
        tracing::trace!(
            "Container head at {:#x}, string pool at {:#x}",
            head_offset,
            string_pool_offset
        );

        let buckets = self
            .array(EVENT_INFO_SIZE, Self::bucket)
            .field("event info")?;
        let nodes = self.array(NODE_SIZE, Self::node).field("node table")?;

        // Indices are only meaningful once the whole table exists
        let event_info = resolve_buckets(buckets, nodes.len())?;

        Ok(Container {
            version,
            reserved,
            event_info,
            nodes,
        })
    }

    fn bucket(&mut self) -> Result<RawBucket> {
        let hash = self.cursor.read_u32()?;
        let _padding = self.cursor.read_u32()?;
        let indices = self.array(NODE_INDEX_SIZE, |d| d.cursor.read_u32())?;
        Ok(RawBucket { hash, indices })
    }

    fn node(&mut self) -> Result<Node> {
        let events = self.array(EVENT_SIZE, Self::event).field("event")?;
        let hash = self.cursor.read_u32()?;
        let reserved = self.cursor.read_u32()?;
        Ok(Node {
            hash,
            reserved,
            events,
        })
    }

    fn event(&mut self) -> Result<Event> {
        let name = self.string_ref().field("name")?;
        let triggers = self
            .array(TRIGGER_SIZE, Self::trigger)
            .field("trigger array")?;
        let holds = self.array(HOLD_SIZE, Self::hold).field("hold array")?;
        let reserved = [self.cursor.read_u32()?, self.cursor.read_u32()?];
        Ok(Event {
            name,
            triggers,
            holds,
            reserved,
        })
    }

    fn trigger(&mut self) -> Result<TriggerEvent> {
        let parameters = self.parameters()?;
        let frame = self.cursor.read_f32()?;
        let _padding = self.cursor.read_f32()?;
        Ok(TriggerEvent { parameters, frame })
    }

    fn hold(&mut self) -> Result<HoldEvent> {
        let parameters = self.parameters()?;
        let start_frame = self.cursor.read_f32()?;
        let end_frame = self.cursor.read_f32()?;
        Ok(HoldEvent {
            parameters,
            start_frame,
            end_frame,
        })
    }

    /// Parameter pointer array: each element is the offset of a parameter record
    fn parameters(&mut self) -> Result<Vec<Parameter>> {
        self.array(PARAMETER_POINTER_SIZE, |d| {
            let offset = d.cursor.read_offset()?;
            d.at(offset, Self::parameter)
        })
        .field("parameter")
    }

    fn parameter(&mut self) -> Result<Parameter> {
        let offset = self.cursor.position();
        let tag = self.cursor.read_u32()?;
        let _padding = self.cursor.read_u32()?;

        let parameter = match tag {
            parameter_codes::U32 => Parameter::U32(self.cursor.read_u32()?),
            parameter_codes::F32 => Parameter::F32(self.cursor.read_f32()?),
            parameter_codes::VEC3 => Parameter::Vec3([
                self.cursor.read_f32()?,
                self.cursor.read_f32()?,
                self.cursor.read_f32()?,
            ]),
            parameter_codes::STRING => Parameter::String(self.string_ref()?),
            // Payload size is unknown, so nothing after this can be trusted
            _ => return Err(BaevError::UnknownParameterTag { offset, tag }),
        };
        Ok(parameter)
    }
}

/// Check every bucket index against the node table length
fn resolve_buckets(buckets: Vec<RawBucket>, len: usize) -> Result<Vec<EventInfoEntry>> {
    buckets
        .into_iter()
        .enumerate()
        .map(|(bucket, raw)| {
            if let Some(&index) = raw.indices.iter().find(|&&i| i as usize >= len) {
                return Err(BaevError::DanglingNodeIndex { bucket, index, len });
            }
            Ok(EventInfoEntry {
                hash: raw.hash,
                nodes: raw.indices,
            })
        })
        .collect()
}
