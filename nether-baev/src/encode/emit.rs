//! Emission pass: writes every record at the offset chosen by the layout

use super::layout::{Layout, ParametersLayout, SECTION_COUNT};
use crate::archive::{Archive, ArrayDescriptor, Container, Parameter};
use crate::cursor::Writer;
use crate::error::Result;
use crate::{
    ANNOTATION_LEN, DEFAULT_ALIGNMENT, DEFAULT_SECTION_NAME, EVENT_INFO_SIZE, EVENT_SIZE,
    FILE_MAGIC, HOLD_SIZE, NODE_INDEX_SIZE, NODE_SIZE, PARAMETER_POINTER_SIZE, SECTION_INFO_SIZE,
    SECTION_MAGIC, SECTION_NAME_LEN, STRING_POOL_SECTION_NAME, TRIGGER_SIZE,
};

/// Serialize `archive` into a buffer of `layout.file_size` bytes
pub(crate) fn emit(archive: &Archive, layout: &Layout) -> Result<Vec<u8>> {
    let mut writer = Writer::with_len(layout.file_size);

    write_header(&mut writer, &archive.header.annotation, layout)?;
    write_sections(&mut writer, layout)?;
    write_container(&mut writer, &archive.container, layout);
    write_buckets(&mut writer, &archive.container, layout);
    write_nodes(&mut writer, &archive.container, layout);

    writer.seek(layout.string_pool_offset);
    writer.write_bytes(&layout.pool);

    debug_assert_eq!(writer.len(), layout.file_size);
    Ok(writer.into_bytes())
}

/// Absolute offset of a pool-relative string offset
fn string_offset(layout: &Layout, relative: u32) -> u64 {
    (layout.string_pool_offset + relative as usize) as u64
}

fn write_header(writer: &mut Writer, annotation: &str, layout: &Layout) -> Result<()> {
    writer.seek(0);
    writer.write_magic(FILE_MAGIC);
    writer.write_u32(0); // header offset
    writer.write_u32(layout.file_size as u32);
    writer.write_u32(DEFAULT_ALIGNMENT);
    ArrayDescriptor::new(
        layout.sections_offset as u64,
        SECTION_COUNT,
        SECTION_INFO_SIZE,
    )
    .write(writer);
    writer.write_u64(layout.container_offset as u64);
    writer.write_fixed_string("annotation", annotation, ANNOTATION_LEN)
}

fn write_sections(writer: &mut Writer, layout: &Layout) -> Result<()> {
    writer.seek(layout.sections_offset);

    // Records: container up to the string pool
    writer.write_magic(SECTION_MAGIC);
    writer.write_u32(layout.container_offset as u32);
    writer.write_u32((layout.string_pool_offset - layout.container_offset) as u32);
    writer.write_u32(DEFAULT_ALIGNMENT);
    writer.write_u64(layout.container_offset as u64);
    writer.write_fixed_string("section name", DEFAULT_SECTION_NAME, SECTION_NAME_LEN)?;

    writer.write_magic(SECTION_MAGIC);
    writer.write_u32(layout.string_pool_offset as u32);
    writer.write_u32(layout.pool.len() as u32);
    writer.write_u32(1);
    writer.write_u64(layout.string_pool_offset as u64);
    writer.write_fixed_string("section name", STRING_POOL_SECTION_NAME, SECTION_NAME_LEN)
}

fn write_container(writer: &mut Writer, container: &Container, layout: &Layout) {
    writer.seek(layout.container_offset);
    writer.write_u64(0); // head offset
    container.version.write(writer);
    writer.write_u32(container.reserved);
    writer.write_u64(layout.string_pool_offset as u64);
    ArrayDescriptor::new(
        layout.buckets_offset as u64,
        container.event_info.len(),
        EVENT_INFO_SIZE,
    )
    .write(writer);
    ArrayDescriptor::new(
        layout.node_table_offset as u64,
        container.nodes.len(),
        NODE_SIZE,
    )
    .write(writer);
}

fn write_buckets(writer: &mut Writer, container: &Container, layout: &Layout) {
    for (i, entry) in container.event_info.iter().enumerate() {
        let indices_offset = layout.index_offsets[i];

        writer.seek(layout.buckets_offset + i * EVENT_INFO_SIZE);
        writer.write_u32(entry.hash);
        writer.write_u32(0); // padding
        ArrayDescriptor::new(indices_offset as u64, entry.nodes.len(), NODE_INDEX_SIZE)
            .write(writer);

        writer.seek(indices_offset);
        for &index in &entry.nodes {
            writer.write_u32(index);
        }
    }
}

fn write_nodes(writer: &mut Writer, container: &Container, layout: &Layout) {
    for (i, (node, node_layout)) in container.nodes.iter().zip(&layout.nodes).enumerate() {
        writer.seek(layout.node_table_offset + i * NODE_SIZE);
        ArrayDescriptor::new(
            node_layout.events_offset as u64,
            node.events.len(),
            EVENT_SIZE,
        )
        .write(writer);
        writer.write_u32(node.hash);
        writer.write_u32(node.reserved);

        for (j, (event, event_layout)) in node.events.iter().zip(&node_layout.events).enumerate()
        {
            writer.seek(node_layout.events_offset + j * EVENT_SIZE);
            writer.write_u64(string_offset(layout, event_layout.name));
            ArrayDescriptor::new(
                event_layout.triggers_offset as u64,
                event.triggers.len(),
                TRIGGER_SIZE,
            )
            .write(writer);
            ArrayDescriptor::new(
                event_layout.holds_offset as u64,
                event.holds.len(),
                HOLD_SIZE,
            )
            .write(writer);
            writer.write_u32(event.reserved[0]);
            writer.write_u32(event.reserved[1]);

            for (k, (trigger, params)) in
                event.triggers.iter().zip(&event_layout.triggers).enumerate()
            {
                writer.seek(event_layout.triggers_offset + k * TRIGGER_SIZE);
                parameters_descriptor(params, trigger.parameters.len()).write(writer);
                writer.write_f32(trigger.frame);
                writer.write_f32(0.0); // padding
                write_parameters(writer, layout, &trigger.parameters, params);
            }

            for (k, (hold, params)) in event.holds.iter().zip(&event_layout.holds).enumerate() {
                writer.seek(event_layout.holds_offset + k * HOLD_SIZE);
                parameters_descriptor(params, hold.parameters.len()).write(writer);
                writer.write_f32(hold.start_frame);
                writer.write_f32(hold.end_frame);
                write_parameters(writer, layout, &hold.parameters, params);
            }
        }
    }
}

fn parameters_descriptor(params: &ParametersLayout, count: usize) -> ArrayDescriptor {
    ArrayDescriptor::new(params.array_offset as u64, count, PARAMETER_POINTER_SIZE)
}

/// Pointer array, then one record per parameter
fn write_parameters(
    writer: &mut Writer,
    layout: &Layout,
    parameters: &[Parameter],
    params: &ParametersLayout,
) {
    for (m, record) in params.records.iter().enumerate() {
        writer.seek(params.array_offset + m * PARAMETER_POINTER_SIZE);
        writer.write_u64(record.offset as u64);
    }

    for (parameter, record) in parameters.iter().zip(&params.records) {
        writer.seek(record.offset);
        writer.write_u32(parameter.code());
        writer.write_u32(0); // padding
        match parameter {
            Parameter::U32(v) => writer.write_u32(*v),
            Parameter::F32(v) => writer.write_f32(*v),
            Parameter::Vec3([x, y, z]) => {
                writer.write_f32(*x);
                writer.write_f32(*y);
                writer.write_f32(*z);
            }
            Parameter::String(_) => {
                let relative = record.string.unwrap_or_default();
                writer.write_u64(string_offset(layout, relative));
            }
        }
    }
}
