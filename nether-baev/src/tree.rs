//! JSON tree projection of an archive
//!
//! The tree mirrors what the resource tools show for an archive: a list of
//! hash buckets, each with its nodes inlined. Each inlined node keeps its
//! `Index` in the node table, so nodes shared between buckets and nodes no
//! bucket references (listed under `Orphan Nodes`) survive the round trip.
//! Parameters are tagged (`{"kind": "f32", "value": 1.0}`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::archive::{
    Archive, Container, Event, EventInfoEntry, FileHeader, HoldEvent, Node, Parameter,
    TriggerEvent, Version,
};
use crate::archive::float;
use crate::error::{BaevError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct ArchiveTree {
    #[serde(rename = "Annotation", default = "default_annotation")]
    annotation: String,
    #[serde(rename = "Version")]
    version: Version,
    #[serde(rename = "Unknown Value", default)]
    reserved: u32,
    #[serde(rename = "Event Info")]
    event_info: Vec<BucketTree>,
    #[serde(
        rename = "Orphan Nodes",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    orphan_nodes: Vec<NodeTree>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BucketTree {
    #[serde(rename = "Hash", with = "hex_hash")]
    hash: u32,
    #[serde(rename = "Nodes")]
    nodes: Vec<NodeTree>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeTree {
    #[serde(rename = "Index")]
    index: u32,
    #[serde(rename = "Hash", with = "hex_hash")]
    hash: u32,
    #[serde(rename = "Unknown", default)]
    reserved: u32,
    #[serde(rename = "Event")]
    events: Vec<EventTree>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EventTree {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Trigger Array", default)]
    triggers: Vec<TriggerTree>,
    #[serde(rename = "Hold Array", default)]
    holds: Vec<HoldTree>,
    #[serde(rename = "Unknown 1", default)]
    reserved_1: u32,
    #[serde(rename = "Unknown 2", default)]
    reserved_2: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct TriggerTree {
    #[serde(rename = "Parameters", default)]
    parameters: Vec<Value>,
    #[serde(rename = "Start Frame", with = "float")]
    frame: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct HoldTree {
    #[serde(rename = "Parameters", default)]
    parameters: Vec<Value>,
    #[serde(rename = "Start Frame", with = "float")]
    start_frame: f32,
    #[serde(rename = "End Frame", with = "float")]
    end_frame: f32,
}

fn default_annotation() -> String {
    FileHeader::default().annotation
}

/// Hashes are written as `0x`-prefixed hex strings
mod hex_hash {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(hash: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{hash:#x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let text = String::deserialize(deserializer)?;
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(&text);
        u32::from_str_radix(digits, 16)
            .map_err(|e| de::Error::custom(format!("invalid hash {text:?}: {e}")))
    }
}

// =============================================================================
// Archive -> tree
// =============================================================================

/// Project an archive into a JSON value tree
pub fn to_tree(archive: &Archive) -> Result<Value> {
    let container = &archive.container;
    let mut referenced = vec![false; container.nodes.len()];

    let mut event_info = Vec::with_capacity(container.event_info.len());
    for entry in &container.event_info {
        let mut nodes = Vec::with_capacity(entry.nodes.len());
        for &index in &entry.nodes {
            let node = container.resolve(index).ok_or_else(|| {
                BaevError::InconsistentModel(format!(
                    "bucket {:#x} references node {} outside the node table",
                    entry.hash, index
                ))
            })?;
            referenced[index as usize] = true;
            nodes.push(node_tree(index, node)?);
        }
        event_info.push(BucketTree {
            hash: entry.hash,
            nodes,
        });
    }

    let orphan_nodes = container
        .nodes
        .iter()
        .enumerate()
        .filter(|(i, _)| !referenced[*i])
        .map(|(i, node)| node_tree(i as u32, node))
        .collect::<Result<Vec<_>>>()?;

    let tree = ArchiveTree {
        annotation: archive.header.annotation.clone(),
        version: container.version,
        reserved: container.reserved,
        event_info,
        orphan_nodes,
    };
    Ok(serde_json::to_value(tree)?)
}

/// Project an archive into pretty-printed JSON
pub fn to_json_string(archive: &Archive) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_tree(archive)?)?)
}

fn node_tree(index: u32, node: &Node) -> Result<NodeTree> {
    let events = node
        .events
        .iter()
        .map(|event| -> Result<EventTree> {
            let triggers = event
                .triggers
                .iter()
                .map(|t| -> Result<TriggerTree> {
                    Ok(TriggerTree {
                        parameters: parameter_values(&t.parameters)?,
                        frame: t.frame,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let holds = event
                .holds
                .iter()
                .map(|h| -> Result<HoldTree> {
                    Ok(HoldTree {
                        parameters: parameter_values(&h.parameters)?,
                        start_frame: h.start_frame,
                        end_frame: h.end_frame,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(EventTree {
                name: event.name.clone(),
                triggers,
                holds,
                reserved_1: event.reserved[0],
                reserved_2: event.reserved[1],
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(NodeTree {
        index,
        hash: node.hash,
        reserved: node.reserved,
        events,
    })
}

fn parameter_values(parameters: &[Parameter]) -> Result<Vec<Value>> {
    parameters
        .iter()
        .map(|p| serde_json::to_value(p).map_err(BaevError::from))
        .collect()
}

// =============================================================================
// Tree -> archive
// =============================================================================

/// Rebuild an archive from its JSON value tree
///
/// Fails with `UnencodableParameter` for parameters that are not tagged with a
/// known kind, and with `InconsistentModel` when node indices leave gaps or the
/// same index is given two different nodes.
pub fn from_tree(value: Value) -> Result<Archive> {
    let tree: ArchiveTree = serde_json::from_value(value)?;

    let total = tree.event_info.iter().map(|b| b.nodes.len()).sum::<usize>()
        + tree.orphan_nodes.len();
    let mut table: Vec<Option<Node>> = Vec::new();
    let mut event_info = Vec::with_capacity(tree.event_info.len());

    for bucket in tree.event_info {
        let mut indices = Vec::with_capacity(bucket.nodes.len());
        for node in bucket.nodes {
            indices.push(node.index);
            place(&mut table, total, node)?;
        }
        event_info.push(EventInfoEntry {
            hash: bucket.hash,
            nodes: indices,
        });
    }
    for node in tree.orphan_nodes {
        place(&mut table, total, node)?;
    }

    let nodes = table
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| {
                BaevError::InconsistentModel(format!("node table index {i} is missing"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Archive {
        header: FileHeader {
            annotation: tree.annotation,
            ..Default::default()
        },
        container: Container {
            version: tree.version,
            reserved: tree.reserved,
            event_info,
            nodes,
        },
    })
}

/// Parse JSON text and rebuild the archive
pub fn from_json_str(text: &str) -> Result<Archive> {
    from_tree(serde_json::from_str(text)?)
}

/// Put a node at its table index, rejecting conflicting duplicates
fn place(table: &mut Vec<Option<Node>>, total: usize, tree: NodeTree) -> Result<()> {
    let index = tree.index as usize;
    if index >= total {
        return Err(BaevError::InconsistentModel(format!(
            "node index {index} is out of range for {total} listed nodes"
        )));
    }
    let node = node_from_tree(tree)?;
    if table.len() <= index {
        table.resize(index + 1, None);
    }
    match &table[index] {
        Some(existing) if *existing != node => Err(BaevError::InconsistentModel(format!(
            "node index {index} is listed twice with different contents"
        ))),
        Some(_) => Ok(()),
        None => {
            table[index] = Some(node);
            Ok(())
        }
    }
}

fn node_from_tree(tree: NodeTree) -> Result<Node> {
    let events = tree
        .events
        .into_iter()
        .map(|event| -> Result<Event> {
            let triggers = event
                .triggers
                .into_iter()
                .map(|t| -> Result<TriggerEvent> {
                    Ok(TriggerEvent::new(t.frame, parameters_from(t.parameters)?))
                })
                .collect::<Result<Vec<_>>>()?;
            let holds = event
                .holds
                .into_iter()
                .map(|h| -> Result<HoldEvent> {
                    Ok(HoldEvent::new(
                        h.start_frame,
                        h.end_frame,
                        parameters_from(h.parameters)?,
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Event {
                name: event.name,
                triggers,
                holds,
                reserved: [event.reserved_1, event.reserved_2],
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Node {
        hash: tree.hash,
        reserved: tree.reserved,
        events,
    })
}

fn parameters_from(values: Vec<Value>) -> Result<Vec<Parameter>> {
    values
        .into_iter()
        .map(|value| {
            let shown = value.to_string();
            serde_json::from_value(value).map_err(|e| BaevError::UnencodableParameter {
                reason: format!("{shown}: {e}"),
            })
        })
        .collect()
}
