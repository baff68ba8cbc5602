//! Integration tests for baev-convert
//!
//! Tests the full pipeline: build archive -> decode to JSON -> encode -> verify

use nether_baev::{
    Archive, Container, Event, EventInfoEntry, HoldEvent, Node, Parameter, TriggerEvent,
};
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn sample_archive() -> Archive {
    let mut attack = Event::new("Attack");
    attack.triggers.push(TriggerEvent::new(
        3.5,
        vec![Parameter::F32(1.0), Parameter::String("Swing".into())],
    ));
    attack
        .holds
        .push(HoldEvent::new(4.0, 9.0, vec![Parameter::Vec3([0.0, 1.0, 0.0])]));

    let mut node = Node::new(0x2);
    node.events.push(attack);

    Archive::new(Container {
        event_info: vec![EventInfoEntry {
            hash: 0x1,
            nodes: vec![0],
        }],
        nodes: vec![node, Node::new(0x3)],
        ..Default::default()
    })
}

fn write_sample(path: &Path) -> Vec<u8> {
    let bytes = nether_baev::encode(&sample_archive()).expect("Failed to encode sample");
    std::fs::write(path, &bytes).expect("Failed to write sample");
    bytes
}

fn baev_convert(args: &[&str]) -> bool {
    Command::new(env!("CARGO_BIN_EXE_baev-convert"))
        .args(args)
        .status()
        .expect("Failed to run baev-convert")
        .success()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// Test .baev -> JSON -> .baev reproduces the file
#[test]
fn test_decode_then_encode() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("Player.root.baev");
    let json_dir = dir.path().join("json");
    let baev_dir = dir.path().join("baev");
    let original = write_sample(&input);

    assert!(baev_convert(&["decode", path_str(&input), "-o", path_str(&json_dir)]));
    let json_path = json_dir.join("Player.root.json");
    assert!(json_path.exists(), "JSON file should exist");

    let text = std::fs::read_to_string(&json_path).unwrap();
    let parsed = nether_baev::from_json_str(&text).expect("JSON should parse back");
    assert_eq!(parsed.container, sample_archive().container);
    assert!(text.contains("\"Orphan Nodes\""));

    assert!(baev_convert(&["encode", path_str(&json_path), "-o", path_str(&baev_dir)]));
    let rebuilt = std::fs::read(baev_dir.join("Player.root.baev")).unwrap();
    assert_eq!(rebuilt, original);
}

/// Test output lands next to the input when no directory is given
#[test]
fn test_default_output_dir() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("Walk.baev");
    write_sample(&input);

    assert!(baev_convert(&["decode", path_str(&input)]));
    assert!(dir.path().join("Walk.json").exists());
}

/// Test several inputs in one run
#[test]
fn test_multiple_inputs() {
    let dir = tempdir().expect("Failed to create temp dir");
    let a = dir.path().join("a.baev");
    let b = dir.path().join("b.baev");
    write_sample(&a);
    write_sample(&b);

    assert!(baev_convert(&["decode", path_str(&a), path_str(&b)]));
    assert!(dir.path().join("a.json").exists());
    assert!(dir.path().join("b.json").exists());
}

/// Test verify accepts a good archive and rejects a truncated one
#[test]
fn test_verify() {
    let dir = tempdir().expect("Failed to create temp dir");
    let good = dir.path().join("good.baev");
    let bytes = write_sample(&good);
    assert!(baev_convert(&["verify", path_str(&good)]));

    let bad = dir.path().join("bad.baev");
    std::fs::write(&bad, &bytes[..bytes.len() - 1]).unwrap();
    assert!(!baev_convert(&["verify", path_str(&bad)]));
    assert!(!baev_convert(&["verify", path_str(&good), path_str(&bad)]));
}

/// Test a failed conversion leaves no output behind
#[test]
fn test_failure_leaves_no_partial_output() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("garbage.baev");
    std::fs::write(&input, b"not an archive").unwrap();

    assert!(!baev_convert(&["decode", path_str(&input)]));
    assert!(!dir.path().join("garbage.json").exists());

    let json = dir.path().join("broken.json");
    std::fs::write(&json, r#"{"Annotation": "x"}"#).unwrap();
    assert!(!baev_convert(&["encode", path_str(&json)]));
    assert!(!dir.path().join("broken.baev").exists());

    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 2, "no temporary files should remain");
}

/// Test --lenient accepts an archive with a bad section magic
#[test]
fn test_lenient_decode() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("odd.baev");
    let mut bytes = nether_baev::encode(&sample_archive()).unwrap();
    // First section magic follows the 0xA8-byte header
    bytes[0xA8..0xAC].copy_from_slice(b"XXXX");
    std::fs::write(&input, &bytes).unwrap();

    assert!(!baev_convert(&["decode", path_str(&input)]));
    assert!(baev_convert(&["decode", "--lenient", path_str(&input)]));
    assert!(dir.path().join("odd.json").exists());
}

/// Test NaN frames survive verify and the JSON round trip
#[test]
fn test_nan_frame() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("nan.baev");
    let json_dir = dir.path().join("json");
    let baev_dir = dir.path().join("baev");

    let mut archive = sample_archive();
    archive.container.nodes[0].events[0].triggers[0].frame = f32::NAN;
    let original = nether_baev::encode(&archive).unwrap();
    std::fs::write(&input, &original).unwrap();

    assert!(baev_convert(&["verify", path_str(&input)]));

    assert!(baev_convert(&["decode", path_str(&input), "-o", path_str(&json_dir)]));
    let json_path = json_dir.join("nan.json");
    assert!(!std::fs::read_to_string(&json_path).unwrap().contains("null"));

    assert!(baev_convert(&["encode", path_str(&json_path), "-o", path_str(&baev_dir)]));
    assert_eq!(std::fs::read(baev_dir.join("nan.baev")).unwrap(), original);
}
