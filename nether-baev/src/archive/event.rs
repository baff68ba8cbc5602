//! Node, event, trigger and hold records

use super::Parameter;

/// Node table entry: a hash key and its events
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub hash: u32,
    /// Reserved value following the hash
    pub reserved: u32,
    pub events: Vec<Event>,
}

impl Node {
    /// Create an empty node with the given hash
    pub fn new(hash: u32) -> Self {
        Self {
            hash,
            ..Default::default()
        }
    }
}

/// Named animation event with its trigger and hold entries
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub name: String,
    pub triggers: Vec<TriggerEvent>,
    pub holds: Vec<HoldEvent>,
    /// Two trailing values of unknown meaning
    pub reserved: [u32; 2],
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Event that fires on a single frame
///
/// Frames compare by bit pattern, so a NaN frame equals itself.
#[derive(Debug, Clone, Default)]
pub struct TriggerEvent {
    pub parameters: Vec<Parameter>,
    pub frame: f32,
}

impl TriggerEvent {
    pub fn new(frame: f32, parameters: Vec<Parameter>) -> Self {
        Self { parameters, frame }
    }
}

/// Event active over a frame interval
///
/// Frames compare by bit pattern, like [`TriggerEvent`].
#[derive(Debug, Clone, Default)]
pub struct HoldEvent {
    pub parameters: Vec<Parameter>,
    pub start_frame: f32,
    pub end_frame: f32,
}

impl HoldEvent {
    pub fn new(start_frame: f32, end_frame: f32, parameters: Vec<Parameter>) -> Self {
        Self {
            parameters,
            start_frame,
            end_frame,
        }
    }
}

impl PartialEq for TriggerEvent {
    fn eq(&self, other: &Self) -> bool {
        self.frame.to_bits() == other.frame.to_bits() && self.parameters == other.parameters
    }
}

impl PartialEq for HoldEvent {
    fn eq(&self, other: &Self) -> bool {
        self.start_frame.to_bits() == other.start_frame.to_bits()
            && self.end_frame.to_bits() == other.end_frame.to_bits()
            && self.parameters == other.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_frames_compare_equal() {
        let trigger = TriggerEvent::new(f32::NAN, vec![Parameter::F32(f32::NAN)]);
        assert_eq!(trigger, trigger.clone());

        let hold = HoldEvent::new(f32::NAN, f32::INFINITY, Vec::new());
        assert_eq!(hold, hold.clone());
    }

    #[test]
    fn test_frames_compare_by_bits() {
        assert_ne!(
            TriggerEvent::new(0.0, Vec::new()),
            TriggerEvent::new(-0.0, Vec::new())
        );
        assert_ne!(
            HoldEvent::new(1.0, 2.0, Vec::new()),
            HoldEvent::new(1.0, 3.0, Vec::new())
        );
    }
}
