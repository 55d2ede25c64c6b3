use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// User input, as a window would report it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    Quit,
    TogglePause,
    /// `s`: lower the framerate by 5.
    SlowDown,
    /// `f`: raise the framerate by 5.
    SpeedUp,
    /// `d`: back to the configured framerate.
    ResetFramerate,
    /// `c`: colour agents by heading.
    ToggleColors,
    /// Wheel turned by `delta` notches with the cursor at `(x, y)`.
    MouseWheel { delta: i32, x: f64, y: f64 },
    /// Left arrow held with the cursor at the given point.
    RotateLeft { x: f64, y: f64 },
    RotateRight { x: f64, y: f64 },
    /// Left mouse button held.
    Drag { x: f64, y: f64 },
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Continue,
    Quit,
}

/// Where the main loop gets its input from, polled once per frame.
pub trait EventSource: Send {
    fn poll(&mut self, frame: u64) -> Vec<Event>;
}

/// No input at all; batch runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl EventSource for NoInput {
    fn poll(&mut self, _frame: u64) -> Vec<Event> {
        Vec::new()
    }
}

/// Replays events at fixed frame numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptedInput {
    script: BTreeMap<u64, Vec<Event>>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, frame: u64, event: Event) -> Self {
        self.script.entry(frame).or_default().push(event);
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading event script {}", path.display()))?;
        let script = serde_json::from_str(&content)
            .with_context(|| format!("parsing event script {}", path.display()))?;
        Ok(script)
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl EventSource for ScriptedInput {
    fn poll(&mut self, frame: u64) -> Vec<Event> {
        self.script.remove(&frame).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_events_fire_once_at_their_frame() {
        let mut input = ScriptedInput::new()
            .at(2, Event::TogglePause)
            .at(2, Event::SpeedUp)
            .at(5, Event::Quit);

        assert!(input.poll(0).is_empty());
        assert_eq!(input.poll(2), vec![Event::TogglePause, Event::SpeedUp]);
        assert!(input.poll(2).is_empty());
        assert_eq!(input.poll(5), vec![Event::Quit]);
        assert!(input.is_empty());
    }

    #[test]
    fn script_parses_from_json() {
        let json = r#"{
            "3": [{"type": "Drag", "x": 10.0, "y": 20.0}],
            "10": [{"type": "Quit"}]
        }"#;
        let mut input: ScriptedInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.poll(3), vec![Event::Drag { x: 10.0, y: 20.0 }]);
        assert_eq!(input.poll(10), vec![Event::Quit]);
    }
}
