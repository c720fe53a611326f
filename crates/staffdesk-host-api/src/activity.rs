//! Qualifying user interactions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interaction kinds that count as session activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Pointer,
    Key,
    Scroll,
    Touch,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityKind::Pointer => write!(f, "pointer"),
            ActivityKind::Key => write!(f, "key"),
            ActivityKind::Scroll => write!(f, "scroll"),
            ActivityKind::Touch => write!(f, "touch"),
        }
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pointer" | "mouse" | "click" => Ok(ActivityKind::Pointer),
            "key" | "keyboard" | "keydown" => Ok(ActivityKind::Key),
            "scroll" | "wheel" => Ok(ActivityKind::Scroll),
            "touch" | "touchstart" => Ok(ActivityKind::Touch),
            other => Err(format!("Unknown activity kind: {}", other)),
        }
    }
}

/// One qualifying interaction delivered by an activity source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
}

impl ActivityEvent {
    pub fn new(kind: ActivityKind) -> Self {
        Self { kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_browser_style_names() {
        assert_eq!("keydown".parse::<ActivityKind>().unwrap(), ActivityKind::Key);
        assert_eq!("Wheel".parse::<ActivityKind>().unwrap(), ActivityKind::Scroll);
        assert_eq!("touchstart".parse::<ActivityKind>().unwrap(), ActivityKind::Touch);
        assert!("resize".parse::<ActivityKind>().is_err());
    }

    #[test]
    fn activity_event_json() {
        let json = serde_json::to_string(&ActivityEvent::new(ActivityKind::Pointer)).unwrap();
        assert_eq!(json, r#"{"kind":"pointer"}"#);
    }
}
