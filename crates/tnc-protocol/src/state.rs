use std::fmt;

/// # Controller State Machine
///
/// ```text
///              start() ok
///   ┌─────────┐ ─────────► ┌─────────┐
///   │ Stopped │            │ Running │
///   └─────────┘ ◄───────── └─────────┘
///                 stop()
/// ```
///
/// - **Stopped**: no capture thread, no device open. `stop` is a no-op.
/// - **Running**: exactly one capture session owns the open device. `start`
///   is rejected.
///
/// `stop` always returns to `Stopped`, even when the capture thread failed
/// to confirm termination in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ControllerState {
    #[default]
    Stopped,
    Running,
}

impl ControllerState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn can_start(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "Stopped"),
            Self::Running => write!(f, "Running"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_stopped() {
        let state = ControllerState::default();
        assert_eq!(state, ControllerState::Stopped);
        assert!(state.can_start());
        assert!(!state.is_running());
    }

    #[test]
    fn test_running_rejects_start() {
        let state = ControllerState::Running;
        assert!(state.is_running());
        assert!(!state.can_start());
        assert_eq!(state.to_string(), "Running");
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&ControllerState::Running).unwrap();
        assert_eq!(json, "\"Running\"");
        let back: ControllerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ControllerState::Running);
    }
}
