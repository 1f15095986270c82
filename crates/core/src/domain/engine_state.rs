// Engine lifecycle state machine

use super::error::{DomainError, Result};

/// Coordinator lifecycle
///
/// Idle -> Accumulating -> Draining -> (Accumulating | Idle)
/// any live state -> ShuttingDown -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Accumulating,
    Draining,
    ShuttingDown,
    Stopped,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Idle => write!(f, "IDLE"),
            EngineState::Accumulating => write!(f, "ACCUMULATING"),
            EngineState::Draining => write!(f, "DRAINING"),
            EngineState::ShuttingDown => write!(f, "SHUTTING_DOWN"),
            EngineState::Stopped => write!(f, "STOPPED"),
        }
    }
}

impl EngineState {
    /// Whether new validation work may be queued
    pub fn accepts_work(&self) -> bool {
        matches!(self, EngineState::Idle | EngineState::Accumulating)
    }

    pub fn transition(self, to: EngineState) -> Result<EngineState> {
        use EngineState::*;
        let allowed = matches!(
            (self, to),
            (Idle, Accumulating)
                | (Accumulating, Accumulating)
                | (Idle, Draining)
                | (Accumulating, Draining)
                | (Draining, Accumulating)
                | (Draining, Idle)
                | (Idle, ShuttingDown)
                | (Accumulating, ShuttingDown)
                | (Draining, ShuttingDown)
                | (ShuttingDown, Stopped)
        );
        if allowed {
            Ok(to)
        } else {
            Err(DomainError::InvalidStateTransition {
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_lifecycle() {
        let s = EngineState::Idle;
        let s = s.transition(EngineState::Accumulating).unwrap();
        let s = s.transition(EngineState::Draining).unwrap();
        let s = s.transition(EngineState::Accumulating).unwrap();
        let s = s.transition(EngineState::ShuttingDown).unwrap();
        let s = s.transition(EngineState::Stopped).unwrap();
        assert!(!s.accepts_work());
    }

    #[test]
    fn test_stopped_is_terminal() {
        let err = EngineState::Stopped
            .transition(EngineState::Accumulating)
            .unwrap_err();
        assert!(err.to_string().contains("STOPPED -> ACCUMULATING"));
    }
}
