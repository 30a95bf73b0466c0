//! Pipeline state management

/// Supervisor state machine
///
/// Represents the lifecycle of the single pipeline owned by a supervisor.
/// Transitions are validated so the UI commands can be rejected without
/// touching the media backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// No pipeline exists
    #[default]
    Uninitialized,

    /// Pipeline built, surface bound and bus watched, not yet playing
    Connected,

    /// Pipeline is rendering the stream
    Playing,

    /// Pipeline is paused (can resume to Playing)
    Paused,

    /// The pipeline reported a fatal error; terminal until teardown
    Error,

    /// The stream ended; terminal until teardown
    EndOfStream,
}

impl PipelineState {
    /// Check if this state transition is valid
    pub fn can_transition_to(&self, target: &PipelineState) -> bool {
        use PipelineState::*;

        match (self, target) {
            // teardown is always allowed
            (_, Uninitialized) => true,

            (Uninitialized, Connected) => true,

            (Connected, Playing) => true,
            (Playing, Paused) => true,
            (Paused, Playing) => true,

            // bus reported termination
            (Connected | Playing | Paused, Error | EndOfStream) => true,

            _ => false,
        }
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            PipelineState::Uninitialized => "Not connected",
            PipelineState::Connected => "Connected",
            PipelineState::Playing => "Playing",
            PipelineState::Paused => "Paused",
            PipelineState::Error => "Error",
            PipelineState::EndOfStream => "End of stream",
        }
    }

    /// Check if a pipeline exists and has not terminated
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            PipelineState::Connected | PipelineState::Playing | PipelineState::Paused
        )
    }

    /// Check if the pipeline is playing
    pub fn is_playing(&self) -> bool {
        matches!(self, PipelineState::Playing)
    }

    /// Check if the session ended and only teardown is left
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Error | PipelineState::EndOfStream)
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        use PipelineState::*;

        assert!(Uninitialized.can_transition_to(&Connected));
        assert!(Connected.can_transition_to(&Playing));
        assert!(Playing.can_transition_to(&Paused));
        assert!(Paused.can_transition_to(&Playing));
        assert!(Playing.can_transition_to(&Error));
        assert!(Paused.can_transition_to(&EndOfStream));

        // teardown from anywhere
        assert!(Error.can_transition_to(&Uninitialized));
        assert!(Playing.can_transition_to(&Uninitialized));
    }

    #[test]
    fn test_invalid_transitions() {
        use PipelineState::*;

        assert!(!Uninitialized.can_transition_to(&Playing)); // Must connect first
        assert!(!Connected.can_transition_to(&Paused)); // Nothing to pause yet
        assert!(!Playing.can_transition_to(&Playing));
        assert!(!Error.can_transition_to(&Playing)); // Terminal until teardown
        assert!(!EndOfStream.can_transition_to(&Connected));
        assert!(!Uninitialized.can_transition_to(&Error));
    }

    #[test]
    fn test_state_checks() {
        use PipelineState::*;

        assert!(Playing.is_active());
        assert!(Playing.is_playing());
        assert!(!Playing.is_terminal());

        assert!(Paused.is_active());
        assert!(!Paused.is_playing());

        assert!(!Uninitialized.is_active());
        assert!(!Error.is_active());
        assert!(Error.is_terminal());
        assert!(EndOfStream.is_terminal());

        assert_eq!(PipelineState::default(), Uninitialized);
        assert_eq!(EndOfStream.to_string(), "End of stream");
    }
}
