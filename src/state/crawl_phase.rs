/// Crawl phase definitions for the orchestrator's state machine
///
/// A run moves strictly forward through these phases, one step at a time.
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Output locations are being created
    Init,

    /// Checkpoint is being restored into the frontier
    Loading,

    /// Batches are being drawn and processed
    Running,

    /// The loop has ended; the renderer is being released
    Draining,

    /// Final checkpoint written and summary emitted
    Done,
}

impl CrawlPhase {
    /// Returns true if a run may move from `self` to `next`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Loading)
                | (Self::Loading, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Done)
        )
    }

    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Loading => "loading",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }

    /// Returns all phases in run order
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Init,
            Self::Loading,
            Self::Running,
            Self::Draining,
            Self::Done,
        ]
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
