//! Pipeline error taxonomy
//!
//! Every failure inside a pipeline attempt ends up as a `PipelineError`. The
//! supervisor decides from the variant whether the attempt is retried.

use thiserror::Error;

use crate::hypr_ipc::HyprError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing session context; never retried
    #[error("Cannot start: {0}")]
    Startup(#[source] HyprError),

    /// Event socket could not be opened or read
    #[error("Event stream failed: {0}")]
    Connection(#[source] HyprError),

    /// Event socket produced a line that is not an event
    #[error("Event stream protocol error: {0}")]
    Protocol(#[source] HyprError),

    /// Controller failed while probing the layout list
    #[error("Layout discovery failed: {0}")]
    Discovery(#[source] HyprError),

    /// Controller failed to apply a layout switch
    #[error("Failed to switch to layout {index}: {source}")]
    Command {
        index: usize,
        #[source]
        source: HyprError,
    },

    #[error("Giving up after {attempts} failed attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Classify an error coming from the event source
    pub fn from_stream(err: HyprError) -> Self {
        match err {
            HyprError::SignatureNotSet => Self::Startup(err),
            HyprError::MalformedEvent { .. } => Self::Protocol(err),
            other => Self::Connection(other),
        }
    }

    /// Whether a fresh pipeline attempt may fix this
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Startup(_) | Self::RetriesExhausted { .. })
    }
}
