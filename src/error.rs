//! Error types for confetti bursts.
//!
//! [`ConfettiError`] is what a burst's
//! [`CompletionSignal`](crate::completion::CompletionSignal) settles with when
//! it does not finish normally, and what
//! [`Confetti::start_confetti`](crate::confetti::Confetti::start_confetti)
//! returns for options it refuses. [`SinkError`] is produced by
//! [`RenderSink`](crate::resources::rendersink::RenderSink) implementations.

use thiserror::Error;

use crate::resources::rendersink::{ContainerId, VisualHandle};

/// Failure reported by a render sink.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    /// The container was removed by the host while a burst still drew into it.
    #[error("container {0:?} is no longer attached")]
    ContainerDetached(ContainerId),
    /// The handle was never allocated by this sink, or was already released.
    #[error("unknown visual handle {0:?}")]
    UnknownHandle(VisualHandle),
    /// Any other backend failure.
    #[error("render backend failure: {0}")]
    Backend(String),
}

/// Reasons a burst can fail to start or to finish.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfettiError {
    /// Options were rejected before anything was allocated.
    #[error("invalid confetti configuration: {0}")]
    InvalidConfig(String),
    /// The render sink failed while allocating or updating a visual.
    #[error("render sink failure: {0}")]
    RenderSinkFailure(#[from] SinkError),
    /// The burst was aborted through its [`AbortHandle`](crate::completion::AbortHandle).
    #[error("confetti burst was cancelled")]
    Cancelled,
    /// The driver was dropped before the burst settled.
    #[error("confetti driver dropped before the burst finished")]
    Abandoned,
}
