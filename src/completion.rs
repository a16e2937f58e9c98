//! One-shot completion signal for a confetti burst.
//!
//! Every burst started with
//! [`Confetti::start_confetti`](crate::confetti::Confetti::start_confetti)
//! hands back a [`CompletionSignal`]. It settles exactly once: `Ok(())` when
//! the burst reached its terminal frame and released its visuals, or an
//! [`ConfettiError`] when it was cancelled or the render sink failed.
//!
//! The signal is a [`Future`], so async hosts can simply `.await` it. Hosts
//! that pump frames by hand can use [`CompletionSignal::try_outcome`] instead.
//!
//! # Example
//!
//! ```ignore
//! let mut signal = confetti.start_confetti(container, ConfettiOptions::default())?;
//! let abort = signal.abort_handle();
//! // ... deliver frames with confetti.tick(now_ms) ...
//! if user_navigated_away {
//!     abort.abort();
//! }
//! if let Some(outcome) = signal.try_outcome() {
//!     log::info!("confetti finished: {:?}", outcome);
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use futures::channel::oneshot;

use crate::error::ConfettiError;

/// Outcome delivered through a [`CompletionSignal`].
pub type BurstResult = Result<(), ConfettiError>;

/// Shared cancellation flag for a single burst.
///
/// Cloning yields another handle to the same flag. The scheduler checks it at
/// the top of every tick.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the burst stops at the next tick.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Sending half kept on the burst entity.
///
/// [`settle`](CompletionSender::settle) consumes the inner sender, so a burst
/// can never produce a second resolution or rejection.
#[derive(Debug)]
pub struct CompletionSender {
    sender: Option<oneshot::Sender<BurstResult>>,
}

impl CompletionSender {
    /// Deliver the outcome. Returns `false` if the signal was already settled.
    pub fn settle(&mut self, outcome: BurstResult) -> bool {
        match self.sender.take() {
            Some(sender) => {
                // The receiver may have been dropped; the burst still counts as settled.
                let _ = sender.send(outcome);
                true
            }
            None => false,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.sender.is_none()
    }
}

/// Receiving half returned to the caller.
#[derive(Debug)]
pub struct CompletionSignal {
    receiver: oneshot::Receiver<BurstResult>,
    abort: AbortHandle,
    outcome: Option<BurstResult>,
}

impl CompletionSignal {
    /// Create a connected sender/signal pair sharing `abort`.
    pub fn channel(abort: AbortHandle) -> (CompletionSender, CompletionSignal) {
        let (sender, receiver) = oneshot::channel();
        (
            CompletionSender {
                sender: Some(sender),
            },
            CompletionSignal {
                receiver,
                abort,
                outcome: None,
            },
        )
    }

    /// A signal that is already settled, used when a burst fails while starting.
    pub fn settled(outcome: BurstResult) -> CompletionSignal {
        let (mut sender, signal) = Self::channel(AbortHandle::new());
        sender.settle(outcome);
        signal
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Non-blocking check. Returns `None` while the burst is still running.
    ///
    /// Once settled, every later call returns the same outcome.
    pub fn try_outcome(&mut self) -> Option<BurstResult> {
        if self.outcome.is_none() {
            self.outcome = match self.receiver.try_recv() {
                Ok(Some(outcome)) => Some(outcome),
                Ok(None) => None,
                Err(oneshot::Canceled) => Some(Err(ConfettiError::Abandoned)),
            };
        }
        self.outcome.clone()
    }

    pub fn is_settled(&mut self) -> bool {
        self.try_outcome().is_some()
    }
}

impl Future for CompletionSignal {
    type Output = BurstResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.outcome.clone() {
            return Poll::Ready(outcome);
        }
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => {
                self.outcome = Some(outcome.clone());
                Poll::Ready(outcome)
            }
            Poll::Ready(Err(oneshot::Canceled)) => {
                self.outcome = Some(Err(ConfettiError::Abandoned));
                Poll::Ready(Err(ConfettiError::Abandoned))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
