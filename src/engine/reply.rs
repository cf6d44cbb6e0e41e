//! One-shot replies for commands the caller waits on
//!
//! A request either runs on the worker or is abandoned by the caller, never
//! both. Both sides race on a shared state word: the worker claims the
//! request before touching any channel, and the caller cancels it when its
//! wait runs out. Whoever loses the race defers to the winner, so a caller
//! that sees `Timeout` knows the command had no effect.

use crate::error::{EngineError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const PENDING: u8 = 0;
const CLAIMED: u8 = 1;
const CANCELLED: u8 = 2;

/// Worker-side reply slot carried inside a command
#[derive(Debug, Clone)]
pub struct Reply<T> {
    sender: Sender<Result<T>>,
    deadline: Instant,
    state: Arc<AtomicU8>,
}

/// Caller-side end of a [`Reply`]
#[derive(Debug)]
pub struct PendingReply<T> {
    receiver: Receiver<Result<T>>,
    deadline: Instant,
    state: Arc<AtomicU8>,
}

impl<T> Reply<T> {
    /// Create a reply slot that expires `timeout` from now
    pub fn channel(timeout: Duration) -> (Self, PendingReply<T>) {
        let (sender, receiver) = bounded(1);
        let deadline = Instant::now() + timeout;
        let state = Arc::new(AtomicU8::new(PENDING));

        let reply = Self {
            sender,
            deadline,
            state: state.clone(),
        };
        let pending = PendingReply {
            receiver,
            deadline,
            state,
        };
        (reply, pending)
    }

    /// Take ownership of the request; false if it expired or was cancelled
    pub fn claim(&self) -> bool {
        if Instant::now() > self.deadline {
            return false;
        }
        self.state
            .compare_exchange(PENDING, CLAIMED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Time after which the request is no longer applied
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Deliver the outcome; ignored if the caller has gone away
    pub fn send(&self, result: Result<T>) {
        let _ = self.sender.try_send(result);
    }
}

impl<T> PendingReply<T> {
    /// Wait for the outcome until the deadline
    ///
    /// Returns `Timeout` only when the worker never claimed the request.
    pub fn wait(self) -> Result<T> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        match self.receiver.recv_timeout(remaining) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => self.cancel_or_join(),
            Err(RecvTimeoutError::Disconnected) => Err(disconnected()),
        }
    }

    fn cancel_or_join(self) -> Result<T> {
        match self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Err(EngineError::Timeout(
                "engine worker did not take the request in time".to_string(),
            )),
            // The worker is applying it; its reply is on the way
            Err(_) => self.receiver.recv().unwrap_or_else(|_| Err(disconnected())),
        }
    }
}

fn disconnected() -> EngineError {
    EngineError::Channel("engine worker dropped the request".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claimed_reply_is_delivered() {
        let (reply, pending) = Reply::channel(Duration::from_secs(1));
        assert!(reply.claim());
        reply.send(Ok(7));
        assert_eq!(pending.wait().unwrap(), 7);
    }

    #[test]
    fn test_unclaimed_reply_times_out() {
        let (reply, pending) = Reply::<()>::channel(Duration::from_millis(5));
        assert!(matches!(pending.wait(), Err(EngineError::Timeout(_))));
        assert!(!reply.claim(), "cancelled request must not be claimed");
    }

    #[test]
    fn test_expired_reply_cannot_be_claimed() {
        let (reply, _pending) = Reply::<()>::channel(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        assert!(!reply.claim());
    }

    #[test]
    fn test_claim_wins_over_late_cancel() {
        let (reply, pending) = Reply::channel(Duration::from_millis(20));
        assert!(reply.claim());
        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(60));
            reply.send(Ok("done"));
        });
        assert_eq!(pending.wait().unwrap(), "done");
        worker.join().unwrap();
    }

    #[test]
    fn test_dropped_reply_is_channel_error() {
        let (reply, pending) = Reply::<()>::channel(Duration::from_secs(1));
        drop(reply);
        assert!(matches!(pending.wait(), Err(EngineError::Channel(_))));
    }
}
