//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use shift_core::{Failure, Shifting};
use tokio::sync::mpsc;

/// The error every failing fixture raises.
pub fn nope() -> std::io::Error {
    std::io::Error::other("NOPE")
}

/// Assert `err` is the exact fixture error, not a re-wrapped copy.
pub fn assert_is_nope(err: &Failure) {
    assert_eq!(err.to_string(), "NOPE");
    let io = err
        .downcast_ref::<std::io::Error>()
        .expect("failure should still be the original io::Error");
    assert_eq!(io.kind(), std::io::ErrorKind::Other);
}

/// What a recording callback saw.
#[derive(Debug)]
pub struct Delivery<T> {
    /// Whether `from` had already returned when the callback ran.
    pub after_return: bool,
    pub result: Result<T, Failure>,
}

/// An adapter whose callback forwards every delivery to a channel.
///
/// Call [`Recorder::mark_returned`] right after `from` returns.
pub struct Recorder<T> {
    pub adapter: Shifting<T>,
    returned: Arc<AtomicBool>,
    rx: mpsc::UnboundedReceiver<Delivery<T>>,
}

impl<T: Send + 'static> Recorder<T> {
    pub fn new() -> Self {
        let returned = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&returned);
        let (tx, rx) = mpsc::unbounded_channel();
        let adapter = Shifting::with_callback(move |result| {
            let _ = tx.send(Delivery {
                after_return: seen.load(Ordering::SeqCst),
                result,
            });
        });
        Self {
            adapter,
            returned,
            rx,
        }
    }

    pub fn mark_returned(&self) {
        self.returned.store(true, Ordering::SeqCst);
    }

    pub async fn next(&mut self) -> Delivery<T> {
        self.rx.recv().await.expect("callback channel closed")
    }

    /// Give pending deliveries a chance to run, then report whether any
    /// extra delivery arrived.
    pub async fn has_extra(&mut self) -> bool {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        self.rx.try_recv().is_ok()
    }
}
