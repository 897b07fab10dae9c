//! Ctrl-C routing for the chat shell
//!
//! The process-wide SIGINT handler stays installed once registered, so a
//! single listener forwards every interrupt through an [`InterruptGate`]:
//! while an answer is pending the interrupt cancels it, otherwise the shell
//! should exit.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// What an interrupt means at the moment it arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// An answer is pending and has been told to stop
    Cancel,
    /// Nothing is pending
    Exit,
}

/// Shared side of the interrupt channel, held by the signal listener
#[derive(Debug)]
pub struct InterruptGate {
    waiting: AtomicBool,
    tx: UnboundedSender<()>,
}

impl InterruptGate {
    /// Route one interrupt
    pub fn interrupt(&self) -> Interrupt {
        if self.waiting.load(Ordering::SeqCst) && self.tx.send(()).is_ok() {
            Interrupt::Cancel
        } else {
            Interrupt::Exit
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::SeqCst)
    }
}

/// Receiving side, owned by the shell loop
#[derive(Debug)]
pub struct CancelSignal {
    gate: Arc<InterruptGate>,
    rx: UnboundedReceiver<()>,
}

impl CancelSignal {
    /// Drive `work` to completion unless an interrupt arrives first
    ///
    /// Returns `None` when interrupted. Interrupts left over from an earlier
    /// wait are discarded.
    pub async fn wait<F: Future>(&mut self, work: F) -> Option<F::Output> {
        while self.rx.try_recv().is_ok() {}
        self.gate.waiting.store(true, Ordering::SeqCst);
        let outcome = tokio::select! {
            output = work => Some(output),
            _ = self.rx.recv() => None,
        };
        self.gate.waiting.store(false, Ordering::SeqCst);
        outcome
    }
}

/// Create a connected gate and cancel signal
pub fn interrupt_channel() -> (Arc<InterruptGate>, CancelSignal) {
    let (tx, rx) = mpsc::unbounded_channel();
    let gate = Arc::new(InterruptGate {
        waiting: AtomicBool::new(false),
        tx,
    });
    let signal = CancelSignal {
        gate: Arc::clone(&gate),
        rx,
    };
    (gate, signal)
}
