//! Actor-based concurrency for the ledger
//!
//! The ledger file has no locking, so every writer inside a process goes
//! through one task that owns the [`Ledger`] exclusively:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │           HTTP workers (actix, N threads)             │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │       one append at a time, lines never interleave    │
//! │                       │                               │
//! │                       ▼                               │
//! │              Storage::append()                        │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! This serializes writers in one process only. Two processes appending to
//! the same file can still race.

use crate::ledger::Ledger;
use crate::types::CredentialRecord;
use crate::{Error, Metrics, Result};
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Append a record unconditionally
    Issue {
        /// Canonical email
        email: String,
        /// Reply channel
        response: oneshot::Sender<Result<CredentialRecord>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the ledger
#[derive(Debug)]
pub struct LedgerActor {
    /// Exclusive ledger access
    ledger: Ledger,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(ledger: Ledger, mailbox: mpsc::Receiver<LedgerMessage>) -> Self {
        Self { ledger, mailbox }
    }

    /// Run until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Shutdown => {
                    tracing::debug!("Ledger actor shutting down");
                    break;
                }
                msg => self.handle_message(msg),
            }
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::Issue { email, response } => {
                let result = self.ledger.issue(&email);
                if let Err(e) = &result {
                    tracing::error!("Error creating user '{}': {}", email, e);
                }
                let _ = response.send(result);
            }

            LedgerMessage::Shutdown => {
                // Handled in run loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
    metrics: Metrics,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>, metrics: Metrics) -> Self {
        Self { sender, metrics }
    }

    /// Append a record unconditionally
    pub async fn issue(&self, email: impl Into<String>) -> Result<CredentialRecord> {
        let (tx, rx) = oneshot::channel();
        self.send(LedgerMessage::Issue {
            email: email.into(),
            response: tx,
        })
        .await?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Metrics of the ledger owned by the actor
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.send(LedgerMessage::Shutdown).await
    }

    async fn send(&self, msg: LedgerMessage) -> Result<()> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))
    }
}

/// Spawn the ledger actor on the current Tokio runtime
pub fn spawn_ledger_actor(ledger: Ledger, mailbox_capacity: usize) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let metrics = ledger.metrics().clone();
    let actor = LedgerActor::new(ledger, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx, metrics)
}
