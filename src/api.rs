//! Collaborators outside the engine: the remote API, user notifications and
//! document rendering.
use crate::document::SaleDocument;
use crate::payload::{Payload, Record, SalePatch};
use crate::types::Collection;

/// Remote create/read/update contract. Failures are opaque to the engine.
pub trait RemoteApi {
    fn fetch_collection(&self, collection: Collection) -> anyhow::Result<Vec<Record>>;
    /// Returns the id the remote side assigned.
    fn submit_create(&self, payload: &Payload) -> anyhow::Result<u64>;
    fn submit_update(&self, id: u64, payload: &Payload) -> anyhow::Result<()>;
    fn submit_patch(&self, id: u64, patch: &SalePatch) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Success,
    Error,
}

/// Fire-and-forget user notice (toast, dialog, log line).
pub trait Notifier {
    fn notify(&self, kind: NotifyKind, message: &str);
}

/// Sends notices to the log instead of a UI.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NotifyKind, message: &str) {
        match kind {
            NotifyKind::Success => tracing::info!(notice = message),
            NotifyKind::Error => tracing::warn!(notice = message),
        }
    }
}

pub trait DocumentRenderer {
    fn render(&self, document: &SaleDocument) -> anyhow::Result<()>;
}
