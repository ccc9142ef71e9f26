//! Lifecycle of a saved sale.
//!
//! ```text
//!   Active ──annul(reason)──▶ Annulled   (terminal)
//! ```
//!
//! The state is derived from the record's `active` flag and annulment
//! reason. Every check here runs before the remote API is contacted.
use crate::error::EngineError;
use crate::payload::{PersistedSale, SalePatch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleState {
    Active,
    Annulled { reason: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleTransition {
    Annul { reason: String },
    Reactivate,
}

pub struct SaleLifecycle;

impl SaleState {
    pub fn of(sale: &PersistedSale) -> Self {
        // a non-empty reason makes the sale terminal even if the flag disagrees
        let has_reason = sale
            .annulment_reason
            .as_deref()
            .is_some_and(|reason| !reason.is_empty());
        if sale.active && !has_reason {
            SaleState::Active
        } else {
            SaleState::Annulled {
                reason: sale.annulment_reason.clone(),
            }
        }
    }
    pub fn is_terminal(&self) -> bool {
        matches!(self, SaleState::Annulled { .. })
    }
}

impl SaleLifecycle {
    /// Checks a transition and returns the patch to send, or `None` when
    /// there is nothing to change.
    pub fn transition(
        sale: &PersistedSale,
        transition: SaleTransition,
    ) -> Result<Option<SalePatch>, EngineError> {
        if SaleState::of(sale).is_terminal() {
            return Err(EngineError::OperationNotPermitted(format!(
                "sale {} is annulled and can not be changed",
                sale.id
            )));
        }

        match transition {
            SaleTransition::Reactivate => Ok(None),
            SaleTransition::Annul { reason } => {
                if reason.trim().is_empty() {
                    return Err(EngineError::MissingAnnulmentReason);
                }
                Ok(Some(SalePatch {
                    active: false,
                    annulment: reason,
                }))
            }
        }
    }

    pub fn annul(sale: &PersistedSale, reason: &str) -> Result<SalePatch, EngineError> {
        let patch = Self::transition(
            sale,
            SaleTransition::Annul {
                reason: reason.to_string(),
            },
        )?;
        patch.ok_or_else(|| EngineError::OperationNotPermitted("nothing to annul".into()))
    }
}
