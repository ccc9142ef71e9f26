//! Service layer: validate, build the payload, call the remote API, refetch.
use crate::api::{DocumentRenderer, Notifier, NotifyKind, RemoteApi};
use crate::client::ClientDraft;
use crate::document::SaleDocument;
use crate::draft::TransactionDraft;
use crate::error::EngineError;
use crate::lifecycle::{SaleLifecycle, SaleTransition};
use crate::listing::{self, SaleQuery, SalesPage};
use crate::payload::{ClientPayload, Payload, PersistedSale, Record};
use crate::settings::Settings;
use crate::types::Collection;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Outcome of a successful create or update.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    /// Id of the created or updated record.
    pub id: u64,
    /// The refetched collection; `None` when the refetch itself failed.
    pub refreshed: Option<Vec<Record>>,
}

pub struct Coordinator<A, N> {
    api: A,
    notifier: N,
    settings: Settings,
    in_flight: AtomicBool,
}

// releases the submit lock however the submission ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A: RemoteApi, N: Notifier> Coordinator<A, N> {
    pub fn new(api: A, notifier: N) -> Self {
        Self::with_settings(api, notifier, Settings::default())
    }

    pub fn with_settings(api: A, notifier: N, settings: Settings) -> Self {
        Self {
            api,
            notifier,
            settings,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }
    pub fn notifier(&self) -> &N {
        &self.notifier
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submit a purchase, order or sale draft.
    ///
    /// Nothing reaches the remote API unless the draft validates. On success
    /// the owning collection is refetched and the draft is reset; on failure
    /// the draft is left as it was so it can be corrected and resubmitted.
    pub fn submit(&self, draft: &mut TransactionDraft) -> Result<Submitted, EngineError> {
        let label = draft.kind().label();

        if let Err(err) = draft.check() {
            debug!(kind = label, errors = %draft.errors(), "draft failed validation");
            self.notifier
                .notify(NotifyKind::Error, "Please fill in the form correctly.");
            return Err(err);
        }
        if let Err(err) = draft.check_duplicates() {
            debug!(kind = label, "draft lists the same supply twice");
            self.notifier
                .notify(NotifyKind::Error, "Duplicate supplies cannot be selected.");
            return Err(err);
        }

        let payload = match draft.build_payload() {
            Ok(payload) => payload,
            Err(err) => {
                debug!(kind = label, %err, "payload could not be built");
                self.notifier.notify(NotifyKind::Error, &err.to_string());
                return Err(err);
            }
        };
        let id = self.send(draft.id(), &payload, label)?;

        let refreshed = self.refetch(draft.kind().collection());
        self.notifier.notify(
            NotifyKind::Success,
            &format!("The {label} has been saved successfully."),
        );
        draft.reset();

        Ok(Submitted { id, refreshed })
    }

    /// Create or update a client.
    pub fn submit_client(&self, draft: &mut ClientDraft) -> Result<Submitted, EngineError> {
        if let Err(err) = draft.check() {
            debug!(errors = %draft.errors(), "client failed validation");
            self.notifier
                .notify(NotifyKind::Error, "Please fill in the form correctly.");
            return Err(err);
        }

        let payload = draft.build_payload();
        let id = self.send(draft.id(), &payload, "client")?;

        let refreshed = self.refetch(Collection::Clients);
        self.notifier
            .notify(NotifyKind::Success, "The client has been saved successfully.");
        draft.reset();

        Ok(Submitted { id, refreshed })
    }

    pub fn refresh(&self, collection: Collection) -> Result<Vec<Record>, EngineError> {
        let records = self
            .api
            .fetch_collection(collection)
            .map_err(EngineError::remote)?;
        debug!(%collection, count = records.len(), "collection fetched");
        Ok(records)
    }

    /// The sales collection as typed sales. Records of another shape are skipped.
    pub fn refresh_sales(&self) -> Result<Vec<PersistedSale>, EngineError> {
        let records = self.refresh(Collection::Sales)?;
        Ok(records
            .into_iter()
            .filter_map(|record| match PersistedSale::try_from(record) {
                Ok(sale) => Some(sale),
                Err(err) => {
                    warn!(%err, "skipping record in sales collection");
                    None
                }
            })
            .collect())
    }

    /// Page `page` (1-based) of the sales matching `query`, sized by
    /// `settings.page_size`. Clients are fetched to resolve names.
    pub fn sales_page(&self, query: &SaleQuery, page: usize) -> Result<SalesPage, EngineError> {
        let sales = self.refresh_sales()?;
        let clients = if query.client_name.is_empty() {
            Vec::new()
        } else {
            self.refresh(Collection::Clients)?
        };

        let page_size = self.settings.page_size;
        let matches = listing::filter_sales(&sales, &clients, query);
        let rows = listing::paginate(&matches, page, page_size);
        debug!(page, page_size, matches = matches.len(), "sales page");

        Ok(SalesPage {
            sales: rows.iter().map(|sale| (*sale).clone()).collect(),
            page,
            page_count: listing::page_count(matches.len(), page_size),
            matches: matches.len(),
        })
    }

    /// Annul a saved sale and return the refetched sales.
    ///
    /// A blank reason or an already annulled sale is refused without any
    /// remote call.
    pub fn annul_sale(
        &self,
        sale: &PersistedSale,
        reason: &str,
    ) -> Result<Option<Vec<PersistedSale>>, EngineError> {
        let patch = match SaleLifecycle::annul(sale, reason) {
            Ok(patch) => patch,
            Err(err) => {
                self.notifier.notify(NotifyKind::Error, &err.to_string());
                return Err(err);
            }
        };

        if let Err(err) = self.api.submit_patch(sale.id, &patch) {
            warn!(id = sale.id, error = %err, "annulment failed");
            self.notifier.notify(
                NotifyKind::Error,
                &format!("There was a problem annulling the sale: {err}"),
            );
            return Err(EngineError::remote(err));
        }
        info!(id = sale.id, "sale annulled");

        let refreshed = match self.refresh_sales() {
            Ok(sales) => Some(sales),
            Err(err) => {
                warn!(%err, "sales refetch failed after annulment");
                None
            }
        };
        self.notifier
            .notify(NotifyKind::Success, "The sale has been annulled successfully.");
        Ok(refreshed)
    }

    /// Annul the sale with id `id` from a previously fetched list.
    pub fn annul_sale_by_id(
        &self,
        sales: &[PersistedSale],
        id: u64,
        reason: &str,
    ) -> Result<Option<Vec<PersistedSale>>, EngineError> {
        let Some(sale) = sales.iter().find(|sale| sale.id == id) else {
            self.notifier.notify(NotifyKind::Error, "Sale not found.");
            return Err(EngineError::UnknownRecord(id));
        };
        self.annul_sale(sale, reason)
    }

    /// Ask to put an annulled sale back in service. Always refused for
    /// annulled sales; a no-op for active ones.
    pub fn reactivate_sale(&self, sale: &PersistedSale) -> Result<(), EngineError> {
        match SaleLifecycle::transition(sale, SaleTransition::Reactivate) {
            Ok(_) => Ok(()),
            Err(err) => {
                self.notifier.notify(
                    NotifyKind::Error,
                    "Operation not permitted. An annulled sale can not be reactivated.",
                );
                Err(err)
            }
        }
    }

    pub fn render_sale(
        &self,
        sale: &PersistedSale,
        client: Option<&ClientPayload>,
        renderer: &dyn DocumentRenderer,
    ) -> Result<SaleDocument, EngineError> {
        let document = SaleDocument::from_sale(sale, client);
        renderer.render(&document).map_err(EngineError::remote)?;
        Ok(document)
    }

    fn send(&self, id: Option<u64>, payload: &Payload, label: &str) -> Result<u64, EngineError> {
        let _guard = self.lock()?;

        let result = match id {
            Some(id) => self.api.submit_update(id, payload).map(|()| id),
            None => self.api.submit_create(payload),
        };

        match result {
            Ok(id) => {
                info!(kind = label, id, "saved");
                Ok(id)
            }
            Err(err) => {
                warn!(kind = label, error = %err, "save failed");
                self.notifier.notify(
                    NotifyKind::Error,
                    &format!("There was a problem saving the {label}. Please try again."),
                );
                Err(EngineError::remote(err))
            }
        }
    }

    fn lock(&self) -> Result<Option<InFlight<'_>>, EngineError> {
        if !self.settings.submit_lock {
            return Ok(None);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("submission refused, another one is in flight");
            return Err(EngineError::SubmitInFlight);
        }
        Ok(Some(InFlight(&self.in_flight)))
    }

    fn refetch(&self, collection: Collection) -> Option<Vec<Record>> {
        match self.refresh(collection) {
            Ok(records) => Some(records),
            Err(err) => {
                warn!(%collection, %err, "refetch failed after save");
                None
            }
        }
    }
}
