//! A sled-backed [`RemoteApi`] for local use and tests.
//!
//! One tree per collection, keyed by big-endian record id. Records are stored
//! CBOR-encoded; ids come from [`sled::Db::generate_id`] so they grow with
//! insertion order.
use crate::api::RemoteApi;
use crate::error::StoreError;
use crate::payload::{Payload, Record, SalePatch};
use crate::types::{Collection, TimeStamp};
use std::sync::Arc;
use tracing::debug;

pub struct SledApi {
    instance: Arc<sled::Db>,
}

impl SledApi {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    fn tree(&self, collection: Collection) -> Result<sled::Tree, StoreError> {
        Ok(self.instance.open_tree(collection.resource())?)
    }

    /// Load a single record
    pub fn load(&self, collection: Collection, id: u64) -> Result<Record, StoreError> {
        let bytes = self
            .tree(collection)?
            .get(id.to_be_bytes())?
            .ok_or(StoreError::NotFound {
                collection: collection.resource(),
                id,
            })?;
        Ok(minicbor::decode(&bytes)?)
    }

    fn save(&self, collection: Collection, record: &Record) -> Result<(), StoreError> {
        let encoded =
            minicbor::to_vec(record).map_err(|err| StoreError::Encode(err.to_string()))?;
        self.tree(collection)?
            .insert(record.id.to_be_bytes(), encoded)?;
        self.instance.flush()?;
        Ok(())
    }

    fn list(&self, collection: Collection) -> Result<Vec<Record>, StoreError> {
        self.tree(collection)?
            .iter()
            .values()
            .map(|bytes| -> Result<Record, StoreError> { Ok(minicbor::decode(&bytes?)?) })
            .collect()
    }

    fn create(&self, payload: &Payload) -> Result<u64, StoreError> {
        let id = self.instance.generate_id()?;
        self.save(payload.collection(), &Record::new(id, payload.clone()))?;
        debug!(collection = %payload.collection(), id, "record created");
        Ok(id)
    }

    fn update(&self, id: u64, payload: &Payload) -> Result<(), StoreError> {
        let collection = payload.collection();
        let mut record = self.load(collection, id)?;
        record.payload = payload.clone();
        record.updated_at = TimeStamp::new();
        self.save(collection, &record)?;
        debug!(%collection, id, "record updated");
        Ok(())
    }

    fn patch(&self, id: u64, patch: &SalePatch) -> Result<(), StoreError> {
        let mut record = self.load(Collection::Sales, id)?;
        if !matches!(record.payload, Payload::Sale(_)) {
            return Err(StoreError::NotASale(id));
        }
        record.active = patch.active;
        record.annulment = Some(patch.annulment.clone());
        record.updated_at = TimeStamp::new();
        self.save(Collection::Sales, &record)?;
        debug!(id, active = patch.active, "sale patched");
        Ok(())
    }
}

impl RemoteApi for SledApi {
    fn fetch_collection(&self, collection: Collection) -> anyhow::Result<Vec<Record>> {
        Ok(self.list(collection)?)
    }

    fn submit_create(&self, payload: &Payload) -> anyhow::Result<u64> {
        Ok(self.create(payload)?)
    }

    fn submit_update(&self, id: u64, payload: &Payload) -> anyhow::Result<()> {
        Ok(self.update(id, payload)?)
    }

    fn submit_patch(&self, id: u64, patch: &SalePatch) -> anyhow::Result<()> {
        Ok(self.patch(id, patch)?)
    }
}
