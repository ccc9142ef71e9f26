//! Line-item ledger, draft validation and sale lifecycle engine behind the
//! bakery admin panel's purchase, order and sale forms.

pub mod api;
pub mod client;
pub mod document;
pub mod draft;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod listing;
pub mod payload;
pub mod rules;
pub mod service;
pub mod settings;
pub mod store;
pub mod types;
pub mod utils;

pub use error::EngineError;
