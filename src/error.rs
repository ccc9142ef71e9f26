use crate::rules::ValidationErrors;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum EngineError {
    #[error("Draft failed validation: {0}")]
    Validation(ValidationErrors),
    #[error("Duplicate supplies cannot be selected")]
    DuplicateReference,
    #[error("Operation not permitted: {0}")]
    OperationNotPermitted(String),
    #[error("An annulment reason is required")]
    MissingAnnulmentReason,
    #[error("A submission is already in flight")]
    SubmitInFlight,
    #[error("Line item {0} does not exist")]
    RowOutOfRange(usize),
    #[error("Field {field} holds an unparsable value {value:?}")]
    InvalidField { field: &'static str, value: String },
    #[error("Record {0} was not found")]
    UnknownRecord(u64),
    #[error("Record {0} is not a sale")]
    NotASale(u64),
    #[error("Remote call failed: {0}")]
    Remote(String),
}

impl EngineError {
    pub(crate) fn remote(err: anyhow::Error) -> Self {
        EngineError::Remote(format!("{err:#}"))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Sled(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(String),
    #[error(transparent)]
    Decode(#[from] minicbor::decode::Error),
    #[error("{collection} record {id} not found")]
    NotFound { collection: &'static str, id: u64 },
    #[error("record {0} is not a sale and cannot be patched")]
    NotASale(u64),
}
