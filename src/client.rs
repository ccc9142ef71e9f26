use crate::error::EngineError;
use crate::payload::{ClientPayload, Payload};
use crate::rules::{Field, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientField {
    Name,
    Contact,
    DocumentType,
    DocumentNumber,
    Email,
}

/// Create/edit form for a client. Validated only when saved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientDraft {
    id: Option<u64>,
    name: String,
    contact: String,
    document_type: String,
    document_number: String,
    email: String,
    errors: ValidationErrors,
}

impl ClientDraft {
    pub fn new() -> Self {
        Self::default()
    }
    /// Prefills the form from a saved client.
    pub fn editing(id: u64, client: &ClientPayload) -> Self {
        Self {
            id: Some(id),
            name: client.name.clone(),
            contact: client.contact.clone(),
            document_type: client.document_type.clone(),
            document_number: client.document_number.clone(),
            email: client.email.clone(),
            errors: ValidationErrors::new(),
        }
    }
    pub fn id(&self) -> Option<u64> {
        self.id
    }
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn handle_change(&mut self, field: ClientField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ClientField::Name => self.name = value,
            ClientField::Contact => self.contact = value,
            ClientField::DocumentType => self.document_type = value,
            ClientField::DocumentNumber => self.document_number = value,
            ClientField::Email => self.email = value,
        }
    }

    pub fn check(&mut self) -> Result<(), EngineError> {
        let mut errors = ValidationErrors::new();
        errors.check(Field::ClientName, None, &self.name);
        errors.check(Field::ClientContact, None, &self.contact);
        self.errors = errors;
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(self.errors.clone()))
        }
    }

    pub fn build_payload(&self) -> Payload {
        Payload::Client(ClientPayload {
            name: self.name.clone(),
            contact: self.contact.clone(),
            document_type: self.document_type.clone(),
            document_number: self.document_number.clone(),
            email: self.email.clone(),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
