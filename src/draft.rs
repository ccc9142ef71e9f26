//! In-progress purchases, orders and sales.
//!
//! A [`TransactionDraft`] owns its [`LineItemLedger`] and the validation
//! errors shown next to the form. Purchase and sale drafts revalidate the
//! field that just changed; order drafts only validate on submit.
use crate::error::EngineError;
use crate::ledger::{ItemField, LineItemLedger, PriceCatalog, parse_price};
use crate::payload::{OrderPayload, Payload, ProductLine, PurchasePayload, SalePayload, SupplyLine};
use crate::rules::{Field, ValidationErrors};
use crate::settings::Settings;
use crate::types::{TimeStamp, TransactionKind, status};
use crate::utils;
use chrono::Utc;

/// Header fields of a draft a form can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    CounterpartyId,
    TransactionDate,
    DeliveryDate,
    RegistrationDate,
    PaymentDate,
    /// Receipt number for purchases, order number or sale number otherwise.
    ExternalNumber,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    kind: TransactionKind,
    id: Option<u64>,
    counterparty_id: String,
    transaction_date: String,
    delivery_date: String,
    registration_date: String,
    payment_date: String,
    external_number: String,
    status: String,
    paid: bool,
    ledger: LineItemLedger,
    errors: ValidationErrors,
    rekey_errors_on_remove: bool,
}

impl TransactionDraft {
    pub fn new(kind: TransactionKind) -> Self {
        let (external_number, status, paid) = match kind {
            TransactionKind::Purchase => (String::new(), status::COMPLETED, false),
            TransactionKind::Order => (utils::new_order_number(), status::AWAITING_PAYMENT, false),
            TransactionKind::Sale => (String::new(), status::AWAITING_PREPARATION, true),
        };
        Self {
            kind,
            id: None,
            counterparty_id: String::new(),
            transaction_date: String::new(),
            delivery_date: String::new(),
            registration_date: String::new(),
            payment_date: String::new(),
            external_number,
            status: status.to_string(),
            paid,
            ledger: LineItemLedger::new(),
            errors: ValidationErrors::new(),
            rekey_errors_on_remove: false,
        }
    }
    pub fn purchase() -> Self {
        Self::new(TransactionKind::Purchase)
    }
    pub fn order() -> Self {
        Self::new(TransactionKind::Order)
    }
    pub fn sale() -> Self {
        Self::new(TransactionKind::Sale)
    }
    /// Edit mode: submitting updates record `id` instead of creating one.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.rekey_errors_on_remove = settings.rekey_errors_on_remove;
        self
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }
    pub fn id(&self) -> Option<u64> {
        self.id
    }
    pub fn status(&self) -> &str {
        &self.status
    }
    pub fn paid(&self) -> bool {
        self.paid
    }
    pub fn ledger(&self) -> &LineItemLedger {
        &self.ledger
    }
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }
    pub fn total(&self) -> f64 {
        self.ledger.total()
    }
    pub fn subtotal(&self) -> f64 {
        self.ledger.subtotal()
    }
    pub fn value_of(&self, field: DraftField) -> &str {
        match field {
            DraftField::CounterpartyId => &self.counterparty_id,
            DraftField::TransactionDate => &self.transaction_date,
            DraftField::DeliveryDate => &self.delivery_date,
            DraftField::RegistrationDate => &self.registration_date,
            DraftField::PaymentDate => &self.payment_date,
            DraftField::ExternalNumber => &self.external_number,
        }
    }

    /// Assigns a header field, revalidating it unless this is an order.
    pub fn handle_change(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::CounterpartyId => self.counterparty_id = value,
            DraftField::TransactionDate => self.transaction_date = value,
            DraftField::DeliveryDate => self.delivery_date = value,
            DraftField::RegistrationDate => self.registration_date = value,
            DraftField::PaymentDate => self.payment_date = value,
            DraftField::ExternalNumber => self.external_number = value,
        }

        if !self.kind.revalidates_on_change() {
            return;
        }
        if let Some(rule) = self.rule_for(field) {
            let value = self.value_of(field).to_string();
            self.errors.check(rule, None, &value);
        }
    }

    /// Flips the paid checkbox of an order or sale.
    ///
    /// Paying moves the draft to "awaiting preparation" and keeps any payment
    /// date already typed; unpaying clears it and goes back to "awaiting payment".
    pub fn set_paid(&mut self, paid: bool) -> Result<(), EngineError> {
        if !self.kind.tracks_payment() {
            return Err(EngineError::OperationNotPermitted(format!(
                "a {} has no payment state",
                self.kind.label()
            )));
        }
        self.paid = paid;
        if paid {
            self.status = status::AWAITING_PREPARATION.to_string();
        } else {
            self.payment_date.clear();
            self.status = status::AWAITING_PAYMENT.to_string();
        }
        Ok(())
    }

    pub fn add_item(&mut self) -> usize {
        self.ledger.add_item()
    }

    /// Writes a line-item column. Order and sale lines take their price from
    /// `catalog` when the reference changes.
    pub fn update_item(
        &mut self,
        index: usize,
        field: ItemField,
        raw: &str,
        catalog: Option<&dyn PriceCatalog>,
    ) -> Result<(), EngineError> {
        let catalog = if self.kind.uses_catalog_prices() { catalog } else { None };
        self.ledger.update_item(index, field, raw, catalog)?;

        if self.kind.revalidates_on_change() {
            let rule = item_rule(field);
            let value = self.ledger.get(index).map(|item| item.value_of(field)).unwrap_or_default();
            self.errors.check(rule, Some(index), value);
        }
        Ok(())
    }

    /// Removes a row. Unless re-keying is enabled, errors recorded against
    /// later rows keep their old index until the next validation pass.
    pub fn remove_item(&mut self, index: usize) -> Result<(), EngineError> {
        self.ledger.remove_item(index)?;
        if self.rekey_errors_on_remove {
            self.errors.shift_rows_after(index);
        }
        Ok(())
    }

    /// Runs every rule that applies to this kind of draft over every field and row.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for field in header_fields(self.kind) {
            if let Some(rule) = self.rule_for(*field) {
                errors.check(rule, None, self.value_of(*field));
            }
        }
        if self.ledger.is_empty() {
            errors.insert("line_items", "At least one line item is required");
        }
        for (row, item) in self.ledger.items().iter().enumerate() {
            for field in [ItemField::ReferenceId, ItemField::Quantity, ItemField::UnitPrice] {
                errors.check(item_rule(field), Some(row), item.value_of(field));
            }
        }
        errors
    }

    /// Full validation pass; the result replaces the errors shown on the form.
    pub fn check(&mut self) -> Result<(), EngineError> {
        self.errors = self.validate();
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(self.errors.clone()))
        }
    }

    /// Purchases may not list the same supply twice.
    pub fn check_duplicates(&self) -> Result<(), EngineError> {
        if self.kind == TransactionKind::Purchase && !self.ledger.has_unique_references() {
            return Err(EngineError::DuplicateReference);
        }
        Ok(())
    }

    /// Builds the immutable body sent to the remote API.
    pub fn build_payload(&self) -> Result<Payload, EngineError> {
        let payload = match self.kind {
            TransactionKind::Purchase => Payload::Purchase(PurchasePayload {
                provider_id: parse_id("id_proveedor", &self.counterparty_id)?,
                purchase_date: parse_date("fecha_compra", &self.transaction_date)?,
                registration_date: parse_date("fecha_registro", &self.registration_date)?,
                receipt_number: self.external_number.clone(),
                status: self.status.clone(),
                total: self.total(),
                items: self
                    .ledger
                    .items()
                    .iter()
                    .map(|item| {
                        Ok(SupplyLine {
                            supply_id: parse_id("id_insumo", item.reference_id())?,
                            quantity: parse_line_quantity(item.quantity())?,
                            unit_price: parse_price(item.unit_price()),
                        })
                    })
                    .collect::<Result<_, EngineError>>()?,
            }),
            TransactionKind::Order => Payload::Order(OrderPayload {
                client_id: parse_id("id_cliente", &self.counterparty_id)?,
                order_number: self.external_number.clone(),
                delivery_date: parse_date("fecha_entrega", &self.delivery_date)?,
                payment_date: if self.paid && !self.payment_date.is_empty() {
                    Some(parse_date("fecha_pago", &self.payment_date)?)
                } else {
                    None
                },
                status: payment_status(self.paid).to_string(),
                paid: self.paid,
                total: self.total(),
                items: self.product_lines()?,
            }),
            TransactionKind::Sale => Payload::Sale(SalePayload {
                client_id: parse_id("id_cliente", &self.counterparty_id)?,
                sale_number: self.external_number.clone(),
                sale_date: parse_date("fecha_venta", &self.transaction_date)?,
                delivery_date: parse_date("fecha_entrega", &self.delivery_date)?,
                status: self.status.clone(),
                paid: self.paid,
                total: self.total(),
                items: self.product_lines()?,
            }),
        };
        Ok(payload)
    }

    /// Back to a blank draft of the same kind, as after closing the form.
    pub fn reset(&mut self) {
        let rekey = self.rekey_errors_on_remove;
        *self = Self::new(self.kind);
        self.rekey_errors_on_remove = rekey;
    }

    fn product_lines(&self) -> Result<Vec<ProductLine>, EngineError> {
        self.ledger
            .items()
            .iter()
            .map(|item| {
                Ok(ProductLine {
                    product_id: parse_id("id_producto", item.reference_id())?,
                    quantity: parse_line_quantity(item.quantity())?,
                    unit_price: parse_price(item.unit_price()),
                    subtotal: item.subtotal(),
                })
            })
            .collect()
    }

    fn rule_for(&self, field: DraftField) -> Option<Field> {
        if !header_fields(self.kind).contains(&field) {
            return None;
        }
        match field {
            DraftField::CounterpartyId => Some(Field::CounterpartyId),
            DraftField::TransactionDate => Some(Field::TransactionDate),
            DraftField::DeliveryDate => Some(Field::DeliveryDate),
            DraftField::RegistrationDate => Some(Field::RegistrationDate),
            DraftField::ExternalNumber => Some(Field::ReceiptNumber),
            DraftField::PaymentDate => None,
        }
    }
}

// header fields carrying a rule, per kind
fn header_fields(kind: TransactionKind) -> &'static [DraftField] {
    match kind {
        TransactionKind::Purchase => &[
            DraftField::CounterpartyId,
            DraftField::TransactionDate,
            DraftField::RegistrationDate,
            DraftField::ExternalNumber,
        ],
        TransactionKind::Order => &[DraftField::CounterpartyId, DraftField::DeliveryDate],
        TransactionKind::Sale => &[
            DraftField::CounterpartyId,
            DraftField::TransactionDate,
            DraftField::DeliveryDate,
        ],
    }
}

fn item_rule(field: ItemField) -> Field {
    match field {
        ItemField::ReferenceId => Field::ReferenceId,
        ItemField::Quantity => Field::Quantity,
        ItemField::UnitPrice => Field::UnitPrice,
    }
}

fn payment_status(paid: bool) -> &'static str {
    if paid {
        status::AWAITING_PREPARATION
    } else {
        status::AWAITING_PAYMENT
    }
}

fn parse_id(field: &'static str, raw: &str) -> Result<u64, EngineError> {
    raw.trim().parse().map_err(|_| EngineError::InvalidField {
        field,
        value: raw.to_string(),
    })
}

// shared by supply and product lines
fn parse_line_quantity(raw: &str) -> Result<u64, EngineError> {
    parse_id("cantidad", raw)
}

fn parse_date(field: &'static str, raw: &str) -> Result<TimeStamp<Utc>, EngineError> {
    TimeStamp::parse(raw).ok_or_else(|| EngineError::InvalidField {
        field,
        value: raw.to_string(),
    })
}
