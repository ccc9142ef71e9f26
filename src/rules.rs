//! Field and row validation rules.
//!
//! Every rule is a plain function over the raw input string. [`RULES`] maps a
//! [`Field`] tag to its rule; nothing dispatches on field-name strings.
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static RECEIPT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("static receipt pattern"));
static QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("static quantity pattern"));
static UNIT_PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]*\.?[0-9]*$").expect("static price pattern"));

/// Everything a rule can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    CounterpartyId,
    TransactionDate,
    DeliveryDate,
    RegistrationDate,
    ClientName,
    ClientContact,
    ReceiptNumber,
    // per line item
    ReferenceId,
    Quantity,
    UnitPrice,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::CounterpartyId => "counterparty_id",
            Field::TransactionDate => "transaction_date",
            Field::DeliveryDate => "delivery_date",
            Field::RegistrationDate => "registration_date",
            Field::ClientName => "name",
            Field::ClientContact => "contact",
            Field::ReceiptNumber => "receipt_number",
            Field::ReferenceId => "reference_id",
            Field::Quantity => "quantity",
            Field::UnitPrice => "unit_price",
        }
    }
    pub fn is_row(self) -> bool {
        matches!(self, Field::ReferenceId | Field::Quantity | Field::UnitPrice)
    }
    /// Error key: the plain name, or `name_row` for line-item fields.
    pub fn key(self, row: Option<usize>) -> String {
        match row {
            Some(row) if self.is_row() => format!("{}_{}", self.name(), row),
            _ => self.name().to_string(),
        }
    }
}

pub type Rule = fn(&str) -> Result<(), &'static str>;

pub const RULES: &[(Field, Rule)] = &[
    (Field::CounterpartyId, counterparty_id),
    (Field::TransactionDate, transaction_date),
    (Field::DeliveryDate, delivery_date),
    (Field::RegistrationDate, registration_date),
    (Field::ClientName, client_name),
    (Field::ClientContact, client_contact),
    (Field::ReceiptNumber, receipt_number),
    (Field::ReferenceId, reference_id),
    (Field::Quantity, quantity),
    (Field::UnitPrice, unit_price),
];

/// Runs the rule attached to `field`. `None` means the value is valid.
pub fn validate(field: Field, value: &str) -> Option<&'static str> {
    RULES
        .iter()
        .find(|(tag, _)| *tag == field)
        .and_then(|(_, rule)| rule(value).err())
}

fn counterparty_id(value: &str) -> Result<(), &'static str> {
    required(value, "The counterparty is required")
}

fn transaction_date(value: &str) -> Result<(), &'static str> {
    required(value, "The transaction date is required")
}

fn delivery_date(value: &str) -> Result<(), &'static str> {
    required(value, "The delivery date is required")
}

fn registration_date(value: &str) -> Result<(), &'static str> {
    required(value, "The registration date is required")
}

fn client_name(value: &str) -> Result<(), &'static str> {
    if value.chars().count() < 3 {
        return Err("The name must contain at least 3 letters");
    }
    Ok(())
}

fn client_contact(value: &str) -> Result<(), &'static str> {
    if value.chars().count() < 7 {
        return Err("The phone number must contain at least 7 characters");
    }
    Ok(())
}

fn receipt_number(value: &str) -> Result<(), &'static str> {
    required(value, "The receipt number is required")?;
    let len = value.chars().count();
    if !(4..=15).contains(&len) {
        return Err("The receipt number must be between 4 and 15 characters");
    }
    if !RECEIPT_NUMBER.is_match(value) {
        return Err("The receipt number may only contain letters and numbers");
    }
    Ok(())
}

fn reference_id(value: &str) -> Result<(), &'static str> {
    required(value, "The item reference is required")
}

fn quantity(value: &str) -> Result<(), &'static str> {
    required(value, "The quantity is required")?;
    if !QUANTITY.is_match(value) {
        return Err("The quantity may only contain digits");
    }
    // checked on the parsed value the payload will carry
    match value.parse::<u64>() {
        Ok(0) => Err("The quantity must be greater than 0"),
        Ok(_) => Ok(()),
        Err(_) => Err("The quantity is too large"),
    }
}

fn unit_price(value: &str) -> Result<(), &'static str> {
    required(value, "The unit price is required")?;
    if !UNIT_PRICE.is_match(value) {
        return Err("The unit price must be a valid number");
    }
    match value.parse::<f64>() {
        Ok(price) if !price.is_finite() => Err("The unit price is too large"),
        Ok(price) if price > 0.0 => Ok(()),
        Ok(_) => Err("The unit price must be greater than 0"),
        Err(_) => Err("The unit price must be a valid number"),
    }
}

fn required(value: &str, message: &'static str) -> Result<(), &'static str> {
    if value.is_empty() {
        return Err(message);
    }
    Ok(())
}

/// Field key to message. A missing key means the field is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.0.insert(key.into(), message.into());
    }
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }
    /// Records the verdict of one rule run: sets the key on failure, clears it on success.
    pub fn record(&mut self, key: String, verdict: Option<&str>) {
        match verdict {
            Some(message) => self.insert(key, message),
            None => {
                self.0.remove(&key);
            }
        }
    }
    /// Runs `field`'s rule and records the outcome.
    pub fn check(&mut self, field: Field, row: Option<usize>, value: &str) {
        self.record(field.key(row), validate(field, value));
    }
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn clear(&mut self) {
        self.0.clear();
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
    /// Drops the errors of `removed` and moves every higher row key down by one.
    pub fn shift_rows_after(&mut self, removed: usize) {
        let entries = std::mem::take(&mut self.0);
        for (key, message) in entries {
            let row_key = split_row_key(&key).map(|(name, row)| (name.to_string(), row));
            match row_key {
                Some((_, row)) if row == removed => {}
                Some((name, row)) if row > removed => {
                    self.0.insert(format!("{}_{}", name, row - 1), message);
                }
                _ => {
                    self.0.insert(key, message);
                }
            }
        }
    }
}

fn split_row_key(key: &str) -> Option<(&str, usize)> {
    let (name, row) = key.rsplit_once('_')?;
    let is_row_field = [Field::ReferenceId, Field::Quantity, Field::UnitPrice]
        .iter()
        .any(|field| field.name() == name);
    if !is_row_field {
        return None;
    }
    row.parse().ok().map(|row| (name, row))
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "{} invalid field(s) [{}]", self.0.len(), keys.join(", "))
    }
}
