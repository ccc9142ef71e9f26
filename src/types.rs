//! Shared value types: timestamps, transaction kinds and remote collections.
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Status strings understood by the remote API.
pub mod status {
    /// Purchases are recorded as already completed.
    pub const COMPLETED: &str = "Completado";
    pub const AWAITING_PAYMENT: &str = "Esperando Pago";
    pub const AWAITING_PREPARATION: &str = "Pendiente de Preparación";
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl<T: TimeZone + Eq> PartialOrd for TimeStamp<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: TimeZone + Eq> Ord for TimeStamp<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    /// Midnight UTC of the given calendar day, `None` for an impossible date.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .map(TimeStamp)
    }
    /// Accepts either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date
    /// (as produced by a date input), normalised to UTC.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(TimeStamp(dt.with_timezone(&Utc)));
        }
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
        date.and_hms_opt(0, 0, 0)
            .map(|naive| TimeStamp(Utc.from_utc_datetime(&naive)))
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }
    /// The canonical wire form, e.g. `2024-06-01T00:00:00.000Z`.
    pub fn to_canonical(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

impl Serialize for TimeStamp<Utc> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical())
    }
}

impl<'de> Deserialize<'de> for TimeStamp<Utc> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TimeStamp::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

/// The three transaction flows sharing the line-item engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Supplies bought from a provider.
    Purchase,
    /// Products ordered by a client, possibly unpaid.
    Order,
    /// Products sold to a client.
    Sale,
}

impl TransactionKind {
    pub fn collection(self) -> Collection {
        match self {
            TransactionKind::Purchase => Collection::Purchases,
            TransactionKind::Order => Collection::Orders,
            TransactionKind::Sale => Collection::Sales,
        }
    }
    /// Order and sale lines reference catalog products with a list price.
    pub fn uses_catalog_prices(self) -> bool {
        matches!(self, TransactionKind::Order | TransactionKind::Sale)
    }
    /// Order drafts only validate when submitted.
    pub fn revalidates_on_change(self) -> bool {
        !matches!(self, TransactionKind::Order)
    }
    pub fn tracks_payment(self) -> bool {
        matches!(self, TransactionKind::Order | TransactionKind::Sale)
    }
    pub fn label(self) -> &'static str {
        match self {
            TransactionKind::Purchase => "purchase",
            TransactionKind::Order => "order",
            TransactionKind::Sale => "sale",
        }
    }
}

/// Remote collections the panel reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Purchases,
    Orders,
    Sales,
    Clients,
}

impl Collection {
    /// Resource name on the remote API, also used as the local tree name.
    pub fn resource(self) -> &'static str {
        match self {
            Collection::Purchases => "compras",
            Collection::Orders => "pedidos",
            Collection::Sales => "ventas",
            Collection::Clients => "clientes",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.resource())
    }
}
