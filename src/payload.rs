//! Submission payloads and the records the remote API hands back.
//!
//! Field names on the wire follow the existing remote API; the Rust names are
//! mapped with `serde(rename)`. Records are also CBOR-encodable so the local
//! store can keep them.
use crate::error::EngineError;
use crate::types::{Collection, TimeStamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A purchased supply line. Carries no subtotal; the remote API derives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, minicbor::Encode, minicbor::Decode)]
pub struct SupplyLine {
    #[n(0)]
    #[serde(rename = "id_insumo")]
    pub supply_id: u64,
    #[n(1)]
    #[serde(rename = "cantidad")]
    pub quantity: u64,
    #[n(2)]
    #[serde(rename = "precio_unitario")]
    pub unit_price: f64,
}

/// An ordered or sold product line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, minicbor::Encode, minicbor::Decode)]
pub struct ProductLine {
    #[n(0)]
    #[serde(rename = "id_producto")]
    pub product_id: u64,
    #[n(1)]
    #[serde(rename = "cantidad")]
    pub quantity: u64,
    #[n(2)]
    #[serde(rename = "precio_unitario")]
    pub unit_price: f64,
    #[n(3)]
    pub subtotal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, minicbor::Encode, minicbor::Decode)]
pub struct PurchasePayload {
    #[n(0)]
    #[serde(rename = "id_proveedor")]
    pub provider_id: u64,
    #[n(1)]
    #[serde(rename = "fecha_compra")]
    pub purchase_date: TimeStamp<Utc>,
    #[n(2)]
    #[serde(rename = "fecha_registro")]
    pub registration_date: TimeStamp<Utc>,
    #[n(3)]
    #[serde(rename = "numero_recibo")]
    pub receipt_number: String,
    #[n(4)]
    #[serde(rename = "estado")]
    pub status: String,
    #[n(5)]
    pub total: f64,
    #[n(6)]
    #[serde(rename = "detalleCompras")]
    pub items: Vec<SupplyLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, minicbor::Encode, minicbor::Decode)]
pub struct OrderPayload {
    #[n(0)]
    #[serde(rename = "id_cliente")]
    pub client_id: u64,
    #[n(1)]
    #[serde(rename = "numero_pedido")]
    pub order_number: String,
    #[n(2)]
    #[serde(rename = "fecha_entrega")]
    pub delivery_date: TimeStamp<Utc>,
    #[n(3)]
    #[serde(rename = "fecha_pago")]
    pub payment_date: Option<TimeStamp<Utc>>,
    #[n(4)]
    #[serde(rename = "estado")]
    pub status: String,
    #[n(5)]
    #[serde(rename = "pagado")]
    pub paid: bool,
    #[n(6)]
    pub total: f64,
    #[n(7)]
    #[serde(rename = "detallesPedido")]
    pub items: Vec<ProductLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, minicbor::Encode, minicbor::Decode)]
pub struct SalePayload {
    #[n(0)]
    #[serde(rename = "id_cliente")]
    pub client_id: u64,
    #[n(1)]
    #[serde(rename = "numero_venta")]
    pub sale_number: String,
    #[n(2)]
    #[serde(rename = "fecha_venta")]
    pub sale_date: TimeStamp<Utc>,
    #[n(3)]
    #[serde(rename = "fecha_entrega")]
    pub delivery_date: TimeStamp<Utc>,
    #[n(4)]
    #[serde(rename = "estado")]
    pub status: String,
    #[n(5)]
    #[serde(rename = "pagado")]
    pub paid: bool,
    #[n(6)]
    pub total: f64,
    #[n(7)]
    #[serde(rename = "detalleVentas")]
    pub items: Vec<ProductLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, minicbor::Encode, minicbor::Decode)]
pub struct ClientPayload {
    #[n(0)]
    #[serde(rename = "nombre")]
    pub name: String,
    #[n(1)]
    #[serde(rename = "contacto")]
    pub contact: String,
    #[n(2)]
    #[serde(rename = "tipo_documento")]
    pub document_type: String,
    #[n(3)]
    #[serde(rename = "numero_documento")]
    pub document_number: String,
    #[n(4)]
    pub email: String,
}

/// Body of a create or update call. Serialises as the bare inner object.
#[derive(Debug, Clone, PartialEq, Serialize, minicbor::Encode, minicbor::Decode)]
#[serde(untagged)]
pub enum Payload {
    #[n(0)]
    Purchase(#[n(0)] PurchasePayload),
    #[n(1)]
    Order(#[n(0)] OrderPayload),
    #[n(2)]
    Sale(#[n(0)] SalePayload),
    #[n(3)]
    Client(#[n(0)] ClientPayload),
}

impl Payload {
    pub fn collection(&self) -> Collection {
        match self {
            Payload::Purchase(_) => Collection::Purchases,
            Payload::Order(_) => Collection::Orders,
            Payload::Sale(_) => Collection::Sales,
            Payload::Client(_) => Collection::Clients,
        }
    }
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Partial update used only to annul a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePatch {
    #[serde(rename = "activo")]
    pub active: bool,
    #[serde(rename = "anulacion")]
    pub annulment: String,
}

/// A server-confirmed entry of any collection.
#[derive(Debug, Clone, PartialEq, Serialize, minicbor::Encode, minicbor::Decode)]
pub struct Record {
    #[n(0)]
    pub id: u64,
    #[n(1)]
    #[serde(rename = "activo")]
    pub active: bool,
    #[n(2)]
    #[serde(rename = "anulacion")]
    pub annulment: Option<String>,
    #[n(3)]
    #[serde(rename = "createdAt")]
    pub created_at: TimeStamp<Utc>,
    #[n(4)]
    #[serde(rename = "updatedAt")]
    pub updated_at: TimeStamp<Utc>,
    #[n(5)]
    #[serde(flatten)]
    pub payload: Payload,
}

impl Record {
    pub fn new(id: u64, payload: Payload) -> Self {
        let now = TimeStamp::new();
        Self {
            id,
            active: true,
            annulment: None,
            created_at: now.clone(),
            updated_at: now,
            payload,
        }
    }
    pub fn as_order(&self) -> Option<&OrderPayload> {
        match &self.payload {
            Payload::Order(order) => Some(order),
            _ => None,
        }
    }
    pub fn as_client(&self) -> Option<&ClientPayload> {
        match &self.payload {
            Payload::Client(client) => Some(client),
            _ => None,
        }
    }
}

/// A saved sale. `active` and `annulment_reason` only change through
/// [`crate::lifecycle::SaleLifecycle`].
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedSale {
    pub id: u64,
    pub active: bool,
    pub annulment_reason: Option<String>,
    pub created_at: TimeStamp<Utc>,
    pub updated_at: TimeStamp<Utc>,
    pub sale: SalePayload,
}

impl TryFrom<Record> for PersistedSale {
    type Error = EngineError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        match record.payload {
            Payload::Sale(sale) => Ok(PersistedSale {
                id: record.id,
                active: record.active,
                annulment_reason: record.annulment,
                created_at: record.created_at,
                updated_at: record.updated_at,
                sale,
            }),
            _ => Err(EngineError::NotASale(record.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale() -> SalePayload {
        SalePayload {
            client_id: 3,
            sale_number: "V-0001".into(),
            sale_date: TimeStamp::from_ymd(2024, 5, 1).unwrap(),
            delivery_date: TimeStamp::from_ymd(2024, 5, 2).unwrap(),
            status: crate::types::status::AWAITING_PREPARATION.into(),
            paid: true,
            total: 5.0,
            items: vec![ProductLine {
                product_id: 1,
                quantity: 2,
                unit_price: 2.5,
                subtotal: 5.0,
            }],
        }
    }

    #[test]
    fn sale_uses_remote_field_names() {
        let json = Payload::Sale(sale()).to_json().unwrap();

        assert_eq!(json["id_cliente"], 3);
        assert_eq!(json["fecha_venta"], "2024-05-01T00:00:00.000Z");
        assert_eq!(json["pagado"], true);
        assert_eq!(json["detalleVentas"][0]["id_producto"], 1);
        assert_eq!(json["detalleVentas"][0]["precio_unitario"], 2.5);
    }

    #[test]
    fn patch_shape() {
        let patch = SalePatch {
            active: false,
            annulment: "wrong client".into(),
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"activo": false, "anulacion": "wrong client"}));
    }

    #[test]
    fn record_cbor_keeps_payload() {
        let record = Record::new(9, Payload::Sale(sale()));

        let encoded = minicbor::to_vec(&record).unwrap();
        let decoded: Record = minicbor::decode(&encoded).unwrap();

        assert_eq!(record, decoded);
    }

    #[test]
    fn record_json_is_flat() {
        let record = Record::new(9, Payload::Sale(sale()));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["activo"], true);
        assert_eq!(json["numero_venta"], "V-0001");
    }

    #[test]
    fn only_sales_become_persisted_sales() {
        let client = Record::new(
            1,
            Payload::Client(ClientPayload {
                name: "Ana".into(),
                contact: "5551234".into(),
                document_type: "CC".into(),
                document_number: "100".into(),
                email: "ana@example.com".into(),
            }),
        );
        assert_eq!(PersistedSale::try_from(client), Err(EngineError::NotASale(1)));

        let persisted = PersistedSale::try_from(Record::new(2, Payload::Sale(sale()))).unwrap();
        assert!(persisted.active);
        assert_eq!(persisted.sale.total, 5.0);
    }
}
