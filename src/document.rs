//! The sale receipt handed to a [`crate::api::DocumentRenderer`].
//!
//! Everything here is already parsed: renderers never see raw form input.
use crate::payload::{ClientPayload, PersistedSale};
use crate::types::TimeStamp;
use chrono::Utc;

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLine {
    pub reference_id: u64,
    pub quantity: u64,
    pub unit_price: f64,
}

impl DocumentLine {
    pub fn subtotal(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleDocument {
    pub file_name: String,
    pub sale_number: String,
    pub sale_date: TimeStamp<Utc>,
    pub client: Option<ClientPayload>,
    pub items: Vec<DocumentLine>,
    pub total: f64,
    pub created_at: TimeStamp<Utc>,
    pub updated_at: TimeStamp<Utc>,
}

impl SaleDocument {
    pub fn from_sale(sale: &PersistedSale, client: Option<&ClientPayload>) -> Self {
        Self {
            file_name: format!("Comprobante_Venta_{}.pdf", sale.sale.sale_number),
            sale_number: sale.sale.sale_number.clone(),
            sale_date: sale.sale.sale_date.clone(),
            client: client.cloned(),
            items: sale
                .sale
                .items
                .iter()
                .map(|line| DocumentLine {
                    reference_id: line.product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
                .collect(),
            total: sale.sale.total,
            created_at: sale.created_at.clone(),
            updated_at: sale.updated_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{ProductLine, SalePayload};
    use crate::types::status;

    #[test]
    fn flattens_lines_and_names_the_file() {
        let sale = PersistedSale {
            id: 4,
            active: true,
            annulment_reason: None,
            created_at: TimeStamp::new(),
            updated_at: TimeStamp::new(),
            sale: SalePayload {
                client_id: 2,
                sale_number: "V-77".into(),
                sale_date: TimeStamp::from_ymd(2024, 2, 2).unwrap(),
                delivery_date: TimeStamp::from_ymd(2024, 2, 3).unwrap(),
                status: status::AWAITING_PREPARATION.into(),
                paid: true,
                total: 9.0,
                items: vec![ProductLine {
                    product_id: 12,
                    quantity: 3,
                    unit_price: 3.0,
                    subtotal: 9.0,
                }],
            },
        };

        let document = SaleDocument::from_sale(&sale, None);
        assert_eq!(document.file_name, "Comprobante_Venta_V-77.pdf");
        assert_eq!(
            document.items,
            vec![DocumentLine {
                reference_id: 12,
                quantity: 3,
                unit_price: 3.0
            }]
        );
        assert_eq!(document.items[0].subtotal(), 9.0);
        assert_eq!(document.total, 9.0);
    }
}
