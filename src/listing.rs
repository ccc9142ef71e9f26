//! Filtering and paging of fetched collections for the list views.
use crate::payload::{ClientPayload, PersistedSale, Record};
use crate::types::status;
use chrono::NaiveDate;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleQuery {
    /// Case-insensitive fragment of the client's name. Empty matches all.
    pub client_name: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// One page of a filtered sales listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesPage {
    pub sales: Vec<PersistedSale>,
    /// 1-based.
    pub page: usize,
    pub page_count: usize,
    /// Matches across all pages.
    pub matches: usize,
}

pub fn find_client(clients: &[Record], id: u64) -> Option<&ClientPayload> {
    clients
        .iter()
        .find(|record| record.id == id)
        .and_then(Record::as_client)
}

/// Sales whose client name contains the query fragment and, when both bounds
/// are set, whose sale day lies within `[from, to]`.
pub fn filter_sales<'a>(
    sales: &'a [PersistedSale],
    clients: &[Record],
    query: &SaleQuery,
) -> Vec<&'a PersistedSale> {
    let needle = query.client_name.to_lowercase();
    sales
        .iter()
        .filter(|sale| {
            if needle.is_empty() {
                return true;
            }
            find_client(clients, sale.sale.client_id)
                .is_some_and(|client| client.name.to_lowercase().contains(&needle))
        })
        .filter(|sale| match (query.from, query.to) {
            (Some(from), Some(to)) => {
                let day = sale.sale.sale_date.date();
                from <= day && day <= to
            }
            _ => true,
        })
        .collect()
}

/// Orders that have been paid and wait to be prepared, i.e. the ones a sale
/// can be created from.
pub fn pending_preparation(orders: &[Record]) -> Vec<&Record> {
    orders
        .iter()
        .filter(|record| {
            record
                .as_order()
                .is_some_and(|order| order.status == status::AWAITING_PREPARATION)
        })
        .collect()
}

pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// The 1-based `page` of `items`; empty when out of range.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}
