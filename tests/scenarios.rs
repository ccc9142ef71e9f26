use anyhow::Context;
use bakery_ledger::{
    EngineError,
    api::{RemoteApi, TracingNotifier},
    client::{ClientDraft, ClientField},
    draft::{DraftField, TransactionDraft},
    ledger::ItemField,
    lifecycle::SaleState,
    listing::{self, SaleQuery},
    payload::Payload,
    service::Coordinator,
    store::SledApi,
    types::{Collection, status},
};
use chrono::NaiveDate;
use sled::open;
use std::collections::HashMap;
use std::sync::Arc;

use tempfile::tempdir; // Use for test db cleanup.

fn service_at(path: &std::path::Path) -> anyhow::Result<Coordinator<SledApi, TracingNotifier>> {
    let db = Arc::new(open(path)?);
    db.clear()?;
    Ok(Coordinator::new(SledApi::new(db), TracingNotifier))
}

fn new_client(
    service: &Coordinator<SledApi, TracingNotifier>,
    name: &str,
) -> anyhow::Result<u64> {
    let mut draft = ClientDraft::new();
    draft.handle_change(ClientField::Name, name);
    draft.handle_change(ClientField::Contact, "3104567890");
    draft.handle_change(ClientField::DocumentType, "CC");
    draft.handle_change(ClientField::DocumentNumber, "1020304050");
    Ok(service.submit_client(&mut draft)?.id)
}

fn new_sale(
    service: &Coordinator<SledApi, TracingNotifier>,
    client_id: u64,
    number: &str,
    day: &str,
) -> anyhow::Result<u64> {
    let catalog: HashMap<u64, f64> = [(1, 1800.0), (2, 3500.0)].into_iter().collect();
    let mut draft = TransactionDraft::sale();
    draft.handle_change(DraftField::CounterpartyId, client_id.to_string());
    draft.handle_change(DraftField::ExternalNumber, number);
    draft.handle_change(DraftField::TransactionDate, day);
    draft.handle_change(DraftField::DeliveryDate, day);
    for (product, quantity) in [("1", "6"), ("2", "1")] {
        let row = draft.add_item();
        draft.update_item(row, ItemField::ReferenceId, product, Some(&catalog))?;
        draft.update_item(row, ItemField::Quantity, quantity, Some(&catalog))?;
    }
    Ok(service.submit(&mut draft)?.id)
}

#[test]
fn purchase_is_stored_and_listed() -> anyhow::Result<()> {
    // Sled locks its directory, so every test opens its own database under a
    // temporary dir.
    let temp_dir = tempdir()?;
    let service = service_at(&temp_dir.path().join("test_purchase.db"))?;

    let mut draft = TransactionDraft::purchase();
    draft.handle_change(DraftField::CounterpartyId, "3");
    draft.handle_change(DraftField::TransactionDate, "2024-02-10");
    draft.handle_change(DraftField::RegistrationDate, "2024-02-11");
    draft.handle_change(DraftField::ExternalNumber, "FAC2024001");
    for (supply, quantity, price) in [("4", "10", "2.5"), ("9", "3", "12")] {
        let row = draft.add_item();
        draft.update_item(row, ItemField::ReferenceId, supply, None)?;
        draft.update_item(row, ItemField::Quantity, quantity, None)?;
        draft.update_item(row, ItemField::UnitPrice, price, None)?;
    }
    assert_eq!(draft.total(), 61.0);

    let submitted = service
        .submit(&mut draft)
        .context("Purchase failed on submit: ")?;

    let refreshed = submitted.refreshed.context("purchases were not refetched")?;
    assert_eq!(refreshed.len(), 1);
    let Payload::Purchase(purchase) = &refreshed[0].payload else {
        anyhow::bail!("expected a purchase record");
    };
    assert_eq!(purchase.status, status::COMPLETED);
    assert_eq!(purchase.total, 61.0);
    assert_eq!(purchase.items.len(), 2);
    assert_eq!(purchase.items[1].unit_price, 12.0);
    assert_eq!(draft, TransactionDraft::purchase());

    Ok(())
}

#[test]
fn paid_order_waits_for_preparation() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let service = service_at(&temp_dir.path().join("test_order.db"))?;
    let client_id = new_client(&service, "Panadería Central")?;

    let catalog: HashMap<u64, f64> = [(5, 2.5)].into_iter().collect();
    let mut unpaid = TransactionDraft::order();
    unpaid.handle_change(DraftField::CounterpartyId, client_id.to_string());
    unpaid.handle_change(DraftField::DeliveryDate, "2024-09-01");
    let row = unpaid.add_item();
    unpaid.update_item(row, ItemField::ReferenceId, "5", Some(&catalog))?;
    unpaid.update_item(row, ItemField::Quantity, "3", Some(&catalog))?;
    let mut paid = unpaid.clone();
    paid.set_paid(true)?;
    paid.handle_change(DraftField::PaymentDate, "2024-08-20");

    service.submit(&mut unpaid)?;
    let paid_id = service.submit(&mut paid)?.id;

    let orders = service.refresh(Collection::Orders)?;
    assert_eq!(orders.len(), 2);
    let pending = listing::pending_preparation(&orders);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, paid_id);
    let order = pending[0].as_order().context("expected an order")?;
    assert_eq!(order.total, 7.5);
    assert_eq!(order.items[0].subtotal, 7.5);
    assert!(order.payment_date.is_some());

    Ok(())
}

#[test]
fn sale_is_annulled_once() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let service = service_at(&temp_dir.path().join("test_annul.db"))?;
    let client_id = new_client(&service, "Ana Gómez")?;
    let sale_id = new_sale(&service, client_id, "V0001", "2024-03-04")?;

    let sales = service.refresh_sales()?;
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].sale.total, 6.0 * 1800.0 + 3500.0);
    assert_eq!(SaleState::of(&sales[0]), SaleState::Active);

    let refreshed = service
        .annul_sale_by_id(&sales, sale_id, "cliente canceló")
        .context("Sale failed on annulment: ")?
        .context("sales were not refetched")?;

    let annulled = &refreshed[0];
    assert!(!annulled.active);
    assert_eq!(annulled.annulment_reason.as_deref(), Some("cliente canceló"));
    assert!(annulled.updated_at >= annulled.created_at);

    // a second annulment is refused before the store is touched
    let before = service.api().load(Collection::Sales, sale_id)?;
    assert!(matches!(
        service.annul_sale(annulled, "otra vez"),
        Err(EngineError::OperationNotPermitted(_))
    ));
    assert!(matches!(
        service.reactivate_sale(annulled),
        Err(EngineError::OperationNotPermitted(_))
    ));
    assert_eq!(service.api().load(Collection::Sales, sale_id)?, before);

    Ok(())
}

#[test]
fn sales_are_filtered_and_paged() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let service = service_at(&temp_dir.path().join("test_listing.db"))?;
    let ana = new_client(&service, "Ana Gómez")?;
    let luis = new_client(&service, "Luis Pardo")?;
    for day in 1..=6 {
        new_sale(&service, ana, &format!("A{day:03}"), &format!("2024-05-0{day}"))?;
    }
    new_sale(&service, luis, "L001", "2024-05-03")?;

    let clients = service.refresh(Collection::Clients)?;
    let sales = service.refresh_sales()?;
    assert_eq!(sales.len(), 7);

    let query = SaleQuery {
        client_name: "gómez".into(),
        ..SaleQuery::default()
    };
    let anas = listing::filter_sales(&sales, &clients, &query);
    assert_eq!(anas.len(), 6);

    // five rows per page by default
    let first = service.sales_page(&query, 1)?;
    assert_eq!(first.sales.len(), 5);
    assert_eq!(first.page_count, 2);
    assert_eq!(first.matches, 6);
    let second = service.sales_page(&query, 2)?;
    assert_eq!(second.sales.len(), 1);
    assert!(second.sales.iter().all(|sale| sale.sale.client_id == ana));
    assert!(service.sales_page(&query, 3)?.sales.is_empty());

    let query = SaleQuery {
        client_name: String::new(),
        from: NaiveDate::from_ymd_opt(2024, 5, 3),
        to: NaiveDate::from_ymd_opt(2024, 5, 4),
    };
    assert_eq!(listing::filter_sales(&sales, &clients, &query).len(), 3);

    Ok(())
}

#[test]
fn client_is_edited_in_place() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let service = service_at(&temp_dir.path().join("test_client.db"))?;
    let id = new_client(&service, "Luis Pardo")?;

    let stored = service.api().load(Collection::Clients, id)?;
    let client = stored.as_client().context("expected a client")?;
    let mut draft = ClientDraft::editing(id, client);
    draft.handle_change(ClientField::Email, "luis@example.com");
    let submitted = service.submit_client(&mut draft)?;

    assert_eq!(submitted.id, id);
    let clients = service.api().fetch_collection(Collection::Clients)?;
    assert_eq!(clients.len(), 1);
    assert_eq!(
        listing::find_client(&clients, id).map(|c| c.email.as_str()),
        Some("luis@example.com")
    );
    assert_eq!(clients[0].created_at, stored.created_at);

    Ok(())
}

#[test]
fn rejected_drafts_leave_the_store_empty() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let service = service_at(&temp_dir.path().join("test_rejected.db"))?;

    let mut draft = TransactionDraft::purchase();
    draft.handle_change(DraftField::CounterpartyId, "3");
    draft.handle_change(DraftField::TransactionDate, "2024-02-10");
    draft.handle_change(DraftField::RegistrationDate, "2024-02-11");
    draft.handle_change(DraftField::ExternalNumber, "FAC1");
    for _ in 0..2 {
        let row = draft.add_item();
        draft.update_item(row, ItemField::ReferenceId, "4", None)?;
        draft.update_item(row, ItemField::Quantity, "1", None)?;
        draft.update_item(row, ItemField::UnitPrice, "1", None)?;
    }
    assert_eq!(service.submit(&mut draft), Err(EngineError::DuplicateReference));

    draft.update_item(1, ItemField::Quantity, "0", None)?;
    assert!(matches!(service.submit(&mut draft), Err(EngineError::Validation(_))));

    assert!(service.refresh(Collection::Purchases)?.is_empty());
    assert_eq!(draft.ledger().len(), 2);

    Ok(())
}
