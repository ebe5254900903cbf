mod support;

use std::sync::Arc;

use rust_decimal_macros::dec;
use support::{GatedProducts, InMemoryCatalog, product};
use vastra::application::catalog::CatalogService;
use vastra::cache::{CacheConfig, QueryFamily, QueryKey};

fn gated_catalog() -> (CatalogService, Arc<GatedProducts>) {
    let rest = InMemoryCatalog::new(Vec::new(), Vec::new(), None);
    let products = Arc::new(GatedProducts::default());
    let catalog = CatalogService::new(
        rest.clone(),
        products.clone(),
        rest,
        &CacheConfig::default(),
    );
    (catalog, products)
}

#[tokio::test]
async fn late_response_from_older_request_never_overwrites_newer_one() {
    let (catalog, products) = gated_catalog();
    let older_gate = products.gate();
    let newer_gate = products.gate();

    let older = tokio::spawn({
        let catalog = catalog.clone();
        async move { catalog.list_products().await }
    });
    products.wait_for_started(1).await;

    let newer = tokio::spawn({
        let catalog = catalog.clone();
        async move { catalog.list_products().await }
    });
    products.wait_for_started(2).await;

    let fresh = vec![product("Fresh Arrival", dec!(2500), 0)];
    let stale = vec![product("Stale Listing", dec!(900), 60)];

    newer_gate.send(fresh.clone()).expect("newer request waiting");
    let newer = newer.await.expect("join").expect("newer read");
    assert_eq!(newer, fresh);

    older_gate.send(stale).expect("older request waiting");
    let older = older.await.expect("join").expect("older read");
    assert_eq!(older, fresh, "superseded response resolves to the newer result");

    let cached = catalog
        .cache()
        .get_as::<Vec<vastra::domain::entities::ProductRecord>>(&QueryKey::Products)
        .expect("newer result cached");
    assert_eq!(cached, fresh);
}

#[tokio::test]
async fn read_in_flight_during_invalidation_is_not_cached() {
    let (catalog, products) = gated_catalog();
    let gate = products.gate();

    let pending = tokio::spawn({
        let catalog = catalog.clone();
        async move { catalog.list_products().await }
    });
    products.wait_for_started(1).await;

    catalog.invalidate_family(QueryFamily::Products);

    let before_write = vec![product("Before Write", dec!(100), 5)];
    gate.send(before_write.clone()).expect("request waiting");
    let result = pending.await.expect("join").expect("read");

    assert_eq!(result, before_write);
    assert!(catalog.cache().is_empty());
}

#[tokio::test]
async fn failed_read_surfaces_its_error() {
    let (catalog, products) = gated_catalog();
    drop(products.gate());

    let err = catalog.list_products().await.expect_err("gate dropped");
    assert!(err.to_string().contains("gate dropped"));
    assert!(catalog.cache().is_empty());
}
