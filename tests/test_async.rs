//! Async wrapper; only built with the `async` feature.

#![cfg(feature = "async")]

mod common;

use rawline_sdk::models::{Category, ContentPatch, ItemPatch, NewItem};
use rawline_sdk::AsyncRawlineClient;

#[tokio::test]
async fn async_flow_matches_sync_client() {
    let (client, store, _media) = common::setup_client();
    let client = AsyncRawlineClient::from_client(client);

    assert!(!client.login(common::OPERATOR_EMAIL, "wrong").await.unwrap());
    assert!(client
        .login(common::OPERATOR_EMAIL, common::OPERATOR_PASSWORD)
        .await
        .unwrap());

    let created = client
        .add_item(NewItem::product("GL-001", Category::Flower))
        .await
        .unwrap();
    assert_eq!(created.price, Some(45.0));

    client
        .update_field(&created.id, ItemPatch::default().price(75.0))
        .await
        .unwrap();
    let state = client.reload().await.unwrap();
    assert_eq!(state.items[0].price, Some(75.0));

    client
        .stage_content(ContentPatch::footer_tagline("ASYNC"))
        .await
        .unwrap();
    client.save_content().await.unwrap();
    assert_eq!(
        store.content().unwrap().footer_tagline.as_deref(),
        Some("ASYNC")
    );
}

#[tokio::test]
async fn concurrent_reloads_settle_on_last() {
    let store = common::store_with_pieces(2);
    let (client, _store, _media) = common::setup_client_with(store);
    let client = AsyncRawlineClient::from_client(client);

    let (a, b) = tokio::join!(client.reload(), client.reload());
    assert_eq!(a.unwrap().items, b.unwrap().items);

    let state = client.state().await.unwrap();
    assert!(!state.loading);
    assert_eq!(state.items.len(), 2);
}

#[tokio::test]
async fn run_exposes_the_sync_client() {
    let (client, _store, _media) = common::setup_client();
    let client = AsyncRawlineClient::from_client(client);

    let count = client.run(|c| Ok(c.catalog().count())).await.unwrap();
    assert_eq!(count, 6);
}
