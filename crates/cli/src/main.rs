//! Walks one order through its lifecycle against the in-memory store and
//! prints each state as JSON. Useful as a smoke test of a configured build.

use std::sync::Arc;

use anyhow::Context;

use bookshop_infra::{InMemoryShopStore, Shop, ShopConfig};
use bookshop_inventory::ItemKind;
use bookshop_members::Address;

fn main() -> anyhow::Result<()> {
    let config = ShopConfig::from_env().context("loading configuration")?;
    bookshop_observability::init_with(config.log_format);
    tracing::info!(?config, "starting bookshop demo");

    let shop = Shop::new(Arc::new(InMemoryShopStore::new()), &config);

    let member_id = shop
        .members
        .join("Hong Gildong", Address::new("Seoul", "Hangang-ro", "12345")?)?;
    let book_id = shop.catalog.register_item(
        "JPA Book",
        10_000,
        10,
        ItemKind::Book {
            author: "Kim Younghan".to_string(),
            isbn: "9788960777330".to_string(),
        },
    )?;

    let order_id = shop.orders.place_order(member_id, &[(book_id, 2)])?;
    let placed = shop.orders.find_order(order_id)?;
    println!("{}", serde_json::to_string_pretty(&placed)?);
    tracing::info!(stock = shop.ledger.available(book_id)?, "after placing");

    match shop.orders.place_order(member_id, &[(book_id, 11)]) {
        Ok(_) => anyhow::bail!("oversized order unexpectedly succeeded"),
        Err(err) => tracing::info!(%err, "oversized order rejected"),
    }

    shop.orders.cancel_order(order_id)?;
    let cancelled = shop.orders.find_order(order_id)?;
    println!("{}", serde_json::to_string_pretty(&cancelled)?);
    tracing::info!(stock = shop.ledger.available(book_id)?, "after cancelling");

    Ok(())
}
