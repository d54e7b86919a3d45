use std::sync::Arc;

use anyhow::Context;
use bistro_app::{build_restaurant, init_tracing, Config};
use bistro_order::TracingDeliverer;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load().context("Failed to load config")?;
    let restaurant = build_restaurant(&config, Arc::new(TracingDeliverer));
    tracing::info!("Opening {}", restaurant.name);

    println!("{}", restaurant.menu_text());

    // A short demo shift
    let service = &restaurant.service;
    let order = service.create_order(5)?;
    service.add_item(order.id, "Капучино", 2)?;
    service.add_item(order.id, "Тирамису", 1)?;
    service.submit_to_kitchen(order.id)?;
    service.mark_ready(order.id)?;
    service.deliver(order.id)?;

    let details = serde_json::json!({"card_number": "4111 1111 1111 1111", "cardholder": "Guest"});
    let transaction = service.process_payment(order.id, "card", &details)?;

    let second = service.create_order(2)?;
    service.add_item(second.id, "Стейк Рибай", 1)?;
    service.submit_to_kitchen(second.id)?;
    service.process_payment(second.id, "cash", &serde_json::Value::Null)?;
    service.refund_payment(second.id, "TRX-1")?;

    service.announce("Смена окончена");

    for order in service.all_orders() {
        println!("{}\n", order);
    }
    println!("{}", serde_json::to_string_pretty(&service.transaction_history(None))?);
    println!("{}", serde_json::to_string_pretty(&service.ledger_summary())?);

    tracing::info!(
        "Demo finished, last card transaction {} ({})",
        transaction.id,
        transaction.processor_status
    );
    Ok(())
}
