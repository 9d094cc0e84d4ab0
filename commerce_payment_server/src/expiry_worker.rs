use chrono::Duration;
use commerce_payment_engine::{db_types::Order, PaymentFlowApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every minute, pending orders that have seen no activity for longer than `unpaid_timeout` are cancelled. A
/// customer who completes checkout after the sweep is still covered: a late success event moves the cancelled order
/// to paid.
pub fn start_expiry_worker(db: SqliteDatabase, unpaid_timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        let api = PaymentFlowApi::new(db);
        info!("🕰️ Stale order expiry worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running stale order expiry job");
            match api.cancel_stale_orders(unpaid_timeout).await {
                Ok(cancelled) if cancelled.is_empty() => trace!("🕰️ No stale orders found"),
                Ok(cancelled) => {
                    info!("🕰️ {} stale orders cancelled: {}", cancelled.len(), order_list(&cancelled));
                },
                Err(e) => {
                    error!("🕰️ Error running stale order expiry job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] customer: {} amount: {}", o.id, o.customer_id, o.total_amount))
        .collect::<Vec<String>>()
        .join(", ")
}
