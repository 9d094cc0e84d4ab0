use chrono::Duration;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{DeliveryStatus, NewOrder, Order, OrderId, OrderItem},
    order_objects::OrderQueryFilter,
};

/// Inserts the order row itself. Line items are inserted separately with [`insert_order_item`]; callers are expected
/// to wrap the two in a transaction so a failed item lookup abandons the whole order.
pub async fn insert_order(
    order: &NewOrder,
    total_amount: i64,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let addr = &order.shipping_address;
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                customer_id,
                total_amount,
                address,
                city,
                state,
                postal_code,
                country
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(&order.customer_id)
    .bind(total_amount)
    .bind(&addr.address)
    .bind(&addr.city)
    .bind(&addr.state)
    .bind(&addr.postal_code)
    .bind(&addr.country)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

/// Inserts a single snapshotted line item for an order.
pub async fn insert_order_item(
    order_id: OrderId,
    product_id: i64,
    quantity: i64,
    unit_price: i64,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_order_by_id(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_payment_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE payment_reference = $1")
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn fetch_orders_for_customer(
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at ASC")
        .bind(customer_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at` in ascending order.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(cid) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(status) = query.payment_status {
        where_clause.push("payment_status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(status) = query.delivery_status {
        where_clause.push("delivery_status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(conn).await?;
    trace!("📝️ Result of search_orders: {:?}", orders.len());
    Ok(orders)
}

/// Stores the payment reference assigned at initialization. Conditional on the order not being paid, so a checkout
/// retry can overwrite the reference but a completed order is never touched.
pub async fn set_payment_reference(
    order_id: &OrderId,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET payment_reference = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND payment_status != 'Paid'
            RETURNING *;
        "#,
    )
    .bind(reference)
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// The one place an order becomes `Paid`. The status check and the write are a single conditional statement, so of
/// any number of concurrent confirmations exactly one lands; `transaction_id` and `paid_at` are written exactly once.
pub async fn confirm_order_paid(
    order_id: &OrderId,
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'Paid',
                transaction_id = $1,
                paid_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND payment_status != 'Paid'
            RETURNING *;
        "#,
    )
    .bind(transaction_id)
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Marks the payment as failed. Conditional on the order not being paid; a stale failure can never follow a success.
pub async fn fail_order_payment(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET payment_status = 'Failed', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND payment_status != 'Paid'
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Cancels the payment side of an order. Only pending or failed orders can be cancelled.
pub async fn cancel_order_payment(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET payment_status = 'Cancelled', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND payment_status IN ('Pending', 'Failed')
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Sweeps pending orders that have seen no activity for longer than `limit` into `Cancelled`.
pub async fn cancel_stale_pending_orders(
    limit: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let rows = sqlx::query_as(
        r#"
            UPDATE orders SET payment_status = 'Cancelled', updated_at = CURRENT_TIMESTAMP
            WHERE payment_status = 'Pending'
              AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(updated_at)) > $1
            RETURNING *;
        "#,
    )
    .bind(limit.num_seconds())
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn update_delivery_status(
    order_id: &OrderId,
    status: DeliveryStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET delivery_status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status.to_string())
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
