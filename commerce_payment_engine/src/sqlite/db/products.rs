use sqlx::SqliteConnection;

use crate::db_types::{NewProduct, Product, ProductId};

pub async fn fetch_product_by_id(
    product_id: &ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (name, description, price, in_stock)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.description)
    .bind(product.price.value())
    .bind(product.in_stock)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn update_product_price(
    product_id: &ProductId,
    price: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("UPDATE products SET price = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(price)
            .bind(product_id)
            .fetch_optional(conn)
            .await?;
    Ok(product)
}
