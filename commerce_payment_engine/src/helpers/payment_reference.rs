use std::time::{SystemTime, UNIX_EPOCH};

use crate::db_types::OrderId;

/// Generates a fresh payment reference for an initialization attempt.
///
/// The reference correlates a gateway transaction back to a local order, so it embeds the order id; the millisecond
/// timestamp plus a random suffix makes collisions across retries of the same order negligible. References are only
/// ever generated here; a reference is never reused once an order is paid.
pub fn new_payment_reference(order_id: OrderId) -> String {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default();
    let nonce: u16 = rand::random();
    format!("order-{}-{millis}-{nonce:04x}", order_id.0)
}

#[cfg(test)]
mod test {
    use super::new_payment_reference;
    use crate::db_types::OrderId;

    #[test]
    fn reference_embeds_order_id() {
        let reference = new_payment_reference(OrderId(42));
        assert!(reference.starts_with("order-42-"));
    }

    #[test]
    fn successive_references_differ() {
        let a = new_payment_reference(OrderId(7));
        let b = new_payment_reference(OrderId(7));
        assert_ne!(a, b);
    }
}
