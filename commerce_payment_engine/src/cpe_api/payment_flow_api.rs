use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderId, PaymentStatus},
    helpers::new_payment_reference,
    order_objects::{FullOrder, PaymentOutcome, VerifiedPayment, WebhookDisposition},
    traits::{
        GatewayEvent,
        GatewayEventType,
        GatewayPaymentStatus,
        InitializeTransaction,
        InitializedTransaction,
        PaymentGatewayClient,
        PaymentGatewayDatabase,
        PaymentGatewayError,
    },
};

/// `PaymentFlowApi` is the reconciler: the one place that ties order creation, gateway initialization, synchronous
/// verification and asynchronous webhook events into a single consistent payment lifecycle per order.
///
/// Whichever of verification or webhook delivery arrives first wins the conditional update; the other becomes a
/// no-op. `Paid` is terminal, so re-deliveries and stale failure events can never regress a completed payment.
pub struct PaymentFlowApi<B> {
    db: B,
}

impl<B> Debug for PaymentFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B> PaymentFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> PaymentFlowApi<B>
where B: PaymentGatewayDatabase
{
    /// Creates a new order with payment status `Pending`.
    ///
    /// Validation happens before any write: an empty item list or a non-positive quantity rejects the request, and
    /// a missing product aborts the entire order inside the storage transaction. On success each line item carries
    /// the catalog price read at this instant; nothing about the order is recomputed later.
    ///
    /// No gateway call happens here. Initialization is a separate, explicit action.
    pub async fn create_order(&self, order: NewOrder) -> Result<FullOrder, PaymentGatewayError> {
        if order.items.is_empty() {
            return Err(PaymentGatewayError::EmptyOrder);
        }
        if let Some(item) = order.items.iter().find(|i| i.quantity < 1) {
            return Err(PaymentGatewayError::InvalidQuantity(item.quantity));
        }
        let order = self.db.insert_order(order).await?;
        debug!(
            "🧾️ Order {} created for customer {} with {} items, totalling {}",
            order.order.id,
            order.order.customer_id,
            order.items.len(),
            order.order.total_amount
        );
        Ok(order)
    }

    /// Opens a checkout session for an order.
    ///
    /// A fresh payment reference is generated for every attempt; re-initializing a still-pending order simply
    /// overwrites the previous reference. An order that is already `Paid` is rejected before any gateway traffic.
    /// If the gateway call fails, the order is left exactly as it was; a failed initialization never marks an order
    /// as failed.
    pub async fn initialize_payment<G: PaymentGatewayClient>(
        &self,
        gateway: &G,
        order_id: &OrderId,
        email: &str,
    ) -> Result<(Order, InitializedTransaction), PaymentGatewayError> {
        let order =
            self.db.fetch_order_by_id(order_id).await?.ok_or(PaymentGatewayError::OrderNotFound(*order_id))?;
        if order.is_paid() {
            debug!("💳️ Refusing to re-initialize payment for completed order {}", order.id);
            return Err(PaymentGatewayError::OrderAlreadyPaid(order.id));
        }
        let reference = new_payment_reference(order.id);
        let request = InitializeTransaction {
            email: email.to_string(),
            amount: order.total_amount,
            reference: reference.clone(),
            order_id: order.id,
        };
        let authorization = gateway.initialize_transaction(request).await?;
        let order = match self.db.set_payment_reference(&order.id, &reference).await? {
            Some(order) => order,
            // The order was finalized between the status check and the reference write.
            None => return Err(PaymentGatewayError::OrderAlreadyPaid(*order_id)),
        };
        info!("💳️ Payment for order {} initialized with reference {reference}", order.id);
        Ok((order, authorization))
    }

    /// Synchronous pull-side of the reconciliation: asks the gateway for the transaction state and folds the answer
    /// into the local order.
    ///
    /// An order that is already `Paid` is returned unchanged without consulting the gateway; a finalized order is
    /// never re-verified. Otherwise a gateway success finalizes the order, and anything else marks it `Failed`
    /// (leaving `transaction_id`/`paid_at` unset).
    pub async fn verify_payment<G: PaymentGatewayClient>(
        &self,
        gateway: &G,
        reference: &str,
    ) -> Result<VerifiedPayment, PaymentGatewayError> {
        let order = self
            .db
            .fetch_order_by_payment_reference(reference)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFoundForReference(reference.to_string()))?;
        if order.is_paid() {
            debug!("💳️ Order {} is already paid. Skipping gateway round-trip for {reference}", order.id);
            return Ok(VerifiedPayment { outcome: PaymentOutcome::AlreadyPaid, gateway_status: None, order });
        }
        let tx = gateway.verify_transaction(reference).await?;
        let raw_status = Some(tx.raw_status.clone());
        match tx.status {
            GatewayPaymentStatus::Success => match self.db.confirm_order_paid(&order.id, &tx.id).await? {
                Some(order) => {
                    info!("💳️ Order {} confirmed as paid via verification of {reference}", order.id);
                    Ok(VerifiedPayment { outcome: PaymentOutcome::Confirmed, gateway_status: raw_status, order })
                },
                None => {
                    // A concurrent webhook won the race. Report the final state.
                    let order = self.reload(&order.id).await?;
                    Ok(VerifiedPayment { outcome: PaymentOutcome::AlreadyPaid, gateway_status: raw_status, order })
                },
            },
            GatewayPaymentStatus::Failed => match self.db.fail_order_payment(&order.id).await? {
                Some(order) => {
                    info!("💳️ Order {} marked as failed. Gateway reported {}", order.id, tx.raw_status);
                    Ok(VerifiedPayment { outcome: PaymentOutcome::Failed, gateway_status: raw_status, order })
                },
                None => {
                    let order = self.reload(&order.id).await?;
                    Ok(VerifiedPayment { outcome: PaymentOutcome::AlreadyPaid, gateway_status: raw_status, order })
                },
            },
        }
    }

    /// Asynchronous push-side of the reconciliation. The caller has already authenticated the event (signature
    /// verification happens at the HTTP edge, before anything reaches the engine).
    ///
    /// Success events finalize the order unless it is already `Paid` (duplicate deliveries are expected and
    /// harmless). Failure events never downgrade a `Paid` order. Unknown event types and unmatched references are
    /// acknowledged without touching anything.
    pub async fn process_gateway_event(&self, event: GatewayEvent) -> Result<WebhookDisposition, PaymentGatewayError> {
        let order = match self.db.fetch_order_by_payment_reference(&event.reference).await? {
            Some(order) => order,
            None => {
                info!("🔔️ No order matches payment reference {}. Acknowledging without action", event.reference);
                return Ok(WebhookDisposition::Unmatched(event.reference));
            },
        };
        match event.event_type {
            GatewayEventType::PaymentSuccess => {
                match self.db.confirm_order_paid(&order.id, &event.transaction_id).await? {
                    Some(order) => {
                        info!("🔔️ Order {} marked as paid by gateway event", order.id);
                        Ok(WebhookDisposition::Confirmed(order))
                    },
                    None => {
                        debug!("🔔️ Duplicate success event for order {}. No-op", order.id);
                        Ok(WebhookDisposition::AlreadyPaid(order.id))
                    },
                }
            },
            GatewayEventType::PaymentFailed => match self.db.fail_order_payment(&order.id).await? {
                Some(order) => {
                    info!("🔔️ Order {} marked as failed by gateway event", order.id);
                    Ok(WebhookDisposition::Failed(order))
                },
                None => {
                    debug!("🔔️ Stale failure event for paid order {}. No-op", order.id);
                    Ok(WebhookDisposition::AlreadyPaid(order.id))
                },
            },
            GatewayEventType::Other(event_type) => {
                debug!("🔔️ Ignoring unrecognized gateway event {event_type} for {}", event.reference);
                Ok(WebhookDisposition::Ignored(event_type))
            },
        }
    }

    /// Cancels the payment side of an order. Permitted from `Pending` and `Failed`; cancelling an already-cancelled
    /// order is a no-op, and a `Paid` order cannot be cancelled here.
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<Order, PaymentGatewayError> {
        if let Some(order) = self.db.cancel_order_payment(order_id).await? {
            info!("🧾️ Order {} cancelled", order.id);
            return Ok(order);
        }
        let order = self.reload(order_id).await?;
        match order.payment_status {
            PaymentStatus::Cancelled => Ok(order),
            _ => Err(PaymentGatewayError::OrderAlreadyPaid(order.id)),
        }
    }

    /// Sweeps `Pending` orders that have seen no activity for longer than `unpaid_limit` into `Cancelled`.
    /// A late success event on a swept order still moves it to `Paid`.
    pub async fn cancel_stale_orders(&self, unpaid_limit: Duration) -> Result<Vec<Order>, PaymentGatewayError> {
        let cancelled = self.db.cancel_stale_pending_orders(unpaid_limit).await?;
        if !cancelled.is_empty() {
            info!("🧾️ {} stale orders cancelled", cancelled.len());
        }
        Ok(cancelled)
    }

    async fn reload(&self, order_id: &OrderId) -> Result<Order, PaymentGatewayError> {
        self.db.fetch_order_by_id(order_id).await?.ok_or(PaymentGatewayError::OrderNotFound(*order_id))
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
