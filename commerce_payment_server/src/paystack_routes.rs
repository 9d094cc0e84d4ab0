//----------------------------------------------   Webhook  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use commerce_payment_engine::{order_objects::WebhookDisposition, traits::PaymentGatewayDatabase, PaymentFlowApi};
use log::*;
use paystack_tools::WebhookEvent;

use crate::{data_objects::JsonResponse, integrations::paystack::gateway_event_from_webhook, route};

route!(paystack_webhook => Post "/webhook" impl PaymentGatewayDatabase);
/// Route handler for Paystack webhook deliveries.
///
/// The HMAC middleware has already verified the signature over the exact raw body by the time this handler runs; an
/// invalid signature never gets here. Everything else is acknowledged with a 200 so the gateway stops redelivering:
/// unmatched references can be test events or orders from another environment, and unrecognized event types are new
/// gateway features we don't consume. Only a persistence failure returns a 500, precisely so that the gateway WILL
/// redeliver.
pub async fn paystack_webhook<B: PaymentGatewayDatabase>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<PaymentFlowApi<B>>,
) -> HttpResponse {
    trace!("🔔️ Received webhook request: {}", req.uri());
    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("🔔️ Could not parse webhook payload. {e}");
            return HttpResponse::Ok().json(JsonResponse::failure("Could not parse webhook payload"));
        },
    };
    let event = gateway_event_from_webhook(event);
    match api.process_gateway_event(event).await {
        Ok(WebhookDisposition::Confirmed(order)) => {
            info!("🔔️ Order {} marked as paid", order.id);
            HttpResponse::Ok().json(JsonResponse::success("Order marked as paid"))
        },
        Ok(WebhookDisposition::Failed(order)) => {
            info!("🔔️ Order {} marked as failed", order.id);
            HttpResponse::Ok().json(JsonResponse::success("Order marked as failed"))
        },
        Ok(WebhookDisposition::AlreadyPaid(order_id)) => {
            debug!("🔔️ Duplicate delivery for paid order {order_id}. Nothing to do");
            HttpResponse::Ok().json(JsonResponse::success("Order already paid"))
        },
        Ok(WebhookDisposition::Ignored(event_type)) => {
            debug!("🔔️ Ignoring unhandled event type {event_type}");
            HttpResponse::Ok().json(JsonResponse::success("Event ignored"))
        },
        Ok(WebhookDisposition::Unmatched(reference)) => {
            debug!("🔔️ No order matches reference {reference}");
            HttpResponse::Ok().json(JsonResponse::success("No order to update"))
        },
        Err(e) => {
            error!("🔔️ Could not process webhook event. {e}");
            HttpResponse::InternalServerError().json(JsonResponse::failure("Could not process webhook event"))
        },
    }
}
