pub mod order_objects;
pub mod orders_api;
pub mod payment_flow_api;
