mod payment_reference;

pub use payment_reference::new_payment_reference;
