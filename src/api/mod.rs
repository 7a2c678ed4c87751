pub mod payments;
pub mod products;
pub mod webhooks;
