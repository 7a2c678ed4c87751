pub mod adapters;
pub mod engine;
pub mod types;
pub mod vtpass;

pub use engine::DispatchEngine;
pub use types::{Category, PurchaseDetails, VendAttempt, VendRequest, VendorError};
