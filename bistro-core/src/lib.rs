pub mod money;
pub mod payment;
pub mod staff;

pub use money::{format_amount, Amount};
pub use payment::{PaymentDetails, PaymentMethod, PaymentProcessor};
pub use staff::{StaffRole, StaffRoster, StaticRoster};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unsupported payment method: {0}")]
    UnsupportedPaymentMethod(String),
}
