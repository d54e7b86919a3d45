pub mod models;

pub use models::events::{
    EventEnvelope, OrderCreatedEvent, OrderPaidEvent, OrderStatusChangedEvent,
    PaymentRefundedEvent, RestaurantEvent, StaffNotifiedEvent,
};
