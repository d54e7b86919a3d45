pub mod models;
pub mod changes;
pub mod store;
pub mod notification;
pub mod ledger;
pub mod service;

pub use models::{Order, OrderLine, OrderStatus, PaymentStatus};
pub use store::{OrderError, OrderStore, StatusChange};
pub use changes::ChangeHandler;
pub use notification::{NotificationSettings, Notifier, Outbox, Priority, StaffNotifier, TracingDeliverer};
pub use ledger::{LedgerError, LedgerSummary, PaymentLedger, Transaction};
pub use service::{OrderService, ServiceError};
