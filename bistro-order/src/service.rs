use bistro_core::{CoreError, PaymentDetails, PaymentMethod, StaffRole};
use bistro_shared::{
    EventEnvelope, OrderCreatedEvent, OrderPaidEvent, OrderStatusChangedEvent, PaymentRefundedEvent,
    RestaurantEvent, StaffNotifiedEvent,
};
use chrono::Utc;
use tokio::sync::broadcast;

use crate::ledger::{LedgerError, LedgerSummary, PaymentLedger, Transaction};
use crate::models::Order;
use crate::notification::StaffNotifier;
use crate::store::{OrderError, OrderStore, StatusChange};

/// Restaurant use cases: guarded order transitions plus the staff
/// notifications and events that go with them.
pub struct OrderService {
    store: OrderStore,
    notifier: StaffNotifier,
    ledger: PaymentLedger,
    events: broadcast::Sender<EventEnvelope>,
}

impl OrderService {
    pub fn new(store: OrderStore, notifier: StaffNotifier, ledger: PaymentLedger, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            store,
            notifier,
            ledger,
            events,
        }
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    pub fn notifier(&self) -> &StaffNotifier {
        &self.notifier
    }

    pub fn ledger(&self) -> &PaymentLedger {
        &self.ledger
    }

    fn publish(&self, event: RestaurantEvent) {
        // No subscribers is not an error
        let _ = self.events.send(EventEnvelope::new(event));
    }

    fn notified(&self, role: &str, delivered: bool) {
        self.publish(RestaurantEvent::StaffNotified(StaffNotifiedEvent {
            role: role.to_string(),
            delivered,
            timestamp: Utc::now().timestamp(),
        }));
    }

    fn status_changed(&self, change: &StatusChange) {
        self.publish(RestaurantEvent::OrderStatusChanged(OrderStatusChangedEvent {
            order_id: change.order.id,
            table_number: change.order.table_number,
            from: change.from.as_str().to_string(),
            to: change.order.status.as_str().to_string(),
            timestamp: Utc::now().timestamp(),
        }));
    }

    fn tell_waiters(&self, order: &Order, status_text: &str) {
        let delivered = self.notifier.notify_waiters_status(order, status_text);
        self.notified(StaffRole::Waiters.as_str(), delivered);
    }

    fn tell_management(&self, kind: &str, details: &str) -> bool {
        let delivered = self.notifier.notify_management_issue(kind, details);
        self.notified(StaffRole::Management.as_str(), delivered);
        delivered
    }

    pub fn create_order(&self, table_number: u32) -> Result<Order, ServiceError> {
        let order = self.store.create_order(table_number)?;
        self.publish(RestaurantEvent::OrderCreated(OrderCreatedEvent {
            order_id: order.id,
            table_number,
            timestamp: order.created_at.timestamp(),
        }));
        Ok(order)
    }

    pub fn add_item(&self, order_id: u64, item_name: &str, quantity: u32) -> Result<Order, ServiceError> {
        Ok(self.store.add_line(order_id, item_name, quantity)?)
    }

    pub fn remove_item(&self, order_id: u64, item_name: &str, quantity: u32) -> Result<bool, ServiceError> {
        Ok(self.store.remove_line(order_id, item_name, quantity)?)
    }

    pub fn get_order(&self, order_id: u64) -> Result<Order, ServiceError> {
        Ok(self.store.get_order(order_id)?)
    }

    pub fn active_orders(&self) -> Vec<Order> {
        self.store.list_active_orders()
    }

    pub fn orders_for_table(&self, table_number: u32) -> Vec<Order> {
        self.store.list_orders_for_table(table_number)
    }

    pub fn all_orders(&self) -> Vec<Order> {
        self.store.list_orders()
    }

    /// Created → Preparing, then the kitchen gets the ticket
    pub fn submit_to_kitchen(&self, order_id: u64) -> Result<Order, ServiceError> {
        let change = self.store.submit_to_kitchen(order_id)?;
        self.status_changed(&change);

        let delivered = self.notifier.notify_kitchen_new_order(&change.order);
        self.notified(StaffRole::Kitchen.as_str(), delivered);

        tracing::info!("Order #{} sent to the kitchen", order_id);
        Ok(change.order)
    }

    /// Preparing → Ready, waiters are told to pick it up
    pub fn mark_ready(&self, order_id: u64) -> Result<Order, ServiceError> {
        let change = self.store.mark_ready(order_id)?;
        self.status_changed(&change);
        self.tell_waiters(&change.order, "готов к подаче");
        Ok(change.order)
    }

    /// Ready → Delivered
    pub fn deliver(&self, order_id: u64) -> Result<Order, ServiceError> {
        let change = self.store.deliver(order_id)?;
        self.status_changed(&change);
        self.tell_waiters(&change.order, "доставлен клиенту");
        Ok(change.order)
    }

    /// Charge the order and complete it.
    ///
    /// `method` is one of `cash`, `card` or `online`; `details` may carry
    /// `card_number`/`cardholder` for cards and `method` (the provider) for
    /// online payments. A declined payment leaves the order untouched and
    /// alerts management. Only one charge per order can be in flight; a
    /// concurrent attempt fails with `OrderError::PaymentInProgress`.
    pub fn process_payment(
        &self,
        order_id: u64,
        method: &str,
        details: &serde_json::Value,
    ) -> Result<Transaction, ServiceError> {
        self.store.get_order(order_id)?;
        let method: PaymentMethod = method.parse()?;
        let order = self.store.begin_payment(order_id)?;

        let details = PaymentDetails::from_json(method, details);
        let transaction = match self.ledger.pay(&order, details) {
            Ok(transaction) => transaction,
            Err(err) => {
                self.store.cancel_payment(order_id);
                self.tell_management("Ошибка оплаты", &format!("Заказ #{}: {}", order_id, err));
                return Err(err.into());
            }
        };

        let change = self.store.record_payment(order_id, method).inspect_err(|err| {
            tracing::error!(
                "{} recorded but order #{} could not be completed: {}",
                transaction.id,
                order_id,
                err
            );
        })?;
        self.status_changed(&change);
        self.publish(RestaurantEvent::OrderPaid(OrderPaidEvent {
            order_id,
            transaction_id: transaction.id.clone(),
            method: method.code().to_string(),
            amount: transaction.amount,
            timestamp: transaction.created_at.timestamp(),
        }));
        self.tell_waiters(&change.order, "оплачен");

        tracing::info!("Order #{} paid and completed, transaction {}", order_id, transaction.id);
        Ok(transaction)
    }

    /// Refund a payment in full; each transaction can be refunded once
    pub fn refund_payment(&self, order_id: u64, transaction_id: &str) -> Result<Transaction, ServiceError> {
        let order = self.store.get_order(order_id)?;
        let transaction = self.ledger.refund(&order, transaction_id)?;
        self.store.record_refund(order_id)?;

        self.publish(RestaurantEvent::PaymentRefunded(PaymentRefundedEvent {
            order_id,
            transaction_id: transaction.id.clone(),
            method: transaction.method.code().to_string(),
            amount: transaction.amount,
            timestamp: Utc::now().timestamp(),
        }));
        self.tell_management(
            "Возврат средств",
            &format!(
                "Заказ #{}: транзакция {} на сумму {}",
                order_id,
                transaction.id,
                bistro_core::format_amount(transaction.amount)
            ),
        );
        Ok(transaction)
    }

    pub fn transaction_history(&self, method: Option<PaymentMethod>) -> Vec<Transaction> {
        self.ledger.transaction_history(method)
    }

    pub fn ledger_summary(&self) -> LedgerSummary {
        self.ledger.summary()
    }

    /// Raise an operational issue with management
    pub fn report_issue(&self, kind: &str, details: &str) -> bool {
        self.tell_management(kind, details)
    }

    /// Broadcast to all staff; `false` if any role missed it
    pub fn announce(&self, message: &str) -> bool {
        let delivered = self.notifier.notify_all(message);
        self.notified("all", delivered);
        delivered
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Payment(#[from] CoreError),
}
