use bistro_core::money::{format_amount, Amount};
use bistro_core::payment::simulated_processor;
use bistro_core::{PaymentDetails, PaymentMethod, PaymentProcessor};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::Order;

/// A recorded payment. Only `refunded` ever changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub order_id: u64,
    pub amount: Amount,
    pub method: PaymentMethod,
    pub details: PaymentDetails,
    /// What the processor reported when it accepted the charge
    pub processor_status: String,
    pub created_at: DateTime<Utc>,
    pub refunded: bool,
}

/// Totals across the ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerSummary {
    pub transactions: usize,
    pub collected: Amount,
    pub refunded: Amount,
    pub net: Amount,
}

struct Partition {
    processor: Box<dyn PaymentProcessor>,
    transactions: Vec<Transaction>,
}

impl Partition {
    fn new(processor: Box<dyn PaymentProcessor>) -> Self {
        Self {
            processor,
            transactions: Vec::new(),
        }
    }
}

/// Payment journal partitioned by method.
///
/// Each partition has its own lock and its own `TRX-<n>` sequence; only
/// accepted payments consume a sequence number.
pub struct PaymentLedger {
    cash: Mutex<Partition>,
    card: Mutex<Partition>,
    online: Mutex<Partition>,
}

impl PaymentLedger {
    /// Ledger backed by the in-process simulated processors
    pub fn new() -> Self {
        Self {
            cash: Mutex::new(Partition::new(simulated_processor(PaymentMethod::Cash))),
            card: Mutex::new(Partition::new(simulated_processor(PaymentMethod::Card))),
            online: Mutex::new(Partition::new(simulated_processor(PaymentMethod::Online))),
        }
    }

    /// Replace the processor for the method it handles
    pub fn with_processor(self, processor: Box<dyn PaymentProcessor>) -> Self {
        let method = processor.method();
        self.partition(method).processor = processor;
        self
    }

    fn partition(&self, method: PaymentMethod) -> MutexGuard<'_, Partition> {
        let partition = match method {
            PaymentMethod::Cash => &self.cash,
            PaymentMethod::Card => &self.card,
            PaymentMethod::Online => &self.online,
        };
        partition.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Charge the order's current total
    pub fn pay(&self, order: &Order, details: PaymentDetails) -> Result<Transaction, LedgerError> {
        let method = details.method();
        let amount = order.total_price();
        let mut partition = self.partition(method);

        if !partition.processor.process_payment(amount, &details) {
            tracing::warn!("Payment for order #{} declined ({})", order.id, method.code());
            return Err(LedgerError::PaymentDeclined {
                order_id: order.id,
                method,
            });
        }

        let transaction = Transaction {
            id: format!("TRX-{}", partition.transactions.len() + 1),
            order_id: order.id,
            amount,
            method,
            details,
            processor_status: partition.processor.status_label().to_string(),
            created_at: Utc::now(),
            refunded: false,
        };
        partition.transactions.push(transaction.clone());

        tracing::info!(
            "Recorded {} for order #{}: {} via {}",
            transaction.id,
            order.id,
            format_amount(amount),
            method.code()
        );
        Ok(transaction)
    }

    /// Refund a transaction in full. A transaction can be refunded once.
    pub fn refund(&self, order: &Order, transaction_id: &str) -> Result<Transaction, LedgerError> {
        let method = order
            .payment_status
            .method()
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;

        let mut partition = self.partition(method);
        let Partition {
            processor,
            transactions,
        } = &mut *partition;

        let transaction = transactions
            .iter_mut()
            .find(|t| t.id == transaction_id)
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;

        if transaction.order_id != order.id {
            return Err(LedgerError::OrderMismatch {
                transaction_id: transaction_id.to_string(),
                order_id: order.id,
            });
        }
        if transaction.refunded {
            return Err(LedgerError::AlreadyRefunded(transaction_id.to_string()));
        }
        if !processor.refund_payment(transaction_id, transaction.amount) {
            return Err(LedgerError::RefundDeclined(transaction_id.to_string()));
        }

        transaction.refunded = true;
        tracing::info!(
            "Refunded {} ({}) for order #{}",
            transaction_id,
            format_amount(transaction.amount),
            order.id
        );
        Ok(transaction.clone())
    }

    pub fn find_transaction(&self, method: PaymentMethod, transaction_id: &str) -> Option<Transaction> {
        self.partition(method)
            .transactions
            .iter()
            .find(|t| t.id == transaction_id)
            .cloned()
    }

    /// One partition in creation order, or every partition merged by time
    pub fn transaction_history(&self, method: Option<PaymentMethod>) -> Vec<Transaction> {
        match method {
            Some(method) => self.partition(method).transactions.clone(),
            None => {
                let mut all: Vec<Transaction> = PaymentMethod::ALL
                    .iter()
                    .flat_map(|m| self.partition(*m).transactions.clone())
                    .collect();
                all.sort_by_key(|t| t.created_at);
                all
            }
        }
    }

    pub fn summary(&self) -> LedgerSummary {
        let history = self.transaction_history(None);
        let collected: Amount = history.iter().map(|t| t.amount).sum();
        let refunded: Amount = history.iter().filter(|t| t.refunded).map(|t| t.amount).sum();

        LedgerSummary {
            transactions: history.len(),
            collected,
            refunded,
            net: (collected - refunded).max(Decimal::ZERO),
        }
    }
}

impl Default for PaymentLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Transaction {transaction_id} does not belong to order #{order_id}")]
    OrderMismatch { transaction_id: String, order_id: u64 },

    #[error("Transaction already refunded: {0}")]
    AlreadyRefunded(String),

    #[error("Payment for order #{order_id} declined ({})", .method.code())]
    PaymentDeclined { order_id: u64, method: PaymentMethod },

    #[error("Refund declined for transaction {0}")]
    RefundDeclined(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;
    use bistro_catalog::MenuItem;
    use rust_decimal_macros::dec;

    struct DecliningCard;

    impl PaymentProcessor for DecliningCard {
        fn method(&self) -> PaymentMethod {
            PaymentMethod::Card
        }

        fn process_payment(&self, _amount: Amount, _details: &PaymentDetails) -> bool {
            false
        }

        fn refund_payment(&self, _transaction_id: &str, _amount: Amount) -> bool {
            false
        }

        fn status_label(&self) -> &'static str {
            "Отклонено"
        }
    }

    fn order_with_total(id: u64, price: Amount) -> Order {
        let mut order = Order::new(id, 1);
        order.add_line(&MenuItem::new("Стейк Рибай", "", price).unwrap(), 1);
        order
    }

    fn paid(mut order: Order, method: PaymentMethod) -> Order {
        order.update_payment_status(PaymentStatus::Paid(method));
        order
    }

    #[test]
    fn test_sequences_are_per_method() {
        let ledger = PaymentLedger::new();
        let order = order_with_total(1, dec!(100));

        assert_eq!(ledger.pay(&order, PaymentDetails::Cash).unwrap().id, "TRX-1");
        assert_eq!(ledger.pay(&order, PaymentDetails::Cash).unwrap().id, "TRX-2");
        assert_eq!(ledger.pay(&order, PaymentDetails::card("4111111111111111", "A")).unwrap().id, "TRX-1");
        assert_eq!(ledger.pay(&order, PaymentDetails::online("qr")).unwrap().id, "TRX-1");
        assert_eq!(ledger.pay(&order, PaymentDetails::Cash).unwrap().id, "TRX-3");
    }

    #[test]
    fn test_transaction_carries_processor_status() {
        let ledger = PaymentLedger::new();
        let order = order_with_total(1, dec!(100));

        let card = ledger.pay(&order, PaymentDetails::card("4111111111111111", "A")).unwrap();
        assert_eq!(card.processor_status, "Оплачено картой");

        let cash = ledger.pay(&order, PaymentDetails::Cash).unwrap();
        assert_eq!(cash.processor_status, "Оплачено наличными");
        assert_eq!(
            ledger.find_transaction(PaymentMethod::Cash, &cash.id).unwrap().processor_status,
            "Оплачено наличными"
        );
    }

    #[test]
    fn test_amount_fixed_at_payment_time() {
        let ledger = PaymentLedger::new();
        let mut order = order_with_total(1, dec!(1200));
        let transaction = ledger.pay(&order, PaymentDetails::Cash).unwrap();

        order.add_line(&MenuItem::new("Чай", "", dec!(150)).unwrap(), 1);
        let history = ledger.transaction_history(Some(PaymentMethod::Cash));
        assert_eq!(history[0].amount, dec!(1200));
        assert_eq!(transaction.amount, dec!(1200));
    }

    #[test]
    fn test_declined_payment_consumes_no_sequence() {
        let ledger = PaymentLedger::new().with_processor(Box::new(DecliningCard));
        let order = order_with_total(1, dec!(50));

        let err = ledger.pay(&order, PaymentDetails::card("1234", "B")).unwrap_err();
        assert_eq!(
            err,
            LedgerError::PaymentDeclined {
                order_id: 1,
                method: PaymentMethod::Card
            }
        );
        assert!(ledger.transaction_history(Some(PaymentMethod::Card)).is_empty());
        assert_eq!(ledger.pay(&order, PaymentDetails::Cash).unwrap().id, "TRX-1");
    }

    #[test]
    fn test_refund_once() {
        let ledger = PaymentLedger::new();
        let order = order_with_total(7, dec!(400));
        let transaction = ledger.pay(&order, PaymentDetails::card("5500000000000004", "C")).unwrap();
        let order = paid(order, PaymentMethod::Card);

        let refunded = ledger.refund(&order, &transaction.id).unwrap();
        assert!(refunded.refunded);
        assert_eq!(refunded.amount, dec!(400));

        let err = ledger.refund(&order, &transaction.id).unwrap_err();
        assert_eq!(err, LedgerError::AlreadyRefunded("TRX-1".to_string()));
    }

    #[test]
    fn test_refund_validation() {
        let ledger = PaymentLedger::new();
        let first = order_with_total(1, dec!(10));
        let second = order_with_total(2, dec!(20));
        let transaction = ledger.pay(&first, PaymentDetails::Cash).unwrap();

        // Unpaid order has no partition to look in
        assert_eq!(
            ledger.refund(&first, &transaction.id).unwrap_err(),
            LedgerError::TransactionNotFound("TRX-1".to_string())
        );

        let first = paid(first, PaymentMethod::Cash);
        assert_eq!(
            ledger.refund(&first, "TRX-99").unwrap_err(),
            LedgerError::TransactionNotFound("TRX-99".to_string())
        );

        let second = paid(second, PaymentMethod::Cash);
        assert_eq!(
            ledger.refund(&second, &transaction.id).unwrap_err(),
            LedgerError::OrderMismatch {
                transaction_id: "TRX-1".to_string(),
                order_id: 2
            }
        );

        // Wrong partition: the card ledger has no TRX-1
        let as_card = paid(order_with_total(1, dec!(10)), PaymentMethod::Card);
        assert!(ledger.refund(&as_card, &transaction.id).is_err());
        assert!(!ledger.find_transaction(PaymentMethod::Cash, "TRX-1").unwrap().refunded);
    }

    #[test]
    fn test_history_and_summary() {
        let ledger = PaymentLedger::new();
        let order = order_with_total(1, dec!(100));
        ledger.pay(&order, PaymentDetails::online("wallet")).unwrap();
        ledger.pay(&order, PaymentDetails::Cash).unwrap();
        let card = ledger.pay(&order, PaymentDetails::card("4000", "D")).unwrap();
        ledger.refund(&paid(order, PaymentMethod::Card), &card.id).unwrap();

        let all = ledger.transaction_history(None);
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        assert_eq!(ledger.transaction_history(Some(PaymentMethod::Online)).len(), 1);

        let summary = ledger.summary();
        assert_eq!(summary.transactions, 3);
        assert_eq!(summary.collected, dec!(300));
        assert_eq!(summary.refunded, dec!(100));
        assert_eq!(summary.net, dec!(200));
    }

    #[test]
    fn test_concurrent_payments_get_unique_ids() {
        let ledger = PaymentLedger::new();
        let order = order_with_total(1, dec!(5));

        let ids: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| s.spawn(|| ledger.pay(&order, PaymentDetails::Cash).unwrap().id))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let mut numbers: Vec<usize> = ids
            .iter()
            .map(|id| id.trim_start_matches("TRX-").parse().unwrap())
            .collect();
        numbers.sort();
        assert_eq!(numbers, (1..=16).collect::<Vec<_>>());
    }
}
