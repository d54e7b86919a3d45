use bistro_catalog::MenuItem;
use bistro_core::money::{format_amount, Amount};
use bistro_core::PaymentMethod;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Preparing,
    Ready,
    Delivered,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
        }
    }

    /// Label shown to staff
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Created => "Создан",
            OrderStatus::Preparing => "Готовится",
            OrderStatus::Ready => "Готов",
            OrderStatus::Delivered => "Доставлен",
            OrderStatus::Completed => "Завершен",
        }
    }

    /// Kitchen flow moves one step at a time; payment may complete an order
    /// from any open state.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match (self, next) {
            (OrderStatus::Completed, _) => false,
            (_, OrderStatus::Completed) => true,
            (OrderStatus::Created, OrderStatus::Preparing)
            | (OrderStatus::Preparing, OrderStatus::Ready)
            | (OrderStatus::Ready, OrderStatus::Delivered) => true,
            _ => false,
        }
    }

    /// Lines may still change while the kitchen has not finished
    pub fn accepts_changes(&self) -> bool {
        matches!(self, OrderStatus::Created | OrderStatus::Preparing)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Settlement state of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid(PaymentMethod),
    /// Keeps the method so the refund can be traced to its ledger partition.
    Refunded(PaymentMethod),
}

impl PaymentStatus {
    pub fn method(&self) -> Option<PaymentMethod> {
        match self {
            PaymentStatus::Unpaid => None,
            PaymentStatus::Paid(method) | PaymentStatus::Refunded(method) => Some(*method),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Unpaid => f.write_str("Unpaid"),
            PaymentStatus::Paid(method) => write!(f, "Paid({})", method.label()),
            PaymentStatus::Refunded(_) => f.write_str("Refunded"),
        }
    }
}

/// One menu item and its quantity within an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub item_name: String,
    /// Price captured when the item was first added
    pub unit_price: Amount,
    pub quantity: u32,
}

impl OrderLine {
    pub fn line_total(&self) -> Amount {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A table's purchase request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: u64,
    pub table_number: u32,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(id: u64, table_number: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            table_number,
            lines: Vec::new(),
            status: OrderStatus::Created,
            payment_status: PaymentStatus::Unpaid,
            created_at: now,
            updated_at: now,
        }
    }

    /// Add `quantity` of `item`, merging into an existing line of the same name.
    /// A merged quantity saturates at `u32::MAX`; `ChangeHandler` rejects that case first.
    pub fn add_line(&mut self, item: &MenuItem, quantity: u32) {
        match self.lines.iter_mut().find(|l| l.item_name == item.name) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(OrderLine {
                item_name: item.name.clone(),
                unit_price: item.unit_price,
                quantity,
            }),
        }
        self.updated_at = Utc::now();
    }

    /// Take `quantity` off a line, dropping the line once nothing is left.
    /// Returns `false` if the item is not on the order.
    pub fn remove_line(&mut self, item_name: &str, quantity: u32) -> bool {
        let Some(index) = self.lines.iter().position(|l| l.item_name == item_name) else {
            return false;
        };

        if self.lines[index].quantity <= quantity {
            self.lines.remove(index);
        } else {
            self.lines[index].quantity -= quantity;
        }
        self.updated_at = Utc::now();
        true
    }

    pub fn line(&self, item_name: &str) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.item_name == item_name)
    }

    /// Always derived from the current lines
    pub fn total_price(&self) -> Amount {
        self.lines.iter().map(OrderLine::line_total).sum()
    }

    pub fn update_status(&mut self, new_status: OrderStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    pub fn update_payment_status(&mut self, payment_status: PaymentStatus) {
        self.payment_status = payment_status;
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Заказ #{} (Стол {})", self.id, self.table_number)?;
        writeln!(f, "Статус: {}, Оплата: {}", self.status, self.payment_status)?;
        writeln!(f, "Элементы заказа:")?;
        for line in &self.lines {
            writeln!(
                f,
                "  {} x{} = {}",
                line.item_name,
                line.quantity,
                format_amount(line.line_total())
            )?;
        }
        write!(f, "Итого: {}", format_amount(self.total_price()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cappuccino() -> MenuItem {
        MenuItem::new("Капучино", "Кофе с молочной пенкой", dec!(200)).unwrap()
    }

    #[test]
    fn test_same_item_merges_into_one_line() {
        let mut order = Order::new(1, 5);
        order.add_line(&cappuccino(), 1);
        order.add_line(&cappuccino(), 2);

        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].quantity, 3);
        assert_eq!(order.total_price(), dec!(600));
    }

    #[test]
    fn test_remove_line_decrements_then_drops() {
        let mut order = Order::new(1, 5);
        order.add_line(&cappuccino(), 3);

        assert!(order.remove_line("Капучино", 1));
        assert_eq!(order.line("Капучино").unwrap().quantity, 2);

        assert!(order.remove_line("Капучино", 5));
        assert!(order.lines.is_empty());
        assert_eq!(order.total_price(), dec!(0));

        assert!(!order.remove_line("Капучино", 1));
    }

    #[test]
    fn test_total_tracks_lines() {
        let mut order = Order::new(1, 2);
        order.add_line(&cappuccino(), 2);
        order.add_line(&MenuItem::new("Чизкейк", "", dec!(300.50)).unwrap(), 1);

        let expected: Amount = order.lines.iter().map(|l| l.unit_price * Decimal::from(l.quantity)).sum();
        assert_eq!(order.total_price(), expected);
        assert_eq!(order.total_price(), dec!(700.50));
    }

    #[test]
    fn test_transition_graph() {
        use OrderStatus::*;

        assert!(Created.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Delivered));
        for status in [Created, Preparing, Ready, Delivered] {
            assert!(status.can_transition_to(Completed));
        }

        assert!(!Created.can_transition_to(Delivered));
        assert!(!Created.can_transition_to(Ready));
        assert!(!Ready.can_transition_to(Preparing));
        assert!(!Completed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Created));
    }

    #[test]
    fn test_payment_status_display() {
        assert_eq!(PaymentStatus::Unpaid.to_string(), "Unpaid");
        assert_eq!(PaymentStatus::Paid(PaymentMethod::Card).to_string(), "Paid(Карта)");
        assert_eq!(PaymentStatus::Refunded(PaymentMethod::Card).to_string(), "Refunded");
        assert_eq!(PaymentStatus::Refunded(PaymentMethod::Cash).method(), Some(PaymentMethod::Cash));
    }

    #[test]
    fn test_order_display() {
        let mut order = Order::new(3, 7);
        order.add_line(&cappuccino(), 2);

        let text = order.to_string();
        assert!(text.starts_with("Заказ #3 (Стол 7)\n"));
        assert!(text.contains("  Капучино x2 = 400.00\n"));
        assert!(text.ends_with("Итого: 400.00"));
    }
}
