use bistro_catalog::MenuItem;

use crate::models::Order;
use crate::store::OrderError;

/// Validated edits to an order's lines
pub struct ChangeHandler;

impl ChangeHandler {
    /// Add an item to an open order
    pub fn add_line(order: &mut Order, item: &MenuItem, quantity: u32) -> Result<(), OrderError> {
        Self::validate(order, quantity)?;
        if let Some(line) = order.line(&item.name) {
            if line.quantity.checked_add(quantity).is_none() {
                return Err(OrderError::QuantityOverflow(item.name.clone()));
            }
        }
        order.add_line(item, quantity);
        Ok(())
    }

    /// Take an item off an open order. `Ok(false)` when the item is absent.
    pub fn remove_line(order: &mut Order, item_name: &str, quantity: u32) -> Result<bool, OrderError> {
        Self::validate(order, quantity)?;
        Ok(order.remove_line(item_name, quantity))
    }

    fn validate(order: &Order, quantity: u32) -> Result<(), OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity(quantity));
        }
        if !order.status.accepts_changes() {
            return Err(OrderError::NotModifiable {
                id: order.id,
                status: order.status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use rust_decimal_macros::dec;

    fn tiramisu() -> MenuItem {
        MenuItem::new("Тирамису", "Десерт с маскарпоне", dec!(350)).unwrap()
    }

    #[test]
    fn test_add_line() {
        let mut order = Order::new(1, 4);
        ChangeHandler::add_line(&mut order, &tiramisu(), 2).unwrap();

        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.total_price(), dec!(700));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut order = Order::new(1, 4);
        ChangeHandler::add_line(&mut order, &tiramisu(), 1).unwrap();

        let result = ChangeHandler::add_line(&mut order, &tiramisu(), 0);
        assert!(matches!(result, Err(OrderError::InvalidQuantity(0))));

        let result = ChangeHandler::remove_line(&mut order, "Тирамису", 0);
        assert!(matches!(result, Err(OrderError::InvalidQuantity(0))));

        // Existing lines untouched
        assert_eq!(order.lines[0].quantity, 1);
    }

    #[test]
    fn test_changes_allowed_while_preparing_only() {
        let mut order = Order::new(1, 4);
        order.update_status(OrderStatus::Preparing);
        ChangeHandler::add_line(&mut order, &tiramisu(), 1).unwrap();

        order.update_status(OrderStatus::Ready);
        let result = ChangeHandler::add_line(&mut order, &tiramisu(), 1);
        assert!(matches!(result, Err(OrderError::NotModifiable { id: 1, .. })));

        let result = ChangeHandler::remove_line(&mut order, "Тирамису", 1);
        assert!(result.is_err());
        assert_eq!(order.lines[0].quantity, 1);
    }

    #[test]
    fn test_merged_quantity_overflow_leaves_line() {
        let mut order = Order::new(1, 4);
        ChangeHandler::add_line(&mut order, &tiramisu(), u32::MAX).unwrap();

        let result = ChangeHandler::add_line(&mut order, &tiramisu(), 1);
        assert!(matches!(result, Err(OrderError::QuantityOverflow(ref name)) if name == "Тирамису"));
        assert_eq!(order.lines[0].quantity, u32::MAX);
    }

    #[test]
    fn test_remove_missing_item() {
        let mut order = Order::new(1, 4);
        assert!(!ChangeHandler::remove_line(&mut order, "Тирамису", 1).unwrap());
    }
}
