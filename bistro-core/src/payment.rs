use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::money::{format_amount, Amount};
use crate::CoreError;

/// Supported ways to settle a bill
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Online];

    /// Label printed on receipts and in the order's payment status
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Наличные",
            PaymentMethod::Card => "Карта",
            PaymentMethod::Online => "Онлайн",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Online => "online",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "online" => Ok(PaymentMethod::Online),
            _ => Err(CoreError::UnsupportedPaymentMethod(s.to_string())),
        }
    }
}

/// Method-specific payment data kept on the transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentDetails {
    Cash,
    Card {
        masked_number: String,
        cardholder: String,
    },
    Online {
        provider: String,
    },
}

impl PaymentDetails {
    /// Card details; only the last four digits of the number are retained.
    pub fn card(card_number: &str, cardholder: &str) -> Self {
        PaymentDetails::Card {
            masked_number: mask_card_number(card_number),
            cardholder: cardholder.to_string(),
        }
    }

    pub fn online(provider: &str) -> Self {
        PaymentDetails::Online {
            provider: provider.to_string(),
        }
    }

    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentDetails::Cash => PaymentMethod::Cash,
            PaymentDetails::Card { .. } => PaymentMethod::Card,
            PaymentDetails::Online { .. } => PaymentMethod::Online,
        }
    }

    /// Build details from a loosely typed request body.
    ///
    /// Card payments read `card_number` and `cardholder`, online payments read
    /// `method` (the provider, defaulting to `online`). Missing fields become
    /// empty strings.
    pub fn from_json(method: PaymentMethod, details: &serde_json::Value) -> Self {
        let field = |key: &str| details.get(key).and_then(|v| v.as_str());

        match method {
            PaymentMethod::Cash => PaymentDetails::Cash,
            PaymentMethod::Card => PaymentDetails::card(
                field("card_number").unwrap_or_default(),
                field("cardholder").unwrap_or_default(),
            ),
            PaymentMethod::Online => PaymentDetails::online(field("method").unwrap_or("online")),
        }
    }
}

fn mask_card_number(card_number: &str) -> String {
    let digits: Vec<char> = card_number.chars().filter(|c| !c.is_whitespace()).collect();
    let last_four: String = digits[digits.len().saturating_sub(4)..].iter().collect();
    format!("**** {}", last_four)
}

/// A payment backend for one method
pub trait PaymentProcessor: Send + Sync {
    fn method(&self) -> PaymentMethod;

    /// Charge `amount`. Returns `false` when the charge is declined.
    fn process_payment(&self, amount: Amount, details: &PaymentDetails) -> bool;

    /// Return `amount` for a previously accepted transaction.
    fn refund_payment(&self, transaction_id: &str, amount: Amount) -> bool;

    fn status_label(&self) -> &'static str;
}

/// Cash drawer; always accepts.
pub struct CashProcessor;

impl PaymentProcessor for CashProcessor {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Cash
    }

    fn process_payment(&self, amount: Amount, _details: &PaymentDetails) -> bool {
        tracing::info!("Processing cash payment of {}", format_amount(amount));
        true
    }

    fn refund_payment(&self, transaction_id: &str, amount: Amount) -> bool {
        tracing::info!("Returning {} in cash for {}", format_amount(amount), transaction_id);
        true
    }

    fn status_label(&self) -> &'static str {
        "Оплачено наличными"
    }
}

/// Simulated card terminal; always accepts.
pub struct CardProcessor;

impl PaymentProcessor for CardProcessor {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Card
    }

    fn process_payment(&self, amount: Amount, details: &PaymentDetails) -> bool {
        let card = match details {
            PaymentDetails::Card { masked_number, .. } => masked_number.as_str(),
            _ => "unknown card",
        };
        tracing::info!("Processing card payment ({}) of {}", card, format_amount(amount));
        true
    }

    fn refund_payment(&self, transaction_id: &str, amount: Amount) -> bool {
        tracing::info!("Refunding {} to card for {}", format_amount(amount), transaction_id);
        true
    }

    fn status_label(&self) -> &'static str {
        "Оплачено картой"
    }
}

/// Simulated online checkout; always accepts.
pub struct OnlineProcessor;

impl PaymentProcessor for OnlineProcessor {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Online
    }

    fn process_payment(&self, amount: Amount, details: &PaymentDetails) -> bool {
        let provider = match details {
            PaymentDetails::Online { provider } => provider.as_str(),
            _ => "online",
        };
        tracing::info!("Processing online payment ({}) of {}", provider, format_amount(amount));
        true
    }

    fn refund_payment(&self, transaction_id: &str, amount: Amount) -> bool {
        tracing::info!("Refunding {} online for {}", format_amount(amount), transaction_id);
        true
    }

    fn status_label(&self) -> &'static str {
        "Оплачено онлайн"
    }
}

/// The in-process processor used for `method`
pub fn simulated_processor(method: PaymentMethod) -> Box<dyn PaymentProcessor> {
    match method {
        PaymentMethod::Cash => Box::new(CashProcessor),
        PaymentMethod::Card => Box::new(CardProcessor),
        PaymentMethod::Online => Box::new(OnlineProcessor),
    }
}
