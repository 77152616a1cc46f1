//! Order ledger: totals, payments and outstanding balance.
//!
//! The ledger is never stored. It is recomputed from the current line items and
//! payments every time it is needed, so it cannot drift from them.

use crate::currency::{format_currency, Amount};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Label shown in place of a price that has not been quoted yet.
pub const PRICE_PENDING_LABEL: &str = "Por definir";

/// A billable line on a service order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub description: String,

    /// Price per unit. Zero means the price is still to be determined.
    pub unit_price: Amount,

    /// Always at least 1.
    pub quantity: u32,
}

impl LineItem {
    /// Creates a line item. A quantity of 0 is taken as 1.
    pub fn new(description: impl Into<String>, unit_price: Amount, quantity: u32) -> Self {
        LineItem {
            description: description.into(),
            unit_price,
            quantity: quantity.max(1),
        }
    }

    /// `unit_price * quantity`.
    pub fn subtotal(&self) -> Amount {
        self.unit_price.times(self.quantity)
    }

    /// Returns `true` while the item has no quoted price.
    pub fn is_price_pending(&self) -> bool {
        self.unit_price.is_zero()
    }

    pub fn display_price(&self) -> String {
        if self.is_price_pending() {
            PRICE_PENDING_LABEL.to_string()
        } else {
            self.unit_price.to_string()
        }
    }

    pub fn display_subtotal(&self) -> String {
        if self.is_price_pending() {
            PRICE_PENDING_LABEL.to_string()
        } else {
            self.subtotal().to_string()
        }
    }
}

/// A payment (abono) recorded against an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

impl Payment {
    pub fn new(amount: Amount, timestamp: DateTime<Utc>) -> Self {
        Payment { amount, timestamp }
    }
}

/// Financial position of one order, derived from its items and payments.
///
/// # Completion
///
/// An order is complete once something has been priced and payments cover it:
/// `total > 0 && paid >= total`. An order whose prices are all pending has a
/// total of zero and is never complete, whatever has been paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLedger {
    /// Sum of all line item subtotals.
    pub total: Amount,

    /// Sum of all payments.
    pub paid: Amount,

    /// `total - paid`. Negative when the order was overpaid.
    pub balance: Decimal,

    pub is_complete: bool,

    /// At least one line item has no quoted price yet. Informational only:
    /// pending items contribute zero to the total.
    pub has_undefined_pricing: bool,
}

impl OrderLedger {
    /// Computes the ledger for the given items and payments.
    ///
    /// This does not check that payments stay within the balance; that rule
    /// belongs to whoever records the payment.
    pub fn compute(items: &[LineItem], payments: &[Payment]) -> Self {
        let total: Amount = items.iter().map(LineItem::subtotal).sum();
        let paid: Amount = payments.iter().map(|p| p.amount).sum();
        let has_undefined_pricing = items.iter().any(LineItem::is_price_pending);

        OrderLedger {
            total,
            paid,
            balance: total.to_decimal() - paid.to_decimal(),
            is_complete: !total.is_zero() && paid >= total,
            has_undefined_pricing,
        }
    }

    /// Balance floored at zero, for places that never show a negative saldo.
    pub fn clamped_balance(&self) -> Amount {
        let paid = self.paid.value();
        Amount::new(self.total.value().saturating_sub(paid))
    }

    /// Returns `true` while money is still owed.
    pub fn has_outstanding_balance(&self) -> bool {
        self.balance > Decimal::ZERO
    }

    /// Total as shown on the order: exact, `$X+` when some prices are still
    /// pending, or the pending label when nothing has been priced.
    pub fn display_total(&self) -> String {
        match (self.has_undefined_pricing, self.total.is_zero()) {
            (true, true) => PRICE_PENDING_LABEL.to_string(),
            (true, false) => format!("{}+", self.total),
            (false, _) => self.total.to_string(),
        }
    }

    pub fn display_balance(&self) -> String {
        format_currency(self.balance)
    }
}
