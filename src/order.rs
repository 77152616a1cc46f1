//! Service order aggregate and the rules for recording payments against it.

use crate::currency::Amount;
use crate::error::PaymentRejected;
use crate::ledger::{LineItem, OrderLedger, Payment};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Where a repair job is in the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Recibido,
    EnProceso,
    Listo,
    Entregado,
}

impl OrderStatus {
    /// All statuses in workflow order.
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Recibido,
        OrderStatus::EnProceso,
        OrderStatus::Listo,
        OrderStatus::Entregado,
    ];

    /// Stored value, as used in input files.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Recibido => "recibido",
            OrderStatus::EnProceso => "en_proceso",
            OrderStatus::Listo => "listo",
            OrderStatus::Entregado => "entregado",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("unknown order status '{}'", s.trim()))
    }
}

/// The client an order belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientRef {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone)]
struct ItemEntry {
    item_ref: u32,
    item: LineItem,
}

#[derive(Debug, Clone)]
struct PaymentEntry {
    payment_ref: u32,
    /// Insertion sequence, breaks timestamp ties when finding the latest payment.
    seq: u64,
    payment: Payment,
}

/// A service order with its line items and payments.
///
/// Items and payments are addressed by a reference id that is unique within
/// the order. The ledger is derived on every call to [`Order::ledger`].
#[derive(Debug, Clone)]
pub struct Order {
    pub id: u32,
    pub client: Option<ClientRef>,
    pub status: OrderStatus,
    pub created_at: Option<NaiveDate>,
    items: Vec<ItemEntry>,
    payments: Vec<PaymentEntry>,
    next_seq: u64,
}

impl Order {
    /// Creates an empty order in the `recibido` status.
    pub fn new(id: u32) -> Self {
        Order {
            id,
            client: None,
            status: OrderStatus::default(),
            created_at: None,
            items: Vec::new(),
            payments: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn set_client(&mut self, client: ClientRef) {
        self.client = Some(client);
    }

    pub fn set_created_at(&mut self, date: NaiveDate) {
        self.created_at = Some(date);
    }

    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }

    /// Returns `true` once client or creation date has been recorded.
    pub fn is_declared(&self) -> bool {
        self.client.is_some() || self.created_at.is_some()
    }

    pub fn items(&self) -> Vec<LineItem> {
        self.items.iter().map(|e| e.item.clone()).collect()
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.payments.iter().map(|e| e.payment.clone()).collect()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Adds a line item. Returns `false` if the reference is already taken.
    pub fn add_item(&mut self, item_ref: u32, item: LineItem) -> bool {
        if self.items.iter().any(|e| e.item_ref == item_ref) {
            return false;
        }
        self.items.push(ItemEntry { item_ref, item });
        true
    }

    /// Replaces an existing line item. Returns `false` if it does not exist.
    pub fn update_item(&mut self, item_ref: u32, item: LineItem) -> bool {
        match self.items.iter_mut().find(|e| e.item_ref == item_ref) {
            Some(entry) => {
                entry.item = item;
                true
            }
            None => false,
        }
    }

    /// Removes a line item. Returns `false` if it does not exist.
    pub fn remove_item(&mut self, item_ref: u32) -> bool {
        let before = self.items.len();
        self.items.retain(|e| e.item_ref != item_ref);
        self.items.len() != before
    }

    /// Records a payment against the order.
    ///
    /// The payment is refused if it is zero, if it would take the order past
    /// its outstanding balance, or if the reference is already in use.
    pub fn add_payment(
        &mut self,
        payment_ref: u32,
        payment: Payment,
    ) -> std::result::Result<(), PaymentRejected> {
        if self.payments.iter().any(|e| e.payment_ref == payment_ref) {
            return Err(PaymentRejected::DuplicateRef(payment_ref));
        }
        if payment.amount.is_zero() {
            return Err(PaymentRejected::NonPositive);
        }

        let balance = self.ledger().clamped_balance();
        if payment.amount > balance {
            return Err(PaymentRejected::ExceedsBalance {
                amount: payment.amount,
                balance,
            });
        }

        self.push_payment(payment_ref, payment);
        Ok(())
    }

    fn push_payment(&mut self, payment_ref: u32, payment: Payment) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.payments.push(PaymentEntry {
            payment_ref,
            seq,
            payment,
        });
    }

    /// Removes a payment. Returns `false` if it does not exist.
    pub fn remove_payment(&mut self, payment_ref: u32) -> bool {
        let before = self.payments.len();
        self.payments.retain(|e| e.payment_ref != payment_ref);
        self.payments.len() != before
    }

    /// Pays off whatever is still owed with a single payment.
    ///
    /// Returns the amount paid, or `None` when nothing is owed or the
    /// reference is already taken.
    pub fn settle(&mut self, payment_ref: u32, timestamp: DateTime<Utc>) -> Option<Amount> {
        let balance = self.ledger().clamped_balance();
        if balance.is_zero() || self.payments.iter().any(|e| e.payment_ref == payment_ref) {
            return None;
        }

        self.push_payment(payment_ref, Payment::new(balance, timestamp));
        Some(balance)
    }

    /// Deletes the most recent payment, reopening the balance.
    ///
    /// Returns the amount removed, or `None` if there were no payments.
    pub fn unsettle(&mut self) -> Option<Amount> {
        let latest = self
            .payments
            .iter()
            .enumerate()
            .max_by_key(|(_, e)| (e.payment.timestamp, e.seq))
            .map(|(idx, _)| idx)?;

        Some(self.payments.remove(latest).payment.amount)
    }

    /// Current ledger for this order.
    pub fn ledger(&self) -> OrderLedger {
        OrderLedger::compute(&self.items(), &self.payments())
    }
}
