//! Order event records as read from CSV, and their typed form.

use crate::currency::{check_amount_input, parse_currency, AmountInput};
use crate::error::{LedgerError, Result};
use crate::ledger::{LineItem, Payment};
use crate::order::{ClientRef, OrderStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

/// Raw event record as read from CSV.
///
/// Every column past `order` is optional; which ones matter depends on the
/// event type. Money columns are kept as text and read with
/// [`parse_currency`], since they come straight from hand-typed forms.
#[derive(Debug, Default, Deserialize)]
pub struct EventRecord {
    /// Event type: order, item, remove_item, payment, remove_payment, settle, unsettle, status
    #[serde(rename = "type")]
    pub event_type: String,

    /// Order the event applies to
    pub order: u32,

    /// Client ID (order events)
    #[serde(default)]
    pub client: Option<u32>,

    /// Item or payment reference, unique within the order
    #[serde(default, rename = "ref")]
    pub reference: Option<u32>,

    /// Money as typed: unit price for items, amount for payments
    #[serde(default)]
    pub amount: Option<String>,

    /// Item quantity; missing or unreadable means 1
    #[serde(default)]
    pub quantity: Option<String>,

    /// `YYYY-MM-DD` or RFC 3339 timestamp
    #[serde(default)]
    pub date: Option<String>,

    /// Client name, item description or status value
    #[serde(default)]
    pub note: Option<String>,
}

impl EventRecord {
    /// Parses the raw CSV record into a typed event.
    ///
    /// `row` is only used to label errors.
    pub fn parse(&self, row: usize) -> Result<ParsedEvent> {
        let event_type = self.event_type.trim().to_lowercase();

        let kind = match event_type.as_str() {
            "order" => EventKind::Order {
                client: self.client.map(|id| ClientRef {
                    id,
                    name: self.note_text().unwrap_or_default(),
                }),
                created_at: self.parse_date(row)?,
            },
            "item" => {
                let description = self
                    .note_text()
                    .ok_or_else(|| invalid(row, "item requires a description"))?;
                let unit_price = self
                    .amount
                    .as_deref()
                    .map(parse_currency)
                    .unwrap_or_default();
                EventKind::Item {
                    item_ref: self.require_ref(row)?,
                    item: LineItem::new(description, unit_price, self.parse_quantity()),
                }
            }
            "remove_item" => EventKind::RemoveItem {
                item_ref: self.require_ref(row)?,
            },
            "payment" => {
                let text = self.amount.as_deref().unwrap_or_default();
                let amount = match check_amount_input(text) {
                    AmountInput::Valid(amount) => amount,
                    AmountInput::Empty => return Err(invalid(row, "payment requires an amount")),
                    AmountInput::Invalid => {
                        return Err(invalid(row, &format!("invalid payment amount '{}'", text)))
                    }
                };
                EventKind::Payment {
                    payment_ref: self.require_ref(row)?,
                    payment: Payment::new(amount, self.parse_timestamp(row)?),
                }
            }
            "remove_payment" => EventKind::RemovePayment {
                payment_ref: self.require_ref(row)?,
            },
            "settle" => EventKind::Settle {
                payment_ref: self.require_ref(row)?,
                timestamp: self.parse_timestamp(row)?,
            },
            "unsettle" => EventKind::Unsettle,
            "status" => {
                let text = self
                    .note_text()
                    .ok_or_else(|| invalid(row, "status requires a value"))?;
                EventKind::Status(text.parse().map_err(|e: String| invalid(row, &e))?)
            }
            other => return Err(invalid(row, &format!("unknown event type '{}'", other))),
        };

        Ok(ParsedEvent {
            order: self.order,
            kind,
        })
    }

    fn note_text(&self) -> Option<String> {
        self.note
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn require_ref(&self, row: usize) -> Result<u32> {
        self.reference
            .ok_or_else(|| invalid(row, "missing item/payment reference"))
    }

    fn parse_quantity(&self) -> u32 {
        self.quantity
            .as_deref()
            .and_then(|q| q.trim().parse::<u32>().ok())
            .filter(|q| *q > 0)
            .unwrap_or(1)
    }

    fn date_text(&self) -> Option<&str> {
        self.date.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn parse_date(&self, row: usize) -> Result<Option<NaiveDate>> {
        self.date_text()
            .map(|text| parse_date_text(text).ok_or_else(|| bad_date(row, text)))
            .transpose()
    }

    /// Payment time from the date column, or now when the column is empty.
    fn parse_timestamp(&self, row: usize) -> Result<DateTime<Utc>> {
        match self.date_text() {
            Some(text) => parse_timestamp_text(text).ok_or_else(|| bad_date(row, text)),
            None => Ok(Utc::now()),
        }
    }
}

fn invalid(row: usize, message: &str) -> LedgerError {
    LedgerError::InvalidRecord {
        row,
        message: message.to_string(),
    }
}

fn bad_date(row: usize, text: &str) -> LedgerError {
    invalid(row, &format!("invalid date '{}'", text))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp_text(text).map(|ts| ts.date_naive()))
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A parsed and validated event ready to apply.
#[derive(Debug, Clone)]
pub struct ParsedEvent {
    /// Order the event targets
    pub order: u32,

    /// Event type with associated data
    pub kind: EventKind,
}

/// Event variants with associated data.
#[derive(Debug, Clone)]
pub enum EventKind {
    /// Declare who the order is for and when it was opened.
    Order {
        client: Option<ClientRef>,
        created_at: Option<NaiveDate>,
    },

    /// Add a line item. A blank price leaves the item pending.
    Item { item_ref: u32, item: LineItem },

    RemoveItem { item_ref: u32 },

    /// Record an abono, subject to the order's payment rules.
    Payment { payment_ref: u32, payment: Payment },

    RemovePayment { payment_ref: u32 },

    /// Pay off the remaining balance in one payment.
    Settle {
        payment_ref: u32,
        timestamp: DateTime<Utc>,
    },

    /// Delete the most recent payment.
    Unsettle,

    Status(OrderStatus),
}
