//! # Order Ledger
//!
//! Money handling for a computer-repair shop: reading amounts typed at the
//! counter, showing them back, and keeping each service order's total, abonos
//! and saldo straight.
//!
//! ## Design Principles
//!
//! - **Whole units**: amounts are non-negative integers; fractions are dropped
//!   on input and rounded away on display
//! - **Forgiving input**: `parse_currency` never fails, bad text reads as zero
//! - **Derived ledgers**: totals and balances are recomputed from items and
//!   payments, never stored
//! - **Deterministic output**: orders written sorted by order ID
//!
//! ## Example
//!
//! ```
//! use order_ledger::{parse_currency, Amount, LineItem, OrderLedger};
//!
//! let items = vec![LineItem::new("Screen", parse_currency("$1.000"), 2)];
//! let ledger = OrderLedger::compute(&items, &[]);
//! assert_eq!(ledger.total, Amount::new(2000));
//! assert_eq!(ledger.display_total(), "$2.000");
//! ```

pub mod config;
pub mod currency;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod order;
pub mod record;
pub mod stats;

pub use config::{Config, OutputMode};
pub use currency::{check_amount_input, format_currency, parse_currency, Amount, AmountInput};
pub use engine::LedgerEngine;
pub use error::{LedgerError, PaymentRejected, Result};
pub use ledger::{LineItem, OrderLedger, Payment};
pub use order::{ClientRef, Order, OrderStatus};
pub use record::{EventKind, EventRecord, ParsedEvent};
pub use stats::{outstanding_orders, top_clients, Period, SalesSummary};
