//! Order event processing engine.
//!
//! Applies order events in the order they are read and keeps every order in
//! memory. Ledgers are derived from the orders when output is written.

use crate::currency::format_currency;
use crate::error::Result;
use crate::order::Order;
use crate::record::{EventKind, EventRecord, ParsedEvent};
use crate::stats::{outstanding_orders, Period, SalesSummary};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{Read, Write};

/// One line of ledger output.
#[derive(Debug, Serialize)]
struct LedgerRow {
    order: u32,
    client: String,
    status: String,
    items: usize,
    total: String,
    paid: String,
    balance: String,
    complete: bool,
}

/// The order ledger engine.
///
/// Orders are created on first reference, whether or not an `order` row has
/// declared them yet.
///
/// # Output Ordering
///
/// Ledger rows are written sorted by order ID in ascending order.
pub struct LedgerEngine {
    orders: HashMap<u32, Order>,
}

impl LedgerEngine {
    /// Creates a new empty engine.
    pub fn new() -> Self {
        LedgerEngine {
            orders: HashMap::new(),
        }
    }

    /// Processes order events from a CSV reader in streaming fashion.
    ///
    /// Invalid records are logged at warn level and skipped.
    pub fn process_csv<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut applied = 0usize;
        for (row_idx, result) in csv_reader.deserialize::<EventRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            match result.map_err(Into::into).and_then(|record| record.parse(row_num)) {
                Ok(event) => {
                    self.apply(event, row_num);
                    applied += 1;
                }
                Err(e) => warn!("Row {}: {}", row_num, e),
            }
        }

        info!(
            "Applied {} events across {} orders",
            applied,
            self.orders.len()
        );
        Ok(())
    }

    /// Applies a single parsed event.
    pub fn apply(&mut self, event: ParsedEvent, row: usize) {
        let order_id = event.order;
        let order = self
            .orders
            .entry(order_id)
            .or_insert_with(|| Order::new(order_id));

        match event.kind {
            EventKind::Order { client, created_at } => {
                if order.is_declared() {
                    warn!("Row {}: Order {} already declared, ignoring", row, order_id);
                    return;
                }
                if let Some(client) = client {
                    order.set_client(client);
                }
                if let Some(date) = created_at {
                    order.set_created_at(date);
                }
                debug!("Row {}: Declared order {}", row, order_id);
            }
            EventKind::Item { item_ref, item } => {
                let description = item.description.clone();
                if order.add_item(item_ref, item) {
                    debug!(
                        "Row {}: Added item {} '{}' to order {}",
                        row, item_ref, description, order_id
                    );
                } else {
                    warn!(
                        "Row {}: Duplicate item reference {} on order {}, ignoring",
                        row, item_ref, order_id
                    );
                }
            }
            EventKind::RemoveItem { item_ref } => {
                if !order.remove_item(item_ref) {
                    debug!(
                        "Row {}: Item {} not found on order {}, ignoring",
                        row, item_ref, order_id
                    );
                }
            }
            EventKind::Payment {
                payment_ref,
                payment,
            } => {
                let amount = payment.amount;
                match order.add_payment(payment_ref, payment) {
                    Ok(()) => debug!(
                        "Row {}: Recorded payment {} of {} on order {}",
                        row, payment_ref, amount, order_id
                    ),
                    Err(e) => warn!("Row {}: Order {}: {}", row, order_id, e),
                }
            }
            EventKind::RemovePayment { payment_ref } => {
                if !order.remove_payment(payment_ref) {
                    debug!(
                        "Row {}: Payment {} not found on order {}, ignoring",
                        row, payment_ref, order_id
                    );
                }
            }
            EventKind::Settle {
                payment_ref,
                timestamp,
            } => match order.settle(payment_ref, timestamp) {
                Some(amount) => debug!("Row {}: Settled order {} with {}", row, order_id, amount),
                None => debug!("Row {}: Order {} has nothing to settle", row, order_id),
            },
            EventKind::Unsettle => match order.unsettle() {
                Some(amount) => debug!(
                    "Row {}: Removed latest payment of {} from order {}",
                    row, amount, order_id
                ),
                None => debug!("Row {}: Order {} has no payments to remove", row, order_id),
            },
            EventKind::Status(status) => {
                order.set_status(status);
                debug!("Row {}: Order {} is now {}", row, order_id, status);
            }
        }
    }

    /// Returns an order by ID.
    pub fn order(&self, order_id: u32) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// All orders sorted by ID.
    pub fn orders(&self) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self.orders.values().collect();
        orders.sort_by_key(|o| o.id);
        orders
    }

    /// Writes one ledger row per order to CSV.
    ///
    /// Output is sorted by order ID. Totals with pending prices are shown as
    /// `$X+` or `Por definir`.
    pub fn write_output<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let orders = self.orders();
        if orders.is_empty() {
            csv_writer.write_record([
                "order", "client", "status", "items", "total", "paid", "balance", "complete",
            ])?;
        }

        for order in orders {
            let ledger = order.ledger();
            csv_writer.serialize(LedgerRow {
                order: order.id,
                client: order
                    .client
                    .as_ref()
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                status: order.status.to_string(),
                items: order.item_count(),
                total: ledger.display_total(),
                paid: ledger.paid.to_string(),
                balance: ledger.display_balance(),
                complete: ledger.is_complete,
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Writes the sales summary as `metric,value` CSV rows.
    pub fn write_stats<W: Write>(&self, writer: W, period: Period, today: NaiveDate) -> Result<()> {
        let orders = self.orders();
        let summary = SalesSummary::compute(&orders, period, today);
        let outstanding = outstanding_orders(&orders);
        let outstanding_balance = outstanding
            .iter()
            .map(|o| o.pending.to_decimal())
            .sum::<Decimal>();

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["metric", "value"])?;

        let mut rows: Vec<(String, String)> = vec![
            ("period".to_string(), summary.period.to_string()),
            ("period_orders".to_string(), summary.period_orders.to_string()),
            ("period_revenue".to_string(), summary.period_revenue.to_string()),
            ("period_collected".to_string(), summary.period_collected.to_string()),
            ("total_orders".to_string(), summary.total_orders.to_string()),
            ("complete_orders".to_string(), summary.complete_orders.to_string()),
            ("incomplete_orders".to_string(), summary.incomplete_orders.to_string()),
            ("revenue".to_string(), summary.revenue.to_string()),
            ("collected".to_string(), summary.collected.to_string()),
            ("collection_rate".to_string(), format!("{}%", summary.collection_rate)),
            ("outstanding_orders".to_string(), outstanding.len().to_string()),
            (
                "outstanding_balance".to_string(),
                format_currency(outstanding_balance),
            ),
        ];
        for status in &summary.by_status {
            rows.push((
                format!("status_{}", status.status),
                format!("{} ({}%)", status.count, status.percentage),
            ));
        }

        for (metric, value) in rows {
            csv_writer.write_record([metric, value])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

impl Default for LedgerEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::Amount;
    use crate::order::OrderStatus;
    use std::io::Cursor;

    const HEADER: &str = "type,order,client,ref,amount,quantity,date,note\n";

    fn process_csv_str(body: &str) -> LedgerEngine {
        let mut engine = LedgerEngine::new();
        engine
            .process_csv(Cursor::new(format!("{}{}", HEADER, body)))
            .unwrap();
        engine
    }

    fn output_of(engine: &LedgerEngine) -> String {
        let mut output = Vec::new();
        engine.write_output(&mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_items_and_payments() {
        let engine = process_csv_str(
            "item,1,,1,1.000,2,,Screen\n\
             item,1,,2,,1,,Diagnosis\n\
             payment,1,,1,500,,,\n",
        );

        let ledger = engine.order(1).unwrap().ledger();
        assert_eq!(ledger.total, Amount::new(2000));
        assert_eq!(ledger.paid, Amount::new(500));
        assert!(ledger.has_undefined_pricing);
        assert!(!ledger.is_complete);
    }

    #[test]
    fn test_payment_over_balance_is_skipped() {
        let engine = process_csv_str(
            "item,1,,1,1000,1,,Battery\n\
             payment,1,,1,1.500,,,\n\
             payment,1,,2,1000,,,\n",
        );

        let ledger = engine.order(1).unwrap().ledger();
        assert_eq!(ledger.paid, Amount::new(1000));
        assert!(ledger.is_complete);
    }

    #[test]
    fn test_settle_and_unsettle() {
        let engine = process_csv_str(
            "item,1,,1,8.000,1,,Motherboard\n\
             payment,1,,1,3000,,2026-01-05,\n\
             settle,1,,2,,,2026-01-06,\n\
             unsettle,1,,,,,,\n",
        );

        let ledger = engine.order(1).unwrap().ledger();
        assert_eq!(ledger.paid, Amount::new(3000));
        assert!(!ledger.is_complete);
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let engine = process_csv_str(
            "item,1,,1,2000,1,,Keyboard\n\
             payment,1,,1,abc,,,\n\
             refund,1,,,,,,\n\
             payment,x,,2,100,,,\n\
             payment,1,,3,100,,,\n",
        );

        assert_eq!(engine.orders().len(), 1);
        assert_eq!(engine.order(1).unwrap().ledger().paid, Amount::new(100));
    }

    #[test]
    fn test_order_declaration_and_status() {
        let engine = process_csv_str(
            "order,5,9,,,,2026-02-01,Ana\n\
             order,5,10,,,,2026-02-02,Luis\n\
             status,5,,,,,,listo\n",
        );

        let order = engine.order(5).unwrap();
        assert_eq!(order.client.as_ref().unwrap().name, "Ana");
        assert_eq!(order.status, OrderStatus::Listo);
    }

    #[test]
    fn test_output_format() {
        let engine = process_csv_str(
            "order,2,1,,,,,Luis\n\
             item,2,,1,12.000,1,,Fan\n\
             item,2,,2,,1,,Cleaning\n\
             item,1,,1,1000,1,,Cable\n\
             payment,1,,1,1000,,,\n",
        );

        let output = output_of(&engine);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines[0],
            "order,client,status,items,total,paid,balance,complete"
        );
        assert_eq!(lines[1], "1,,recibido,1,$1.000,$1.000,$0,true");
        assert_eq!(lines[2], "2,Luis,recibido,2,$12.000+,$0,$12.000,false");
    }

    #[test]
    fn test_empty_input_writes_header_only() {
        let engine = process_csv_str("");
        assert_eq!(
            output_of(&engine).trim(),
            "order,client,status,items,total,paid,balance,complete"
        );
    }

    #[test]
    fn test_stats_output() {
        let engine = process_csv_str(
            "order,1,1,,,,2026-03-02,Ana\n\
             item,1,,1,10.000,1,,Screen\n\
             payment,1,,1,4.000,,,\n\
             order,2,2,,,,2025-12-20,Luis\n\
             item,2,,1,6.000,1,,Battery\n\
             settle,2,,1,,,,\n",
        );

        let mut output = Vec::new();
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        engine
            .write_stats(&mut output, Period::ThisMonth, today)
            .unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.starts_with("metric,value\n"));
        assert!(output.contains("period_orders,1\n"));
        assert!(output.contains("period_revenue,$10.000\n"));
        assert!(output.contains("revenue,$16.000\n"));
        assert!(output.contains("collected,$10.000\n"));
        assert!(output.contains("collection_rate,62.5%\n"));
        assert!(output.contains("complete_orders,1\n"));
        assert!(output.contains("outstanding_balance,$6.000\n"));
        assert!(output.contains("status_recibido,2 (100.0%)\n"));
    }
}
