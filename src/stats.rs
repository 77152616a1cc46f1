//! Sales statistics across orders.
//!
//! Period figures only look at orders created inside the selected period.
//! Payment completion, status breakdown, top clients and outstanding balances
//! always cover every order.

use crate::currency::Amount;
use crate::ledger::OrderLedger;
use crate::order::{ClientRef, Order, OrderStatus};
use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// How many clients the ranking keeps by default.
pub const TOP_CLIENTS: usize = 10;

/// Reporting window for the sales summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    ThisMonth,
    PreviousMonth,
    ThisYear,
    All,
}

impl Period {
    /// Returns `true` if an order created on `date` falls inside the period
    /// as seen from `today`. Undated orders only count for [`Period::All`].
    pub fn contains(&self, date: Option<NaiveDate>, today: NaiveDate) -> bool {
        if *self == Period::All {
            return true;
        }
        let Some(date) = date else {
            return false;
        };

        let month_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1);
        match self {
            Period::ThisMonth => month_start.is_some_and(|start| date >= start),
            Period::PreviousMonth => {
                let previous_end = month_start.and_then(|start| start.pred_opt());
                let previous_start = previous_end
                    .and_then(|end| NaiveDate::from_ymd_opt(end.year(), end.month(), 1));
                match (previous_start, previous_end) {
                    (Some(start), Some(end)) => date >= start && date <= end,
                    _ => false,
                }
            }
            Period::ThisYear => {
                NaiveDate::from_ymd_opt(today.year(), 1, 1).is_some_and(|start| date >= start)
            }
            Period::All => true,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Period::ThisMonth => "this-month",
            Period::PreviousMonth => "previous-month",
            Period::ThisYear => "this-year",
            Period::All => "all",
        })
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "this-month" => Ok(Period::ThisMonth),
            "previous-month" => Ok(Period::PreviousMonth),
            "this-year" => Ok(Period::ThisYear),
            "all" => Ok(Period::All),
            other => Err(format!(
                "unknown period '{}' (expected this-month, previous-month, this-year or all)",
                other
            )),
        }
    }
}

/// `part / whole` as a percentage with exactly one decimal place; zero when
/// `whole` is.
fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    let mut pct = if whole.is_zero() {
        Decimal::ZERO
    } else {
        (part * Decimal::ONE_HUNDRED / whole)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    };
    pct.rescale(1);
    pct
}

/// Number of orders currently in one status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: usize,
    pub percentage: Decimal,
}

/// Business overview for the statistics page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesSummary {
    pub period: Period,
    pub period_orders: usize,
    pub period_revenue: Amount,
    pub period_collected: Amount,

    pub total_orders: usize,
    pub complete_orders: usize,
    pub incomplete_orders: usize,
    pub revenue: Amount,
    pub collected: Amount,

    /// `collected / revenue` as a percentage, one decimal place.
    pub collection_rate: Decimal,

    pub by_status: Vec<StatusCount>,
}

impl SalesSummary {
    pub fn compute(orders: &[&Order], period: Period, today: NaiveDate) -> Self {
        let ledgers: Vec<(&Order, OrderLedger)> =
            orders.iter().map(|order| (*order, order.ledger())).collect();

        let mut period_orders = 0;
        let mut period_revenue = Amount::ZERO;
        let mut period_collected = Amount::ZERO;
        let mut revenue = Amount::ZERO;
        let mut collected = Amount::ZERO;
        let mut complete_orders = 0;

        for (order, ledger) in &ledgers {
            if period.contains(order.created_at, today) {
                period_orders += 1;
                period_revenue += ledger.total;
                period_collected += ledger.paid;
            }
            revenue += ledger.total;
            collected += ledger.paid;
            if ledger.is_complete {
                complete_orders += 1;
            }
        }

        let total_orders = ledgers.len();
        let by_status = OrderStatus::ALL
            .into_iter()
            .map(|status| {
                let count = orders.iter().filter(|o| o.status == status).count();
                StatusCount {
                    status,
                    count,
                    percentage: percentage(Decimal::from(count), Decimal::from(total_orders)),
                }
            })
            .collect();

        SalesSummary {
            period,
            period_orders,
            period_revenue,
            period_collected,
            total_orders,
            complete_orders,
            incomplete_orders: total_orders - complete_orders,
            revenue,
            collected,
            collection_rate: percentage(collected.to_decimal(), revenue.to_decimal()),
            by_status,
        }
    }
}

/// Lifetime totals for one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTotals {
    pub client: ClientRef,
    pub orders: usize,
    pub total: Amount,
    pub paid: Amount,
}

/// Clients ranked by what they have been billed, highest first.
///
/// Orders without a client are left out.
pub fn top_clients(orders: &[&Order], limit: usize) -> Vec<ClientTotals> {
    let mut by_client: HashMap<u32, ClientTotals> = HashMap::new();

    for order in orders {
        let Some(client) = &order.client else {
            continue;
        };
        let ledger = order.ledger();
        let entry = by_client.entry(client.id).or_insert_with(|| ClientTotals {
            client: client.clone(),
            orders: 0,
            total: Amount::ZERO,
            paid: Amount::ZERO,
        });
        entry.orders += 1;
        entry.total += ledger.total;
        entry.paid += ledger.paid;
    }

    let mut ranked: Vec<ClientTotals> = by_client.into_values().collect();
    ranked.sort_by(|a, b| b.total.cmp(&a.total).then(a.client.id.cmp(&b.client.id)));
    ranked.truncate(limit);
    ranked
}

/// An order that still has money owed on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutstandingOrder {
    pub order_id: u32,
    pub client: Option<ClientRef>,
    pub total: Amount,
    pub paid: Amount,
    pub pending: Amount,
}

/// Orders with a positive balance, largest balance first.
pub fn outstanding_orders(orders: &[&Order]) -> Vec<OutstandingOrder> {
    let mut pending: Vec<OutstandingOrder> = orders
        .iter()
        .filter_map(|order| {
            let ledger = order.ledger();
            ledger.has_outstanding_balance().then(|| OutstandingOrder {
                order_id: order.id,
                client: order.client.clone(),
                total: ledger.total,
                paid: ledger.paid,
                pending: ledger.clamped_balance(),
            })
        })
        .collect();

    pending.sort_by(|a, b| b.pending.cmp(&a.pending).then(a.order_id.cmp(&b.order_id)));
    pending
}
