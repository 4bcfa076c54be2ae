//! # Report Aggregation
//!
//! Pure functions deriving sales summaries from sale records. Nothing here
//! is persisted; every summary is recomputed from the record set on
//! request, so two calls over the same records always agree.
//!
//! All figures are pre-tax subtotals. The 12% VAT is applied only when a
//! figure is displayed or exported, through [`crate::money::Money::with_tax`].

use std::collections::HashMap;

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::SaleRecord;
use crate::TOP_PRODUCTS_LIMIT;

// =============================================================================
// Summary Types
// =============================================================================

/// A product's aggregate standing within a report range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub quantity_sold: i64,
    pub revenue_cents: i64,
}

/// One calendar day's totals within a report range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBreakdown {
    pub date: NaiveDate,
    pub sales_cents: i64,
    pub transactions: i64,
}

/// One operator's totals within a report range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashierPerformance {
    pub operator_id: String,
    pub operator_name: String,
    pub sales_cents: i64,
    pub transactions: i64,
}

/// Derived report for an arbitrary date range. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Sum of pre-tax subtotals.
    pub total_sales_cents: i64,
    pub total_transactions: i64,
    /// `total / count`, rounded half-up; 0 when there are no transactions.
    pub average_transaction_cents: i64,
    /// Top products by revenue, descending, at most 10.
    pub top_products: Vec<TopProduct>,
    /// Per-day totals, ascending by date.
    pub daily_breakdown: Vec<DailyBreakdown>,
    /// Per-operator totals, descending by sales.
    pub cashier_performance: Vec<CashierPerformance>,
}

/// Totals for one pre-canned rollup window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowTotals {
    pub sales_cents: i64,
    pub transactions: i64,
}

/// The today/week/month rollups the owner dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRollups {
    /// Same UTC calendar date as `now`.
    pub today: WindowTotals,
    /// Timestamp within the last 7 days.
    pub week: WindowTotals,
    /// Timestamp within the last calendar month.
    pub month: WindowTotals,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Summarizes a pre-filtered set of sale records.
///
/// The caller is responsible for restricting `records` to the wanted date
/// range (inclusive of the end date's end-of-day). Identical inputs give
/// identical outputs; this function performs no I/O.
pub fn summarize(records: &[SaleRecord]) -> ReportSummary {
    let total_sales_cents: i64 = records.iter().map(|r| r.subtotal_cents).sum();
    let total_transactions = records.len() as i64;
    let average_transaction_cents = if total_transactions > 0 {
        // Half-up rounding in integer centavos: 35000/3 → 11667 (₱116.67).
        (total_sales_cents + total_transactions / 2) / total_transactions
    } else {
        0
    };

    // Top products: group lines by product id, rank by revenue.
    let mut by_product: HashMap<&str, TopProduct> = HashMap::new();
    for record in records {
        for line in &record.lines {
            let entry = by_product
                .entry(line.product_id.as_str())
                .or_insert_with(|| TopProduct {
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    quantity_sold: 0,
                    revenue_cents: 0,
                });
            entry.quantity_sold += line.quantity;
            entry.revenue_cents += line.unit_price_cents * line.quantity;
        }
    }
    let mut top_products: Vec<TopProduct> = by_product.into_values().collect();
    top_products.sort_by(|a, b| {
        b.revenue_cents
            .cmp(&a.revenue_cents)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    top_products.truncate(TOP_PRODUCTS_LIMIT);

    // Daily breakdown: group by UTC calendar date, ascending.
    let mut by_day: HashMap<NaiveDate, DailyBreakdown> = HashMap::new();
    for record in records {
        let date = record.timestamp.date_naive();
        let entry = by_day.entry(date).or_insert_with(|| DailyBreakdown {
            date,
            sales_cents: 0,
            transactions: 0,
        });
        entry.sales_cents += record.subtotal_cents;
        entry.transactions += 1;
    }
    let mut daily_breakdown: Vec<DailyBreakdown> = by_day.into_values().collect();
    daily_breakdown.sort_by_key(|d| d.date);

    // Cashier performance: group by operator id, descending by sales.
    let mut by_operator: HashMap<&str, CashierPerformance> = HashMap::new();
    for record in records {
        let entry = by_operator
            .entry(record.operator_id.as_str())
            .or_insert_with(|| CashierPerformance {
                operator_id: record.operator_id.clone(),
                operator_name: record.operator_name.clone(),
                sales_cents: 0,
                transactions: 0,
            });
        entry.sales_cents += record.subtotal_cents;
        entry.transactions += 1;
    }
    let mut cashier_performance: Vec<CashierPerformance> = by_operator.into_values().collect();
    cashier_performance.sort_by(|a, b| {
        b.sales_cents
            .cmp(&a.sales_cents)
            .then_with(|| a.operator_id.cmp(&b.operator_id))
    });

    ReportSummary {
        total_sales_cents,
        total_transactions,
        average_transaction_cents,
        top_products,
        daily_breakdown,
        cashier_performance,
    }
}

/// Computes the today/week/month rollups from records covering at least
/// the last calendar month.
///
/// Windows:
/// - today: same UTC calendar date as `now`
/// - week: `timestamp >= now − 7 days`
/// - month: `timestamp >= now − 1 calendar month`
pub fn rollup_windows(records: &[SaleRecord], now: DateTime<Utc>) -> SalesRollups {
    let week_start = now - chrono::Duration::days(7);
    let month_start = now.checked_sub_months(Months::new(1)).unwrap_or(now);
    let today = now.date_naive();

    let mut rollups = SalesRollups::default();
    for record in records {
        if record.timestamp.date_naive() == today {
            rollups.today.sales_cents += record.subtotal_cents;
            rollups.today.transactions += 1;
        }
        if record.timestamp >= week_start {
            rollups.week.sales_cents += record.subtotal_cents;
            rollups.week.transactions += 1;
        }
        if record.timestamp >= month_start {
            rollups.month.sales_cents += record.subtotal_cents;
            rollups.month.transactions += 1;
        }
    }
    rollups
}

/// The inclusive end instant for a report end date (23:59:59.999 UTC).
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + chrono::Duration::milliseconds(86_400_000 - 1)
}

/// The start instant for a report start date (midnight UTC).
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CartLine, PaymentMethod, SaleRecord, SaleStatus};
    use chrono::TimeZone;

    fn sale(
        id: &str,
        operator: (&str, &str),
        subtotal_cents: i64,
        timestamp: DateTime<Utc>,
        lines: Vec<CartLine>,
    ) -> SaleRecord {
        SaleRecord {
            id: id.to_string(),
            lines,
            subtotal_cents,
            operator_id: operator.0.to_string(),
            operator_name: operator.1.to_string(),
            timestamp,
            payment_method: PaymentMethod::Cash,
            status: SaleStatus::Completed,
        }
    }

    fn line(product_id: &str, unit_price_cents: i64, quantity: i64) -> CartLine {
        CartLine {
            product_id: product_id.to_string(),
            name: format!("Product {}", product_id),
            unit_price_cents,
            quantity,
        }
    }

    fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_summarize_empty_is_zero_not_fault() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_sales_cents, 0);
        assert_eq!(summary.total_transactions, 0);
        assert_eq!(summary.average_transaction_cents, 0);
        assert!(summary.top_products.is_empty());
    }

    #[test]
    fn test_summarize_three_sales_two_operators() {
        // Totals 100.00, 200.00, 50.00 over a 7-day range.
        let records = vec![
            sale("s1", ("c1", "Ana"), 10000, ts(2026, 8, 1, 9), vec![line("p1", 10000, 1)]),
            sale("s2", ("c2", "Ben"), 20000, ts(2026, 8, 3, 14), vec![line("p2", 10000, 2)]),
            sale("s3", ("c1", "Ana"), 5000, ts(2026, 8, 3, 16), vec![line("p1", 5000, 1)]),
        ];

        let summary = summarize(&records);
        assert_eq!(summary.total_sales_cents, 35000);
        assert_eq!(summary.total_transactions, 3);
        // 350.00 / 3 = 116.666... → ₱116.67
        assert_eq!(summary.average_transaction_cents, 11667);

        // Cashier performance descending by sales: Ben (200) then Ana (150).
        assert_eq!(summary.cashier_performance.len(), 2);
        assert_eq!(summary.cashier_performance[0].operator_id, "c2");
        assert_eq!(summary.cashier_performance[0].sales_cents, 20000);
        assert_eq!(summary.cashier_performance[1].operator_id, "c1");
        assert_eq!(summary.cashier_performance[1].sales_cents, 15000);
        assert_eq!(summary.cashier_performance[1].transactions, 2);

        // Daily breakdown ascending by date.
        assert_eq!(summary.daily_breakdown.len(), 2);
        assert_eq!(summary.daily_breakdown[0].date, ts(2026, 8, 1, 0).date_naive());
        assert_eq!(summary.daily_breakdown[0].sales_cents, 10000);
        assert_eq!(summary.daily_breakdown[1].sales_cents, 25000);
        assert_eq!(summary.daily_breakdown[1].transactions, 2);
    }

    #[test]
    fn test_top_products_ranked_by_revenue() {
        let records = vec![
            // p1: qty 5 but low revenue; p2: qty 1, high revenue.
            sale("s1", ("c1", "Ana"), 10500, ts(2026, 8, 1, 9), vec![
                line("p1", 100, 5),
                line("p2", 10000, 1),
            ]),
            sale("s2", ("c1", "Ana"), 300, ts(2026, 8, 2, 9), vec![line("p1", 100, 3)]),
        ];

        let summary = summarize(&records);
        assert_eq!(summary.top_products[0].product_id, "p2");
        assert_eq!(summary.top_products[0].revenue_cents, 10000);
        assert_eq!(summary.top_products[1].product_id, "p1");
        assert_eq!(summary.top_products[1].quantity_sold, 8);
        assert_eq!(summary.top_products[1].revenue_cents, 800);
    }

    #[test]
    fn test_top_products_truncated_to_ten() {
        let lines: Vec<CartLine> = (0..15).map(|i| line(&format!("p{}", i), 100 + i, 1)).collect();
        let subtotal = lines.iter().map(|l| l.unit_price_cents).sum();
        let records = vec![sale("s1", ("c1", "Ana"), subtotal, ts(2026, 8, 1, 9), lines)];

        let summary = summarize(&records);
        assert_eq!(summary.top_products.len(), 10);
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let records = vec![
            sale("s1", ("c1", "Ana"), 10000, ts(2026, 8, 1, 9), vec![line("p1", 10000, 1)]),
            sale("s2", ("c2", "Ben"), 20000, ts(2026, 8, 2, 9), vec![line("p2", 20000, 1)]),
        ];
        assert_eq!(summarize(&records), summarize(&records));
    }

    #[test]
    fn test_rollup_windows() {
        let now = ts(2026, 8, 30, 12);
        let records = vec![
            sale("s1", ("c1", "Ana"), 1000, ts(2026, 8, 30, 9), vec![]), // today
            sale("s2", ("c1", "Ana"), 2000, ts(2026, 8, 27, 9), vec![]), // this week
            sale("s3", ("c1", "Ana"), 4000, ts(2026, 8, 10, 9), vec![]), // this month
            sale("s4", ("c1", "Ana"), 8000, ts(2026, 6, 10, 9), vec![]), // older
        ];

        let rollups = rollup_windows(&records, now);
        assert_eq!(rollups.today.sales_cents, 1000);
        assert_eq!(rollups.today.transactions, 1);
        assert_eq!(rollups.week.sales_cents, 3000);
        assert_eq!(rollups.week.transactions, 2);
        assert_eq!(rollups.month.sales_cents, 7000);
        assert_eq!(rollups.month.transactions, 3);
    }

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let start = start_of_day(date);
        let end = end_of_day(date);
        assert!(start < end);
        assert_eq!(start.date_naive(), date);
        assert_eq!(end.date_naive(), date);
    }
}
