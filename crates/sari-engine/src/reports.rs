//! # Report Assembly
//!
//! Loads sale records for a window and hands them to the pure
//! aggregation in `sari_core::report`. Reports are derived on demand and
//! never persisted, so they cannot drift from the sales that back them.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::instrument;

use crate::error::{EngineError, EngineResult};
use sari_core::report::{self, ReportSummary, SalesRollups};
use sari_core::{Operator, Role, SaleRecord};
use sari_db::Database;

/// Report queries, gated to the owner.
#[derive(Debug, Clone)]
pub struct Reports {
    db: Database,
}

impl Reports {
    /// Creates the report surface over the given database.
    pub fn new(db: Database) -> Self {
        Reports { db }
    }

    /// Summarizes sales over `[start, end]` calendar dates, both
    /// inclusive; the end date extends to its last instant.
    #[instrument(skip(self, operator), fields(operator = %operator.name))]
    pub async fn summarize_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        operator: &Operator,
    ) -> EngineResult<ReportSummary> {
        require_owner(operator)?;

        let records = self
            .db
            .sales()
            .list_by_date_range(report::start_of_day(start), report::end_of_day(end))
            .await?;

        Ok(report::summarize(&records))
    }

    /// Today / last-7-days / last-calendar-month rollups as of `now`.
    pub async fn rollups(
        &self,
        operator: &Operator,
        now: DateTime<Utc>,
    ) -> EngineResult<SalesRollups> {
        require_owner(operator)?;

        let month_start = now
            .checked_sub_months(chrono::Months::new(1))
            .unwrap_or(now);
        let records = self.db.sales().list_by_date_range(month_start, now).await?;

        Ok(report::rollup_windows(&records, now))
    }

    /// The most recent sales, newest first. Owner only.
    pub async fn recent_sales(
        &self,
        operator: &Operator,
        limit: u32,
    ) -> EngineResult<Vec<SaleRecord>> {
        require_owner(operator)?;
        Ok(self.db.sales().list_recent(limit).await?)
    }

    /// One operator's sales, newest first. Owners can see anyone; other
    /// roles only themselves.
    pub async fn sales_for_operator(
        &self,
        operator: &Operator,
        target_operator_id: &str,
        limit: u32,
    ) -> EngineResult<Vec<SaleRecord>> {
        if operator.role != Role::Owner && operator.id != target_operator_id {
            return Err(EngineError::NotAuthorized {
                required: Role::Owner,
                actual: operator.role,
            });
        }
        Ok(self
            .db
            .sales()
            .list_by_operator(target_operator_id, limit)
            .await?)
    }
}

fn require_owner(operator: &Operator) -> EngineResult<()> {
    if operator.role != Role::Owner {
        return Err(EngineError::NotAuthorized {
            required: Role::Owner,
            actual: operator.role,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sari_core::{CartLine, PaymentMethod, SaleStatus};
    use sari_db::DbConfig;
    use uuid::Uuid;

    fn owner() -> Operator {
        Operator {
            id: "o1".to_string(),
            name: "Aling Nena".to_string(),
            role: Role::Owner,
        }
    }

    fn sale(
        subtotal_cents: i64,
        operator: (&str, &str),
        timestamp: DateTime<Utc>,
    ) -> SaleRecord {
        SaleRecord {
            id: Uuid::new_v4().to_string(),
            lines: vec![CartLine {
                product_id: "p1".to_string(),
                name: "Pancit Canton".to_string(),
                unit_price_cents: subtotal_cents,
                quantity: 1,
            }],
            subtotal_cents,
            operator_id: operator.0.to_string(),
            operator_name: operator.1.to_string(),
            timestamp,
            payment_method: PaymentMethod::Cash,
            status: SaleStatus::Completed,
        }
    }

    async fn insert(db: &Database, record: &SaleRecord) {
        let mut tx = db.pool().begin().await.unwrap();
        db.sales().insert_in_tx(&mut *tx, record).await.unwrap();
        tx.commit().await.unwrap();
    }

    fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_range_summary_with_two_operators() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let reports = Reports::new(db.clone());

        insert(&db, &sale(10000, ("c1", "Ana"), ts(2026, 8, 1, 9))).await;
        insert(&db, &sale(20000, ("c2", "Ben"), ts(2026, 8, 3, 14))).await;
        insert(&db, &sale(5000, ("c1", "Ana"), ts(2026, 8, 7, 23))).await;
        // Outside the range.
        insert(&db, &sale(99900, ("c1", "Ana"), ts(2026, 8, 8, 0))).await;

        let summary = reports
            .summarize_range(
                NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
                &owner(),
            )
            .await
            .unwrap();

        assert_eq!(summary.total_sales_cents, 35000);
        assert_eq!(summary.total_transactions, 3);
        // ₱350.00 / 3 → ₱116.67 half-up.
        assert_eq!(summary.average_transaction_cents, 11667);
        assert_eq!(summary.cashier_performance[0].operator_name, "Ben");
        assert_eq!(summary.cashier_performance[1].transactions, 2);
    }

    #[tokio::test]
    async fn test_end_date_is_inclusive_to_last_instant() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let reports = Reports::new(db.clone());

        // 23:00 on the end date must count.
        insert(&db, &sale(1000, ("c1", "Ana"), ts(2026, 8, 7, 23))).await;

        let summary = reports
            .summarize_range(
                NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
                NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
                &owner(),
            )
            .await
            .unwrap();
        assert_eq!(summary.total_transactions, 1);
    }

    #[tokio::test]
    async fn test_reports_require_owner() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let reports = Reports::new(db);

        let cashier = Operator {
            id: "c1".to_string(),
            name: "Ana".to_string(),
            role: Role::Cashier,
        };

        let err = reports
            .summarize_range(
                NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
                &cashier,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotAuthorized { .. }));

        // A cashier can still list their own sales.
        assert!(reports.sales_for_operator(&cashier, "c1", 10).await.is_ok());
        let err = reports
            .sales_for_operator(&cashier, "c2", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotAuthorized { .. }));
    }

    #[tokio::test]
    async fn test_rollup_windows() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let reports = Reports::new(db.clone());
        let now = ts(2026, 8, 30, 12);

        insert(&db, &sale(1000, ("c1", "Ana"), ts(2026, 8, 30, 9))).await; // today
        insert(&db, &sale(2000, ("c1", "Ana"), ts(2026, 8, 26, 9))).await; // week
        insert(&db, &sale(4000, ("c1", "Ana"), ts(2026, 8, 5, 9))).await; // month
        insert(&db, &sale(8000, ("c1", "Ana"), ts(2026, 6, 5, 9))).await; // older

        let rollups = reports.rollups(&owner(), now).await.unwrap();
        assert_eq!(rollups.today.sales_cents, 1000);
        assert_eq!(rollups.week.sales_cents, 3000);
        assert_eq!(rollups.month.sales_cents, 7000);
        assert_eq!(rollups.month.transactions, 3);
    }
}
