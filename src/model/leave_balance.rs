use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::leave::LeaveType;

pub const DEFAULT_CASUAL_LEAVES: i32 = 12;
pub const DEFAULT_SICK_LEAVES: i32 = 10;
pub const DEFAULT_EARNED_LEAVES: i32 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveBalance {
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = 12)]
    pub casual_leaves: i32,
    #[schema(example = 10)]
    pub sick_leaves: i32,
    #[schema(example = 15)]
    pub earned_leaves: i32,
    #[schema(example = 1)]
    pub compensatory_leaves: i32,
}

impl LeaveBalance {
    /// Allocation used for a balance row that was never created.
    pub fn default_allocation(employee_id: u64) -> Self {
        Self {
            employee_id,
            casual_leaves: DEFAULT_CASUAL_LEAVES,
            sick_leaves: DEFAULT_SICK_LEAVES,
            earned_leaves: DEFAULT_EARNED_LEAVES,
            compensatory_leaves: 0,
        }
    }

    pub fn available(&self, leave_type: LeaveType) -> i32 {
        match leave_type {
            LeaveType::Casual => self.casual_leaves,
            LeaveType::Sick => self.sick_leaves,
            LeaveType::Earned => self.earned_leaves,
            LeaveType::Compensatory => self.compensatory_leaves,
        }
    }

    fn counter_mut(&mut self, leave_type: LeaveType) -> &mut i32 {
        match leave_type {
            LeaveType::Casual => &mut self.casual_leaves,
            LeaveType::Sick => &mut self.sick_leaves,
            LeaveType::Earned => &mut self.earned_leaves,
            LeaveType::Compensatory => &mut self.compensatory_leaves,
        }
    }

    pub fn can_cover(&self, leave_type: LeaveType, days: i64) -> bool {
        days > 0 && i64::from(self.available(leave_type)) >= days
    }

    /// Mirrors the `GREATEST(col - days, 0)` update run on approval.
    pub fn after_deduction(&self, leave_type: LeaveType, days: i64) -> Self {
        let mut next = self.clone();
        let counter = next.counter_mut(leave_type);
        let remaining = (i64::from(*counter) - days.max(0)).max(0);
        *counter = i32::try_from(remaining).unwrap_or(i32::MAX);
        next
    }

    /// One compensatory day on top of this balance; seeds the holiday upsert.
    pub fn with_compensatory_credit(&self) -> Self {
        let mut next = self.clone();
        next.compensatory_leaves = next.compensatory_leaves.saturating_add(1);
        next
    }
}

/// Upsert that deducts `days` from one counter, floored at zero. A missing row
/// starts from the default allocation. Binds: employee_id, casual, sick, earned,
/// compensatory (the default allocation after deduction), then days.
pub fn deduction_upsert_sql(leave_type: LeaveType) -> String {
    let column = leave_type.balance_column();
    format!(
        r#"
        INSERT INTO leave_balances
            (employee_id, casual_leaves, sick_leaves, earned_leaves, compensatory_leaves)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE {column} = GREATEST({column} - ?, 0)
        "#
    )
}

/// Single-statement compensatory credit. Binds: employee_id, casual, sick,
/// earned, compensatory (the default allocation after one credit).
pub const COMPENSATORY_CREDIT_SQL: &str = r#"
    INSERT INTO leave_balances
        (employee_id, casual_leaves, sick_leaves, earned_leaves, compensatory_leaves)
    VALUES (?, ?, ?, ?, ?)
    ON DUPLICATE KEY UPDATE compensatory_leaves = compensatory_leaves + 1
"#;

pub const BALANCE_SELECT: &str = r#"
    SELECT employee_id, casual_leaves, sick_leaves, earned_leaves, compensatory_leaves
    FROM leave_balances
    WHERE employee_id = ?
"#;

/// Balance for an employee; a missing row means "not yet created".
pub async fn fetch_balance<'e, E>(executor: E, employee_id: u64) -> Result<LeaveBalance, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::MySql>,
{
    let row = sqlx::query_as::<_, LeaveBalance>(BALANCE_SELECT)
        .bind(employee_id)
        .fetch_optional(executor)
        .await?;

    Ok(row.unwrap_or_else(|| LeaveBalance::default_allocation(employee_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn deduction_subtracts_inclusive_days() {
        let before = LeaveBalance::default_allocation(7);
        let after = before.after_deduction(LeaveType::Casual, 3);
        assert_eq!(after.casual_leaves, 9);
        assert_eq!(after.sick_leaves, before.sick_leaves);
    }

    #[test]
    fn deduction_is_floored_at_zero() {
        for leave_type in LeaveType::iter() {
            for days in [0_i64, 1, 5, 12, 40] {
                let before = LeaveBalance::default_allocation(7);
                let after = before.after_deduction(leave_type, days);
                let expected = (i64::from(before.available(leave_type)) - days).max(0);
                assert_eq!(i64::from(after.available(leave_type)), expected);
            }
        }
    }

    #[test]
    fn compensatory_credit_adds_exactly_one_per_call() {
        let mut balance = LeaveBalance::default_allocation(7);
        for expected in 1..=3 {
            balance = balance.with_compensatory_credit();
            assert_eq!(balance.compensatory_leaves, expected);
        }
        assert_eq!(balance.casual_leaves, DEFAULT_CASUAL_LEAVES);
    }

    #[test]
    fn cover_check_needs_enough_days() {
        let balance = LeaveBalance::default_allocation(7);
        assert!(balance.can_cover(LeaveType::Sick, 10));
        assert!(!balance.can_cover(LeaveType::Sick, 11));
        assert!(!balance.can_cover(LeaveType::Compensatory, 1));
        assert!(!balance.can_cover(LeaveType::Casual, 0));
    }

    #[test]
    fn deduction_sql_targets_one_column() {
        let sql = deduction_upsert_sql(LeaveType::Sick);
        assert!(sql.contains("sick_leaves = GREATEST(sick_leaves - ?, 0)"));
        assert!(!sql.contains("casual_leaves = GREATEST"));
    }
}
