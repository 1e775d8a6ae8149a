use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, hours_between};

pub const BASIC_PAY: f64 = 25_000.0;
pub const HRA_RATE: f64 = 0.40;
pub const CONVEYANCE: f64 = 1_600.0;
pub const MEDICAL_ALLOWANCE: f64 = 1_250.0;
pub const PROFESSIONAL_TAX: f64 = 200.0;
pub const PF_RATE: f64 = 0.12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalaryBreakdown {
    #[schema(example = 25000.0)]
    pub basic_pay: f64,
    #[schema(example = 10000.0)]
    pub hra: f64,
    #[schema(example = 1600.0)]
    pub conveyance: f64,
    #[schema(example = 1250.0)]
    pub medical_allowance: f64,
    #[schema(example = 37850.0)]
    pub gross_salary: f64,
    #[schema(example = 200.0)]
    pub professional_tax: f64,
    #[schema(example = 3000.0)]
    pub provident_fund: f64,
    #[schema(example = 3200.0)]
    pub total_deductions: f64,
    #[schema(example = 34650.0)]
    pub net_salary: f64,
}

impl SalaryBreakdown {
    pub fn standard() -> Self {
        Self::from_basic(BASIC_PAY)
    }

    pub fn from_basic(basic_pay: f64) -> Self {
        let hra = basic_pay * HRA_RATE;
        let provident_fund = basic_pay * PF_RATE;

        let gross_salary = basic_pay + hra + CONVEYANCE + MEDICAL_ALLOWANCE;
        let total_deductions = PROFESSIONAL_TAX + provident_fund;

        Self {
            basic_pay,
            hra,
            conveyance: CONVEYANCE,
            medical_allowance: MEDICAL_ALLOWANCE,
            gross_salary,
            professional_tax: PROFESSIONAL_TAX,
            provident_fund,
            total_deductions,
            net_salary: gross_salary - total_deductions,
        }
    }
}

/// Descriptive totals only; attendance never changes the pay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceSummary {
    #[schema(example = 22)]
    pub total_days: usize,
    #[schema(example = 176.5)]
    pub total_hours: f64,
}

pub fn summarize(records: &[AttendanceRecord]) -> AttendanceSummary {
    let total_hours = records
        .iter()
        .filter_map(|r| r.signout_time.map(|out| hours_between(r.signin_time, out)))
        .sum();

    AttendanceSummary {
        total_days: records.len(),
        total_hours,
    }
}

/// A calendar month given as `YYYY-MM`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SlipMonth {
    first_day: NaiveDate,
}

impl SlipMonth {
    pub fn parse(raw: &str) -> Option<Self> {
        let (year, month) = raw.trim().split_once('-')?;
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if year.len() != 4 || month.len() != 2 || !digits(year) || !digits(month) {
            return None;
        }
        let first_day = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)?;
        Some(Self { first_day })
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// First day of the following month (exclusive bound).
    pub fn next_first_day(&self) -> NaiveDate {
        let (y, m) = if self.first_day.month() == 12 {
            (self.first_day.year() + 1, 1)
        } else {
            (self.first_day.year(), self.first_day.month() + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(self.first_day)
    }

    pub fn label(&self) -> String {
        self.first_day.format("%Y-%m").to_string()
    }

    pub fn display_name(&self) -> String {
        self.first_day.format("%B %Y").to_string()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SalarySlip {
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = "Asha Verma")]
    pub employee_name: String,
    #[schema(example = "asha.verma@vtc.example")]
    pub email: String,
    #[schema(example = "Operations", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "2026-01")]
    pub month: String,
    pub attendance: AttendanceSummary,
    pub salary: SalaryBreakdown,
    #[schema(value_type = String, format = "date-time")]
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn standard_slip_figures() {
        let slip = SalaryBreakdown::standard();
        assert_eq!(slip.basic_pay, 25_000.0);
        assert_eq!(slip.hra, 10_000.0);
        assert_eq!(slip.gross_salary, 37_850.0);
        assert_eq!(slip.provident_fund, 3_000.0);
        assert_eq!(slip.total_deductions, 3_200.0);
        assert_eq!(slip.net_salary, 34_650.0);
    }

    #[test]
    fn net_is_gross_minus_deductions() {
        for basic in [10_000.0, 18_500.0, 25_000.0, 60_000.0] {
            let slip = SalaryBreakdown::from_basic(basic);
            assert_eq!(slip.net_salary, slip.gross_salary - slip.total_deductions);
        }
    }

    fn record(day: u32, signout_hour: Option<u32>) -> AttendanceRecord {
        let signin = Utc.with_ymd_and_hms(2026, 1, day, 9, 0, 0).unwrap();
        AttendanceRecord {
            id: u64::from(day),
            employee_id: 7,
            employee_name: None,
            work_date: signin.date_naive(),
            signin_time: signin,
            signin_latitude: None,
            signin_longitude: None,
            signin_selfie_url: None,
            signout_time: signout_hour.map(|h| Utc.with_ymd_and_hms(2026, 1, day, h, 0, 0).unwrap()),
            signout_latitude: None,
            signout_longitude: None,
            status: "approved".into(),
            approved_by: Some(3),
            approved_at: None,
        }
    }

    #[test]
    fn summary_counts_days_and_paired_hours() {
        let records = vec![record(5, Some(17)), record(6, None), record(7, Some(13))];
        let summary = summarize(&records);
        assert_eq!(summary.total_days, 3);
        assert_eq!(summary.total_hours, 12.0);
    }

    #[test]
    fn month_bounds() {
        let jan = SlipMonth::parse("2026-01").unwrap();
        assert_eq!(jan.first_day(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(jan.next_first_day(), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(jan.display_name(), "January 2026");

        let dec = SlipMonth::parse("2025-12").unwrap();
        assert_eq!(dec.next_first_day(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(dec.label(), "2025-12");
    }

    #[test]
    fn malformed_months_are_rejected() {
        for raw in [
            "", "2026", "2026-13", "2026-1", "26-01", "2026/01", "abcd-ef", "2026-+1", "+202-01",
            "2026-00", "-026-01",
        ] {
            assert!(SlipMonth::parse(raw).is_none(), "{raw:?}");
        }
    }
}
