use crate::{
    api::settings::company_name,
    auth::auth::AuthUser,
    error::AppError,
    model::{
        attendance::{ATTENDANCE_SELECT, AttendanceRecord},
        employee::{EMPLOYEE_COLUMNS, Employee},
        salary_slip::{SalaryBreakdown, SalarySlip, SlipMonth, summarize},
    },
};
use actix_web::{HttpResponse, http::header, web};
use chrono::Utc;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct SalarySlipRequest {
    #[schema(example = 7)]
    pub employee_id: u64,
    /// Calendar month as `YYYY-MM`
    #[schema(example = "2026-01")]
    pub month: String,
}

fn parse_month(raw: &str) -> Result<SlipMonth, AppError> {
    SlipMonth::parse(raw).ok_or_else(|| AppError::bad_request("Month must be in YYYY-MM format"))
}

/// Employee details plus approved attendance for the month, priced with the
/// fixed salary structure.
async fn build_slip(
    pool: &MySqlPool,
    employee_id: u64,
    month: SlipMonth,
) -> Result<SalarySlip, AppError> {
    let sql = format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS);
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    let sql = format!(
        "{} WHERE a.employee_id = ? AND a.status = 'approved' \
         AND a.work_date >= ? AND a.work_date < ? ORDER BY a.work_date",
        ATTENDANCE_SELECT
    );
    let records = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(employee_id)
        .bind(month.first_day())
        .bind(month.next_first_day())
        .fetch_all(pool)
        .await?;

    Ok(SalarySlip {
        employee_id: employee.id,
        employee_name: employee.full_name,
        email: employee.email,
        department: employee.department,
        month: month.label(),
        attendance: summarize(&records),
        salary: SalaryBreakdown::standard(),
        generated_at: Utc::now(),
    })
}

#[utoipa::path(
    post,
    path = "/api/salary-slip",
    request_body = SalarySlipRequest,
    responses(
        (status = 200, description = "Computed salary slip", body = SalarySlip),
        (status = 400, description = "Month must be in YYYY-MM format"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary Slip"
)]
pub async fn generate_salary_slip(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SalarySlipRequest>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let month = parse_month(&payload.month)?;

    let slip = build_slip(pool.get_ref(), payload.employee_id, month).await?;

    info!(
        employee_id = slip.employee_id,
        month = %slip.month,
        days = slip.attendance.total_days,
        by = auth.employee_id,
        "Salary slip generated"
    );

    Ok(HttpResponse::Ok().json(slip))
}

#[utoipa::path(
    get,
    path = "/api/salary-slip/{employee_id}/{month}/print",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        ("month" = String, Path, description = "Calendar month as YYYY-MM")
    ),
    responses(
        (status = 200, description = "Print-ready salary slip", content_type = "text/html", body = String),
        (status = 400, description = "Month must be in YYYY-MM format"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary Slip"
)]
pub async fn print_salary_slip(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, String)>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let (employee_id, raw_month) = path.into_inner();
    let month = parse_month(&raw_month)?;

    let slip = build_slip(pool.get_ref(), employee_id, month).await?;
    let company = company_name(pool.get_ref()).await?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
        .body(render_slip_html(&slip, &month, &company)))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Rupee amount with Indian digit grouping, e.g. `₹1,23,456.00`.
pub fn format_inr(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let grouped = if whole.len() <= 3 {
        whole.to_string()
    } else {
        let (head, tail) = whole.split_at(whole.len() - 3);
        let mut parts: Vec<&str> = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (left, right) = rest.split_at(rest.len() - 2);
            parts.push(right);
            rest = left;
        }
        parts.push(rest);
        parts.reverse();
        format!("{},{}", parts.join(","), tail)
    };

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}₹{}.{}", sign, grouped, fraction)
}

fn amount_rows(items: &[(&str, f64)]) -> String {
    items
        .iter()
        .map(|(label, amount)| {
            format!(
                "<tr><td>{}</td><td class=\"amt\">{}</td></tr>",
                label,
                format_inr(*amount)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_slip_html(slip: &SalarySlip, month: &SlipMonth, company: &str) -> String {
    let s = &slip.salary;
    let earnings = [
        ("Basic Pay", s.basic_pay),
        ("House Rent Allowance", s.hra),
        ("Conveyance Allowance", s.conveyance),
        ("Medical Allowance", s.medical_allowance),
    ];
    let deductions = [
        ("Professional Tax", s.professional_tax),
        ("Provident Fund", s.provident_fund),
    ];

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Salary Slip - {name} - {period}</title>
<style>
body {{ font-family: Arial, sans-serif; margin: 32px; color: #222; }}
h1 {{ margin: 0; }}
table {{ width: 100%; border-collapse: collapse; margin-top: 16px; }}
td, th {{ border: 1px solid #ccc; padding: 6px 10px; text-align: left; }}
.amt {{ text-align: right; }}
.net {{ font-size: 1.2em; font-weight: bold; margin-top: 16px; }}
@media print {{ body {{ margin: 0; }} }}
</style>
</head>
<body onload="window.print()">
<h1>{company}</h1>
<h2>Salary Slip for {period}</h2>
<table>
<tr><th>Employee</th><td>{name}</td><th>Employee ID</th><td>{id}</td></tr>
<tr><th>E-mail</th><td>{email}</td><th>Department</th><td>{department}</td></tr>
<tr><th>Days Present</th><td>{days}</td><th>Hours Worked</th><td>{hours:.2}</td></tr>
</table>
<table>
<tr><th>Earnings</th><th class="amt">Amount</th></tr>
{earnings}
<tr><th>Gross Salary</th><th class="amt">{gross}</th></tr>
</table>
<table>
<tr><th>Deductions</th><th class="amt">Amount</th></tr>
{deductions}
<tr><th>Total Deductions</th><th class="amt">{total_deductions}</th></tr>
</table>
<p class="net">Net Salary: {net}</p>
<p><small>Generated on {generated}. This is a computer generated document.</small></p>
</body>
</html>
"#,
        company = escape_html(company),
        period = month.display_name(),
        name = escape_html(&slip.employee_name),
        id = slip.employee_id,
        email = escape_html(&slip.email),
        department = escape_html(slip.department.as_deref().unwrap_or("-")),
        days = slip.attendance.total_days,
        hours = slip.attendance.total_hours,
        earnings = amount_rows(&earnings),
        gross = format_inr(s.gross_salary),
        deductions = amount_rows(&deductions),
        total_deductions = format_inr(s.total_deductions),
        net = format_inr(s.net_salary),
        generated = slip.generated_at.format("%d %b %Y %H:%M UTC"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::salary_slip::AttendanceSummary;

    #[test]
    fn rupees_use_indian_grouping() {
        assert_eq!(format_inr(200.0), "₹200.00");
        assert_eq!(format_inr(34_650.0), "₹34,650.00");
        assert_eq!(format_inr(123_456.5), "₹1,23,456.50");
        assert_eq!(format_inr(12_345_678.0), "₹1,23,45,678.00");
    }

    #[test]
    fn month_must_be_year_dash_month() {
        assert!(parse_month("2026-01").is_ok());
        assert!(matches!(parse_month("Jan 2026"), Err(AppError::BadRequest(_))));
    }

    fn slip() -> SalarySlip {
        SalarySlip {
            employee_id: 7,
            employee_name: "Asha <Verma>".into(),
            email: "asha.verma@vtc.example".into(),
            department: None,
            month: "2026-01".into(),
            attendance: AttendanceSummary {
                total_days: 20,
                total_hours: 160.0,
            },
            salary: SalaryBreakdown::standard(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn printable_slip_shows_fixed_figures() {
        let month = SlipMonth::parse("2026-01").unwrap();
        let html = render_slip_html(&slip(), &month, "VTC & Co");

        assert!(html.contains("<h1>VTC &amp; Co</h1>"));
        assert!(html.contains("Salary Slip for January 2026"));
        assert!(html.contains("Asha &lt;Verma&gt;"));
        assert!(html.contains("₹37,850.00"));
        assert!(html.contains("Net Salary: ₹34,650.00"));
        assert!(html.contains("<td>20</td>"));
    }
}
