use crate::api::attendance::{
    AttendanceFilter, AttendanceListResponse, MyAttendanceQuery, MyAttendanceResponse,
    SignInRequest, SignInResponse, SignOutRequest, TodayStatus,
};
use crate::api::dashboard::DashboardStats;
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::api::holiday::{CreateHoliday, HolidayQuery};
use crate::api::leave::{CreateLeave, LeaveDocument, LeaveFilter, LeaveListResponse};
use crate::api::salary_slip::SalarySlipRequest;
use crate::api::settings::UpdateSetting;
use crate::auth::handlers::{LoginResponse, SessionResponse};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, GeoPoint};
use crate::model::employee::Employee;
use crate::model::holiday::Holiday;
use crate::model::leave::{LeaveApplication, LeaveStatus, LeaveType};
use crate::model::leave_balance::LeaveBalance;
use crate::model::role::{Dashboard, Role};
use crate::model::salary_slip::{AttendanceSummary, SalaryBreakdown, SalarySlip};
use crate::model::setting::AppSetting;
use crate::models::LoginReqDto;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "VTC Attendance API",
        version = "1.0.0",
        description = r#"
## Employee Attendance & HR

Backend for a role-based attendance and HR application.

### 🔹 Key Features
- **Session & Roles**
  - Sign in, token rotation, and a dashboard per role (admin, hr, manager, employee, temp_vendor)
- **Attendance**
  - Daily sign-in with selfie and location, sign-out, manager/HR approval, CSV export
- **Leave**
  - Apply with an optional document, approve/reject, balance deducted on approval
- **Holidays**
  - Holiday calendar; working a holiday credits one compensatory leave
- **Salary Slips**
  - Fixed-structure monthly slip with a printable view

### 🔐 Security
Endpoints under `/api` require a **JWT Bearer** access token.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::session,

        crate::api::dashboard::stats,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::my_team,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::employee_leave_balance,

        crate::api::attendance::sign_in,
        crate::api::attendance::sign_out,
        crate::api::attendance::my_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::approve_attendance,
        crate::api::attendance::reject_attendance,
        crate::api::attendance::mark_present,
        crate::api::attendance::export_attendance,

        crate::api::leave::apply_leave,
        crate::api::leave::my_leaves,
        crate::api::leave::my_balance,
        crate::api::leave::leave_list,
        crate::api::leave::get_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,

        crate::api::holiday::list_holidays,
        crate::api::holiday::create_holiday,
        crate::api::holiday::delete_holiday,

        crate::api::salary_slip::generate_salary_slip,
        crate::api::salary_slip::print_salary_slip,

        crate::api::settings::list_settings,
        crate::api::settings::update_setting
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            SessionResponse,
            Role,
            Dashboard,
            DashboardStats,
            Employee,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            GeoPoint,
            AttendanceStatus,
            AttendanceRecord,
            SignInRequest,
            SignInResponse,
            SignOutRequest,
            TodayStatus,
            MyAttendanceQuery,
            MyAttendanceResponse,
            AttendanceFilter,
            AttendanceListResponse,
            LeaveType,
            LeaveStatus,
            LeaveDocument,
            CreateLeave,
            LeaveApplication,
            LeaveFilter,
            LeaveListResponse,
            LeaveBalance,
            Holiday,
            CreateHoliday,
            HolidayQuery,
            SalarySlipRequest,
            SalarySlip,
            SalaryBreakdown,
            AttendanceSummary,
            AppSetting,
            UpdateSetting
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Sign in, tokens and session"),
        (name = "Dashboard", description = "Organisation counters"),
        (name = "Employee", description = "Enrollment and directory"),
        (name = "Attendance", description = "Sign in/out and approvals"),
        (name = "Leave", description = "Leave applications and balances"),
        (name = "Holiday", description = "Holiday calendar"),
        (name = "Salary Slip", description = "Monthly salary slips"),
        (name = "Settings", description = "Application settings"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/api/session",
            "/api/attendance/sign-in",
            "/api/leave/{leave_id}/approve",
            "/api/holidays",
            "/api/salary-slip/{employee_id}/{month}/print",
            "/api/settings/{key}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
