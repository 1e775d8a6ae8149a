pub mod attendance;
pub mod employee;
pub mod holiday;
pub mod leave;
pub mod leave_balance;
pub mod role;
pub mod salary_slip;
pub mod setting;
