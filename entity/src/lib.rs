//! sea-orm entities for the HR suite schema.

pub mod departments;
pub mod employees;
pub mod leave_requests;
pub mod timesheets;
pub mod users;

pub mod prelude {
    pub use crate::departments::Entity as Departments;
    pub use crate::employees::Entity as Employees;
    pub use crate::leave_requests::Entity as LeaveRequests;
    pub use crate::timesheets::Entity as Timesheets;
    pub use crate::users::Entity as Users;
}
