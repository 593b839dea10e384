use sea_orm_migration::prelude::*;

use crate::m20250508_000002_hr_tables::{Departments, Employees, LeaveRequests, Timesheets};

const INDEXES: [(&str, &str); 5] = [
    ("idx_departments_manager", "departments"),
    ("idx_employees_department", "employees"),
    ("idx_timesheets_employee_date", "timesheets"),
    ("idx_leave_requests_employee", "leave_requests"),
    ("idx_leave_requests_status", "leave_requests"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name(INDEXES[0].0)
                    .table(Departments::Table)
                    .col(Departments::ManagerId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name(INDEXES[1].0)
                    .table(Employees::Table)
                    .col(Employees::DepartmentId)
                    .to_owned(),
            )
            .await?;
        // Not unique: one row per (employee, date) is kept by find-or-create.
        manager
            .create_index(
                Index::create()
                    .name(INDEXES[2].0)
                    .table(Timesheets::Table)
                    .col(Timesheets::EmployeeId)
                    .col(Timesheets::Date)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name(INDEXES[3].0)
                    .table(LeaveRequests::Table)
                    .col(LeaveRequests::EmployeeId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name(INDEXES[4].0)
                    .table(LeaveRequests::Table)
                    .col(LeaveRequests::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in INDEXES {
            manager
                .drop_index(Index::drop().name(name).table(Alias::new(table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
