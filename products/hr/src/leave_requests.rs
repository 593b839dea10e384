use chrono::{NaiveDate, Utc};
use entity::leave_requests::{self, LeaveType, Status};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{Caller, HrError, HrResult, Role, employees};

#[derive(Debug, Clone, Deserialize)]
pub struct LeaveSubmission {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaveAssignment {
    pub employee_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Files a request for the caller's own employee record. Always pending.
#[instrument(name = "hr.leave.submit", skip_all, fields(caller = %caller.user_id))]
pub async fn submit(
    db: &DatabaseConnection,
    caller: &Caller,
    input: LeaveSubmission,
) -> HrResult<leave_requests::Model> {
    caller.require_any(&[Role::Employee], "Only employees can submit leave requests")?;
    let employee = employees::me(db, caller).await?;
    let model = insert(
        db,
        employee.id,
        input.leave_type,
        input.start_date,
        input.end_date,
        None,
    )
    .await?;
    info!(request_id = %model.id, "leave request submitted");
    Ok(model)
}

/// Admins and managers see every request; employees see their own.
pub async fn list(
    db: &DatabaseConnection,
    caller: &Caller,
    status: Option<Status>,
) -> HrResult<Vec<leave_requests::Model>> {
    let mut query = leave_requests::Entity::find();
    if caller.is_employee() {
        let Some(employee) = employees::for_user(db, caller.user_id).await? else {
            return Ok(Vec::new());
        };
        query = query.filter(leave_requests::Column::EmployeeId.eq(employee.id));
    }
    if let Some(status) = status {
        query = query.filter(leave_requests::Column::Status.eq(status));
    }
    Ok(query
        .order_by_desc(leave_requests::Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> HrResult<leave_requests::Model> {
    leave_requests::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| HrError::not_found("Leave request not found"))
}

/// Approves or rejects a pending request. Reserved for the manager of the
/// requester's department; admins are refused.
#[instrument(name = "hr.leave.decide", skip_all, fields(caller = %caller.user_id, %id, ?status))]
pub async fn decide(
    db: &DatabaseConnection,
    caller: &Caller,
    id: Uuid,
    status: Status,
) -> HrResult<leave_requests::Model> {
    let request = get(db, id).await?;
    if !caller.is_manager() {
        return Err(HrError::forbidden(
            "Only the department manager can approve or reject leave requests",
        ));
    }
    let department = requester_department(db, &request).await?;
    if !department.is_managed_by(caller.user_id) {
        return Err(HrError::forbidden(
            "Managers can only decide leave requests of their own employees",
        ));
    }
    if !status.is_terminal() {
        return Err(HrError::validation("status must be approved or rejected"));
    }
    if request.status.is_terminal() {
        return Err(HrError::validation("Leave request has already been decided"));
    }

    let mut active: leave_requests::ActiveModel = request.into();
    active.status = Set(status);
    active.approved_by_manager_id = Set(Some(caller.user_id));
    let model = active.update(db).await?;
    info!(status = ?model.status, "leave request decided");
    Ok(model)
}

/// Records leave on behalf of an employee, approved by the caller.
#[instrument(name = "hr.leave.assign", skip_all, fields(caller = %caller.user_id))]
pub async fn assign(
    db: &DatabaseConnection,
    caller: &Caller,
    input: LeaveAssignment,
) -> HrResult<leave_requests::Model> {
    let employee = employees::get(db, input.employee_id).await?;
    if !caller.is_admin() {
        let department = employees::owning_department(db, &employee).await?;
        caller.require_admin_or_owner(
            department.is_managed_by(caller.user_id),
            "Managers can only assign leave to their own employees",
        )?;
    }
    let model = insert(
        db,
        employee.id,
        input.leave_type,
        input.start_date,
        input.end_date,
        Some(caller.user_id),
    )
    .await?;
    info!(request_id = %model.id, employee_id = %employee.id, "leave assigned");
    Ok(model)
}

#[instrument(name = "hr.leave.delete", skip_all, fields(caller = %caller.user_id, %id))]
pub async fn delete(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> HrResult<()> {
    let request = get(db, id).await?;
    if !caller.is_admin() {
        let department = requester_department(db, &request).await?;
        caller.require_admin_or_owner(
            department.is_managed_by(caller.user_id),
            "Managers can only delete leave requests of their own employees",
        )?;
    }
    leave_requests::Entity::delete_by_id(id).exec(db).await?;
    info!("leave request deleted");
    Ok(())
}

async fn requester_department(
    db: &DatabaseConnection,
    request: &leave_requests::Model,
) -> HrResult<entity::departments::Model> {
    let employee = employees::get(db, request.employee_id).await?;
    employees::owning_department(db, &employee).await
}

async fn insert(
    db: &DatabaseConnection,
    employee_id: Uuid,
    leave_type: LeaveType,
    start_date: NaiveDate,
    end_date: NaiveDate,
    approver: Option<Uuid>,
) -> HrResult<leave_requests::Model> {
    if end_date < start_date {
        return Err(HrError::validation("end_date must not precede start_date"));
    }
    let status = if approver.is_some() {
        Status::Approved
    } else {
        Status::Pending
    };
    Ok(leave_requests::ActiveModel {
        id: Set(Uuid::new_v4()),
        employee_id: Set(employee_id),
        leave_type: Set(leave_type),
        start_date: Set(start_date),
        end_date: Set(end_date),
        status: Set(status),
        created_at: Set(Utc::now().fixed_offset()),
        approved_by_manager_id: Set(approver),
    }
    .insert(db)
    .await?)
}
