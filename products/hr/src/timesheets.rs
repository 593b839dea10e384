use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use entity::timesheets;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{Caller, FORBIDDEN, HrResult, Role, employees};

/// Stamps the current time as the caller's check-in (`check_in = true`) or
/// check-out for today.
pub async fn check(
    db: &DatabaseConnection,
    caller: &Caller,
    check_in: bool,
) -> HrResult<timesheets::Model> {
    check_at(db, caller, check_in, Utc::now().fixed_offset()).await
}

/// [`check`] with an explicit clock. The row is keyed by the UTC date of
/// `now`; a repeated stamp overwrites the previous one.
#[instrument(name = "hr.timesheets.check", skip_all, fields(caller = %caller.user_id, check_in))]
pub async fn check_at(
    db: &DatabaseConnection,
    caller: &Caller,
    check_in: bool,
    now: DateTime<FixedOffset>,
) -> HrResult<timesheets::Model> {
    caller.require_any(&[Role::Employee], "Only employees can check in or out")?;
    let employee = employees::me(db, caller).await?;
    let today = now.with_timezone(&Utc).date_naive();

    let existing = timesheets::Entity::find()
        .filter(timesheets::Column::EmployeeId.eq(employee.id))
        .filter(timesheets::Column::Date.eq(today))
        .one(db)
        .await?;
    let mut active: timesheets::ActiveModel = match existing {
        Some(row) => row.into(),
        None => timesheets::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(employee.id),
            date: Set(today),
            check_in: Set(None),
            check_out: Set(None),
        }
        .insert(db)
        .await?
        .into(),
    };
    if check_in {
        active.check_in = Set(Some(now));
    } else {
        active.check_out = Set(Some(now));
    }
    let row = active.update(db).await?;
    debug!(timesheet_id = %row.id, %today, "timesheet stamped");
    Ok(row)
}

/// Rows for `employee_id` with `start <= date <= end`, oldest first. An
/// inverted range is empty.
pub async fn range(
    db: &DatabaseConnection,
    caller: &Caller,
    employee_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> HrResult<Vec<timesheets::Model>> {
    caller.require_any(&[Role::Admin, Role::Manager], FORBIDDEN)?;
    Ok(timesheets::Entity::find()
        .filter(timesheets::Column::EmployeeId.eq(employee_id))
        .filter(timesheets::Column::Date.between(start, end))
        .order_by_asc(timesheets::Column::Date)
        .all(db)
        .await?)
}
