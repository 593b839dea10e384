use std::collections::HashMap;

use chrono::NaiveDate;
use entity::{departments, employees, users};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{check_length, required_text, unique_violation};
use crate::{Caller, HrError, HrResult, departments as department_ops, nullable};

const POSITION_MAX: usize = 100;
const PHONE_MAX: usize = 20;
const ALREADY_ASSIGNED: &str = "User already belongs to a department";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeFilter {
    #[serde(default)]
    pub department_id: Option<Uuid>,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeListItem {
    #[serde(flatten)]
    pub employee: employees::Model,
    pub user_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    pub user_id: Uuid,
    pub department_id: Uuid,
    pub position: String,
    pub hire_date: NaiveDate,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub salary: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeChanges {
    #[serde(default)]
    pub department_id: Option<Uuid>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub salary: Option<Option<f64>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

pub async fn list(
    db: &DatabaseConnection,
    filter: EmployeeFilter,
) -> HrResult<Vec<EmployeeListItem>> {
    let mut query = employees::Entity::find();
    if let Some(department_id) = filter.department_id {
        query = query.filter(employees::Column::DepartmentId.eq(department_id));
    }
    if let Some(position) = filter.position.filter(|p| !p.trim().is_empty()) {
        query = query.filter(employees::Column::Position.eq(position));
    }
    let rows = query
        .order_by_asc(employees::Column::HireDate)
        .all(db)
        .await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: Vec<Uuid> = rows.iter().map(|e| e.user_id).collect();
    let names: HashMap<Uuid, String> = users::Entity::find()
        .filter(users::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|user| (user.id, user.display_name().to_string()))
        .collect();

    Ok(rows
        .into_iter()
        .map(|employee| {
            let user_name = names
                .get(&employee.user_id)
                .cloned()
                .unwrap_or_else(|| employee.user_id.to_string());
            EmployeeListItem {
                employee,
                user_name,
            }
        })
        .collect())
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> HrResult<employees::Model> {
    employees::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| HrError::not_found("Employee not found"))
}

/// The employee record linked to `user_id`, if any.
pub async fn for_user(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> HrResult<Option<employees::Model>> {
    Ok(employees::Entity::find()
        .filter(employees::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

pub async fn me(db: &DatabaseConnection, caller: &Caller) -> HrResult<employees::Model> {
    for_user(db, caller.user_id)
        .await?
        .ok_or_else(|| HrError::not_found("Employee not found"))
}

#[instrument(name = "hr.employees.create", skip_all, fields(caller = %caller.user_id))]
pub async fn create(
    db: &DatabaseConnection,
    caller: &Caller,
    input: NewEmployee,
) -> HrResult<employees::Model> {
    let department = department_ops::get(db, input.department_id).await?;
    caller.require_admin_or_owner(
        department.is_managed_by(caller.user_id),
        "Managers can only add employees to their own departments",
    )?;
    users::Entity::find_by_id(input.user_id)
        .one(db)
        .await?
        .ok_or_else(|| HrError::not_found("User not found"))?;
    ensure_unassigned(db, input.user_id, None).await?;

    let position = required_text("position", &input.position, POSITION_MAX)?;
    let phone = clean_phone(input.phone)?;
    let model = employees::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(input.user_id),
        department_id: Set(department.id),
        position: Set(position),
        hire_date: Set(input.hire_date),
        phone: Set(phone),
        salary: Set(input.salary),
        is_active: Set(true),
    }
    .insert(db)
    .await
    .map_err(|err| unique_violation(err, || HrError::conflict(ALREADY_ASSIGNED)))?;
    info!(employee_id = %model.id, department_id = %model.department_id, "employee created");
    Ok(model)
}

#[instrument(name = "hr.employees.update", skip_all, fields(caller = %caller.user_id, %id))]
pub async fn update(
    db: &DatabaseConnection,
    caller: &Caller,
    id: Uuid,
    changes: EmployeeChanges,
) -> HrResult<employees::Model> {
    let employee = get(db, id).await?;
    let destination = match changes.department_id {
        Some(department_id) if department_id != employee.department_id => {
            Some(department_ops::get(db, department_id).await?)
        }
        _ => None,
    };
    if !caller.is_admin() {
        let current = department_ops::get(db, employee.department_id).await?;
        let owns_destination = destination
            .as_ref()
            .is_none_or(|dept| dept.is_managed_by(caller.user_id));
        caller.require_admin_or_owner(
            current.is_managed_by(caller.user_id) && owns_destination,
            "Managers can only transfer employees between their own departments",
        )?;
    }
    if destination.is_some() {
        ensure_unassigned(db, employee.user_id, Some(employee.id)).await?;
    }

    let mut active: employees::ActiveModel = employee.into();
    if let Some(department) = destination {
        active.department_id = Set(department.id);
    }
    if let Some(position) = changes.position {
        active.position = Set(required_text("position", &position, POSITION_MAX)?);
    }
    if let Some(hire_date) = changes.hire_date {
        active.hire_date = Set(hire_date);
    }
    if let Some(phone) = changes.phone {
        active.phone = Set(clean_phone(phone)?);
    }
    if let Some(salary) = changes.salary {
        active.salary = Set(salary);
    }
    if let Some(is_active) = changes.is_active {
        active.is_active = Set(is_active);
    }
    if !active.is_changed() {
        return get(db, id).await;
    }
    Ok(active.update(db).await?)
}

#[instrument(name = "hr.employees.delete", skip_all, fields(caller = %caller.user_id, %id))]
pub async fn delete(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> HrResult<()> {
    let employee = get(db, id).await?;
    if !caller.is_admin() {
        let department = owning_department(db, &employee).await?;
        caller.require_admin_or_owner(
            department.is_managed_by(caller.user_id),
            "Managers can only remove their own employees",
        )?;
    }
    let result = employees::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(HrError::not_found("Employee not found"));
    }
    info!("employee deleted");
    Ok(())
}

pub(crate) async fn owning_department(
    db: &DatabaseConnection,
    employee: &employees::Model,
) -> HrResult<departments::Model> {
    department_ops::get(db, employee.department_id).await
}

/// One department per user, checked before write. A concurrent writer can
/// still race past this; the unique key on `employees.user_id` rejects it.
async fn ensure_unassigned(
    db: &DatabaseConnection,
    user_id: Uuid,
    except: Option<Uuid>,
) -> HrResult<()> {
    let mut query = employees::Entity::find().filter(employees::Column::UserId.eq(user_id));
    if let Some(id) = except {
        query = query.filter(employees::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(HrError::conflict(ALREADY_ASSIGNED));
    }
    Ok(())
}

fn clean_phone(value: Option<String>) -> HrResult<Option<String>> {
    let Some(phone) = value else {
        return Ok(None);
    };
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    check_length("phone", trimmed, PHONE_MAX)?;
    Ok(Some(trimmed.to_string()))
}
