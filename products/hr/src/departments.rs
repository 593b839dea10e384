use entity::{departments, employees, users};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{check_length, reference_violation, required_text, unique_violation};
use crate::{Caller, FORBIDDEN, HrError, HrResult, Role, nullable};

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 255;

#[derive(Debug, Clone, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to the caller.
    #[serde(default)]
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub manager_id: Option<Uuid>,
}

pub async fn list(db: &DatabaseConnection) -> HrResult<Vec<departments::Model>> {
    Ok(departments::Entity::find()
        .order_by_asc(departments::Column::Name)
        .all(db)
        .await?)
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> HrResult<departments::Model> {
    departments::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| HrError::not_found("Department not found"))
}

#[instrument(name = "hr.departments.create", skip_all, fields(caller = %caller.user_id))]
pub async fn create(
    db: &DatabaseConnection,
    caller: &Caller,
    input: NewDepartment,
) -> HrResult<departments::Model> {
    caller.require_any(&[Role::Admin, Role::Manager], FORBIDDEN)?;
    let manager_id = input.manager_id.unwrap_or(caller.user_id);
    if caller.is_manager() && manager_id != caller.user_id {
        return Err(HrError::forbidden(
            "Managers can only create departments they manage",
        ));
    }
    let name = required_text("name", &input.name, NAME_MAX)?;
    let description = clean_description(input.description)?;
    ensure_user_exists(db, manager_id).await?;

    let model = departments::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(description),
        manager_id: Set(manager_id),
    }
    .insert(db)
    .await
    .map_err(|err| unique_violation(err, duplicate_name))?;
    info!(department_id = %model.id, manager_id = %model.manager_id, "department created");
    Ok(model)
}

#[instrument(name = "hr.departments.update", skip_all, fields(caller = %caller.user_id, %id))]
pub async fn update(
    db: &DatabaseConnection,
    caller: &Caller,
    id: Uuid,
    changes: DepartmentChanges,
) -> HrResult<departments::Model> {
    let department = get(db, id).await?;
    caller.require_admin_or_owner(
        department.is_managed_by(caller.user_id),
        "Managers can only edit their own departments",
    )?;

    let mut active: departments::ActiveModel = department.into();
    if let Some(name) = changes.name {
        active.name = Set(required_text("name", &name, NAME_MAX)?);
    }
    if let Some(description) = changes.description {
        active.description = Set(clean_description(description)?);
    }
    if let Some(manager_id) = changes.manager_id {
        ensure_user_exists(db, manager_id).await?;
        active.manager_id = Set(manager_id);
    }
    if !active.is_changed() {
        return get(db, id).await;
    }
    active
        .update(db)
        .await
        .map_err(|err| unique_violation(err, duplicate_name))
}

#[instrument(name = "hr.departments.delete", skip_all, fields(caller = %caller.user_id, %id))]
pub async fn delete(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> HrResult<()> {
    let department = get(db, id).await?;
    caller.require_admin_or_owner(
        department.is_managed_by(caller.user_id),
        "Managers can only delete their own departments",
    )?;
    let headcount = employees::Entity::find()
        .filter(employees::Column::DepartmentId.eq(id))
        .count(db)
        .await?;
    if headcount > 0 {
        return Err(HrError::conflict(
            "Cannot delete a department with employees; remove or transfer them first",
        ));
    }
    let result = departments::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|err| reference_violation(err, "Department still has employees"))?;
    if result.rows_affected == 0 {
        return Err(HrError::not_found("Department not found"));
    }
    info!("department deleted");
    Ok(())
}

async fn ensure_user_exists(db: &DatabaseConnection, user_id: Uuid) -> HrResult<()> {
    users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| HrError::not_found("Manager not found"))
}

fn clean_description(value: Option<String>) -> HrResult<Option<String>> {
    let Some(text) = value else {
        return Ok(None);
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    check_length("description", trimmed, DESCRIPTION_MAX)?;
    Ok(Some(trimmed.to_string()))
}

fn duplicate_name() -> HrError {
    HrError::conflict("A department with this name already exists")
}
