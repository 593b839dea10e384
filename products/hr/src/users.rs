//! User directory: accounts, credentials and roles.

use chrono::Utc;
use entity::users::{self, Role as UserRole};
use platform_authn::{hash_password, verify_password};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, prelude::DateTimeWithTimeZone,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{check_length, reference_violation, unique_violation};
use crate::{Caller, FORBIDDEN, HrError, HrResult, caller_from_user, departments, nullable};

const EMAIL_MAX: usize = 255;
const FULL_NAME_MAX: usize = 255;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 40;
pub const DEFAULT_PAGE_LIMIT: u64 = 100;
const MANAGES_DEPARTMENT: &str = "User still manages a department";

/// Account fields safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

impl From<users::Model> for UserPublic {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsersPage {
    pub data: Vec<UserPublic>,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    /// Required when a manager creates the account; must be one of their
    /// departments.
    #[serde(default)]
    pub department_id: Option<Uuid>,
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileChanges {
    #[serde(default, deserialize_with = "nullable")]
    pub full_name: Option<Option<String>>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChanges {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub full_name: Option<Option<String>>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Checks credentials for the login flow. Unknown email and wrong password
/// share one message.
#[instrument(name = "hr.users.authenticate", skip_all)]
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> HrResult<users::Model> {
    let email = email.trim().to_lowercase();
    let user = find_by_email(db, &email).await?;
    let Some(user) = user.filter(|u| verify_password(password, &u.hashed_password)) else {
        warn!("login rejected");
        return Err(HrError::validation("Incorrect email or password"));
    };
    if !user.is_active {
        return Err(inactive());
    }
    Ok(user)
}

/// Loads the account behind a token subject. `None` when it no longer
/// exists.
pub async fn resolve_caller(db: &DatabaseConnection, user_id: Uuid) -> HrResult<Option<Caller>> {
    let Some(user) = users::Entity::find_by_id(user_id).one(db).await? else {
        return Ok(None);
    };
    if !user.is_active {
        return Err(inactive());
    }
    Ok(Some(caller_from_user(&user)))
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> HrResult<Option<users::Model>> {
    Ok(users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await?)
}

pub async fn list(db: &DatabaseConnection, caller: &Caller, page: Page) -> HrResult<UsersPage> {
    if !caller.is_admin() {
        return Err(HrError::forbidden(FORBIDDEN));
    }
    let count = users::Entity::find().count(db).await?;
    let data = users::Entity::find()
        .order_by_asc(users::Column::CreatedAt)
        .offset(page.skip)
        .limit(page.limit)
        .all(db)
        .await?;
    Ok(UsersPage {
        data: data.into_iter().map(UserPublic::from).collect(),
        count,
    })
}

pub async fn list_managers(db: &DatabaseConnection, page: Page) -> HrResult<UsersPage> {
    let managers = || users::Entity::find().filter(users::Column::Role.eq(UserRole::Manager));
    let count = managers().count(db).await?;
    let data = managers()
        .order_by_asc(users::Column::Email)
        .offset(page.skip)
        .limit(page.limit)
        .all(db)
        .await?;
    Ok(UsersPage {
        data: data.into_iter().map(UserPublic::from).collect(),
        count,
    })
}

#[instrument(name = "hr.users.create", skip_all, fields(caller = %caller.user_id))]
pub async fn create(db: &DatabaseConnection, caller: &Caller, input: NewUser) -> HrResult<UserPublic> {
    let email = normalize_email(&input.email)?;
    if find_by_email(db, &email).await?.is_some() {
        return Err(email_taken_on_create());
    }
    if caller.is_manager() {
        if input.role != UserRole::Employee {
            return Err(HrError::forbidden("Managers can only create employee accounts"));
        }
        let department_id = input.department_id.ok_or_else(|| {
            HrError::validation("department_id is required when a manager creates a user")
        })?;
        let owns = match departments::get(db, department_id).await {
            Ok(department) => department.is_managed_by(caller.user_id),
            Err(HrError::NotFound(_)) => false,
            Err(err) => return Err(err),
        };
        if !owns {
            return Err(HrError::forbidden(
                "Managers can only create users for their own departments",
            ));
        }
    } else if !caller.is_admin() {
        return Err(HrError::forbidden(FORBIDDEN));
    }

    let model = insert_user(
        db,
        email,
        clean_full_name(input.full_name)?,
        input.role,
        input.is_active,
        &input.password,
    )
    .await
    .map_err(|err| match err {
        HrError::Db(db_err) => unique_violation(db_err, email_taken_on_create),
        other => other,
    })?;
    info!(user_id = %model.id, role = ?model.role, "user created");
    Ok(model.into())
}

pub async fn me(db: &DatabaseConnection, caller: &Caller) -> HrResult<UserPublic> {
    load(db, caller.user_id).await.map(UserPublic::from)
}

/// Any account for admins; otherwise only the caller's own.
pub async fn get(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> HrResult<UserPublic> {
    if id != caller.user_id && !caller.is_admin() {
        return Err(HrError::forbidden(FORBIDDEN));
    }
    load(db, id).await.map(UserPublic::from)
}

#[instrument(name = "hr.users.update_me", skip_all, fields(caller = %caller.user_id))]
pub async fn update_me(
    db: &DatabaseConnection,
    caller: &Caller,
    changes: ProfileChanges,
) -> HrResult<UserPublic> {
    let user = load(db, caller.user_id).await?;
    let mut active: users::ActiveModel = user.into();
    if let Some(email) = changes.email {
        let email = claim_email(db, &email, caller.user_id).await?;
        active.email = Set(email);
    }
    if let Some(full_name) = changes.full_name {
        active.full_name = Set(clean_full_name(full_name)?);
    }
    save(db, caller.user_id, active).await
}

#[instrument(name = "hr.users.change_password", skip_all, fields(caller = %caller.user_id))]
pub async fn change_password(
    db: &DatabaseConnection,
    caller: &Caller,
    change: PasswordChange,
) -> HrResult<()> {
    let user = load(db, caller.user_id).await?;
    if !verify_password(&change.current_password, &user.hashed_password) {
        return Err(HrError::validation("Incorrect password"));
    }
    if change.current_password == change.new_password {
        return Err(HrError::validation(
            "New password cannot be the same as the current one",
        ));
    }
    check_password(&change.new_password)?;
    let mut active: users::ActiveModel = user.into();
    active.hashed_password = Set(hash_password(&change.new_password)?);
    active.update(db).await?;
    info!("password changed");
    Ok(())
}

#[instrument(name = "hr.users.update", skip_all, fields(caller = %caller.user_id, %id))]
pub async fn update(
    db: &DatabaseConnection,
    caller: &Caller,
    id: Uuid,
    changes: UserChanges,
) -> HrResult<UserPublic> {
    if !caller.is_admin() {
        return Err(HrError::forbidden(FORBIDDEN));
    }
    let user = load(db, id).await?;
    let mut active: users::ActiveModel = user.into();
    if let Some(email) = changes.email {
        active.email = Set(claim_email(db, &email, id).await?);
    }
    if let Some(full_name) = changes.full_name {
        active.full_name = Set(clean_full_name(full_name)?);
    }
    if let Some(role) = changes.role {
        active.role = Set(role);
    }
    if let Some(is_active) = changes.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(password) = changes.password {
        check_password(&password)?;
        active.hashed_password = Set(hash_password(&password)?);
    }
    save(db, id, active).await
}

#[instrument(name = "hr.users.delete", skip_all, fields(caller = %caller.user_id, %id))]
pub async fn delete(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> HrResult<()> {
    if !caller.is_admin() {
        return Err(HrError::forbidden(FORBIDDEN));
    }
    if id == caller.user_id {
        return Err(HrError::forbidden("Admins cannot delete their own account"));
    }
    load(db, id).await?;
    remove(db, id).await?;
    info!("user deleted");
    Ok(())
}

/// Deletes the caller's own account. Admins must be removed by another admin.
#[instrument(name = "hr.users.delete_me", skip_all, fields(caller = %caller.user_id))]
pub async fn delete_me(db: &DatabaseConnection, caller: &Caller) -> HrResult<()> {
    if caller.is_admin() {
        return Err(HrError::forbidden("Admins cannot delete their own account"));
    }
    remove(db, caller.user_id).await?;
    info!("account closed by owner");
    Ok(())
}

async fn remove(db: &DatabaseConnection, id: Uuid) -> HrResult<()> {
    let managed = entity::departments::Entity::find()
        .filter(entity::departments::Column::ManagerId.eq(id))
        .count(db)
        .await?;
    if managed > 0 {
        return Err(HrError::conflict(MANAGES_DEPARTMENT));
    }
    let result = users::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|err| reference_violation(err, MANAGES_DEPARTMENT))?;
    if result.rows_affected == 0 {
        return Err(HrError::not_found("User not found"));
    }
    Ok(())
}

/// Creates the bootstrap admin unless an account with `email` exists.
/// Returns whether a row was inserted.
pub async fn ensure_superuser(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> HrResult<bool> {
    let email = normalize_email(email)?;
    if find_by_email(db, &email).await?.is_some() {
        return Ok(false);
    }
    let model = insert_user(db, email, None, UserRole::Admin, true, password).await?;
    info!(user_id = %model.id, "superuser created");
    Ok(true)
}

async fn insert_user(
    db: &DatabaseConnection,
    email: String,
    full_name: Option<String>,
    role: UserRole,
    is_active: bool,
    password: &str,
) -> HrResult<users::Model> {
    check_password(password)?;
    Ok(users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        full_name: Set(full_name),
        role: Set(role),
        is_active: Set(is_active),
        hashed_password: Set(hash_password(password)?),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await?)
}

async fn load(db: &DatabaseConnection, id: Uuid) -> HrResult<users::Model> {
    users::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| HrError::not_found("User not found"))
}

async fn save(
    db: &DatabaseConnection,
    id: Uuid,
    active: users::ActiveModel,
) -> HrResult<UserPublic> {
    if !active.is_changed() {
        return load(db, id).await.map(UserPublic::from);
    }
    active
        .update(db)
        .await
        .map(UserPublic::from)
        .map_err(|err| unique_violation(err, email_taken))
}

/// Normalizes `email` and fails with 409 when another account owns it.
async fn claim_email(db: &DatabaseConnection, email: &str, owner: Uuid) -> HrResult<String> {
    let email = normalize_email(email)?;
    match find_by_email(db, &email).await? {
        Some(existing) if existing.id != owner => Err(email_taken()),
        _ => Ok(email),
    }
}

fn normalize_email(value: &str) -> HrResult<String> {
    let email = value.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(HrError::validation("Invalid email address"));
    }
    check_length("email", &email, EMAIL_MAX)?;
    Ok(email)
}

fn clean_full_name(value: Option<String>) -> HrResult<Option<String>> {
    let Some(name) = value else {
        return Ok(None);
    };
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    check_length("full_name", trimmed, FULL_NAME_MAX)?;
    Ok(Some(trimmed.to_string()))
}

fn check_password(password: &str) -> HrResult<()> {
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(HrError::validation(format!(
            "password must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"
        )));
    }
    Ok(())
}

fn inactive() -> HrError {
    HrError::validation("Inactive user")
}

fn email_taken_on_create() -> HrError {
    HrError::conflict("The user with this email already exists in the system")
}

fn email_taken() -> HrError {
    HrError::Duplicate("A user with this email already exists".into())
}
