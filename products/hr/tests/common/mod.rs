#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use entity::users::{self, Role as UserRole};
use migration::{Migrator, MigratorTrait};
use products_hr::departments::{self, NewDepartment};
use products_hr::employees::{self, NewEmployee};
use products_hr::{Caller, caller_from_user};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database, DatabaseConnection};
use uuid::Uuid;

/// Placeholder hash for fixture accounts that never log in.
pub const NO_LOGIN: &str = "!";

/// One admin, two managers and two employee accounts on a migrated
/// in-memory database. No departments or employee records yet.
pub struct HrFixture {
    pub db: DatabaseConnection,
    pub admin: Caller,
    pub m1: Caller,
    pub m2: Caller,
    pub u1: Caller,
    pub u2: Caller,
}

impl HrFixture {
    pub async fn new() -> Self {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("sqlite connection");
        Migrator::up(&db, None).await.expect("migrations");
        let admin = insert_user(&db, "admin@hr.test", "Ada Admin", UserRole::Admin).await;
        let m1 = insert_user(&db, "m1@hr.test", "Mia Manager", UserRole::Manager).await;
        let m2 = insert_user(&db, "m2@hr.test", "Max Manager", UserRole::Manager).await;
        let u1 = insert_user(&db, "u1@hr.test", "Uma Employee", UserRole::Employee).await;
        let u2 = insert_user(&db, "u2@hr.test", "", UserRole::Employee).await;
        Self {
            db,
            admin,
            m1,
            m2,
            u1,
            u2,
        }
    }

    /// A department owned by `manager`, created by the admin.
    pub async fn department(&self, name: &str, manager: &Caller) -> entity::departments::Model {
        departments::create(
            &self.db,
            &self.admin,
            NewDepartment {
                name: name.into(),
                description: None,
                manager_id: Some(manager.user_id),
            },
        )
        .await
        .expect("department")
    }

    /// Employs `user` in `department_id`, created by the admin.
    pub async fn employ(&self, user: &Caller, department_id: Uuid) -> entity::employees::Model {
        employees::create(&self.db, &self.admin, new_employee(user.user_id, department_id))
            .await
            .expect("employee")
    }
}

pub fn new_employee(user_id: Uuid, department_id: Uuid) -> NewEmployee {
    NewEmployee {
        user_id,
        department_id,
        position: "Engineer".into(),
        hire_date: date(2024, 3, 1),
        phone: None,
        salary: Some(5200.0),
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub async fn insert_user(
    db: &DatabaseConnection,
    email: &str,
    full_name: &str,
    role: UserRole,
) -> Caller {
    let model = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        full_name: Set((!full_name.is_empty()).then(|| full_name.to_string())),
        role: Set(role),
        is_active: Set(true),
        hashed_password: Set(NO_LOGIN.to_string()),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await
    .expect("seed user");
    caller_from_user(&model)
}
