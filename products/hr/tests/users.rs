mod common;

use common::HrFixture;
use entity::users::Role as UserRole;
use products_hr::{HrError, employees};
use products_hr::users::{self, NewUser, Page, PasswordChange, ProfileChanges, UserChanges};

fn new_user(email: &str, role: UserRole) -> NewUser {
    NewUser {
        email: email.into(),
        password: "correct-horse".into(),
        full_name: Some("New Hire".into()),
        role,
        is_active: true,
        department_id: None,
    }
}

#[tokio::test]
async fn admin_creates_and_user_logs_in() {
    let fx = HrFixture::new().await;
    let created = users::create(&fx.db, &fx.admin, new_user(" Hire@HR.test ", UserRole::Manager))
        .await
        .unwrap();
    assert_eq!(created.email, "hire@hr.test");
    assert_eq!(created.role, UserRole::Manager);

    let user = users::authenticate(&fx.db, "HIRE@hr.test", "correct-horse")
        .await
        .unwrap();
    assert_eq!(user.id, created.id);
    let err = users::authenticate(&fx.db, "hire@hr.test", "wrong-horse")
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Validation(_)));

    let err = users::create(&fx.db, &fx.admin, new_user("hire@hr.test", UserRole::Employee))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Conflict(_)));
}

#[tokio::test]
async fn managers_create_employees_for_own_departments_only() {
    let fx = HrFixture::new().await;
    let eng = fx.department("Engineering", &fx.m1).await;
    let ops = fx.department("Operations", &fx.m2).await;

    let err = users::create(&fx.db, &fx.m1, new_user("a@hr.test", UserRole::Manager))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)));

    let err = users::create(&fx.db, &fx.m1, new_user("a@hr.test", UserRole::Employee))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Validation(_)));

    let mut foreign = new_user("a@hr.test", UserRole::Employee);
    foreign.department_id = Some(ops.id);
    let err = users::create(&fx.db, &fx.m1, foreign).await.unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)));

    let mut own = new_user("a@hr.test", UserRole::Employee);
    own.department_id = Some(eng.id);
    let created = users::create(&fx.db, &fx.m1, own).await.unwrap();
    assert_eq!(created.role, UserRole::Employee);

    let err = users::create(&fx.db, &fx.u1, new_user("b@hr.test", UserRole::Employee))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)));
}

#[tokio::test]
async fn short_passwords_are_rejected() {
    let fx = HrFixture::new().await;
    let mut weak = new_user("weak@hr.test", UserRole::Employee);
    weak.password = "short".into();
    let err = users::create(&fx.db, &fx.admin, weak).await.unwrap_err();
    assert!(matches!(err, HrError::Validation(_)));
}

#[tokio::test]
async fn inactive_accounts_cannot_act() {
    let fx = HrFixture::new().await;
    users::update(
        &fx.db,
        &fx.admin,
        fx.u1.user_id,
        UserChanges {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let err = users::resolve_caller(&fx.db, fx.u1.user_id).await.unwrap_err();
    assert_eq!(err.to_string(), "Inactive user");
    assert!(
        users::resolve_caller(&fx.db, uuid::Uuid::new_v4())
            .await
            .unwrap()
            .is_none()
    );
    let caller = users::resolve_caller(&fx.db, fx.m1.user_id).await.unwrap();
    assert_eq!(caller, Some(fx.m1.clone()));
}

#[tokio::test]
async fn listing_is_admin_only_and_counts() {
    let fx = HrFixture::new().await;
    let page = users::list(&fx.db, &fx.admin, Page::default()).await.unwrap();
    assert_eq!(page.count, 5);
    assert_eq!(page.data.len(), 5);

    let trimmed = users::list(&fx.db, &fx.admin, Page { skip: 1, limit: 2 })
        .await
        .unwrap();
    assert_eq!(trimmed.count, 5);
    assert_eq!(trimmed.data.len(), 2);

    let err = users::list(&fx.db, &fx.m1, Page::default()).await.unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)));

    let managers = users::list_managers(&fx.db, Page::default()).await.unwrap();
    assert_eq!(managers.count, 2);
    assert!(managers.data.iter().all(|u| u.role == UserRole::Manager));
}

#[tokio::test]
async fn users_read_themselves_admins_read_anyone() {
    let fx = HrFixture::new().await;
    let me = users::get(&fx.db, &fx.u1, fx.u1.user_id).await.unwrap();
    assert_eq!(me.email, "u1@hr.test");
    let err = users::get(&fx.db, &fx.u1, fx.m1.user_id).await.unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)));
    let other = users::get(&fx.db, &fx.admin, fx.m1.user_id).await.unwrap();
    assert_eq!(other.role, UserRole::Manager);
}

#[tokio::test]
async fn profile_email_conflicts_are_duplicates() {
    let fx = HrFixture::new().await;
    let err = users::update_me(
        &fx.db,
        &fx.u1,
        ProfileChanges {
            email: Some("m1@hr.test".into()),
            full_name: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HrError::Duplicate(_)));

    let updated = users::update_me(
        &fx.db,
        &fx.u1,
        ProfileChanges {
            email: Some("u1@hr.test".into()),
            full_name: Some(Some("Uma Renamed".into())),
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.full_name.as_deref(), Some("Uma Renamed"));

    let err = users::update(
        &fx.db,
        &fx.admin,
        fx.u1.user_id,
        UserChanges {
            email: Some("m2@hr.test".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HrError::Duplicate(_)));
}

#[tokio::test]
async fn password_change_checks_current_and_new() {
    let fx = HrFixture::new().await;
    let created = users::create(&fx.db, &fx.admin, new_user("pw@hr.test", UserRole::Employee))
        .await
        .unwrap();
    let caller = users::resolve_caller(&fx.db, created.id)
        .await
        .unwrap()
        .unwrap();
    let change = |current: &str, new: &str| PasswordChange {
        current_password: current.into(),
        new_password: new.into(),
    };

    let err = users::change_password(&fx.db, &caller, change("nope-nope", "battery-staple"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Incorrect password");
    let err = users::change_password(&fx.db, &caller, change("correct-horse", "correct-horse"))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Validation(_)));

    users::change_password(&fx.db, &caller, change("correct-horse", "battery-staple"))
        .await
        .unwrap();
    users::authenticate(&fx.db, "pw@hr.test", "battery-staple")
        .await
        .unwrap();
}

#[tokio::test]
async fn admin_deletes_others_but_not_self() {
    let fx = HrFixture::new().await;
    let err = users::delete(&fx.db, &fx.admin, fx.admin.user_id).await.unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)));
    let err = users::delete(&fx.db, &fx.m1, fx.u1.user_id).await.unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)));

    users::delete(&fx.db, &fx.admin, fx.u2.user_id).await.unwrap();
    let err = users::get(&fx.db, &fx.admin, fx.u2.user_id).await.unwrap_err();
    assert!(matches!(err, HrError::NotFound(_)));

    fx.department("Engineering", &fx.m1).await;
    let err = users::delete(&fx.db, &fx.admin, fx.m1.user_id).await.unwrap_err();
    assert!(matches!(err, HrError::Conflict(ref msg) if msg == "User still manages a department"));
    assert!(users::get(&fx.db, &fx.admin, fx.m1.user_id).await.is_ok());
}

#[tokio::test]
async fn users_close_their_own_accounts_except_admins() {
    let fx = HrFixture::new().await;
    let err = users::delete_me(&fx.db, &fx.admin).await.unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)));

    let dept = fx.department("Engineering", &fx.m1).await;
    fx.employ(&fx.u1, dept.id).await;
    let err = users::delete_me(&fx.db, &fx.m1).await.unwrap_err();
    assert!(matches!(err, HrError::Conflict(_)));

    users::delete_me(&fx.db, &fx.u1).await.unwrap();
    assert!(users::resolve_caller(&fx.db, fx.u1.user_id).await.unwrap().is_none());
    let err = employees::me(&fx.db, &fx.u1).await.unwrap_err();
    assert!(matches!(err, HrError::NotFound(_)));
}

#[tokio::test]
async fn superuser_seeding_is_idempotent() {
    let fx = HrFixture::new().await;
    assert!(users::ensure_superuser(&fx.db, "root@hr.test", "changethis").await.unwrap());
    assert!(!users::ensure_superuser(&fx.db, "ROOT@hr.test", "changethis").await.unwrap());
    let root = users::authenticate(&fx.db, "root@hr.test", "changethis")
        .await
        .unwrap();
    assert_eq!(root.role, UserRole::Admin);
}

#[test]
fn new_user_role_defaults_to_employee() {
    let input: NewUser = serde_json::from_value(serde_json::json!({
        "email": "plain@hr.test",
        "password": "correct-horse"
    }))
    .unwrap();
    assert_eq!(input.role, UserRole::Employee);
    assert!(input.is_active);
    assert_eq!(UserRole::default(), UserRole::Employee);
}
