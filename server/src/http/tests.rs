use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use entity::users::{self, Role as UserRole};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use platform_authn::{AuthConfig, hash_password, issue_token};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use super::{AppState, build_router};
use crate::config::AppConfig;

struct TestApp {
    router: Router,
    auth: AuthConfig,
    admin: Uuid,
    m1: Uuid,
    m2: Uuid,
    u1: Uuid,
}

impl TestApp {
    async fn new() -> Self {
        let pool = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&pool, None).await.unwrap();
        let mut ids = Vec::new();
        for (email, role) in [
            ("admin@hr.test", UserRole::Admin),
            ("m1@hr.test", UserRole::Manager),
            ("m2@hr.test", UserRole::Manager),
            ("u1@hr.test", UserRole::Employee),
        ] {
            let user = users::ActiveModel {
                id: Set(Uuid::new_v4()),
                email: Set(email.into()),
                full_name: Set(None),
                role: Set(role),
                is_active: Set(true),
                hashed_password: Set(hash_password("changethis").unwrap()),
                created_at: Set(Utc::now().fixed_offset()),
            }
            .insert(&pool)
            .await
            .unwrap();
            ids.push(user.id);
        }
        let auth = AuthConfig::new(vec![42u8; 32], 30).unwrap();
        let config = Arc::new(AppConfig {
            auth: auth.clone(),
            cors_allowed_origins: vec!["http://localhost:5173".into()],
        });
        Self {
            router: build_router(AppState::new(pool, config)),
            auth,
            admin: ids[0],
            m1: ids[1],
            m2: ids[2],
            u1: ids[3],
        }
    }

    fn token(&self, user_id: Uuid) -> String {
        issue_token(user_id, "ignored", &self.auth).unwrap()
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        as_user: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = as_user {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token(user_id)),
            );
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn health_reports_database() {
    let app = TestApp::new().await;
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["db_ok"], true);
}

#[tokio::test]
async fn missing_or_bad_tokens_are_unauthorized() {
    let app = TestApp::new().await;
    let (status, body) = app.call("GET", "/api/v1/departments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Could not validate credentials");

    let request = Request::builder()
        .uri("/api/v1/departments")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call("GET", "/api/v1/departments", Some(Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_issues_bearer_tokens() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/login/access-token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=m1%40hr.test&password=changethis"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri("/api/v1/users/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/login/access-token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=m1%40hr.test&password=wrong-password"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn approval_scenario_over_http() {
    let app = TestApp::new().await;
    let (status, dept) = app
        .call(
            "POST",
            "/api/v1/departments",
            Some(app.admin),
            Some(json!({"name": "Engineering", "manager_id": app.m1})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dept["manager_id"], json!(app.m1));

    let (status, employee) = app
        .call(
            "POST",
            "/api/v1/employees",
            Some(app.m1),
            Some(json!({
                "user_id": app.u1,
                "department_id": dept["id"],
                "position": "Engineer",
                "hire_date": "2024-03-01"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let employee_uri = format!("/api/v1/employees/{}", employee["id"].as_str().unwrap());

    let (status, body) = app
        .call(
            "PATCH",
            &employee_uri,
            Some(app.m2),
            Some(json!({"position": "Intern"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["detail"].is_string());

    let (status, request) = app
        .call(
            "POST",
            "/api/v1/leaverequests",
            Some(app.u1),
            Some(json!({
                "leave_type": "vacation",
                "start_date": "2025-06-01",
                "end_date": "2025-06-05"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(request["status"], "pending");
    let request_uri = format!("/api/v1/leaverequests/{}", request["id"].as_str().unwrap());

    let (status, _) = app
        .call(
            "PATCH",
            &format!("{request_uri}?status=approved"),
            Some(app.admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, approved) = app
        .call(
            "PATCH",
            &format!("{request_uri}?status=approved"),
            Some(app.m1),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["approved_by_manager_id"], json!(app.m1));

    let (status, body) = app.call("DELETE", &request_uri, Some(app.m1), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn populated_department_delete_is_bad_request() {
    let app = TestApp::new().await;
    let (_, dept) = app
        .call(
            "POST",
            "/api/v1/departments",
            Some(app.m1),
            Some(json!({"name": "Engineering"})),
        )
        .await;
    let dept_uri = format!("/api/v1/departments/{}", dept["id"].as_str().unwrap());
    let (status, employee) = app
        .call(
            "POST",
            "/api/v1/employees",
            Some(app.m1),
            Some(json!({
                "user_id": app.u1,
                "department_id": dept["id"],
                "position": "Engineer",
                "hire_date": "2024-03-01"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call("DELETE", &dept_uri, Some(app.m1), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let employee_uri = format!("/api/v1/employees/{}", employee["id"].as_str().unwrap());
    let (status, body) = app.call("DELETE", &employee_uri, Some(app.m1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (status, body) = app.call("DELETE", &dept_uri, Some(app.m1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
    let (status, _) = app.call("GET", &dept_uri, Some(app.m1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn timesheet_check_and_range() {
    let app = TestApp::new().await;
    let (_, dept) = app
        .call(
            "POST",
            "/api/v1/departments",
            Some(app.m1),
            Some(json!({"name": "Engineering"})),
        )
        .await;
    let (_, employee) = app
        .call(
            "POST",
            "/api/v1/employees",
            Some(app.admin),
            Some(json!({
                "user_id": app.u1,
                "department_id": dept["id"],
                "position": "Engineer",
                "hire_date": "2024-03-01"
            })),
        )
        .await;

    let (status, row) = app
        .call("POST", "/api/v1/timesheets/check?check_in=true", Some(app.u1), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(row["check_in"].is_string());
    assert!(row["check_out"].is_null());

    let (status, _) = app
        .call("POST", "/api/v1/timesheets/check?check_in=true", Some(app.m1), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let today = Utc::now().date_naive();
    let uri = format!(
        "/api/v1/timesheets/{}?start_date={today}&end_date={today}",
        employee["id"].as_str().unwrap()
    );
    let (status, rows) = app.call("GET", &uri, Some(app.m2), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    let (status, _) = app.call("GET", &uri, Some(app.u1), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn user_directory_routes() {
    let app = TestApp::new().await;
    let (status, page) = app.call("GET", "/api/v1/users", Some(app.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 4);

    let (status, _) = app.call("GET", "/api/v1/users", Some(app.m1), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, managers) = app
        .call("GET", "/api/v1/users/managers", Some(app.u1), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(managers["count"], 2);

    let (status, body) = app
        .call(
            "PATCH",
            "/api/v1/users/me",
            Some(app.u1),
            Some(json!({"email": "m2@hr.test"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "A user with this email already exists");

    let (status, _) = app
        .call("DELETE", &format!("/api/v1/users/{}", app.admin), Some(app.admin), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app
        .call("DELETE", &format!("/api/v1/users/{}", app.m2), Some(app.admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, body) = app
        .call("DELETE", "/api/v1/users/me", Some(app.admin), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Admins cannot delete their own account");
    let (status, body) = app
        .call("DELETE", "/api/v1/users/me", Some(app.u1), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");
    let (status, _) = app
        .call("GET", "/api/v1/users/me", Some(app.u1), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn graphql_requires_bearer() {
    let app = TestApp::new().await;
    let query = json!({"query": "{ me { email role } }"});
    let (status, _) = app.call("POST", "/graphql", None, Some(query.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.call("POST", "/graphql", Some(app.m1), Some(query)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["me"], json!({"email": "m1@hr.test", "role": "manager"}));
}
