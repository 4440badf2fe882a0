mod common;

use business_portal::models::{Invoice, Project, Role, TeamMember};
use common::{InMemoryRepository, PASSWORD, test_router};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

async fn spawn_app() -> TestApp {
    let repo = InMemoryRepository::new();
    repo.seed_user("admin@example.com", Role::Admin, true);
    let router = test_router(repo);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

/// A client that keeps its own session cookie, logged in as `email`.
async fn logged_in(app: &TestApp, email: &str, password: &str) -> reqwest::Client {
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap();

    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);

    client
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;

    let doc: Value = reqwest::get(format!("{}/api-docs/openapi.json", app.address))
        .await
        .expect("req fail")
        .json()
        .await
        .unwrap();

    assert!(doc["paths"].get("/api/auth/login").is_some());
    assert!(doc["paths"].get("/api/invoices/{id}").is_some());
}

#[tokio::test]
async fn test_portal_flow_across_roles() {
    let app = spawn_app().await;
    let admin = logged_in(&app, "admin@example.com", PASSWORD).await;

    // Admin onboards a client and a team member.
    let response = admin
        .post(format!("{}/api/clients", app.address))
        .json(&json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "password": "client-pass",
            "companyName": "Analytical Engines"
        }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::CREATED);
    let client_record: Value = response.json().await.unwrap();
    let client_id = client_record["id"].as_str().unwrap().to_string();

    let response = admin
        .post(format!("{}/api/team", app.address))
        .json(&json!({
            "firstName": "Grace",
            "lastName": "Hopper",
            "email": "grace@example.com",
            "password": "team-pass",
            "position": "Engineer",
            "department": "Delivery",
            "salary": 5200
        }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::CREATED);
    let member: TeamMember = response.json().await.unwrap();

    // A project for the client, staffed with the team member.
    let response = admin
        .post(format!("{}/api/projects", app.address))
        .json(&json!({
            "name": "Difference Engine",
            "clientId": client_id,
            "status": "active",
            "startDate": "2024-01-10",
            "budget": "25000.00"
        }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::CREATED);
    let project: Project = response.json().await.unwrap();

    let response = admin
        .post(format!("{}/api/projects/{}/assignments", app.address, project.id))
        .json(&json!({ "teamMemberId": member.id, "role": "lead" }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = admin
        .post(format!("{}/api/invoices", app.address))
        .json(&json!({
            "number": "INV-2024-001",
            "clientId": client_id,
            "projectId": project.id,
            "amount": 1200.5,
            "status": "sent",
            "issueDate": "2024-02-01",
            "dueDate": "2024-03-01"
        }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::CREATED);
    let invoice: Invoice = response.json().await.unwrap();

    // The client sees its invoice and open balance.
    let client = logged_in(&app, "ada@example.com", "client-pass").await;
    let invoices: Vec<Invoice> = client
        .get(format!("{}/api/invoices", app.address))
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .unwrap();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].id, invoice.id);

    let stats: Value = client
        .get(format!("{}/api/stats/client/{}", app.address, client_id))
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .unwrap();
    assert_eq!(stats["pendingInvoices"], 1);
    assert_eq!(stats["nextDue"], "2024-03-01");

    // The team member moves the project forward.
    let team = logged_in(&app, "grace@example.com", "team-pass").await;
    let response = team
        .put(format!("{}/api/projects/{}", app.address, project.id))
        .json(&json!({ "progress": 60 }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Project = response.json().await.unwrap();
    assert_eq!(updated.progress, 60);

    let response = team
        .get(format!("{}/api/invoices", app.address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Clients are never deleted while invoices reference them.
    let response = admin
        .delete(format!("{}/api/clients/{}", app.address, client_id))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = admin
        .delete(format!("{}/api/invoices/{}", app.address, invoice.id))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invoice deleted successfully");
}

#[tokio::test]
async fn test_logout_clears_cookie_session() {
    let app = spawn_app().await;
    let admin = logged_in(&app, "admin@example.com", PASSWORD).await;

    let response = admin
        .get(format!("{}/api/admin/stats", app.address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);

    let response = admin
        .post(format!("{}/api/auth/logout", app.address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);

    let response = admin
        .get(format!("{}/api/admin/stats", app.address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
