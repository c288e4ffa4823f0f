// tests/api.rs
//
// Testes "caixa-preta": sobem o router completo sobre o store em memória
// (modo demonstração) e falam só HTTP.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use backoffice::{
    app_router,
    config::{AppConfig, AppState, DEMO_PASSWORD},
    db::{memory::DemoSeed, InMemoryStore},
    models::{auth::User, rbac::RoleTemplate},
    services::password::PasswordHasher,
};

const SUPER_ADMIN: RoleTemplate = RoleTemplate::SuperAdmin;
const ADMIN: RoleTemplate = RoleTemplate::Admin;
const MANAGER: RoleTemplate = RoleTemplate::Manager;
const CASHIER: RoleTemplate = RoleTemplate::Cashier;

// Índices em `DemoSeed::locations`
const CENTRO: usize = 0;
const QUIOSQUE: usize = 1;
const DEPOSITO: usize = 2;

fn test_config() -> AppConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("JWT_SECRET", "segredo-de-teste"),
        ("BCRYPT_ROUNDS", "4"),
        ("JWT_EXPIRES_IN", "15m"),
    ]);
    AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

async fn app() -> (Router, DemoSeed) {
    let (state, seed) = AppState::in_memory(&test_config()).await.unwrap();
    (app_router(state), seed)
}

// Mesmo modo demonstração, mas com acesso direto ao store
async fn app_with_store() -> (Router, DemoSeed, Arc<InMemoryStore>) {
    let config = test_config();
    let hasher = PasswordHasher::new(config.bcrypt_cost).unwrap();
    let store = Arc::new(InMemoryStore::new());
    let seed = store.seed_demo(&hasher.hash(DEMO_PASSWORD).await.unwrap()).await.unwrap();
    let state = AppState::with_repositories(&config, hasher, store.clone(), store.clone(), store.clone()).unwrap();
    (app_router(state), seed, store)
}

fn user(seed: &DemoSeed, who: RoleTemplate) -> &User {
    seed.user(who).unwrap()
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    builder
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let builder = request(method, uri, token, body.clone());
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    send(app, builder.body(body).unwrap()).await
}

async fn login(app: &Router, seed: &DemoSeed, who: RoleTemplate) -> (String, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": user(seed, who).email, "password": DEMO_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login falhou: {body}");
    (
        body["data"]["accessToken"].as_str().unwrap().to_string(),
        body["data"]["refreshToken"].as_str().unwrap().to_string(),
    )
}

async fn check(app: &Router, token: &str, capability: &str, location: Option<Uuid>, company: Option<Uuid>) -> Value {
    let mut builder = request(Method::GET, &format!("/api/access/check?capability={capability}"), Some(token), None);
    if let Some(location) = location {
        builder = builder.header("x-location-id", location.to_string());
    }
    if let Some(company) = company {
        builder = builder.header("x-company-id", company.to_string());
    }
    let (status, body) = send(app, builder.body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK, "check falhou: {body}");
    body["data"].clone()
}

#[tokio::test]
async fn health_is_public() {
    let (app, _) = app().await;
    let (status, body) = call(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() {
    let (app, seed) = app().await;

    let wrong = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": user(&seed, CASHIER).email, "password": "errada" })),
    )
    .await;
    let unknown = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ninguem@demo.local", "password": DEMO_PASSWORD })),
    )
    .await;

    assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
    assert_eq!(wrong.1["success"], false);
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let (app, _) = app().await;

    let (status, body) = call(&app, Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "success": false, "message": "Authentication token is missing." }));

    let (status, body) = call(&app, Method::GET, "/api/auth/me", Some("nao.e.jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid authentication token.");
}

#[tokio::test]
async fn errors_follow_accept_language() {
    let (app, _) = app().await;
    let req = Request::builder()
        .uri("/api/auth/me")
        .header(header::ACCEPT_LANGUAGE, "pt-BR,pt;q=0.9")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token de autenticação ausente.");
}

#[tokio::test]
async fn me_returns_profile_without_secrets() {
    let (app, seed) = app().await;
    let (token, _) = login(&app, &seed, CASHIER).await;

    let (status, body) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["user"]["email"], user(&seed, CASHIER).email.as_str());
    assert!(data["user"].get("passwordHash").is_none());
    assert!(data["user"].get("refreshToken").is_none());
    assert_eq!(data["role"]["name"], "cashier");
    assert_eq!(data["company"]["id"], seed.company.id.to_string());
    assert_eq!(data["locations"].as_array().unwrap().len(), 1);
    assert_eq!(data["locations"][0]["location"]["id"], seed.locations[CENTRO].id.to_string());
}

#[tokio::test]
async fn refresh_works_until_logout() {
    let (app, seed) = app().await;
    let (token, refresh) = login(&app, &seed, MANAGER).await;

    let (status, body) = call(&app, Method::POST, "/api/auth/refresh", None, Some(json!({ "refreshToken": refresh }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tokenType"], "Bearer");
    assert_eq!(body["data"]["expiresIn"], 900);

    let (status, _) = call(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::POST, "/api/auth/refresh", None, Some(json!({ "refreshToken": refresh }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid refresh token.");
}

#[tokio::test]
async fn cashier_only_reaches_assigned_locations() {
    let (app, seed) = app().await;
    let (token, _) = login(&app, &seed, CASHIER).await;

    let centro = seed.locations[CENTRO].id;
    let quiosque = seed.locations[QUIOSQUE].id;

    let (status, _) = call(&app, Method::GET, &format!("/api/locations/{centro}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::GET, &format!("/api/locations/{quiosque}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "success": false, "message": "You do not have access to this location." }));

    let allowed = check(&app, &token, "sales.create", Some(centro), None).await;
    assert_eq!(allowed["allowed"], true);
    assert!(allowed["reason"].is_null());

    let denied = check(&app, &token, "sales.create", Some(quiosque), None).await;
    assert_eq!(denied["allowed"], false);
    assert_eq!(denied["reason"], "location_access_denied");

    // Lista só os locais vinculados
    let (status, body) = call(&app, Method::GET, "/api/locations", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn admin_sees_every_location_of_its_company() {
    let (app, seed) = app().await;
    let (token, _) = login(&app, &seed, ADMIN).await;

    let (status, body) = call(&app, Method::GET, "/api/locations", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let deposito = seed.locations[DEPOSITO].id;
    let (status, _) = call(&app, Method::GET, &format!("/api/locations/{deposito}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let missing = Uuid::new_v4();
    let (status, _) = call(&app, Method::GET, &format!("/api/locations/{missing}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn decisions_report_their_reason() {
    let (app, seed) = app().await;
    let (manager, _) = login(&app, &seed, MANAGER).await;
    let (admin, _) = login(&app, &seed, ADMIN).await;
    let (root, _) = login(&app, &seed, SUPER_ADMIN).await;

    let decision = check(&app, &manager, "sales.delete", None, None).await;
    assert_eq!(decision["reason"], "permission_denied");

    let elsewhere = Uuid::new_v4();
    let decision = check(&app, &admin, "products.read", None, Some(elsewhere)).await;
    assert_eq!(decision["reason"], "cross_tenant_access");

    let decision = check(&app, &root, "products.read", None, Some(elsewhere)).await;
    assert_eq!(decision["allowed"], true);
}

#[tokio::test]
async fn malformed_target_header_is_a_bad_request() {
    let (app, seed) = app().await;
    let (token, _) = login(&app, &seed, ADMIN).await;

    let req = request(Method::GET, "/api/access/check?capability=sales.read", Some(&token), None)
        .header("x-location-id", "loja-1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["header"], "x-location-id");

    let (status, _) = call(&app, Method::GET, "/api/access/check?capability=shopify.sync", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_super_admin_deactivates_companies() {
    let (app, seed) = app().await;
    let (admin, _) = login(&app, &seed, ADMIN).await;
    let (root, _) = login(&app, &seed, SUPER_ADMIN).await;
    let uri = format!("/api/companies/{}", seed.company.id);

    let (status, body) = call(&app, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Your role is not allowed to perform this action.");

    let (status, body) = call(&app, Method::DELETE, &uri, Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Company deactivated.");

    // Tokens já emitidos param de valer para cargos da empresa
    let (status, body) = call(&app, Method::GET, "/api/auth/me", Some(&admin), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Company is inactive.");

    let (status, _) = call(&app, Method::GET, "/api/auth/me", Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);

    let missing = format!("/api/companies/{}", Uuid::new_v4());
    let (status, _) = call(&app, Method::DELETE, &missing, Some(&root), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn roles_are_listed_and_created_under_capability_checks() {
    let (app, seed) = app().await;
    let (admin, _) = login(&app, &seed, ADMIN).await;
    let (cashier, _) = login(&app, &seed, CASHIER).await;

    let (status, body) = call(&app, Method::GET, "/api/roles", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    let (status, body) = call(&app, Method::GET, "/api/roles", Some(&cashier), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You do not have permission to perform this action.");

    let payload = json!({ "name": "estoquista", "template": "cashier" });
    let (status, body) = call(&app, Method::POST, "/api/roles", Some(&admin), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "estoquista");
    assert_eq!(body["data"]["scope"]["company_id"], seed.company.id.to_string());

    let (status, _) = call(&app, Method::POST, "/api/roles", Some(&cashier), Some(payload)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, Method::POST, "/api/roles", Some(&admin), Some(json!({ "name": "estoquista" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "A role with this name already exists in the company.");

    let reserved = json!({ "name": "super_admin" });
    let (status, _) = call(&app, Method::POST, "/api/roles", Some(&admin), Some(reserved)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, Method::GET, "/api/roles/templates", Some(&cashier), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn registration_joins_an_existing_company() {
    let (app, seed) = app().await;
    let payload = json!({
        "email": "nova@demo.local",
        "password": "senha123",
        "firstName": "Nova",
        "lastName": "Caixa",
        "roleId": user(&seed, CASHIER).role_id,
        "companyId": seed.company.id,
    });

    let (status, body) = call(&app, Method::POST, "/api/auth/register", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["refreshToken"].is_string());

    let (status, body) = call(&app, Method::POST, "/api/auth/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "This email is already in use.");

    let system_role = json!({
        "email": "intrusa@demo.local",
        "password": "senha123",
        "firstName": "I",
        "lastName": "I",
        "roleId": user(&seed, SUPER_ADMIN).role_id,
        "companyId": seed.company.id,
    });
    let (status, body) = call(&app, Method::POST, "/api/auth/register", None, Some(system_role)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid role.");
}

#[tokio::test]
async fn invalid_payload_lists_field_errors() {
    let (app, _) = app().await;
    let payload = json!({ "email": "nao-e-email", "password": "x" });

    let (status, body) = call(&app, Method::POST, "/api/auth/login", None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["email"].is_array());
}

#[tokio::test]
async fn forgot_password_never_reveals_accounts() {
    let (app, seed) = app().await;

    let unknown = call(
        &app,
        Method::POST,
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": "ninguem@demo.local" })),
    )
    .await;
    let known = call(
        &app,
        Method::POST,
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": user(&seed, CASHIER).email })),
    )
    .await;

    assert_eq!(unknown.0, StatusCode::OK);
    assert_eq!(unknown, known);
    assert_eq!(unknown.1["success"], true);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/reset-password",
        None,
        Some(json!({ "token": "inexistente", "newPassword": "senha-nova" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn change_password_checks_the_current_one() {
    let (app, seed) = app().await;
    let (token, _) = login(&app, &seed, MANAGER).await;

    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/auth/change-password",
        Some(&token),
        Some(json!({ "currentPassword": "errada", "newPassword": "outra-senha" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/auth/change-password",
        Some(&token),
        Some(json!({ "currentPassword": DEMO_PASSWORD, "newPassword": "outra-senha" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": user(&seed, MANAGER).email, "password": "outra-senha" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn role_creation_cannot_escalate_privileges() {
    let (app, seed) = app().await;
    let (admin, _) = login(&app, &seed, ADMIN).await;

    // Nome padrão com tabela própria
    let shadow_admin = json!({
        "name": "admin",
        "permissions": { "companies": { "delete": true }, "roles": { "delete": true } }
    });
    let (status, body) = call(&app, Method::POST, "/api/roles", Some(&admin), Some(shadow_admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid role.");

    // Nome padrão que já existe na empresa
    let (status, _) = call(&app, Method::POST, "/api/roles", Some(&admin), Some(json!({ "name": "manager" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Mais do que o criador tem
    let wider = json!({
        "name": "auditor",
        "permissions": { "reports": { "read": true }, "roles": { "delete": true } }
    });
    let (status, body) = call(&app, Method::POST, "/api/roles", Some(&admin), Some(wider)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You do not have permission to perform this action.");

    let from_super_admin = json!({ "name": "raiz", "template": "super_admin" });
    let (status, _) = call(&app, Method::POST, "/api/roles", Some(&admin), Some(from_super_admin)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, Method::GET, "/api/roles", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"].as_array().unwrap().iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["super_admin", "admin", "cashier", "manager"]);
}

#[tokio::test]
async fn malformed_requests_use_the_error_envelope() {
    let (app, seed) = app().await;
    let (token, _) = login(&app, &seed, ADMIN).await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "The request is malformed.");
    assert!(body["details"]["reason"].is_string());

    let (status, body) = call(&app, Method::GET, "/api/access/check", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "The request is malformed.");

    let (status, body) = call(&app, Method::GET, "/api/locations/loja-1", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::ACCEPT_LANGUAGE, "pt")
        .body(Body::from(r#"{"email":"a@b.c","password":"x"}"#))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "A requisição está malformada.");
}

#[tokio::test]
async fn inactive_location_blocks_assigned_staff_but_not_admins() {
    let (app, seed, store) = app_with_store().await;
    let (cashier, _) = login(&app, &seed, CASHIER).await;
    let (admin, _) = login(&app, &seed, ADMIN).await;
    let centro = seed.locations[CENTRO].id;

    assert!(store.set_location_active(centro, false).unwrap());

    let (status, body) = call(&app, Method::GET, &format!("/api/locations/{centro}"), Some(&cashier), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "This location is inactive.");

    let decision = check(&app, &cashier, "sales.create", Some(centro), None).await;
    assert_eq!(decision["reason"], "location_inactive");

    let (status, body) = call(&app, Method::GET, &format!("/api/locations/{centro}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);

    assert!(store.set_location_active(centro, true).unwrap());
    let decision = check(&app, &cashier, "sales.create", Some(centro), None).await;
    assert_eq!(decision["allowed"], true);
}
