mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    if !common::live_env() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn register_login_me_logout_flow() -> Result<()> {
    if !common::live_env() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = common::session_client()?;
    let email = common::unique_email("flow");

    // Register sets the session cookie and returns the user without password
    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({
            "email": email,
            "password": "password123",
            "firstName": "Ann",
            "lastName": "Lee",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["firstName"], "Ann");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());

    // The cookie from registration authenticates /auth/me
    let res = client
        .get(format!("{}/auth/me", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["user"]["email"], email);

    // Logout clears the cookie; the session no longer resolves
    let res = client
        .post(format!("{}/auth/logout", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["message"], "Logout successful");

    let res = client
        .get(format!("{}/auth/me", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Login restores the session
    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": email, "password": "password123" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["message"], "Login successful");

    let res = client
        .get(format!("{}/auth/me", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_is_rejected() -> Result<()> {
    if !common::live_env() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let email = common::unique_email("dup");
    common::register_user(server, &email).await?;

    let res = common::session_client()?
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({
            "email": email,
            "password": "password123",
            "firstName": "Bea",
            "lastName": "Ng",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json::<Value>().await?["message"],
        "User with this email already exists"
    );
    Ok(())
}

#[tokio::test]
async fn registration_validation_reports_each_field() -> Result<()> {
    if !common::live_env() {
        return Ok(());
    }
    let server = common::ensure_server().await?;

    let res = common::session_client()?
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({
            "email": "not-an-email",
            "password": "123",
            "firstName": "",
            "lastName": "  ",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"]["email"], "Please provide a valid email");
    assert_eq!(
        body["errors"]["password"],
        "Password must be at least 6 characters long"
    );
    assert_eq!(body["errors"]["firstName"], "First name is required");
    assert_eq!(body["errors"]["lastName"], "Last name is required");
    Ok(())
}

#[tokio::test]
async fn bad_request_bodies_answer_the_json_error_envelope() -> Result<()> {
    if !common::live_env() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let url = format!("{}/auth/register", server.base_url);

    // Truncated JSON
    let res = client
        .post(&url)
        .header("content-type", "application/json")
        .body("{\"email\": ")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["message"], "Malformed JSON body");

    // JSON body without the JSON content type
    let res = client.post(&url).body("{}").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json::<Value>().await?["message"],
        "Content-Type must be application/json"
    );

    // Mistyped field
    let res = client
        .post(&url)
        .json(&json!({ "email": 42 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["message"], "Invalid request body");

    // Well-formed but empty body reaches field validation
    let res = client.post(&url).json(&json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"]["email"], "Please provide a valid email");
    assert_eq!(body["errors"]["firstName"], "First name is required");
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_email_read_identically() -> Result<()> {
    if !common::live_env() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let email = common::unique_email("badpw");
    common::register_user(server, &email).await?;

    let wrong_password = common::session_client()?
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await?;
    let unknown_email = common::session_client()?
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({
            "email": common::unique_email("ghost"),
            "password": "password123",
        }))
        .send()
        .await?;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let a = wrong_password.json::<Value>().await?;
    let b = unknown_email.json::<Value>().await?;
    assert_eq!(a, b);
    assert_eq!(a["message"], "Invalid email or password");
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_session() -> Result<()> {
    if !common::live_env() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for (method, path) in [
        (reqwest::Method::GET, "/auth/me"),
        (reqwest::Method::GET, "/leads"),
        (reqwest::Method::POST, "/leads"),
    ] {
        let res = client
            .request(method.clone(), format!("{}{}", server.base_url, path))
            .json(&json!({}))
            .send()
            .await?;
        assert_eq!(
            res.status(),
            StatusCode::UNAUTHORIZED,
            "{} {} without a cookie",
            method,
            path
        );
        assert_eq!(
            res.json::<Value>().await?["message"],
            "Access denied. No token provided."
        );
    }
    Ok(())
}

#[tokio::test]
async fn unknown_route_falls_back_to_404() -> Result<()> {
    if !common::live_env() {
        return Ok(());
    }
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .get(format!("{}/no/such/route", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?["message"], "Route not found");
    Ok(())
}
