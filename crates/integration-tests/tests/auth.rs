//! Registration, login, logout and password change.

use axum::http::StatusCode;

use shopfront_integration_tests::{PASSWORD, TestApp};

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_then_login() {
    let mut app = TestApp::new().await;

    let response = app.register_user("alice").await;
    response.assert_redirect("/login");
    let page = app.follow(&response).await;
    assert!(page.body.contains("Successfully registered. Please log in."));
    assert_eq!(app.count("users").await, 1);

    app.post_form("/login", &[("username", "alice"), ("password", PASSWORD)])
        .await
        .assert_redirect("/");

    let home = app.get("/").await;
    assert_eq!(home.status, StatusCode::OK);
    assert!(home.body.contains("alice"));
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let mut app = TestApp::new().await;

    let response = app
        .post_form(
            "/register",
            &[("username", "bob"), ("password", "short"), ("confirm", "short")],
        )
        .await;
    response.assert_redirect("/register");

    let page = app.follow(&response).await;
    assert!(page.body.contains("Password needs to be at least 8 characters long."));
    assert_eq!(app.count("users").await, 0);
}

#[tokio::test]
async fn test_register_rejects_mismatched_confirmation() {
    let mut app = TestApp::new().await;

    let response = app
        .post_form(
            "/register",
            &[
                ("username", "bob"),
                ("password", "long enough"),
                ("confirm", "long enougH"),
            ],
        )
        .await;
    response.assert_redirect("/register");

    let page = app.follow(&response).await;
    assert!(page.body.contains("Passwords do not match."));
    assert_eq!(app.count("users").await, 0);
}

#[tokio::test]
async fn test_register_checks_fields_in_order() {
    let mut app = TestApp::new().await;

    let response = app
        .post_form("/register", &[("username", ""), ("password", "")])
        .await;
    assert!(app.follow(&response).await.body.contains("Username is required."));

    let response = app
        .post_form("/register", &[("username", "bob"), ("password", "")])
        .await;
    assert!(app.follow(&response).await.body.contains("Password is required."));
}

#[tokio::test]
async fn test_register_rejects_taken_username() {
    let mut app = TestApp::new().await;
    app.register_user("carol").await.assert_redirect("/login");

    let response = app.register_user("carol").await;
    response.assert_redirect("/register");
    assert!(app.follow(&response).await.body.contains("Username is taken."));
    assert_eq!(app.count("users").await, 1);
}

// ============================================================================
// Login / Logout
// ============================================================================

#[tokio::test]
async fn test_login_rejects_wrong_password_and_unknown_user() {
    let mut app = TestApp::new().await;
    app.register_user("dave").await;

    for (username, password) in [("dave", "wrong password"), ("nobody", PASSWORD)] {
        let response = app
            .post_form("/login", &[("username", username), ("password", password)])
            .await;
        response.assert_redirect("/login");
        let page = app.follow(&response).await;
        assert!(page.body.contains("Invalid username and/or password."));
    }

    app.get("/").await.assert_redirect("/login");
}

#[tokio::test]
async fn test_user_account_does_not_log_into_admin() {
    let mut app = TestApp::new().await;
    app.register_user("erin").await;

    let response = app
        .post_form("/admin/login", &[("username", "erin"), ("password", PASSWORD)])
        .await;
    response.assert_redirect("/admin/login");
}

#[tokio::test]
async fn test_visiting_login_page_logs_out() {
    let mut app = TestApp::new().await;
    app.sign_in_user("frank").await;
    assert_eq!(app.get("/").await.status, StatusCode::OK);

    assert_eq!(app.get("/login").await.status, StatusCode::OK);
    app.get("/").await.assert_redirect("/login");
}

#[tokio::test]
async fn test_logout_clears_session() {
    let mut app = TestApp::new().await;
    app.sign_in_user("grace").await;

    app.get("/logout").await.assert_redirect("/login");
    app.get("/cart").await.assert_redirect("/login");
}

// ============================================================================
// Password Change
// ============================================================================

#[tokio::test]
async fn test_change_password() {
    let mut app = TestApp::new().await;
    app.sign_in_user("heidi").await;

    let response = app
        .post_form(
            "/change-password",
            &[
                ("current", PASSWORD),
                ("new", "brand new secret"),
                ("confirm", "brand new secret"),
            ],
        )
        .await;
    response.assert_redirect("/change-password");
    assert!(app.follow(&response).await.body.contains("Password changed successfully."));

    app.get("/logout").await;
    app.post_form("/login", &[("username", "heidi"), ("password", PASSWORD)])
        .await
        .assert_redirect("/login");
    app.post_form(
        "/login",
        &[("username", "heidi"), ("password", "brand new secret")],
    )
    .await
    .assert_redirect("/");
}

#[tokio::test]
async fn test_change_password_failures_are_flashed() {
    let mut app = TestApp::new().await;
    app.sign_in_user("ivan").await;

    let cases: [(&[(&str, &str)], &str); 4] = [
        (
            &[("current", PASSWORD), ("new", ""), ("confirm", "")],
            "Field(s)",
        ),
        (
            &[("current", "not it at all"), ("new", "new secret!"), ("confirm", "new secret!")],
            "Current password is incorrect.",
        ),
        (
            &[("current", PASSWORD), ("new", "new secret!"), ("confirm", "other secret")],
            "Passwords do not match.",
        ),
        (
            &[("current", PASSWORD), ("new", "tiny"), ("confirm", "tiny")],
            "Password needs to be at least 8 characters long.",
        ),
    ];

    for (fields, message) in cases {
        let response = app.post_form("/change-password", fields).await;
        response.assert_redirect("/change-password");
        let page = app.follow(&response).await;
        assert!(page.body.contains(message), "missing {message:?}");
    }
}
