//! Integration tests for login, registration and role guards.
//!
//! The login and register actions are rate limited per client address, so
//! each test stays within a handful of submissions.

use petsgo_integration_tests::{PASSWORD, TestApp, location};
use reqwest::StatusCode;

// =============================================================================
// Login Tests
// =============================================================================

#[tokio::test]
async fn test_wrong_password_redirects_with_error() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client
        .post(app.at("/login"))
        .form(&[("username", "ana"), ("password", "incorrecta")])
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login?error=credentials"));

    let body = client
        .get(app.at("/login?error=credentials"))
        .send()
        .await
        .expect("Request failed")
        .text()
        .await
        .expect("No body");
    assert!(body.contains("Usuario o contraseña incorrectos"));
}

#[tokio::test]
async fn test_login_lands_on_role_dashboard() {
    let app = TestApp::spawn().await;
    let expected = [
        ("ana", "/mis-pedidos"),
        ("tienda", "/vendor"),
        ("admin", "/admin"),
        ("rider", "/rider"),
    ];

    for (username, dashboard) in expected {
        let response = app
            .client()
            .post(app.at("/login"))
            .form(&[("username", username), ("password", PASSWORD)])
            .send()
            .await
            .expect("Request failed");
        assert_eq!(location(&response), Some(dashboard), "{username}");
    }
}

#[tokio::test]
async fn test_login_returns_to_requested_page() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let guarded = client
        .get(app.at("/soporte"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(location(&guarded), Some("/login?next=%2Fsoporte"));

    let response = client
        .post(app.at("/login"))
        .form(&[("username", "ana"), ("password", PASSWORD), ("next", "/soporte")])
        .send()
        .await
        .expect("Request failed");
    assert_eq!(location(&response), Some("/soporte"));

    let page = client
        .get(app.at("/soporte"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.text().await.expect("No body").contains("Pedido atrasado"));
}

#[tokio::test]
async fn test_offsite_next_is_ignored() {
    let app = TestApp::spawn().await;
    let response = app
        .client()
        .post(app.at("/login"))
        .form(&[
            ("username", "ana"),
            ("password", PASSWORD),
            ("next", "//evil.example/phish"),
        ])
        .send()
        .await
        .expect("Request failed");

    assert_eq!(location(&response), Some("/mis-pedidos"));
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let mut statuses = Vec::new();
    for _ in 0..8 {
        let response = client
            .post(app.at("/login"))
            .form(&[("username", "ana"), ("password", "incorrecta")])
            .send()
            .await
            .expect("Request failed");
        statuses.push(response.status());
    }

    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}

// =============================================================================
// Guard Tests
// =============================================================================

#[tokio::test]
async fn test_guest_is_sent_to_login() {
    let app = TestApp::spawn().await;
    for path in ["/mis-pedidos", "/admin", "/vendor", "/rider"] {
        let response = app.client().get(app.at(path)).send().await.expect("Request failed");
        assert!(response.status().is_redirection(), "{path}");
        let target = location(&response).unwrap_or_default();
        assert!(target.starts_with("/login?next="), "{path} -> {target}");
    }
}

#[tokio::test]
async fn test_wrong_role_is_sent_home() {
    let app = TestApp::spawn().await;
    let customer = app.signed_in("ana").await;

    for path in ["/admin", "/vendor", "/rider"] {
        let response = customer.get(app.at(path)).send().await.expect("Request failed");
        assert!(response.status().is_redirection(), "{path}");
        assert_eq!(location(&response), Some("/"), "{path}");
    }
}

#[tokio::test]
async fn test_admin_is_kept_out_of_vendor_and_rider_areas() {
    let app = TestApp::spawn().await;
    let admin = app.signed_in("admin").await;

    for path in ["/admin", "/admin/tiendas/1", "/mis-pedidos"] {
        let response = admin.get(app.at(path)).send().await.expect("Request failed");
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }

    for path in ["/vendor", "/vendor/pedidos", "/rider"] {
        let response = admin.get(app.at(path)).send().await.expect("Request failed");
        assert!(response.status().is_redirection(), "{path}");
        assert_eq!(location(&response), Some("/"), "{path}");
    }
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::spawn().await;
    let client = app.signed_in("ana").await;

    let before = client
        .get(app.at("/mis-pedidos"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(before.status(), StatusCode::OK);

    let response = client
        .post(app.at("/logout"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(location(&response), Some("/"));

    let after = client
        .get(app.at("/mis-pedidos"))
        .send()
        .await
        .expect("Request failed");
    assert!(after.status().is_redirection());
}

// =============================================================================
// Registration Tests
// =============================================================================

fn registration<'a>(username: &'a str, password: &'a str, confirm: &'a str) -> [(&'a str, &'a str); 5] {
    [
        ("username", username),
        ("email", "nuevo@petsgo.cl"),
        ("display_name", ""),
        ("password", password),
        ("password_confirm", confirm),
    ]
}

#[tokio::test]
async fn test_register_validates_form() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let cases = [
        (registration("nuevo", "corta", "corta"), "password_too_short"),
        (
            registration("nuevo", "larga-clave-1", "larga-clave-2"),
            "password_mismatch",
        ),
        (registration(" ", "larga-clave-1", "larga-clave-1"), "missing_fields"),
    ];

    for (form, code) in cases {
        let response = client
            .post(app.at("/registro"))
            .form(&form)
            .send()
            .await
            .expect("Request failed");
        let expected = format!("/registro?error={code}");
        assert_eq!(location(&response), Some(expected.as_str()));
    }
}

#[tokio::test]
async fn test_register_reports_taken_username() {
    let app = TestApp::spawn().await;
    let response = app
        .client()
        .post(app.at("/registro"))
        .form(&registration("repetido", "larga-clave-1", "larga-clave-1"))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(location(&response), Some("/registro?error=taken"));
}

#[tokio::test]
async fn test_register_signs_in_as_customer() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client
        .post(app.at("/registro"))
        .form(&registration("nuevo", "larga-clave-1", "larga-clave-1"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(location(&response), Some("/mis-pedidos"));

    let orders = client
        .get(app.at("/mis-pedidos"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(orders.status(), StatusCode::OK);
}
