//! Integration tests for the vendor, admin, rider and support areas.

use petsgo_integration_tests::{TestApp, location};
use reqwest::StatusCode;

// =============================================================================
// Rider Tests
// =============================================================================

#[tokio::test]
async fn test_rider_dashboard_lists_deliveries() {
    let app = TestApp::spawn().await;
    let rider = app.signed_in("rider").await;

    let response = rider.get(app.at("/rider")).send().await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("No body");
    assert!(body.contains("Av. Prueba 123"));
    assert!(body.contains("Calle Falsa 456"));
}

#[tokio::test]
async fn test_rider_advances_delivery() {
    let app = TestApp::spawn().await;
    let rider = app.signed_in("rider").await;

    let picked_up = rider
        .post(app.at("/rider/entregas/10/estado"))
        .form(&[("status", "in_transit")])
        .send()
        .await
        .expect("Request failed");
    assert!(picked_up.status().is_redirection());
    assert_eq!(location(&picked_up), Some("/rider"));

    let delivered = rider
        .post(app.at("/rider/entregas/11/estado"))
        .form(&[("status", "delivered")])
        .send()
        .await
        .expect("Request failed");
    assert!(delivered.status().is_redirection());

    assert_eq!(
        app.backend.delivery_updates(),
        vec![(10, "in_transit".to_string()), (11, "delivered".to_string())]
    );
}

#[tokio::test]
async fn test_rider_cannot_skip_steps() {
    let app = TestApp::spawn().await;
    let rider = app.signed_in("rider").await;

    for (id, status) in [("10", "delivered"), ("11", "ready"), ("10", "volando")] {
        let response = rider
            .post(app.at(&format!("/rider/entregas/{id}/estado")))
            .form(&[("status", status)])
            .send()
            .await
            .expect("Request failed");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{id} -> {status}");
    }

    assert!(app.backend.delivery_updates().is_empty());
}

#[tokio::test]
async fn test_rider_cannot_touch_unassigned_delivery() {
    let app = TestApp::spawn().await;
    let rider = app.signed_in("rider").await;

    let response = rider
        .post(app.at("/rider/entregas/99/estado"))
        .form(&[("status", "in_transit")])
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.backend.delivery_updates().is_empty());
}

// =============================================================================
// Admin Tests
// =============================================================================

#[tokio::test]
async fn test_admin_dashboard_shows_figures() {
    let app = TestApp::spawn().await;
    let admin = app.signed_in("admin").await;

    let response = admin.get(app.at("/admin")).send().await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.expect("No body").contains("321"));
}

#[tokio::test]
async fn test_admin_changes_ticket_status() {
    let app = TestApp::spawn().await;
    let admin = app.signed_in("admin").await;

    let listing = admin
        .get(app.at("/admin/soporte"))
        .send()
        .await
        .expect("Request failed");
    assert!(listing.text().await.expect("No body").contains("TK-0005"));

    let response = admin
        .post(app.at("/admin/soporte/5/estado"))
        .form(&[("status", "resolved")])
        .send()
        .await
        .expect("Request failed");
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/admin/soporte"));

    let rejected = admin
        .post(app.at("/admin/soporte/5/estado"))
        .form(&[("status", "olvidado")])
        .send()
        .await
        .expect("Request failed");
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.backend.ticket_updates(), vec![(5, "resolved".to_string())]);
}

#[tokio::test]
async fn test_admin_views_store_dashboard_read_only() {
    let app = TestApp::spawn().await;
    let admin = app.signed_in("admin").await;

    let response = admin
        .get(app.at("/admin/tiendas/1"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("No body");
    assert!(body.contains("modo lectura"));
    assert!(body.contains("Patitas Test"));

    let missing = admin
        .get(app.at("/admin/tiendas/404"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Vendor Tests
// =============================================================================

#[tokio::test]
async fn test_vendor_sees_own_dashboard() {
    let app = TestApp::spawn().await;
    let vendor = app.signed_in("tienda").await;

    let response = vendor.get(app.at("/vendor")).send().await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("No body");
    assert!(body.contains("Patitas Test"));
    assert!(body.contains("$125.000"));
    assert!(!body.contains("modo lectura"));

    for path in ["/vendor/pedidos", "/vendor/productos"] {
        let page = vendor.get(app.at(path)).send().await.expect("Request failed");
        assert_eq!(page.status(), StatusCode::OK, "{path}");
    }
}

// =============================================================================
// Support Tests
// =============================================================================

#[tokio::test]
async fn test_customer_replies_to_ticket() {
    let app = TestApp::spawn().await;
    let client = app.signed_in("ana").await;

    let response = client
        .post(app.at("/soporte/5/responder"))
        .form(&[("message", "Sigue sin llegar")])
        .send()
        .await
        .expect("Request failed");
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/soporte/5"));

    let body = client
        .get(app.at("/soporte/5"))
        .send()
        .await
        .expect("Request failed")
        .text()
        .await
        .expect("No body");
    assert!(body.contains("Estamos revisando tu pedido."));
    assert!(body.contains("Sigue sin llegar"));
}

#[tokio::test]
async fn test_customer_opens_ticket() {
    let app = TestApp::spawn().await;
    let client = app.signed_in("ana").await;

    let response = client
        .post(app.at("/soporte"))
        .form(&[
            ("subject", "Producto dañado"),
            ("category", "producto"),
            ("priority", "high"),
            ("description", "La bolsa llegó rota"),
        ])
        .send()
        .await
        .expect("Request failed");

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/soporte/5"));
}
