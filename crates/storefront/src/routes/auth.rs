//! Authentication route handlers.
//!
//! Handles login, registration and logout against the PetsGo backend. The
//! bearer token it issues is kept in the server-side session only.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use petsgo_core::{Email, Role};

use crate::api::{ApiError, AuthResponse, RegisterRequest};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{PageContext, clear_session_user, set_session_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: SecretString,
    #[serde(default)]
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    pub password: SecretString,
    pub password_confirm: SecretString,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters of the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
    pub next: Option<String>,
}

/// Query parameters of the register page.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub error: Option<&'static str>,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub error: Option<&'static str>,
    pub min_password_len: usize,
}

// =============================================================================
// Helpers
// =============================================================================

/// Message for an `?error=` code.
#[must_use]
pub fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Usuario o contraseña incorrectos.",
        "rate_limited" => "Demasiados intentos. Espera un momento e inténtalo de nuevo.",
        "session" => "No pudimos iniciar tu sesión. Inténtalo de nuevo.",
        "missing_fields" => "Completa todos los campos.",
        "invalid_email" => "Ingresa un correo electrónico válido.",
        "password_too_short" => "La contraseña debe tener al menos 8 caracteres.",
        "password_mismatch" => "Las contraseñas no coinciden.",
        "taken" => "Ese usuario o correo ya está registrado.",
        _ => "No pudimos conectar con PetsGo. Inténtalo más tarde.",
    }
}

/// Error code for a failed backend auth call.
fn api_error_code(error: &ApiError) -> &'static str {
    match error {
        ApiError::Unauthorized(_) => "credentials",
        ApiError::RateLimited(_) => "rate_limited",
        ApiError::Status { status, message } if *status < 500 => {
            let message = message.to_lowercase();
            if ["exist", "registrad", "taken"]
                .iter()
                .any(|needle| message.contains(needle))
            {
                "taken"
            } else {
                "credentials"
            }
        }
        _ => "unavailable",
    }
}

/// A same-site path to continue to after login.
///
/// Absolute paths only: protocol-relative `//host` and backslash forms are
/// rejected.
#[must_use]
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

fn login_error_url(code: &str, next: Option<&str>) -> String {
    safe_next(next).map_or_else(
        || format!("/login?error={code}"),
        |next| format!("/login?error={code}&next={}", urlencoding::encode(next)),
    )
}

/// Store the account in the session and pick where to send it.
async fn sign_in(session: &Session, auth: AuthResponse, next: Option<&str>) -> Response {
    let user = CurrentUser::from(auth.user);
    if let Err(e) = set_session_user(session, &user, &auth.token).await {
        tracing::error!(error = %e, "Failed to set session");
        return Redirect::to(&login_error_url("session", next)).into_response();
    }

    set_sentry_user(&user.id, &user.username);
    tracing::info!(user_id = %user.id, role = ?user.role, "Signed in");

    let target = safe_next(next).unwrap_or_else(|| user.role.dashboard_path());
    Redirect::to(target).into_response()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(page: PageContext, Query(query): Query<LoginQuery>) -> impl IntoResponse {
    LoginTemplate {
        page,
        error: query.error.as_deref().map(error_message),
        next: safe_next(query.next.as_deref()).unwrap_or_default().to_string(),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = form.next.as_deref().filter(|n| !n.is_empty());
    let username = form.username.trim();
    if username.is_empty() || form.password.expose_secret().is_empty() {
        return Redirect::to(&login_error_url("missing_fields", next)).into_response();
    }

    match state
        .api()
        .login(username, form.password.expose_secret())
        .await
    {
        Ok(auth) => sign_in(&session, auth, next).await,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            Redirect::to(&login_error_url(api_error_code(&e), next)).into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    page: PageContext,
    Query(query): Query<RegisterQuery>,
) -> impl IntoResponse {
    RegisterTemplate {
        page,
        error: query.error.as_deref().map(error_message),
        min_password_len: MIN_PASSWORD_LEN,
    }
}

impl RegisterForm {
    /// Validate the form into a backend request.
    ///
    /// # Errors
    ///
    /// Returns the `?error=` code describing the first problem found.
    pub fn to_request(&self) -> Result<RegisterRequest, &'static str> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err("missing_fields");
        }
        let email = Email::parse(&self.email).map_err(|_| "invalid_email")?;

        let password = self.password.expose_secret();
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err("password_too_short");
        }
        if password != self.password_confirm.expose_secret() {
            return Err("password_mismatch");
        }

        let display_name = self.display_name.trim();
        Ok(RegisterRequest {
            username: username.to_string(),
            email,
            password: password.to_string(),
            display_name: if display_name.is_empty() {
                username.to_string()
            } else {
                display_name.to_string()
            },
        })
    }
}

/// Handle registration form submission.
///
/// New accounts are customers and are signed in right away.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let request = match form.to_request() {
        Ok(request) => request,
        Err(code) => return Redirect::to(&format!("/registro?error={code}")).into_response(),
    };

    match state.api().register(&request).await {
        Ok(auth) => {
            if auth.user.role != Role::Customer {
                tracing::warn!(role = ?auth.user.role, "Registration returned a non-customer role");
            }
            sign_in(&session, auth, None).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            let code = match api_error_code(&e) {
                "credentials" | "taken" => "taken",
                other => other,
            };
            Redirect::to(&format!("/registro?error={code}")).into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// Destroys the whole session, cart and chat transcript included.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_session_user(&session).await {
        tracing::error!(error = %e, "Failed to flush session");
    }
    clear_sentry_user();
    Redirect::to("/").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form(password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            username: " ana ".to_string(),
            email: "ana@petsgo.cl".to_string(),
            display_name: String::new(),
            password: SecretString::from(password.to_string()),
            password_confirm: SecretString::from(confirm.to_string()),
        }
    }

    #[test]
    fn test_safe_next_accepts_local_paths() {
        assert_eq!(safe_next(Some("/checkout")), Some("/checkout"));
        assert_eq!(
            safe_next(Some("/mis-pedidos?pedido=3")),
            Some("/mis-pedidos?pedido=3")
        );
    }

    #[test]
    fn test_safe_next_rejects_other_sites() {
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(None), None);
    }

    #[test]
    fn test_login_error_url_keeps_next() {
        assert_eq!(
            login_error_url("credentials", Some("/checkout")),
            "/login?error=credentials&next=%2Fcheckout"
        );
        assert_eq!(
            login_error_url("credentials", Some("//evil")),
            "/login?error=credentials"
        );
    }

    #[test]
    fn test_register_validation() {
        let request = register_form("secreto123", "secreto123")
            .to_request()
            .expect("valid form");
        assert_eq!(request.username, "ana");
        assert_eq!(request.display_name, "ana");

        assert_eq!(
            register_form("corta", "corta").to_request().err(),
            Some("password_too_short")
        );
        assert_eq!(
            register_form("secreto123", "secreto124").to_request().err(),
            Some("password_mismatch")
        );
    }

    #[test]
    fn test_unknown_error_code_has_generic_message() {
        assert_eq!(
            error_message("whatever"),
            "No pudimos conectar con PetsGo. Inténtalo más tarde."
        );
    }
}
