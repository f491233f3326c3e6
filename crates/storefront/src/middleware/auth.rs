//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in account in route handlers,
//! optionally restricted to the [`Area`] a role may enter.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use petsgo_core::{Area, BearerToken};

use crate::models::{CurrentUser, SessionUser, session_keys};

/// Error returned when a guard rejects the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to the login page, coming back to `next` afterwards.
    RedirectToLogin {
        /// Path and query of the rejected request.
        next: String,
    },
    /// Signed in with a role the area does not allow (HTML requests).
    RedirectHome,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Forbidden response (for API requests).
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => {
                Redirect::to(&format!("/login?next={}", urlencoding::encode(&next)))
                    .into_response()
            }
            Self::RedirectHome => Redirect::to("/").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

/// Restore the signed-in visitor from the session.
pub async fn load_session_user(session: &Session) -> Option<SessionUser> {
    let user: CurrentUser = session.get(session_keys::USER).await.ok().flatten()?;
    let token: BearerToken = session.get(session_keys::TOKEN).await.ok().flatten()?;
    Some(SessionUser { user, token })
}

/// Store a freshly signed-in account in the session.
///
/// Cycles the session id first so a pre-login cookie cannot be reused, and
/// drops any chat transcript cached for the previous visitor. The cart is
/// kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_session_user(
    session: &Session,
    user: &CurrentUser,
    token: &BearerToken,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.remove_value(session_keys::ACCOUNT_CHAT).await?;
    session.remove_value(session_keys::GUEST_CHAT).await?;
    session.insert(session_keys::USER, user).await?;
    session.insert(session_keys::TOKEN, token).await
}

/// Destroy the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_session_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

fn is_api_request(parts: &Parts) -> bool {
    request_path(parts).starts_with("/api/")
}

/// Path and query as the browser sent them, before any nesting.
fn request_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0);
    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string)
}

async fn session_user(parts: &Parts) -> Option<SessionUser> {
    let session = parts.extensions.get::<Session>()?;
    load_session_user(session).await
}

/// Resolve the visitor and check it may enter `area`.
async fn guard(parts: &Parts, area: Area) -> Result<SessionUser, AuthRejection> {
    let api = is_api_request(parts);

    let Some(user) = session_user(parts).await else {
        return Err(if api {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin {
                next: request_path(parts),
            }
        });
    };

    if area.allows(user.user.role) {
        Ok(user)
    } else {
        tracing::info!(
            user_id = %user.user.id,
            role = ?user.user.role,
            area = ?area,
            "Role not allowed in area"
        );
        Err(if api {
            AuthRejection::Forbidden
        } else {
            AuthRejection::RedirectHome
        })
    }
}

macro_rules! area_guard {
    ($(#[$meta:meta])* $name:ident, $area:expr) => {
        $(#[$meta])*
        pub struct $name(pub SessionUser);

        impl<S> FromRequestParts<S> for $name
        where
            S: Send + Sync,
        {
            type Rejection = AuthRejection;

            async fn from_request_parts(
                parts: &mut Parts,
                _state: &S,
            ) -> Result<Self, Self::Rejection> {
                guard(parts, $area).await.map(Self)
            }
        }
    };
}

area_guard!(
    /// Extractor that requires a signed-in account of any role.
    ///
    /// Guests are redirected to the login page (HTML) or get 401 (API).
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// async fn protected_handler(
    ///     RequireAuth(visitor): RequireAuth,
    /// ) -> impl IntoResponse {
    ///     format!("Hola, {}!", visitor.user.name())
    /// }
    /// ```
    RequireAuth,
    Area::Account
);

area_guard!(
    /// Extractor for the admin panel.
    RequireAdmin,
    Area::Admin
);

area_guard!(
    /// Extractor for the vendor dashboard.
    RequireVendor,
    Area::Vendor
);

area_guard!(
    /// Extractor for the rider dashboard.
    RequireRider,
    Area::Rider
);

/// Extractor that optionally gets the signed-in visitor.
///
/// Unlike `RequireAuth`, this does not reject guests.
pub struct OptionalAuth(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}
