//! services/api/src/web/auth.rs
//!
//! Session endpoints: login, registration, logout and the current user.
//! These drive the local session simulation; no credential is ever checked.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use medication_tracker_core::{Role, SessionError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::state::AppState;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    /// `patient` or `caretaker`.
    #[schema(value_type = String)]
    pub role: Role,
}

fn session_failure(e: SessionError, context: &str) -> (StatusCode, String) {
    match e {
        SessionError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
        }
        SessionError::Port(inner) => {
            error!("{}: {:?}", context, inner);
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Sign in as one of the demo accounts
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful"),
        (status = 401, description = "No demo account with this email"),
        (status = 500, description = "The session could not be persisted")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .session
        .login(&req.email, &req.password)
        .await
        .map_err(|e| session_failure(e, "Failed to log in"))?;
    Ok((StatusCode::OK, Json(user)))
}

/// POST /auth/register - Create a local account and sign in as it
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Email or name is blank"),
        (status = 500, description = "The session could not be persisted")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.email.trim().is_empty() || req.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "email and name are required".to_string(),
        ));
    }

    let user = state
        .session
        .register(req.email.trim(), &req.password, req.name.trim(), req.role)
        .await
        .map_err(|e| session_failure(e, "Failed to create account"))?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/logout - End the session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 500, description = "The session could not be cleared")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .session
        .logout()
        .await
        .map_err(|e| session_failure(e, "Failed to log out"))?;
    Ok(StatusCode::OK)
}

/// GET /auth/me - The signed-in user
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "The current user"),
        (status = 401, description = "Nobody is signed in")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .session
        .current_user()
        .await
        .map(Json)
        .ok_or((StatusCode::UNAUTHORIZED, "No active session".to_string()))
}

#[cfg(test)]
mod tests {
    use crate::web::rest::tests::{send, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn login_attributes_new_logs() {
        let (app, _) = test_app().await;

        let (status, _) = send(&app, "GET", "/auth/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, user) = send(
            &app,
            "POST",
            "/auth/login",
            Some(json!({ "email": "caretaker@demo.com", "password": "anything" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["role"], "caretaker");

        let (_, log) = send(
            &app,
            "POST",
            "/logs",
            Some(json!({ "medicationId": "2", "status": "skipped", "notes": "travel" })),
        )
        .await;
        assert_eq!(log["patientId"], "2");
        assert_eq!(log["notes"], "travel");

        let (status, _) = send(&app, "POST", "/auth/logout", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", "/auth/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_email_is_unauthorized() {
        let (app, state) = test_app().await;
        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            Some(json!({ "email": "someone@else.com", "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(state.session.current_user().await.is_none());
    }

    #[tokio::test]
    async fn register_signs_in_the_new_account() {
        let (app, _) = test_app().await;
        let (status, user) = send(
            &app,
            "POST",
            "/auth/register",
            Some(json!({
                "email": "new@example.com",
                "password": "pw",
                "name": "New Caretaker",
                "role": "caretaker"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user["name"], "New Caretaker");

        let (_, me) = send(&app, "GET", "/auth/me", None).await;
        assert_eq!(me["email"], "new@example.com");

        let (status, _) = send(
            &app,
            "POST",
            "/auth/register",
            Some(json!({ "email": " ", "password": "pw", "name": "X", "role": "patient" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
