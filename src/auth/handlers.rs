use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthData, AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse,
            ProfileData, ProfileResponse, RegisterRequest, UpdateProfileRequest,
            UpdatedProfileData, UpdatedProfileResponse,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{NewUser, ProfileUpdate, User},
        validate,
    },
    calculator::repo::Calculation,
    error::ApiError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(get_profile).put(update_profile))
        .route("/auth/password", put(change_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    validate::username(&payload.username)?;
    validate::email(&payload.email)?;
    validate::password("password", &payload.password)?;
    validate::name("firstName", payload.first_name.as_deref())?;
    validate::name("lastName", payload.last_name.as_deref())?;

    // Fast path so the response can name the colliding field; the unique
    // constraints still decide concurrent registrations.
    let existing = User::find_by_identity(&state.db, &payload.username, &payload.email).await?;
    if let Some(existing) = existing {
        let field = if existing.email == payload.email {
            "email"
        } else {
            "username"
        };
        warn!(field, "registration with taken identity");
        return Err(ApiError::Duplicate { field });
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        NewUser {
            username: &payload.username,
            email: &payload.email,
            password_hash: &hash,
            first_name: payload.first_name.as_deref(),
            last_name: payload.last_name.as_deref(),
        },
    )
    .await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.username)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "User registered successfully",
            data: AuthData {
                user: user.into(),
                token,
                expires_in: state.config.jwt.expires_in(),
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.login = payload.login.trim().to_string();
    validate::required("login", &payload.login)?;
    validate::required("password", &payload.password)?;

    // Unknown identifier, inactive account and wrong password all take the
    // same exit so the response never says which part failed.
    let user = User::find_by_login(&state.db, &payload.login)
        .await?
        .ok_or_else(|| {
            warn!("login with unknown or inactive identity");
            ApiError::InvalidCredentials
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    User::touch_last_login(&state.db, user.id).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.username)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful",
        data: AuthData {
            user: user.into(),
            token,
            expires_in: state.config.jwt.expires_in(),
        },
    }))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = User::find_by_id(&state.db, current.id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    let stats = Calculation::stats(&state.db, current.id).await?;

    Ok(Json(ProfileResponse {
        success: true,
        data: ProfileData {
            user: user.into(),
            stats,
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UpdatedProfileResponse>, ApiError> {
    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    if let Some(email) = &email {
        validate::email(email)?;
    }
    validate::name("firstName", payload.first_name.as_deref())?;
    validate::name("lastName", payload.last_name.as_deref())?;

    let user = User::update_profile(
        &state.db,
        current.id,
        ProfileUpdate {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email,
        },
    )
    .await?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(UpdatedProfileResponse {
        success: true,
        message: "Profile updated successfully",
        data: UpdatedProfileData { user: user.into() },
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate::required("currentPassword", &payload.current_password)?;
    validate::password("newPassword", &payload.new_password)?;

    let user = User::find_by_id(&state.db, current.id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!(user_id = %user.id, "password change with invalid current password");
        return Err(ApiError::InvalidCredentials);
    }

    let hash = hash_password(&payload.new_password)?;
    User::set_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse {
        success: true,
        message: "Password changed successfully",
    }))
}
