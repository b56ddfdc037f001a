use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{
        ChangePasswordRequest, Claims, CurrentUserData, LoginRequest, RegisterRequest, UserData,
    },
    entity::{
        chats::ChatKind,
        users::{self, Column as UserCol, Entity as Users, UserRole},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, decode_session_token, extract_session_token},
    models::User,
    response::ApiResponse,
    services::{chat_service, shop_service},
    state::AppState,
};

/// Side effects of a completed registration, applied as an explicit event
/// step so new roles can add behavior without touching the registration
/// path itself.
#[derive(Debug)]
pub enum RegistrationEvent {
    SellerRegistered { user_id: Uuid },
}

fn registration_events(user: &users::Model) -> Vec<RegistrationEvent> {
    match user.role {
        UserRole::Seller => vec![RegistrationEvent::SellerRegistered { user_id: user.id }],
        UserRole::Buyer | UserRole::Admin => Vec::new(),
    }
}

async fn apply_registration_event<C: ConnectionTrait>(
    conn: &C,
    event: &RegistrationEvent,
) -> AppResult<()> {
    match event {
        RegistrationEvent::SellerRegistered { user_id } => {
            shop_service::create_for_user(conn, *user_id).await?;

            // open a support chat with the oldest admin account
            let admin = Users::find()
                .filter(UserCol::Role.eq(UserRole::Admin))
                .order_by_asc(UserCol::CreatedAt)
                .one(conn)
                .await?;
            match admin {
                Some(admin) => {
                    chat_service::create_chat_between(
                        conn,
                        ChatKind::SellerAdmin,
                        (*user_id, UserRole::Seller),
                        (admin.id, UserRole::Admin),
                    )
                    .await?;
                }
                None => {
                    tracing::debug!("no admin user exists; skipping seller support chat");
                }
            }
        }
    }
    Ok(())
}

/// Returns the signed session token alongside the created user; the route
/// turns the token into the session cookie.
pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<(String, ApiResponse<UserData>)> {
    let role = payload.role.unwrap_or(UserRole::Buyer);
    if role == UserRole::Admin {
        return Err(AppError::BadRequest("Invalid role".into()));
    }

    let existing = Users::find()
        .filter(UserCol::Email.eq(payload.email.as_str()))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest("Email is already taken".into()));
    }

    let password_hash = hash_password(&payload.password)?;

    let txn = state.orm.begin().await?;

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(payload.username),
        email: Set(payload.email),
        password_hash: Set(password_hash),
        address: Set(None),
        avatar_url: Set(None),
        role: Set(role),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for event in registration_events(&user) {
        apply_registration_event(&txn, &event).await?;
    }

    txn.commit().await?;

    let token = sign_session_token(&user)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id, "role": user.role })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let response = ApiResponse::success(UserData {
        user: user_from_entity(user),
    });
    Ok((token, response))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<(String, ApiResponse<UserData>)> {
    let user = Users::find()
        .filter(UserCol::Email.eq(payload.email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    verify_password(&payload.password, &user.password_hash)
        .map_err(|_| AppError::Unauthorized("Invalid credentials".into()))?;

    let token = sign_session_token(&user)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let response = ApiResponse::success(UserData {
        user: user_from_entity(user),
    });
    Ok((token, response))
}

/// Missing or invalid sessions are not errors here; the client just gets
/// `user: null`.
pub async fn current_user(
    state: &AppState,
    headers: &axum::http::HeaderMap,
) -> AppResult<ApiResponse<CurrentUserData>> {
    let user = match extract_session_token(headers) {
        Some(token) => match decode_session_token(&token) {
            Ok(claims) => match Uuid::parse_str(&claims.sub) {
                Ok(user_id) => Users::find_by_id(user_id)
                    .one(&state.orm)
                    .await?
                    .map(user_from_entity),
                Err(_) => None,
            },
            Err(_) => None,
        },
        None => None,
    };

    Ok(ApiResponse::success(CurrentUserData { user }))
}

pub async fn change_password(
    state: &AppState,
    auth: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = Users::find_by_id(auth.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    verify_password(&payload.old_password, &user.password_hash)
        .map_err(|_| AppError::BadRequest("Incorrect password".into()))?;

    let password_hash = hash_password(&payload.new_password)?;

    let mut active: users::ActiveModel = user.into();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(auth.user_id),
        "user_change_password",
        Some("users"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(serde_json::json!({})))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), ()> {
    let parsed = PasswordHash::new(hash).map_err(|_| ())?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ())
}

pub(crate) fn sign_session_token(user: &users::Model) -> AppResult<String> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub(crate) fn user_from_entity(model: users::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        address: model.address,
        avatar_url: model.avatar_url,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
