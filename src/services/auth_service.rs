//! The credential backend: account registration, login, and the
//! admin-facing user management surface.
//!
//! Issues the bearer tokens the rest of the system verifies. Accounts live
//! in an in-memory concurrent map behind [`UserStore`]; the store's API is
//! the seam where a SQL adapter would slot in.
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use axum::{
    Json, Router,
    extract::{FromRef, Path, State},
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use scc::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    auth::{Administrative, Role, TokenService},
    core::error::{ApiError, ApiResult},
};

const BCRYPT_COST: u32 = 10;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The password-free projection served to admin listings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserSummary {
    fn from(record: &UserRecord) -> Self {
        UserSummary {
            id: record.id,
            username: record.username.clone(),
            role: record.role,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Concurrent account store. Username uniqueness is enforced through the
/// `by_name` index: whichever writer lands a name in that map first owns it.
pub struct UserStore {
    users: HashMap<i64, UserRecord>,
    by_name: HashMap<String, i64>,
    next_id: AtomicI64,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            by_name: HashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Create an account. Fails with [`ApiError::Conflict`] when the
    /// username is taken.
    pub fn create(&self, username: &str, password_hash: &str, role: Role) -> ApiResult<i64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if self.by_name.insert(username.to_string(), id).is_err() {
            return Err(ApiError::Conflict("Username already exists".to_string()));
        }
        let now = Utc::now();
        let record = UserRecord {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: now,
            updated_at: now,
        };
        let _ = self.users.insert(id, record);
        Ok(id)
    }

    pub fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        let id = self.by_name.read(username, |_, id| *id)?;
        self.users.read(&id, |_, record| record.clone())
    }

    pub fn get(&self, id: i64) -> Option<UserRecord> {
        self.users.read(&id, |_, record| record.clone())
    }

    /// All accounts newest-first, passwords excluded.
    pub fn list(&self) -> Vec<UserSummary> {
        let mut summaries = Vec::new();
        self.users.scan(|_, record| {
            summaries.push(UserSummary::from(record));
        });
        summaries.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        summaries
    }

    /// Update username and/or role. A rename claims the new name in the
    /// index before touching the record, so two concurrent renames to the
    /// same name cannot both succeed.
    pub fn update(
        &self,
        id: i64,
        username: Option<&str>,
        role: Option<Role>,
    ) -> ApiResult<()> {
        let current = self
            .get(id)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if let Some(new_name) = username
            && new_name != current.username
        {
            if self.by_name.insert(new_name.to_string(), id).is_err() {
                return Err(ApiError::Conflict("Username already exists".to_string()));
            }
            self.by_name.remove(&current.username);
        }

        self.users.update(&id, |_, record| {
            if let Some(new_name) = username {
                record.username = new_name.to_string();
            }
            if let Some(new_role) = role {
                record.role = new_role;
            }
            record.updated_at = Utc::now();
        });
        Ok(())
    }

    pub fn delete(&self, id: i64) -> bool {
        match self.users.remove(&id) {
            Some((_, record)) => {
                self.by_name.remove(&record.username);
                true
            }
            None => false,
        }
    }

    pub fn set_password_hash(&self, id: i64, password_hash: &str) -> bool {
        self.users
            .update(&id, |_, record| {
                record.password_hash = password_hash.to_string();
                record.updated_at = Utc::now();
            })
            .is_some()
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub store: Arc<UserStore>,
    pub tokens: Arc<TokenService>,
}

impl FromRef<AuthState> for Arc<TokenService> {
    fn from_ref(state: &AuthState) -> Self {
        state.tokens.clone()
    }
}

pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/health", get(health))
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user).put(update_user))
        .route("/users/delete/{id}", delete(delete_user))
        .route("/user/{id}", delete(delete_user))
        .route("/users/{id}/reset-password", post(reset_password))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RegisterBody {
    username: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

async fn register(
    State(state): State<AuthState>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let (Some(username), Some(password), Some(role)) = (body.username, body.password, body.role)
    else {
        return Err(ApiError::Validation("Missing fields".to_string()));
    };
    let role: Role = role
        .parse()
        .map_err(|_| ApiError::Validation(format!("Unknown role '{role}'")))?;

    // Hashing happens before the uniqueness check touches the store, so a
    // duplicate name never learns timing about existing hashes.
    let hashed = bcrypt::hash(&password, BCRYPT_COST).map_err(|err| {
        tracing::error!(error = %err, "password hashing failed");
        ApiError::Internal
    })?;
    let id = state.store.create(&username, &hashed, role)?;

    tracing::info!(user = %username, id, "account registered");
    Ok(Json(json!({ "message": "User registered", "userId": id })))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LoginBody {
    username: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<AuthState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let (Some(username), Some(password)) = (body.username, body.password) else {
        return Err(ApiError::Validation(
            "Missing username or password".to_string(),
        ));
    };

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());
    let user = state.store.find_by_username(&username).ok_or_else(invalid)?;
    let valid = bcrypt::verify(&password, &user.password_hash).map_err(|err| {
        tracing::error!(error = %err, "password verification failed");
        ApiError::Internal
    })?;
    if !valid {
        return Err(invalid());
    }

    let token = state
        .tokens
        .issue(user.id, &user.username, user.role)
        .map_err(|err| {
            tracing::error!(error = %err, "token signing failed");
            ApiError::Internal
        })?;
    Ok(Json(json!({ "token": token })))
}

async fn list_users(
    State(state): State<AuthState>,
    _admin: Administrative,
) -> Json<Vec<UserSummary>> {
    Json(state.store.list())
}

async fn get_user(
    State(state): State<AuthState>,
    _admin: Administrative,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserSummary>> {
    state
        .store
        .get(id)
        .map(|record| Json(UserSummary::from(&record)))
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct UpdateUserBody {
    username: Option<String>,
    role: Option<String>,
}

async fn update_user(
    State(state): State<AuthState>,
    _admin: Administrative,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserBody>,
) -> ApiResult<Json<serde_json::Value>> {
    if body.username.is_none() && body.role.is_none() {
        return Err(ApiError::Validation("Nothing to update".to_string()));
    }
    let role = body
        .role
        .map(|raw| {
            raw.parse::<Role>()
                .map_err(|_| ApiError::Validation(format!("Unknown role '{raw}'")))
        })
        .transpose()?;

    state.store.update(id, body.username.as_deref(), role)?;
    Ok(Json(json!({ "message": "User updated" })))
}

async fn delete_user(
    State(state): State<AuthState>,
    _admin: Administrative,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.store.delete(id) {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    tracing::info!(id, "account deleted");
    Ok(Json(json!({ "message": "User deleted" })))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ResetPasswordBody {
    new_password: Option<String>,
}

async fn reset_password(
    State(state): State<AuthState>,
    _admin: Administrative,
    Path(id): Path<i64>,
    Json(body): Json<ResetPasswordBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let Some(new_password) = body.new_password else {
        return Err(ApiError::Validation("New password required".to_string()));
    };

    let hashed = bcrypt::hash(&new_password, BCRYPT_COST).map_err(|err| {
        tracing::error!(error = %err, "password hashing failed");
        ApiError::Internal
    })?;
    if !state.store.set_password_hash(id, &hashed) {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    Ok(Json(json!({ "message": "Password reset successful" })))
}
