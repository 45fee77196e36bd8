//! In-memory user directory served over HTTP.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use toolkit_api::{ApiError, ApiResult, write_response};
use toolkit_errors::ResultExt;

use crate::codes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct NewUser {
    name: String,
    email: String,
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    users: Arc<RwLock<BTreeMap<u64, User>>>,
    next_id: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    pub fn clear(&self) {
        self.users.write().clear();
    }
}

#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .with_state(state)
}

async fn health() -> Response {
    write_response(None, serde_json::json!({ "status": "ok" }))
}

async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.users.read().values().cloned().collect())
}

async fn get_user(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Json<User>> {
    state
        .users
        .read()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::code(codes::USER_NOT_FOUND.code, format!("no user with id {id}")))
}

async fn create_user(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<User>> {
    let new: NewUser =
        serde_json::from_slice(&body).with_code(codes::BIND_BODY.code, "decoding user body")?;

    let name = new.name.trim();
    if name.is_empty() || !new.email.contains('@') {
        return Err(ApiError::code(
            codes::VALIDATION.code,
            format!("rejected user name '{name}' email '{}'", new.email),
        ));
    }

    let mut users = state.users.write();
    if users.values().any(|u| u.email == new.email) {
        return Err(ApiError::code(
            codes::USER_EXISTS.code,
            format!("email {} already taken", new.email),
        ));
    }
    let id = state.next_id.fetch_add(1, Ordering::Relaxed) + 1;
    let user = User {
        id,
        name: name.to_owned(),
        email: new.email,
    };
    users.insert(id, user.clone());
    tracing::info!(user_id = id, "user created");
    Ok(Json(user))
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let removed = state.users.write().remove(&id);
    match removed {
        Some(user) => write_response(None, user),
        None => {
            let err = toolkit_errors::CodedError::new(
                codes::USER_NOT_FOUND.code,
                format!("cannot delete missing user {id}"),
            );
            write_response(Some(&err), ())
        }
    }
}
