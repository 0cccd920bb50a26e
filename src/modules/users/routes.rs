//! HTTP handlers for the users module, mounted under `/api/users`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use library_http::error::AppError;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::models::{CreateUser, SetPunishment, User};
use super::repository::UserRepository;
use crate::modules::books::service::BookService;

#[derive(Clone)]
pub struct UsersState {
    pub users: Arc<dyn UserRepository>,
    pub books: Arc<BookService>,
}

#[derive(Debug, Serialize)]
pub struct Penalty {
    pub user_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Loans {
    pub user_id: Uuid,
    pub count: u64,
}

pub fn router(state: UsersState) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/health", get(health_check))
        .route("/{id}", get(get_user))
        .route("/{id}/punishment", put(set_punishment))
        .route("/{id}/penalty", get(penalty))
        .route("/{id}/loans", get(loan_count).delete(remove_loans))
        .with_state(state)
}

async fn load(users: &dyn UserRepository, id: Uuid) -> Result<User, AppError> {
    users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("The object was not found"))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "users module is healthy"
}

async fn list_users(State(state): State<UsersState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.users.find_all().await?))
}

async fn create_user(
    State(state): State<UsersState>,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::validation(
            vec![serde_json::json!({"field": "username", "error": "required"})],
            "The parameters are wrong",
        ));
    }

    let user = state.users.save(User::new(payload.username)).await?;
    tracing::info!(user_id = %user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(State(state): State<UsersState>, Path(id): Path<Uuid>) -> Result<Json<User>, AppError> {
    Ok(Json(load(state.users.as_ref(), id).await?))
}

async fn set_punishment(
    State(state): State<UsersState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetPunishment>,
) -> Result<Json<User>, AppError> {
    let mut user = load(state.users.as_ref(), id).await?;
    user.is_punished = payload.is_punished;

    let user = state.users.save(user).await?;
    tracing::info!(user_id = %user.id, is_punished = user.is_punished, "user punishment changed");
    Ok(Json(user))
}

async fn penalty(State(state): State<UsersState>, Path(id): Path<Uuid>) -> Result<Json<Penalty>, AppError> {
    let amount = state.books.calculate_penalty(id).await?;
    Ok(Json(Penalty { user_id: id, amount }))
}

async fn loan_count(State(state): State<UsersState>, Path(id): Path<Uuid>) -> Result<Json<Loans>, AppError> {
    let count = state.books.count_books_rented_by(id).await?;
    Ok(Json(Loans { user_id: id, count }))
}

async fn remove_loans(State(state): State<UsersState>, Path(id): Path<Uuid>) -> Result<Json<Loans>, AppError> {
    let freed = state.books.remove_user_loans(id).await?;
    Ok(Json(Loans {
        user_id: id,
        count: freed as u64,
    }))
}
