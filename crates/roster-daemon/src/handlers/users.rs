//! The five user operations. Each one loads the collection fresh, works on it
//! in memory, and saves it back only if it changed something. Validation and
//! conflict failures return before any write.

use roster_http::StatusCode;
use roster_store::{email_exists, find_by_id, find_by_id_mut, position_by_id};
use roster_types::{
    User, UserResponse, UsersResponse, ERR_EMAIL_TAKEN, ERR_EMAIL_TAKEN_BY_OTHER,
    ERR_USER_NOT_FOUND, MSG_ADDED, MSG_DELETED, MSG_RECEIVED, MSG_UPDATED,
};
use tracing::info;

use super::{ApiError, HandlerContext, Reply};
use crate::validation::{parse_body, validate_id, validate_user_payload};

pub fn handle_list(ctx: &HandlerContext) -> Result<Reply, ApiError> {
    let users = ctx.store.load()?;
    Reply::json(StatusCode::OK, &UsersResponse::new(MSG_RECEIVED, users))
}

pub fn handle_get(ctx: &HandlerContext, id: &str) -> Result<Reply, ApiError> {
    let users = ctx.store.load()?;
    let user = find_by_id(&users, id).ok_or(ApiError::NotFound(ERR_USER_NOT_FOUND))?;
    Reply::json(StatusCode::OK, &UserResponse::new(MSG_RECEIVED, user.clone()))
}

pub fn handle_create(ctx: &HandlerContext, body: &[u8]) -> Result<Reply, ApiError> {
    let payload = validate_user_payload(&parse_body(body)?)?;

    let mut users = ctx.store.load()?;
    if email_exists(&users, &payload.email, None) {
        return Err(ApiError::Conflict(ERR_EMAIL_TAKEN));
    }

    let user = User::new(payload);
    users.push(user.clone());
    ctx.store.save(&users)?;

    info!("Created user {}", user.id);
    Reply::json(StatusCode::CREATED, &UserResponse::new(MSG_ADDED, user))
}

pub fn handle_update(ctx: &HandlerContext, id: &str, body: &[u8]) -> Result<Reply, ApiError> {
    let payload = validate_user_payload(&parse_body(body)?)?;
    let id = validate_id(id)?;

    let mut users = ctx.store.load()?;
    if email_exists(&users, &payload.email, Some(id)) {
        return Err(ApiError::Conflict(ERR_EMAIL_TAKEN_BY_OTHER));
    }

    let user = find_by_id_mut(&mut users, id).ok_or(ApiError::NotFound(ERR_USER_NOT_FOUND))?;
    user.apply(payload);
    let updated = user.clone();
    ctx.store.save(&users)?;

    info!("Updated user {}", updated.id);
    Reply::json(StatusCode::OK, &UserResponse::new(MSG_UPDATED, updated))
}

pub fn handle_delete(ctx: &HandlerContext, id: &str) -> Result<Reply, ApiError> {
    let id = validate_id(id)?;

    let mut users = ctx.store.load()?;
    let index = position_by_id(&users, id).ok_or(ApiError::NotFound(ERR_USER_NOT_FOUND))?;
    let deleted = users.remove(index);
    ctx.store.save(&users)?;

    info!("Deleted user {}", deleted.id);
    Reply::json(StatusCode::OK, &UserResponse::new(MSG_DELETED, deleted))
}
