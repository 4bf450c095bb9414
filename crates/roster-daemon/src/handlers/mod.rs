use roster_http::StatusCode;
use roster_store::{StoreError, UserStore};
use roster_types::ERR_INTERNAL;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::router::Route;
use crate::validation::ValidationError;

mod users;

pub use users::{handle_create, handle_delete, handle_get, handle_list, handle_update};

/// State shared by every request. The store is the only resource handlers touch.
pub struct HandlerContext {
    pub store: Box<dyn UserStore>,
}

impl HandlerContext {
    pub fn new(store: impl UserStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }
}

/// A status plus JSON body, ready to be framed.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Result<Self, ApiError> {
        Ok(Self {
            status,
            body: serde_json::to_value(body)?,
        })
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the caller. Server-side failures are reduced to a
    /// generic message; the detail only goes to the log.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Storage(_) | ApiError::Encode(_) => ERR_INTERNAL.to_string(),
            other => other.to_string(),
        }
    }

    pub fn into_reply(self) -> Reply {
        if self.status().is_server_error() {
            error!("Request failed: {}", self);
        }
        Reply {
            status: self.status(),
            body: serde_json::json!({ "error": self.public_message() }),
        }
    }
}

/// Runs one matched route to completion, including any load and save.
pub fn handle_route(ctx: &HandlerContext, route: Route, body: &[u8]) -> Reply {
    let result = match route {
        Route::ListUsers => handle_list(ctx),
        Route::GetUser(id) => handle_get(ctx, &id),
        Route::CreateUser => handle_create(ctx, body),
        Route::UpdateUser(id) => handle_update(ctx, &id, body),
        Route::DeleteUser(id) => handle_delete(ctx, &id),
    };

    result.unwrap_or_else(ApiError::into_reply)
}
