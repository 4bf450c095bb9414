use serde::{Deserialize, Serialize};

use crate::User;

// ============================================================================
// Messages
// ============================================================================

pub const MSG_RECEIVED: &str = "Request received successfully";
pub const MSG_ADDED: &str = "User added successfully";
pub const MSG_UPDATED: &str = "User updated successfully";
pub const MSG_DELETED: &str = "User deleted successfully";
pub const MSG_ROUTE_NOT_FOUND: &str = "Route not found";

pub const ERR_INVALID_FIELDS: &str = "Request contains invalid fields";
pub const ERR_INVALID_EMAIL: &str = "Valid email is required";
pub const ERR_INVALID_NAME: &str = "Name is required and must be a non-empty string";
pub const ERR_INVALID_AGE: &str = "Age is required, must be a number, and greater than zero";
pub const ERR_MISSING_ID: &str = "Id parameter is required";
pub const ERR_BODY_NOT_OBJECT: &str = "Request body must be a JSON object";
pub const ERR_EMAIL_TAKEN: &str = "User with the email already exists";
pub const ERR_EMAIL_TAKEN_BY_OTHER: &str = "User with the same email already exists";
pub const ERR_USER_NOT_FOUND: &str = "User not found";
pub const ERR_INTERNAL: &str = "Internal Server Error";
pub const ERR_BAD_REQUEST: &str = "Bad request";
pub const ERR_PAYLOAD_TOO_LARGE: &str = "Payload too large";

// ============================================================================
// Success envelopes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    pub message: String,
    pub users: Vec<User>,
}

impl UsersResponse {
    pub fn new(message: impl Into<String>, users: Vec<User>) -> Self {
        Self {
            message: message.into(),
            users,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

impl UserResponse {
    pub fn new(message: impl Into<String>, user: User) -> Self {
        Self {
            message: message.into(),
            user,
        }
    }
}

// ============================================================================
// Failure envelopes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body for requests that match no route; distinct from a missing user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteNotFoundResponse {
    pub message: String,
}

impl Default for RouteNotFoundResponse {
    fn default() -> Self {
        Self {
            message: MSG_ROUTE_NOT_FOUND.to_string(),
        }
    }
}
