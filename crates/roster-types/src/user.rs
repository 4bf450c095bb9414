use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One persisted user. Field order here is the order written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub age: u64,
}

/// The replaceable part of a user, as accepted from a validated request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub email: String,
    pub name: String,
    pub age: u64,
}

impl User {
    /// Creates a user with a freshly generated random id.
    pub fn new(payload: UserPayload) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), payload)
    }

    pub fn with_id(id: impl Into<String>, payload: UserPayload) -> Self {
        Self {
            id: id.into(),
            email: payload.email,
            name: payload.name,
            age: payload.age,
        }
    }

    /// Replaces every field except `id`.
    pub fn apply(&mut self, payload: UserPayload) {
        self.email = payload.email;
        self.name = payload.name;
        self.age = payload.age;
    }
}
