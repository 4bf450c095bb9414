//! Pure lookups over an in-memory collection. All of them are linear scans.

use roster_types::User;

/// Returns the user with exactly this id. Absence is a normal outcome.
pub fn find_by_id<'a>(users: &'a [User], id: &str) -> Option<&'a User> {
    users.iter().find(|u| u.id == id)
}

pub fn find_by_id_mut<'a>(users: &'a mut [User], id: &str) -> Option<&'a mut User> {
    users.iter_mut().find(|u| u.id == id)
}

pub fn position_by_id(users: &[User], id: &str) -> Option<usize> {
    users.iter().position(|u| u.id == id)
}

/// True when some user other than `exclude_id` has exactly this email.
/// Matching is case-sensitive.
pub fn email_exists(users: &[User], email: &str, exclude_id: Option<&str>) -> bool {
    users
        .iter()
        .any(|u| u.email == email && Some(u.id.as_str()) != exclude_id)
}
