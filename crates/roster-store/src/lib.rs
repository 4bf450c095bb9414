mod ops;
mod store;

pub use ops::{email_exists, find_by_id, find_by_id_mut, position_by_id};
pub use store::{Store, StoreError, UserStore};
