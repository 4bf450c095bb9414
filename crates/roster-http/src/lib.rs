mod protocol;

pub use http::{header, Method, Request, Response, StatusCode};
pub use protocol::*;
