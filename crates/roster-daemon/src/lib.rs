pub mod handlers;
pub mod logging;
pub mod router;
pub mod server;
pub mod validation;

pub use server::DaemonServer;
