pub mod admin;
pub mod routes;

pub use admin::{AdminActionError, AdminActionGuard};
pub use routes::{ProtectedRouteEntry, RouteDecision, RouteTable};
