//! Administrator session layer: JWT issuance plus actix-web middleware
//! enforcing it. Ambient plumbing grounded in the teacher's
//! `router-api/src/api/users` module — not a new WAF feature.

pub mod middleware;
pub mod token;

pub use middleware::{JwtAuth, RoleAuth};
pub use token::{can_modify_user, AuthConfig, Claims};
