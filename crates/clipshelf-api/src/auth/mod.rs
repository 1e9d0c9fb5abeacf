pub mod jwt;
pub mod models;

pub use jwt::{issue_access_token, JwtValidator};
pub use models::AuthUser;
