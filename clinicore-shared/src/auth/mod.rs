/// Authentication and authorization
///
/// - `jwt`: Token creation and validation
/// - `password`: Argon2id hashing and verification
/// - `middleware`: Axum middleware injecting [`AuthContext`](middleware::AuthContext)
/// - `authorization`: Capability table and permission checks

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
