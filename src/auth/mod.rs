//! Credential Verifier: bearer tokens and password hashing.

mod password;
mod token;

pub use password::{hash_password, verify_password};
pub use token::{AuthContext, Claims, CredentialVerifier, IssuedToken};
