//! Authentication: password hashing and verification, session token
//! generation and extraction, and the authenticated-request extractor.

pub mod current_user;
pub mod password;
pub mod session;

pub use current_user::CurrentUser;
