pub mod client;
pub mod session;

pub use client::{Identity, IdentityClient};
pub use session::{AdminUser, AuthUser};
