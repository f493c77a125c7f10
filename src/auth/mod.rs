pub mod jwt;
pub use jwt::*;

pub mod pass;
