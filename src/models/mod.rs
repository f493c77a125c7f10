pub mod user;
pub mod message;
pub use self::{
  user::*,
  message::*,
};
