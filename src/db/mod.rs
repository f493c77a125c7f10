pub mod util;

mod user;
mod follow;
mod message;
pub use self::{
  user::*,
  follow::*,
  message::*,
};

mod service;
pub use service::*;
