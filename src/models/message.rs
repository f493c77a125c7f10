use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

use crate::models::*;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
  pub id: i32,
  pub user_id: i32,
  pub text: String,
  pub created_at: NaiveDateTime,
}

/// A message joined with its author and the viewer's like state.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageDetails {
  pub id: i32,
  pub text: String,
  pub created_at: NaiveDateTime,
  pub liked: bool,
  pub likes_count: i64,
  pub author: user::Profile,
}
