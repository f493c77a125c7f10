use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::models::message::*;

use super::field_errors;

/// Hard cap on message text, enforced here and by the column type.
pub const MAX_MESSAGE_LEN: usize = 140;

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateMessage {
  pub text: String,
}

impl CreateMessage {
  pub fn validate(&self) -> Result<()> {
    let mut errors = Vec::new();
    if self.text.trim().is_empty() {
      errors.push(("text", "This field is required."));
    } else if self.text.chars().count() > MAX_MESSAGE_LEN {
      errors.push(("text", "Field cannot be longer than 140 characters."));
    }
    if errors.is_empty() {
      Ok(())
    } else {
      Err(field_errors(errors))
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageList {
  pub messages: Vec<MessageDetails>,
  pub messages_count: usize,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FeedRequest {
  pub limit: Option<i64>,
  pub offset: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MessagesRequest {
  pub limit: Option<i64>,
  pub offset: Option<i64>,
}
