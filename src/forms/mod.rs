use crate::error::Error;

pub mod user;
pub mod message;
pub use self::{
  user::*,
  message::*,
};

/// Collect per-field validation messages into a 422 error.
pub(crate) fn field_errors(errors: Vec<(&str, &str)>) -> Error {
  let mut map = serde_json::Map::new();
  for (field, msg) in errors {
    map.insert(field.to_string(), json!(msg));
  }
  Error::UnprocessableEntity(json!({ "errors": map }))
}
