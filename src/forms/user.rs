use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::auth::jwt::*;
use crate::models::{User, Profile};

use super::field_errors;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RegisterUser {
  pub username: String,
  pub email: String,
  pub password: String,
  pub image_url: Option<String>,
}

impl RegisterUser {
  pub fn validate(&self) -> Result<()> {
    let mut errors = Vec::new();
    if self.username.trim().is_empty() {
      errors.push(("username", "This field is required."));
    }
    if self.email.trim().is_empty() {
      errors.push(("email", "This field is required."));
    } else if !is_valid_email(&self.email) {
      errors.push(("email", "Invalid email address."));
    }
    if self.password.chars().count() < MIN_PASSWORD_LEN {
      errors.push(("password", "Field must be at least 6 characters long."));
    }
    if errors.is_empty() {
      Ok(())
    } else {
      Err(field_errors(errors))
    }
  }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LoginUser {
  pub username: String,
  pub password: String,
}

impl LoginUser {
  pub fn validate(&self) -> Result<()> {
    let mut errors = Vec::new();
    if self.username.trim().is_empty() {
      errors.push(("username", "This field is required."));
    }
    if self.password.chars().count() < MIN_PASSWORD_LEN {
      errors.push(("password", "Field must be at least 6 characters long."));
    }
    if errors.is_empty() {
      Ok(())
    } else {
      Err(field_errors(errors))
    }
  }
}

/// Profile edit.  The account password is required to confirm the change.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateUser {
  pub username: Option<String>,
  pub email: Option<String>,
  pub image_url: Option<String>,
  pub header_image_url: Option<String>,
  pub bio: Option<String>,
  pub password: String,
}

impl UpdateUser {
  pub fn validate(&self) -> Result<()> {
    let mut errors = Vec::new();
    if let Some(ref email) = self.email {
      if !email.trim().is_empty() && !is_valid_email(email) {
        errors.push(("email", "Invalid email address."));
      }
    }
    if self.password.chars().count() < MIN_PASSWORD_LEN {
      errors.push(("password", "Field must be at least 6 characters long."));
    }
    if errors.is_empty() {
      Ok(())
    } else {
      Err(field_errors(errors))
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileList {
  pub profiles: Vec<Profile>,
  pub profiles_count: usize,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileRequest {
  pub q: Option<String>,
  pub limit: Option<i64>,
  pub offset: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
  pub username: String,
  pub email: String,
  pub image_url: Option<String>,
  pub header_image_url: Option<String>,
  pub bio: Option<String>,
  pub token: String,
}

impl TryFrom<User> for UserResponse {
  type Error = Error;

  fn try_from(user: User) -> Result<Self> {
    let token = user.generate_jwt()?;
    Ok(UserResponse {
      username: user.username,
      email: user.email,
      image_url: user.image_url,
      header_image_url: user.header_image_url,
      bio: user.bio,
      token,
    })
  }
}

fn is_valid_email(email: &str) -> bool {
  let mut parts = email.trim().splitn(2, '@');
  let local = parts.next().unwrap_or("");
  let domain = match parts.next() {
    Some(domain) => domain,
    None => return false,
  };
  if local.is_empty() || domain.is_empty() {
    return false;
  }
  // domain needs at least one interior dot.
  match domain.find('.') {
    Some(idx) => idx > 0 && idx + 1 < domain.len() && !domain.contains('@'),
    None => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_shape_checks() {
    assert!(is_valid_email("test@test.com"));
    assert!(is_valid_email("a.b+c@sub.example.org"));
    assert!(!is_valid_email("plainaddress"));
    assert!(!is_valid_email("@no-local.com"));
    assert!(!is_valid_email("no-domain@"));
    assert!(!is_valid_email("no-tld@domain"));
    assert!(!is_valid_email("dot@.com"));
  }

  #[test]
  fn register_requires_all_fields() {
    let form = RegisterUser::default();
    let err = form.validate().unwrap_err();
    match err {
      Error::UnprocessableEntity(val) => {
        let errors = &val["errors"];
        assert_eq!(errors["username"], "This field is required.");
        assert_eq!(errors["email"], "This field is required.");
        assert_eq!(errors["password"], "Field must be at least 6 characters long.");
      },
      other => panic!("expected 422, got {:?}", other),
    }
  }

  #[test]
  fn register_accepts_valid_input() {
    let form = RegisterUser {
      username: "testuser".to_string(),
      email: "test@test.com".to_string(),
      password: "password".to_string(),
      image_url: None,
    };
    assert!(form.validate().is_ok());
  }

  #[test]
  fn short_password_is_rejected() {
    let form = LoginUser {
      username: "testuser".to_string(),
      password: "12345".to_string(),
    };
    assert!(form.validate().is_err());
  }

  #[test]
  fn update_validates_email_only_when_given() {
    let mut form = UpdateUser {
      password: "password".to_string(),
      ..Default::default()
    };
    assert!(form.validate().is_ok());

    form.email = Some("not-an-email".to_string());
    assert!(form.validate().is_err());

    form.email = Some("test@test.com".to_string());
    assert!(form.validate().is_ok());
  }
}
