use serde::{Deserialize, Serialize};

use chrono::{Duration, Utc};

use jsonwebtoken::{
  encode, Header, EncodingKey,
  decode, DecodingKey,
  Validation
};

use crate::error::*;
use crate::models::User;

/// Placeholder id for anonymous requests.  No real row ever has id 0, so
/// viewer-relative flags (`following`, `liked`) come back false.
pub const ANON_USER_ID: i32 = 0;

#[derive(Debug, Default, Clone)]
pub struct AuthData {
  pub user_id: i32,
  pub token: String,
}

/// Viewer id for handlers with optional authentication.
pub fn viewer_id(auth: &Option<AuthData>) -> i32 {
  auth.as_ref().map(|auth| auth.user_id).unwrap_or(ANON_USER_ID)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub id: i32,
  pub exp: i64,
}

pub trait GenerateJwt {
  fn generate_jwt(&self) -> Result<String>;
}

pub trait DecodeJwt {
  fn decode_jwt(&self) -> Result<AuthData>;
}

impl GenerateJwt for User {
  fn generate_jwt(&self) -> Result<String> {
    let claims = Claims{
      id: self.id,
      exp: (Utc::now() + Duration::days(21)).timestamp(),
    };

    let header = Header::default();
    let secret = &EncodingKey::from_secret(get_secret().as_ref());
    let token = encode(&header, &claims, secret)?;

    Ok(token)
  }
}

impl DecodeJwt for String {
  fn decode_jwt(&self) -> Result<AuthData> {
    let secret = get_secret();
    let secret_key = DecodingKey::from_secret(secret.as_ref());
    let token = decode::<Claims>(&self, &secret_key, &Validation::default())?;
    Ok(AuthData{
      user_id: token.claims.id,
      token: self.to_string(),
    })
  }
}

fn get_secret() -> String {
  dotenv::var("JWT_SECRET")
    .expect("Missing JWT_SECRET environment variable.")
}
