use log::*;

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::Value as JsonValue;

use libreauth::pass;

use jsonwebtoken::errors::Error as JwtError;

use tokio_postgres::error::{DbError, SqlState};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  // 401
  #[error("unauthorized: {0}")]
  Unauthorized(JsonValue),

  // 403
  #[error("forbidden: {0}")]
  Forbidden(JsonValue),

  // 404
  #[error("not found: {0}")]
  NotFound(JsonValue),

  // 422
  #[error("unprocessable entity: {0}")]
  UnprocessableEntity(JsonValue),

  // 500
  #[error("internal server error")]
  InternalServerError,

  // 400
  #[error("bad request: {0}")]
  BadRequest(String),

  // Json error
  #[error("Json error: {source}")]
  JsonError {
    #[from]
    source: serde_json::Error,
  },

  // Password error
  #[error("Password error: {0}")]
  PasswordError(String),

  #[error("JWT error")]
  JwtError {
    #[from]
    source: JwtError,
  },

  #[error("disconnected: {0}")]
  DisconnectedError(String),

  #[error("postgres error")]
  PgError {
    #[from]
    source: tokio_postgres::error::Error,
  },

  #[error("crossbeam recv error")]
  RecvError {
    #[from]
    source: crossbeam_channel::RecvError,
  },

  #[error("std io error")]
  IOError {
    #[from]
    source: std::io::Error,
  },

  #[error("config error")]
  ConfigError {
    #[from]
    source: config::ConfigError,
  },

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl From<pass::ErrorCode> for Error {
  fn from(code: pass::ErrorCode) -> Self {
    Error::PasswordError(format!("code={:?}", code))
  }
}

impl Error {
  /// True if this wraps a postgres unique-constraint violation (SQLSTATE 23505).
  pub fn is_unique_violation(&self) -> bool {
    match self {
      Error::PgError { source } => {
        source.code() == Some(&SqlState::UNIQUE_VIOLATION)
      },
      _ => false,
    }
  }

  /// Name of the violated constraint, when the server reported one.
  pub fn constraint(&self) -> Option<&str> {
    match self {
      Error::PgError { source } => {
        std::error::Error::source(source)
          .and_then(|e| e.downcast_ref::<DbError>())
          .and_then(|db| db.constraint())
      },
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// the ResponseError trait lets us convert errors to http responses with appropriate data
// https://actix.rs/docs/errors/
impl ResponseError for Error {
  fn error_response(&self) -> HttpResponse {
    match self {
      Error::Unauthorized(ref message) => HttpResponse::Unauthorized().json(message),
      Error::Forbidden(ref message) => {
        HttpResponse::build(StatusCode::FORBIDDEN).json(message)
      },
      Error::NotFound(ref message) => HttpResponse::NotFound().json(message),
      Error::UnprocessableEntity(ref message) => {
        HttpResponse::build(StatusCode::UNPROCESSABLE_ENTITY).json(message)
      },
      Error::BadRequest(ref message) => {
        HttpResponse::build(StatusCode::BAD_REQUEST).json(message)
      },
      Error::DisconnectedError(ref message) => {
        HttpResponse::build(StatusCode::BAD_GATEWAY).json(message)
      },
      ref err => {
        error!("InternalServerError: {:?}", err);
        HttpResponse::InternalServerError().json("Internal Server Error")
      },
    }
  }
}
