use log::*;

use std::convert::TryFrom;

use actix_web::{
  get, post, put, delete, web, HttpResponse,
  Error
};

use crate::error::*;
use crate::app::*;
use crate::forms::*;
use crate::auth::AuthData;

use crate::db::DbService;
use crate::auth::pass;

use crate::middleware::Auth;

/// Map a unique violation to the form error for the duplicated column.
fn taken_response(err: &crate::Error) -> Option<HttpResponse> {
  if !err.is_unique_violation() {
    return None;
  }
  let msg = match err.constraint() {
    Some("users_username_key") => "Username already taken.",
    Some("users_email_key") => "Email already taken.",
    _ => "Already taken.",
  };
  Some(HttpResponse::UnprocessableEntity().json(json!({
    "error": msg,
  })))
}

/// login user
#[post("/users/login")]
async fn login(
  db: web::Data<DbService>,
  login: web::Json<LoginUser>,
) -> Result<HttpResponse, Error> {
  let login = login.into_inner();
  login.validate()?;

  match db.user.authenticate(&login.username, &login.password).await? {
    Some(user) => {
      debug!("login: user={}", user.id);
      Ok(HttpResponse::Ok().json(UserResponse::try_from(user)?))
    },
    _ => {
      // Unknown username and wrong password get the same answer.
      Ok(HttpResponse::Unauthorized().json(json!({
        "error": "Invalid credentials.",
      })))
    },
  }
}

/// register new user
#[post("/users")]
async fn register(
  cfg: web::Data<UserService>,
  db: web::Data<DbService>,
  register: web::Json<RegisterUser>,
) -> Result<HttpResponse, Error> {
  if !cfg.allow_register {
    return Ok(HttpResponse::Forbidden().finish());
  }
  let register = register.into_inner();
  register.validate()?;

  match db.user.signup(&register).await {
    Ok(user) => Ok(HttpResponse::Ok().json(UserResponse::try_from(user)?)),
    Err(err) => {
      match taken_response(&err) {
        Some(res) => Ok(res),
        _ => Err(err.into()),
      }
    },
  }
}

/// get current user
#[get("/user", wrap="Auth::required()")]
async fn get_user(
  auth: AuthData,
  db: web::Data<DbService>,
) -> Result<HttpResponse, Error> {
  // Get auth user from database
  match db.user.get_by_id(auth.user_id).await? {
    Some(user) => {
      Ok(HttpResponse::Ok().json(UserResponse::try_from(user)?))
    },
    _ => {
      // account was deleted, token still in the wild.
      Ok(HttpResponse::NotFound().finish())
    }
  }
}

/// update profile.  The account password confirms the change.
#[put("/user", wrap="Auth::required()")]
async fn update(
  auth: AuthData,
  db: web::Data<DbService>,
  form: web::Json<UpdateUser>,
) -> Result<HttpResponse, Error> {
  let form = form.into_inner();
  form.validate()?;

  let mut user = match db.user.get_by_id(auth.user_id).await? {
    Some(user) => user,
    _ => {
      return Ok(HttpResponse::NotFound().finish());
    }
  };

  let res = pass::check_password(&user.password, &form.password)?;
  if !res.is_valid {
    return Ok(HttpResponse::Unauthorized().json(json!({
      "error": "Access unauthorized.",
    })));
  }

  match db.user.update(&mut user, &form).await {
    Ok(user) => Ok(HttpResponse::Ok().json(UserResponse::try_from(user)?)),
    Err(err) => {
      match taken_response(&err) {
        Some(res) => Ok(res),
        _ => Err(err.into()),
      }
    },
  }
}

/// delete own account
#[delete("/user", wrap="Auth::required()")]
async fn delete_user(
  auth: AuthData,
  db: web::Data<DbService>,
) -> Result<HttpResponse, Error> {
  db.user.delete(auth.user_id).await?;
  Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Clone, Default)]
pub struct UserService {
  pub allow_register: bool,
}

impl super::Service for UserService {
  fn load_app_config(&mut self, config: &AppConfig, _prefix: &str) -> Result<()> {
    self.allow_register = config.get_bool("User.allow_register")?.unwrap_or(false);
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .data(self.clone())
      .service(register)
      .service(login)
      .service(update)
      .service(get_user)
      .service(delete_user);
  }
}

pub fn new_factory() -> UserService {
  Default::default()
}
