use log::*;

use actix_web::{
  get, post, delete, web, HttpResponse,
  Error
};

use crate::error::*;
use crate::app::*;
use crate::auth::{AuthData, viewer_id};
use crate::forms::*;

use crate::db::DbService;

use crate::middleware::Auth;

/// user directory, with optional username search
#[get("/profiles", wrap="Auth::optional()")]
async fn list(
  auth: Option<AuthData>,
  db: web::Data<DbService>,
  req: web::Query<ProfileRequest>,
) -> Result<HttpResponse, Error> {
  let profiles = db.user.get_profiles(viewer_id(&auth), &req).await?;

  Ok(HttpResponse::Ok().json(ProfileList {
    profiles_count: profiles.len(),
    profiles,
  }))
}

/// get profile by username
#[get("/profiles/{username}", wrap="Auth::optional()")]
async fn get_profile(
  auth: Option<AuthData>,
  db: web::Data<DbService>,
  username: web::Path<String>,
) -> Result<HttpResponse, Error> {
  match db.user.get_profile(viewer_id(&auth), &username).await? {
    Some(profile) => Ok(HttpResponse::Ok().json(profile)),
    _ => Ok(HttpResponse::NotFound().finish()),
  }
}

/// list users following this profile
#[get("/profiles/{username}/followers", wrap="Auth::required()")]
async fn followers(
  auth: AuthData,
  db: web::Data<DbService>,
  username: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let user = match db.user.get_by_username(&username).await? {
    Some(user) => user,
    _ => {
      return Ok(HttpResponse::NotFound().finish());
    }
  };

  let profiles = db.follow.followers(auth.user_id, user.id).await?;
  Ok(HttpResponse::Ok().json(ProfileList {
    profiles_count: profiles.len(),
    profiles,
  }))
}

/// list users this profile follows
#[get("/profiles/{username}/following", wrap="Auth::required()")]
async fn following(
  auth: AuthData,
  db: web::Data<DbService>,
  username: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let user = match db.user.get_by_username(&username).await? {
    Some(user) => user,
    _ => {
      return Ok(HttpResponse::NotFound().finish());
    }
  };

  let profiles = db.follow.following(auth.user_id, user.id).await?;
  Ok(HttpResponse::Ok().json(ProfileList {
    profiles_count: profiles.len(),
    profiles,
  }))
}

/// follow a user
#[post("/profiles/{username}/follow", wrap="Auth::required()")]
async fn follow(
  auth: AuthData,
  db: web::Data<DbService>,
  username: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let user = match db.user.get_by_username(&username).await? {
    Some(user) => user,
    _ => {
      return Ok(HttpResponse::NotFound().finish());
    }
  };

  debug!("follow: {} -> {}", auth.user_id, user.id);
  db.follow.follow(auth.user_id, user.id).await?;

  match db.user.get_profile(auth.user_id, &username).await? {
    Some(profile) => Ok(HttpResponse::Ok().json(profile)),
    _ => Ok(HttpResponse::NotFound().finish()),
  }
}

/// unfollow a user
#[delete("/profiles/{username}/follow", wrap="Auth::required()")]
async fn unfollow(
  auth: AuthData,
  db: web::Data<DbService>,
  username: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let user = match db.user.get_by_username(&username).await? {
    Some(user) => user,
    _ => {
      return Ok(HttpResponse::NotFound().finish());
    }
  };

  debug!("unfollow: {} -> {}", auth.user_id, user.id);
  db.follow.unfollow(auth.user_id, user.id).await?;

  match db.user.get_profile(auth.user_id, &username).await? {
    Some(profile) => Ok(HttpResponse::Ok().json(profile)),
    _ => Ok(HttpResponse::NotFound().finish()),
  }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileService {
}

impl super::Service for ProfileService {
  fn load_app_config(&mut self, _config: &AppConfig, _prefix: &str) -> Result<()> {
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .data(self.clone())
      .service(list)
      .service(get_profile)
      .service(followers)
      .service(following)
      .service(follow)
      .service(unfollow);
  }
}

pub fn new_factory() -> ProfileService {
  Default::default()
}
