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

/// post new message
#[post("/messages", wrap="Auth::required()")]
async fn store_message(
  auth: AuthData,
  db: web::Data<DbService>,
  msg: web::Json<CreateMessage>,
) -> Result<HttpResponse, Error> {
  let msg = msg.into_inner();
  msg.validate()?;

  let message_id = db.message.store(&auth, &msg).await?;
  debug!("store message: user={} id={}", auth.user_id, message_id);

  match db.message.get_by_id(auth.user_id, message_id).await? {
    Some(details) => Ok(HttpResponse::Created().json(details)),
    _ => Ok(HttpResponse::InternalServerError().json("Failed to get message info.")),
  }
}

/// get message by id
#[get("/messages/{id}", wrap="Auth::optional()")]
async fn get_message(
  auth: Option<AuthData>,
  db: web::Data<DbService>,
  id: web::Path<i32>,
) -> Result<HttpResponse, Error> {
  match db.message.get_by_id(viewer_id(&auth), *id).await? {
    Some(details) => Ok(HttpResponse::Ok().json(details)),
    _ => Ok(HttpResponse::NotFound().finish()),
  }
}

/// delete own message
#[delete("/messages/{id}", wrap="Auth::required()")]
async fn delete_message(
  auth: AuthData,
  db: web::Data<DbService>,
  id: web::Path<i32>,
) -> Result<HttpResponse, Error> {
  let message = match db.message.get_message(*id).await? {
    Some(message) => message,
    _ => {
      return Ok(HttpResponse::NotFound().finish());
    }
  };

  if message.user_id != auth.user_id {
    return Ok(HttpResponse::Forbidden().json(json!({
      "error": "Access unauthorized.",
    })));
  }

  db.message.delete(message.id).await?;
  Ok(HttpResponse::NoContent().finish())
}

/// like a message
#[post("/messages/{id}/like", wrap="Auth::required()")]
async fn like(
  auth: AuthData,
  db: web::Data<DbService>,
  id: web::Path<i32>,
) -> Result<HttpResponse, Error> {
  let message = match db.message.get_message(*id).await? {
    Some(message) => message,
    _ => {
      return Ok(HttpResponse::NotFound().finish());
    }
  };

  if message.user_id == auth.user_id {
    return Ok(HttpResponse::UnprocessableEntity().json(json!({
      "error": "You cannot like your own message.",
    })));
  }

  db.message.like(&auth, message.id).await?;

  match db.message.get_by_id(auth.user_id, message.id).await? {
    Some(details) => Ok(HttpResponse::Ok().json(details)),
    _ => Ok(HttpResponse::NotFound().finish()),
  }
}

/// remove a like
#[delete("/messages/{id}/like", wrap="Auth::required()")]
async fn unlike(
  auth: AuthData,
  db: web::Data<DbService>,
  id: web::Path<i32>,
) -> Result<HttpResponse, Error> {
  let message = match db.message.get_message(*id).await? {
    Some(message) => message,
    _ => {
      return Ok(HttpResponse::NotFound().finish());
    }
  };

  db.message.unlike(&auth, message.id).await?;

  match db.message.get_by_id(auth.user_id, message.id).await? {
    Some(details) => Ok(HttpResponse::Ok().json(details)),
    _ => Ok(HttpResponse::NotFound().finish()),
  }
}

/// messages written by one user
#[get("/profiles/{username}/messages", wrap="Auth::optional()")]
async fn user_messages(
  auth: Option<AuthData>,
  db: web::Data<DbService>,
  username: web::Path<String>,
  req: web::Query<MessagesRequest>,
) -> Result<HttpResponse, Error> {
  let user = match db.user.get_by_username(&username).await? {
    Some(user) => user,
    _ => {
      return Ok(HttpResponse::NotFound().finish());
    }
  };

  let messages = db.message.by_user(viewer_id(&auth), user.id, &req).await?;
  Ok(HttpResponse::Ok().json(MessageList {
    messages_count: messages.len(),
    messages,
  }))
}

/// messages one user has liked
#[get("/profiles/{username}/likes", wrap="Auth::required()")]
async fn user_likes(
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

  let messages = db.message.liked_by(auth.user_id, user.id).await?;
  Ok(HttpResponse::Ok().json(MessageList {
    messages_count: messages.len(),
    messages,
  }))
}

/// home feed: own messages plus followed users
#[get("/feed", wrap="Auth::required()")]
async fn feed(
  auth: AuthData,
  db: web::Data<DbService>,
  req: web::Query<FeedRequest>,
) -> Result<HttpResponse, Error> {
  let messages = db.message.feed(&auth, &req).await?;
  Ok(HttpResponse::Ok().json(MessageList {
    messages_count: messages.len(),
    messages,
  }))
}

#[derive(Debug, Clone, Default)]
pub struct MessageService {
}

impl super::Service for MessageService {
  fn load_app_config(&mut self, _config: &AppConfig, _prefix: &str) -> Result<()> {
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .data(self.clone())
      .service(store_message)
      .service(get_message)
      .service(delete_message)
      .service(like)
      .service(unlike)
      .service(user_messages)
      .service(user_likes)
      .service(feed);
  }
}

pub fn new_factory() -> MessageService {
  Default::default()
}
