use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

// Applied at signup / profile edit when the form leaves the fields blank.
pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/default-header.jpg";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
  pub id: i32,
  pub username: String,
  pub email: String,
  pub password: String,
  pub image_url: Option<String>,
  pub header_image_url: Option<String>,
  pub bio: Option<String>,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
}

/// Another user as seen by the viewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
  #[serde(skip)]
  pub user_id: i32,
  pub username: String,
  pub image_url: Option<String>,
  pub bio: Option<String>,
  pub following: bool,
}

/// Profile page data: the profile plus its relationship counts.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ProfileDetails {
  #[serde(skip)]
  pub user_id: i32,
  pub username: String,
  pub image_url: Option<String>,
  pub header_image_url: Option<String>,
  pub bio: Option<String>,
  pub created_at: NaiveDateTime,
  pub following: bool,
  pub messages_count: i64,
  pub followers_count: i64,
  pub following_count: i64,
  pub likes_count: i64,
}
