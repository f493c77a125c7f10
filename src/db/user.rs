use tokio_postgres::Row;

use crate::error::*;

use crate::auth::pass;
use crate::models::*;
use crate::forms::user::*;
use crate::util::*;

use crate::db::*;
use crate::db::util::*;

#[derive(Clone)]
pub struct UserService {
  // gets
  user_by_id: VersionedStatement,
  user_by_username: VersionedStatement,

  // account lifecycle
  insert_user: VersionedStatement,
  update_user: VersionedStatement,
  update_password: VersionedStatement,
  delete_user: VersionedStatement,

  // public profiles
  profile_by_username: VersionedStatement,
  list_profiles: VersionedStatement,
  search_profiles: VersionedStatement,
}

lazy_static! {
  static ref USER_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "users",
      columns: vec![
        column("id"),
        column("username"),
        column("email"),
        column("password"),
        column("image_url"),
        column("header_image_url"),
        column("bio"),
        column("created_at"),
        column("updated_at"),
      ],
    }
  };
}

fn user_from_row(row: &Row) -> User {
  User {
    id: row.get(0),
    username: row.get(1),
    email: row.get(2),
    password: row.get(3),
    image_url: row.get(4),
    header_image_url: row.get(5),
    bio: row.get(6),
    created_at: row.get(7),
    updated_at: row.get(8),
  }
}

fn user_from_opt_row(row: &Option<Row>) -> Option<User> {
  if let Some(ref row) = row {
    Some(user_from_row(row))
  } else {
    None
  }
}

/// Card-sized profile with the viewer's follow flag as $1.
pub(super) static PROFILE_SELECT: &'static str = r#"
SELECT u.id, u.username, u.image_url, u.bio,
  EXISTS(SELECT 1 FROM follows
    WHERE user_being_followed_id = u.id AND user_following_id = $1) AS Following
FROM users u
"#;

pub(super) fn profile_from_row(row: &Row) -> Profile {
  Profile {
    user_id: row.get(0),
    username: row.get(1),
    image_url: row.get(2),
    bio: row.get(3),
    following: row.get(4),
  }
}

static PROFILE_DETAILS_SELECT: &'static str = r#"
SELECT u.id, u.username, u.image_url, u.header_image_url, u.bio, u.created_at,
  EXISTS(SELECT 1 FROM follows
    WHERE user_being_followed_id = u.id AND user_following_id = $1) AS Following,
  (SELECT COUNT(*) FROM messages WHERE user_id = u.id) AS MessagesCount,
  (SELECT COUNT(*) FROM follows WHERE user_being_followed_id = u.id) AS FollowersCount,
  (SELECT COUNT(*) FROM follows WHERE user_following_id = u.id) AS FollowingCount,
  (SELECT COUNT(*) FROM likes WHERE user_id = u.id) AS LikesCount
FROM users u
"#;

fn profile_details_from_row(row: &Row) -> ProfileDetails {
  ProfileDetails {
    user_id: row.get(0),
    username: row.get(1),
    image_url: row.get(2),
    header_image_url: row.get(3),
    bio: row.get(4),
    created_at: row.get(5),
    following: row.get(6),
    messages_count: row.get(7),
    followers_count: row.get(8),
    following_count: row.get(9),
    likes_count: row.get(10),
  }
}

impl UserService {
  pub fn new(cl: SharedClient) -> Result<UserService> {
    let select = USER_COLUMNS.build_select_query(false);
    // Build user_by_* queries
    let user_by_id = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE id = $1"#, select))?;
    let user_by_username = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE username = $1"#, select))?;

    // account lifecycle queries
    let insert_user = VersionedStatement::new(cl.clone(),
        &format!(r#"INSERT INTO users(username, email, password, image_url)
        VALUES($1, $2, $3, $4) RETURNING {}"#, USER_COLUMNS.get_columns(false)))?;
    let update_user = VersionedStatement::new(cl.clone(),
        &format!(r#"UPDATE users SET username = $2, email = $3, image_url = $4,
        header_image_url = $5, bio = $6, updated_at = now()
        WHERE id = $1 RETURNING {}"#, USER_COLUMNS.get_columns(false)))?;
    let update_password = VersionedStatement::new(cl.clone(),
        r#"UPDATE users SET password = $2, updated_at = now() WHERE id = $1"#)?;
    let delete_user = VersionedStatement::new(cl.clone(),
        r#"DELETE FROM users WHERE id = $1"#)?;

    // profile queries
    let profile_by_username = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE u.username = $2"#, PROFILE_DETAILS_SELECT))?;
    let list_profiles = VersionedStatement::new(cl.clone(),
        &format!(r#"{} ORDER BY u.id LIMIT $2 OFFSET $3"#, PROFILE_SELECT))?;
    let search_profiles = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE u.username ILIKE $4 ORDER BY u.id LIMIT $2 OFFSET $3"#,
        PROFILE_SELECT))?;

    Ok(UserService {
      user_by_id,
      user_by_username,

      insert_user,
      update_user,
      update_password,
      delete_user,

      profile_by_username,
      list_profiles,
      search_profiles,
    })
  }

  pub async fn prepare(&self) -> Result<()> {
    self.user_by_id.prepare().await?;
    self.user_by_username.prepare().await?;

    self.insert_user.prepare().await?;
    self.update_user.prepare().await?;
    self.update_password.prepare().await?;
    self.delete_user.prepare().await?;

    self.profile_by_username.prepare().await?;
    self.list_profiles.prepare().await?;
    self.search_profiles.prepare().await?;

    Ok(())
  }

  pub async fn get_by_id(&self, user_id: i32) -> Result<Option<User>> {
    let row = self.user_by_id.query_opt(&[&user_id]).await?;
    Ok(user_from_opt_row(&row))
  }

  pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
    let row = self.user_by_username.query_opt(&[&username]).await?;
    Ok(user_from_opt_row(&row))
  }

  /// Create a new account.  Only the hash of the password is stored and a
  /// missing picture falls back to the stock avatar.
  pub async fn signup(&self, form: &RegisterUser) -> Result<User> {
    let hashed = pass::hash_password(&form.password)?;
    let image_url = or_default(form.image_url.clone(), DEFAULT_IMAGE_URL);
    let row = self.insert_user.query_one(&[
        &form.username, &form.email, &hashed, &image_url
      ]).await?;
    Ok(user_from_row(&row))
  }

  /// Look up a username/password pair.  `None` covers both an unknown
  /// username and a wrong password.
  pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
    let user = match self.get_by_username(username).await? {
      Some(user) => user,
      None => return Ok(None),
    };
    let res = pass::check_password(&user.password, password)?;
    if !res.is_valid {
      return Ok(None);
    }
    if res.needs_update {
      // Rehash password.
      self.update_password(user.id, password).await?;
    }
    Ok(Some(user))
  }

  pub async fn update_password(&self, user_id: i32, password: &str) -> Result<u64> {
    let hashed = pass::hash_password(password)?;
    Ok(self.update_password.execute(&[&user_id, &hashed]).await?)
  }

  /// Apply profile changes and return the stored row.  Blank picture urls
  /// fall back to the stock images, a blank bio clears the field.
  pub async fn update(&self, user: &mut User, req: &UpdateUser) -> Result<User> {
    if let Some(username) = none_if_blank(req.username.clone()) {
      user.username = username;
    }
    if let Some(email) = none_if_blank(req.email.clone()) {
      user.email = email;
    }
    if let Some(image_url) = &req.image_url {
      user.image_url = Some(or_default(Some(image_url.clone()), DEFAULT_IMAGE_URL));
    }
    if let Some(header_image_url) = &req.header_image_url {
      user.header_image_url = Some(or_default(Some(header_image_url.clone()),
        DEFAULT_HEADER_IMAGE_URL));
    }
    if let Some(bio) = &req.bio {
      user.bio = none_if_blank(Some(bio.clone()));
    }
    let row = self.update_user.query_one(&[
        &user.id, &user.username, &user.email,
        &user.image_url, &user.header_image_url, &user.bio
      ]).await?;
    Ok(user_from_row(&row))
  }

  pub async fn delete(&self, user_id: i32) -> Result<u64> {
    Ok(self.delete_user.execute(&[&user_id]).await?)
  }

  pub async fn get_profile(&self, viewer_id: i32, username: &str) -> Result<Option<ProfileDetails>> {
    let row = self.profile_by_username.query_opt(&[&viewer_id, &username]).await?;
    if let Some(ref row) = row {
      Ok(Some(profile_details_from_row(row)))
    } else {
      Ok(None)
    }
  }

  /// User directory, optionally filtered by a username substring.
  pub async fn get_profiles(&self, viewer_id: i32, req: &ProfileRequest) -> Result<Vec<Profile>> {
    let limit = req.limit.unwrap_or(50);
    let offset = req.offset.unwrap_or(0);
    let rows = match none_if_blank(req.q.clone()) {
      Some(q) => {
        let pattern = format!("%{}%", q);
        self.search_profiles.query(&[&viewer_id, &limit, &offset, &pattern]).await?
      },
      None => {
        self.list_profiles.query(&[&viewer_id, &limit, &offset]).await?
      },
    };
    Ok(rows.iter().map(profile_from_row).collect())
  }
}
