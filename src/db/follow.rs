use crate::error::*;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

use super::user::{PROFILE_SELECT, profile_from_row};

#[derive(Clone)]
pub struct FollowService {
  follow_user: VersionedStatement,
  unfollow_user: VersionedStatement,
  follow_exists: VersionedStatement,

  followers_of: VersionedStatement,
  following_of: VersionedStatement,
}

lazy_static! {
  static ref FOLLOW_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "follows",
      columns: vec![
        column("user_being_followed_id"),
        column("user_following_id"),
      ],
    }
  };
}

impl FollowService {
  pub fn new(cl: SharedClient) -> Result<FollowService> {
    // (un)follow
    let follow_user = VersionedStatement::new(cl.clone(),
        &FOLLOW_COLUMNS.build_upsert_ignore(
          "(user_being_followed_id, user_following_id)", true))?;
    let unfollow_user = VersionedStatement::new(cl.clone(),
        r#"DELETE FROM follows
        WHERE user_being_followed_id = $1 AND user_following_id = $2"#)?;
    let follow_exists = VersionedStatement::new(cl.clone(),
        r#"SELECT EXISTS(SELECT 1 FROM follows
        WHERE user_being_followed_id = $1 AND user_following_id = $2)"#)?;

    // Build follower/following listings
    let followers_of = VersionedStatement::new(cl.clone(),
        &format!(r#"{} INNER JOIN follows f ON f.user_following_id = u.id
        WHERE f.user_being_followed_id = $2 ORDER BY u.id"#, PROFILE_SELECT))?;
    let following_of = VersionedStatement::new(cl.clone(),
        &format!(r#"{} INNER JOIN follows f ON f.user_being_followed_id = u.id
        WHERE f.user_following_id = $2 ORDER BY u.id"#, PROFILE_SELECT))?;

    Ok(FollowService {
      follow_user,
      unfollow_user,
      follow_exists,

      followers_of,
      following_of,
    })
  }

  pub async fn prepare(&self) -> Result<()> {
    self.follow_user.prepare().await?;
    self.unfollow_user.prepare().await?;
    self.follow_exists.prepare().await?;

    self.followers_of.prepare().await?;
    self.following_of.prepare().await?;
    Ok(())
  }

  /// `user_id` starts following `other_id`.  Repeats are a no-op.
  pub async fn follow(&self, user_id: i32, other_id: i32) -> Result<u64> {
    Ok(self.follow_user.execute(&[&other_id, &user_id]).await?)
  }

  /// `user_id` stops following `other_id`.
  pub async fn unfollow(&self, user_id: i32, other_id: i32) -> Result<u64> {
    Ok(self.unfollow_user.execute(&[&other_id, &user_id]).await?)
  }

  /// True when `user_id` follows `other_id`.
  pub async fn is_following(&self, user_id: i32, other_id: i32) -> Result<bool> {
    let row = self.follow_exists.query_one(&[&other_id, &user_id]).await?;
    Ok(row.get(0))
  }

  /// True when `other_id` follows `user_id`.
  pub async fn is_followed_by(&self, user_id: i32, other_id: i32) -> Result<bool> {
    self.is_following(other_id, user_id).await
  }

  /// Users following `user_id`, with the viewer's own follow flags.
  pub async fn followers(&self, viewer_id: i32, user_id: i32) -> Result<Vec<Profile>> {
    let rows = self.followers_of.query(&[&viewer_id, &user_id]).await?;
    Ok(rows.iter().map(profile_from_row).collect())
  }

  /// Users `user_id` follows, with the viewer's own follow flags.
  pub async fn following(&self, viewer_id: i32, user_id: i32) -> Result<Vec<Profile>> {
    let rows = self.following_of.query(&[&viewer_id, &user_id]).await?;
    Ok(rows.iter().map(profile_from_row).collect())
  }
}
