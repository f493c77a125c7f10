use tokio_postgres::Row;

use crate::error::*;

use crate::auth::AuthData;
use crate::models::*;
use crate::forms::message::*;

use crate::db::*;
use crate::db::util::*;

#[derive(Clone)]
pub struct MessageService {
  // get one message
  details_by_id: VersionedStatement,
  message_by_id: VersionedStatement,

  // store message
  store_message: VersionedStatement,

  // delete message
  delete_message: VersionedStatement,

  // message listings
  messages_by_user: VersionedStatement,
  get_feed: VersionedStatement,
  liked_by_user: VersionedStatement,

  // (un)like
  like_message: VersionedStatement,
  unlike_message: VersionedStatement,
}

lazy_static! {
  static ref MESSAGE_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "messages",
      columns: vec![
        column("id"),
        column("user_id"),
        column("text"),
        column("created_at"),
      ],
    }
  };

  static ref LIKE_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "likes",
      columns: vec![
        column("user_id"),
        column("message_id"),
      ],
    }
  };
}

fn message_from_row(row: &Row) -> Message {
  Message {
    id: row.get(0),
    user_id: row.get(1),
    text: row.get(2),
    created_at: row.get(3),
  }
}

fn message_details_from_row(row: &Row) -> MessageDetails {
  let id: i32 = row.get(0);
  let text: String = row.get(1);
  let created_at: chrono::NaiveDateTime = row.get(2);
  let liked: bool = row.get(3);
  let likes_count: i64 = row.get(4);
  let user_id: i32 = row.get(5);
  let username: String = row.get(6);
  let image_url: Option<String> = row.get(7);
  let bio: Option<String> = row.get(8);
  let following: bool = row.get(9);

  MessageDetails {
    id,
    text,
    created_at,
    liked,
    likes_count,
    author: Profile {
      user_id,
      username,
      image_url,
      bio,
      following,
    },
  }
}

fn message_details_from_opt_row(row: &Option<Row>) -> Option<MessageDetails> {
  if let Some(ref row) = row {
    Some(message_details_from_row(row))
  } else {
    None
  }
}

static MESSAGE_DETAILS_SELECT: &'static str = r#"
SELECT m.id, m.text, m.created_at,
  EXISTS(SELECT 1 FROM likes WHERE message_id = m.id AND user_id = $1) AS Liked,
  (SELECT COUNT(*) FROM likes WHERE message_id = m.id) AS LikesCount,
  u.id, u.username, u.image_url, u.bio,
  EXISTS(SELECT 1 FROM follows
    WHERE user_being_followed_id = u.id AND user_following_id = $1) AS Following
FROM messages m INNER JOIN users u ON m.user_id = u.id
"#;

static FEED_DETAILS_SELECT: &'static str = r#"
WITH feed_authors(user_id) AS (
  SELECT user_being_followed_id FROM follows WHERE user_following_id = $1
  UNION SELECT $1::integer
)
SELECT m.id, m.text, m.created_at,
  EXISTS(SELECT 1 FROM likes WHERE message_id = m.id AND user_id = $1) AS Liked,
  (SELECT COUNT(*) FROM likes WHERE message_id = m.id) AS LikesCount,
  u.id, u.username, u.image_url, u.bio,
  EXISTS(SELECT 1 FROM follows
    WHERE user_being_followed_id = u.id AND user_following_id = $1) AS Following
FROM feed_authors f INNER JOIN messages m ON m.user_id = f.user_id
  INNER JOIN users u ON m.user_id = u.id
"#;

impl MessageService {
  pub fn new(cl: SharedClient) -> Result<MessageService> {
    // Build message_by_id queries
    let details_by_id = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE m.id = $2"#, MESSAGE_DETAILS_SELECT))?;
    let message_by_id = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE id = $1"#, MESSAGE_COLUMNS.build_select_query(false)))?;

    // store message query
    let store_message = VersionedStatement::new(cl.clone(),
        r#"INSERT INTO messages(user_id, text) VALUES($1, $2) RETURNING id"#)?;

    // delete message query
    let delete_message = VersionedStatement::new(cl.clone(),
        r#"DELETE FROM messages WHERE id = $1"#)?;

    // Build listing queries
    let messages_by_user = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE m.user_id = $2 ORDER BY m.id DESC LIMIT $3 OFFSET $4"#,
        MESSAGE_DETAILS_SELECT))?;
    let get_feed = VersionedStatement::new(cl.clone(),
        &format!(r#"{} ORDER BY m.id DESC LIMIT $2 OFFSET $3"#,
        FEED_DETAILS_SELECT))?;
    let liked_by_user = VersionedStatement::new(cl.clone(),
        &format!(r#"{} INNER JOIN likes l ON l.message_id = m.id
        WHERE l.user_id = $2 ORDER BY l.id DESC"#, MESSAGE_DETAILS_SELECT))?;

    // (un)like
    let like_message = VersionedStatement::new(cl.clone(),
        &LIKE_COLUMNS.build_upsert_ignore("(user_id, message_id)", true))?;
    let unlike_message = VersionedStatement::new(cl.clone(),
        "DELETE FROM likes WHERE user_id = $1 AND message_id = $2")?;

    Ok(MessageService {
      details_by_id,
      message_by_id,

      store_message,
      delete_message,

      messages_by_user,
      get_feed,
      liked_by_user,

      like_message,
      unlike_message,
    })
  }

  pub async fn prepare(&self) -> Result<()> {
    self.details_by_id.prepare().await?;
    self.message_by_id.prepare().await?;

    self.store_message.prepare().await?;
    self.delete_message.prepare().await?;

    self.messages_by_user.prepare().await?;
    self.get_feed.prepare().await?;
    self.liked_by_user.prepare().await?;

    self.like_message.prepare().await?;
    self.unlike_message.prepare().await?;
    Ok(())
  }

  pub async fn get_by_id(&self, viewer_id: i32, message_id: i32) -> Result<Option<MessageDetails>> {
    let row = self.details_by_id.query_opt(&[&viewer_id, &message_id]).await?;
    Ok(message_details_from_opt_row(&row))
  }

  /// Bare row without author or like details.  Used for ownership checks.
  pub async fn get_message(&self, message_id: i32) -> Result<Option<Message>> {
    let row = self.message_by_id.query_opt(&[&message_id]).await?;
    if let Some(ref row) = row {
      Ok(Some(message_from_row(row)))
    } else {
      Ok(None)
    }
  }

  pub async fn store(&self, auth: &AuthData, msg: &CreateMessage) -> Result<i32> {
    let row = self.store_message.query_one(&[&auth.user_id, &msg.text]).await?;
    Ok(row.get(0))
  }

  pub async fn delete(&self, message_id: i32) -> Result<u64> {
    Ok(self.delete_message.execute(&[&message_id]).await?)
  }

  /// Messages written by one user, newest first.
  pub async fn by_user(&self, viewer_id: i32, user_id: i32, req: &MessagesRequest) -> Result<Vec<MessageDetails>> {
    let limit = req.limit.unwrap_or(100);
    let offset = req.offset.unwrap_or(0);
    let rows = self.messages_by_user.query(&[&viewer_id, &user_id, &limit, &offset]).await?;
    Ok(rows.iter().map(message_details_from_row).collect())
  }

  /// Messages from followed users plus the user's own, newest first.
  pub async fn feed(&self, auth: &AuthData, req: &FeedRequest) -> Result<Vec<MessageDetails>> {
    let limit = req.limit.unwrap_or(100);
    let offset = req.offset.unwrap_or(0);
    let rows = self.get_feed.query(&[&auth.user_id, &limit, &offset]).await?;
    Ok(rows.iter().map(message_details_from_row).collect())
  }

  /// Messages `user_id` has liked, most recent like first.
  pub async fn liked_by(&self, viewer_id: i32, user_id: i32) -> Result<Vec<MessageDetails>> {
    let rows = self.liked_by_user.query(&[&viewer_id, &user_id]).await?;
    Ok(rows.iter().map(message_details_from_row).collect())
  }

  /// Repeats are a no-op.
  pub async fn like(&self, auth: &AuthData, message_id: i32) -> Result<u64> {
    Ok(self.like_message.execute(&[&auth.user_id, &message_id]).await?)
  }

  pub async fn unlike(&self, auth: &AuthData, message_id: i32) -> Result<u64> {
    Ok(self.unlike_message.execute(&[&auth.user_id, &message_id]).await?)
  }
}
