mod common;

use tokio_postgres::error::SqlState;

use fast_microblog::auth::{AuthData, ANON_USER_ID};
use fast_microblog::db::DbService;
use fast_microblog::forms::*;
use fast_microblog::models::*;

fn register_form(username: &str) -> RegisterUser {
  RegisterUser {
    username: username.to_string(),
    email: format!("{}@test.com", username),
    password: "password6".to_string(),
    image_url: None,
  }
}

fn auth_for(user: &User) -> AuthData {
  AuthData { user_id: user.id, ..Default::default() }
}

async fn new_db(url: &str) -> DbService {
  let db = DbService::new(url).expect("Failed to init db.");
  db.prepare().await.expect("Failed to prepare statements.");
  db
}

#[actix_rt::test]
#[ignore]
async fn signup_hashes_password_and_applies_defaults() {
  let (_guard, client, url) = common::setup().await;
  let db = new_db(&url).await;

  let alice = db.user.signup(&register_form("alice")).await.unwrap();
  assert!(alice.id > 0);
  assert_eq!(alice.image_url.as_deref(), Some(DEFAULT_IMAGE_URL));
  assert!(alice.password.starts_with("$argon2"));

  let row = client.query_one(
    "SELECT password FROM users WHERE username = 'alice'", &[]).await.unwrap();
  let stored: String = row.get(0);
  assert_eq!(stored, alice.password);

  // an explicit image is kept
  let mut form = register_form("bob");
  form.image_url = Some("/me.png".to_string());
  let bob = db.user.signup(&form).await.unwrap();
  assert_eq!(bob.image_url.as_deref(), Some("/me.png"));
}

#[actix_rt::test]
#[ignore]
async fn duplicate_username_or_email_is_unique_violation() {
  let (_guard, _client, url) = common::setup().await;
  let db = new_db(&url).await;

  db.user.signup(&register_form("alice")).await.unwrap();

  let mut dup_name = register_form("alice");
  dup_name.email = "other@test.com".to_string();
  let err = db.user.signup(&dup_name).await.unwrap_err();
  assert!(err.is_unique_violation());
  assert_eq!(err.constraint(), Some("users_username_key"));

  let mut dup_email = register_form("alice2");
  dup_email.email = "alice@test.com".to_string();
  let err = db.user.signup(&dup_email).await.unwrap_err();
  assert!(err.is_unique_violation());
  assert_eq!(err.constraint(), Some("users_email_key"));
}

#[actix_rt::test]
#[ignore]
async fn authenticate_checks_username_and_password() {
  let (_guard, _client, url) = common::setup().await;
  let db = new_db(&url).await;

  let alice = db.user.signup(&register_form("alice")).await.unwrap();

  let user = db.user.authenticate("alice", "password6").await.unwrap();
  assert_eq!(user.map(|u| u.id), Some(alice.id));

  assert!(db.user.authenticate("alice", "wrong-password").await.unwrap().is_none());
  assert!(db.user.authenticate("nobody", "password6").await.unwrap().is_none());
}

#[actix_rt::test]
#[ignore]
async fn follow_state_is_tracked_both_ways() {
  let (_guard, _client, url) = common::setup().await;
  let db = new_db(&url).await;

  let alice = db.user.signup(&register_form("alice")).await.unwrap();
  let bob = db.user.signup(&register_form("bob")).await.unwrap();

  assert!(!db.follow.is_following(alice.id, bob.id).await.unwrap());
  assert!(!db.follow.is_followed_by(bob.id, alice.id).await.unwrap());

  db.follow.follow(alice.id, bob.id).await.unwrap();
  assert!(db.follow.is_following(alice.id, bob.id).await.unwrap());
  assert!(db.follow.is_followed_by(bob.id, alice.id).await.unwrap());
  // one direction only
  assert!(!db.follow.is_following(bob.id, alice.id).await.unwrap());
  assert!(!db.follow.is_followed_by(alice.id, bob.id).await.unwrap());

  // repeating the follow is a no-op
  db.follow.follow(alice.id, bob.id).await.unwrap();

  let followers = db.follow.followers(bob.id, bob.id).await.unwrap();
  assert_eq!(followers.len(), 1);
  assert_eq!(followers[0].username, "alice");
  assert!(!followers[0].following);

  let following = db.follow.following(alice.id, alice.id).await.unwrap();
  assert_eq!(following.len(), 1);
  assert_eq!(following[0].username, "bob");
  assert!(following[0].following);

  db.follow.unfollow(alice.id, bob.id).await.unwrap();
  assert!(!db.follow.is_following(alice.id, bob.id).await.unwrap());
}

#[actix_rt::test]
#[ignore]
async fn deleting_a_user_cascades() {
  let (_guard, client, url) = common::setup().await;
  let db = new_db(&url).await;

  let alice = db.user.signup(&register_form("alice")).await.unwrap();
  let bob = db.user.signup(&register_form("bob")).await.unwrap();

  let id = db.message.store(&auth_for(&alice),
    &CreateMessage { text: "soon gone".to_string() }).await.unwrap();
  db.follow.follow(alice.id, bob.id).await.unwrap();
  db.follow.follow(bob.id, alice.id).await.unwrap();
  db.message.like(&auth_for(&bob), id).await.unwrap();

  db.user.delete(alice.id).await.unwrap();

  for table in &["messages", "likes", "follows"] {
    let row = client.query_one(
      &format!("SELECT COUNT(*) FROM {}", table)[..], &[]).await.unwrap();
    let count: i64 = row.get(0);
    assert_eq!(count, 0, "table {} not emptied by cascade", table);
  }
}

#[actix_rt::test]
#[ignore]
async fn message_rows_need_an_existing_owner() {
  let (_guard, client, _url) = common::setup().await;

  let err = client.execute(
    "INSERT INTO messages(user_id, text) VALUES(9999, 'orphan')", &[]).await.unwrap_err();
  assert_eq!(err.code(), Some(&SqlState::FOREIGN_KEY_VIOLATION));

  let err = client.execute(
    "INSERT INTO messages(text) VALUES('ownerless')", &[]).await.unwrap_err();
  assert_eq!(err.code(), Some(&SqlState::NOT_NULL_VIOLATION));
}

#[actix_rt::test]
#[ignore]
async fn likes_are_idempotent_and_counted() {
  let (_guard, _client, url) = common::setup().await;
  let db = new_db(&url).await;

  let alice = db.user.signup(&register_form("alice")).await.unwrap();
  let bob = db.user.signup(&register_form("bob")).await.unwrap();

  let id = db.message.store(&auth_for(&bob),
    &CreateMessage { text: "like me".to_string() }).await.unwrap();

  db.message.like(&auth_for(&alice), id).await.unwrap();
  db.message.like(&auth_for(&alice), id).await.unwrap();

  let details = db.message.get_by_id(alice.id, id).await.unwrap().unwrap();
  assert!(details.liked);
  assert_eq!(details.likes_count, 1);

  // another viewer sees the count but not the flag
  let details = db.message.get_by_id(bob.id, id).await.unwrap().unwrap();
  assert!(!details.liked);
  assert_eq!(details.likes_count, 1);

  let liked = db.message.liked_by(alice.id, alice.id).await.unwrap();
  assert_eq!(liked.len(), 1);
  assert_eq!(liked[0].id, id);

  db.message.unlike(&auth_for(&alice), id).await.unwrap();
  let details = db.message.get_by_id(alice.id, id).await.unwrap().unwrap();
  assert!(!details.liked);
  assert_eq!(details.likes_count, 0);
}

#[actix_rt::test]
#[ignore]
async fn feed_covers_self_and_followed_users_only() {
  let (_guard, _client, url) = common::setup().await;
  let db = new_db(&url).await;

  let alice = db.user.signup(&register_form("alice")).await.unwrap();
  let bob = db.user.signup(&register_form("bob")).await.unwrap();
  let carol = db.user.signup(&register_form("carol")).await.unwrap();

  db.follow.follow(alice.id, bob.id).await.unwrap();

  let m_bob = db.message.store(&auth_for(&bob),
    &CreateMessage { text: "from bob".to_string() }).await.unwrap();
  db.message.store(&auth_for(&carol),
    &CreateMessage { text: "from carol".to_string() }).await.unwrap();
  let m_alice = db.message.store(&auth_for(&alice),
    &CreateMessage { text: "from alice".to_string() }).await.unwrap();

  let feed = db.message.feed(&auth_for(&alice), &Default::default()).await.unwrap();
  let ids: Vec<i32> = feed.iter().map(|m| m.id).collect();
  // newest first, carol filtered out
  assert_eq!(ids, vec![m_alice, m_bob]);
  assert!(feed.iter().any(|m| m.author.username == "bob" && m.author.following));
}

#[actix_rt::test]
#[ignore]
async fn messages_by_user_are_newest_first() {
  let (_guard, _client, url) = common::setup().await;
  let db = new_db(&url).await;

  let alice = db.user.signup(&register_form("alice")).await.unwrap();
  let first = db.message.store(&auth_for(&alice),
    &CreateMessage { text: "first".to_string() }).await.unwrap();
  let second = db.message.store(&auth_for(&alice),
    &CreateMessage { text: "second".to_string() }).await.unwrap();

  let messages = db.message.by_user(ANON_USER_ID, alice.id, &Default::default()).await.unwrap();
  let ids: Vec<i32> = messages.iter().map(|m| m.id).collect();
  assert_eq!(ids, vec![second, first]);

  let req = MessagesRequest { limit: Some(1), offset: None };
  let messages = db.message.by_user(ANON_USER_ID, alice.id, &req).await.unwrap();
  assert_eq!(messages.len(), 1);
  assert_eq!(messages[0].id, second);
}

#[actix_rt::test]
#[ignore]
async fn profile_details_carry_counts_and_follow_flag() {
  let (_guard, _client, url) = common::setup().await;
  let db = new_db(&url).await;

  let alice = db.user.signup(&register_form("alice")).await.unwrap();
  let bob = db.user.signup(&register_form("bob")).await.unwrap();

  db.follow.follow(alice.id, bob.id).await.unwrap();
  let first = db.message.store(&auth_for(&bob),
    &CreateMessage { text: "one".to_string() }).await.unwrap();
  db.message.store(&auth_for(&bob),
    &CreateMessage { text: "two".to_string() }).await.unwrap();
  db.message.like(&auth_for(&alice), first).await.unwrap();

  let profile = db.user.get_profile(alice.id, "bob").await.unwrap().unwrap();
  assert!(profile.following);
  assert_eq!(profile.messages_count, 2);
  assert_eq!(profile.followers_count, 1);
  assert_eq!(profile.following_count, 0);
  // likes made by bob, not likes received
  assert_eq!(profile.likes_count, 0);

  let profile = db.user.get_profile(ANON_USER_ID, "bob").await.unwrap().unwrap();
  assert!(!profile.following);

  let profile = db.user.get_profile(ANON_USER_ID, "alice").await.unwrap().unwrap();
  assert_eq!(profile.likes_count, 1);
  assert_eq!(profile.following_count, 1);

  assert!(db.user.get_profile(ANON_USER_ID, "nobody").await.unwrap().is_none());
}

#[actix_rt::test]
#[ignore]
async fn directory_search_matches_username_substring() {
  let (_guard, _client, url) = common::setup().await;
  let db = new_db(&url).await;

  db.user.signup(&register_form("alice")).await.unwrap();
  db.user.signup(&register_form("bob")).await.unwrap();
  db.user.signup(&register_form("malice")).await.unwrap();

  let all = db.user.get_profiles(ANON_USER_ID, &Default::default()).await.unwrap();
  assert_eq!(all.len(), 3);

  // ILIKE match is case-insensitive
  let req = ProfileRequest { q: Some("LIC".to_string()), ..Default::default() };
  let hits = db.user.get_profiles(ANON_USER_ID, &req).await.unwrap();
  let names: Vec<&str> = hits.iter().map(|p| p.username.as_str()).collect();
  assert_eq!(names, vec!["alice", "malice"]);
}

#[actix_rt::test]
#[ignore]
async fn profile_update_merges_fields() {
  let (_guard, _client, url) = common::setup().await;
  let db = new_db(&url).await;

  let mut alice = db.user.signup(&register_form("alice")).await.unwrap();

  let req = UpdateUser {
    username: None,
    email: Some("new@test.com".to_string()),
    // blank falls back to the stock image
    image_url: Some("".to_string()),
    header_image_url: Some("/h.png".to_string()),
    bio: Some("hello".to_string()),
    password: "password6".to_string(),
  };
  let updated = db.user.update(&mut alice, &req).await.unwrap();

  assert_eq!(updated.username, "alice");
  assert_eq!(updated.email, "new@test.com");
  assert_eq!(updated.image_url.as_deref(), Some(DEFAULT_IMAGE_URL));
  assert_eq!(updated.header_image_url.as_deref(), Some("/h.png"));
  assert_eq!(updated.bio.as_deref(), Some("hello"));

  // blank bio clears it
  let req = UpdateUser {
    bio: Some("  ".to_string()),
    password: "password6".to_string(),
    ..Default::default()
  };
  let updated = db.user.update(&mut alice, &req).await.unwrap();
  assert_eq!(updated.bio, None);
}
