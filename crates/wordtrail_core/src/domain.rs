//! crates/wordtrail_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Represents a registered learner - used throughout the app.
///
/// Language preferences are optional; a freshly registered user has
/// neither set.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub learned_language: Option<String>,
    pub native_language: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// Represents one issued session token. Many sessions per user are
/// allowed; `last_used_at` is bumped on every successful resolution.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: Uuid,
    pub last_used_at: DateTime<Utc>,
}

/// A language offered by the platform. The set of languages is static
/// reference data seeded at migration time; `code` is the identity
/// (e.g. "en", "de").
#[derive(Debug, Clone)]
pub struct Language {
    pub code: String,
    pub name: String,
    pub available: bool,
}

/// A `(text, language)` pair, deduplicated by the vocabulary store.
#[derive(Debug, Clone)]
pub struct Word {
    pub id: i64,
    pub word: String,
    pub language_code: String,
}

/// A page a word or context was found on, deduplicated by address.
/// The title is best-effort metadata written only on creation.
#[derive(Debug, Clone)]
pub struct Url {
    pub id: i64,
    pub address: String,
    pub title: String,
}

/// A context snippet. Texts are never deduplicated: two identical
/// snippets are still two distinct reading events.
#[derive(Debug, Clone)]
pub struct Text {
    pub id: i64,
    pub content: String,
    pub language_code: String,
    pub url_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A text that has not yet been persisted. Created inside the same
/// transaction as the search or contribution that references it.
#[derive(Debug, Clone)]
pub struct NewText {
    pub content: String,
    pub language_code: String,
    pub url_id: Option<i64>,
}

/// One logged lookup of a term. Searches form an append-only log; the
/// most recent one for a (user, word, target language) triple is the
/// only one eligible for promotion into a contribution.
#[derive(Debug, Clone)]
pub struct Search {
    pub id: i64,
    pub user_id: Uuid,
    pub word_id: i64,
    pub target_language_code: String,
    pub text_id: Option<i64>,
    pub contribution_id: Option<i64>,
}

/// A confirmed word -> translation pair, anchored to a context text.
/// Unlike a bare search this always carries a translation and a text.
#[derive(Debug, Clone)]
pub struct Contribution {
    pub id: i64,
    pub user_id: Uuid,
    pub origin_word_id: i64,
    pub translation_word_id: i64,
    pub text_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A contribution joined with its words, context text and source url,
/// ready for presentation. `text_created_at` drives the by-day grouping.
#[derive(Debug, Clone)]
pub struct ContributionDetail {
    pub id: i64,
    pub from_word: String,
    pub to_word: String,
    pub title: String,
    pub url: String,
    pub context: String,
    pub text_created_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
