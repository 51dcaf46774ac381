//! crates/wordtrail_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Contribution, ContributionDetail, Language, NewText, Search, Session, Url, User,
    UserCredentials, Word,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Identity store and session manager: users, credentials and the
/// opaque session tokens that prove them.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Registers a user. A duplicate email fails with `Conflict`.
    async fn create_user(&self, email: &str, hashed_password: &str) -> PortResult<User>;

    async fn credentials_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn set_learned_language(&self, user_id: Uuid, code: &str) -> PortResult<()>;

    async fn set_native_language(&self, user_id: Uuid, code: &str) -> PortResult<()>;

    /// Persists a freshly generated session token for the user.
    async fn create_session(&self, token: &str, user_id: Uuid) -> PortResult<Session>;

    /// Looks a session up by token and returns its owner. An unknown
    /// token fails with `Unauthorized`. On success the session's
    /// `last_used_at` is updated as an observable side effect.
    async fn resolve_session(&self, token: &str) -> PortResult<User>;
}

/// The deduplicating layer over words, urls and languages.
#[async_trait]
pub trait VocabularyStore: Send + Sync {
    /// Exact-match lookup of `(word, language)`; creates the row if
    /// absent. Two concurrent calls for the same pair must yield one row.
    async fn find_or_create_word(&self, word: &str, language_code: &str) -> PortResult<Word>;

    /// Dedup key is the address alone; the title is only written when
    /// the row is created.
    async fn find_or_create_url(&self, address: &str, title: &str) -> PortResult<Url>;

    /// Fails with `NotFound` for an unrecognized code.
    async fn language_by_code(&self, code: &str) -> PortResult<Language>;

    async fn available_languages(&self) -> PortResult<Vec<Language>>;
}

/// The append-only search log and the contributions promoted from it.
#[async_trait]
pub trait ContributionStore: Send + Sync {
    /// Appends a search, creating the optional context text in the same
    /// transaction. Never deduplicates against prior searches.
    async fn create_search(
        &self,
        user_id: Uuid,
        word_id: i64,
        target_language_code: &str,
        text: Option<NewText>,
    ) -> PortResult<Search>;

    /// The most recent search (highest id) by this user for this origin
    /// word and target language, if any.
    async fn latest_search(
        &self,
        user_id: Uuid,
        word_id: i64,
        target_language_code: &str,
    ) -> PortResult<Option<Search>>;

    /// Persists the context text and the contribution atomically. When
    /// `attach_to_search` is set, the search's contribution link is
    /// pointed at the new row (overwriting any prior link) inside the
    /// same transaction.
    async fn save_contribution(
        &self,
        user_id: Uuid,
        origin_word_id: i64,
        translation_word_id: i64,
        context: NewText,
        attach_to_search: Option<i64>,
    ) -> PortResult<Contribution>;

    /// All contributions of the user in creation order, joined for
    /// presentation.
    async fn contributions_for(&self, user_id: Uuid) -> PortResult<Vec<ContributionDetail>>;
}

/// The third-party machine-translation provider.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, term: &str, from: &str, to: &str) -> PortResult<String>;
}

/// The raw page-fetching proxy.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> PortResult<String>;
}
