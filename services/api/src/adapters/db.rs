//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the store ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use wordtrail_core::domain::{
    Contribution, ContributionDetail, Language, NewText, Search, Session, Url, User,
    UserCredentials, Word,
};
use wordtrail_core::ports::{
    ContributionStore, IdentityStore, PortError, PortResult, VocabularyStore,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the store ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    learned_language: Option<String>,
    native_language: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
            learned_language: self.learned_language,
            native_language: self.native_language,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: String,
    user_id: Uuid,
    last_used_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> Session {
        Session {
            id: self.id,
            user_id: self.user_id,
            last_used_at: self.last_used_at,
        }
    }
}

#[derive(FromRow)]
struct LanguageRecord {
    code: String,
    name: String,
    available: bool,
}
impl LanguageRecord {
    fn to_domain(self) -> Language {
        Language {
            code: self.code,
            name: self.name,
            available: self.available,
        }
    }
}

#[derive(FromRow)]
struct WordRecord {
    id: i64,
    word: String,
    language_code: String,
}
impl WordRecord {
    fn to_domain(self) -> Word {
        Word {
            id: self.id,
            word: self.word,
            language_code: self.language_code,
        }
    }
}

#[derive(FromRow)]
struct UrlRecord {
    id: i64,
    address: String,
    title: String,
}
impl UrlRecord {
    fn to_domain(self) -> Url {
        Url {
            id: self.id,
            address: self.address,
            title: self.title,
        }
    }
}

#[derive(FromRow)]
struct SearchRecord {
    id: i64,
    user_id: Uuid,
    word_id: i64,
    target_language_code: String,
    text_id: Option<i64>,
    contribution_id: Option<i64>,
}
impl SearchRecord {
    fn to_domain(self) -> Search {
        Search {
            id: self.id,
            user_id: self.user_id,
            word_id: self.word_id,
            target_language_code: self.target_language_code,
            text_id: self.text_id,
            contribution_id: self.contribution_id,
        }
    }
}

#[derive(FromRow)]
struct ContributionRecord {
    id: i64,
    user_id: Uuid,
    origin_word_id: i64,
    translation_word_id: i64,
    text_id: i64,
    created_at: DateTime<Utc>,
}
impl ContributionRecord {
    fn to_domain(self) -> Contribution {
        Contribution {
            id: self.id,
            user_id: self.user_id,
            origin_word_id: self.origin_word_id,
            translation_word_id: self.translation_word_id,
            text_id: self.text_id,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ContributionDetailRecord {
    id: i64,
    from_word: String,
    to_word: String,
    title: String,
    url: String,
    context: String,
    text_created_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}
impl ContributionDetailRecord {
    fn to_domain(self) -> ContributionDetail {
        ContributionDetail {
            id: self.id,
            from_word: self.from_word,
            to_word: self.to_word,
            title: self.title,
            url: self.url,
            context: self.context,
            text_created_at: self.text_created_at,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `IdentityStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityStore for DbAdapter {
    async fn create_user(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING user_id, email, learned_language, native_language",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict(format!("User {} already exists", email))
            } else {
                unexpected(e)
            }
        })?;
        Ok(record.to_domain())
    }

    async fn credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, learned_language, native_language FROM users \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn set_learned_language(&self, user_id: Uuid, code: &str) -> PortResult<()> {
        sqlx::query("UPDATE users SET learned_language = $1 WHERE user_id = $2")
            .bind(code)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn set_native_language(&self, user_id: Uuid, code: &str) -> PortResult<()> {
        sqlx::query("UPDATE users SET native_language = $1 WHERE user_id = $2")
            .bind(code)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_session(&self, token: &str, user_id: Uuid) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "INSERT INTO sessions (id, user_id) VALUES ($1, $2) \
             RETURNING id, user_id, last_used_at",
        )
        .bind(token)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn resolve_session(&self, token: &str) -> PortResult<User> {
        // Bumping last_used_at doubles as the existence check.
        let session = sqlx::query_as::<_, SessionRecord>(
            "UPDATE sessions SET last_used_at = NOW() WHERE id = $1 \
             RETURNING id, user_id, last_used_at",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)?;

        // A session whose user has vanished is just as invalid as an
        // unknown token.
        match self.user_by_id(session.user_id).await {
            Ok(user) => Ok(user),
            Err(PortError::NotFound(_)) => Err(PortError::Unauthorized),
            Err(e) => Err(e),
        }
    }
}

//=========================================================================================
// `VocabularyStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl VocabularyStore for DbAdapter {
    async fn find_or_create_word(&self, word: &str, language_code: &str) -> PortResult<Word> {
        // Insert-then-select: a concurrent creator loses the insert but
        // both callers read the same surviving row.
        sqlx::query(
            "INSERT INTO words (word, language_code) VALUES ($1, $2) \
             ON CONFLICT (word, language_code) DO NOTHING",
        )
        .bind(word)
        .bind(language_code)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        let record = sqlx::query_as::<_, WordRecord>(
            "SELECT id, word, language_code FROM words WHERE word = $1 AND language_code = $2",
        )
        .bind(word)
        .bind(language_code)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn find_or_create_url(&self, address: &str, title: &str) -> PortResult<Url> {
        sqlx::query(
            "INSERT INTO urls (address, title) VALUES ($1, $2) \
             ON CONFLICT (address) DO NOTHING",
        )
        .bind(address)
        .bind(title)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        let record = sqlx::query_as::<_, UrlRecord>(
            "SELECT id, address, title FROM urls WHERE address = $1",
        )
        .bind(address)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn language_by_code(&self, code: &str) -> PortResult<Language> {
        let record = sqlx::query_as::<_, LanguageRecord>(
            "SELECT code, name, available FROM languages WHERE code = $1",
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Language {} not found", code)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn available_languages(&self) -> PortResult<Vec<Language>> {
        let records = sqlx::query_as::<_, LanguageRecord>(
            "SELECT code, name, available FROM languages WHERE available ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

//=========================================================================================
// `ContributionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContributionStore for DbAdapter {
    async fn create_search(
        &self,
        user_id: Uuid,
        word_id: i64,
        target_language_code: &str,
        text: Option<NewText>,
    ) -> PortResult<Search> {
        // The optional context text and the search land atomically.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let text_id = match text {
            Some(text) => {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO texts (content, language_code, url_id) VALUES ($1, $2, $3) \
                     RETURNING id",
                )
                .bind(&text.content)
                .bind(&text.language_code)
                .bind(text.url_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?;
                Some(id)
            }
            None => None,
        };

        let record = sqlx::query_as::<_, SearchRecord>(
            "INSERT INTO searches (user_id, word_id, target_language_code, text_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, word_id, target_language_code, text_id, contribution_id",
        )
        .bind(user_id)
        .bind(word_id)
        .bind(target_language_code)
        .bind(text_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn latest_search(
        &self,
        user_id: Uuid,
        word_id: i64,
        target_language_code: &str,
    ) -> PortResult<Option<Search>> {
        let record = sqlx::query_as::<_, SearchRecord>(
            "SELECT id, user_id, word_id, target_language_code, text_id, contribution_id \
             FROM searches \
             WHERE user_id = $1 AND word_id = $2 AND target_language_code = $3 \
             ORDER BY id DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(word_id)
        .bind(target_language_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn save_contribution(
        &self,
        user_id: Uuid,
        origin_word_id: i64,
        translation_word_id: i64,
        context: NewText,
        attach_to_search: Option<i64>,
    ) -> PortResult<Contribution> {
        // Text, contribution and the search link are one transaction so
        // a failure mid-way leaves no half-created contribution.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let (text_id,): (i64,) = sqlx::query_as(
            "INSERT INTO texts (content, language_code, url_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&context.content)
        .bind(&context.language_code)
        .bind(context.url_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        let record = sqlx::query_as::<_, ContributionRecord>(
            "INSERT INTO contributions (user_id, origin_word_id, translation_word_id, text_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, origin_word_id, translation_word_id, text_id, created_at",
        )
        .bind(user_id)
        .bind(origin_word_id)
        .bind(translation_word_id)
        .bind(text_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        if let Some(search_id) = attach_to_search {
            sqlx::query("UPDATE searches SET contribution_id = $1 WHERE id = $2")
                .bind(record.id)
                .bind(search_id)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn contributions_for(&self, user_id: Uuid) -> PortResult<Vec<ContributionDetail>> {
        let records = sqlx::query_as::<_, ContributionDetailRecord>(
            "SELECT c.id, \
                    ow.word AS from_word, \
                    tw.word AS to_word, \
                    u.title, \
                    u.address AS url, \
                    t.content AS context, \
                    t.created_at AS text_created_at, \
                    c.created_at \
             FROM contributions c \
             JOIN words ow ON ow.id = c.origin_word_id \
             JOIN words tw ON tw.id = c.translation_word_id \
             JOIN texts t ON t.id = c.text_id \
             JOIN urls u ON u.id = t.url_id \
             WHERE c.user_id = $1 \
             ORDER BY c.id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
