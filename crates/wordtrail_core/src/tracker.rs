//! crates/wordtrail_core/src/tracker.rs
//!
//! The search/contribution tracker: the logic that turns a user's raw
//! lookups into an append-only search log, and promotes the most recent
//! matching search into a durable contribution when the user confirms a
//! translation with context.
//!
//! All persistence goes through the `VocabularyStore` and
//! `ContributionStore` ports, so this module can be tested against
//! in-memory fakes.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{Contribution, ContributionDetail, NewText, Search, User};
use crate::ports::{ContributionStore, PortResult, VocabularyStore};

/// Terms arrive in path segments with spaces encoded as `+`. Decode
/// before any vocabulary lookup so "good+morning" and "good morning"
/// resolve to the same word.
pub fn decode_term(term: &str) -> String {
    term.replace('+', " ")
}

/// Logs a lookup of `term` (from `from_code` into `to_code`) for the
/// user, optionally anchoring it to the raw text it was found in.
///
/// Every call appends a new search; prior searches for the same pair
/// are left untouched.
pub async fn record_search(
    vocab: &dyn VocabularyStore,
    store: &dyn ContributionStore,
    user: &User,
    term: &str,
    from_code: &str,
    to_code: &str,
    raw_text: Option<&str>,
) -> PortResult<Search> {
    let from = vocab.language_by_code(from_code).await?;
    let to = vocab.language_by_code(to_code).await?;
    let word = vocab.find_or_create_word(&decode_term(term), &from.code).await?;

    let text = raw_text.map(|content| NewText {
        content: content.to_string(),
        language_code: from.code.clone(),
        url_id: None,
    });

    store.create_search(user.user_id, word.id, &to.code, text).await
}

/// Records a confirmed translation with context.
///
/// If the user has a prior search for this origin word and target
/// language, the newest one (highest id) is promoted: the contribution
/// is attached to it, replacing any earlier link. Otherwise a
/// standalone contribution is created. The context text and the
/// contribution are persisted in a single transaction by the store.
#[allow(clippy::too_many_arguments)]
pub async fn contribute(
    vocab: &dyn VocabularyStore,
    store: &dyn ContributionStore,
    user: &User,
    from_code: &str,
    term: &str,
    to_code: &str,
    translation: &str,
    context: &str,
    url_address: &str,
    url_title: &str,
) -> PortResult<Contribution> {
    let url = vocab.find_or_create_url(url_address, url_title).await?;
    let from = vocab.language_by_code(from_code).await?;
    let to = vocab.language_by_code(to_code).await?;

    let origin = vocab.find_or_create_word(&decode_term(term), &from.code).await?;
    let translation = vocab
        .find_or_create_word(&decode_term(translation), &to.code)
        .await?;

    let prior = store.latest_search(user.user_id, origin.id, &to.code).await?;

    let text = NewText {
        content: context.to_string(),
        language_code: from.code.clone(),
        url_id: Some(url.id),
    };

    store
        .save_contribution(
            user.user_id,
            origin.id,
            translation.id,
            text,
            prior.map(|s| s.id),
        )
        .await
}

/// Buckets contributions by the calendar date of their context text
/// (time of day ignored), most recent date first. Within a day the
/// incoming (chronological) order is preserved.
pub fn group_by_day(
    details: Vec<ContributionDetail>,
) -> Vec<(NaiveDate, Vec<ContributionDetail>)> {
    let mut buckets: BTreeMap<NaiveDate, Vec<ContributionDetail>> = BTreeMap::new();
    for detail in details {
        buckets
            .entry(detail.text_created_at.date_naive())
            .or_default()
            .push(detail);
    }
    buckets.into_iter().rev().collect()
}

/// The distinct origin words across the user's contributions, in
/// first-seen order. Backs the studied-words listing.
pub fn studied_words(details: &[ContributionDetail]) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for detail in details {
        if !words.iter().any(|w| w == &detail.from_word) {
            words.push(detail.from_word.clone());
        }
    }
    words
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Language, Text, Url, Word};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// In-memory stand-in for both stores, honoring the port contracts
    /// (dedup for words/urls, append-only searches, atomic-enough
    /// contribution writes).
    #[derive(Default)]
    struct MemoryStore {
        inner: Mutex<Inner>,
    }

    #[derive(Default)]
    struct Inner {
        words: Vec<Word>,
        urls: Vec<Url>,
        texts: Vec<Text>,
        searches: Vec<Search>,
        contributions: Vec<Contribution>,
        next_id: i64,
    }

    impl Inner {
        fn next_id(&mut self) -> i64 {
            self.next_id += 1;
            self.next_id
        }
    }

    impl MemoryStore {
        fn words(&self) -> Vec<Word> {
            self.inner.lock().unwrap().words.clone()
        }

        fn urls(&self) -> Vec<Url> {
            self.inner.lock().unwrap().urls.clone()
        }

        fn searches(&self) -> Vec<Search> {
            self.inner.lock().unwrap().searches.clone()
        }

        fn contributions(&self) -> Vec<Contribution> {
            self.inner.lock().unwrap().contributions.clone()
        }

        fn texts(&self) -> Vec<Text> {
            self.inner.lock().unwrap().texts.clone()
        }
    }

    #[async_trait]
    impl VocabularyStore for MemoryStore {
        async fn find_or_create_word(&self, word: &str, language_code: &str) -> PortResult<Word> {
            let mut inner = self.inner.lock().unwrap();
            if let Some(existing) = inner
                .words
                .iter()
                .find(|w| w.word == word && w.language_code == language_code)
            {
                return Ok(existing.clone());
            }
            let id = inner.next_id();
            let created = Word {
                id,
                word: word.to_string(),
                language_code: language_code.to_string(),
            };
            inner.words.push(created.clone());
            Ok(created)
        }

        async fn find_or_create_url(&self, address: &str, title: &str) -> PortResult<Url> {
            let mut inner = self.inner.lock().unwrap();
            if let Some(existing) = inner.urls.iter().find(|u| u.address == address) {
                return Ok(existing.clone());
            }
            let id = inner.next_id();
            let created = Url {
                id,
                address: address.to_string(),
                title: title.to_string(),
            };
            inner.urls.push(created.clone());
            Ok(created)
        }

        async fn language_by_code(&self, code: &str) -> PortResult<Language> {
            match code {
                "en" | "de" | "fr" => Ok(Language {
                    code: code.to_string(),
                    name: code.to_string(),
                    available: true,
                }),
                other => Err(crate::ports::PortError::NotFound(format!(
                    "Language {} not found",
                    other
                ))),
            }
        }

        async fn available_languages(&self) -> PortResult<Vec<Language>> {
            Ok(vec![])
        }
    }

    #[async_trait]
    impl ContributionStore for MemoryStore {
        async fn create_search(
            &self,
            user_id: Uuid,
            word_id: i64,
            target_language_code: &str,
            text: Option<NewText>,
        ) -> PortResult<Search> {
            let mut inner = self.inner.lock().unwrap();
            let text_id = text.map(|t| {
                let id = inner.next_id();
                inner.texts.push(Text {
                    id,
                    content: t.content,
                    language_code: t.language_code,
                    url_id: t.url_id,
                    created_at: Utc::now(),
                });
                id
            });
            let id = inner.next_id();
            let search = Search {
                id,
                user_id,
                word_id,
                target_language_code: target_language_code.to_string(),
                text_id,
                contribution_id: None,
            };
            inner.searches.push(search.clone());
            Ok(search)
        }

        async fn latest_search(
            &self,
            user_id: Uuid,
            word_id: i64,
            target_language_code: &str,
        ) -> PortResult<Option<Search>> {
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .searches
                .iter()
                .filter(|s| {
                    s.user_id == user_id
                        && s.word_id == word_id
                        && s.target_language_code == target_language_code
                })
                .max_by_key(|s| s.id)
                .cloned())
        }

        async fn save_contribution(
            &self,
            user_id: Uuid,
            origin_word_id: i64,
            translation_word_id: i64,
            context: NewText,
            attach_to_search: Option<i64>,
        ) -> PortResult<Contribution> {
            let mut inner = self.inner.lock().unwrap();
            let text_id = inner.next_id();
            inner.texts.push(Text {
                id: text_id,
                content: context.content,
                language_code: context.language_code,
                url_id: context.url_id,
                created_at: Utc::now(),
            });
            let id = inner.next_id();
            let contribution = Contribution {
                id,
                user_id,
                origin_word_id,
                translation_word_id,
                text_id,
                created_at: Utc::now(),
            };
            inner.contributions.push(contribution.clone());
            if let Some(search_id) = attach_to_search {
                if let Some(search) = inner.searches.iter_mut().find(|s| s.id == search_id) {
                    search.contribution_id = Some(id);
                }
            }
            Ok(contribution)
        }

        async fn contributions_for(&self, _user_id: Uuid) -> PortResult<Vec<ContributionDetail>> {
            Ok(vec![])
        }
    }

    fn test_user() -> User {
        User {
            user_id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            learned_language: Some("de".to_string()),
            native_language: Some("en".to_string()),
        }
    }

    fn detail_at(id: i64, from: &str, at: DateTime<Utc>) -> ContributionDetail {
        ContributionDetail {
            id,
            from_word: from.to_string(),
            to_word: format!("{}-translated", from),
            title: "A page".to_string(),
            url: "http://example.com".to_string(),
            context: format!("the {} sat", from),
            text_created_at: at,
            created_at: at,
        }
    }

    #[test]
    fn decode_term_replaces_plus_with_space() {
        assert_eq!(decode_term("good+morning"), "good morning");
        assert_eq!(decode_term("cat"), "cat");
    }

    #[tokio::test]
    async fn find_or_create_word_is_idempotent() {
        let store = MemoryStore::default();
        let first = store.find_or_create_word("cat", "en").await.unwrap();
        let second = store.find_or_create_word("cat", "en").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_word_creation_stores_exactly_one_row() {
        let store = std::sync::Arc::new(MemoryStore::default());
        let first = tokio::spawn({
            let store = store.clone();
            async move { store.find_or_create_word("cat", "en").await.unwrap() }
        });
        let second = tokio::spawn({
            let store = store.clone();
            async move { store.find_or_create_word("cat", "en").await.unwrap() }
        });
        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.unwrap().id, second.unwrap().id);
        assert_eq!(store.words().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_url_creation_stores_exactly_one_row() {
        let store = std::sync::Arc::new(MemoryStore::default());
        let first = tokio::spawn({
            let store = store.clone();
            async move { store.find_or_create_url("http://x", "A page").await.unwrap() }
        });
        let second = tokio::spawn({
            let store = store.clone();
            async move { store.find_or_create_url("http://x", "A page").await.unwrap() }
        });
        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.unwrap().id, second.unwrap().id);
        assert_eq!(store.urls().len(), 1);
    }

    #[tokio::test]
    async fn every_lookup_appends_a_new_search() {
        let store = MemoryStore::default();
        let user = test_user();
        record_search(&store, &store, &user, "cat", "en", "de", None)
            .await
            .unwrap();
        record_search(&store, &store, &user, "cat", "en", "de", None)
            .await
            .unwrap();
        assert_eq!(store.searches().len(), 2);
    }

    #[tokio::test]
    async fn lookup_with_raw_text_stores_the_text() {
        let store = MemoryStore::default();
        let user = test_user();
        let search = record_search(
            &store,
            &store,
            &user,
            "cat",
            "en",
            "de",
            Some("The cat sat on the mat"),
        )
        .await
        .unwrap();
        assert!(search.text_id.is_some());
        assert_eq!(store.texts().len(), 1);
        assert_eq!(store.texts()[0].content, "The cat sat on the mat");
    }

    #[tokio::test]
    async fn lookup_of_unknown_language_fails() {
        let store = MemoryStore::default();
        let user = test_user();
        let result = record_search(&store, &store, &user, "cat", "xx", "de", None).await;
        assert!(matches!(
            result,
            Err(crate::ports::PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn contribute_attaches_to_the_most_recent_matching_search() {
        let store = MemoryStore::default();
        let user = test_user();
        let older = record_search(&store, &store, &user, "cat", "en", "de", None)
            .await
            .unwrap();
        let newer = record_search(&store, &store, &user, "cat", "en", "de", None)
            .await
            .unwrap();

        let contribution = contribute(
            &store,
            &store,
            &user,
            "en",
            "cat",
            "de",
            "Katze",
            "The cat sat",
            "http://x",
            "",
        )
        .await
        .unwrap();

        let searches = store.searches();
        let older = searches.iter().find(|s| s.id == older.id).unwrap();
        let newer = searches.iter().find(|s| s.id == newer.id).unwrap();
        assert_eq!(newer.contribution_id, Some(contribution.id));
        assert_eq!(older.contribution_id, None);
        assert_eq!(store.contributions().len(), 1);
    }

    #[tokio::test]
    async fn contribute_without_a_prior_search_is_standalone() {
        let store = MemoryStore::default();
        let user = test_user();
        contribute(
            &store,
            &store,
            &user,
            "en",
            "dog",
            "de",
            "Hund",
            "The dog barked",
            "http://x",
            "",
        )
        .await
        .unwrap();

        assert_eq!(store.contributions().len(), 1);
        assert!(store.searches().is_empty());
    }

    #[tokio::test]
    async fn contribute_twice_overwrites_the_search_link() {
        let store = MemoryStore::default();
        let user = test_user();
        let search = record_search(&store, &store, &user, "cat", "en", "de", None)
            .await
            .unwrap();

        contribute(
            &store, &store, &user, "en", "cat", "de", "Katze", "first", "http://x", "",
        )
        .await
        .unwrap();
        let second = contribute(
            &store, &store, &user, "en", "cat", "de", "Katze", "second", "http://x", "",
        )
        .await
        .unwrap();

        let searches = store.searches();
        let search = searches.iter().find(|s| s.id == search.id).unwrap();
        assert_eq!(search.contribution_id, Some(second.id));
        assert_eq!(store.contributions().len(), 2);
    }

    #[tokio::test]
    async fn contribute_decodes_plus_encoded_terms() {
        let store = MemoryStore::default();
        let user = test_user();
        record_search(&store, &store, &user, "good morning", "en", "de", None)
            .await
            .unwrap();

        let contribution = contribute(
            &store,
            &store,
            &user,
            "en",
            "good+morning",
            "de",
            "guten+Morgen",
            "He said good morning",
            "http://x",
            "",
        )
        .await
        .unwrap();

        // Same word entity, so the contribution attached to the search.
        let searches = store.searches();
        assert_eq!(searches[0].contribution_id, Some(contribution.id));
    }

    #[test]
    fn group_by_day_sorts_dates_descending() {
        let day = |y, m, d, h| Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap();
        let details = vec![
            detail_at(1, "cat", day(2026, 8, 28, 9)),
            detail_at(2, "dog", day(2026, 8, 30, 7)),
            detail_at(3, "bird", day(2026, 8, 28, 22)),
            detail_at(4, "fish", day(2026, 8, 29, 12)),
        ];

        let grouped = group_by_day(details);
        let dates: Vec<NaiveDate> = grouped.iter().map(|(d, _)| *d).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
                NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
                NaiveDate::from_ymd_opt(2026, 8, 28).unwrap(),
            ]
        );
        // Same-day entries keep their chronological order.
        let aug_28 = &grouped[2].1;
        assert_eq!(aug_28[0].id, 1);
        assert_eq!(aug_28[1].id, 3);
    }

    #[test]
    fn studied_words_are_distinct_in_first_seen_order() {
        let at = Utc.with_ymd_and_hms(2026, 8, 30, 8, 0, 0).unwrap();
        let details = vec![
            detail_at(1, "cat", at),
            detail_at(2, "dog", at),
            detail_at(3, "cat", at),
        ];
        assert_eq!(studied_words(&details), vec!["cat", "dog"]);
    }
}
