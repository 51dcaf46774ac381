//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use wordtrail_core::domain::User;
use wordtrail_core::tracker;

use crate::error::ApiError;
use crate::web::{parse_form, state::AppState};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::add_user_handler,
        crate::web::auth::create_session_handler,
        learned_language,
        learned_language_set,
        native_language,
        native_language_set,
        learned_and_native_language,
        available_languages,
        contributions,
        studied_words,
        contributions_by_day,
        contribute_with_context,
        lookup,
        lookup_preferred,
        validate,
        translate_legacy,
        translate_from_to,
        translate_with_context,
        get_page,
    ),
    components(
        schemas(
            crate::web::auth::CredentialsForm,
            LanguagePairResponse,
            ContributionPair,
            DayEntry,
            ContributionView,
            ContributionForm,
            LookupForm,
            TranslationContextForm,
        )
    ),
    tags(
        (name = "wordtrail API", description = "API endpoints for recording and browsing vocabulary contributions.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct LanguagePairResponse {
    native: Option<String>,
    learned: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ContributionPair {
    from: String,
    to: String,
}

#[derive(Serialize, ToSchema)]
pub struct ContributionView {
    id: i64,
    from: String,
    to: String,
    title: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<String>,
}

/// One calendar day of contributions, most recent day first.
#[derive(Serialize, ToSchema)]
pub struct DayEntry {
    date: String,
    contribs: Vec<ContributionView>,
}

#[derive(Deserialize, ToSchema)]
pub struct ContributionForm {
    pub url: Option<String>,
    pub context: Option<String>,
    pub title: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LookupForm {
    pub text: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct TranslationContextForm {
    pub context: Option<String>,
    pub url: Option<String>,
}

//=========================================================================================
// Language Preference Handlers
//=========================================================================================

/// GET /learned_language - The code of the language the user is
/// learning, or the empty string if none is set yet.
#[utoipa::path(
    get,
    path = "/learned_language",
    params(("session" = String, Query, description = "Session token")),
    responses((status = 200, description = "Language code as plain text", body = String))
)]
pub async fn learned_language(Extension(user): Extension<User>) -> String {
    user.learned_language.unwrap_or_default()
}

/// POST /learned_language/{code} - Set the learned language.
#[utoipa::path(
    post,
    path = "/learned_language/{code}",
    params(
        ("code" = String, Path, description = "ISO language code"),
        ("session" = String, Query, description = "Session token")
    ),
    responses(
        (status = 200, description = "OK", body = String),
        (status = 400, description = "Unknown language code")
    )
)]
pub async fn learned_language_set(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Extension(user): Extension<User>,
) -> Result<&'static str, ApiError> {
    let language = state.vocabulary.language_by_code(&code).await?;
    state
        .identity
        .set_learned_language(user.user_id, &language.code)
        .await?;
    Ok("OK")
}

/// GET /native_language - The code of the user's native language.
#[utoipa::path(
    get,
    path = "/native_language",
    params(("session" = String, Query, description = "Session token")),
    responses((status = 200, description = "Language code as plain text", body = String))
)]
pub async fn native_language(Extension(user): Extension<User>) -> String {
    user.native_language.unwrap_or_default()
}

/// POST /native_language/{code} - Set the native language.
#[utoipa::path(
    post,
    path = "/native_language/{code}",
    params(
        ("code" = String, Path, description = "ISO language code"),
        ("session" = String, Query, description = "Session token")
    ),
    responses(
        (status = 200, description = "OK", body = String),
        (status = 400, description = "Unknown language code")
    )
)]
pub async fn native_language_set(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Extension(user): Extension<User>,
) -> Result<&'static str, ApiError> {
    let language = state.vocabulary.language_by_code(&code).await?;
    state
        .identity
        .set_native_language(user.user_id, &language.code)
        .await?;
    Ok("OK")
}

/// GET /learned_and_native_language - Both preferences in one response.
#[utoipa::path(
    get,
    path = "/learned_and_native_language",
    params(("session" = String, Query, description = "Session token")),
    responses((status = 200, description = "Both language codes", body = LanguagePairResponse))
)]
pub async fn learned_and_native_language(
    Extension(user): Extension<User>,
) -> Json<LanguagePairResponse> {
    Json(LanguagePairResponse {
        native: user.native_language,
        learned: user.learned_language,
    })
}

/// GET /available_languages - Codes of the languages offered for study.
#[utoipa::path(
    get,
    path = "/available_languages",
    params(("session" = String, Query, description = "Session token")),
    responses((status = 200, description = "Array of language codes", body = [String]))
)]
pub async fn available_languages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let languages = state.vocabulary.available_languages().await?;
    Ok(Json(languages.into_iter().map(|l| l.code).collect()))
}

//=========================================================================================
// Contribution Handlers
//=========================================================================================

/// GET /contribs - All of the user's contributions, chronologically,
/// as word/translation pairs.
#[utoipa::path(
    get,
    path = "/contribs",
    params(("session" = String, Query, description = "Session token")),
    responses((status = 200, description = "Contribution pairs", body = [ContributionPair]))
)]
pub async fn contributions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<ContributionPair>>, ApiError> {
    let details = state.contributions.contributions_for(user.user_id).await?;
    Ok(Json(
        details
            .into_iter()
            .map(|d| ContributionPair {
                from: d.from_word,
                to: d.to_word,
            })
            .collect(),
    ))
}

/// GET /user_words - The distinct words the user is studying.
#[utoipa::path(
    get,
    path = "/user_words",
    params(("session" = String, Query, description = "Session token")),
    responses((status = 200, description = "Array of words", body = [String]))
)]
pub async fn studied_words(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<String>>, ApiError> {
    let details = state.contributions.contributions_for(user.user_id).await?;
    Ok(Json(tracker::studied_words(&details)))
}

/// GET /contribs_by_day/{return_context} - Contributions grouped by the
/// calendar date of their context text, most recent day first. The
/// context snippet is included only when the path segment is
/// `with_context`.
#[utoipa::path(
    get,
    path = "/contribs_by_day/{return_context}",
    params(
        ("return_context" = String, Path, description = "`with_context` to include context snippets"),
        ("session" = String, Query, description = "Session token")
    ),
    responses((status = 200, description = "Day buckets, newest first", body = [DayEntry]))
)]
pub async fn contributions_by_day(
    State(state): State<Arc<AppState>>,
    Path(return_context): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<DayEntry>>, ApiError> {
    let with_context = return_context == "with_context";

    let details = state.contributions.contributions_for(user.user_id).await?;
    let days = tracker::group_by_day(details)
        .into_iter()
        .map(|(date, entries)| DayEntry {
            date: date.format("%A, %d %B").to_string(),
            contribs: entries
                .into_iter()
                .map(|d| ContributionView {
                    id: d.id,
                    from: d.from_word,
                    to: d.to_word,
                    title: d.title,
                    url: d.url,
                    context: with_context.then_some(d.context),
                })
                .collect(),
        })
        .collect();

    Ok(Json(days))
}

/// POST /contribute_with_context/{from}/{term}/{to}/{translation} - The
/// preferred way of saving a word/translation/context to the user's
/// profile. Attaches to the most recent matching search, if any.
#[utoipa::path(
    post,
    path = "/contribute_with_context/{from}/{term}/{to}/{translation}",
    request_body(content = ContributionForm, content_type = "application/x-www-form-urlencoded"),
    params(
        ("from" = String, Path, description = "Language code of the term"),
        ("term" = String, Path, description = "The looked-up term, `+` for spaces"),
        ("to" = String, Path, description = "Language code of the translation"),
        ("translation" = String, Path, description = "The translation, `+` for spaces"),
        ("session" = String, Query, description = "Session token")
    ),
    responses(
        (status = 200, description = "OK", body = String),
        (status = 400, description = "Missing form field or unknown language")
    )
)]
pub async fn contribute_with_context(
    State(state): State<Arc<AppState>>,
    Path((from, term, to, translation)): Path<(String, String, String, String)>,
    Extension(user): Extension<User>,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    let form: ContributionForm = parse_form(&body)?;
    let url = form
        .url
        .ok_or_else(|| ApiError::BadRequest("url is required".to_string()))?;
    let context = form
        .context
        .ok_or_else(|| ApiError::BadRequest("context is required".to_string()))?;
    let title = form.title.unwrap_or_default();

    tracker::contribute(
        state.vocabulary.as_ref(),
        state.contributions.as_ref(),
        &user,
        &from,
        &term,
        &to,
        &translation,
        &context,
        &url,
        &title,
    )
    .await?;

    Ok("OK")
}

/// POST /lookup/{from}/{term}/{to} - Log a lookup of a term, optionally
/// with the raw text it was found in.
#[utoipa::path(
    post,
    path = "/lookup/{from}/{term}/{to}",
    request_body(content = LookupForm, content_type = "application/x-www-form-urlencoded"),
    params(
        ("from" = String, Path, description = "Language code of the term"),
        ("term" = String, Path, description = "The looked-up term, `+` for spaces"),
        ("to" = String, Path, description = "Target language code"),
        ("session" = String, Query, description = "Session token")
    ),
    responses(
        (status = 200, description = "OK", body = String),
        (status = 400, description = "Unknown language code")
    )
)]
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Path((from, term, to)): Path<(String, String, String)>,
    Extension(user): Extension<User>,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    let form: LookupForm = parse_form(&body)?;
    do_lookup(&state, &user, &from, &term, &to, form.text.as_deref()).await
}

/// POST /lookup/{from}/{term} - Log a lookup into the user's learned
/// language.
#[utoipa::path(
    post,
    path = "/lookup/{from}/{term}",
    request_body(content = LookupForm, content_type = "application/x-www-form-urlencoded"),
    params(
        ("from" = String, Path, description = "Language code of the term"),
        ("term" = String, Path, description = "The looked-up term, `+` for spaces"),
        ("session" = String, Query, description = "Session token")
    ),
    responses(
        (status = 200, description = "OK", body = String),
        (status = 400, description = "User has no learned language set")
    )
)]
pub async fn lookup_preferred(
    State(state): State<Arc<AppState>>,
    Path((from, term)): Path<(String, String)>,
    Extension(user): Extension<User>,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    let form: LookupForm = parse_form(&body)?;
    // The target is always a language code here; the user's preference
    // is resolved to its code before delegating.
    let to = user
        .learned_language
        .clone()
        .ok_or_else(|| ApiError::BadRequest("no learned language set".to_string()))?;
    do_lookup(&state, &user, &from, &term, &to, form.text.as_deref()).await
}

async fn do_lookup(
    state: &AppState,
    user: &User,
    from: &str,
    term: &str,
    to: &str,
    text: Option<&str>,
) -> Result<&'static str, ApiError> {
    tracker::record_search(
        state.vocabulary.as_ref(),
        state.contributions.as_ref(),
        user,
        term,
        from,
        to,
        text,
    )
    .await?;
    Ok("OK")
}

/// GET /validate - Succeeds iff the session token is valid.
#[utoipa::path(
    get,
    path = "/validate",
    params(("session" = String, Query, description = "Session token")),
    responses(
        (status = 200, description = "OK", body = String),
        (status = 401, description = "Missing or invalid session")
    )
)]
pub async fn validate() -> &'static str {
    "OK"
}

//=========================================================================================
// Translation and Page-Fetch Handlers
//=========================================================================================

/// GET /goslate/{word}/{from} - Legacy translation route; always
/// translates into English.
#[utoipa::path(
    get,
    path = "/goslate/{word}/{from}",
    params(
        ("word" = String, Path, description = "The word to translate, `+` for spaces"),
        ("from" = String, Path, description = "Source language code")
    ),
    responses((status = 200, description = "Translated text", body = String))
)]
pub async fn translate_legacy(
    State(state): State<Arc<AppState>>,
    Path((word, from)): Path<(String, String)>,
) -> Result<String, ApiError> {
    let word = tracker::decode_term(&word);
    Ok(state.translator.translate(&word, &from, "en").await?)
}

/// GET /translate_from_to/{word}/{from}/{to} - Translate a word.
#[utoipa::path(
    get,
    path = "/translate_from_to/{word}/{from}/{to}",
    params(
        ("word" = String, Path, description = "The word to translate, `+` for spaces"),
        ("from" = String, Path, description = "Source language code"),
        ("to" = String, Path, description = "Target language code")
    ),
    responses((status = 200, description = "Translated text", body = String))
)]
pub async fn translate_from_to(
    State(state): State<Arc<AppState>>,
    Path((word, from, to)): Path<(String, String, String)>,
) -> Result<String, ApiError> {
    let word = tracker::decode_term(&word);
    Ok(state.translator.translate(&word, &from, &to).await?)
}

/// Both form fields are mandatory even though the provider ignores
/// them; a request without them is malformed.
fn require_translation_context(body: &Bytes) -> Result<(String, String), ApiError> {
    let form: TranslationContextForm = parse_form(body)?;
    let context = form
        .context
        .ok_or_else(|| ApiError::BadRequest("context is required".to_string()))?;
    let url = form
        .url
        .ok_or_else(|| ApiError::BadRequest("url is required".to_string()))?;
    Ok((context, url))
}

/// POST /translate_with_context/{word}/{from}/{to} - Translate a word.
/// The form's context and url are required but not forwarded to the
/// provider, which has no use for them yet.
#[utoipa::path(
    post,
    path = "/translate_with_context/{word}/{from}/{to}",
    request_body(content = TranslationContextForm, content_type = "application/x-www-form-urlencoded"),
    params(
        ("word" = String, Path, description = "The word to translate, `+` for spaces"),
        ("from" = String, Path, description = "Source language code"),
        ("to" = String, Path, description = "Target language code")
    ),
    responses(
        (status = 200, description = "Translated text", body = String),
        (status = 400, description = "Missing context or url form field")
    )
)]
pub async fn translate_with_context(
    State(state): State<Arc<AppState>>,
    Path((word, from, to)): Path<(String, String, String)>,
    body: Bytes,
) -> Result<String, ApiError> {
    let (_context, _url) = require_translation_context(&body)?;
    let word = tracker::decode_term(&word);
    Ok(state.translator.translate(&word, &from, &to).await?)
}

/// GET /get_page/{url} - Proxy-fetch a raw page body for the reader.
#[utoipa::path(
    get,
    path = "/get_page/{url}",
    params(
        ("url" = String, Path, description = "Percent-encoded address of the page"),
        ("session" = String, Query, description = "Session token")
    ),
    responses((status = 200, description = "Raw page body", body = String))
)]
pub async fn get_page(
    State(state): State<Arc<AppState>>,
    Path(url): Path<String>,
) -> Result<String, ApiError> {
    Ok(state.pages.fetch(&url).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_context_requires_both_form_fields() {
        assert!(matches!(
            require_translation_context(&Bytes::new()),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            require_translation_context(&Bytes::from_static(b"context=The+cat+sat")),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            require_translation_context(&Bytes::from_static(b"url=http%3A%2F%2Fx")),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn translation_context_accepts_a_complete_form() {
        let (context, url) =
            require_translation_context(&Bytes::from_static(b"context=The+cat+sat&url=http%3A%2F%2Fx"))
                .unwrap();
        assert_eq!(context, "The cat sat");
        assert_eq!(url, "http://x");
    }
}
