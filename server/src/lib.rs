use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use newsrank::persist::{load_checked, IndexPaths};
use newsrank::normalize::fold;
use newsrank::{Document, RankError, SearchOptions, SharedIndex};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub k: Option<usize>,
    #[serde(default)]
    pub all: bool,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f32,
    pub title: String,
    pub url: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub index_dir: PathBuf,
    pub index: Arc<SharedIndex>,
    pub admin_token: Option<String>,
}

type ApiError = (StatusCode, String);

fn api_error(err: RankError) -> ApiError {
    let status = match err {
        RankError::ModelNotBuilt => StatusCode::SERVICE_UNAVAILABLE,
        RankError::InvalidLimit => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Build the router. A missing or unreadable snapshot is not fatal: the server
/// starts without an index and `/search` answers 503 until `/index/reload` succeeds.
pub fn build_app(index_dir: String) -> Result<Router> {
    let index = Arc::new(SharedIndex::new());
    match load_checked(&IndexPaths::new(&index_dir)) {
        Ok((loaded, meta)) => {
            tracing::info!(num_docs = meta.num_docs, num_terms = meta.num_terms, created_at = %meta.created_at, "index loaded");
            index.replace(loaded);
        }
        Err(err) => tracing::warn!(index_dir, error = %err, "no index loaded at startup"),
    }
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app_state = AppState { index_dir: PathBuf::from(&index_dir), index, admin_token };
    Ok(router(app_state))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let index = state.index.snapshot().map_err(api_error)?;

    let defaults = index.config().search_options();
    let opts = SearchOptions {
        limit: params.k.unwrap_or(defaults.limit).clamp(1, 100),
        score_floor: defaults.score_floor,
        require_all_terms: params.all,
    };
    let page = index.search_page(&params.q, &opts).map_err(api_error)?;

    let pattern = terms_pattern(&params.q);
    let results = page
        .hits
        .into_iter()
        .filter_map(|hit| {
            let doc = index.document(hit.doc_id)?;
            Some(SearchHit {
                doc_id: hit.doc_id,
                score: hit.score,
                title: doc.title.clone(),
                url: doc.url.clone(),
                snippet: snippet_from_text(&doc.text(), pattern.as_ref()),
            })
        })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: page.total_hits, results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<u32>) -> Result<Json<Document>, ApiError> {
    let index = state.index.snapshot().map_err(api_error)?;
    match index.document(doc_id) {
        Some(doc) => Ok(Json(doc.clone())),
        None => Err((StatusCode::NOT_FOUND, "not found".into())),
    }
}

/// Reload the snapshot from disk and swap it in; readers keep the old index until then.
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let paths = IndexPaths::new(&state.index_dir);
    let (loaded, meta) = tokio::task::spawn_blocking(move || load_checked(&paths))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::error!(error = %e, "index reload failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    state.index.replace(loaded);
    tracing::info!(num_docs = meta.num_docs, "index reloaded");
    Ok(Json(serde_json::json!({ "num_docs": meta.num_docs, "num_terms": meta.num_terms, "created_at": meta.created_at })))
}

/// One alternation over the folded query words, longest first.
fn terms_pattern(query: &str) -> Option<Regex> {
    let mut terms: Vec<String> = query.split_whitespace().map(fold).filter(|t| !t.is_empty()).collect();
    if terms.is_empty() { return None; }
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    terms.dedup();
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    Regex::new(&alternation).ok()
}

/// Folded text plus, for every folded byte, the index of the source char it came from.
fn fold_with_origin(chars: &[char]) -> (String, Vec<usize>) {
    let mut folded = String::new();
    let mut origin = Vec::new();
    let mut buf = [0u8; 4];
    for (ci, c) in chars.iter().enumerate() {
        let f = fold(c.encode_utf8(&mut buf));
        origin.extend(std::iter::repeat(ci).take(f.len()));
        folded.push_str(&f);
    }
    (folded, origin)
}

/// Window of the text around the first match, HTML-escaped, with matches in `<em>`.
/// Matching runs on folded text so accents and case don't prevent highlighting.
fn snippet_from_text(text: &str, pattern: Option<&Regex>) -> Option<String> {
    if text.trim().is_empty() { return None; }
    let chars: Vec<char> = text.chars().collect();
    let (folded, origin) = fold_with_origin(&chars);
    // match ranges in source char offsets
    let matches: Vec<(usize, usize)> = pattern
        .map(|re| re.find_iter(&folded).map(|m| (origin[m.start()], origin[m.end() - 1] + 1)).collect())
        .unwrap_or_default();

    let (mut start, mut end) = match matches.first() {
        Some(&(idx, _)) => {
            let start = idx.saturating_sub(100);
            (start, (start + 300).min(chars.len()))
        }
        None => (0, 200.min(chars.len())),
    };
    while start < end && chars[start].is_whitespace() { start += 1; }
    while end > start && chars[end - 1].is_whitespace() { end -= 1; }

    let mut out = String::new();
    let mut cursor = start;
    for &(m_start, m_end) in &matches {
        if m_start < cursor || m_end > end { continue; }
        push_escaped(&mut out, &chars[cursor..m_start]);
        out.push_str("<em>");
        push_escaped(&mut out, &chars[m_start..m_end]);
        out.push_str("</em>");
        cursor = m_end;
    }
    push_escaped(&mut out, &chars[cursor..end]);
    Some(out)
}

fn push_escaped(out: &mut String, chars: &[char]) {
    for &c in chars {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(text: &str, query: &str) -> Option<String> {
        snippet_from_text(text, terms_pattern(query).as_ref())
    }

    #[test]
    fn snippet_highlights_terms_case_insensitively() {
        let s = snippet("Le Chat noir\n\nLe chat mange.", "chat").unwrap();
        assert_eq!(s, "Le <em>Chat</em> noir\n\nLe <em>chat</em> mange.");
    }

    #[test]
    fn snippet_handles_accented_text() {
        let text = format!("{} café crème", "é".repeat(150));
        let s = snippet(&text, "crème").unwrap();
        assert!(s.ends_with("<em>crème</em>"));
    }

    #[test]
    fn folded_query_highlights_accented_words() {
        let text = format!("{} Visite à l'Élysée hier.", "x ".repeat(150));
        let s = snippet(&text, "elysee").unwrap();
        assert!(s.contains("l&#39;<em>Élysée</em> hier."), "{s}");
        assert!(!s.starts_with(&"x ".repeat(60)));
    }

    #[test]
    fn query_words_never_rewrite_markup() {
        assert_eq!(snippet("Le chat dort", "chat em").unwrap(), "Le <em>chat</em> dort");
        assert_eq!(snippet("Le chat dort", "em chat").unwrap(), "Le <em>chat</em> dort");
    }

    #[test]
    fn document_markup_is_escaped() {
        let s = snippet("<b>chat</b> & co", "chat").unwrap();
        assert_eq!(s, "&lt;b&gt;<em>chat</em>&lt;/b&gt; &amp; co");
    }

    #[test]
    fn no_match_falls_back_to_leading_text() {
        assert_eq!(snippet("  Le chat dort  ", "chien").unwrap(), "Le chat dort");
        assert_eq!(snippet("Le chat dort", "").unwrap(), "Le chat dort");
    }

    #[test]
    fn empty_text_has_no_snippet() {
        assert!(snippet("\n\n", "x").is_none());
    }
}
