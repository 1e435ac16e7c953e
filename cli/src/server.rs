//! HTTP server for fontpick, the matchmaker's front desk (made by FontLab https://www.fontlab.com/)
//!
//! Visitors describe the font they have in mind, in the same pattern syntax
//! the command line takes, and leave with a path to the closest face. One
//! shared manager answers everyone, so the catalog is built once and every
//! later request reuses it along with the memoized answers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task;

use fontpick_core::catalog::{FontEntry, FontKind};
use fontpick_core::error::FontError;
use fontpick_core::manager::FontManager;
use fontpick_core::matcher::FindOptions;
use fontpick_core::pattern::parse_pattern;

/// A description of the font someone is hoping to find.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MatchRequest {
    /// Pattern such as `"DejaVu Sans-12:bold:italic"`
    pub pattern: String,
    /// Outline fonts unless metric files are asked for
    pub kind: FontKind,
    /// Restrict candidates to this directory tree
    pub directory: Option<PathBuf>,
    /// Try the default family when nothing fits
    pub fallback_to_default: bool,
    /// Rebuild the catalog once when the chosen file has vanished
    pub rebuild_if_missing: bool,
}

impl Default for MatchRequest {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            kind: FontKind::Outline,
            directory: None,
            fallback_to_default: true,
            rebuild_if_missing: true,
        }
    }
}

/// The chosen file plus any notices raised while choosing it.
#[derive(Debug, Serialize, Deserialize)]
pub struct MatchResponse {
    pub path: PathBuf,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FontsQuery {
    pub kind: FontKind,
}

/// Every face of one kind, as the catalog remembers it.
#[derive(Debug, Serialize, Deserialize)]
pub struct FontsResponse {
    pub kind: FontKind,
    pub fonts: Vec<FontEntry>,
}

/// Head counts after a fresh scan.
#[derive(Debug, Serialize, Deserialize)]
pub struct RebuildResponse {
    pub outline: usize,
    pub metric: usize,
    pub skipped: usize,
}

/// Bind `bind` and answer requests until the process is stopped.
pub async fn serve(bind: &str, manager: Arc<FontManager>) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding HTTP server to {bind}"))?;

    axum::serve(listener, router(manager))
        .await
        .context("serving HTTP")?;
    Ok(())
}

/// Routing table: a health check, lookups, listings and forced rebuilds.
pub fn router(manager: Arc<FontManager>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/match", post(match_handler))
        .route("/fonts", get(fonts_handler))
        .route("/rebuild", post(rebuild_handler))
        .with_state(manager)
}

async fn match_handler(
    State(manager): State<Arc<FontManager>>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, (StatusCode, String)> {
    if req.pattern.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "a font pattern is required".to_string(),
        ));
    }

    let mut opts = FindOptions::default()
        .kind(req.kind)
        .fallback_to_default(req.fallback_to_default)
        .rebuild_if_missing(req.rebuild_if_missing);
    if let Some(dir) = req.directory {
        opts = opts.within(dir);
    }

    let props = parse_pattern(&req.pattern, &manager.config().style).map_err(lookup_error)?;

    // Lookups may stat files or rebuild the catalog, so keep them off the reactor.
    let (outcome, diagnostics) =
        task::spawn_blocking(move || manager.find_font_with_diagnostics(&props, &opts))
            .await
            .map_err(join_error)?;

    let path = outcome.map_err(lookup_error)?;
    let warnings = diagnostics.iter().map(ToString::to_string).collect();

    Ok(Json(MatchResponse { path, warnings }))
}

async fn fonts_handler(
    State(manager): State<Arc<FontManager>>,
    Query(query): Query<FontsQuery>,
) -> Json<FontsResponse> {
    let catalog = manager.catalog();
    Json(FontsResponse {
        kind: query.kind,
        fonts: catalog.entries(query.kind).to_vec(),
    })
}

async fn rebuild_handler(
    State(manager): State<Arc<FontManager>>,
) -> Result<Json<RebuildResponse>, (StatusCode, String)> {
    let catalog = task::spawn_blocking(move || manager.rebuild())
        .await
        .map_err(join_error)?;

    Ok(Json(RebuildResponse {
        outline: catalog.entries(FontKind::Outline).len(),
        metric: catalog.entries(FontKind::Metric).len(),
        skipped: catalog.skipped().len(),
    }))
}

fn lookup_error(err: FontError) -> (StatusCode, String) {
    let status = match err {
        FontError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, err.to_string())
}

fn join_error(err: task::JoinError) -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("task join error: {err}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use fontpick_core::config::ManagerConfig;
    use fontpick_core::error::ExtractError;
    use fontpick_core::extract::{FaceInfo, FontExtractor};
    use fontpick_core::properties::{FontWeight, NamedWeight};
    use http_body_util::BodyExt;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};
    use tower::util::ServiceExt;

    /// Reads the family from the file stem; a `-Bold` suffix makes the face bold.
    struct StemExtractor;

    impl FontExtractor for StemExtractor {
        fn extract(&self, path: &Path, _kind: FontKind) -> Result<FaceInfo, ExtractError> {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            let face = match stem.strip_suffix("-Bold") {
                Some(family) => FaceInfo {
                    weight: FontWeight::Named(NamedWeight::Bold),
                    ..FaceInfo::new(family)
                },
                None => FaceInfo::new(stem),
            };
            Ok(face)
        }
    }

    fn manager_with(files: &[&str]) -> (TempDir, Arc<FontManager>) {
        let dir = tempdir().expect("tempdir");
        for file in files {
            fs::write(dir.path().join(file), b"").expect("touch font");
        }
        let config = ManagerConfig {
            font_paths: vec![dir.path().to_path_buf()],
            include_system_fonts: false,
            use_fontconfig: false,
            ..ManagerConfig::default()
        };
        let manager = FontManager::builder(config)
            .extractor(StemExtractor)
            .without_snapshot()
            .build();
        (dir, Arc::new(manager))
    }

    async fn post_json(app: Router, uri: &str, payload: serde_json::Value) -> (StatusCode, Vec<u8>) {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let (_dir, manager) = manager_with(&[]);
        let app = router(manager);
        let request = Request::get("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"ok");
    }

    #[tokio::test]
    async fn match_endpoint_picks_the_bold_face() {
        let (_dir, manager) = manager_with(&["Acme.ttf", "Acme-Bold.ttf"]);
        let (status, body) =
            post_json(router(manager), "/match", json!({"pattern": "Acme:bold"})).await;

        assert_eq!(status, StatusCode::OK);
        let parsed: MatchResponse = serde_json::from_slice(&body).expect("parse response");
        assert!(parsed.path.ends_with("Acme-Bold.ttf"), "{parsed:?}");
        assert!(parsed.warnings.is_empty());
    }

    #[tokio::test]
    async fn match_endpoint_reports_fallback_warnings() {
        let (_dir, manager) = manager_with(&["Acme.ttf"]);
        let (status, body) =
            post_json(router(manager), "/match", json!({"pattern": "Nowhere Grotesk"})).await;

        assert_eq!(status, StatusCode::OK);
        let parsed: MatchResponse = serde_json::from_slice(&body).expect("parse response");
        assert!(parsed.path.ends_with("Acme.ttf"));
        assert!(
            parsed.warnings.iter().any(|w| w.contains("falling back")),
            "warnings: {:?}",
            parsed.warnings
        );
    }

    #[tokio::test]
    async fn concurrent_matches_keep_their_own_warnings() {
        let (_dir, manager) = manager_with(&["Acme.ttf", "Acme-Bold.ttf"]);
        let app = router(manager);

        let (exact, fallback) = tokio::join!(
            post_json(app.clone(), "/match", json!({"pattern": "Acme:bold"})),
            post_json(app.clone(), "/match", json!({"pattern": "Nowhere Grotesk"})),
        );
        let exact: MatchResponse = serde_json::from_slice(&exact.1).expect("parse response");
        let fallback: MatchResponse = serde_json::from_slice(&fallback.1).expect("parse response");
        assert!(exact.warnings.is_empty(), "{exact:?}");
        assert!(fallback.warnings.iter().any(|w| w.contains("falling back")));

        // The answer is memoized now; asking again repeats its warnings.
        let (_, again) = post_json(app, "/match", json!({"pattern": "Nowhere Grotesk"})).await;
        let again: MatchResponse = serde_json::from_slice(&again).expect("parse response");
        assert_eq!(again.warnings, fallback.warnings);
    }

    #[tokio::test]
    async fn match_endpoint_requires_a_pattern() {
        let (_dir, manager) = manager_with(&["Acme.ttf"]);
        let (status, body) = post_json(router(manager), "/match", json!({"pattern": "  "})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let text = String::from_utf8(body).expect("utf8 body");
        assert!(text.contains("a font pattern is required"), "body: {text}");
    }

    #[tokio::test]
    async fn match_endpoint_rejects_bad_patterns() {
        let (_dir, manager) = manager_with(&["Acme.ttf"]);
        let (status, _) =
            post_json(router(manager), "/match", json!({"pattern": "Acme:weight=9000"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_catalog_without_rebuild_is_not_found() {
        let (_dir, manager) = manager_with(&[]);
        let payload = json!({"pattern": "Acme", "rebuild_if_missing": false});
        let (status, _) = post_json(router(manager), "/match", payload).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn fonts_endpoint_lists_the_requested_kind() {
        let (_dir, manager) = manager_with(&["Acme.ttf", "Acme-Bold.ttf", "phvr.afm"]);
        let app = router(manager);

        let request = Request::get("/fonts?kind=metric").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let metric: FontsResponse = serde_json::from_slice(&body).expect("parse response");
        assert_eq!(metric.kind, FontKind::Metric);
        assert_eq!(metric.fonts.len(), 1);

        let request = Request::get("/fonts").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let outline: FontsResponse = serde_json::from_slice(&body).expect("parse response");
        assert_eq!(outline.kind, FontKind::Outline);
        assert_eq!(outline.fonts.len(), 2);
    }

    #[tokio::test]
    async fn rebuild_endpoint_sees_new_files() {
        let (dir, manager) = manager_with(&["Acme.ttf"]);
        fs::write(dir.path().join("Later.ttf"), b"").expect("touch font");

        let (status, body) = post_json(router(Arc::clone(&manager)), "/rebuild", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let parsed: RebuildResponse = serde_json::from_slice(&body).expect("parse response");
        assert_eq!(parsed.outline, 2);
        assert_eq!(parsed.metric, 0);
        assert_eq!(manager.rebuild_count(), 1);
    }
}
