//! HTTP front end for fitlog.
//!
//! Wraps the [`fitlog_api`] router with the boundary concerns it leaves to
//! its host: path prefix, CORS, no-cache headers and request tracing.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::{
  Router,
  http::{HeaderValue, Method, header},
};
use config::{Config, ConfigError, Environment, File};
use fitlog_core::store::EntryStore;
use serde::Deserialize;
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  set_header::SetResponseHeaderLayer,
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FITLOG_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub data_file:       PathBuf,
  pub api_prefix:      String,
  /// Origins allowed by CORS. Empty means any origin.
  pub allowed_origins: Vec<String>,
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under the environment.
  ///
  /// `FITLOG_ALLOWED_ORIGINS` is a comma-separated list.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::load_with_env(path, Self::environment())
  }

  fn environment() -> Environment {
    Environment::with_prefix("FITLOG")
      .try_parsing(true)
      .list_separator(",")
      .with_list_parse_key("allowed_origins")
  }

  fn load_with_env(path: &Path, env: Environment) -> Result<Self, ConfigError> {
    Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 8000_i64)?
      .set_default("data_file", "data/entries.json")?
      .set_default("api_prefix", "/api")?
      .set_default("allowed_origins", Vec::<String>::new())?
      .add_source(File::from(path).required(false))
      .add_source(env)
      .build()?
      .try_deserialize()
  }

  pub fn listen_addr(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Application ──────────────────────────────────────────────────────────────

/// Build the full application router for `store`.
pub fn app<S>(config: &ServerConfig, store: Arc<S>) -> anyhow::Result<Router>
where
  S: EntryStore + 'static,
{
  let api = fitlog_api::api_router(store);
  let prefix = config.api_prefix.trim_end_matches('/');
  let router = if prefix.is_empty() {
    api
  } else {
    Router::new().nest(prefix, api)
  };

  Ok(
    router
      .layer(SetResponseHeaderLayer::overriding(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, max-age=0"),
      ))
      .layer(SetResponseHeaderLayer::overriding(
        header::PRAGMA,
        HeaderValue::from_static("no-cache"),
      ))
      .layer(SetResponseHeaderLayer::overriding(
        header::EXPIRES,
        HeaderValue::from_static("0"),
      ))
      .layer(cors(&config.allowed_origins)?)
      .layer(TraceLayer::new_for_http()),
  )
}

fn cors(allowed_origins: &[String]) -> anyhow::Result<CorsLayer> {
  let origin = if allowed_origins.is_empty() {
    AllowOrigin::any()
  } else {
    let origins = allowed_origins
      .iter()
      .map(|o| {
        o.trim()
          .parse::<HeaderValue>()
          .with_context(|| format!("invalid CORS origin {o:?}"))
      })
      .collect::<anyhow::Result<Vec<_>>>()?;
    AllowOrigin::list(origins)
  };

  Ok(
    CorsLayer::new()
      .allow_origin(origin)
      .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
      .allow_headers([header::CONTENT_TYPE]),
  )
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::{Request, StatusCode}};
  use config::Map;
  use fitlog_store_json::JsonStore;
  use tower::ServiceExt as _;

  use super::*;

  fn config(prefix: &str, origins: &[&str]) -> ServerConfig {
    ServerConfig {
      host:            "127.0.0.1".to_string(),
      port:            0,
      data_file:       PathBuf::from("unused.json"),
      api_prefix:      prefix.to_string(),
      allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
    }
  }

  fn store() -> (Arc<JsonStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    (Arc::new(JsonStore::open(dir.path().join("entries.json"))), dir)
  }

  /// Loads with `vars` standing in for the process environment.
  fn load_isolated(path: &Path, vars: &[(&str, &str)]) -> ServerConfig {
    let vars: Map<String, String> =
      vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    ServerConfig::load_with_env(path, ServerConfig::environment().source(Some(vars)))
      .unwrap()
  }

  #[test]
  fn defaults_apply_without_a_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_isolated(&dir.path().join("missing.toml"), &[]);
    assert_eq!(cfg.port, 8000);
    assert_eq!(cfg.api_prefix, "/api");
    assert_eq!(cfg.data_file, PathBuf::from("data/entries.json"));
    assert!(cfg.allowed_origins.is_empty());
  }

  #[test]
  fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
      &path,
      "port = 9100\ndata_file = \"/var/lib/fitlog/entries.json\"\nallowed_origins = [\"http://localhost:3000\"]\n",
    )
    .unwrap();
    let cfg = load_isolated(&path, &[]);
    assert_eq!(cfg.port, 9100);
    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.listen_addr(), "0.0.0.0:9100");
    assert_eq!(cfg.data_file, PathBuf::from("/var/lib/fitlog/entries.json"));
    assert_eq!(cfg.allowed_origins, ["http://localhost:3000"]);
  }

  #[test]
  fn environment_overrides_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = 9100\n").unwrap();
    let cfg = load_isolated(&path, &[
      ("FITLOG_PORT", "9200"),
      ("FITLOG_API_PREFIX", "/v1"),
      ("FITLOG_ALLOWED_ORIGINS", "http://a.test,http://b.test"),
    ]);
    assert_eq!(cfg.port, 9200);
    assert_eq!(cfg.api_prefix, "/v1");
    assert_eq!(cfg.allowed_origins, ["http://a.test", "http://b.test"]);
  }

  #[test]
  fn tilde_is_expanded_only_at_the_start() {
    let plain = Path::new("data/entries.json");
    assert_eq!(expand_tilde(plain), plain);
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/fitlog/entries.json")),
        PathBuf::from(home).join("fitlog/entries.json")
      );
    }
  }

  #[test]
  fn invalid_origin_is_rejected() {
    let (s, _dir) = store();
    assert!(app(&config("/api", &["bad\norigin"]), s).is_err());
  }

  #[tokio::test]
  async fn entries_are_served_under_prefix_with_no_cache_headers() {
    let (s, _dir) = store();
    let app = app(&config("/api", &[]), s).unwrap();
    let resp = app
      .oneshot(Request::get("/api/entries").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cache = resp.headers().get(header::CACHE_CONTROL).unwrap();
    assert_eq!(cache, "no-store, no-cache, must-revalidate, max-age=0");
    assert_eq!(resp.headers().get(header::PRAGMA).unwrap(), "no-cache");
    assert_eq!(resp.headers().get(header::EXPIRES).unwrap(), "0");
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);
  }

  #[tokio::test]
  async fn empty_prefix_mounts_at_root() {
    let (s, _dir) = store();
    let app = app(&config("", &[]), s).unwrap();
    let resp = app
      .oneshot(Request::get("/entries").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn preflight_is_answered_for_allowed_origin() {
    let (s, _dir) = store();
    let app = app(&config("/api", &["http://localhost:3000"]), s).unwrap();
    let req = Request::builder()
      .method(Method::OPTIONS)
      .uri("/api/entries")
      .header(header::ORIGIN, "http://localhost:3000")
      .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert!(resp.status().is_success());
    assert_eq!(
      resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
      "http://localhost:3000"
    );
  }
}
