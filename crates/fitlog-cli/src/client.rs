//! Async HTTP client wrapping the fitlog JSON API.

use std::{collections::BTreeMap, time::Duration};

use anyhow::{Context, Result, anyhow};
use fitlog_core::entry::{Entry, NewEntry};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// The server's response envelope. Which fields are present depends on the
/// endpoint and on `success`.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
  pub success: bool,
  #[serde(default)]
  pub entries: Vec<Entry>,
  pub entry:   Option<Entry>,
  pub count:   Option<usize>,
  pub version: Option<String>,
  pub error:   Option<String>,
  #[serde(default)]
  pub details: BTreeMap<String, String>,
}

/// Outcome of a submission the server answered.
#[derive(Debug)]
pub enum Submission {
  Stored(Entry),
  Rejected {
    status:  StatusCode,
    error:   String,
    details: BTreeMap<String, String>,
  },
}

/// Async HTTP client for the fitlog REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  /// `GET /api/entries`
  pub async fn list_entries(&self) -> Result<Vec<Entry>> {
    let resp = self
      .client
      .get(self.url("/entries"))
      .send()
      .await
      .context("GET /entries failed")?;

    let status = resp.status();
    let body: ApiResponse = resp.json().await.context("deserialising entries")?;
    if !status.is_success() || !body.success {
      return Err(anyhow!(
        "GET /entries → {status}: {}",
        body.error.as_deref().unwrap_or("unknown error")
      ));
    }
    tracing::debug!(count = ?body.count, version = ?body.version, "fetched entries");
    Ok(body.entries)
  }

  /// `POST /api/entries`
  ///
  /// Rejections (validation, duplicate date, server failure) come back as
  /// [`Submission::Rejected`]; only transport errors are `Err`.
  pub async fn submit_entry(&self, entry: &NewEntry) -> Result<Submission> {
    let resp = self
      .client
      .post(self.url("/entries"))
      .json(entry)
      .send()
      .await
      .context("POST /entries failed")?;

    let status = resp.status();
    let body: ApiResponse = resp.json().await.context("deserialising response")?;
    match body.entry {
      Some(entry) if status.is_success() && body.success => Ok(Submission::Stored(entry)),
      _ => Ok(Submission::Rejected {
        status,
        error: body.error.unwrap_or_else(|| status.to_string()),
        details: body.details,
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_joins_base_and_api_path() {
    let client = ApiClient::new("http://localhost:8000/").unwrap();
    assert_eq!(client.url("/entries"), "http://localhost:8000/api/entries");
  }

  #[test]
  fn failure_envelope_parses_without_entries() {
    let body: ApiResponse = serde_json::from_str(
      r#"{"success":false,"error":"Validation failed","details":{"weight":"Weight is required"}}"#,
    )
    .unwrap();
    assert!(!body.success);
    assert!(body.entries.is_empty());
    assert!(body.entry.is_none());
    assert_eq!(body.details["weight"], "Weight is required");
  }

  #[test]
  fn list_envelope_parses_entries() {
    let body: ApiResponse = serde_json::from_str(
      r#"{"success":true,"count":1,"version":"1.0","entries":[{
        "id":"a","timestamp":"2024-06-01T12:00:00Z","date":"2024-06-01",
        "weight":180.5,"steps":9500,"clean_eating_score":0.8,"protein_grams":150,
        "protein_percentage":0.8333,"lifted_or_stretched":true,"composite_score":0.9552
      }]}"#,
    )
    .unwrap();
    assert_eq!(body.count, Some(1));
    assert_eq!(body.version.as_deref(), Some("1.0"));
    assert_eq!(body.entries[0].steps, 9500);
  }
}
