//! Entry and Document, the persisted data model.
//!
//! An entry is one calendar day's measurements. Entries are immutable once
//! stored and the date is the unique key; the document is the whole
//! collection plus metadata and is always read and rewritten in full.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

use crate::{score, validate::numeric};

/// Schema tag written into every new document.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Wire and storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Candidate ───────────────────────────────────────────────────────────────

/// A validated entry that has not been stored yet.
///
/// Only [`crate::validate::validate`] produces these from request bodies; the
/// derived fields are `None` when the client did not send them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
  pub date:                NaiveDate,
  pub weight:              f64,
  pub steps:               u32,
  pub clean_eating_score:  f64,
  pub protein_grams:       u32,
  pub lifted_or_stretched: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub protein_percentage:  Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub composite_score:     Option<f64>,
}

impl NewEntry {
  /// Fill in `protein_percentage` and `composite_score` from the raw fields
  /// where the client left them out. Supplied values are kept as-is.
  pub fn with_derived_fields(mut self) -> Self {
    self
      .protein_percentage
      .get_or_insert_with(|| score::protein_percentage(self.protein_grams));
    self.composite_score.get_or_insert_with(|| {
      score::composite_score(
        self.steps,
        self.clean_eating_score,
        self.protein_grams,
        self.lifted_or_stretched,
      )
    });
    self
  }

  /// Turn the candidate into a stored entry with the given identity.
  pub fn into_entry(self, id: String, timestamp: DateTime<Utc>) -> Entry {
    let protein_percentage = self
      .protein_percentage
      .unwrap_or_else(|| score::protein_percentage(self.protein_grams));
    let composite_score = self.composite_score.unwrap_or_else(|| {
      score::composite_score(
        self.steps,
        self.clean_eating_score,
        self.protein_grams,
        self.lifted_or_stretched,
      )
    });
    Entry {
      id,
      timestamp,
      date: self.date,
      weight: self.weight,
      steps: self.steps,
      clean_eating_score: self.clean_eating_score,
      protein_grams: self.protein_grams,
      protein_percentage,
      lifted_or_stretched: self.lifted_or_stretched,
      composite_score,
    }
  }
}

// ─── Stored entry ────────────────────────────────────────────────────────────

/// A stored entry. `id` and `timestamp` are assigned once, by the store.
///
/// `id` is a plain string: documents written by earlier deployments used the
/// creation timestamp as the id, and those must keep parsing. Deserialising
/// goes through the looser `StoredEntry` shape for the same reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredEntry")]
pub struct Entry {
  pub id:                  String,
  pub timestamp:           DateTime<Utc>,
  pub date:                NaiveDate,
  pub weight:              f64,
  pub steps:               u32,
  pub clean_eating_score:  f64,
  pub protein_grams:       u32,
  pub protein_percentage:  f64,
  pub lifted_or_stretched: bool,
  pub composite_score:     f64,
}

/// An entry as it may appear on disk. Earlier deployments stored the request
/// body verbatim, so numbers can be numeric strings and the derived fields
/// can be missing.
#[derive(Deserialize)]
struct StoredEntry {
  id:                  String,
  timestamp:           DateTime<Utc>,
  date:                NaiveDate,
  #[serde(deserialize_with = "loose_number")]
  weight:              f64,
  #[serde(deserialize_with = "loose_count")]
  steps:               u32,
  #[serde(deserialize_with = "loose_number")]
  clean_eating_score:  f64,
  #[serde(deserialize_with = "loose_count")]
  protein_grams:       u32,
  #[serde(default, deserialize_with = "loose_optional_number")]
  protein_percentage:  Option<f64>,
  lifted_or_stretched: bool,
  #[serde(default, deserialize_with = "loose_optional_number")]
  composite_score:     Option<f64>,
}

impl From<StoredEntry> for Entry {
  fn from(stored: StoredEntry) -> Self {
    NewEntry {
      date:                stored.date,
      weight:              stored.weight,
      steps:               stored.steps,
      clean_eating_score:  stored.clean_eating_score,
      protein_grams:       stored.protein_grams,
      lifted_or_stretched: stored.lifted_or_stretched,
      protein_percentage:  stored.protein_percentage,
      composite_score:     stored.composite_score,
    }
    .into_entry(stored.id, stored.timestamp)
  }
}

fn loose_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
  let raw = Value::deserialize(deserializer)?;
  numeric(&raw).ok_or_else(|| de::Error::custom(format!("expected a number, found {raw}")))
}

/// A non-negative whole number, also accepted as `8000.0` or `"8000"`.
fn loose_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
  let n = loose_number(deserializer)?;
  if n.trunc() == n && (0.0..=f64::from(u32::MAX)).contains(&n) {
    Ok(n as u32)
  } else {
    Err(de::Error::custom(format!("expected a whole number, found {n}")))
  }
}

fn loose_optional_number<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> Result<Option<f64>, D::Error> {
  match Option::<Value>::deserialize(deserializer)? {
    None | Some(Value::Null) => Ok(None),
    Some(raw) => numeric(&raw)
      .map(Some)
      .ok_or_else(|| de::Error::custom(format!("expected a number, found {raw}"))),
  }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// The full persisted collection.
///
/// `entries` is in append order, never sorted by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  pub version:      String,
  pub created:      DateTime<Utc>,
  pub last_updated: DateTime<Utc>,
  pub entries:      Vec<Entry>,
}

impl Document {
  /// A fresh document with no entries, created at `now`.
  pub fn empty(now: DateTime<Utc>) -> Self {
    Self {
      version:      DOCUMENT_VERSION.to_string(),
      created:      now,
      last_updated: now,
      entries:      Vec::new(),
    }
  }

  pub fn find_by_date(&self, date: NaiveDate) -> Option<&Entry> {
    self.entries.iter().find(|e| e.date == date)
  }

  /// Parse a stored document, keeping every entry that can be read.
  ///
  /// Fails only when the envelope itself is unusable. Entries that do not
  /// parse are left out of the document and reported in
  /// [`StoredDocument::skipped`].
  pub fn from_stored(bytes: &[u8]) -> serde_json::Result<StoredDocument> {
    #[derive(Deserialize)]
    struct Envelope {
      version:      String,
      created:      DateTime<Utc>,
      last_updated: DateTime<Utc>,
      entries:      Vec<Value>,
    }

    let envelope: Envelope = serde_json::from_slice(bytes)?;
    let mut entries = Vec::with_capacity(envelope.entries.len());
    let mut skipped = Vec::new();
    for (index, raw) in envelope.entries.into_iter().enumerate() {
      match serde_json::from_value::<Entry>(raw) {
        Ok(entry) => entries.push(entry),
        Err(error) => skipped.push(SkippedEntry { index, error }),
      }
    }

    Ok(StoredDocument {
      document: Document {
        version: envelope.version,
        created: envelope.created,
        last_updated: envelope.last_updated,
        entries,
      },
      skipped,
    })
  }

  /// Append `entry` and bump `last_updated`. Duplicate checking is the
  /// caller's job.
  pub fn push(&mut self, entry: Entry) {
    self.last_updated = entry.timestamp;
    self.entries.push(entry);
  }
}

/// Result of [`Document::from_stored`].
#[derive(Debug)]
pub struct StoredDocument {
  pub document: Document,
  pub skipped:  Vec<SkippedEntry>,
}

/// An entry that could not be read, by position in the stored array.
#[derive(Debug)]
pub struct SkippedEntry {
  pub index: usize,
  pub error: serde_json::Error,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn june_first() -> NewEntry {
    NewEntry {
      date:                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
      weight:              180.5,
      steps:               9500,
      clean_eating_score:  0.8,
      protein_grams:       150,
      lifted_or_stretched: true,
      protein_percentage:  None,
      composite_score:     None,
    }
  }

  #[test]
  fn missing_derived_fields_are_computed() {
    let entry = june_first().into_entry("a".into(), Utc::now());
    assert!((entry.protein_percentage - 150.0 / 180.0).abs() < 1e-12);
    assert!((entry.composite_score - 0.955208333).abs() < 1e-6);
  }

  #[test]
  fn supplied_derived_fields_are_kept() {
    let mut candidate = june_first();
    candidate.protein_percentage = Some(0.5);
    candidate.composite_score = Some(0.25);
    let entry = candidate.into_entry("a".into(), Utc::now());
    assert_eq!(entry.protein_percentage, 0.5);
    assert_eq!(entry.composite_score, 0.25);
  }

  #[test]
  fn entry_serialises_with_wire_names() {
    let ts = DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
      .unwrap()
      .with_timezone(&Utc);
    let entry = june_first().into_entry("id-1".into(), ts);
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["date"], "2024-06-01");
    assert_eq!(json["steps"], 9500);
    assert_eq!(json["lifted_or_stretched"], true);
    assert_eq!(json["id"], "id-1");
    assert!(json["timestamp"].as_str().unwrap().starts_with("2024-06-01T12:00:00"));
  }

  #[test]
  fn legacy_timestamp_ids_still_parse() {
    let raw = r#"{
      "id": "2024-06-01T10:00:00+00:00",
      "timestamp": "2024-06-01T10:00:00+00:00",
      "date": "2024-06-01",
      "weight": 180.5,
      "steps": 9500,
      "clean_eating_score": 0.8,
      "protein_grams": 150,
      "protein_percentage": 0.8333,
      "lifted_or_stretched": true,
      "composite_score": 0.9552
    }"#;
    let entry: Entry = serde_json::from_str(raw).unwrap();
    assert_eq!(entry.id, "2024-06-01T10:00:00+00:00");
    assert_eq!(entry.timestamp.to_rfc3339(), "2024-06-01T10:00:00+00:00");
  }

  #[test]
  fn request_shaped_entries_are_read_loosely() {
    let raw = r#"{
      "id": "2024-05-30T08:00:00+02:00",
      "timestamp": "2024-05-30T08:00:00+02:00",
      "date": "2024-05-30",
      "weight": "182.5",
      "steps": "8000",
      "clean_eating_score": 0.5,
      "protein_grams": 90.0,
      "lifted_or_stretched": false,
      "protein_percentage": null
    }"#;
    let entry: Entry = serde_json::from_str(raw).unwrap();
    assert_eq!(entry.weight, 182.5);
    assert_eq!(entry.steps, 8000);
    assert_eq!(entry.protein_grams, 90);
    assert_eq!(entry.protein_percentage, 0.5);
    assert_eq!(entry.composite_score, score::composite_score(8000, 0.5, 90, false));
    assert_eq!(entry.timestamp.to_rfc3339(), "2024-05-30T06:00:00+00:00");
  }

  #[test]
  fn fractional_counts_are_rejected() {
    let raw = r#"{
      "id": "a", "timestamp": "2024-05-30T08:00:00Z", "date": "2024-05-30",
      "weight": 182.5, "steps": 3.5, "clean_eating_score": 0.5,
      "protein_grams": 90, "lifted_or_stretched": false
    }"#;
    assert!(serde_json::from_str::<Entry>(raw).is_err());
  }

  #[test]
  fn from_stored_keeps_readable_entries() {
    let raw = br#"{
      "version": "1.0",
      "created": "2024-05-01T08:00:00Z",
      "last_updated": "2024-05-31T08:00:00Z",
      "entries": [
        { "id": "a", "timestamp": "2024-05-30T08:00:00Z", "date": "2024-05-30",
          "weight": 182, "steps": 7000, "clean_eating_score": 0.6,
          "protein_grams": 120, "lifted_or_stretched": false },
        { "id": "b", "timestamp": "2024-05-31T08:00:00Z", "date": "not a date",
          "weight": 181, "steps": 7000, "clean_eating_score": 0.6,
          "protein_grams": 120, "lifted_or_stretched": false },
        { "id": "c", "timestamp": "2024-06-01T08:00:00Z", "date": "2024-06-01",
          "weight": 180, "steps": "9000", "clean_eating_score": 0.7,
          "protein_grams": 140, "lifted_or_stretched": true }
      ]
    }"#;
    let stored = Document::from_stored(raw).unwrap();
    let ids: Vec<&str> = stored.document.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["a", "c"]);
    assert_eq!(stored.skipped.len(), 1);
    assert_eq!(stored.skipped[0].index, 1);
    assert_eq!(stored.document.created.to_rfc3339(), "2024-05-01T08:00:00+00:00");
  }

  #[test]
  fn from_stored_rejects_a_broken_envelope() {
    assert!(Document::from_stored(br#"{"entries": "nope"}"#).is_err());
    assert!(Document::from_stored(b"{ not json").is_err());
  }

  #[test]
  fn push_bumps_last_updated() {
    let created = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
      .unwrap()
      .with_timezone(&Utc);
    let later = DateTime::parse_from_rfc3339("2024-06-01T08:00:00Z")
      .unwrap()
      .with_timezone(&Utc);
    let mut doc = Document::empty(created);
    assert_eq!(doc.version, DOCUMENT_VERSION);

    doc.push(june_first().into_entry("x".into(), later));
    assert_eq!(doc.created, created);
    assert_eq!(doc.last_updated, later);
    assert!(doc.find_by_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).is_some());
    assert!(doc.find_by_date(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()).is_none());
  }
}
