//! Validator: the only boundary from an untyped request body to a
//! [`NewEntry`].
//!
//! Every field is checked independently so a caller gets all problems in a
//! single round-trip, one message per failing field.

use std::{collections::BTreeMap, fmt};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
  Error, Result,
  entry::{DATE_FORMAT, NewEntry},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Field name → human-readable message, one per failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn get(&self, field: &str) -> Option<&str> {
    self.0.get(field).map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  fn insert(&mut self, field: &str, message: String) {
    self.0.insert(field.to_string(), message);
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, (field, message)) in self.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{field}: {message}")?;
    }
    Ok(())
  }
}

// ─── Field rules ─────────────────────────────────────────────────────────────

struct NumberRule {
  field:    &'static str,
  label:    &'static str,
  integer:  bool,
  in_range: fn(f64) -> bool,
  range:    &'static str,
}

const WEIGHT: NumberRule = NumberRule {
  field:    "weight",
  label:    "Weight",
  integer:  false,
  in_range: |n| n > 0.0 && n <= 500.0,
  range:    "Weight must be between 0 and 500 lbs",
};

const STEPS: NumberRule = NumberRule {
  field:    "steps",
  label:    "Steps",
  integer:  true,
  in_range: |n| (0.0..=100_000.0).contains(&n),
  range:    "Steps must be between 0 and 100000",
};

const CLEAN_EATING_SCORE: NumberRule = NumberRule {
  field:    "clean_eating_score",
  label:    "Clean eating score",
  integer:  false,
  in_range: |n| (0.0..=1.0).contains(&n),
  range:    "Clean eating score must be between 0 and 1",
};

const PROTEIN_GRAMS: NumberRule = NumberRule {
  field:    "protein_grams",
  label:    "Protein grams",
  integer:  true,
  in_range: |n| (0.0..=500.0).contains(&n),
  range:    "Protein grams must be between 0 and 500",
};

const PROTEIN_PERCENTAGE: NumberRule = NumberRule {
  field:    "protein_percentage",
  label:    "Protein percentage",
  integer:  false,
  in_range: |n| (0.0..=10.0).contains(&n),
  range:    "Protein percentage must be between 0 and 10",
};

const COMPOSITE_SCORE: NumberRule = NumberRule {
  field:    "composite_score",
  label:    "Composite score",
  integer:  false,
  in_range: |n| (0.0..=1.0).contains(&n),
  range:    "Composite score must be between 0 and 1",
};

// ─── Entry points ────────────────────────────────────────────────────────────

/// Validate `input` against the entry rules, treating `today` as the latest
/// acceptable date.
///
/// Returns [`Error::MalformedRequest`] if `input` is not a JSON object, and
/// [`Error::Validation`] carrying every failing field otherwise.
pub fn validate(input: &Value, today: NaiveDate) -> Result<NewEntry> {
  let record = input.as_object().ok_or_else(|| {
    Error::MalformedRequest("request body must be a JSON object".to_string())
  })?;

  let mut checker = Checker { record, errors: ValidationErrors::default() };

  let weight = checker.number(&WEIGHT, true);
  let steps = checker.number(&STEPS, true);
  let clean_eating_score = checker.number(&CLEAN_EATING_SCORE, true);
  let protein_grams = checker.number(&PROTEIN_GRAMS, true);
  let lifted_or_stretched = checker.boolean("lifted_or_stretched", "Lifted or stretched");
  let date = checker.date(today);
  let protein_percentage = checker.number(&PROTEIN_PERCENTAGE, false);
  let composite_score = checker.number(&COMPOSITE_SCORE, false);

  match (weight, steps, clean_eating_score, protein_grams, lifted_or_stretched, date) {
    (
      Some(weight),
      Some(steps),
      Some(clean_eating_score),
      Some(protein_grams),
      Some(lifted_or_stretched),
      Some(date),
    ) if checker.errors.is_empty() => Ok(NewEntry {
      date,
      weight,
      // Range-checked above, so these casts are exact.
      steps: steps as u32,
      clean_eating_score,
      protein_grams: protein_grams as u32,
      lifted_or_stretched,
      protein_percentage,
      composite_score,
    }),
    _ => Err(Error::Validation(checker.errors)),
  }
}

/// [`validate`] against the server's local calendar date.
pub fn validate_today(input: &Value) -> Result<NewEntry> {
  validate(input, Local::now().date_naive())
}

/// Parse a `YYYY-MM-DD` string, rejecting anything that does not format back
/// to exactly the same text (`2024-2-3`, `2024-13-40`, `2024-02-30`).
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
  let date = NaiveDate::parse_from_str(s, DATE_FORMAT).ok()?;
  (date.format(DATE_FORMAT).to_string() == s).then_some(date)
}

// ─── Checker ─────────────────────────────────────────────────────────────────

struct Checker<'a> {
  record: &'a Map<String, Value>,
  errors: ValidationErrors,
}

impl Checker<'_> {
  /// `null` is treated the same as an absent key.
  fn get(&self, field: &str) -> Option<&Value> {
    self.record.get(field).filter(|v| !v.is_null())
  }

  fn number(&mut self, rule: &NumberRule, required: bool) -> Option<f64> {
    let Some(raw) = self.get(rule.field) else {
      if required {
        self.errors.insert(rule.field, format!("{} is required", rule.label));
      }
      return None;
    };

    let kind = if rule.integer { "an integer" } else { "a number" };
    let Some(n) = numeric(raw) else {
      self.errors.insert(rule.field, format!("{} must be {kind}", rule.label));
      return None;
    };
    if rule.integer && n.trunc() != n {
      self.errors.insert(rule.field, format!("{} must be {kind}", rule.label));
      return None;
    }
    if !(rule.in_range)(n) {
      self.errors.insert(rule.field, rule.range.to_string());
      return None;
    }
    Some(n)
  }

  fn boolean(&mut self, field: &str, label: &str) -> Option<bool> {
    match self.get(field) {
      None => {
        self.errors.insert(field, format!("{label} is required"));
        None
      }
      Some(Value::Bool(b)) => Some(*b),
      Some(_) => {
        self.errors.insert(field, format!("{label} must be a boolean"));
        None
      }
    }
  }

  fn date(&mut self, today: NaiveDate) -> Option<NaiveDate> {
    let Some(raw) = self.get("date") else {
      self.errors.insert("date", "Date is required".to_string());
      return None;
    };
    let Some(date) = raw.as_str().and_then(parse_calendar_date) else {
      self
        .errors
        .insert("date", "Date must be in YYYY-MM-DD format".to_string());
      return None;
    };
    if date > today {
      self
        .errors
        .insert("date", "Date cannot be in the future".to_string());
      return None;
    }
    Some(date)
  }
}

/// A JSON number, or a string holding one. Non-finite values do not count.
pub(crate) fn numeric(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  }
  .filter(|n| n.is_finite())
}
