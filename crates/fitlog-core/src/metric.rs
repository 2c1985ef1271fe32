//! Per-metric projections of stored entries, used by read views.
//!
//! Stores return entries in append order; views sort with [`chronological`]
//! and project each entry onto one [`Metric`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{entry::Entry, score::STEP_TARGET};

/// Starting weight for the heatmap scale (intensity `0`).
pub const WEIGHT_START_LBS: f64 = 210.0;

/// Goal weight for the heatmap scale (intensity `1`).
pub const WEIGHT_GOAL_LBS: f64 = 175.0;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Display,
  EnumIter,
  EnumString,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Metric {
  #[default]
  Composite,
  Weight,
  Steps,
  Eating,
  Protein,
  Lift,
}

impl Metric {
  /// The raw trend value for this metric.
  pub fn value(self, entry: &Entry) -> f64 {
    match self {
      Self::Composite => entry.composite_score,
      Self::Weight => entry.weight,
      Self::Steps => f64::from(entry.steps),
      Self::Eating => entry.clean_eating_score,
      Self::Protein => entry.protein_percentage,
      Self::Lift => {
        if entry.lifted_or_stretched {
          1.0
        } else {
          0.0
        }
      }
    }
  }

  /// Heatmap intensity, normally in `[0, 1]`. `None` means the day has no
  /// cell for this metric.
  ///
  /// Protein is passed through unclamped, like the trend value.
  pub fn intensity(self, entry: &Entry) -> Option<f64> {
    match self {
      Self::Weight => {
        if entry.weight <= 0.0 {
          return None;
        }
        let progress =
          (WEIGHT_START_LBS - entry.weight) / (WEIGHT_START_LBS - WEIGHT_GOAL_LBS);
        Some(progress.clamp(0.0, 1.0))
      }
      Self::Steps => Some((f64::from(entry.steps) / STEP_TARGET).min(1.0)),
      other => Some(other.value(entry)),
    }
  }

  /// Human-readable rendering of a value produced by [`Metric::value`].
  pub fn format(self, value: f64) -> String {
    match self {
      Self::Composite | Self::Eating | Self::Protein => {
        format!("{}%", (value * 100.0).round() as i64)
      }
      Self::Weight => format!("{value:.1} lbs"),
      Self::Steps => group_thousands(value.round() as i64),
      Self::Lift => {
        if value == 1.0 {
          "Yes".to_string()
        } else {
          "No".to_string()
        }
      }
    }
  }
}

/// Entries sorted by `date`, oldest first.
pub fn chronological(entries: &[Entry]) -> Vec<&Entry> {
  let mut sorted: Vec<&Entry> = entries.iter().collect();
  sorted.sort_by_key(|e| e.date);
  sorted
}

fn group_thousands(n: i64) -> String {
  let digits = n.unsigned_abs().to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
  if n < 0 {
    out.push('-');
  }
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}
