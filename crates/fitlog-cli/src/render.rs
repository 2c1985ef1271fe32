//! Plain-text rendering of entries and metric history.

use std::fmt::Write as _;

use chrono::Days;
use fitlog_core::{
  entry::{DATE_FORMAT, Entry},
  metric::{self, Metric},
};

/// Width of the intensity bar, in cells.
const BAR_WIDTH: usize = 20;

/// A one-entry summary, printed after a successful `log`.
pub fn entry(entry: &Entry) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "Logged {}", entry.date.format(DATE_FORMAT));
  for m in [
    Metric::Weight,
    Metric::Steps,
    Metric::Eating,
    Metric::Protein,
    Metric::Lift,
    Metric::Composite,
  ] {
    let _ = writeln!(out, "  {:<10} {}", m.to_string(), m.format(m.value(entry)));
  }
  out
}

/// History for one metric, oldest first, followed by a summary line.
pub fn history(metric: Metric, entries: &[Entry]) -> String {
  let sorted = metric::chronological(entries);
  let Some(latest) = sorted.last() else {
    return "No entries yet.\n".to_string();
  };

  let mut out = String::new();
  for e in &sorted {
    let bar = metric.intensity(e).map(bar).unwrap_or_default();
    let _ = writeln!(
      out,
      "{}  {:>12}  {bar}",
      e.date.format(DATE_FORMAT),
      metric.format(metric.value(e)),
    );
  }

  let mean = sorted.iter().map(|e| metric.value(e)).sum::<f64>() / sorted.len() as f64;
  let _ = writeln!(
    out,
    "\n{metric}: latest {}, average {}, {} day streak",
    metric.format(metric.value(latest)),
    metric.format(mean),
    streak(&sorted),
  );
  out
}

/// `intensity` as a bar of [`BAR_WIDTH`] cells. Values outside `[0, 1]` are
/// clamped.
fn bar(intensity: f64) -> String {
  let filled = (intensity.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
  let mut out = "█".repeat(filled);
  out.push_str(&"░".repeat(BAR_WIDTH - filled));
  out
}

/// Consecutive days logged, counting back from the most recent entry.
fn streak(sorted: &[&Entry]) -> usize {
  let mut days = sorted.iter().rev().map(|e| e.date);
  let Some(mut expected) = days.next() else {
    return 0;
  };
  let mut count = 1;
  for date in days {
    match expected.checked_sub_days(Days::new(1)) {
      Some(prev) if prev == date => {
        count += 1;
        expected = prev;
      }
      _ => break,
    }
  }
  count
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone, Utc};
  use fitlog_core::entry::NewEntry;

  use super::*;

  fn entry_on(date: &str, steps: u32) -> Entry {
    NewEntry {
      date:                date.parse::<NaiveDate>().unwrap(),
      weight:              180.5,
      steps,
      clean_eating_score:  0.8,
      protein_grams:       150,
      lifted_or_stretched: true,
      protein_percentage:  None,
      composite_score:     None,
    }
    .into_entry(date.to_string(), Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
  }

  #[test]
  fn bar_is_clamped_and_fixed_width() {
    assert_eq!(bar(0.0), "░".repeat(BAR_WIDTH));
    assert_eq!(bar(1.0), "█".repeat(BAR_WIDTH));
    assert_eq!(bar(1.7), "█".repeat(BAR_WIDTH));
    assert_eq!(bar(0.5).chars().filter(|c| *c == '█').count(), BAR_WIDTH / 2);
  }

  #[test]
  fn streak_counts_back_from_latest() {
    let entries = [
      entry_on("2024-06-01", 8000),
      entry_on("2024-06-03", 8000),
      entry_on("2024-06-04", 8000),
      entry_on("2024-06-05", 8000),
    ];
    let sorted = metric::chronological(&entries);
    assert_eq!(streak(&sorted), 3);
    assert_eq!(streak(&[]), 0);
  }

  #[test]
  fn history_sorts_and_summarises() {
    let entries = [entry_on("2024-06-02", 4000), entry_on("2024-06-01", 8000)];
    let out = history(Metric::Steps, &entries);
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].starts_with("2024-06-01"), "{out}");
    assert!(lines[0].contains("8,000"));
    assert!(lines[1].starts_with("2024-06-02"));
    assert!(lines[1].contains("4,000"));
    assert!(out.contains("steps: latest 4,000, average 6,000, 2 day streak"), "{out}");
  }

  #[test]
  fn history_of_nothing_says_so() {
    assert_eq!(history(Metric::Composite, &[]), "No entries yet.\n");
  }

  #[test]
  fn entry_summary_lists_every_metric() {
    let out = entry(&entry_on("2024-06-01", 9500));
    assert!(out.starts_with("Logged 2024-06-01"));
    assert!(out.contains("9,500"));
    assert!(out.contains("180.5 lbs"));
    assert!(out.contains("composite"));
    assert!(out.contains("96%"));
  }
}
