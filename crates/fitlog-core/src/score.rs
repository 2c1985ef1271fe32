//! Derived-field calculator.
//!
//! Both functions are total over their numeric domains; callers validate
//! ranges first.

/// Daily step goal used to normalise the step count.
pub const STEP_TARGET: f64 = 8000.0;

/// Daily protein goal in grams.
pub const PROTEIN_TARGET_GRAMS: f64 = 180.0;

/// Protein intake as a fraction of the daily target. Not capped; 360 g is
/// `2.0`.
pub fn protein_percentage(protein_grams: u32) -> f64 {
  f64::from(protein_grams) / PROTEIN_TARGET_GRAMS
}

/// Average of the four normalised sub-scores, capped at `1.0`.
///
/// The sub-scores themselves are not clamped: a 16 000-step day contributes
/// `2.0` before averaging. Only the final average is capped.
pub fn composite_score(
  steps: u32,
  clean_eating_score: f64,
  protein_grams: u32,
  lifted_or_stretched: bool,
) -> f64 {
  let steps_normalized = f64::from(steps) / STEP_TARGET;
  let lift = if lifted_or_stretched { 1.0 } else { 0.0 };
  let average = (steps_normalized
    + clean_eating_score
    + protein_percentage(protein_grams)
    + lift)
    / 4.0;
  average.min(1.0)
}
