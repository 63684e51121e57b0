//! Grade scale and grade resolution.
//!
//! # Responsibility
//! - Hold the score bands that map a numeric score to a letter and point.
//! - Resolve scores against an explicitly passed scale.
//!
//! # Invariants
//! - A scale built through [`GradeScale::new`] has non-overlapping bands that
//!   cover every score in `[MIN_SCORE, MAX_SCORE]` exactly once.
//! - Resolution never clamps or defaults; an uncovered score is an error.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lowest valid score.
pub const MIN_SCORE: i64 = 0;
/// Highest valid score.
pub const MAX_SCORE: i64 = 100;

/// One score interval mapped to a letter grade and grade point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeBand {
    pub letter: String,
    pub point: i64,
    /// Inclusive lower bound.
    pub min_score: i64,
    /// Inclusive upper bound.
    pub max_score: i64,
}

impl GradeBand {
    pub fn new(letter: impl Into<String>, point: i64, min_score: i64, max_score: i64) -> Self {
        Self {
            letter: letter.into(),
            point,
            min_score,
            max_score,
        }
    }

    pub fn contains(&self, score: i64) -> bool {
        self.min_score <= score && score <= self.max_score
    }
}

/// Letter grade and point resolved for one score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedGrade {
    pub letter: String,
    pub point: i64,
}

/// Grade scale configuration or lookup failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradeScaleError {
    /// Scale has no bands at all.
    Empty,
    /// One band is malformed on its own.
    InvalidBand {
        letter: String,
        reason: &'static str,
    },
    /// Two bands share at least one score.
    Overlap { first: String, second: String },
    /// Scores in `from..=to` are not covered by any band.
    Gap { from: i64, to: i64 },
    /// No configured band covers this score.
    NoMatchingBand(i64),
}

impl Display for GradeScaleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "grade scale has no bands"),
            Self::InvalidBand { letter, reason } => {
                write!(f, "invalid grade band `{letter}`: {reason}")
            }
            Self::Overlap { first, second } => {
                write!(f, "grade bands `{first}` and `{second}` overlap")
            }
            Self::Gap { from, to } => write!(f, "grade scale does not cover scores {from}..={to}"),
            Self::NoMatchingBand(score) => write!(f, "no grade band matches score {score}"),
        }
    }
}

impl Error for GradeScaleError {}

/// Ordered set of grade bands, highest band first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeScale {
    bands: Vec<GradeBand>,
}

impl GradeScale {
    /// Builds a validated scale.
    ///
    /// # Errors
    /// - [`GradeScaleError::Empty`] when `bands` is empty.
    /// - [`GradeScaleError::InvalidBand`] for blank letters, negative points,
    ///   inverted bounds or bounds outside `[MIN_SCORE, MAX_SCORE]`.
    /// - [`GradeScaleError::Overlap`] / [`GradeScaleError::Gap`] when the bands
    ///   do not partition the score domain.
    pub fn new(bands: Vec<GradeBand>) -> Result<Self, GradeScaleError> {
        if bands.is_empty() {
            return Err(GradeScaleError::Empty);
        }

        let mut bands = bands
            .into_iter()
            .map(normalize_band)
            .collect::<Result<Vec<_>, _>>()?;
        bands.sort_by_key(|band| band.min_score);

        let mut next_uncovered = MIN_SCORE;
        let mut previous: Option<&GradeBand> = None;
        for band in &bands {
            if band.min_score > next_uncovered {
                return Err(GradeScaleError::Gap {
                    from: next_uncovered,
                    to: band.min_score - 1,
                });
            }
            if let Some(previous) = previous {
                if band.min_score < next_uncovered {
                    return Err(GradeScaleError::Overlap {
                        first: previous.letter.clone(),
                        second: band.letter.clone(),
                    });
                }
            }
            next_uncovered = band.max_score + 1;
            previous = Some(band);
        }
        if next_uncovered <= MAX_SCORE {
            return Err(GradeScaleError::Gap {
                from: next_uncovered,
                to: MAX_SCORE,
            });
        }

        bands.reverse();
        Ok(Self { bands })
    }

    /// Returns the six-band default scale seeded at initialization.
    pub fn default_scale() -> Self {
        Self {
            bands: vec![
                GradeBand::new("A", 4, 70, 100),
                GradeBand::new("B", 3, 60, 69),
                GradeBand::new("C", 2, 50, 59),
                GradeBand::new("D", 1, 45, 49),
                GradeBand::new("E", 0, 40, 44),
                GradeBand::new("F", 0, 0, 39),
            ],
        }
    }

    /// Wraps persisted bands without coverage checks.
    ///
    /// Stored data can be edited outside the core, so holes surface later as
    /// [`GradeScaleError::NoMatchingBand`] instead of failing the load.
    pub(crate) fn from_persisted(mut bands: Vec<GradeBand>) -> Self {
        bands.sort_by(|left, right| right.min_score.cmp(&left.min_score));
        Self { bands }
    }

    /// Bands ordered by descending `min_score`.
    pub fn bands(&self) -> &[GradeBand] {
        &self.bands
    }

    /// Resolves `score` to its letter grade and grade point.
    pub fn resolve(&self, score: i64) -> Result<ResolvedGrade, GradeScaleError> {
        self.bands
            .iter()
            .find(|band| band.contains(score))
            .map(|band| ResolvedGrade {
                letter: band.letter.clone(),
                point: band.point,
            })
            .ok_or(GradeScaleError::NoMatchingBand(score))
    }
}

/// Resolves `score` against `scale`.
pub fn resolve_grade(scale: &GradeScale, score: i64) -> Result<ResolvedGrade, GradeScaleError> {
    scale.resolve(score)
}

/// Credit-weighted points earned by one enrollment.
pub fn scored_point(credit: i64, grade_point: i64) -> i64 {
    credit * grade_point
}

/// Returns whether `score` lies in the valid score domain.
pub fn is_valid_score(score: i64) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}

fn normalize_band(band: GradeBand) -> Result<GradeBand, GradeScaleError> {
    let letter = band.letter.trim().to_ascii_uppercase();
    let invalid = |reason| GradeScaleError::InvalidBand {
        letter: letter.clone(),
        reason,
    };

    if letter.is_empty() {
        return Err(invalid("letter must not be blank"));
    }
    if band.point < 0 {
        return Err(invalid("point must not be negative"));
    }
    if band.min_score > band.max_score {
        return Err(invalid("min_score is greater than max_score"));
    }
    if band.min_score < MIN_SCORE || band.max_score > MAX_SCORE {
        return Err(invalid("bounds fall outside the score domain"));
    }

    Ok(GradeBand { letter, ..band })
}
