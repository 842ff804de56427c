use serde::{Deserialize, Serialize};

/// Score bands used across the dashboard. Fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub high_min: f64,
    pub mid_min: f64,
}

pub const THRESHOLDS: Thresholds = Thresholds {
    high_min: 86.0,
    mid_min: 70.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    High,
    Middle,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementStatus {
    Achieved,
    NotAchieved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetencyRow {
    pub identifier: String,
    #[serde(default)]
    pub status: Option<AchievementStatus>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetencyKind {
    Hard,
    Soft,
}

impl CompetencyKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hard" => Some(CompetencyKind::Hard),
            "soft" => Some(CompetencyKind::Soft),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompetencyKind::Hard => "hard",
            CompetencyKind::Soft => "soft",
        }
    }

    /// Achievement rule for this kind. Hard rows trust the backend's status
    /// column; soft rows are graded locally from the score.
    pub fn predicate(self) -> fn(&CompetencyRow) -> bool {
        match self {
            CompetencyKind::Hard => hard_achieved,
            CompetencyKind::Soft => soft_achieved,
        }
    }
}

/// One-decimal rounding: `floor(10*x + 0.5) / 10`.
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

pub fn compute_band(score: f64) -> Band {
    compute_band_with(score, &THRESHOLDS)
}

pub fn compute_band_with(score: f64, thresholds: &Thresholds) -> Band {
    if score >= thresholds.high_min {
        Band::High
    } else if score >= thresholds.mid_min {
        Band::Middle
    } else {
        Band::Low
    }
}

pub fn hard_achieved(row: &CompetencyRow) -> bool {
    row.status == Some(AchievementStatus::Achieved)
}

pub fn soft_achieved(row: &CompetencyRow) -> bool {
    row.score.map(|s| s >= THRESHOLDS.mid_min).unwrap_or(false)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandDistribution {
    pub high: usize,
    pub middle: usize,
    pub low: usize,
    pub unscored: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementSummary {
    pub achieved_count: usize,
    pub not_achieved_count: usize,
    pub average: f64,
    pub achieved_percent: f64,
    pub scored_count: usize,
    pub total: usize,
    pub bands: BandDistribution,
}

/// Counts rows passing `predicate` and averages the non-null scores.
///
/// Rows without a score still count toward achieved/not-achieved. An empty
/// input (or one with no scores at all) averages to 0.
pub fn compute_achievement<P>(rows: &[CompetencyRow], predicate: P) -> AchievementSummary
where
    P: Fn(&CompetencyRow) -> bool,
{
    let mut achieved_count = 0usize;
    let mut scored_count = 0usize;
    let mut sum = 0.0f64;
    let mut bands = BandDistribution::default();

    for row in rows {
        if predicate(row) {
            achieved_count += 1;
        }
        match row.score {
            Some(s) if s.is_finite() => {
                scored_count += 1;
                sum += s;
                match compute_band(s) {
                    Band::High => bands.high += 1,
                    Band::Middle => bands.middle += 1,
                    Band::Low => bands.low += 1,
                }
            }
            _ => bands.unscored += 1,
        }
    }

    let average = if scored_count > 0 {
        round_off_1_decimal(sum / scored_count as f64)
    } else {
        0.0
    };
    let achieved_percent = if rows.is_empty() {
        0.0
    } else {
        round_off_1_decimal(100.0 * achieved_count as f64 / rows.len() as f64)
    };

    AchievementSummary {
        achieved_count,
        not_achieved_count: rows.len() - achieved_count,
        average,
        achieved_percent,
        scored_count,
        total: rows.len(),
        bands,
    }
}

pub fn summarize(kind: CompetencyKind, rows: &[CompetencyRow]) -> AchievementSummary {
    compute_achievement(rows, kind.predicate())
}
