use chrono::NaiveDate;
use serde::Serialize;

use super::Difficulty;

const STRUGGLING_BELOW: f64 = 0.6;
const STRONG_ABOVE: f64 = 0.8;
const PREFERRED_ABOVE: f64 = 0.7;

/// Derived behavioral profile. Never persisted; recomputed from the full
/// submission history on every recommendation request.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LearningPattern {
    /// Overall per-answer accuracy, 0-100.
    pub average_score: f64,
    /// Problems answered per minute, 0 when no time was recorded.
    pub learning_speed: f64,
    pub struggling_areas: Vec<Difficulty>,
    pub strong_areas: Vec<Difficulty>,
    pub preferred_difficulty: Difficulty,
    /// 0-100 blend of streak regularity, weekly activity and accuracy.
    pub consistency_score: f64,
}

/// Slice of one submission row that the analyzer needs.
#[derive(Debug, Clone)]
pub struct SubmissionSample {
    pub answers: Vec<AnswerSample>,
    pub time_spent_seconds: i32,
    pub submitted_on: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct AnswerSample {
    pub difficulty: Difficulty,
    pub is_correct: bool,
}

/// Aggregates a chronological submission history into a `LearningPattern`.
///
/// An empty history is the documented zero-state (accuracy 0, easy
/// preference), never an error.
pub fn analyze_history(
    history: &[SubmissionSample],
    current_streak: i32,
    today: NaiveDate,
) -> LearningPattern {
    let mut attempted = [0u32; 3];
    let mut correct = [0u32; 3];
    let mut total_seconds = 0i64;

    for submission in history {
        total_seconds += submission.time_spent_seconds as i64;
        for answer in &submission.answers {
            let idx = answer.difficulty.rank() as usize;
            attempted[idx] += 1;
            if answer.is_correct {
                correct[idx] += 1;
            }
        }
    }

    let total_attempted: u32 = attempted.iter().sum();
    let total_correct: u32 = correct.iter().sum();
    let accuracy = if total_attempted == 0 {
        0.0
    } else {
        total_correct as f64 / total_attempted as f64
    };

    let mut struggling_areas = Vec::new();
    let mut strong_areas = Vec::new();
    let mut preferred_difficulty = Difficulty::Easy;
    for tier in Difficulty::ALL {
        let idx = tier.rank() as usize;
        if attempted[idx] == 0 {
            continue;
        }
        let tier_accuracy = correct[idx] as f64 / attempted[idx] as f64;
        if tier_accuracy < STRUGGLING_BELOW {
            struggling_areas.push(tier);
        } else if tier_accuracy > STRONG_ABOVE {
            strong_areas.push(tier);
        }
        // ALL runs easy to hard, so the last qualifying tier is the hardest
        if tier_accuracy > PREFERRED_ABOVE {
            preferred_difficulty = tier;
        }
    }

    let total_minutes = total_seconds as f64 / 60.0;
    let learning_speed = if total_minutes > 0.0 {
        total_attempted as f64 / total_minutes
    } else {
        0.0
    };

    let streak_consistency = (current_streak.clamp(0, 7) as f64) / 7.0;
    let active_days = active_days_this_week(history, today);
    let consistency_score =
        (40.0 * streak_consistency + 10.0 * active_days as f64 + 50.0 * accuracy)
            .clamp(0.0, 100.0);

    LearningPattern {
        average_score: accuracy * 100.0,
        learning_speed,
        struggling_areas,
        strong_areas,
        preferred_difficulty,
        consistency_score,
    }
}

/// Distinct calendar days with at least one submission in the trailing
/// 7-day window ending today.
fn active_days_this_week(history: &[SubmissionSample], today: NaiveDate) -> u32 {
    let mut days: Vec<NaiveDate> = history
        .iter()
        .map(|s| s.submitted_on)
        .filter(|d| {
            let age = (today - *d).num_days();
            (0..7).contains(&age)
        })
        .collect();
    days.sort();
    days.dedup();
    days.len() as u32
}
