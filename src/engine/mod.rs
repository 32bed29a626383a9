//! Submission and adaptive recommendation engine.
//!
//! Everything outside `submit` is pure: the grader, streak arithmetic,
//! pattern analysis and recommendation scoring all work on plain inputs so
//! they can be exercised without a database.

mod grader;
pub use grader::{ChoiceKey, ProblemKey, XP_PER_CORRECT_ANSWER, grade_answer};

mod streak;
pub use streak::{StreakOutcome, advance_streak};

mod submit;
pub use submit::{AnswerReview, AttemptAnswer, SubmitError, SubmitOutcome, submit_attempt};

mod pattern;
pub use pattern::{AnswerSample, LearningPattern, SubmissionSample, analyze_history};

mod recommend;
pub use recommend::{
    AdaptiveLearningPath, CandidateLesson, CandidateProgress, LessonRecommendation,
    build_learning_path,
};

use serde::{Deserialize, Serialize};

/// Coarse difficulty tier shared by lessons and problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Position in the easy..hard ordering, used for "hardest tier" picks.
    pub fn rank(self) -> u8 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }
}

impl From<&str> for Difficulty {
    fn from(value: &str) -> Self {
        match value {
            "hard" => Self::Hard,
            "medium" => Self::Medium,
            _ => Self::Easy,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}
