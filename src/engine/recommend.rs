use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{Difficulty, pattern::LearningPattern};

const BASE_SCORE: i32 = 50;
const MASTERED_AT: i32 = 90;
const REINFORCE_BELOW: i32 = 80;
const HIGH_PERFORMER_AT: f64 = 80.0;
const STRUGGLER_BELOW: f64 = 50.0;
const BASE_LESSON_MINUTES: f64 = 15.0;

/// Catalog lesson annotated with the user's progress, as fed to the scorer.
#[derive(Debug, Clone)]
pub struct CandidateLesson {
    pub id: Uuid,
    pub title: String,
    pub difficulty: Difficulty,
    pub order_index: i32,
    pub progress: Option<CandidateProgress>,
}

#[derive(Debug, Clone)]
pub struct CandidateProgress {
    pub is_completed: bool,
    pub score: i32,
    pub best_score: i32,
    pub attempts_count: i32,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LessonRecommendation {
    pub lesson_id: Uuid,
    pub title: String,
    /// 0-100 ranking value, not a probability.
    pub confidence_score: i32,
    pub recommendation_reason: String,
    /// Estimated minutes to complete, adjusted for the user's pace.
    pub estimated_completion_time: i32,
    pub is_unlocked: bool,
    pub prerequisites: Vec<Uuid>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AdaptiveLearningPath {
    pub user_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub learning_pattern: LearningPattern,
    pub recommendations: Vec<LessonRecommendation>,
    pub next_suggested_lesson: Option<Uuid>,
    pub personalized_message: String,
    pub learning_goals: Vec<String>,
}

/// Ranks the catalog against the learning pattern.
///
/// Fully deterministic: the additive bonus table below is a hand-tuned
/// decision table, the sort is stable, and ties keep catalog order.
pub fn build_learning_path(
    user_id: Uuid,
    pattern: LearningPattern,
    catalog: &[CandidateLesson],
    limit: usize,
    generated_at: DateTime<Utc>,
) -> AdaptiveLearningPath {
    let completed_count = catalog
        .iter()
        .filter(|l| l.progress.as_ref().is_some_and(|p| p.is_completed))
        .count() as i32;

    let mut recommendations: Vec<LessonRecommendation> = catalog
        .iter()
        .filter(|lesson| !is_mastered(lesson))
        .map(|lesson| score_lesson(lesson, &pattern, catalog, completed_count))
        .collect();

    recommendations.sort_by(|a, b| b.confidence_score.cmp(&a.confidence_score));
    recommendations.truncate(limit);

    let next_suggested_lesson = recommendations.first().map(|r| r.lesson_id);
    let personalized_message = personalized_message(&pattern, recommendations.first());
    let learning_goals = learning_goals(&pattern);

    AdaptiveLearningPath {
        user_id,
        generated_at,
        learning_pattern: pattern,
        recommendations,
        next_suggested_lesson,
        personalized_message,
        learning_goals,
    }
}

fn is_mastered(lesson: &CandidateLesson) -> bool {
    lesson
        .progress
        .as_ref()
        .is_some_and(|p| p.is_completed && p.score >= MASTERED_AT)
}

fn score_lesson(
    lesson: &CandidateLesson,
    pattern: &LearningPattern,
    catalog: &[CandidateLesson],
    completed_count: i32,
) -> LessonRecommendation {
    let mut score = BASE_SCORE;

    // Difficulty alignment, asymmetric by performance tier.
    if pattern.average_score >= HIGH_PERFORMER_AT {
        match lesson.difficulty {
            Difficulty::Hard => score += 30,
            Difficulty::Medium => score += 15,
            Difficulty::Easy => {}
        }
    } else if pattern.average_score < STRUGGLER_BELOW {
        match lesson.difficulty {
            Difficulty::Easy => score += 30,
            Difficulty::Hard => score -= 20,
            Difficulty::Medium => {}
        }
    }

    if lesson.difficulty == pattern.preferred_difficulty {
        score += 25;
    }

    let progress = lesson.progress.as_ref();
    let in_progress = progress.is_some_and(|p| !p.is_completed);
    let needs_reinforcement = progress.is_some_and(|p| p.is_completed && p.score < REINFORCE_BELOW);

    if in_progress {
        score += 35;
    }
    if needs_reinforcement {
        score += 20;
    }
    if progress.is_none() {
        score += 15;
    }
    if lesson.order_index == completed_count + 1 {
        score += 20;
    }
    if pattern.consistency_score > 70.0 {
        score += 10;
    }

    let reason = if needs_reinforcement {
        String::from("Your last score here left room to grow, a revisit will lock it in")
    } else if in_progress {
        String::from("You already started this lesson, pick up where you left off")
    } else if pattern.average_score >= HIGH_PERFORMER_AT && lesson.difficulty == Difficulty::Hard {
        String::from("A harder challenge to match your strong results")
    } else if pattern.average_score < STRUGGLER_BELOW && lesson.difficulty == Difficulty::Easy {
        String::from("A confidence builder while you find your footing")
    } else if pattern.struggling_areas.contains(&lesson.difficulty) {
        String::from("Extra practice for a difficulty level you find tricky")
    } else {
        String::from("The next step in your learning path")
    };

    let (is_unlocked, prerequisites) = unlock_state(lesson, catalog);

    LessonRecommendation {
        lesson_id: lesson.id,
        title: lesson.title.clone(),
        confidence_score: score.clamp(0, 100),
        recommendation_reason: reason,
        estimated_completion_time: estimated_minutes(lesson.difficulty, pattern.learning_speed),
        is_unlocked,
        prerequisites,
    }
}

/// Strict sequential gating: lesson 1 is always open, any later lesson
/// requires the immediately preceding one to be completed.
fn unlock_state(lesson: &CandidateLesson, catalog: &[CandidateLesson]) -> (bool, Vec<Uuid>) {
    if lesson.order_index <= 1 {
        return (true, vec![]);
    }

    let previous = catalog
        .iter()
        .find(|l| l.order_index == lesson.order_index - 1);

    match previous {
        Some(prev) => {
            let unlocked = prev.progress.as_ref().is_some_and(|p| p.is_completed);
            (unlocked, vec![prev.id])
        }
        None => (false, vec![]),
    }
}

fn estimated_minutes(difficulty: Difficulty, learning_speed: f64) -> i32 {
    let multiplier = match difficulty {
        Difficulty::Easy => 1.0,
        Difficulty::Medium => 1.2,
        Difficulty::Hard => 1.5,
    };
    let pace = if learning_speed == 0.0 {
        1.5
    } else {
        (2.0 / learning_speed).max(0.5)
    };
    (BASE_LESSON_MINUTES * multiplier * pace).round() as i32
}

/// At most three goals, in fixed priority order.
fn learning_goals(pattern: &LearningPattern) -> Vec<String> {
    let mut goals = Vec::new();

    if pattern.average_score < 70.0 {
        goals.push(String::from("Raise your average score above 70%"));
    }
    if pattern.learning_speed > 0.0 && pattern.learning_speed < 1.0 {
        goals.push(String::from(
            "Build up to solving at least one problem per minute",
        ));
    }
    if pattern.consistency_score < 60.0 {
        goals.push(String::from(
            "Practice on more days each week to build a routine",
        ));
    }
    if !pattern.struggling_areas.is_empty() {
        let areas: Vec<String> = pattern
            .struggling_areas
            .iter()
            .map(ToString::to_string)
            .collect();
        goals.push(format!(
            "Strengthen your results on {} problems",
            areas.join(" and ")
        ));
    }

    goals.truncate(3);
    goals
}

fn personalized_message(
    pattern: &LearningPattern,
    top: Option<&LessonRecommendation>,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if pattern.average_score >= HIGH_PERFORMER_AT {
        parts.push(String::from("You're performing at a high level, keep it up!"));
    } else if pattern.average_score >= STRUGGLER_BELOW {
        parts.push(String::from("You're making steady progress."));
    } else if pattern.average_score > 0.0 {
        parts.push(String::from("Keep practicing, every attempt counts."));
    } else {
        parts.push(String::from("Welcome! Let's find the right place to start."));
    }

    if pattern.learning_speed > 2.0 {
        parts.push(String::from("You work through problems quickly."));
    }
    if pattern.consistency_score > 70.0 {
        parts.push(String::from("Your steady practice habit is paying off."));
    }
    if let Some(top) = top {
        parts.push(format!(
            "Up next: {}. {}.",
            top.title, top.recommendation_reason
        ));
    }

    parts.join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    fn pattern_zero() -> LearningPattern {
        LearningPattern {
            average_score: 0.0,
            learning_speed: 0.0,
            struggling_areas: vec![],
            strong_areas: vec![],
            preferred_difficulty: Difficulty::Easy,
            consistency_score: 0.0,
        }
    }

    fn lesson(
        title: &str,
        difficulty: Difficulty,
        order_index: i32,
        progress: Option<CandidateProgress>,
    ) -> CandidateLesson {
        CandidateLesson {
            id: Uuid::new_v4(),
            title: title.into(),
            difficulty,
            order_index,
            progress,
        }
    }

    fn completed(score: i32) -> Option<CandidateProgress> {
        Some(CandidateProgress {
            is_completed: true,
            score,
            best_score: score,
            attempts_count: 1,
        })
    }

    fn in_progress(score: i32) -> Option<CandidateProgress> {
        Some(CandidateProgress {
            is_completed: false,
            score,
            best_score: score,
            attempts_count: 1,
        })
    }

    #[test]
    fn new_user_gets_a_ranked_list_with_only_first_lesson_unlocked() {
        let catalog = vec![
            lesson("Counting", Difficulty::Easy, 1, None),
            lesson("Addition", Difficulty::Easy, 2, None),
            lesson("Fractions", Difficulty::Medium, 3, None),
        ];

        let path =
            build_learning_path(Uuid::new_v4(), pattern_zero(), &catalog, 10, Utc::now());

        assert_eq!(path.recommendations.len(), 3);
        for rec in &path.recommendations {
            let first = rec.title == "Counting";
            assert_eq!(rec.is_unlocked, first);
            assert_eq!(rec.prerequisites.is_empty(), first);
        }
        // zero-state: base 50 + easy-for-struggler 30 + preferred 25 + never
        // attempted 15 + next-in-sequence 20 = 140, clamped to 100
        let top = &path.recommendations[0];
        assert_eq!(top.title, "Counting");
        assert_eq!(top.confidence_score, 100);
        assert_eq!(path.next_suggested_lesson, Some(top.lesson_id));
    }

    #[test]
    fn mastered_lessons_are_excluded() {
        let catalog = vec![
            lesson("Counting", Difficulty::Easy, 1, completed(95)),
            lesson("Addition", Difficulty::Easy, 2, completed(90)),
            lesson("Fractions", Difficulty::Medium, 3, None),
        ];

        let path =
            build_learning_path(Uuid::new_v4(), pattern_zero(), &catalog, 10, Utc::now());

        assert_eq!(path.recommendations.len(), 1);
        assert_eq!(path.recommendations[0].title, "Fractions");
        // both predecessors completed, so lesson 3 is next in sequence and open
        assert!(path.recommendations[0].is_unlocked);
    }

    #[test]
    fn exact_bonus_table_for_a_struggler() {
        let mut pattern = pattern_zero();
        pattern.average_score = 40.0;
        pattern.struggling_areas = vec![Difficulty::Hard];

        let catalog = vec![
            lesson("Counting", Difficulty::Easy, 1, completed(70)),
            lesson("Equations", Difficulty::Hard, 2, None),
        ];

        let path = build_learning_path(Uuid::new_v4(), pattern, &catalog, 10, Utc::now());

        // easy, completed at 70: 50 + 30 (easy for struggler) + 25 (preferred)
        // + 20 (reinforcement) = 125 -> 100
        let counting = path
            .recommendations
            .iter()
            .find(|r| r.title == "Counting")
            .unwrap();
        assert_eq!(counting.confidence_score, 100);
        assert!(counting.recommendation_reason.contains("revisit"));

        // hard, unattempted, next in sequence: 50 - 20 + 15 + 20 = 65
        let equations = path
            .recommendations
            .iter()
            .find(|r| r.title == "Equations")
            .unwrap();
        assert_eq!(equations.confidence_score, 65);
        assert!(equations.is_unlocked);
        assert_eq!(equations.prerequisites, vec![counting.lesson_id]);
    }

    #[test]
    fn high_performer_is_pushed_toward_hard_lessons() {
        let mut pattern = pattern_zero();
        pattern.average_score = 90.0;
        pattern.preferred_difficulty = Difficulty::Hard;
        pattern.consistency_score = 80.0;

        let catalog = vec![
            lesson("Counting", Difficulty::Easy, 1, completed(85)),
            lesson("Equations", Difficulty::Hard, 2, None),
            lesson("Proofs", Difficulty::Medium, 3, None),
        ];

        let path = build_learning_path(Uuid::new_v4(), pattern, &catalog, 10, Utc::now());

        // hard: 50 + 30 + 25 (preferred) + 15 (new) + 20 (next) + 10 (consistency) = 150 -> 100
        let equations = &path.recommendations[0];
        assert_eq!(equations.title, "Equations");
        assert_eq!(equations.confidence_score, 100);
        assert_eq!(
            equations.recommendation_reason,
            "A harder challenge to match your strong results"
        );

        // medium: 50 + 15 + 15 + 10 = 90
        let proofs = path
            .recommendations
            .iter()
            .find(|r| r.title == "Proofs")
            .unwrap();
        assert_eq!(proofs.confidence_score, 90);
        assert!(!proofs.is_unlocked);
    }

    #[test]
    fn resume_beats_novelty_and_reasons_follow_priority() {
        let mut pattern = pattern_zero();
        pattern.average_score = 60.0;

        let catalog = vec![
            lesson("Counting", Difficulty::Easy, 1, in_progress(50)),
            lesson("Addition", Difficulty::Easy, 2, None),
        ];

        let path = build_learning_path(Uuid::new_v4(), pattern, &catalog, 10, Utc::now());

        let top = &path.recommendations[0];
        assert_eq!(top.title, "Counting");
        assert!(top.recommendation_reason.contains("pick up where you left off"));
    }

    #[test]
    fn limit_truncates_after_ranking() {
        let catalog: Vec<CandidateLesson> = (1..=5)
            .map(|i| lesson(&format!("L{i}"), Difficulty::Easy, i, None))
            .collect();

        let path =
            build_learning_path(Uuid::new_v4(), pattern_zero(), &catalog, 2, Utc::now());
        assert_eq!(path.recommendations.len(), 2);
        // L1 wins on the next-in-sequence bonus, the rest tie in catalog order
        assert_eq!(path.recommendations[0].title, "L1");
        assert_eq!(path.recommendations[1].title, "L2");
    }

    #[test]
    fn ranking_is_deterministic() {
        let catalog: Vec<CandidateLesson> = (1..=4)
            .map(|i| lesson(&format!("L{i}"), Difficulty::Medium, i, None))
            .collect();
        let at = Utc::now();

        let a = build_learning_path(Uuid::nil(), pattern_zero(), &catalog, 10, at);
        let b = build_learning_path(Uuid::nil(), pattern_zero(), &catalog, 10, at);

        let scores_a: Vec<(Uuid, i32)> = a
            .recommendations
            .iter()
            .map(|r| (r.lesson_id, r.confidence_score))
            .collect();
        let scores_b: Vec<(Uuid, i32)> = b
            .recommendations
            .iter()
            .map(|r| (r.lesson_id, r.confidence_score))
            .collect();
        assert_eq!(scores_a, scores_b);
        assert_eq!(a.personalized_message, b.personalized_message);
        assert_eq!(a.learning_goals, b.learning_goals);
    }

    #[test]
    fn estimated_time_scales_with_difficulty_and_pace() {
        // no recorded speed: 15 * 1.0 * 1.5 = 22.5 -> 23
        assert_eq!(estimated_minutes(Difficulty::Easy, 0.0), 23);
        // fast solver hits the 0.5 floor: 15 * 1.5 * 0.5 = 11.25 -> 11
        assert_eq!(estimated_minutes(Difficulty::Hard, 10.0), 11);
        // 1 problem/minute: 15 * 1.2 * 2.0 = 36
        assert_eq!(estimated_minutes(Difficulty::Medium, 1.0), 36);
    }

    #[test]
    fn goals_are_capped_at_three_in_priority_order() {
        let pattern = LearningPattern {
            average_score: 30.0,
            learning_speed: 0.5,
            struggling_areas: vec![Difficulty::Medium, Difficulty::Hard],
            strong_areas: vec![],
            preferred_difficulty: Difficulty::Easy,
            consistency_score: 20.0,
        };

        let goals = learning_goals(&pattern);
        assert_eq!(goals.len(), 3);
        assert!(goals[0].contains("average score"));
        assert!(goals[1].contains("per minute"));
        assert!(goals[2].contains("routine"));
    }

    #[test]
    fn message_mentions_the_top_recommendation() {
        let catalog = vec![lesson("Counting", Difficulty::Easy, 1, None)];
        let path =
            build_learning_path(Uuid::new_v4(), pattern_zero(), &catalog, 10, Utc::now());

        assert!(path.personalized_message.starts_with("Welcome!"));
        assert!(path.personalized_message.contains("Up next: Counting"));
    }
}
