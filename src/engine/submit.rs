use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, ModelManager,
        entity::{
            Lesson, LessonProgress, Problem, ProblemChoice, ProgressUpsert, StoredAnswer,
            Submission, SubmissionCreate, UserEntity,
        },
    },
    web::AuthenticatedUser,
};

use super::{
    Difficulty, ProblemKey,
    grader::{ChoiceKey, grade_answer},
    streak::{StreakOutcome, advance_streak},
};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no answer submitted for problem {problem_id}")]
    MissingAnswer { problem_id: Uuid },
    #[error("unexpected answer for problem {problem_id}")]
    UnexpectedAnswer { problem_id: Uuid },
    #[error("user {user_id} not found")]
    UserNotFound { user_id: Uuid },
    #[error("lesson {lesson_id} not found")]
    LessonNotFound { lesson_id: Uuid },
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AttemptAnswer {
    pub problem_id: Uuid,
    pub answer: String,
}

/// Per-problem grading detail returned for client display.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AnswerReview {
    pub problem_id: Uuid,
    pub submitted_answer: String,
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
    pub xp: i32,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubmitOutcome {
    pub xp_earned: i32,
    pub total_xp: i32,
    pub streak: StreakOutcome,
    pub lesson_completed: bool,
    pub score: i32,
    pub answers: Vec<AnswerReview>,
    /// True when this attempt_id was seen before and the stored result was
    /// returned without crediting anything again.
    pub replayed: bool,
}

/// Processes one lesson attempt: grading, XP, streak and progress, all in a
/// single transaction. Replaying a known `attempt_id` returns the stored
/// result and mutates nothing; the store-level unique constraint closes the
/// race between concurrent first submissions, so a conflicting insert inside
/// the transaction is also treated as a replay.
pub async fn submit_attempt(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    lesson_id: Uuid,
    attempt_id: Uuid,
    answers: &[AttemptAnswer],
    time_spent_seconds: i32,
) -> Result<SubmitOutcome, SubmitError> {
    let user_id = actor.user_id();

    let lesson = Lesson::find_by_id(mm, actor, lesson_id).await?;
    if lesson.is_none() {
        return Err(SubmitError::LessonNotFound { lesson_id });
    }

    let keys = load_answer_keys(mm, actor, lesson_id).await?;

    // Fast idempotency path; the unique constraint below still closes the
    // window between this check and the insert.
    if let Some(existing) =
        Submission::find_for_attempt(mm, actor, user_id, lesson_id, attempt_id).await?
    {
        return replay_outcome(mm, actor, existing, &keys).await;
    }

    let graded = grade_attempt(&keys, answers)?;
    let now = Utc::now();
    let today = now.date_naive();

    let mut tx = mm.begin().await?;

    let user = UserEntity::lock_for_submission(&mut tx, user_id)
        .await?
        .ok_or(SubmitError::UserNotFound { user_id })?;

    let create = SubmissionCreate {
        user_id,
        lesson_id,
        attempt_id,
        answers: graded.stored,
        is_correct: graded.all_correct,
        xp_earned: graded.xp_earned,
        score: graded.score,
        time_spent_seconds,
    };

    let inserted = Submission::insert_if_absent(&mut tx, &create, now).await?;
    if !inserted {
        // Lost the race against a concurrent duplicate; nothing was credited
        // on this side of it.
        tx.rollback().await.map_err(DatabaseError::from)?;
        let existing = Submission::find_for_attempt(mm, actor, user_id, lesson_id, attempt_id)
            .await?
            .ok_or(SubmitError::Database(DatabaseError::SqlxError(
                sqlx::Error::RowNotFound,
            )))?;
        return replay_outcome(mm, actor, existing, &keys).await;
    }

    let streak = advance_streak(
        user.last_activity_date(),
        today,
        user.current_streak(),
        user.best_streak(),
    );
    let total_xp = user.total_xp() + graded.xp_earned;

    UserEntity::apply_attempt(&mut tx, user_id, total_xp, streak.current, streak.best, today)
        .await?;

    let progress = LessonProgress::upsert_attempt(
        &mut tx,
        &ProgressUpsert {
            user_id,
            lesson_id,
            score: graded.score,
            is_completed: graded.all_correct,
            xp_earned: graded.xp_earned,
        },
        now,
    )
    .await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    tracing::info!(
        %user_id, %lesson_id, %attempt_id,
        xp = graded.xp_earned, score = graded.score,
        "submission processed"
    );

    Ok(SubmitOutcome {
        xp_earned: graded.xp_earned,
        total_xp,
        streak,
        lesson_completed: progress.is_completed(),
        score: graded.score,
        answers: graded.reviews,
        replayed: false,
    })
}

#[derive(Debug)]
struct GradedAttempt {
    stored: Vec<StoredAnswer>,
    reviews: Vec<AnswerReview>,
    xp_earned: i32,
    score: i32,
    all_correct: bool,
}

/// Grades the whole attempt. Every problem of the lesson must be answered
/// exactly once; anything else is a client data error.
fn grade_attempt(
    keys: &[ProblemKey],
    answers: &[AttemptAnswer],
) -> Result<GradedAttempt, SubmitError> {
    let mut by_problem: HashMap<Uuid, &AttemptAnswer> = HashMap::new();
    for answer in answers {
        if by_problem.insert(answer.problem_id, answer).is_some() {
            return Err(SubmitError::UnexpectedAnswer {
                problem_id: answer.problem_id,
            });
        }
    }
    for answer in answers {
        if !keys.iter().any(|k| k.problem_id == answer.problem_id) {
            return Err(SubmitError::UnexpectedAnswer {
                problem_id: answer.problem_id,
            });
        }
    }

    let mut stored = Vec::with_capacity(keys.len());
    let mut reviews = Vec::with_capacity(keys.len());
    let mut xp_earned = 0;
    let mut correct_count = 0usize;

    for key in keys {
        let answer = by_problem
            .get(&key.problem_id)
            .ok_or(SubmitError::MissingAnswer {
                problem_id: key.problem_id,
            })?;

        let (is_correct, xp) = grade_answer(key, &answer.answer);
        xp_earned += xp;
        if is_correct {
            correct_count += 1;
        }

        stored.push(StoredAnswer {
            problem_id: key.problem_id,
            answer: answer.answer.clone(),
            is_correct,
            xp,
            difficulty: key.difficulty.to_string(),
        });
        reviews.push(AnswerReview {
            problem_id: key.problem_id,
            submitted_answer: answer.answer.clone(),
            is_correct,
            correct_answer: key.canonical_answer(),
            explanation: key.explanation.clone(),
            xp,
        });
    }

    let total = keys.len();
    let score = if total == 0 {
        0
    } else {
        ((correct_count as f64 / total as f64) * 100.0).round() as i32
    };

    Ok(GradedAttempt {
        stored,
        reviews,
        xp_earned,
        score,
        all_correct: total > 0 && correct_count == total,
    })
}

async fn load_answer_keys(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    lesson_id: Uuid,
) -> Result<Vec<ProblemKey>, SubmitError> {
    let problems = Problem::all_by_lesson(mm, actor, lesson_id).await?;
    let choices = ProblemChoice::all_by_lesson(mm, actor, lesson_id).await?;

    let mut grouped: HashMap<Uuid, Vec<ChoiceKey>> = HashMap::new();
    for choice in choices {
        grouped.entry(choice.problem_id()).or_default().push(ChoiceKey {
            text: choice.choice_text().to_string(),
            is_correct: choice.is_correct(),
        });
    }

    Ok(problems
        .into_iter()
        .map(|p| ProblemKey {
            problem_id: p.id(),
            problem_type: p.problem_type().to_string(),
            difficulty: Difficulty::from(p.difficulty()),
            correct_answer: p.correct_answer().map(String::from),
            explanation: p.explanation().to_string(),
            choices: grouped.remove(&p.id()).unwrap_or_default(),
        })
        .collect())
}

/// Rebuilds the stored result of a previously processed attempt. The streak
/// is reported as it stands now and flagged as not updated.
async fn replay_outcome(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    existing: Submission,
    keys: &[ProblemKey],
) -> Result<SubmitOutcome, SubmitError> {
    let user = UserEntity::find_by_id(mm, actor, existing.user_id())
        .await?
        .ok_or(SubmitError::UserNotFound {
            user_id: existing.user_id(),
        })?;

    // lesson_completed mirrors the sticky progress flag, same as the
    // original response; the submission's own is_correct can be false for
    // an imperfect attempt at an already completed lesson.
    let lesson_completed = existing.is_correct()
        || LessonProgress::find_for_lesson(mm, actor, existing.lesson_id())
            .await?
            .is_some_and(|p| p.is_completed());

    let reviews = existing
        .stored_answers()?
        .into_iter()
        .map(|a| {
            let key = keys.iter().find(|k| k.problem_id == a.problem_id);
            AnswerReview {
                problem_id: a.problem_id,
                submitted_answer: a.answer,
                is_correct: a.is_correct,
                correct_answer: key.map(ProblemKey::canonical_answer).unwrap_or_default(),
                explanation: key.map(|k| k.explanation.clone()).unwrap_or_default(),
                xp: a.xp,
            }
        })
        .collect();

    tracing::debug!(
        user_id = %existing.user_id(), lesson_id = %existing.lesson_id(),
        attempt_id = %existing.attempt_id(),
        "duplicate attempt replayed"
    );

    Ok(SubmitOutcome {
        xp_earned: existing.xp_earned(),
        total_xp: user.total_xp(),
        streak: StreakOutcome {
            current: user.current_streak(),
            best: user.best_streak(),
            updated: false,
        },
        lesson_completed,
        score: existing.score(),
        answers: reviews,
        replayed: true,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::XP_PER_CORRECT_ANSWER;

    fn key(id: Uuid, canonical: &str) -> ProblemKey {
        ProblemKey {
            problem_id: id,
            problem_type: "free_input".into(),
            difficulty: Difficulty::Easy,
            correct_answer: Some(canonical.into()),
            explanation: format!("the answer is {canonical}"),
            choices: vec![],
        }
    }

    fn answer(id: Uuid, text: &str) -> AttemptAnswer {
        AttemptAnswer {
            problem_id: id,
            answer: text.into(),
        }
    }

    #[test]
    fn three_of_four_correct_scores_seventy_five() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let keys: Vec<ProblemKey> = ids.iter().map(|id| key(*id, "ok")).collect();
        let answers = vec![
            answer(ids[0], "ok"),
            answer(ids[1], "ok"),
            answer(ids[2], "ok"),
            answer(ids[3], "wrong"),
        ];

        let graded = grade_attempt(&keys, &answers).unwrap();
        assert_eq!(graded.xp_earned, 3 * XP_PER_CORRECT_ANSWER);
        assert_eq!(graded.score, 75);
        assert!(!graded.all_correct);
    }

    #[test]
    fn perfect_attempt_completes_lesson() {
        let id = Uuid::new_v4();
        let graded = grade_attempt(&[key(id, "42")], &[answer(id, "42")]).unwrap();
        assert!(graded.all_correct);
        assert_eq!(graded.score, 100);
    }

    #[test]
    fn unanswered_problem_is_rejected() {
        let answered = Uuid::new_v4();
        let skipped = Uuid::new_v4();
        let keys = vec![key(answered, "1"), key(skipped, "2")];

        let err = grade_attempt(&keys, &[answer(answered, "1")]).unwrap_err();
        match err {
            SubmitError::MissingAnswer { problem_id } => assert_eq!(problem_id, skipped),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_or_stray_answers_are_rejected() {
        let id = Uuid::new_v4();
        let keys = vec![key(id, "1")];

        let err = grade_attempt(&keys, &[answer(id, "1"), answer(id, "1")]).unwrap_err();
        assert!(matches!(err, SubmitError::UnexpectedAnswer { .. }));

        let stray = Uuid::new_v4();
        let err = grade_attempt(&keys, &[answer(id, "1"), answer(stray, "9")]).unwrap_err();
        assert!(matches!(
            err,
            SubmitError::UnexpectedAnswer { problem_id } if problem_id == stray
        ));
    }

    #[test]
    fn reviews_carry_canonical_answer_and_explanation() {
        let id = Uuid::new_v4();
        let graded = grade_attempt(&[key(id, "six")], &[answer(id, "seven")]).unwrap();
        let review = &graded.reviews[0];
        assert!(!review.is_correct);
        assert_eq!(review.correct_answer, "six");
        assert_eq!(review.explanation, "the answer is six");
        assert_eq!(review.xp, 0);
    }
}
