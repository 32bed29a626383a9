mod common;
use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    Action, Flow, add_problem_action, create_lesson_action, id_of, setup_server, setup_test_db,
    signin_admin_action, signup_action,
};

const ATTEMPT_ONE: &str = "11111111-1111-1111-1111-111111111111";
const ATTEMPT_TWO: &str = "22222222-2222-2222-2222-222222222222";

#[tokio::test]
async fn route_submission_grading_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signin_admin_action())
        .step(create_lesson_action("Addition Basics", "easy", 1, "lesson"))
        .step(add_problem_action("lesson", "2 + 2 = ?", "4", "easy", "p1"))
        .step(add_problem_action("lesson", "3 + 3 = ?", "6", "easy", "p2"))
        .step(signup_action("LEARNER", "LEARNER").with_clear_cookies(true))
        // one of two correct: half the score, xp only for the correct one
        .step(
            Action::new("submit_partial", "POST", "/api/v1/submissions/")
                .with_dyn_body(|ctx| {
                    json!({
                        "lesson_id": id_of(ctx, "lesson"),
                        "attempt_id": ATTEMPT_ONE,
                        "answers": [
                            { "problem_id": id_of(ctx, "p1"), "answer": "4" },
                            { "problem_id": id_of(ctx, "p2"), "answer": "7" },
                        ],
                        "time_spent_seconds": 120,
                    })
                })
                .assert_body(|body| {
                    assert!(body.contains("\"xp_earned\":10"));
                    assert!(body.contains("\"total_xp\":10"));
                    assert!(body.contains("\"score\":50"));
                    assert!(body.contains("\"lesson_completed\":false"));
                    assert!(body.contains("\"replayed\":false"));
                    assert!(body.contains("\"current\":1"));
                    assert!(body.contains("\"updated\":true"));
                    // the review echoes the canonical answer for the miss
                    assert!(body.contains("\"correct_answer\":\"6\""));
                }),
        )
        // replaying the same attempt_id returns the stored result untouched
        .step(
            Action::new("submit_replay", "POST", "/api/v1/submissions/")
                .with_dyn_body(|ctx| {
                    json!({
                        "lesson_id": id_of(ctx, "lesson"),
                        "attempt_id": ATTEMPT_ONE,
                        "answers": [
                            { "problem_id": id_of(ctx, "p1"), "answer": "4" },
                            { "problem_id": id_of(ctx, "p2"), "answer": "7" },
                        ],
                        "time_spent_seconds": 120,
                    })
                })
                .assert_body(|body| {
                    assert!(body.contains("\"replayed\":true"));
                    assert!(body.contains("\"xp_earned\":10"));
                    assert!(body.contains("\"total_xp\":10"));
                    assert!(body.contains("\"updated\":false"));
                }),
        )
        // a fresh perfect attempt completes the lesson, same-day streak stays
        .step(
            Action::new("submit_perfect", "POST", "/api/v1/submissions/")
                .with_dyn_body(|ctx| {
                    json!({
                        "lesson_id": id_of(ctx, "lesson"),
                        "attempt_id": ATTEMPT_TWO,
                        "answers": [
                            { "problem_id": id_of(ctx, "p1"), "answer": " 4 " },
                            { "problem_id": id_of(ctx, "p2"), "answer": "6" },
                        ],
                        "time_spent_seconds": 60,
                    })
                })
                .assert_body(|body| {
                    // whitespace around a free-input answer is ignored
                    assert!(body.contains("\"score\":100"));
                    assert!(body.contains("\"lesson_completed\":true"));
                    assert!(body.contains("\"total_xp\":30"));
                    assert!(body.contains("\"updated\":false"));
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_submission_completion_and_progress_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signin_admin_action())
        .step(create_lesson_action("Subtraction", "easy", 1, "lesson"))
        .step(add_problem_action("lesson", "5 - 2 = ?", "3", "easy", "p1"))
        .step(signup_action("FINISHER", "FINISHER").with_clear_cookies(true))
        .step(
            Action::new("submit_perfect", "POST", "/api/v1/submissions/")
                .with_dyn_body(|ctx| {
                    json!({
                        "lesson_id": id_of(ctx, "lesson"),
                        "attempt_id": ATTEMPT_ONE,
                        "answers": [
                            { "problem_id": id_of(ctx, "p1"), "answer": "3" },
                        ],
                    })
                })
                .assert_body(|body| {
                    assert!(body.contains("\"score\":100"));
                    assert!(body.contains("\"lesson_completed\":true"));
                    assert!(body.contains("\"xp_earned\":10"));
                }),
        )
        .step(
            Action::new("progress_overview", "GET", "/api/v1/progress/").assert_body(|body| {
                assert!(body.contains("\"total_xp\":10"));
                assert!(body.contains("\"current_streak\":1"));
                assert!(body.contains("\"total_lessons\":1"));
                assert!(body.contains("\"completed_lessons\":1"));
                assert!(body.contains("\"total_submissions\":1"));
                assert!(body.contains("\"correct_submissions\":1"));
            }),
        )
        // a later imperfect attempt never clears the completion flag
        .step(
            Action::new("submit_imperfect_retry", "POST", "/api/v1/submissions/")
                .with_dyn_body(|ctx| {
                    json!({
                        "lesson_id": id_of(ctx, "lesson"),
                        "attempt_id": ATTEMPT_TWO,
                        "answers": [
                            { "problem_id": id_of(ctx, "p1"), "answer": "99" },
                        ],
                    })
                })
                .assert_body(|body| {
                    assert!(body.contains("\"score\":0"));
                    assert!(body.contains("\"lesson_completed\":true"));
                    assert!(body.contains("\"replayed\":false"));
                }),
        )
        // and neither does replaying that imperfect attempt
        .step(
            Action::new("replay_imperfect_retry", "POST", "/api/v1/submissions/")
                .with_dyn_body(|ctx| {
                    json!({
                        "lesson_id": id_of(ctx, "lesson"),
                        "attempt_id": ATTEMPT_TWO,
                        "answers": [
                            { "problem_id": id_of(ctx, "p1"), "answer": "99" },
                        ],
                    })
                })
                .assert_body(|body| {
                    assert!(body.contains("\"replayed\":true"));
                    assert!(body.contains("\"lesson_completed\":true"));
                    assert!(body.contains("\"score\":0"));
                }),
        )
        .step(
            Action::new("progress_still_completed", "GET", "/api/v1/progress/").assert_body(
                |body| {
                    assert!(body.contains("\"completed_lessons\":1"));
                    assert!(body.contains("\"total_submissions\":2"));
                    assert!(body.contains("\"total_xp\":10"));
                },
            ),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_submission_rejects_incomplete_answer_sets() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signin_admin_action())
        .step(create_lesson_action("Multiplication", "medium", 1, "lesson"))
        .step(add_problem_action("lesson", "2 * 3 = ?", "6", "medium", "p1"))
        .step(add_problem_action("lesson", "3 * 3 = ?", "9", "medium", "p2"))
        .step(signup_action("SKIPPER", "SKIPPER").with_clear_cookies(true))
        // leaving a problem unanswered is a client error, nothing is stored
        .step(
            Action::new("submit_incomplete", "POST", "/api/v1/submissions/")
                .with_dyn_body(|ctx| {
                    json!({
                        "lesson_id": id_of(ctx, "lesson"),
                        "attempt_id": ATTEMPT_ONE,
                        "answers": [
                            { "problem_id": id_of(ctx, "p1"), "answer": "6" },
                        ],
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| {
                    assert!(body.contains("Submission error"));
                }),
        )
        // unknown lesson
        .step(
            Action::new("submit_unknown_lesson", "POST", "/api/v1/submissions/")
                .with_body(json!({
                    "lesson_id": "99999999-9999-9999-9999-999999999999",
                    "attempt_id": ATTEMPT_TWO,
                    "answers": [],
                }))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("progress_untouched", "GET", "/api/v1/progress/").assert_body(|body| {
                assert!(body.contains("\"total_xp\":0"));
                assert!(body.contains("\"total_submissions\":0"));
            }),
        )
        .run(&mut server, pool)
        .await;
}
