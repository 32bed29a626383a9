mod common;
use serde_json::json;

use crate::common::{
    Action, Flow, add_problem_action, create_lesson_action, id_of, setup_server, setup_test_db,
    signin_admin_action, signup_action,
};

const ATTEMPT: &str = "33333333-3333-3333-3333-333333333333";

#[tokio::test]
async fn route_recommendations_zero_state_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signin_admin_action())
        .step(create_lesson_action("Counting Basics", "easy", 1, "l1"))
        .step(create_lesson_action("Simple Fractions", "medium", 2, "l2"))
        .step(signup_action("NEWBIE", "NEWBIE").with_clear_cookies(true))
        .step(
            Action::new("recommendations", "GET", "/api/v1/recommendations/").assert_body(
                |body| {
                    // no history yet: zero accuracy, easy preference
                    assert!(body.contains("\"average_score\":0.0"));
                    assert!(body.contains("\"learning_speed\":0.0"));
                    assert!(body.contains("\"preferred_difficulty\":\"easy\""));
                    // both catalog lessons are still recommendable
                    assert!(body.contains("Counting Basics"));
                    assert!(body.contains("Simple Fractions"));
                    // only the first lesson in the sequence is open
                    assert!(body.contains("\"is_unlocked\":true"));
                    assert!(body.contains("\"is_unlocked\":false"));
                    assert!(body.contains("personalized_message"));
                    assert!(body.contains("learning_goals"));
                },
            ),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_recommendations_exclude_mastered_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signin_admin_action())
        .step(create_lesson_action("Counting Basics", "easy", 1, "l1"))
        .step(create_lesson_action("Simple Fractions", "medium", 2, "l2"))
        .step(add_problem_action("l1", "1 + 1 = ?", "2", "easy", "p1"))
        .step(signup_action("ACHIEVER", "ACHIEVER").with_clear_cookies(true))
        // master the first lesson with a perfect attempt
        .step(
            Action::new("submit_perfect", "POST", "/api/v1/submissions/").with_dyn_body(|ctx| {
                json!({
                    "lesson_id": id_of(ctx, "l1"),
                    "attempt_id": ATTEMPT,
                    "answers": [
                        { "problem_id": id_of(ctx, "p1"), "answer": "2" },
                    ],
                    "time_spent_seconds": 30,
                })
            }),
        )
        .step(
            Action::new("recommendations", "GET", "/api/v1/recommendations/")
                .with_param("limit", "3")
                .assert_body(|body| {
                    // a completed lesson at score 100 is mastered and drops out
                    assert!(!body.contains("Counting Basics"));
                    assert!(body.contains("Simple Fractions"));
                    assert!(body.contains("\"average_score\":100.0"));
                    assert!(body.contains("\"strong_areas\":[\"easy\"]"));
                }),
        )
        .run(&mut server, pool)
        .await;
}
