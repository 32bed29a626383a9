use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProgressOverviewResponse {
    total_xp: i32,
    current_streak: i32,
    best_streak: i32,
    total_lessons: i64,
    completed_lessons: i64,
    total_submissions: i64,
    correct_submissions: i64,
}

impl ProgressOverviewResponse {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        total_xp: i32,
        current_streak: i32,
        best_streak: i32,
        total_lessons: i64,
        completed_lessons: i64,
        total_submissions: i64,
        correct_submissions: i64,
    ) -> Self {
        Self {
            total_xp,
            current_streak,
            best_streak,
            total_lessons,
            completed_lessons,
            total_submissions,
            correct_submissions,
        }
    }
}
