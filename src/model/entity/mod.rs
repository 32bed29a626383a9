mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod lesson;
pub use lesson::{Lesson, LessonCreate, LessonWithProgressRow};

mod problem;
pub use problem::{Problem, ProblemCreate};

mod choice;
pub use choice::{ProblemChoice, ProblemChoiceCreate};

mod submission;
pub use submission::{StoredAnswer, Submission, SubmissionCreate};

mod lesson_progress;
pub use lesson_progress::{LessonProgress, ProgressUpsert};
