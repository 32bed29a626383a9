use uuid::Uuid;

use super::Difficulty;

/// XP awarded for every correctly answered problem.
pub const XP_PER_CORRECT_ANSWER: i32 = 10;

/// Answer-key view of one problem, detached from the persistence layer so
/// grading stays a pure function.
#[derive(Debug, Clone)]
pub struct ProblemKey {
    pub problem_id: Uuid,
    pub problem_type: String,
    pub difficulty: Difficulty,
    pub correct_answer: Option<String>,
    pub explanation: String,
    pub choices: Vec<ChoiceKey>,
}

#[derive(Debug, Clone)]
pub struct ChoiceKey {
    pub text: String,
    pub is_correct: bool,
}

impl ProblemKey {
    /// Canonical answer text shown back to the client after grading.
    pub fn canonical_answer(&self) -> String {
        match self.problem_type.as_str() {
            "multiple_choice" => self
                .choices
                .iter()
                .find(|c| c.is_correct)
                .map(|c| c.text.clone())
                .unwrap_or_default(),
            _ => self.correct_answer.clone().unwrap_or_default(),
        }
    }
}

/// Decides correctness of one submitted answer and the XP it earns.
///
/// Multiple choice compares the submitted text against the choice flagged
/// correct; a problem with no flagged choice grades incorrect rather than
/// erroring. Free input compares trimmed, case-insensitive text.
pub fn grade_answer(problem: &ProblemKey, submitted: &str) -> (bool, i32) {
    let is_correct = match problem.problem_type.as_str() {
        "multiple_choice" => problem
            .choices
            .iter()
            .find(|c| c.is_correct)
            .is_some_and(|c| c.text == submitted),
        _ => problem
            .correct_answer
            .as_deref()
            .is_some_and(|canonical| {
                canonical.trim().to_lowercase() == submitted.trim().to_lowercase()
            }),
    };

    let xp = if is_correct { XP_PER_CORRECT_ANSWER } else { 0 };
    (is_correct, xp)
}

#[cfg(test)]
mod test {
    use super::*;

    fn free_input(canonical: Option<&str>) -> ProblemKey {
        ProblemKey {
            problem_id: Uuid::new_v4(),
            problem_type: "free_input".into(),
            difficulty: Difficulty::Easy,
            correct_answer: canonical.map(String::from),
            explanation: String::new(),
            choices: vec![],
        }
    }

    fn multiple_choice(choices: &[(&str, bool)]) -> ProblemKey {
        ProblemKey {
            problem_id: Uuid::new_v4(),
            problem_type: "multiple_choice".into(),
            difficulty: Difficulty::Easy,
            correct_answer: None,
            explanation: String::new(),
            choices: choices
                .iter()
                .map(|(text, is_correct)| ChoiceKey {
                    text: (*text).into(),
                    is_correct: *is_correct,
                })
                .collect(),
        }
    }

    #[test]
    fn free_input_is_trimmed_and_case_insensitive() {
        let problem = free_input(Some("six"));
        assert!(grade_answer(&problem, "SIX").0);
        assert!(grade_answer(&problem, " six ").0);
        assert!(grade_answer(&problem, "six").0);
        assert!(!grade_answer(&problem, "Six.").0);
    }

    #[test]
    fn free_input_without_canonical_answer_is_incorrect() {
        let problem = free_input(None);
        assert!(!grade_answer(&problem, "anything").0);
    }

    #[test]
    fn multiple_choice_matches_flagged_choice_exactly() {
        let problem = multiple_choice(&[("12", false), ("14", true), ("16", false)]);
        assert_eq!(grade_answer(&problem, "14"), (true, XP_PER_CORRECT_ANSWER));
        assert_eq!(grade_answer(&problem, "12"), (false, 0));
        // exact text match only, no normalization for choices
        assert_eq!(grade_answer(&problem, " 14 "), (false, 0));
    }

    #[test]
    fn multiple_choice_without_correct_flag_never_matches() {
        let problem = multiple_choice(&[("1", false), ("2", false)]);
        assert_eq!(grade_answer(&problem, "1"), (false, 0));
    }

    #[test]
    fn canonical_answer_for_client_display() {
        let problem = multiple_choice(&[("12", false), ("14", true)]);
        assert_eq!(problem.canonical_answer(), "14");
        assert_eq!(free_input(Some("six")).canonical_answer(), "six");
        assert_eq!(free_input(None).canonical_answer(), "");
    }
}
