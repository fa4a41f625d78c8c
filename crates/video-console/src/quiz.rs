//! Timed quiz session over a generated quiz.

use shared::{QuestionType, QuizData, QuizQuestion, QuizQuestionOption};
use std::time::Duration;
use tracing::{debug, info};

/// Default time allowed for a quiz
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Single(Option<String>),
    Multiple(Vec<String>),
}

impl Answer {
    fn empty_for(question: &QuizQuestion) -> Self {
        match question.question_type {
            QuestionType::SingleChoice => Answer::Single(None),
            QuestionType::MultipleChoice => Answer::Multiple(Vec::new()),
        }
    }

    pub fn is_selected(&self, option_text: &str) -> bool {
        match self {
            Answer::Single(choice) => choice.as_deref() == Some(option_text),
            Answer::Multiple(choices) => choices.iter().any(|c| c == option_text),
        }
    }
}

/// How an option is shown once results are revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionOutcome {
    Correct,
    WrongSelection,
    Neutral,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: QuizData,
    answers: Vec<Answer>,
    remaining: Duration,
    submitted: bool,
    score: usize,
}

impl QuizSession {
    pub fn new(quiz: QuizData, time_limit: Duration) -> Self {
        let answers = quiz.questions.iter().map(Answer::empty_for).collect();
        Self {
            quiz,
            answers,
            remaining: time_limit,
            submitted: false,
            score: 0,
        }
    }

    pub fn quiz(&self) -> &QuizData {
        &self.quiz
    }

    pub fn answer(&self, question: usize) -> Option<&Answer> {
        self.answers.get(question)
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn total(&self) -> usize {
        self.quiz.questions.len()
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Remaining time as `MM:SS`
    pub fn timer_display(&self) -> String {
        let secs = self.remaining.as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// Choose the option of a single-choice question
    pub fn select(&mut self, question: usize, option_text: &str) -> bool {
        if self.submitted {
            return false;
        }
        match self.answers.get_mut(question) {
            Some(Answer::Single(choice)) => {
                *choice = Some(option_text.to_string());
                true
            }
            _ => false,
        }
    }

    /// Check or uncheck an option of a multiple-choice question
    pub fn toggle(&mut self, question: usize, option_text: &str, checked: bool) -> bool {
        if self.submitted {
            return false;
        }
        let Some(Answer::Multiple(choices)) = self.answers.get_mut(question) else {
            return false;
        };

        let present = choices.iter().any(|c| c == option_text);
        if checked && !present {
            choices.push(option_text.to_string());
        } else if !checked {
            choices.retain(|c| c != option_text);
        }
        true
    }

    /// Let time pass; submits automatically when the clock runs out.
    ///
    /// Returns `true` if this call submitted the quiz.
    pub fn elapse(&mut self, elapsed: Duration) -> bool {
        if self.submitted {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        if self.remaining.is_zero() {
            info!("Quiz time is up, submitting");
            self.submit();
            return true;
        }
        false
    }

    /// Score the quiz and reveal results; later calls keep the first score
    pub fn submit(&mut self) -> usize {
        if self.submitted {
            return self.score;
        }

        self.score = self
            .quiz
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(question, answer)| is_correct(question, answer))
            .count();
        self.submitted = true;
        debug!(score = self.score, total = self.total(), "Quiz submitted");
        self.score
    }

    /// Result classification of an option; `None` until submitted
    pub fn outcome(&self, question: usize, option: &QuizQuestionOption) -> Option<OptionOutcome> {
        if !self.submitted {
            return None;
        }
        let selected = self
            .answers
            .get(question)
            .is_some_and(|answer| answer.is_selected(&option.text));

        Some(if option.is_correct {
            OptionOutcome::Correct
        } else if selected {
            OptionOutcome::WrongSelection
        } else {
            OptionOutcome::Neutral
        })
    }
}

fn is_correct(question: &QuizQuestion, answer: &Answer) -> bool {
    match answer {
        Answer::Single(choice) => question
            .options
            .iter()
            .find(|opt| opt.is_correct)
            .is_some_and(|correct| choice.as_deref() == Some(correct.text.as_str())),
        Answer::Multiple(choices) => {
            let correct = question.correct_options();
            correct.len() == choices.len() && correct.iter().all(|c| choices.iter().any(|s| s == c))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(text: &str, is_correct: bool) -> QuizQuestionOption {
        QuizQuestionOption {
            text: text.to_string(),
            is_correct,
        }
    }

    fn sample_quiz() -> QuizData {
        QuizData {
            title: "Thermodynamics".to_string(),
            questions: vec![
                QuizQuestion {
                    question_text: "Unit of energy?".to_string(),
                    question_type: QuestionType::SingleChoice,
                    options: vec![option("Joule", true), option("Watt", false)],
                    explanation: None,
                },
                QuizQuestion {
                    question_text: "State functions?".to_string(),
                    question_type: QuestionType::MultipleChoice,
                    options: vec![
                        option("Entropy", true),
                        option("Heat", false),
                        option("Enthalpy", true),
                    ],
                    explanation: Some("Heat depends on the path.".to_string()),
                },
            ],
        }
    }

    #[test]
    fn test_full_marks() {
        let mut session = QuizSession::new(sample_quiz(), DEFAULT_TIME_LIMIT);
        session.select(0, "Joule");
        session.toggle(1, "Enthalpy", true);
        session.toggle(1, "Entropy", true);
        assert_eq!(session.submit(), 2);
    }

    #[test]
    fn test_multiple_choice_requires_exact_set() {
        let mut session = QuizSession::new(sample_quiz(), DEFAULT_TIME_LIMIT);
        session.toggle(1, "Entropy", true);
        session.toggle(1, "Heat", true);
        session.toggle(1, "Enthalpy", true);
        session.toggle(1, "Heat", false);
        session.toggle(1, "Heat", false);
        assert_eq!(session.answer(1), Some(&Answer::Multiple(vec!["Entropy".to_string(), "Enthalpy".to_string()])));

        let mut wrong = QuizSession::new(sample_quiz(), DEFAULT_TIME_LIMIT);
        wrong.toggle(1, "Entropy", true);
        assert_eq!(wrong.submit(), 0);
    }

    #[test]
    fn test_select_rejects_wrong_question_kind() {
        let mut session = QuizSession::new(sample_quiz(), DEFAULT_TIME_LIMIT);
        assert!(!session.select(1, "Entropy"));
        assert!(!session.toggle(0, "Joule", true));
        assert!(!session.select(7, "Joule"));
    }

    #[test]
    fn test_timer_auto_submits() {
        let mut session = QuizSession::new(sample_quiz(), Duration::from_secs(90));
        session.select(0, "Joule");
        assert_eq!(session.timer_display(), "01:30");

        assert!(!session.elapse(Duration::from_secs(85)));
        assert_eq!(session.timer_display(), "00:05");
        assert!(session.elapse(Duration::from_secs(10)));
        assert!(session.is_submitted());
        assert_eq!(session.score(), 1);
        assert_eq!(session.timer_display(), "00:00");

        // No edits after submission.
        assert!(!session.select(0, "Watt"));
        assert!(!session.elapse(Duration::from_secs(1)));
    }

    #[test]
    fn test_option_outcomes() {
        let quiz = sample_quiz();
        let mut session = QuizSession::new(quiz.clone(), DEFAULT_TIME_LIMIT);
        session.select(0, "Watt");
        assert_eq!(session.outcome(0, &quiz.questions[0].options[0]), None);

        session.submit();
        let options = &quiz.questions[0].options;
        assert_eq!(session.outcome(0, &options[0]), Some(OptionOutcome::Correct));
        assert_eq!(session.outcome(0, &options[1]), Some(OptionOutcome::WrongSelection));
        assert_eq!(
            session.outcome(1, &quiz.questions[1].options[1]),
            Some(OptionOutcome::Neutral)
        );
    }
}
