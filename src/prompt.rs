//! Operator prompting.
//!
//! The registration workflow asks its questions through the [`Prompter`]
//! trait and never touches the terminal itself. A [`Question`] carries its
//! own [`Validator`]; prompters keep re-asking until an answer passes, so a
//! rejected answer never leaves the field it was given for.
//!
//! - [`terminal::TerminalPrompter`]: interactive line editing with tab
//!   completion
//! - [`scripted::ScriptedPrompter`]: canned answers, for tests and replay

pub mod scripted;
pub mod terminal;

pub use scripted::ScriptedPrompter;
pub use terminal::TerminalPrompter;

use crate::error::{CatalogError, Result};

type Check = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Predicate over an answer plus the fixed message shown when it fails.
pub struct Validator {
    check: Check,
    message: String,
}

impl Validator {
    pub fn new(
        message: impl Into<String>,
        check: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            check: Box::new(check),
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::ValidationRejected`] with this validator's message.
    pub fn validate(&self, answer: &str) -> Result<()> {
        if (self.check)(answer) {
            Ok(())
        } else {
            Err(CatalogError::rejected(self.message.clone()))
        }
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// A free-text question.
#[derive(Debug)]
pub struct Question {
    pub prompt: String,
    pub validator: Option<Validator>,
    /// Suggestions offered to the operator; answers outside them are allowed
    pub completions: Vec<String>,
}

impl Question {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            validator: None,
            completions: Vec::new(),
        }
    }

    #[must_use]
    pub fn validate_with(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    #[must_use]
    pub fn complete_from<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.completions = candidates.into_iter().map(Into::into).collect();
        self
    }

    /// Checks an answer against the question's validator, if any.
    pub fn check(&self, answer: &str) -> Result<()> {
        match &self.validator {
            Some(validator) => validator.validate(answer),
            None => Ok(()),
        }
    }
}

/// Asks an operator for answers.
pub trait Prompter {
    /// Asks until an answer passes the question's validator. Answers are
    /// returned trimmed.
    fn ask_text(&mut self, question: &Question) -> Result<String>;

    fn ask_yes_no(&mut self, prompt: &str) -> Result<bool>;

    /// Shows context to the operator without expecting an answer.
    fn show(&mut self, message: &str);
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn ask_text(&mut self, question: &Question) -> Result<String> {
        (**self).ask_text(question)
    }

    fn ask_yes_no(&mut self, prompt: &str) -> Result<bool> {
        (**self).ask_yes_no(prompt)
    }

    fn show(&mut self, message: &str) {
        (**self).show(message);
    }
}

/// Interprets a yes/no answer.
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
