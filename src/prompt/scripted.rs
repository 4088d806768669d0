use super::{Prompter, Question, parse_yes_no};
use crate::error::{CatalogError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Script {
    answers: VecDeque<String>,
    asked: Vec<String>,
    shown: Vec<String>,
    rejections: Vec<(String, String)>,
}

/// Answers questions from a fixed script.
///
/// Validators are applied exactly as an operator would experience them: a
/// rejected answer is recorded and the next scripted answer is tried for the
/// same question.
///
/// Clones share one script, so a clone can be handed to
/// [`register`](crate::workflow::register) while the original is kept to
/// inspect what was asked.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    script: Arc<Mutex<Script>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script = Script {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Script::default()
        };
        Self {
            script: Arc::new(Mutex::new(script)),
        }
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Prompts in the order they were asked, repeated once per attempt.
    pub fn asked(&self) -> Vec<String> {
        self.script().asked.clone()
    }

    pub fn shown(&self) -> Vec<String> {
        self.script().shown.clone()
    }

    /// `(answer, validator message)` for every rejected answer.
    pub fn rejections(&self) -> Vec<(String, String)> {
        self.script().rejections.clone()
    }

    pub fn remaining(&self) -> usize {
        self.script().answers.len()
    }

    fn next_answer(&self, prompt: &str) -> Result<String> {
        let mut script = self.script();
        script.asked.push(prompt.to_owned());
        script
            .answers
            .pop_front()
            .map(|a| a.trim().to_owned())
            .ok_or_else(|| CatalogError::Prompt(format!("script exhausted at '{}'", prompt.trim())))
    }
}

impl Prompter for ScriptedPrompter {
    fn ask_text(&mut self, question: &Question) -> Result<String> {
        loop {
            let answer = self.next_answer(&question.prompt)?;
            match question.check(&answer) {
                Ok(()) => return Ok(answer),
                Err(rejected) => self.script().rejections.push((answer, rejected.to_string())),
            }
        }
    }

    fn ask_yes_no(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.next_answer(prompt)?;
        parse_yes_no(&answer).ok_or_else(|| {
            CatalogError::Prompt(format!("scripted answer '{answer}' to '{prompt}' is not y/n"))
        })
    }

    fn show(&mut self, message: &str) {
        self.script().shown.push(message.to_owned());
    }
}
