use super::{Prompter, Question, parse_yes_no};
use crate::error::Result;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator as LineValidator;
use rustyline::{Context, Editor, Helper};

/// Tab completion over a fixed candidate list.
#[derive(Debug, Default)]
struct CandidateHelper {
    candidates: Vec<String>,
}

impl Completer for CandidateHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = line.get(..pos).unwrap_or(line);
        let matches = self
            .candidates
            .iter()
            .filter(|c| c.starts_with(typed))
            .map(|c| Pair {
                display: c.clone(),
                replacement: c.clone(),
            })
            .collect();
        Ok((0, matches))
    }
}

impl Hinter for CandidateHelper {
    type Hint = String;
}

impl Highlighter for CandidateHelper {}

impl LineValidator for CandidateHelper {}

impl Helper for CandidateHelper {}

/// Interactive prompter on the controlling terminal.
pub struct TerminalPrompter {
    editor: Editor<CandidateHelper, DefaultHistory>,
}

impl TerminalPrompter {
    /// # Errors
    ///
    /// Fails if the terminal cannot be put into line-editing mode.
    pub fn new() -> Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(CandidateHelper::default()));
        Ok(Self { editor })
    }

    fn read_line(&mut self, prompt: &str, candidates: &[String]) -> Result<String> {
        if let Some(helper) = self.editor.helper_mut() {
            helper.candidates = candidates.to_vec();
        }
        let line = self.editor.readline(prompt)?;
        Ok(line.trim().to_owned())
    }
}

impl Prompter for TerminalPrompter {
    #[expect(clippy::print_stdout)]
    fn ask_text(&mut self, question: &Question) -> Result<String> {
        loop {
            let answer = self.read_line(&question.prompt, &question.completions)?;
            match question.check(&answer) {
                Ok(()) => return Ok(answer),
                Err(rejected) => println!("{rejected}"),
            }
        }
    }

    #[expect(clippy::print_stdout)]
    fn ask_yes_no(&mut self, prompt: &str) -> Result<bool> {
        let prompt = format!("{prompt} (y/n) ");
        loop {
            let answer = self.read_line(&prompt, &[])?;
            match parse_yes_no(&answer) {
                Some(value) => return Ok(value),
                None => println!("Please answer 'y' or 'n'."),
            }
        }
    }

    #[expect(clippy::print_stdout)]
    fn show(&mut self, message: &str) {
        println!("{message}");
    }
}
