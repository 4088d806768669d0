//! The questions asked during a registration.
//!
//! Each function gathers one group of answers through a [`Prompter`] and
//! returns them as catalog records. No decisions are taken here.

use super::rules;
use crate::catalog::model::{NewDataset, NewEdition, NewVariable};
use crate::catalog::snapshot::CatalogSnapshot;
use crate::error::{CatalogError, Result};
use crate::input::InputFile;
use crate::prompt::{Prompter, Question};

/// Answers describing a dataset seen for the first time.
#[derive(Debug, Clone)]
pub struct DatasetAnswers {
    pub dataset: NewDataset,
    pub keywords: Vec<String>,
}

pub fn ask_dataset_name(
    prompter: &mut dyn Prompter,
    snapshot: &CatalogSnapshot,
    input: &InputFile,
) -> Result<String> {
    let question = Question::new(format!(
        "What is the dataset name for {}? Enter a new name\n\
         if this is the first time documenting this dataset.\n-> ",
        input.file_name
    ))
    .validate_with(rules::dataset_name())
    .complete_from(snapshot.dataset_names());
    prompter.ask_text(&question)
}

fn ask(prompter: &mut dyn Prompter, prompt: &str) -> Result<String> {
    prompter.ask_text(&Question::new(prompt))
}

pub fn ask_dataset_details(
    prompter: &mut dyn Prompter,
    snapshot: &CatalogSnapshot,
    table_name: &str,
    topic: &str,
) -> Result<DatasetAnswers> {
    let description = ask(prompter, "Provide a short description of the table: ")?;
    let unit_of_analysis = ask(prompter, "What is the unit of analysis of this table? ")?;
    let universe = ask(prompter, "How would you describe the universe of this table? ")?;
    let owner = ask(prompter, "Who 'owns' this dataset? ")?;
    let collector = ask(prompter, "Who is responsible for collecting this dataset? ")?;
    let collection_method = ask(prompter, "Describe the method of collection for this dataset: ")?;
    let collection_reason = ask(
        prompter,
        "Why was this dataset collected (as stated by the collector)? ",
    )?;
    let source_url = ask(prompter, "Source url: ")?;
    let notes = ask(prompter, "Additional notes: ")?;
    let use_conditions = ask(prompter, "Are there any restrictions on sharing this dataset? ")?;

    let keywords = ask_keywords(prompter, snapshot)?;

    let cadence = prompter
        .ask_text(
            &Question::new(
                "What cadence is the dataset reported at or valid for? \
                 (month, quarter, year, none) ",
            )
            .validate_with(rules::cadence())
            .complete_from(crate::catalog::Cadence::ALL.map(|c| c.as_str())),
        )?
        .parse()
        .map_err(|e| CatalogError::rejected(format!("{e}")))?;

    Ok(DatasetAnswers {
        dataset: NewDataset {
            table_name: table_name.to_owned(),
            description,
            unit_of_analysis,
            universe,
            owner,
            collector,
            collection_method,
            collection_reason,
            source_url,
            notes,
            use_conditions,
            cadence,
            topic: topic.to_owned(),
        },
        keywords,
    })
}

fn ask_keywords(prompter: &mut dyn Prompter, snapshot: &CatalogSnapshot) -> Result<Vec<String>> {
    let question = Question::new("Add a keyword: ")
        .validate_with(rules::keyword())
        .complete_from(snapshot.known_keywords().iter().cloned());

    let mut keywords = Vec::new();
    loop {
        keywords.push(prompter.ask_text(&question)?);
        prompter.show(&format!("Current keywords: {}", keywords.join(",")));
        if !prompter.ask_yes_no("Add another keyword?")? {
            return Ok(keywords);
        }
    }
}

/// Describes every column of the file, in file order.
pub fn ask_variable_details(
    prompter: &mut dyn Prompter,
    input: &InputFile,
) -> Result<Vec<NewVariable>> {
    let mut variables = Vec::with_capacity(input.columns.len());

    for column in &input.columns {
        let name = &column.name;
        prompter.show(&format!("Variable name: {name}"));
        prompter.show(&format!("Example rows:\n{}", column.examples.join("\n")));

        let description = ask(
            prompter,
            "Provide a short description about what this variable is reporting: ",
        )?;
        let data_type = prompter
            .ask_text(
                &Question::new("What is data type of this variable? ")
                    .validate_with(rules::data_type())
                    .complete_from(crate::catalog::DataType::ALL.map(|t| t.as_str())),
            )?
            .parse()
            .map_err(|e| CatalogError::rejected(format!("{e}")))?;

        let has_parent = prompter.ask_yes_no("Does this variable have a parent variable?")?;
        let parent_variable = if has_parent {
            let siblings = input.other_columns(name);
            Some(prompter.ask_text(
                &Question::new("Parent variable: ")
                    .validate_with(rules::parent_variable(name, &siblings))
                    .complete_from(siblings),
            )?)
        } else {
            None
        };

        let suppression_threshold =
            if prompter.ask_yes_no("Is there a level that this data should be suppressed?")? {
                let answer = prompter.ask_text(
                    &Question::new("What is the minimum value that our tools should display? ")
                        .validate_with(rules::threshold()),
                )?;
                rules::parse_threshold(&answer)
            } else {
                None
            };

        let standard = if prompter.ask_yes_no("Does the variable follow any known standard?")? {
            Some(ask(prompter, "Which standard does it follow? ")?)
        } else {
            None
        };

        variables.push(NewVariable {
            variable_name: name.clone(),
            description,
            data_type,
            parent_variable,
            suppression_threshold,
            standard,
        });
    }

    Ok(variables)
}

/// Edition attributes; the record count comes from the file.
pub fn ask_edition_details(prompter: &mut dyn Prompter, input: &InputFile) -> Result<NewEdition> {
    let num_records = i64::try_from(input.row_count)
        .map_err(|_| CatalogError::Input(format!("{} has too many rows", input.file_name)))?;

    let notes = ask(
        prompter,
        "Are there any edition-specific notes that you'd like to include? ",
    )?;
    let publish_date = ask_date(prompter, "What date was this dataset published? ")?;
    let collection_start = ask_date(prompter, "What is the start date of this dataset? ")?;
    let collection_end = ask_date(prompter, "What is the end date of this dataset? ")?;
    let acquisition_date = ask_date(prompter, "What date was this dataset added to the system? ")?;

    Ok(NewEdition {
        num_records,
        notes,
        publish_date,
        collection_start,
        collection_end,
        acquisition_date,
    })
}

fn ask_date(prompter: &mut dyn Prompter, prompt: &str) -> Result<chrono::NaiveDate> {
    let answer = prompter.ask_text(&Question::new(prompt).validate_with(rules::date()))?;
    rules::parse_date(&answer).ok_or_else(|| CatalogError::rejected(rules::DATE_MESSAGE))
}
