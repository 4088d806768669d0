//! Field-level answer rules and the validators built from them.

use crate::catalog::model::{Cadence, DataType};
use crate::prompt::Validator;
use chrono::NaiveDate;

pub const DATE_MESSAGE: &str = "The date must be in YYYY-MM-DD format.";
pub const KEYWORD_MESSAGE: &str = "Keywords must be longer than three characters.";
pub const CADENCE_MESSAGE: &str =
    "The cadence must be one of 'month', 'quarter', 'year', or 'none'.";
pub const DATA_TYPE_MESSAGE: &str =
    "The data type must be one of 'numeric', 'string', or 'timestamp'.";
pub const PARENT_MESSAGE: &str =
    "The parent variable must be a valid variable name, and cannot be itself.";
pub const THRESHOLD_MESSAGE: &str = "The suppression threshold must be a numeric value.";
pub const NAME_MESSAGE: &str = "The dataset name cannot be empty.";

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y", "%B %d, %Y"];

pub fn parse_date(answer: &str) -> Option<NaiveDate> {
    let answer = answer.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(answer, fmt).ok())
}

pub fn keyword_is_valid(answer: &str) -> bool {
    answer.trim().chars().count() > 3
}

pub fn parse_threshold(answer: &str) -> Option<f64> {
    answer
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// A parent must be one of the other columns of the same file.
pub fn parent_is_valid(candidate: &str, own_name: &str, columns: &[String]) -> bool {
    candidate != own_name && columns.iter().any(|c| c == candidate)
}

pub fn dataset_name() -> Validator {
    Validator::new(NAME_MESSAGE, |s| !s.trim().is_empty())
}

pub fn date() -> Validator {
    Validator::new(DATE_MESSAGE, |s| parse_date(s).is_some())
}

pub fn keyword() -> Validator {
    Validator::new(KEYWORD_MESSAGE, keyword_is_valid)
}

pub fn cadence() -> Validator {
    Validator::new(CADENCE_MESSAGE, |s| s.parse::<Cadence>().is_ok())
}

pub fn data_type() -> Validator {
    Validator::new(DATA_TYPE_MESSAGE, |s| s.parse::<DataType>().is_ok())
}

pub fn threshold() -> Validator {
    Validator::new(THRESHOLD_MESSAGE, |s| parse_threshold(s).is_some())
}

pub fn parent_variable(own_name: &str, columns: &[String]) -> Validator {
    let own_name = own_name.to_owned();
    let columns = columns.to_vec();
    Validator::new(PARENT_MESSAGE, move |s| parent_is_valid(s, &own_name, &columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(parse_date("2024-01-05"), expected);
        assert_eq!(parse_date("2024/01/05"), expected);
        assert_eq!(parse_date("05-Jan-2024"), expected);
        assert_eq!(parse_date("January 5, 2024"), expected);
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("last tuesday"), None);
    }

    #[test]
    fn test_keyword_length() {
        assert!(!keyword_is_valid("tax"));
        assert!(keyword_is_valid("taxes"));
        assert!(!keyword_is_valid("  ab  "));
    }

    #[test]
    fn test_threshold() {
        assert_eq!(parse_threshold("10"), Some(10.0));
        assert_eq!(parse_threshold("0.5"), Some(0.5));
        assert_eq!(parse_threshold("ten"), None);
        assert_eq!(parse_threshold("NaN"), None);
    }

    #[test]
    fn test_parent_rules() {
        let columns = vec!["region".to_owned(), "district".to_owned()];
        assert!(parent_is_valid("region", "district", &columns));
        assert!(!parent_is_valid("district", "district", &columns));
        assert!(!parent_is_valid("country", "district", &columns));

        let validator = parent_variable("district", &columns);
        assert!(validator.validate("district").is_err());
        assert!(validator.validate("region").is_ok());
    }
}
