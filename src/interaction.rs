use crate::error::Result;
use crate::repository::EMPTY_INPUT_MESSAGE;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password, Select};

/// Checks one answer; the error string is shown to the user before asking again.
pub type Validator<'a> = &'a dyn Fn(&str) -> std::result::Result<(), String>;

/// Source of answers for the interactive workflow.
///
/// Every method blocks until an answer passes validation.
pub trait Prompter {
    /// Ask for a value without echoing it.
    fn secret(&self, message: &str, validate: Validator<'_>) -> Result<String>;

    fn text(&self, message: &str, validate: Validator<'_>) -> Result<String>;

    /// Index of the chosen item.
    fn select(&self, message: &str, items: &[String]) -> Result<usize>;
}

/// Prompter backed by the user's terminal.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn secret(&self, message: &str, validate: Validator<'_>) -> Result<String> {
        Ok(Password::with_theme(&self.theme)
            .with_prompt(message)
            .validate_with(move |value: &String| validate(value.as_str()))
            .interact()?)
    }

    fn text(&self, message: &str, validate: Validator<'_>) -> Result<String> {
        Ok(Input::<String>::with_theme(&self.theme)
            .with_prompt(message)
            .validate_with(move |value: &String| validate(value.as_str()))
            .interact_text()?)
    }

    fn select(&self, message: &str, items: &[String]) -> Result<usize> {
        Ok(Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(items)
            .default(0)
            .interact()?)
    }
}

pub fn validate_non_empty(value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        Err(EMPTY_INPUT_MESSAGE.to_string())
    } else {
        Ok(())
    }
}
