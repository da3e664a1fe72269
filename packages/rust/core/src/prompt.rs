//! Injectable interactive input.
//!
//! Everything that talks to the user goes through a [`ChoiceSource`], so the
//! selector, the pipeline and the delivery sinks run unchanged against a
//! terminal or a scripted answer list.

use std::collections::VecDeque;

use dunning_shared::{DunningError, Result};

/// A line-oriented conversation with the user.
pub trait ChoiceSource {
    /// Print one line of output.
    fn show(&mut self, line: &str);

    /// Ask a question and return the raw answer line (without the newline).
    ///
    /// End of input is [`DunningError::InputClosed`].
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Yes/no question; only `y`/`yes` (any case) is yes.
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.ask(prompt)?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Parse a 1-based menu answer.
///
/// With `optional`, the extra index `count + 1` means skip and yields
/// `Ok(None)`. Anything else out of range, or non-numeric, is
/// [`DunningError::InvalidSelection`].
pub fn parse_selection(input: &str, count: usize, optional: bool) -> Result<Option<usize>> {
    let invalid = || DunningError::InvalidSelection {
        input: input.to_string(),
    };
    let n: usize = input.trim().parse().map_err(|_| invalid())?;
    match n {
        n if (1..=count).contains(&n) => Ok(Some(n - 1)),
        n if optional && n == count + 1 => Ok(None),
        _ => Err(invalid()),
    }
}

/// Show a numbered menu and block until a valid answer.
///
/// Blank answers are ignored; invalid ones are reported and re-asked.
/// Returns the chosen index, or `None` when `skip_label` is given and chosen.
pub fn choose_index(
    source: &mut dyn ChoiceSource,
    title: &str,
    options: &[String],
    skip_label: Option<&str>,
) -> Result<Option<usize>> {
    source.show("");
    source.show(title);
    for (i, option) in options.iter().enumerate() {
        source.show(&format!("  {}. {option}", i + 1));
    }
    if let Some(label) = skip_label {
        source.show(&format!("  {}. {label}", options.len() + 1));
    }

    let optional = skip_label.is_some();
    let upper = options.len() + usize::from(optional);
    let prompt = format!("Enter your choice (1-{upper}): ");
    loop {
        let answer = source.ask(&prompt)?;
        if answer.trim().is_empty() {
            continue;
        }
        match parse_selection(&answer, options.len(), optional) {
            Ok(choice) => return Ok(choice),
            Err(DunningError::InvalidSelection { input }) => {
                if input.trim().parse::<usize>().is_ok() {
                    source.show(&format!("Please enter a number between 1 and {upper}"));
                } else {
                    source.show("Please enter a valid number");
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// A [`ChoiceSource`] that replays canned answers and records the dialogue.
#[derive(Debug, Default)]
pub struct ScriptedChoices {
    answers: VecDeque<String>,
    /// Lines passed to [`ChoiceSource::show`].
    pub shown: Vec<String>,
    /// Prompts passed to [`ChoiceSource::ask`].
    pub asked: Vec<String>,
}

impl ScriptedChoices {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    /// Whether any shown line contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.shown.iter().any(|l| l.contains(needle))
    }
}

impl ChoiceSource for ScriptedChoices {
    fn show(&mut self, line: &str) {
        self.shown.push(line.to_string());
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.asked.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| DunningError::InputClosed {
                prompt: prompt.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn selection_parsing() {
        assert_eq!(parse_selection("2", 3, false).expect("valid"), Some(1));
        assert_eq!(parse_selection(" 1 ", 3, false).expect("valid"), Some(0));
        assert_eq!(parse_selection("4", 3, true).expect("skip"), None);
        assert!(matches!(
            parse_selection("4", 3, false),
            Err(DunningError::InvalidSelection { .. })
        ));
        assert!(parse_selection("0", 3, false).is_err());
        assert!(parse_selection("two", 3, false).is_err());
        assert!(parse_selection("-1", 3, false).is_err());
    }

    #[test]
    fn menu_reprompts_until_valid() {
        let mut source = ScriptedChoices::new(["", "abc", "9", "2"]);
        let choice = choose_index(&mut source, "Pick one:", &options(&["A", "B"]), None)
            .expect("choice");
        assert_eq!(choice, Some(1));
        assert_eq!(source.asked.len(), 4);
        assert!(source.saw("Please enter a valid number"));
        assert!(source.saw("Please enter a number between 1 and 2"));
        assert!(source.saw("  2. B"));
    }

    #[test]
    fn menu_skip_entry() {
        let mut source = ScriptedChoices::new(["3"]);
        let choice = choose_index(&mut source, "Pick:", &options(&["A", "B"]), Some("Skip"))
            .expect("choice");
        assert_eq!(choice, None);
        assert!(source.saw("  3. Skip"));
        assert_eq!(source.asked[0], "Enter your choice (1-3): ");
    }

    #[test]
    fn exhausted_script_is_input_closed() {
        let mut source = ScriptedChoices::new(Vec::<String>::new());
        let err = choose_index(&mut source, "Pick:", &options(&["A"]), None).unwrap_err();
        assert!(matches!(err, DunningError::InputClosed { .. }));
    }

    #[test]
    fn confirm_accepts_y_and_yes() {
        let mut source = ScriptedChoices::new(["Y", "yes", "n", ""]);
        assert!(source.confirm("?").expect("answer"));
        assert!(source.confirm("?").expect("answer"));
        assert!(!source.confirm("?").expect("answer"));
        assert!(!source.confirm("?").expect("answer"));
        assert_eq!(source.remaining(), 0);
    }
}
