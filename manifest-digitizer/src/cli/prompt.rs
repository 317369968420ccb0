//! Interactive prompts for mode and record bounds

use anyhow::{Context, Result};
use dialoguer::{Input, Select};

use super::Mode;

pub fn select_mode() -> Result<Mode> {
    let labels: Vec<&str> = Mode::ALL.iter().map(Mode::menu_label).collect();

    let index = Select::new()
        .with_prompt("Choose processing mode")
        .items(&labels)
        .default(0)
        .interact()
        .context("Failed to read processing mode")?;

    Ok(Mode::ALL[index])
}

/// Ask for a record count; blank input keeps `default`
pub fn record_count(prompt: &str, default: Option<usize>) -> Result<Option<usize>> {
    let answer: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), String> {
            parse_count(input)
                .map(|_| ())
                .ok_or_else(|| "Enter a whole number".to_string())
        })
        .interact_text()
        .with_context(|| format!("Failed to read '{}'", prompt))?;

    Ok(parse_count(&answer).flatten().or(default))
}

/// `Some(None)` for blank input, `Some(Some(n))` for a number, `None` if invalid
fn parse_count(input: &str) -> Option<Option<usize>> {
    let input = input.trim();
    if input.is_empty() {
        return Some(None);
    }
    input.parse().ok().map(Some)
}

/// A limit of zero means "no limit"
pub fn limit(max: Option<usize>) -> Option<usize> {
    max.filter(|&n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(""), Some(None));
        assert_eq!(parse_count("  "), Some(None));
        assert_eq!(parse_count(" 25 "), Some(Some(25)));
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count("ten"), None);
    }

    #[test]
    fn test_zero_limit_means_all() {
        assert_eq!(limit(Some(0)), None);
        assert_eq!(limit(Some(50)), Some(50));
        assert_eq!(limit(None), None);
    }
}
