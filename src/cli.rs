//! Command-line argument parsing for the demo
//!
//! Supports:
//! - Seeding the field with a storage-form value
//! - Typing text one character at a time
//! - Replaying navigation keys
//! - Loading choices and config from files

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Simulate a mention-enabled textarea
#[derive(Parser, Debug)]
#[command(name = "mentionkit", version, about = "Simulate a mention-enabled textarea")]
pub struct CliArgs {
    /// Initial model value (storage form)
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub text: String,

    /// Characters to type at the end of the field, one event each
    #[arg(long = "type", value_name = "TEXT", default_value = "")]
    pub typed: String,

    /// Navigation keys to press afterwards (comma separated)
    #[arg(long, value_enum, value_delimiter = ',', value_name = "KEYS")]
    pub keys: Vec<DemoKey>,

    /// YAML or JSON list of `{label, id}` choices
    #[arg(long, value_name = "FILE")]
    pub choices: Option<PathBuf>,

    /// Config file (defaults to ~/.config/mentionkit/config.yaml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Field width in pixels
    #[arg(long, value_name = "PX", default_value_t = 320.0)]
    pub width: f32,

    /// Print the final state as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoKey {
    Up,
    Down,
    Enter,
    /// Close the popup without committing
    Esc,
    /// Click somewhere outside the field
    Outside,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys_list() {
        let args = CliArgs::parse_from(["mentionkit", "--type", "hi $ky", "--keys", "down,up,enter"]);
        assert_eq!(args.typed, "hi $ky");
        assert_eq!(args.keys, vec![DemoKey::Down, DemoKey::Up, DemoKey::Enter]);
        assert!(!args.json);
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["mentionkit"]);
        assert!(args.text.is_empty());
        assert!(args.keys.is_empty());
        assert_eq!(args.width, 320.0);
    }
}
