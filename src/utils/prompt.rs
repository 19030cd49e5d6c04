//! Operator confirmation prompts and their non-interactive stand-in

use crate::config::{ArgumentPolicy, NonInteractivePolicy, SaveMode};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Operator's answer to "append or overwrite?"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeChoice {
    Append,
    Overwrite,
    /// Anything else the operator typed
    Invalid(String),
}

impl ModeChoice {
    pub fn parse(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "a" => ModeChoice::Append,
            "o" => ModeChoice::Overwrite,
            other => ModeChoice::Invalid(other.to_string()),
        }
    }
}

/// Anything that can answer operator questions
pub trait Prompter: Send + Sync {
    /// Include a scanner argument that is not in the known list?
    fn confirm_unknown_argument(&self, arg: &str) -> bool;

    /// How to write to a host store that already exists
    fn choose_save_mode(&self, path: &Path) -> ModeChoice;
}

/// Reads answers from stdin
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn ask(question: &str) -> String {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "[?] {}: ", question);
        let _ = stdout.flush();

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return String::new();
        }
        line.trim().to_string()
    }
}

impl Prompter for TerminalPrompter {
    fn confirm_unknown_argument(&self, arg: &str) -> bool {
        let answer = Self::ask(&format!(
            "argument: '{}' is not in the list of 'known' nmap arguments, do you want to use it anyways[y/N]",
            arg
        ));
        answer.eq_ignore_ascii_case("y")
    }

    fn choose_save_mode(&self, path: &Path) -> ModeChoice {
        ModeChoice::parse(&Self::ask(&format!(
            "{} exists, would you like to (a)ppend or (o)verwrite the file",
            path.display()
        )))
    }
}

/// Answers every question from a configured policy
#[derive(Debug, Clone)]
pub struct PolicyPrompter {
    policy: NonInteractivePolicy,
}

impl PolicyPrompter {
    pub fn new(policy: NonInteractivePolicy) -> Self {
        Self { policy }
    }
}

impl Prompter for PolicyPrompter {
    fn confirm_unknown_argument(&self, arg: &str) -> bool {
        let accept = self.policy.unknown_arguments == ArgumentPolicy::Accept;
        log::debug!(
            "non-interactive policy {} unknown argument '{}'",
            if accept { "accepts" } else { "rejects" },
            arg
        );
        accept
    }

    fn choose_save_mode(&self, _path: &Path) -> ModeChoice {
        match self.policy.save_mode {
            SaveMode::Append => ModeChoice::Append,
            SaveMode::Overwrite => ModeChoice::Overwrite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_choice_parse() {
        assert_eq!(ModeChoice::parse("a"), ModeChoice::Append);
        assert_eq!(ModeChoice::parse(" O \n"), ModeChoice::Overwrite);
        assert_eq!(
            ModeChoice::parse("maybe"),
            ModeChoice::Invalid("maybe".to_string())
        );
    }

    #[test]
    fn test_policy_prompter_defaults_reject_and_append() {
        let prompter = PolicyPrompter::new(NonInteractivePolicy::default());
        assert!(!prompter.confirm_unknown_argument("--script=vuln"));
        assert_eq!(
            prompter.choose_save_mode(Path::new("hosts.txt")),
            ModeChoice::Append
        );
    }

    #[test]
    fn test_policy_prompter_accepting() {
        let prompter = PolicyPrompter::new(NonInteractivePolicy {
            enabled: true,
            unknown_arguments: ArgumentPolicy::Accept,
            save_mode: SaveMode::Overwrite,
        });
        assert!(prompter.confirm_unknown_argument("-A"));
        assert_eq!(
            prompter.choose_save_mode(Path::new("hosts.txt")),
            ModeChoice::Overwrite
        );
    }
}
