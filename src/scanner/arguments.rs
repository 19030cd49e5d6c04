//! Validation of caller-supplied scanner arguments

use crate::utils::Prompter;
use log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Flags the scanner is known to accept
#[derive(Debug, Clone, Default)]
pub struct KnownArguments {
    known: HashSet<String>,
}

impl KnownArguments {
    /// Load from a newline-delimited file. A missing file means nothing is known.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_lines(content.lines()),
            Err(e) => {
                debug!("known arguments file {} unavailable: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            known: lines
                .into_iter()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Only the flag itself is checked, not any value after a space
    pub fn is_known(&self, arg: &str) -> bool {
        let flag = arg.split(' ').next().unwrap_or(arg);
        self.known.contains(flag)
    }

    /// Keep known arguments; ask about the rest and drop what is declined
    pub fn validate(&self, args: &[String], prompter: &dyn Prompter) -> Vec<String> {
        let mut runnable = Vec::with_capacity(args.len());
        for arg in args {
            if self.is_known(arg) {
                runnable.push(arg.clone());
            } else if prompter.confirm_unknown_argument(arg) {
                info!("using unknown argument '{}' as confirmed", arg);
                runnable.push(arg.clone());
            } else {
                debug!("dropping unconfirmed argument '{}'", arg);
            }
        }
        runnable
    }
}
