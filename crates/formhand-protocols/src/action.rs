//! High-level automation directives.
//!
//! Clients submit comma-delimited strings to `/automation`; they are parsed
//! into variants at intake. Lines that match no known directive pass through
//! to the Injector verbatim, so the raw command grammar keeps working
//! end-to-end.

use serde::{Deserialize, Serialize};

/// One directive for the action engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Clear and type into the input matched by `selector`.
    FillField { selector: String, text: String },
    /// Click the element matched by `selector`, verifying any checked-state
    /// change.
    ClickSelector { selector: String },
    /// Click the option inside `selector` whose label contains `label`.
    ClickOption { selector: String, label: String },
    /// Local pause; nothing is transmitted.
    Delay { ms: u64 },
    /// Raw Injector line forwarded verbatim.
    Raw(String),
}

impl Action {
    /// Parse one wire line.
    ///
    /// `FILL_FIELD` and `CLICK_OPTION` split on the first two commas only:
    /// the trailing field (text or label) may itself contain commas.
    pub fn parse_line(line: &str) -> Action {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("FILL_FIELD,") {
            if let Some((selector, text)) = rest.split_once(',') {
                return Action::FillField {
                    selector: selector.trim().to_string(),
                    text: text.trim().to_string(),
                };
            }
        }

        if let Some(rest) = trimmed.strip_prefix("CLICK_OPTION,") {
            if let Some((selector, label)) = rest.split_once(',') {
                return Action::ClickOption {
                    selector: selector.trim().to_string(),
                    label: label.trim().to_string(),
                };
            }
        }

        if let Some(selector) = trimmed.strip_prefix("CLICK_SELECTOR,") {
            let selector = selector.trim();
            if !selector.is_empty() {
                return Action::ClickSelector {
                    selector: selector.to_string(),
                };
            }
        }

        if let Some(ms) = trimmed.strip_prefix("DELAY,") {
            if let Ok(ms) = ms.trim().parse::<u64>() {
                return Action::Delay { ms };
            }
        }

        Action::Raw(trimmed.to_string())
    }

    /// Parse a whole command list, dropping empty lines.
    pub fn parse_list<I, S>(lines: I) -> Vec<Action>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter(|l| !l.as_ref().trim().is_empty())
            .map(|l| Action::parse_line(l.as_ref()))
            .collect()
    }
}
