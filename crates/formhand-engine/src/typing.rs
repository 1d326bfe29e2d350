//! Keystroke program generation with human-like errors.
//!
//! A target string becomes a command stream sprinkled with roughly 8%
//! mistakes of two shapes: a wrong character that gets backspaced, and a
//! swapped pair that gets backspaced twice. The rate is approximate by
//! design; there is no smoothing and no per-word quota.

use std::time::Duration;

use rand::Rng;

use formhand_protocols::Command;

use crate::link::{CommandSink, LinkError};

/// Probability of injecting an error at any given position.
const ERROR_RATE: f64 = 0.08;

/// One keystroke plus the pause that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct TypingStep {
    pub command: Command,
    pub pause: Duration,
}

fn step(command: Command, pause_ms: u64) -> TypingStep {
    TypingStep {
        command,
        pause: Duration::from_millis(pause_ms),
    }
}

/// Send the whole typing program for `text`.
pub async fn type_text(sink: &dyn CommandSink, text: &str) -> Result<(), LinkError> {
    let program = {
        let mut rng = rand::thread_rng();
        typing_program(text, &mut rng)
    };
    for s in program {
        sink.send(s.command).await?;
        tokio::time::sleep(s.pause).await;
    }
    Ok(())
}

/// Build the keystroke program for `text`.
///
/// `Enter` can never appear in the output; line breaks and tabs flatten to
/// spaces before planning.
pub fn typing_program<R: Rng>(text: &str, rng: &mut R) -> Vec<TypingStep> {
    let chars: Vec<char> = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .collect();

    let mut steps = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let next = chars.get(i + 1).copied();

        if rng.gen_bool(ERROR_RATE) {
            // Swapped pair when the next two positions allow it, otherwise a
            // wrong character; either may fall through to a clean keystroke
            // when no plausible mistake exists.
            let can_swap =
                next.is_some_and(|n| !n.is_whitespace()) && !ch.is_whitespace();
            if can_swap && rng.gen_bool(0.5) {
                let n = next.unwrap();
                steps.push(step(Command::Type { ch: n }, rng.gen_range(30..=60)));
                steps.push(step(Command::Type { ch }, rng.gen_range(200..=500)));
                steps.push(step(Command::key("Backspace"), rng.gen_range(30..=60)));
                steps.push(step(Command::key("Backspace"), rng.gen_range(30..=60)));
                steps.push(step(Command::Type { ch }, rng.gen_range(30..=60)));
                steps.push(step(Command::Type { ch: n }, rng.gen_range(35..=70)));
                i += 2;
                continue;
            }
            if let Some(wrong) = wrong_char(&chars, i, rng) {
                steps.push(step(Command::Type { ch: wrong }, rng.gen_range(150..=500)));
                steps.push(step(Command::key("Backspace"), rng.gen_range(80..=160)));
                steps.push(step(Command::Type { ch }, rng.gen_range(35..=70)));
                i += 1;
                continue;
            }
        }

        steps.push(step(Command::Type { ch }, rng.gen_range(35..=70)));
        i += 1;
    }
    steps
}

/// A plausibly-mistyped letter: drawn from the word around position `i`,
/// never the correct character, never whitespace.
fn wrong_char<R: Rng>(chars: &[char], i: usize, rng: &mut R) -> Option<char> {
    if chars[i].is_whitespace() {
        return None;
    }

    let mut start = i;
    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
    }
    let mut end = i;
    while end + 1 < chars.len() && !chars[end + 1].is_whitespace() {
        end += 1;
    }

    let candidates: Vec<char> = chars[start..=end]
        .iter()
        .copied()
        .filter(|&c| c != chars[i] && !c.is_whitespace())
        .collect();
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.gen_range(0..candidates.len())])
    }
}

#[cfg(test)]
#[path = "typing_tests.rs"]
mod tests;
