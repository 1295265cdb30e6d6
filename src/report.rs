//! Console output for interactive runs.
//!
//! `ConsoleSink` prints live progress; `print_banner` and `print_result`
//! bracket a run. Display truncation lives here and nowhere else, so
//! completion detection always sees the full response.

use colored::*;

use crate::config::ResolvedRun;
use crate::domain::{IterationRecord, LoopOutcome, LoopResult};
use crate::gateway::AgentEvent;
use crate::observe::ProgressSink;

/// Characters of a response shown in progress lines.
pub const SUMMARY_CHARS: usize = 200;

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn summarize(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn iteration_line(index: u32, total: u32) -> String {
    format!("=== Iteration {}/{} ===", index, total)
}

pub fn prompt_line(prompt: &str) -> String {
    format!("Sending prompt (length: {})...", prompt.chars().count())
}

/// Plain-text description of how a run ended, with the iterations it took.
pub fn outcome_line(result: &LoopResult) -> String {
    let iterations = result.iterations_run();
    match &result.outcome {
        LoopOutcome::Completed { iteration, .. } => {
            format!("Completed after {} iteration(s)", iteration)
        }
        LoopOutcome::Exhausted {
            sentinel_required: false,
            ..
        } => format!("Finished all {} iteration(s)", iterations),
        LoopOutcome::Exhausted {
            sentinel_required: true,
            ..
        } => format!("Max iterations ({}) reached without completion", iterations),
        LoopOutcome::Failed { iteration, cause } => {
            format!("Failed at iteration {}: {}", iteration, cause)
        }
    }
}

/// The whole last response, partial or not, for the end-of-run diagnostic.
pub fn last_response_block(result: &LoopResult) -> Option<String> {
    result
        .last_response()
        .map(|last| format!("Last response:\n{}", last))
}

/// Prints progress to stdout as the loop runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn iteration_started(&self, index: u32, total: u32) {
        println!("\n{}", iteration_line(index, total).cyan().bold());
    }

    fn prompt_sent(&self, _index: u32, prompt: &str) {
        println!("{}", prompt_line(prompt).dimmed());
    }

    fn agent_event(&self, _index: u32, event: &AgentEvent) {
        if let AgentEvent::ToolExecutionStart { tool_name } = event {
            println!("  {} {}", "⚙".yellow(), tool_name);
        }
    }

    fn iteration_finished(&self, record: &IterationRecord) {
        if let Some(response) = &record.response_text {
            println!("{} {}", "Response:".green(), summarize(response, SUMMARY_CHARS));
        }
        if let Some(error) = &record.error {
            println!("{} {}", "Error:".red(), error);
        }
    }
}

/// Print the run header.
pub fn print_banner(run: &ResolvedRun) {
    println!("{}", "Ralph loop".bold());
    println!("{} {}", "Mode:".green(), run.mode);
    println!("{} {}", "Prompt:".green(), run.loop_config.prompt_source);
    println!("{} {}", "Max iterations:".green(), run.loop_config.max_iterations);
    if let Some(sentinel) = run.loop_config.sentinel() {
        println!("{} {}", "Sentinel:".green(), sentinel);
    }
}

/// Print the final report for a finished run.
pub fn print_result(result: &LoopResult) {
    println!();
    match &result.outcome {
        LoopOutcome::Completed { response, .. } => {
            println!("{}", outcome_line(result).green().bold());
            println!("\n{}", response);
        }
        LoopOutcome::Exhausted { sentinel_required, .. } => {
            let line = outcome_line(result);
            if *sentinel_required {
                println!("{}", line.yellow().bold());
            } else {
                println!("{}", line.green().bold());
            }
            print_last_response(result);
        }
        LoopOutcome::Failed { .. } => {
            println!("{}", outcome_line(result).red().bold());
            print_last_response(result);
        }
    }
}

fn print_last_response(result: &LoopResult) {
    if let Some(block) = last_response_block(result) {
        println!("\n{}", block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FailureCause, PendingIteration};
    use crate::gateway::GatewayError;

    #[test]
    fn test_summarize_short_text_unchanged() {
        assert_eq!(summarize("hello", 200), "hello");
    }

    #[test]
    fn test_summarize_exact_length_unchanged() {
        let text = "a".repeat(200);
        assert_eq!(summarize(&text, 200), text);
    }

    #[test]
    fn test_summarize_truncates() {
        let text = "a".repeat(250);
        let summary = summarize(&text, 200);
        assert_eq!(summary.len(), 203);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_summarize_multibyte_safe() {
        let text = "é".repeat(10);
        assert_eq!(summarize(&text, 3), "ééé...");
    }

    #[test]
    fn test_progress_lines() {
        assert_eq!(iteration_line(2, 5), "=== Iteration 2/5 ===");
        assert_eq!(prompt_line("abcd"), "Sending prompt (length: 4)...");
    }

    #[test]
    fn test_prompt_length_counts_characters() {
        assert_eq!(prompt_line("✓ done"), "Sending prompt (length: 6)...");
    }

    fn history(responses: &[&str]) -> Vec<IterationRecord> {
        responses
            .iter()
            .enumerate()
            .map(|(i, r)| PendingIteration::start(i as u32 + 1, "p").succeed(*r))
            .collect()
    }

    #[test]
    fn test_outcome_lines() {
        let completed = LoopResult::new(
            LoopOutcome::Completed {
                response: "COMPLETE".into(),
                iteration: 3,
            },
            history(&["a", "b", "COMPLETE"]),
        );
        assert_eq!(outcome_line(&completed), "Completed after 3 iteration(s)");

        let finished = LoopResult::new(
            LoopOutcome::Exhausted {
                last_response: Some("c".into()),
                sentinel_required: false,
            },
            history(&["a", "b", "c"]),
        );
        assert_eq!(outcome_line(&finished), "Finished all 3 iteration(s)");

        let exhausted = LoopResult::new(
            LoopOutcome::Exhausted {
                last_response: Some("b".into()),
                sentinel_required: true,
            },
            history(&["a", "b"]),
        );
        assert_eq!(
            outcome_line(&exhausted),
            "Max iterations (2) reached without completion"
        );

        let failed = LoopResult::new(
            LoopOutcome::Failed {
                iteration: 2,
                cause: FailureCause::Gateway(GatewayError::Send("timeout".into())),
            },
            history(&["a"]),
        );
        let line = outcome_line(&failed);
        assert!(line.starts_with("Failed at iteration 2"));
        assert!(line.contains("timeout"));
    }

    #[test]
    fn test_last_response_block_is_not_truncated() {
        let long = "x".repeat(500);
        let result = LoopResult::new(
            LoopOutcome::Exhausted {
                last_response: Some(long.clone()),
                sentinel_required: true,
            },
            history(&[long.as_str()]),
        );

        let block = last_response_block(&result).unwrap();
        assert!(block.ends_with(&long));
        assert!(!block.ends_with("..."));
    }

    #[test]
    fn test_last_response_block_shows_partial_text() {
        let mut pending = PendingIteration::start(1, "p");
        pending.record_text_delta("partial answer");
        let result = LoopResult::new(
            LoopOutcome::Failed {
                iteration: 1,
                cause: FailureCause::Cancelled,
            },
            vec![pending.fail("Run cancelled")],
        );

        assert_eq!(
            last_response_block(&result).as_deref(),
            Some("Last response:\npartial answer")
        );
    }
}
