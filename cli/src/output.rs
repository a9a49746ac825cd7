//! Console output for chat outcomes

use colored::Colorize;
use ragloop_domain::{ChatOutcome, ChatReply};

/// Formats chat outcomes for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Reply text plus a dimmed summary line
    pub fn format(outcome: &ChatOutcome) -> String {
        match outcome {
            ChatOutcome::Answered(reply) => Self::reply_block(reply, None),
            ChatOutcome::Degraded { reply, reason } => Self::reply_block(reply, Some(reason)),
            ChatOutcome::Rejected { reason } => {
                format!("{} {}", "Rejected:".red().bold(), reason)
            }
        }
    }

    /// Format as JSON
    pub fn format_json(outcome: &ChatOutcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
    }

    fn reply_block(reply: &ChatReply, degraded: Option<&String>) -> String {
        let mut output = String::new();
        output.push_str(&reply.reply);
        output.push_str("\n\n");
        output.push_str(
            &format!(
                "intent={} confidence={:.2} chunks={} retries={}",
                reply.intent, reply.confidence, reply.chunk_count, reply.retry_count
            )
            .dimmed()
            .to_string(),
        );
        if let Some(reason) = degraded {
            output.push_str(&format!("\n{} {}", "degraded:".yellow().bold(), reason));
        }
        output
    }
}
