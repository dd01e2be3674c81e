// Colored terminal output for the audit log, Q&A lookups and model lists.
//
// main.rs display paths delegate here so formatting stays in one place.

use colored::Colorize;

use crate::classifier::gemini::ModelInfo;
use crate::db::models::{AuditKind, AuditLogEntry};
use crate::knowledge::QaMatch;

use super::truncate_chars;

/// Display audit entries, newest first.
pub fn display_actions(actions: &[AuditLogEntry]) {
    if actions.is_empty() {
        println!("No moderation actions recorded yet.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Moderation log ({} entries) ===", actions.len()).bold()
    );
    println!();

    println!(
        "  {:<20} {:<18} {:<24} {:<20} {:>7}  {}",
        "Time".dimmed(),
        "Type".dimmed(),
        "User".dimmed(),
        "Chat".dimmed(),
        "Strikes".dimmed(),
        "Message".dimmed(),
    );
    println!("  {}", "-".repeat(110).dimmed());

    for entry in actions {
        println!(
            "  {:<20} {:<18} {:<24} {:<20} {:>7}  {}",
            entry.time.format("%Y-%m-%d %H:%M:%S"),
            colorize_kind(entry.kind),
            truncate_chars(&entry.user, 22),
            truncate_chars(entry.chat.as_deref().unwrap_or("private"), 18),
            entry.strikes.map(|s| s.to_string()).unwrap_or_default(),
            truncate_chars(entry.message.as_deref().unwrap_or(""), 60).dimmed(),
        );
    }

    println!();
}

/// Display the outcome of a local `!info` lookup.
pub fn display_qa_match(query: &str, best: Option<&QaMatch<'_>>, threshold: f64) {
    println!("\n{}", format!("=== Q&A lookup: {query} ===").bold());
    match best {
        Some(m) => {
            let rating = format!("{:.2}", m.rating);
            let rating = if m.rating >= threshold {
                rating.green()
            } else {
                rating.yellow()
            };
            println!("  Closest question: {}", m.pair.question);
            println!("  Similarity: {rating} (threshold {threshold:.2})");
            println!("  Answer: {}", m.pair.answer);
            if m.rating < threshold {
                println!(
                    "  {}",
                    "Below threshold: the bot would reply with the not-found sentence.".dimmed()
                );
            }
        }
        None => println!("  {}", "The Q&A document is empty.".dimmed()),
    }
}

/// Display Gemini models that support generateContent.
pub fn display_models(models: &[ModelInfo], current: &str) {
    if models.is_empty() {
        println!("No models with generateContent support were returned.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Gemini models ({}) ===", models.len()).bold()
    );
    for model in models {
        let id = model.name.trim_start_matches("models/");
        let marker = if id == current {
            "*".green().bold().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "  {marker} {:<40} {}",
            id,
            model.display_name.as_deref().unwrap_or("").dimmed()
        );
    }
    println!("\n  {} = GEMINI_MODEL", "*".green().bold());
}

fn colorize_kind(kind: AuditKind) -> colored::ColoredString {
    let label = format!("{:<18}", kind.as_str());
    match kind {
        AuditKind::Violation => label.yellow(),
        AuditKind::StickerViolation => label.cyan(),
        AuditKind::Blocked => label.red().bold(),
    }
}
