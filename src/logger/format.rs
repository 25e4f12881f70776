//! Log formatting and output with ANSI colors and text wrapping
//!
//! Handles:
//! - Colorized console output with tag and level formatting
//! - Text wrapping at word boundaries
//! - Dual output (console + file)
//! - Broken pipe handling for piped commands
//!
//! Console output goes to stderr so `--json` results on stdout stay parseable.

use super::file::write_to_file;
use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stderr, ErrorKind, Write};

/// Log format widths for alignment
const TAG_WIDTH: usize = 8;
const LEVEL_WIDTH: usize = 7;
const BRACKET_SPACE_WIDTH: usize = 3;
const TOTAL_PREFIX_WIDTH: usize = TAG_WIDTH + LEVEL_WIDTH + BRACKET_SPACE_WIDTH * 2;

/// Maximum line length before wrapping
const MAX_LINE_LENGTH: usize = 145;

/// Format and output a log message
pub fn format_and_log(tag: &LogTag, level: LogLevel, message: &str) {
    let now = Local::now();
    let time = now.format("%H:%M:%S").to_string();
    let prefix = format!("{} ", time).dimmed().to_string();
    let prefix_len = time.len() + 1;

    let base_line = format!("{}[{}] [{}] ", prefix, format_tag(tag), format_level(level));

    let available_space = MAX_LINE_LENGTH
        .checked_sub(TOTAL_PREFIX_WIDTH + prefix_len)
        .filter(|space| *space > 0)
        .unwrap_or(50);

    let message_chunks = wrap_text(message, available_space);

    print_stderr_safe(&format!("{}{}", base_line, message_chunks[0]));

    let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let tag_clean = tag.to_plain_string();
    write_to_file(&format!(
        "{} [{}] [{}] {}",
        timestamp,
        tag_clean,
        level.as_str(),
        message_chunks[0]
    ));

    if message_chunks.len() > 1 {
        let continuation_prefix = " ".repeat(prefix_len + TOTAL_PREFIX_WIDTH);
        for chunk in &message_chunks[1..] {
            print_stderr_safe(&format!("{}{}", continuation_prefix, chunk));
            write_to_file(&format!(
                "{} [{}] [{}] {}",
                timestamp,
                tag_clean,
                level.as_str(),
                chunk
            ));
        }
    }
}

/// Format a tag with appropriate color
fn format_tag(tag: &LogTag) -> ColoredString {
    let label = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::System => label.bright_yellow().bold(),
        LogTag::Config => label.bright_white().bold(),
        LogTag::Relay => label.bright_blue().bold(),
        LogTag::Extract => label.bright_magenta().bold(),
        LogTag::Cache => label.bright_cyan().bold(),
        LogTag::Batch => label.bright_green().bold(),
        LogTag::Other(_) => label.white().bold(),
    }
}

/// Format log level with appropriate color
fn format_level(level: LogLevel) -> ColoredString {
    let label = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);
    match level {
        LogLevel::Error => label.bright_red().bold(),
        LogLevel::Warning => label.yellow().bold(),
        LogLevel::Info => label.white().bold(),
        LogLevel::Debug | LogLevel::Verbose => label.dimmed(),
    }
}

/// Print to stderr but exit quietly on broken pipe
fn print_stderr_safe(message: &str) {
    if let Err(e) = writeln!(stderr(), "{}", message) {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
    }
}

/// Remove ANSI color codes from text
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::new();
    let mut in_escape = false;

    for ch in text.chars() {
        if ch == '\x1b' {
            in_escape = true;
        } else if in_escape && ch == 'm' {
            in_escape = false;
        } else if !in_escape {
            result.push(ch);
        }
    }
    result
}

/// Wrap text at word boundaries, respecting existing newlines
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for line in text.split('\n') {
        if strip_ansi_codes(line).chars().count() <= max_width {
            result.push(line.to_string());
            continue;
        }

        let mut current_line = String::new();
        for word in line.split_whitespace() {
            let word_len = strip_ansi_codes(word).chars().count();
            let current_len = strip_ansi_codes(&current_line).chars().count();

            if word_len > max_width {
                if !current_line.is_empty() {
                    result.push(std::mem::take(&mut current_line));
                }
                result.extend(break_long_word(word, max_width));
            } else if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_len + word_len + 1 <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                result.push(std::mem::replace(&mut current_line, word.to_string()));
            }
        }

        if !current_line.is_empty() {
            result.push(current_line);
        }
    }

    if result.is_empty() {
        result.push(String::new());
    }

    result
}

/// Break a very long word (usually a relay URL) into fixed-width chunks
fn break_long_word(word: &str, max_width: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_short_line_untouched() {
        assert_eq!(wrap_text("relay ok", 40), vec!["relay ok".to_string()]);
    }

    #[test]
    fn test_wrap_at_word_boundary() {
        let wrapped = wrap_text("alpha beta gamma delta", 11);
        assert_eq!(wrapped, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn test_long_url_is_chunked() {
        let url = "https://api.allorigins.win/raw?url=https%3A%2F%2Fwww.cooksongold.com";
        let wrapped = wrap_text(url, 20);
        assert!(wrapped.len() > 1);
        assert!(wrapped.iter().all(|chunk| chunk.chars().count() <= 20));
        assert_eq!(wrapped.concat(), url);
    }

    #[test]
    fn test_strip_ansi() {
        let colored = "\x1b[1;31mERROR\x1b[0m";
        assert_eq!(strip_ansi_codes(colored), "ERROR");
    }
}
