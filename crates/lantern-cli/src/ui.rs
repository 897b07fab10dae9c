//! UI utilities for the CLI

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};

use lantern_core::Result;

use crate::answerer::{Answer, AnswerSource};

const PROMPT: &str = "you>";

/// Display startup banner
pub fn display_banner(model_id: &str, index_entries: Option<usize>) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(67, terminal_width.saturating_sub(4)).max(40);

    let top_border = format!("┌{}┐", "─".repeat(banner_width - 2));
    let bottom_border = format!("└{}┘", "─".repeat(banner_width - 2));
    let empty_line = format!("│{}│", " ".repeat(banner_width - 2));

    let index_line = match index_entries {
        Some(n) => format!("Story index: {} entries", n),
        None => "Story index: not loaded (run `lantern index`)".to_string(),
    };
    let model_line = format!("Model: {}", model_id);

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());
    print_boxed("Lantern - Story Explainer", banner_width, true);
    println!("{}", empty_line.blue());

    let lines = [
        "Ask questions about your stories in any language.",
        "",
        model_line.as_str(),
        index_line.as_str(),
        "",
        "↑/↓ history • Ctrl-C cancels a pending answer",
    ];
    for line in lines {
        if line.is_empty() {
            println!("{}", empty_line.blue());
        } else {
            print_boxed(line, banner_width, false);
        }
    }

    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
    println!("{}", "💡 Tip: type 'help' for commands".dimmed());
    println!();
}

fn print_boxed(text: &str, width: usize, title: bool) {
    let padding = width.saturating_sub(text.chars().count() + 4);
    let styled = if title {
        text.blue().bold().to_string()
    } else {
        text.to_string()
    };
    println!("{}{}{}{}", "│  ".blue(), styled, " ".repeat(padding), "│".blue());
}

/// Previously entered lines with Up/Down navigation
#[derive(Debug, Default)]
pub struct InputHistory {
    entries: Vec<String>,
    index: Option<usize>,
}

impl InputHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entered line and reset navigation
    pub fn push(&mut self, line: &str) {
        if !line.trim().is_empty() {
            self.entries.push(line.to_string());
        }
        self.index = None;
    }

    /// Step back in history (Up)
    pub fn previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = match self.index {
            None => self.entries.len() - 1,
            Some(idx) => idx.saturating_sub(1),
        };
        self.index = Some(idx);
        self.entries.get(idx).map(String::as_str)
    }

    /// Step forward in history (Down); `None` once past the newest entry
    pub fn next(&mut self) -> Option<&str> {
        let idx = self.index?;
        if idx + 1 < self.entries.len() {
            self.index = Some(idx + 1);
            self.entries.get(idx + 1).map(String::as_str)
        } else {
            self.index = None;
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read one line of input with history navigation
///
/// Returns `None` at end of input (EOF on a pipe, Ctrl-C or Ctrl-D at the
/// prompt). Esc clears the line and returns an empty string.
pub fn read_input(history: &mut InputHistory) -> Result<Option<String>> {
    // Check if stdin is a terminal (interactive) or piped
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        let input = input.trim().to_string();
        history.push(&input);
        return Ok(Some(input));
    }

    enable_raw_mode()?;
    let result = read_raw_line(history);
    disable_raw_mode()?;
    println!();

    let line = result?;
    if let Some(line) = &line {
        history.push(line);
    }
    Ok(line)
}

fn read_raw_line(history: &mut InputHistory) -> Result<Option<String>> {
    let mut input: Vec<char> = Vec::new();
    let mut cursor_pos = 0;

    redraw(&input, cursor_pos)?;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);

        match key_event.code {
            KeyCode::Char('c') | KeyCode::Char('d') if ctrl => return Ok(None),
            KeyCode::Enter => return Ok(Some(input.iter().collect())),
            KeyCode::Esc => return Ok(Some(String::new())),
            KeyCode::Char(c) => {
                input.insert(cursor_pos, c);
                cursor_pos += 1;
            }
            KeyCode::Backspace if cursor_pos > 0 => {
                input.remove(cursor_pos - 1);
                cursor_pos -= 1;
            }
            KeyCode::Left if cursor_pos > 0 => cursor_pos -= 1,
            KeyCode::Right if cursor_pos < input.len() => cursor_pos += 1,
            KeyCode::Up => {
                if let Some(entry) = history.previous() {
                    input = entry.chars().collect();
                    cursor_pos = input.len();
                }
            }
            KeyCode::Down => {
                input = history.next().map(|e| e.chars().collect()).unwrap_or_default();
                cursor_pos = input.len();
            }
            _ => continue,
        }
        redraw(&input, cursor_pos)?;
    }
}

fn redraw(input: &[char], cursor_pos: usize) -> Result<()> {
    let line: String = input.iter().collect();
    let back = input.len() - cursor_pos;
    print!("\r\x1b[2K{} {}", PROMPT.green().bold(), line);
    if back > 0 {
        print!("\x1b[{}D", back);
    }
    io::stdout().flush()?;
    Ok(())
}

/// Display help message
pub fn print_help() {
    println!("{}", "Available commands:".bold());
    println!("  {} - Ask anything about the indexed stories", "<question>".green());
    println!("  {} - Show index statistics", "stats".green());
    println!("  {} - Clear the conversation", "reset".green());
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the application", "exit/quit".green());
    println!();
    println!("{}", "Examples:".bold());
    println!("  Who is the main character?");
    println!("  Why did the lantern go out?");
    println!("  कहानी का अंत कैसे हुआ?");
}

pub fn print_thinking() {
    print!("{} ", "Thinking...".dimmed());
    let _ = io::stdout().flush();
}

pub fn clear_thinking() {
    print!("\r\x1b[2K");
    let _ = io::stdout().flush();
}

pub fn print_answer(answer: &Answer) {
    let label = "lantern>".cyan().bold();
    match answer.source {
        AnswerSource::Generated => println!("{} {}", label, answer.text),
        AnswerSource::Fallback => println!("{} {}", label, answer.text.yellow()),
        AnswerSource::Error => println!("{} {}", label, answer.text.red()),
    }
    println!();
}

pub fn print_notice(message: &str) {
    println!("{} {}", "ℹ".blue(), message.dimmed());
}
