//! User interaction: prompts, confirmations, output and progress display.

use crate::Result;
use colored::Colorize;
use kdam::{Bar, BarExt};
use rustyline::DefaultEditor;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub trait Console: Send + Sync {
    /// Free-text question. An empty answer selects `default` when there is
    /// one and asks again otherwise.
    fn ask(&self, prompt: &str, default: Option<&str>) -> Result<String>;

    /// Yes/no question. An empty answer selects `default`.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;

    /// Shows `details` and asks a yes/no question about them as one step;
    /// no other output or prompt appears in between.
    fn confirm_details(&self, details: &str, prompt: &str, default: bool) -> Result<bool>;

    fn print(&self, text: &str);

    fn progress(&self, description: &str, total: usize) -> Box<dyn ProgressView>;
}

pub trait ProgressView: Send {
    fn advance(&mut self, label: &str) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

/// Interactive terminal console. Prompts and output from concurrent callers
/// are serialized through `prompt_lock`. All methods block the calling thread.
#[derive(Default)]
pub struct TerminalConsole {
    prompt_lock: Mutex<()>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.prompt_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn readline(prompt: &str) -> Result<String> {
    let mut editor = DefaultEditor::new()?;
    let line = editor.readline(prompt)?;
    Ok(line.trim().to_string())
}

/// Asks until the answer is yes, no or empty. The caller holds the prompt lock.
fn ask_confirmation(prompt: &str, default: bool) -> Result<bool> {
    let choices = if default { "[Y/n]" } else { "[y/N]" };
    let prompt = format!("{} {}: ", prompt.bold(), choices.magenta());

    loop {
        match parse_confirmation(&readline(&prompt)?, default) {
            Some(answer) => return Ok(answer),
            None => println!("{}", "Please enter y or n".red()),
        }
    }
}

impl Console for TerminalConsole {
    fn ask(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        let prompt = match default {
            Some(default) => format!("{} {}: ", prompt.bold(), format!("({default})").cyan()),
            None => format!("{}: ", prompt.bold()),
        };

        let _guard = self.lock();
        loop {
            let answer = readline(&prompt)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            if let Some(default) = default {
                return Ok(default.to_string());
            }
        }
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        let _guard = self.lock();
        ask_confirmation(prompt, default)
    }

    fn confirm_details(&self, details: &str, prompt: &str, default: bool) -> Result<bool> {
        let _guard = self.lock();
        println!("{}", details);
        ask_confirmation(prompt, default)
    }

    fn print(&self, text: &str) {
        let _guard = self.lock();
        println!("{}", text);
    }

    fn progress(&self, description: &str, total: usize) -> Box<dyn ProgressView> {
        let mut bar = Bar::new(total);
        bar.set_description(description);
        Box::new(TerminalProgress { bar })
    }
}

struct TerminalProgress {
    bar: Bar,
}

impl ProgressView for TerminalProgress {
    fn advance(&mut self, label: &str) -> Result<()> {
        self.bar
            .set_description(format!("Completed section: {}", label));
        self.bar.update(1)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.bar.refresh()?;
        eprintln!();
        Ok(())
    }
}

fn parse_confirmation(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
