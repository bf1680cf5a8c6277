use std::io::{self, Write};
use std::time::Duration;

use anyhow::{bail, Result};
use colored::Colorize;
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::cli::WorkflowMode;
use crate::session::{Question, SessionObserver};
use crate::wire::{EnhancedPromptResponse, EnhancementLog, PromptFeedback, Rating};

/// Terminal spinner driven by the session's loading transitions.
#[derive(Default)]
pub struct Spinner {
    bar: Mutex<Option<ProgressBar>>,
}

impl SessionObserver for Spinner {
    fn loading(&self, message: &str) {
        let mut slot = self.bar.lock();
        let bar = slot.get_or_insert_with(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.magenta} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        bar.set_message(message.to_string());
    }

    fn idle(&self) {
        if let Some(bar) = self.bar.lock().take() {
            bar.finish_and_clear();
        }
    }
}

/// Line-oriented stdin shared by the REPL and the questionnaire.
pub struct LineReader {
    lines: Lines<BufReader<Stdin>>,
}

impl LineReader {
    pub fn stdin() -> Self {
        Self { lines: BufReader::new(tokio::io::stdin()).lines() }
    }

    /// `None` at end of input. Cancel-safe, so usable inside `select!`.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }
}

/// One line of interactive input.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Enhance,
    /// `None` toggles between the two modes.
    Mode(Option<WorkflowMode>),
    Clear,
    Show,
    Help,
    Quit,
    Unknown(&'a str),
    Text(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Enhance;
        }
        let Some(rest) = trimmed.strip_prefix(':') else {
            return Command::Text(line.trim_end());
        };
        let mut parts = rest.split_whitespace();
        match (parts.next().unwrap_or_default(), parts.next()) {
            ("enhance" | "e", None) => Command::Enhance,
            ("mode" | "m", None) => Command::Mode(None),
            ("mode" | "m", Some(m)) => match WorkflowMode::from_str(m, true) {
                Ok(mode) => Command::Mode(Some(mode)),
                Err(_) => Command::Unknown(trimmed),
            },
            ("clear", None) => Command::Clear,
            ("show", None) => Command::Show,
            ("help" | "h" | "?", None) => Command::Help,
            ("quit" | "q" | "exit", None) => Command::Quit,
            _ => Command::Unknown(trimmed),
        }
    }
}

pub fn mode_label(mode: WorkflowMode) -> &'static str {
    match mode {
        WorkflowMode::Direct => "direct",
        WorkflowMode::Guided => "guided",
    }
}

pub fn prompt_marker(label: &str) {
    print!("{} ", label.bold());
    let _ = io::stdout().flush();
}

pub fn show_result(resp: &EnhancedPromptResponse) {
    println!("\n{}", format!("=== {} ===", resp.overall_title).bold());
    for (label, v) in resp.variants.labelled() {
        println!(
            "\n{}  {}",
            format!("[{}]", label.to_uppercase()).magenta().bold(),
            v.variant_title.bold()
        );
        println!("{}", v.variant_description.italic());
        println!("{}", indent(&v.enhanced_prompt, 2));
    }
    show_log(&resp.enhancement_log);
    println!();
}

pub fn show_log(log: &EnhancementLog) {
    if log.is_empty() {
        return;
    }
    println!("\n{}", "How the Co-Pilot Assisted You".bold());
    if log.has_correction() {
        if let Some(corrected) = &log.auto_corrected_input {
            println!(
                "  {} Corrected input from \"{}\" to \"{}\".",
                "✓".green(),
                log.user_input.red(),
                corrected.green()
            );
        }
    }
    for note in log.clarifications.iter().flatten() {
        println!("  {} {}", "?".yellow(), note);
    }
    for note in log.added_details.iter().flatten() {
        println!("  {} {}", "+".blue(), note);
    }
}

pub fn show_feedback(fb: &PromptFeedback) {
    let rating = match fb.overall_rating {
        Rating::Poor => fb.overall_rating.to_string().red(),
        Rating::Average => fb.overall_rating.to_string().yellow(),
        Rating::Good => fb.overall_rating.to_string().green(),
    };
    println!("\n{} {}", "Prompt quality:".bold(), rating.bold());
    for s in &fb.strengths {
        println!("  {} {}", "+".green(), s);
    }
    for s in &fb.suggestions {
        println!("  {} {}", "→".cyan(), s);
    }
}

pub fn show_error(message: &str) {
    eprintln!("\n{} {}\n", "Error:".red().bold(), message);
}

pub fn show_help() {
    println!(
        "{}\n  {}\n  {}\n  {}\n  {}\n  {}\n  {}",
        "Type your prompt; each line is added to the draft.".bold(),
        ":enhance (or an empty line)  submit the draft",
        ":mode [direct|guided]        switch mode, or toggle (discards the current draft)",
        ":show                        print the draft",
        ":clear                       start a new draft",
        ":help                        this text",
        ":quit                        leave",
    );
}

/// Asks every question in order and returns them with answers filled in.
pub async fn ask_questions(reader: &mut LineReader, questions: &[Question]) -> Result<Vec<Question>> {
    let total = questions.len();
    println!("\n{}", "Please provide more details".bold());
    println!("Answering these questions will help the AI create a much better result for you.");

    let mut answered = Vec::with_capacity(total);
    for (done, q) in questions.iter().enumerate() {
        println!("\n{} {}", format!("[{done} / {total}]").dimmed(), q.question.bold());
        let answer = if q.is_choice() {
            ask_choice(reader, q).await?
        } else {
            ask_text(reader).await?
        };
        answered.push(Question { answer: Some(answer), ..q.clone() });
    }
    println!("{}", format!("[{total} / {total}] all questions answered").dimmed());
    Ok(answered)
}

async fn ask_choice(reader: &mut LineReader, q: &Question) -> Result<String> {
    for (i, s) in q.suggestions.iter().enumerate() {
        let marker = if i == 0 { " (default)" } else { "" };
        println!("  {}) {}{}", i + 1, s, marker.dimmed());
    }
    prompt_marker("choice or your own answer>");
    let Some(line) = reader.next_line().await? else {
        bail!("input closed before the questionnaire was complete");
    };
    Ok(pick_choice(q, &line))
}

async fn ask_text(reader: &mut LineReader) -> Result<String> {
    loop {
        prompt_marker("answer>");
        let Some(line) = reader.next_line().await? else {
            bail!("input closed before the questionnaire was complete");
        };
        let line = line.trim();
        if !line.is_empty() {
            return Ok(line.to_string());
        }
        println!("{}", "An answer is required.".yellow());
    }
}

/// Empty input takes the default, a number picks a suggestion, anything
/// else is a free-text answer.
pub fn pick_choice(q: &Question, line: &str) -> String {
    let line = line.trim();
    if line.is_empty() {
        return q.default_answer().unwrap_or_default().to_string();
    }
    match line.parse::<usize>() {
        Ok(n) if (1..=q.suggestions.len()).contains(&n) => q.suggestions[n - 1].clone(),
        _ => line.to_string(),
    }
}

fn indent(s: &str, n: usize) -> String {
    let pad = " ".repeat(n);
    s.lines()
        .map(|l| format!("{}{}", pad, l))
        .collect::<Vec<_>>()
        .join("\n")
}
