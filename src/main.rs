use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

mod cli;
mod config;
mod errors;
mod feedback;
mod prompt;
mod provider;
mod services;
mod session;
mod transcript;
mod ux;
mod wire;

use cli::Args;
use config::Config;
use errors::CopilotError;
use feedback::LiveFeedback;
use services::{LlmServices, PromptServices};
use session::Session;
use transcript::Transcript;
use ux::{Command, LineReader, Spinner};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.debug);

    let cfg = Config::load(&args)?;
    let provider = provider::make_provider(&cfg)?;

    let transcript = if cfg.save_transcript {
        let t = Transcript::new(&cfg.transcript_dir, Uuid::new_v4());
        if let Some(dir) = t.dir() {
            tracing::info!(dir = %dir.display(), "saving transcript");
        }
        t
    } else {
        Transcript::disabled()
    };

    tracing::info!(
        provider = ?cfg.provider,
        model = %cfg.enhancement_model(),
        analysis_model = %cfg.analysis_model(),
        "starting"
    );
    let services: Arc<dyn PromptServices> = Arc::new(LlmServices::new(
        provider,
        transcript,
        cfg.enhancement_model(),
        cfg.analysis_model(),
    ));

    let mut reader = LineReader::stdin();
    match args.prompt.clone() {
        Some(text) => one_shot(services, &args, &text, &mut reader).await,
        None => {
            interactive(services, &args, &cfg, &mut reader).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(debug))
        .init();
}

fn new_session(services: Arc<dyn PromptServices>, args: &Args) -> Session {
    let session = Session::new(services, args.mode);
    if args.json {
        session
    } else {
        session.with_observer(Box::new(Spinner::default()))
    }
}

async fn one_shot(
    services: Arc<dyn PromptServices>,
    args: &Args,
    text: &str,
    reader: &mut LineReader,
) -> Result<ExitCode> {
    let mut session = new_session(services, args);
    run_enhancement(&mut session, text, reader).await?;
    Ok(if render(&session, args.json)? {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn interactive(
    services: Arc<dyn PromptServices>,
    args: &Args,
    cfg: &Config,
    reader: &mut LineReader,
) -> Result<()> {
    let mut session = new_session(Arc::clone(&services), args);
    let (mut live, mut updates) = LiveFeedback::new(
        services,
        Duration::from_millis(cfg.feedback_delay_ms),
        cfg.feedback_min_chars,
    );
    let mut draft = String::new();

    ux::show_help();
    loop {
        ux::prompt_marker(&format!("[{}]>", ux::mode_label(session.mode())));

        let line = tokio::select! {
            line = reader.next_line() => line?,
            Some(update) = updates.recv() => {
                if live.is_fresh(&update, session.questionnaire_active()) {
                    if let Some(fb) = &update.feedback {
                        ux::show_feedback(fb);
                    }
                }
                continue;
            }
        };
        let Some(line) = line else { break };

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => ux::show_help(),
            Command::Show => println!("{}", session.prompt()),
            Command::Clear => {
                draft.clear();
                session.edit_prompt("");
                live.suspend();
            }
            Command::Mode(mode) => {
                match mode {
                    Some(m) => session.switch_mode(m),
                    None => session.toggle_mode(),
                }
                draft.clear();
                live.suspend();
                println!("Switched to {} mode.", ux::mode_label(session.mode()));
            }
            Command::Unknown(cmd) => ux::show_error(&format!("Unknown command `{}`. Type :help.", cmd)),
            Command::Text(text) => {
                if !draft.is_empty() {
                    draft.push('\n');
                }
                draft.push_str(text);
                session.edit_prompt(draft.clone());
                if !args.no_feedback {
                    live.on_input(&draft, session.questionnaire_active());
                }
            }
            Command::Enhance => {
                if !session.can_submit() {
                    ux::show_error(&CopilotError::EmptyPrompt.user_message());
                    continue;
                }
                // also covers the questionnaire that may open
                live.suspend();
                if let Err(e) = run_enhancement(&mut session, &draft, reader).await {
                    tracing::warn!(error = %e, "questionnaire interrupted");
                    session.abandon_questionnaire();
                    ux::show_error(&format!("The questionnaire was not completed ({e}). Submit again to restart it."));
                    continue;
                }
                render(&session, args.json)?;
            }
        }
    }
    Ok(())
}

/// Submit, then walk the user through the questionnaire if one opened.
async fn run_enhancement(
    session: &mut Session,
    text: &str,
    reader: &mut LineReader,
) -> Result<()> {
    session.submit(text).await;
    if !session.questionnaire_active() {
        return Ok(());
    }
    let questions = session.questions().unwrap_or_default().to_vec();
    let answered = ux::ask_questions(reader, &questions).await?;
    session.submit_answers(answered).await;
    Ok(())
}

/// Returns false when the session ended in an error.
fn render(session: &Session, json: bool) -> Result<bool> {
    debug_assert!(!session.is_loading() && session.loading_message().is_empty());
    if let Some(msg) = session.error() {
        ux::show_error(msg);
        return Ok(false);
    }
    if let Some(resp) = session.result() {
        if json {
            println!("{}", serde_json::to_string_pretty(resp)?);
        } else {
            ux::show_result(resp);
        }
    }
    Ok(true)
}
