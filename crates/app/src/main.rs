mod args;
mod shell;

use std::sync::Arc;

use quiz_core::model::{ContentRecord, QuizSettings, DEFAULT_SUBMIT_FLOOR};
use quiz_core::scoring::QuizResult;
use services::{Clock, QuizController, SessionContext, StoreOp};
use storage::progress::progress_key;
use storage::repository::{ProgressStore, Storage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use args::{Args, Command, prepare_sqlite_file, print_usage};
use shell::ShellCommand;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1).peekable();
    let cmd = match args.peek().map(String::as_str) {
        Some(arg) => match Command::from_arg(arg) {
            Some(cmd) => {
                args.next();
                cmd
            }
            None => Command::Run,
        },
        None => Command::Run,
    };

    let parsed = match Args::parse(cmd, &mut args) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(err.into());
        }
    };

    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    tracing::debug!(db = %parsed.db_url, "progress store ready");

    match cmd {
        Command::Clear => {
            let Some(chapter) = parsed.chapter.as_ref() else {
                return Ok(());
            };
            let key = progress_key(&parsed.namespace, chapter);
            storage.progress.delete(&key).await?;
            println!("Cleared saved progress for {chapter}.");
            Ok(())
        }
        Command::Run => {
            let Some(path) = parsed.content.as_ref() else {
                return Ok(());
            };
            let raw = tokio::fs::read_to_string(path).await?;
            let record: ContentRecord = serde_json::from_str(&raw)?;
            let settings =
                QuizSettings::new(parsed.page_size, DEFAULT_SUBMIT_FLOOR, parsed.namespace)?;
            let ctx = SessionContext::new(storage.progress, settings, Clock::System);
            run_shell(ctx, record).await
        }
    }
}

async fn run_shell(
    ctx: SessionContext,
    record: ContentRecord,
) -> Result<(), Box<dyn std::error::Error>> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut controller = QuizController::new(ctx, events_tx).with_completion_handler(Arc::new(
        |result: &QuizResult| {
            tracing::info!(
                score = result.score(),
                total = result.total(),
                elapsed = result.elapsed_seconds(),
                "quiz submitted"
            );
        },
    ));

    controller.load_content(record).await?;
    shell::render(&controller);
    if controller.session().is_none() {
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = events_rx.recv() => {
                if let Err(err) = controller.handle(event).await {
                    tracing::warn!(error = %err, "tick rejected");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match shell::parse_command(&line) {
                    Some(ShellCommand::Event(event)) => {
                        if let Err(err) = controller.handle(event).await {
                            println!("{err}");
                        }
                        report_warnings(&mut controller);
                        shell::render(&controller);
                    }
                    Some(ShellCommand::Show) => shell::render(&controller),
                    Some(ShellCommand::Help) => shell::print_help(),
                    Some(ShellCommand::Quit { force }) => {
                        if controller.should_warn_on_leave() && !force {
                            println!("This attempt is not submitted yet. Progress is saved; use q! to leave anyway.");
                            continue;
                        }
                        break;
                    }
                    None if line.trim().is_empty() => {}
                    None => println!("Unknown command. Type `help` for a list."),
                }
            }
        }
    }

    Ok(())
}

fn report_warnings(controller: &mut QuizController) {
    let Some(session) = controller.session_mut() else {
        return;
    };
    for warning in session.take_warnings() {
        let action = match warning.op {
            StoreOp::Read => "read",
            StoreOp::Write => "save",
            StoreOp::Delete => "clear",
        };
        println!(
            "Warning: could not {action} progress ({}). Answers are kept for this run only.",
            warning.message
        );
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
