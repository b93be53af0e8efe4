//! Babble CLI
//!
//! Terminal client for the Babble lesson service: generate speech lessons,
//! start speech analysis and export lessons as PDF.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use babble_export::{ExportError, LessonExporter};
use babble_gateway::HttpGateway;
use babble_session::{
    resolve_user_id, Completion, Config, Dispatch, ErrorInfo, Notice, NoticeLevel, Session,
    SessionView, StaticAuthClient,
};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Babble - AI speech lessons
///
/// Generates personalised speech-therapy lessons from a described speech
/// issue and starts AI speech analysis on the lesson service.
#[derive(Parser, Debug)]
#[command(name = "babble")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: babble.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Base URL of the lesson service
    #[arg(long, value_name = "URL", global = true)]
    service_url: Option<String>,

    /// Identifier of the signed-in user
    #[arg(long, value_name = "ID", global = true)]
    user_id: Option<String>,

    /// Output directory for exported lessons
    #[arg(short, long, value_name = "DIR", global = true)]
    output_dir: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Run an interactive session (default)
    Session,

    /// Generate one lesson and print it
    Lesson {
        /// Description of the speech issue
        #[arg(short, long)]
        issue: String,

        /// Also save the lesson as Speech_Lesson.pdf
        #[arg(short, long)]
        export: bool,
    },

    /// Ask the service to start AI speech analysis
    Analyze,

    /// Download the PDF the service rendered for the current user
    Download,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Logs go to stderr so they stay out of the rendered session on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    // Re-validate after overrides
    config.validate().map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing::info!(service_url = %config.service_url, "Using lesson service");

    let gateway = HttpGateway::new(config.service_url.clone());
    let auth = StaticAuthClient::from(config.user_id.clone());
    let output_dir = PathBuf::from(&config.output_dir);

    match args.command.unwrap_or(Command::Session) {
        Command::Session => {
            let mut session = Session::new(Arc::new(gateway), &auth);
            run_interactive(&mut session, &output_dir).await
        }
        Command::Lesson { issue, export } => {
            let mut session = Session::new(Arc::new(gateway), &auth);
            run_lesson(&mut session, &issue, export.then_some(output_dir.as_path())).await
        }
        Command::Analyze => {
            let mut session = Session::new(Arc::new(gateway), &auth);
            run_analyze(&mut session).await
        }
        Command::Download => {
            let user_id = resolve_user_id(&auth);
            run_download(&gateway, &user_id, &output_dir).await
        }
    }
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Applies command-line flags on top of file configuration.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(ref url) = args.service_url {
        config.service_url.clone_from(url);
    }
    if let Some(ref user_id) = args.user_id {
        config.user_id = Some(user_id.clone());
    }
    if let Some(ref output_dir) = args.output_dir {
        config.output_dir.clone_from(output_dir);
    }
}

// ============================================================================
// Interactive session
// ============================================================================

/// A command typed at the session prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Lesson(String),
    Analyze,
    Export,
    Status,
    Help,
    Quit,
    Unknown(String),
}

fn parse_shell_command(line: &str) -> Option<ShellCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    let command = match word.to_ascii_lowercase().as_str() {
        "lesson" => ShellCommand::Lesson(rest.trim().to_string()),
        "analyze" | "analyse" => ShellCommand::Analyze,
        "export" | "download" => ShellCommand::Export,
        "status" => ShellCommand::Status,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        _ => ShellCommand::Unknown(word.to_string()),
    };
    Some(command)
}

/// What woke the interactive loop.
enum Input {
    Line(std::io::Result<Option<String>>),
    Settled(Completion),
}

async fn run_interactive(session: &mut Session, output_dir: &Path) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Babble session for user '{}'", session.user_id());
    print_help();
    println!();
    print!("{}", render_view(&session.view()));

    loop {
        let pending = session.has_pending();
        // Handlers run after select so both arms can borrow the session.
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line),
            Some(completion) = session.recv_completion(), if pending => Input::Settled(completion),
        };

        match input {
            Input::Settled(completion) => {
                if session.apply_completion(completion) {
                    print_notices(session.take_notices());
                    print!("{}", render_view(&session.view()));
                    if session.state().last_error().is_some_and(|e| e.retryable) {
                        println!("{RETRY_HINT}");
                    }
                }
            }
            Input::Line(line) => {
                let Some(line) = line? else {
                    // Stdin closed; let outstanding calls finish before leaving.
                    if session.has_pending() {
                        println!("Waiting for outstanding requests...");
                        session.settle_all().await;
                        print_notices(session.take_notices());
                        print!("{}", render_view(&session.view()));
                    }
                    break;
                };
                let Some(command) = parse_shell_command(&line) else {
                    continue;
                };
                if command == ShellCommand::Quit {
                    break;
                }
                handle_shell_command(session, command, output_dir);
            }
        }
    }

    tracing::info!("Session ended");
    Ok(())
}

fn handle_shell_command(session: &mut Session, command: ShellCommand, output_dir: &Path) {
    match command {
        ShellCommand::Lesson(issue) => match session.request_lesson(&issue) {
            Ok(Dispatch::Started(request)) => {
                println!("Lesson request {request} sent");
                print!("{}", render_view(&session.view()));
            }
            Ok(Dispatch::Busy) => println!("A lesson is already being generated."),
            Err(_) => {}
        },
        ShellCommand::Analyze => match session.start_analysis() {
            Dispatch::Started(request) => {
                println!("Analysis request {request} sent");
                print!("{}", render_view(&session.view()));
            }
            Dispatch::Busy => println!("The analysis is already starting."),
        },
        ShellCommand::Export => {
            if let Some(path) = export_lesson(session.lesson_for_export(), output_dir) {
                println!("Saved lesson to {}", path.display());
            }
        }
        ShellCommand::Status => print!("{}", render_view(&session.view())),
        ShellCommand::Help => print_help(),
        ShellCommand::Unknown(word) => {
            println!("Unknown command '{word}'. Type 'help' for the list of commands.");
        }
        ShellCommand::Quit => {}
    }
    print_notices(session.take_notices());
}

/// Exports `lesson_text` to `output_dir`, reporting problems as notices.
fn export_lesson(lesson_text: &str, output_dir: &Path) -> Option<PathBuf> {
    let result = LessonExporter::new()
        .export(lesson_text)
        .and_then(|document| document.save(output_dir));

    match result {
        Ok(path) => Some(path),
        Err(ExportError::NoContent) => {
            print_notices(vec![Notice::warning(ExportError::NoContent.to_string())]);
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, dir = %output_dir.display(), "Export failed");
            println!("Could not save the lesson: {e}");
            None
        }
    }
}

// ============================================================================
// One-shot commands
// ============================================================================

async fn run_lesson(
    session: &mut Session,
    issue: &str,
    export_dir: Option<&Path>,
) -> anyhow::Result<()> {
    if session.request_lesson(issue).is_err() {
        print_notices(session.take_notices());
        anyhow::bail!("No speech issue given\n\nSuggestion: Pass a description with --issue");
    }
    session.settle_all().await;
    print_notices(session.take_notices());

    let view = session.view();
    if let Some(error) = session.state().last_error() {
        anyhow::bail!(failure_report(error));
    }
    print!("{}", render_lesson(&view));

    if let Some(dir) = export_dir {
        match export_lesson(session.lesson_for_export(), dir) {
            Some(path) => println!("Saved lesson to {}", path.display()),
            None => anyhow::bail!("Failed to export the lesson"),
        }
    }
    Ok(())
}

async fn run_analyze(session: &mut Session) -> anyhow::Result<()> {
    session.start_analysis();
    session.settle_all().await;
    print_notices(session.take_notices());

    if let Some(error) = session.state().last_error() {
        anyhow::bail!(failure_report(error));
    }
    Ok(())
}

async fn run_download(gateway: &HttpGateway, user_id: &str, output_dir: &Path) -> anyhow::Result<()> {
    let file_name = download_file_name(user_id)?;
    let bytes = gateway.download_lesson(user_id).await.map_err(|e| {
        anyhow::anyhow!("Failed to download lesson for '{user_id}': {e}")
    })?;

    tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to create output directory: {e}\n\nPath: {}",
            output_dir.display()
        )
    })?;
    let path = output_dir.join(file_name);
    tokio::fs::write(&path, &bytes).await.map_err(|e| {
        anyhow::anyhow!("Failed to write lesson: {e}\n\nPath: {}", path.display())
    })?;

    println!("Saved lesson to {}", path.display());
    Ok(())
}

/// Local file name for a downloaded lesson.
///
/// Ids that would escape the output directory are rejected.
fn download_file_name(user_id: &str) -> anyhow::Result<String> {
    let unsafe_id = user_id.is_empty()
        || user_id == "."
        || user_id == ".."
        || user_id.contains(['/', '\\', '\0']);
    if unsafe_id {
        anyhow::bail!(
            "Cannot save a lesson for user id '{user_id}'\n\nSuggestion: Use a user id without path separators"
        );
    }
    Ok(format!("lesson_{user_id}.pdf"))
}

// ============================================================================
// Rendering
// ============================================================================

const RETRY_HINT: &str =
    "Suggestion: The lesson service may be temporarily unavailable; try the same command again.";

/// Formats a failed remote call for the one-shot commands.
fn failure_report(error: &ErrorInfo) -> String {
    let mut report = format!("{}\n\nCause: {}", error.message, error.detail);
    if error.retryable {
        report.push_str("\n\n");
        report.push_str(RETRY_HINT);
    }
    report
}

fn print_help() {
    println!("Commands:");
    println!("  lesson <issue>  Generate a lesson for a speech issue");
    println!("  analyze         Start AI speech analysis");
    println!("  export          Save the lesson as Speech_Lesson.pdf");
    println!("  status          Show the current session");
    println!("  help            Show this help");
    println!("  quit            Leave the session");
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice.level {
            NoticeLevel::Info => println!("* {}", notice.message),
            NoticeLevel::Warning => println!("! {}", notice.message),
        }
    }
}

/// Formats the session screen.
fn render_view(view: &SessionView) -> String {
    let mut out = String::new();
    let button = |label: &str, enabled: bool| {
        if enabled {
            format!("[{label}]")
        } else {
            format!("[{label}] (busy)")
        }
    };

    let _ = writeln!(
        out,
        "{}  {}",
        button(view.lesson_button.label, view.lesson_button.enabled),
        button(view.analysis_button.label, view.analysis_button.enabled)
    );
    if let Some(ref message) = view.error_message {
        let _ = writeln!(out, "Error: {message}");
    }
    out.push_str(&render_lesson(view));
    if view.can_export {
        let _ = writeln!(out, "Type 'export' to save this lesson as a PDF.");
    }
    out
}

fn render_lesson(view: &SessionView) -> String {
    let mut out = String::new();
    if let Some(ref lesson) = view.lesson {
        let _ = writeln!(out);
        let _ = writeln!(out, "Your Personalized Lesson");
        let _ = writeln!(out, "------------------------");
        let _ = writeln!(out, "{lesson}");
        let _ = writeln!(out);
    }
    out
}
