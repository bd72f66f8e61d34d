use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

use backtrace::Backtrace;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{filter::LevelFilter, fmt::Layer, prelude::*, EnvFilter};

use raw_lox::config::{ColorMode, Config, DEFAULT_MAX_CALL_DEPTH};
use raw_lox::error::{EXIT_RUNTIME, EXIT_SYNTAX};
use raw_lox::repl::Repl;
use raw_lox::utils::report;
use raw_lox::{parse, run_source, scan, Interpreter, LoxError};

// The call-depth guard has to trip before the native stack runs out.
const WORKER_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(version, about = "A tree-walking interpreter for a small Lox-like language", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Nested function calls allowed before a stack overflow error
    #[arg(long, global = true, env = "LOX_MAX_CALL_DEPTH", default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// When to color diagnostics
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print one line per token
    Tokenize { filename: PathBuf },
    /// Print each top-level expression as an S-expression
    Parse { filename: PathBuf },
    /// Run a program
    Evaluate { filename: PathBuf },
    /// Run a program (same as evaluate)
    Run { filename: PathBuf },
    /// Read and run lines interactively
    Repl,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var("LOX_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(Layer::new().with_writer(io::stderr).with_filter(filter))
        .init();
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("{}", format!("internal error: {}", info).red().bold());
        eprintln!("{:?}", Backtrace::new());
    }));
}

fn read_source(path: &Path) -> Result<String, ExitCode> {
    fs::read_to_string(path).map_err(|e| {
        report(&format!("Error reading file {}: {}", path.display(), e));
        ExitCode::FAILURE
    })
}

fn stdout_sink() -> Box<dyn io::Write> {
    Box::new(BufWriter::new(io::stdout()))
}

fn tokenize(source: &str) -> ExitCode {
    let scanned = scan(source);
    for token in &scanned.tokens {
        match token.diagnostic() {
            Some(diagnostic) => report(&diagnostic),
            None => println!("{}", token),
        }
    }

    if scanned.had_error {
        ExitCode::from(EXIT_SYNTAX)
    } else {
        ExitCode::SUCCESS
    }
}

fn print_tree(source: &str) -> ExitCode {
    match parse(source) {
        Ok(ast) => {
            for expr in ast.expressions() {
                println!("{}", expr);
            }
            ExitCode::SUCCESS
        }
        Err(err) => fail(err),
    }
}

fn execute(source: &str, config: &Config) -> ExitCode {
    let mut interpreter = Interpreter::with_config(config, stdout_sink());
    match run_source(source, &mut interpreter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(err),
    }
}

fn repl(config: &Config) -> ExitCode {
    let interpreter = Interpreter::with_config(config, Box::new(io::stdout()));
    let mut session = Repl::new(interpreter, io::stdout(), io::stderr());
    match session.run(io::stdin().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&format!("Error reading input: {}", e));
            ExitCode::FAILURE
        }
    }
}

fn fail(err: LoxError) -> ExitCode {
    tracing::debug!(exit_code = err.exit_code(), "run failed");
    report(&err.to_string());
    ExitCode::from(err.exit_code())
}

fn dispatch(args: Args) -> ExitCode {
    let config = Config {
        max_call_depth: args.max_call_depth,
        color: args.color,
    };
    config.apply_color();

    match &args.command {
        Commands::Repl => repl(&config),
        Commands::Tokenize { filename } => with_source(filename, tokenize),
        Commands::Parse { filename } => with_source(filename, print_tree),
        Commands::Evaluate { filename } | Commands::Run { filename } => {
            with_source(filename, |source| execute(source, &config))
        }
    }
}

fn with_source(path: &Path, stage: impl FnOnce(&str) -> ExitCode) -> ExitCode {
    match read_source(path) {
        Ok(source) => stage(&source),
        Err(code) => code,
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();
    install_panic_hook();

    let worker = thread::Builder::new()
        .name("lox".to_string())
        .stack_size(WORKER_STACK_SIZE)
        .spawn(move || dispatch(args));

    match worker.map(|handle| handle.join()) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => ExitCode::from(EXIT_RUNTIME),
        Err(e) => {
            report(&format!("Could not start interpreter thread: {}", e));
            ExitCode::FAILURE
        }
    }
}
