use clap::Parser;
use lox_treewalk::{printer, Lox};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Runs a Lox script, or starts an interactive prompt when no script is given.
#[derive(Parser, Debug)]
#[command(name = "rlox", version, about, long_about = None)]
struct Args {
    /// Script to run.
    script: Option<PathBuf>,

    /// Print the parsed program in prefix form instead of running it.
    #[arg(long)]
    print_ast: bool,

    /// Log scanner, parser and interpreter activity to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.script {
        Some(path) => run_file(&path, args.print_ast),
        None => match run_prompt(args.print_ast) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::from(74)
            },
        },
    }
}

/// `RUST_LOG` picks what gets logged; `--verbose` means `debug` for everything.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true).with_level(true))
        .with(filter)
        .init();
}

fn run_file(path: &Path, print_ast: bool) -> ExitCode {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Could not read {}: {}", path.display(), e);
            return ExitCode::from(74);
        },
    };

    let mut lox = Lox::new(io::stdout());
    execute(&mut lox, &contents, print_ast);
    report(&mut lox);

    if lox.diagnostics().had_error() {
        ExitCode::from(65)
    } else if lox.diagnostics().had_runtime_error() {
        ExitCode::from(70)
    } else {
        ExitCode::SUCCESS
    }
}

fn run_prompt(print_ast: bool) -> io::Result<()> {
    let mut buffer = String::new();
    let stdin = io::stdin();
    let mut out = io::stdout();

    let mut lox = Lox::new(io::stdout());

    loop {
        write!(out, "> ")?;
        out.flush()?;

        buffer.clear();

        let num_bytes = stdin.read_line(&mut buffer)?;
        if num_bytes == 0 { break };

        execute(&mut lox, &buffer, print_ast);
        report(&mut lox);
        lox.reset_diagnostics();
    }

    Ok(())
}

fn execute<W: Write>(lox: &mut Lox<W>, source: &str, print_ast: bool) {
    if !print_ast {
        lox.run(source);
        return;
    }

    let statements = lox.parse(source);
    if !lox.diagnostics().had_error() {
        for statement in statements.iter() {
            println!("{}", printer::print_stmt(statement));
        }
    }
}

fn report<W: Write>(lox: &mut Lox<W>) {
    for report in lox.diagnostics_mut().take_reports() {
        eprintln!("{}", report);
    }
}
