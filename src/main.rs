use std::cell::RefCell;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memchr::{memchr, memchr_iter};
use memmap2::Mmap;

use zlox::ast_printer::AstPrinter;
use zlox::error::LoxError;
use zlox::interpreter::Interpreter;
use zlox::parser::Parser;
use zlox::scanner::Scanner;
use zlox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "zlox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to zlox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Emit the tokens as a JSON array instead of one per line
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints its syntax tree
    Parse { filename: Option<PathBuf> },

    /// Runs input from a file as a zlox program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive session
    Repl,
}

/// A loaded source file. Kept alive for the whole subcommand so that the
/// scanner can borrow it.
enum Source {
    Mapped(Mmap),
    Empty,
}

impl Source {
    fn bytes(&self) -> &[u8] {
        match self {
            Source::Mapped(map) => map,
            Source::Empty => &[],
        }
    }
}

/// Maps `filename` into memory read‑only. Zero‑length files get an empty
/// buffer instead, since mapping an empty file fails on Linux.
fn read_file(filename: &Path) -> Result<Source> {
    info!("Reading file: {:?}", filename);

    let file: File =
        File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len: u64 = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    if len == 0 {
        info!("File {:?} is empty", filename);

        return Ok(Source::Empty);
    }

    // SAFETY: the mapping is read-only and outlives every borrow handed to
    // the scanner; zlox never mutates a source file while running it.
    let map: Mmap =
        unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    info!("Mapped {} bytes from {:?}", map.len(), filename);

    Ok(Source::Mapped(map))
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("zlox.log").context("Failed to create zlox.log")?;

    // Configure env_logger to write to file with module path and source line
    Builder::new()
        .format(|buf, record| {
            // Strip 'zlox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("zlox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to zlox.log");

    Ok(())
}

// ───────────────────────── diagnostics rendering ─────────────────────────

/// Renders the source line containing `offset` with a caret marker
/// underneath:
///
/// ```text
///    3 | print(x);
///      |       ^~~~
/// ```
fn render_caret(src: &[u8], offset: usize) -> String {
    let offset: usize = offset.min(src.len());

    let line_start: usize = src[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);

    let line_end: usize = memchr(b'\n', &src[offset..]).map_or(src.len(), |pos| offset + pos);

    let line_no: usize = memchr_iter(b'\n', &src[..line_start]).count() + 1;
    let column: usize = offset - line_start;
    let text = String::from_utf8_lossy(&src[line_start..line_end]);

    format!(
        "{:>4} | {}\n{:>4} | {}^~~~\n",
        line_no,
        text,
        "",
        " ".repeat(column)
    )
}

/// Prints `err` to stderr, adding the `Runtime error:` prefix for
/// evaluation failures and a caret line when the error carries a position.
fn report(src: &[u8], err: &LoxError) {
    debug!("Reporting error: {}", err);

    if err.is_runtime() {
        eprintln!("Runtime error: {}", err);
    } else {
        eprintln!("{}", err);
    }

    if let Some(offset) = err.offset() {
        eprint!("{}", render_caret(src, offset));
    }
}

// ───────────────────────────── subcommands ───────────────────────────────

/// Scan all of `src`, reporting every lexical diagnostic. Exits with code
/// 65 if any were found.
fn scan_or_exit(src: &[u8]) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut clean: bool = true;

    for result in Scanner::new(src) {
        match result {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                tokens.push(token);
            }

            Err(e) => {
                clean = false;

                report(src, &e);
            }
        }
    }

    if !clean {
        debug!("Scanning failed, exiting with code 65");

        std::process::exit(65);
    }

    tokens
}

fn tokenize(src: &[u8], json: bool) -> Result<()> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut clean: bool = true;

    for result in Scanner::new(src) {
        match result {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if !json {
                    println!("{}", token);
                }

                tokens.push(token);
            }

            Err(e) => {
                clean = false;

                report(src, &e);
            }
        }
    }

    if json {
        let rendered: String =
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;

        println!("{}", rendered);
    }

    if !clean {
        debug!("Tokenization failed, exiting with code 65");

        std::process::exit(65);
    }

    info!("Tokenization completed successfully");

    Ok(())
}

fn parse(src: &[u8]) {
    let tokens: Vec<Token> = scan_or_exit(src);

    match Parser::new(&tokens).parse() {
        Ok(statements) => {
            info!("Parsed {} statements", statements.len());

            println!("{}", AstPrinter::print_program(&statements));
        }

        Err(e) => {
            report(src, &e);

            std::process::exit(65);
        }
    }
}

fn run(src: &[u8]) -> Result<()> {
    let tokens: Vec<Token> = scan_or_exit(src);

    let statements = match Parser::new(&tokens).parse() {
        Ok(statements) => statements,

        Err(e) => {
            report(src, &e);

            std::process::exit(65);
        }
    };

    info!("Parsed {} statements", statements.len());

    let sink: Rc<RefCell<dyn Write>> = Rc::new(RefCell::new(std::io::stdout()));
    let input: Rc<RefCell<dyn BufRead>> = Rc::new(RefCell::new(BufReader::new(std::io::stdin())));

    let mut interpreter: Interpreter = Interpreter::new(Rc::clone(&sink), input);

    if let Err(e) = interpreter.interpret(&statements) {
        let _ = sink.borrow_mut().flush();

        report(src, &e);

        std::process::exit(if e.is_runtime() { 70 } else { 65 });
    }

    sink.borrow_mut().flush()?;

    info!("Program executed successfully");

    Ok(())
}

/// Scan, parse, and interpret one line of interactive input. Errors are
/// reported but never end the session; the interpreter keeps its state.
fn run_line(src: &[u8], interpreter: &mut Interpreter, print_tokens: bool, print_ast: bool) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut clean: bool = true;

    for result in Scanner::new(src) {
        match result {
            Ok(token) => {
                if print_tokens {
                    println!("{}", token);
                }

                tokens.push(token);
            }

            Err(e) => {
                clean = false;

                report(src, &e);
            }
        }
    }

    if !clean {
        return;
    }

    let statements = match Parser::new(&tokens).parse() {
        Ok(statements) => statements,

        Err(e) => {
            report(src, &e);

            return;
        }
    };

    if print_ast {
        println!("{}", AstPrinter::print_program(&statements));
    }

    if let Err(e) = interpreter.interpret(&statements) {
        report(src, &e);
    }
}

fn repl() -> Result<()> {
    info!("Starting REPL session");

    let sink: Rc<RefCell<dyn Write>> = Rc::new(RefCell::new(std::io::stdout()));
    let input: Rc<RefCell<dyn BufRead>> = Rc::new(RefCell::new(BufReader::new(std::io::stdin())));

    // The prompt and the program's input() read the same buffered stream.
    let prompt_input: Rc<RefCell<dyn BufRead>> = Rc::clone(&input);

    let mut interpreter: Interpreter = Interpreter::new(sink, input);

    let mut print_tokens: bool = false;
    let mut print_ast: bool = false;

    println!("zlox {} interactive session", env!("CARGO_PKG_VERSION"));
    println!("Type .help for commands, .exit or Ctrl-D to leave.");

    loop {
        print!("$> ");
        std::io::stdout().flush()?;

        let mut line: String = String::new();

        if prompt_input.borrow_mut().read_line(&mut line)? == 0 {
            println!();

            break; // EOF
        }

        let trimmed: &str = line.trim();

        match trimmed {
            "" => continue,

            ".exit" => break,

            ".help" => {
                println!(".help     show this help");
                println!(".exit     leave the session");
                println!(".prntlx   toggle token dump before evaluation");
                println!(".prntast  toggle syntax tree dump before evaluation");

                continue;
            }

            ".prntlx" => {
                print_tokens = !print_tokens;

                println!("token dump {}", if print_tokens { "on" } else { "off" });

                continue;
            }

            ".prntast" => {
                print_ast = !print_ast;

                println!(
                    "syntax tree dump {}",
                    if print_ast { "on" } else { "off" }
                );

                continue;
            }

            _ => {}
        }

        run_line(trimmed.as_bytes(), &mut interpreter, print_tokens, print_ast);
    }

    info!("REPL session ended");

    Ok(())
}

fn no_input() -> ! {
    info!("No filepath provided");

    println!("No input filepath was provided. Exiting...");

    std::process::exit(0);
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => {
                info!("Running Tokenize subcommand");

                let source: Source = read_file(&filename)?;

                tokenize(source.bytes(), json)?;
            }

            None => no_input(),
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => {
                info!("Running Parse subcommand");

                let source: Source = read_file(&filename)?;

                parse(source.bytes());
            }

            None => no_input(),
        },

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");

                let source: Source = read_file(&filename)?;

                run(source.bytes())?;
            }

            None => no_input(),
        },

        Commands::Repl => repl()?,
    }

    Ok(())
}
