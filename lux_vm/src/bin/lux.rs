//! Lux CLI: run a script file, or an interactive REPL.

use std::process::ExitCode;

use lux_vm::repl::ReplSession;
use lux_vm::Vm;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(path) => run_file(&path),
        None => run_repl(),
    }
}

fn run_file(path: &str) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let mut vm = Vm::new();
    if let Err(e) = vm.eval(&source) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run_repl() -> ExitCode {
    println!("Lux REPL {}", VERSION);
    println!("Type '/quit' to quit");

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("error: cannot initialize line editor: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut session = ReplSession::new();
    loop {
        let prompt = if session.pending() { "... " } else { "lux> " };
        match editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "/quit" {
                    break;
                }
                let _ = editor.add_history_entry(&line);
                if let Some(Err(e)) = session.feed(&line) {
                    eprintln!("Error: {}", e);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
