//! Interactive menu: reads command lines from stdin on a helper thread so
//! the alert countdown keeps running while the user is idle.

use crate::cli::{Cli, Command, View, normalize_parse_error};
use crate::render;
use clap::{CommandFactory, Parser};
use earnit_core::alert::Alert;
use earnit_core::config::Palette;
use earnit_core::driver::{Frontend, Input};
use earnit_core::error::AppError;
use earnit_core::model::Task;
use earnit_core::session::{Outcome, Snapshot};
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use tracing::debug;

const BELL: &str = "\x07";

pub struct TerminalFrontend {
    lines: Receiver<io::Result<String>>,
    tasks: Vec<Task>,
    view: View,
    json: bool,
    palette: Palette,
}

impl TerminalFrontend {
    /// Starts the stdin reader. `snapshot` seeds the task list used to fill
    /// in edits until the first outcome arrives.
    pub fn spawn(snapshot: &Snapshot, json: bool, palette: Palette) -> Self {
        let (sender, lines) = mpsc::channel();
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                if sender.send(line).is_err() {
                    break;
                }
            }
            debug!("stdin closed");
        });

        Self::with_receiver(lines, snapshot, json, palette)
    }

    fn with_receiver(
        lines: Receiver<io::Result<String>>,
        snapshot: &Snapshot,
        json: bool,
        palette: Palette,
    ) -> Self {
        Self {
            lines,
            tasks: snapshot.tasks.clone(),
            view: View::default(),
            json,
            palette,
        }
    }

    /// Turns one typed line into loop input. Errors and help are printed
    /// here and yield `None`.
    fn interpret(&mut self, line: &str) -> Option<Input> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return Some(Input::Quit);
        }

        if line == "help" || line == "?" {
            print_help();
            return None;
        }

        match self.parse(line) {
            Ok(input) => input,
            Err(err) => {
                eprintln!("ERROR: {err}");
                None
            }
        }
    }

    fn parse(&mut self, line: &str) -> Result<Option<Input>, AppError> {
        let args = split_command_line(line)?;
        if args.is_empty() {
            return Ok(None);
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("earnit".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if !err.use_stderr() => {
                println!("{err}");
                return Ok(None);
            }
            Err(err) => return Err(normalize_parse_error(err)),
        };
        let Some(command) = cli.command else {
            return Ok(None);
        };
        if matches!(command, Command::Init { .. }) {
            return Err(AppError::invalid_input("account already exists"));
        }

        self.view = View::for_command(&command);
        let intent = command.to_intent(&self.tasks)?;
        Ok(Some(Input::Intent(intent)))
    }
}

impl Frontend for TerminalFrontend {
    fn next_input(&mut self, tick: std::time::Duration) -> Result<Option<Input>, AppError> {
        match self.lines.recv_timeout(tick) {
            Ok(Ok(line)) => Ok(self.interpret(&line)),
            Ok(Err(err)) => Err(AppError::io(err.to_string())),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Ok(Some(Input::Quit)),
        }
    }

    fn on_alert(&mut self, alert: &Alert, snapshot: &Snapshot) {
        self.tasks = snapshot.tasks.clone();
        if self.json {
            let payload = serde_json::json!({
                "alert": {
                    "task_id": alert.task_id,
                    "description": alert.description,
                }
            });
            println!("{payload}");
        } else {
            let banner = render::alert_line(&snapshot.alert, &snapshot.tasks);
            println!("{BELL}{}", self.palette.highlight(&banner));
        }
        io::stdout().flush().ok();
    }

    fn on_outcome(&mut self, outcome: Result<Outcome, AppError>, snapshot: &Snapshot) {
        self.tasks = snapshot.tasks.clone();
        match outcome {
            Ok(outcome) if self.json => {
                match render::outcome_json(&outcome, snapshot, self.view) {
                    Ok(payload) => println!("{payload}"),
                    Err(err) => eprintln!("ERROR: {err}"),
                }
            }
            Ok(outcome) => {
                println!(
                    "{}",
                    render::outcome_text(&outcome, snapshot, self.view, &self.palette)
                );
            }
            Err(err) => eprintln!("ERROR: {err}"),
        }
        self.view = View::default();
        io::stdout().flush().ok();
    }
}

/// Prompts until `accept` takes the answer. Blank answers fall back to
/// `default` when there is one. End of input is an error.
pub fn prompt<T, F>(label: &str, default: Option<&str>, mut accept: F) -> Result<T, AppError>
where
    F: FnMut(&str) -> Result<T, AppError>,
{
    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        match default {
            Some(value) => print!("{label} [{value}]: "),
            None => print!("{label}: "),
        }
        io::stdout().flush()?;

        input.clear();
        let bytes = stdin.lock().read_line(&mut input)?;
        if bytes == 0 {
            return Err(AppError::io("input closed before the account was created"));
        }

        let answer = match (input.trim(), default) {
            ("", Some(value)) => value,
            (answer, _) => answer,
        };
        match accept(answer) {
            Ok(value) => return Ok(value),
            Err(err) => eprintln!("ERROR: {err}"),
        }
    }
}

pub fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
    println!("Type `exit` or `quit` to leave.");
}

/// Splits a typed line into arguments, honouring double and single quotes.
/// Backslash escapes a quote or backslash inside double quotes.
pub fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut started = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        match quote {
            Some('"') if ch == '\\' => escape = true,
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                started = true;
            }
            None if ch.is_whitespace() => {
                if started {
                    args.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            None => {
                current.push(ch);
                started = true;
            }
        }
    }

    if quote.is_some() {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if started {
        args.push(current);
    }

    Ok(args)
}
