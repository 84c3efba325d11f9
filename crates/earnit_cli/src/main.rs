use clap::Parser;
use earnit_cli::cli::{Cli, Command, View, collect_config_overrides, normalize_parse_error};
use earnit_cli::render;
use earnit_cli::terminal::{self, TerminalFrontend};
use earnit_core::alert::{RandomPicker, TaskPicker};
use earnit_core::config::{Config, Palette, load_config_with_fallback, merge_overrides};
use earnit_core::driver::{self, Clock, SystemClock};
use earnit_core::error::AppError;
use earnit_core::notify::notifier_from_env;
use earnit_core::session::{AlertStatus, Outcome, Session, Snapshot};
use earnit_core::storage::AccountStore;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "EARNIT_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let overrides = collect_config_overrides(raw_overrides)?;
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error {
        warn!(error = %err, "config ignored");
        eprintln!("WARNING: using default config ({err})");
    }
    Ok(merge_overrides(&loaded.config, &overrides))
}

fn picker() -> Box<dyn TaskPicker> {
    Box::new(RandomPicker::from_entropy())
}

fn print_outcome(
    outcome: &Outcome,
    snapshot: &Snapshot,
    view: View,
    json: bool,
    palette: &Palette,
) -> Result<(), AppError> {
    if json {
        println!("{}", render::outcome_json(outcome, snapshot, view)?);
    } else {
        println!("{}", render::outcome_text(outcome, snapshot, view, palette));
    }
    Ok(())
}

fn print_welcome(session: &Session, snapshot: &Snapshot, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", render::snapshot_json(snapshot)?);
    } else {
        println!(
            "Welcome, {}! Account saved to {}",
            session.user().name(),
            session.store().path().display()
        );
    }
    Ok(())
}

fn open_existing(store: AccountStore, clock: &dyn Clock) -> Result<Session, AppError> {
    Session::open(store, clock.now(), picker())?.ok_or_else(|| {
        AppError::invalid_input(
            "no account yet; run `earnit init --name <NAME>` or start `earnit` without arguments",
        )
    })
}

fn enroll(
    store: AccountStore,
    name: &str,
    currency: Option<&str>,
    force: bool,
    config: &Config,
    json: bool,
) -> Result<(), AppError> {
    if force && let Some(backup) = store.set_aside()? {
        eprintln!("Previous account file moved to {}", backup.display());
    }

    let now = SystemClock.now();
    let currency = currency.unwrap_or(config.currency_symbol());
    let session = Session::enroll(store, name, currency, config.alert_interval(), now, picker())?;
    print_welcome(&session, &session.snapshot(now), json)
}

fn enroll_interactively(store: AccountStore, config: &Config, clock: &dyn Clock) -> Result<Session, AppError> {
    println!("Welcome to EarnIt! Let's set up your account.");
    let name = terminal::prompt("What's your name", None, |answer| {
        if answer.is_empty() {
            Err(AppError::invalid_input("name is required"))
        } else {
            Ok(answer.to_string())
        }
    })?;
    let currency = terminal::prompt(
        "What symbol do you use for currency",
        Some(config.currency_symbol()),
        |answer| Ok(answer.to_string()),
    )?;

    let session = Session::enroll(
        store,
        &name,
        &currency,
        config.alert_interval(),
        clock.now(),
        picker(),
    )?;
    println!("Account saved to {}", session.store().path().display());
    Ok(session)
}

fn run_command(command: Command, json: bool, config: &Config) -> Result<(), AppError> {
    let store = AccountStore::from_env()?;
    if let Command::Init {
        name,
        currency,
        force,
    } = &command
    {
        return enroll(store, name, currency.as_deref(), *force, config, json);
    }

    let clock = SystemClock;
    let mut session = open_existing(store, &clock)?;
    let view = View::for_command(&command);
    let intent = command.to_intent(session.user().tasks())?;

    let now = clock.now();
    session.tick(now);
    let outcome = session.dispatch(intent, now)?;
    let snapshot = session.snapshot(now);
    let palette = config.palette();
    print_outcome(&outcome, &snapshot, view, json, &palette)?;

    let shows_alert = matches!(outcome, Outcome::Snapshot(_)) && view == View::Status;
    if !json && !shows_alert && matches!(snapshot.alert, AlertStatus::Alerting { .. }) {
        let banner = render::alert_line(&snapshot.alert, &snapshot.tasks);
        println!("{}", palette.highlight(&banner));
    }
    Ok(())
}

fn run_interactive(json: bool, config: &Config) -> Result<(), AppError> {
    let store = AccountStore::from_env()?;
    let clock = SystemClock;
    let mut session = match Session::open(store.clone(), clock.now(), picker())? {
        Some(session) => session,
        None => enroll_interactively(store, config, &clock)?,
    };

    let palette = config.palette();
    let snapshot = session.snapshot(clock.now());
    if json {
        println!("{}", render::snapshot_json(&snapshot)?);
    } else {
        println!("{}", render::snapshot_text(&snapshot, View::Status, &palette));
        println!("Type `help` for commands, `exit` to quit.");
    }

    let mut frontend = TerminalFrontend::spawn(&snapshot, json, palette);
    let notifier = notifier_from_env();
    driver::run(
        &mut session,
        &mut frontend,
        notifier.as_ref(),
        &clock,
        config.tick(),
    )
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = load_config(&cli.config_override)?;
    match cli.command {
        Some(command) => run_command(command, cli.json, &config),
        None => run_interactive(cli.json, &config),
    }
}

fn report(err: &AppError) {
    eprintln!("ERROR: {err}");
    if err.code() == "storage_corrupt" {
        eprintln!(
            "The account file could not be read. Run `earnit init --name <NAME> --force` to set it aside and start a fresh account."
        );
    }
}

fn main() {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli) {
        report(&err);
        std::process::exit(1);
    }
}
