//! Command line front end over a SQLite-backed notice store.
//!
//! # Responsibility
//! - Manage stored notices without an admin panel.
//! - Run one display or dismissal request against a standalone host.
//!
//! Usage: `notice_cli <db-path> <command> [args]`
//!
//! Environment:
//! - `NOTICE_CONFIG`: JSON config file.
//! - `NOTICE_LOG_DIR`: absolute log directory; logging is off when unset.
//! - `NOTICE_LOG_LEVEL`: log level, defaults per build profile.

use notice_core::{
    clear_notices, create_notice, delete_notice, get_notice, get_notices, init_logging, open_db,
    AdminHost, DataContext, DismissRequest, NewNotice, NoticeConfig, NoticeManager,
    SqliteOptionStore, StandaloneHost, UserId,
};
use serde_json::Value;
use std::error::Error;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

const USAGE: &str = "usage: notice_cli <db-path> <command> [args]

commands:
  list                       print every stored notice
  get <id>                   print one notice
  create <json>              store a notice built from JSON arguments
  delete <id>                delete one notice
  clear                      delete every notice
  render <user-id> [screen]  run a display pass and print the markup
  dismiss <id> <user-id>     dismiss a notice as the given user";

/// Capability granted to the command line user.
const CLI_CAPABILITY: &str = "manage_options";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> CliResult<()> {
    let (db_path, command, rest) = match args {
        [db_path, command, rest @ ..] => (db_path, command.as_str(), rest),
        _ => return Err(USAGE.into()),
    };

    start_logging()?;
    let config = load_config()?;
    let conn = open_db(db_path)?;
    let mut manager = NoticeManager::from_store(SqliteOptionStore::new(&conn), config)?;

    match (command, rest) {
        ("list", []) => {
            let notices: Vec<Value> = get_notices(manager.repo())
                .iter()
                .map(|notice| Value::Object(notice.data(DataContext::Full)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&notices)?);
        }
        ("get", [id]) => {
            let notice = get_notice(manager.repo(), id, false)
                .ok_or_else(|| format!("no notice with id `{id}`"))?;
            let data = Value::Object(notice.data(DataContext::Full));
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        ("create", [json]) => {
            let args: NewNotice = serde_json::from_str(json)?;
            let mut notice = create_notice(args);
            if notice.id().is_empty() {
                return Err("notice id is required".into());
            }
            notice.save(manager.repo_mut(), true)?;
            println!("created {}", notice.id());
        }
        ("delete", [id]) => {
            if !delete_notice(manager.repo_mut(), id, true)? {
                return Err(format!("no notice with id `{id}`").into());
            }
            println!("deleted {id}");
        }
        ("clear", []) => {
            clear_notices(manager.repo_mut(), true)?;
            println!("cleared");
        }
        ("render", [user, screen @ ..]) if screen.len() <= 1 => {
            let mut host = StandaloneHost::new(parse_user(user)?).with_capability(CLI_CAPABILITY);
            if let Some(screen) = screen.first() {
                host = host.with_screen(screen.as_str());
            }
            for rendered in manager.display_notices(&host)? {
                println!("{}", rendered.html);
            }
            if let Some(script) = manager.footer_script() {
                println!("{script}");
            }
            manager.shutdown()?;
        }
        ("dismiss", [id, user]) => {
            let host = StandaloneHost::new(parse_user(user)?)
                .with_capability(CLI_CAPABILITY)
                .for_ajax();
            let request = DismissRequest {
                id: id.clone(),
                nonce: host.create_nonce(&manager.config().dismiss_action),
            };
            if !manager.dismiss_notice(&host, &request)? {
                return Err(format!("no notice with id `{id}`").into());
            }
            println!("dismissed {id}");
        }
        _ => return Err(USAGE.into()),
    }

    Ok(())
}

fn parse_user(value: &str) -> CliResult<UserId> {
    value
        .parse::<UserId>()
        .map_err(|err| format!("invalid user id `{value}`: {err}").into())
}

fn load_config() -> CliResult<NoticeConfig> {
    match std::env::var("NOTICE_CONFIG") {
        Ok(path) => Ok(NoticeConfig::from_json_file(path)?),
        Err(_) => Ok(NoticeConfig::default()),
    }
}

fn start_logging() -> CliResult<()> {
    let Ok(log_dir) = std::env::var("NOTICE_LOG_DIR") else {
        return Ok(());
    };
    let level = std::env::var("NOTICE_LOG_LEVEL")
        .unwrap_or_else(|_| notice_core::default_log_level().to_string());
    init_logging(&level, &log_dir)?;
    log::info!("event=cli_start module=cli status=ok version={}", notice_core::core_version());
    Ok(())
}
