use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

/// Splits `KEY=VALUE`, or `KEY:VALUE` when there is no `=`.
fn split_setting(s: &str) -> Option<(&str, &str)> {
    s.split_once('=').or_else(|| s.split_once(':'))
}

fn parse_rc_flag(s: &str) -> Result<(String, String), String> {
    let (key, value) = split_setting(s).ok_or_else(|| format!("expected KEY=VALUE, got: {s}"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "todo",
    version,
    about = "A small task list kept in a local key-value store",
    disable_help_subcommand = true,
    arg_required_else_help = false
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(long = "rc", value_name = "KEY=VALUE", value_parser = parse_rc_flag, action = ArgAction::Append)]
    pub rc_overrides: Vec<(String, String)>,

    #[arg(long = "todorc")]
    pub todorc: Option<PathBuf>,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<OsString>,
}

/// Logs go to stderr. `RUST_LOG` wins over `-v`/`-q`.
pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let level = match (quiet, verbose) {
        (2.., _) => "error",
        (1, _) | (0, 0) => "warn",
        (0, 1) => "info",
        (0, 2) => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow!("invalid log filter: {e}"))?;

    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init()
    {
        debug!(error = %err, "tracing already initialised");
    }
    Ok(())
}

/// Global flags whose value is the following token.
const VALUE_FLAGS: &[&str] = &["--rc", "--todorc", "--data"];

/// Pulls `rc.KEY=VALUE` / `rc.KEY:VALUE` tokens out of the argument list.
///
/// Only tokens ahead of the command word are overrides. Everything from the
/// command word on (or after `--`) is passed through untouched, so task text
/// such as `add read rc.d:notes` keeps its words.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> PreprocessedArgs {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    let mut expects_value = false;
    while let Some(arg) = iter.next() {
        let s = arg.to_string_lossy().into_owned();
        if expects_value {
            expects_value = false;
            cleaned.push(arg);
            continue;
        }

        if let Some((k, v)) = s.strip_prefix("rc.").and_then(split_setting) {
            debug!(key = %k, value = %v, "captured positional rc override");
            overrides.push((format!("rc.{k}"), v.to_string()));
            continue;
        }

        let ends_globals = s == "--" || !s.starts_with('-');
        expects_value = VALUE_FLAGS.contains(&s.as_str());
        cleaned.push(arg);
        if ends_globals {
            cleaned.extend(iter.by_ref());
            break;
        }
    }

    PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// First token is the command (abbreviations allowed), the rest are its
    /// arguments. No tokens runs `default.command`.
    #[tracing::instrument(skip(cfg, rest))]
    pub fn parse(cfg: &Config, rest: Vec<OsString>) -> anyhow::Result<Self> {
        let mut tokens = rest
            .into_iter()
            .map(|arg| arg.to_string_lossy().to_string());

        let Some(first) = tokens.next() else {
            let cmd = cfg
                .get("default.command")
                .unwrap_or_else(|| "list".to_string());
            debug!(command = %cmd, "no explicit command, using default");
            return Ok(Self {
                command: cmd,
                args: vec![],
            });
        };

        let known = crate::commands::known_command_names();
        let command = crate::commands::expand_command_abbrev(&first, &known)
            .ok_or_else(|| anyhow!("unknown or ambiguous command: {first}"))?;
        debug!(token = %first, expanded = %command, "resolved command token");

        Ok(Self {
            command: command.to_string(),
            args: tokens.collect(),
        })
    }
}
