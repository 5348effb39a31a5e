use std::io::Write;

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument};

use crate::board::Board;
use crate::cli::Invocation;
use crate::datastore::{KeyValueStore, TASKS_KEY};
use crate::render::Renderer;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add", "list", "done", "undone", "priority", "edit", "delete", "clear", "status", "show",
        "filters", "export", "help", "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Runs one command against `board`, writing user-facing output to `out`.
#[instrument(skip(board, renderer, out, inv), fields(command = %inv.command))]
pub fn dispatch<S: KeyValueStore, W: Write>(
    board: &mut Board<S>,
    renderer: &Renderer,
    out: &mut W,
    inv: Invocation,
) -> anyhow::Result<()> {
    debug!(args = ?inv.args, "dispatching command");
    let args = inv.args.as_slice();

    match inv.command.as_str() {
        "add" => cmd_add(board, out, args),
        "list" => cmd_list(board, renderer, out),
        "done" => cmd_set_done(board, renderer, out, args, true),
        "undone" => cmd_set_done(board, renderer, out, args, false),
        "priority" => cmd_priority(board, renderer, out, args),
        "edit" => cmd_edit(board, renderer, out, args),
        "delete" => cmd_delete(board, out, args),
        "clear" => cmd_clear(board, renderer, out),
        "status" => {
            let value = single_arg(args, "status", "all|open|done")?;
            board.set_status_filter(value)?;
            cmd_list(board, renderer, out)
        }
        "show" => {
            let value = single_arg(args, "show", "all|low|medium|high")?;
            board.set_priority_filter(value)?;
            cmd_list(board, renderer, out)
        }
        "filters" => renderer.write_filters(out, &board.view()),
        "export" => cmd_export(board, out),
        "help" => cmd_help(out),
        "version" => {
            writeln!(out, "{}", env!("CARGO_PKG_VERSION"))?;
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(board, out, args))]
fn cmd_add<S: KeyValueStore, W: Write>(
    board: &mut Board<S>,
    out: &mut W,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command add");
    let task = board.create(&args.join(" "))?;
    writeln!(out, "Created task {}.", task.short_id())?;
    Ok(())
}

fn cmd_list<S: KeyValueStore, W: Write>(
    board: &Board<S>,
    renderer: &Renderer,
    out: &mut W,
) -> anyhow::Result<()> {
    renderer.write_board(out, &board.view())
}

#[instrument(skip(board, renderer, out, args))]
fn cmd_set_done<S: KeyValueStore, W: Write>(
    board: &mut Board<S>,
    renderer: &Renderer,
    out: &mut W,
    args: &[String],
    done: bool,
) -> anyhow::Result<()> {
    let id = resolve_id(board, single_arg(args, "done", "ID")?)?;
    board.set_done(&id, done)?;
    cmd_list(board, renderer, out)
}

#[instrument(skip(board, renderer, out, args))]
fn cmd_priority<S: KeyValueStore, W: Write>(
    board: &mut Board<S>,
    renderer: &Renderer,
    out: &mut W,
    args: &[String],
) -> anyhow::Result<()> {
    let [id, priority] = args else {
        return Err(anyhow!("usage: priority ID low|medium|high"));
    };
    let id = resolve_id(board, id)?;
    board.set_priority(&id, priority)?;
    cmd_list(board, renderer, out)
}

/// One-shot edit session: begin, then save with the given text.
#[instrument(skip(board, renderer, out, args))]
fn cmd_edit<S: KeyValueStore, W: Write>(
    board: &mut Board<S>,
    renderer: &Renderer,
    out: &mut W,
    args: &[String],
) -> anyhow::Result<()> {
    let Some((id, text)) = args.split_first() else {
        return Err(anyhow!("usage: edit ID TEXT..."));
    };
    let id = resolve_id(board, id)?;
    board.begin_edit(&id);
    board.save_edit(&text.join(" "))?;
    cmd_list(board, renderer, out)
}

#[instrument(skip(board, out, args))]
fn cmd_delete<S: KeyValueStore, W: Write>(
    board: &mut Board<S>,
    out: &mut W,
    args: &[String],
) -> anyhow::Result<()> {
    let id = resolve_id(board, single_arg(args, "delete", "ID")?)?;
    board.remove(&id)?;
    writeln!(out, "Deleted task {}.", crate::task::short_id(&id))?;
    Ok(())
}

#[instrument(skip(board, renderer, out))]
fn cmd_clear<S: KeyValueStore, W: Write>(
    board: &mut Board<S>,
    renderer: &Renderer,
    out: &mut W,
) -> anyhow::Result<()> {
    let before = board.tasks().len();
    board.clear_done()?;
    info!(removed = before - board.tasks().len(), "command clear");
    cmd_list(board, renderer, out)
}

fn cmd_export<S: KeyValueStore, W: Write>(board: &Board<S>, out: &mut W) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(board.tasks().tasks())
        .with_context(|| format!("failed to serialize {TASKS_KEY}"))?;
    writeln!(out, "{json}")?;
    Ok(())
}

fn cmd_help<W: Write>(out: &mut W) -> anyhow::Result<()> {
    writeln!(
        out,
        "commands:\n  \
         add TEXT...                  add a task\n  \
         list                         show the filtered list (default)\n  \
         done ID | undone ID          mark a task done or open\n  \
         priority ID low|medium|high  change priority\n  \
         edit ID TEXT...              replace the text of a task\n  \
         delete ID                    delete a task\n  \
         clear                        delete all done tasks\n  \
         status all|open|done         set the status filter\n  \
         show all|low|medium|high     set the priority filter\n  \
         filters                      show filter options with counts\n  \
         export                       print all tasks as JSON\n  \
         version                      print the version\n\
         IDs may be shortened to any unique prefix."
    )?;
    Ok(())
}

fn single_arg<'a>(args: &'a [String], command: &str, what: &str) -> anyhow::Result<&'a str> {
    match args {
        [value] => Ok(value.as_str()),
        _ => Err(anyhow!("usage: {command} {what}")),
    }
}

fn resolve_id<S: KeyValueStore>(board: &Board<S>, prefix: &str) -> anyhow::Result<String> {
    let id = board.tasks().resolve(prefix)?;
    Ok(id.to_string())
}
