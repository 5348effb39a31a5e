pub mod board;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod edit;
pub mod error;
pub mod filter;
pub mod render;
pub mod store;
pub mod task;
pub mod view;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use board::Board;
pub use error::{
  CoreError,
  ValidationError
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args);
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting todo CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.todorc.as_deref()
  )?;
  cfg.apply_overrides(
    pre
      .rc_overrides
      .into_iter()
      .chain(cli.rc_overrides)
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let kv = datastore::FileStore::open(
    &data_dir
  )
  .with_context(|| {
    format!(
      "failed to open store at {}",
      data_dir.display()
    )
  })?;
  let mut board = Board::open(kv);

  let renderer =
    render::Renderer::new(&cfg);
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &mut board,
    &renderer,
    &mut io::stdout().lock(),
    inv
  )?;

  info!("done");
  Ok(())
}
