pub mod app;
pub mod auth;
pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod forms;
pub mod grid;
pub mod i18n;
pub mod model;
pub mod prefs;
pub mod progress;
pub mod render;
pub mod search;
pub mod toast;
pub mod tutorial;
pub mod views;

use std::ffi::OsString;
use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

const BACKEND_DIR: &str = "backend";

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting agenda CLI"
  );
  debug!(?cli.rc_overrides, "rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let backend_dir =
    data_dir.join(BACKEND_DIR);
  let backend =
    backend::LocalBackend::open(
      &backend_dir
    )
    .with_context(|| {
      format!(
        "failed to open backend at {}",
        backend_dir.display()
      )
    })?;

  let renderer =
    render::Renderer::new(&cfg);
  let ctx = context::AppContext::new(
    cfg,
    &data_dir,
    Arc::new(backend)
  )?;
  let mut app = app::AgendaApp::new(ctx);

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;

  let mut out = std::io::stdout().lock();
  let result = runtime.block_on(async {
    app.start().await?;
    commands::dispatch(
      &mut app,
      &renderer,
      &mut out,
      cli.command
    )
    .await?;
    anyhow::Ok(())
  });
  app.shutdown();
  out.flush()?;

  result?;
  info!("done");
  Ok(())
}
