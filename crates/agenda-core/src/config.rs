use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::events::DEFAULT_UPCOMING_LIMIT;
use crate::grid::CalendarMode;
use crate::i18n::Language;
use crate::search::DEFAULT_LIVE_MIN_CHARS;
use crate::toast::DEFAULT_DURATION_MS;

const CONFIG_ENV: &str = "AGENDA_CONFIG";
const DEFAULT_DATA_LOCATION: &str =
  "~/.agenda";

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
#[serde(default)]
pub struct CalendarConfig {
  pub default_view:   CalendarMode,
  pub upcoming_limit: usize
}

impl Default for CalendarConfig {
  fn default() -> Self {
    Self {
      default_view:   CalendarMode::Month,
      upcoming_limit:
        DEFAULT_UPCOMING_LIMIT
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
#[serde(default)]
pub struct ToastConfig {
  pub duration_ms: u64
}

impl Default for ToastConfig {
  fn default() -> Self {
    Self {
      duration_ms: DEFAULT_DURATION_MS
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
#[serde(default)]
pub struct SearchConfig {
  pub live_min_chars: usize
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      live_min_chars:
        DEFAULT_LIVE_MIN_CHARS
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
#[serde(default)]
pub struct Config {
  pub data_location: String,
  pub color:         bool,
  /// Used only while no language
  /// preference has been stored.
  pub language:      Option<Language>,
  pub calendar:      CalendarConfig,
  pub toast:         ToastConfig,
  pub search:        SearchConfig,
  #[serde(skip)]
  pub loaded_files:  Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      data_location:
        DEFAULT_DATA_LOCATION
          .to_string(),
      color:         true,
      language:      None,
      calendar:
        CalendarConfig::default(),
      toast:         ToastConfig::default(
      ),
      search:
        SearchConfig::default(),
      loaded_files:  vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let path = resolve_config_path(
      config_override
    )?;

    let mut cfg = match path {
      | Some(path) if path.exists() => {
        info!(config = %path.display(), "loading config");
        Self::load_file(&path)?
      }
      | Some(path) => {
        warn!(
          config = %path.display(),
          "config file does not exist; using defaults"
        );
        Config::default()
      }
      | None => {
        warn!(
          "no config found; using \
           defaults"
        );
        Config::default()
      }
    };

    cfg.sanitize();
    Ok(cfg)
  }

  pub fn parse(
    text: &str
  ) -> anyhow::Result<Self> {
    let mut cfg: Config =
      toml::from_str(text)
        .context("invalid config")?;
    cfg.sanitize();
    Ok(cfg)
  }

  #[tracing::instrument]
  fn load_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let text =
      fs::read_to_string(path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    let mut cfg: Config =
      toml::from_str(&text)
        .with_context(|| {
          format!(
            "invalid config {}",
            path.display()
          )
        })?;
    cfg
      .loaded_files
      .push(path.to_path_buf());
    Ok(cfg)
  }

  /// Zero limits and blank paths fall
  /// back to their defaults.
  pub fn sanitize(&mut self) {
    let defaults = Config::default();
    if self
      .data_location
      .trim()
      .is_empty()
    {
      self.data_location =
        defaults.data_location;
    }
    if self.calendar.upcoming_limit
      == 0
    {
      self.calendar.upcoming_limit =
        defaults
          .calendar
          .upcoming_limit;
    }
    if self.toast.duration_ms == 0 {
      self.toast.duration_ms =
        defaults.toast.duration_ms;
    }
    if self.search.live_min_chars
      == 0
    {
      self.search.live_min_chars =
        defaults
          .search
          .live_min_chars;
    }
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k.trim();
      let value = v.trim();
      debug!(key = %key, value = %value, "applying override");
      match key {
        | "data_location" => {
          self.data_location =
            value.to_string();
        }
        | "color" => {
          self.color = parse_bool(value)
            .ok_or_else(|| {
              anyhow!(
                "invalid color \
                 setting: {value}"
              )
            })?;
        }
        | "language" => {
          self.language =
            Some(value.parse()?);
        }
        | "calendar.default_view" => {
          self.calendar.default_view =
            value.parse()?;
        }
        | "calendar.upcoming_limit" => {
          self.calendar.upcoming_limit =
            parse_number(key, value)?;
        }
        | "toast.duration_ms" => {
          self.toast.duration_ms =
            parse_number(key, value)?;
        }
        | "search.live_min_chars" => {
          self.search.live_min_chars =
            parse_number(key, value)?;
        }
        | other => {
          warn!(key = %other, "ignoring unknown config override");
        }
      }
    }
    self.sanitize();
    Ok(())
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = match override_dir {
    | Some(path) => expand_tilde(path),
    | None => expand_tilde(Path::new(
      &cfg.data_location
    ))
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(expand_tilde(path)));
  }

  if let Ok(config_env) =
    std::env::var(CONFIG_ENV)
  {
    if config_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(expand_tilde(
      Path::new(&config_env)
    )));
  }

  let Some(config_dir) =
    dirs::config_dir()
  else {
    debug!(
      "no platform config directory"
    );
    return Ok(None);
  };
  let candidate = config_dir
    .join("agenda")
    .join("agenda.toml");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

pub fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

fn parse_number<T>(
  key: &str,
  value: &str
) -> anyhow::Result<T>
where
  T: std::str::FromStr,
  T::Err: std::fmt::Display
{
  value.parse::<T>().map_err(|err| {
    anyhow!(
      "invalid value for {key}: \
       {value} ({err})"
    )
  })
}
