use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

/// Settings read from the `todorc` file. Only three keys mean anything:
/// `data.location`, `default.command` and `color`.
#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>
}

impl Default for Config {
  fn default() -> Self {
    let map = [
      ("data.location", "~/.minitodo"),
      ("default.command", "list"),
      ("color", "on")
    ]
    .into_iter()
    .map(|(k, v)| {
      (k.to_string(), v.to_string())
    })
    .collect();

    Self { map }
  }
}

impl Config {
  #[tracing::instrument(skip(
    todorc_override
  ))]
  pub fn load(
    todorc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    match resolve_todorc_path(
      todorc_override
    ) {
      | Some(path) => {
        let path = expand_tilde(&path);
        info!(todorc = %path.display(), "loading todorc");
        let text =
          fs::read_to_string(&path)
            .with_context(|| {
              format!(
                "failed to read {}",
                path.display()
              )
            })?;
        cfg.merge_text(&path, &text)?;
      }
      | None => {
        debug!("no todorc; using defaults")
      }
    }

    Ok(cfg)
  }

  /// Later values win. A leading `rc.` on the key is ignored.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  /// One `key = value` per line;
  /// `#` starts a comment.
  fn merge_text(
    &mut self,
    origin: &Path,
    text: &str
  ) -> anyhow::Result<()> {
    for (idx, raw_line) in
      text.lines().enumerate()
    {
      let line = raw_line
        .split('#')
        .next()
        .unwrap_or_default()
        .trim();
      if line.is_empty() {
        continue;
      }

      let Some((k, v)) =
        line.split_once('=')
      else {
        return Err(anyhow!(
          "{}:{}: expected key = \
           value, got {raw_line:?}",
          origin.display(),
          idx + 1
        ));
      };

      let (key, value) =
        (k.trim(), v.trim());
      trace!(key, value, "todorc setting");
      self
        .map
        .insert(key.to_string(), value.to_string());
    }

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
  if let Some(path) = override_dir {
    return Ok(path.to_path_buf());
  }
  if let Some(cfg_value) =
    cfg.get("data.location")
  {
    return Ok(expand_tilde(
      Path::new(&cfg_value)
    ));
  }
  dirs::home_dir()
    .map(|home| home.join(".minitodo"))
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })
}

/// `--todorc`, then `$TODORC`
/// (`/dev/null` turns the file off),
/// then `~/.todorc` if it exists.
fn resolve_todorc_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Ok(from_env) =
    std::env::var("TODORC")
  {
    return (from_env != "/dev/null")
      .then(|| PathBuf::from(from_env));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping todorc"
    );
    return None;
  };
  Some(home.join(".todorc"))
    .filter(|candidate| {
      candidate.exists()
    })
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  match (
    path.strip_prefix("~"),
    dirs::home_dir()
  ) {
    | (Ok(rest), Some(home)) => {
      home.join(rest)
    }
    | _ => path.to_path_buf()
  }
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
