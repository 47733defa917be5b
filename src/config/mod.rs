/// Configuration system for tagview.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::TagviewConfig::default()`]
/// 2. **User global config** — `~/.tagview/config.toml`
/// 3. **Project local config** — `.tagview.toml` in the current working directory
/// 4. **Environment variables** — `TAGVIEW_*` overrides
///
/// Command line flags are applied on top by the CLI layer.
///
/// Files are merged at the TOML table level, so a project file that sets
/// only `backend.url` keeps everything else from the global file.
///
/// # Usage
///
/// ```rust,ignore
/// use tagview::config;
///
/// let cfg = config::load();
/// println!("polling {}", cfg.backend.stats_url());
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::{StalePolicy, TagviewConfig, Variant};

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved tagview configuration.
///
/// Merges defaults → global TOML → project TOML → env vars. Malformed files
/// are reported on stderr and skipped so a typo never keeps the dashboard
/// from starting.
pub fn load() -> TagviewConfig {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    for path in [global_config_path(), project_config_path()]
        .into_iter()
        .flatten()
    {
        if let Some(layer) = load_toml_value(&path) {
            merge_values(&mut merged, layer);
        }
    }

    resolve(merged, |key| std::env::var(key).ok())
}

/// Turn merged file layers plus environment into a runnable config.
fn resolve(merged: toml::Value, var: impl Fn(&str) -> Option<String>) -> TagviewConfig {
    let mut config: TagviewConfig = merged.try_into().unwrap_or_else(|e| {
        eprintln!("[tagview] ignoring config files: {e}");
        TagviewConfig::default()
    });

    apply_env_overrides(&mut config, var);
    for key in config.sanitize() {
        eprintln!("[tagview] {key} must be greater than zero, using the default");
    }
    config
}

/// Read a TOML file as an untyped value tree.
fn load_toml_value(path: &PathBuf) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            eprintln!("[tagview] skipping malformed {}: {e}", path.display());
            None
        }
    }
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any
/// other value in the overlay replaces the base value.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.tagview/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".tagview").join("config.toml"))
}

/// Path to the project local config: `.tagview.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".tagview.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None if path == "~" => dirs::home_dir(),
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Supported variables:
/// - `TAGVIEW_BACKEND_URL` — detection backend base URL
/// - `TAGVIEW_VARIANT` — `full` or `simple`
/// - `TAGVIEW_INTERVAL_MS` — poll interval
/// - `TAGVIEW_WEB_ADDR` — dashboard listen address
/// - `TAGVIEW_LOG_LEVEL` — diagnostic level
fn apply_env_overrides(config: &mut TagviewConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("TAGVIEW_BACKEND_URL")
        && !val.is_empty()
    {
        config.backend.url = val;
    }
    if let Some(val) = var("TAGVIEW_VARIANT")
        && let Ok(variant) = val.parse::<Variant>()
    {
        config.general.variant = variant;
    }
    if let Some(val) = var("TAGVIEW_INTERVAL_MS")
        && let Ok(ms) = val.parse::<u64>()
        && ms > 0
    {
        config.poller.interval_ms = ms;
    }
    if let Some(val) = var("TAGVIEW_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Some(val) = var("TAGVIEW_LOG_LEVEL")
        && !val.is_empty()
    {
        config.logging.level = val.to_ascii_lowercase();
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.tagview/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.tagview/ directory")?;
    }

    fs::write(&path, TagviewConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `backend.url`. The key must exist in the
/// schema; the value is parsed according to the type of the current value.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&TagviewConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    check_updated(&root, key, value)?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Reject an edited file the schema cannot load (`general.variant = "fancy"`)
/// or the poller cannot run with (`poller.interval_ms = 0`).
fn check_updated(root: &toml::Value, key: &str, value: &str) -> Result<()> {
    let config: TagviewConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;
    config
        .validate()
        .with_context(|| format!("invalid value for '{key}': {value}"))
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected a table above '{key}'"))?;

    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("'{key}' cannot be set from the command line"),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert((*leaf).to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults_value() -> toml::Value {
        toml::Value::try_from(TagviewConfig::default()).unwrap()
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn merge_keeps_untouched_keys_from_lower_layer() {
        let mut base: toml::Value = toml::from_str(
            r#"
[backend]
url = "http://global:5000"
timeout_ms = 2000
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[backend]
url = "http://project:5000"
"#,
        )
        .unwrap();

        merge_values(&mut base, overlay);
        let config: TagviewConfig = base.try_into().unwrap();
        assert_eq!(config.backend.url, "http://project:5000");
        assert_eq!(config.backend.timeout_ms, 2000);
        assert_eq!(config.backend.stats_path, "/stats");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = TagviewConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            "TAGVIEW_BACKEND_URL" => Some("http://pi.local:5000".to_string()),
            "TAGVIEW_VARIANT" => Some("simple".to_string()),
            "TAGVIEW_INTERVAL_MS" => Some("250".to_string()),
            "TAGVIEW_LOG_LEVEL" => Some("DEBUG".to_string()),
            _ => None,
        });
        assert_eq!(config.backend.url, "http://pi.local:5000");
        assert_eq!(config.general.variant, Variant::Simple);
        assert_eq!(config.poller.interval_ms, 250);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn env_overrides_ignore_invalid_values() {
        let mut config = TagviewConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            "TAGVIEW_VARIANT" => Some("fancy".to_string()),
            "TAGVIEW_INTERVAL_MS" => Some("0".to_string()),
            _ => None,
        });
        assert_eq!(config.general.variant, Variant::Full);
        assert_eq!(config.poller.interval_ms, 1000);
    }

    #[test]
    fn set_toml_value_updates_typed_values() {
        let mut root = defaults_value();
        set_toml_value(&mut root, "backend.url", "http://cam:5000").unwrap();
        set_toml_value(&mut root, "poller.interval_ms", "500").unwrap();
        set_toml_value(&mut root, "stream.enabled", "off").unwrap();

        let config: TagviewConfig = root.try_into().unwrap();
        assert_eq!(config.backend.url, "http://cam:5000");
        assert_eq!(config.poller.interval_ms, 500);
        assert!(!config.stream.enabled);
    }

    #[test]
    fn set_toml_value_rejects_bad_input() {
        let mut root = defaults_value();
        assert!(set_toml_value(&mut root, "nonexistent.key", "x").is_err());
        assert!(set_toml_value(&mut root, "backend.missing", "x").is_err());
        assert!(set_toml_value(&mut root, "poller.interval_ms", "soon").is_err());
        assert!(set_toml_value(&mut root, "", "x").is_err());
    }

    #[test]
    fn zero_interval_in_file_falls_back_to_default() {
        let layer: toml::Value = toml::from_str(
            r#"
[poller]
interval_ms = 0

[stream]
probe_interval_ms = 0
"#,
        )
        .unwrap();

        let config = resolve(layer, |_| None);
        assert_eq!(config.poller.interval_ms, 1000);
        assert_eq!(config.stream.probe_interval_ms, 10_000);
    }

    #[test]
    fn set_rejects_zero_interval() {
        let mut root = defaults_value();
        set_toml_value(&mut root, "poller.interval_ms", "0").unwrap();
        let err = format!("{:#}", check_updated(&root, "poller.interval_ms", "0").unwrap_err());
        assert!(err.contains("poller.interval_ms must be greater than zero"), "{err}");

        let mut root = defaults_value();
        set_toml_value(&mut root, "backend.timeout_ms", "1500").unwrap();
        assert!(check_updated(&root, "backend.timeout_ms", "1500").is_ok());
    }

    #[test]
    fn set_rejects_unknown_variant() {
        let mut root = defaults_value();
        set_toml_value(&mut root, "general.variant", "fancy").unwrap();
        assert!(check_updated(&root, "general.variant", "fancy").is_err());
    }

    #[test]
    fn expand_home_handles_plain_paths() {
        assert_eq!(
            expand_home("/var/log/tagview.jsonl"),
            Some(PathBuf::from("/var/log/tagview.jsonl"))
        );
    }

    #[test]
    fn show_effective_config_returns_toml() {
        let toml_str = show_effective_config().unwrap();
        let _: TagviewConfig = toml::from_str(&toml_str).unwrap();
    }
}
