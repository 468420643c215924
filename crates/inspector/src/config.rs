//! Configuration file discovery and loading

use std::path::{Path, PathBuf};

use eyre::{WrapErr, eyre};
use inspector_core::InspectorConfig;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "INSPECTOR_CONFIG";

const LOCAL_CANDIDATES: [&str; 3] = ["inspector.yml", "inspector.yaml", "inspector.toml"];

/// Load configuration from file
///
/// `.toml` files are parsed as TOML, everything else as YAML.
///
/// # Errors
/// Returns error if file cannot be read or parsed
pub fn load(path: &Path) -> eyre::Result<InspectorConfig> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;

    let mut config: InspectorConfig = if is_toml(path) {
        toml::from_str(&content)
            .wrap_err_with(|| format!("invalid TOML in {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .wrap_err_with(|| format!("invalid YAML in {}", path.display()))?
    };

    let home = dirs::home_dir();
    config.connection.identity_files = config
        .connection
        .identity_files
        .iter()
        .map(|file| expand_home(file, home.as_deref()).display().to_string())
        .collect();

    Ok(config)
}

/// Find and load the config file
///
/// Order: `explicit`, `$INSPECTOR_CONFIG`, the working directory, then the
/// per-user config directory.
///
/// # Errors
/// Returns error if no file is found or the chosen file cannot be loaded
pub fn load_default(explicit: Option<&Path>) -> eyre::Result<(PathBuf, InspectorConfig)> {
    let path = locate(
        explicit,
        std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        dirs::config_dir(),
    )?;
    tracing::debug!(path = %path.display(), "loading config");

    let config = load(&path)?;
    Ok((path, config))
}

fn locate(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> eyre::Result<PathBuf> {
    // Explicit choices are used even if missing so the read error names them
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = from_env.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }

    let mut candidates: Vec<PathBuf> = LOCAL_CANDIDATES.iter().map(PathBuf::from).collect();
    if let Some(dir) = config_dir {
        candidates.push(dir.join("inspector").join("inspector.yml"));
    }

    candidates.iter().find(|p| p.exists()).cloned().ok_or_else(|| {
        let searched: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
        eyre!(
            "no config file found (searched {}); pass --config or set {CONFIG_ENV}",
            searched.join(", ")
        )
    })
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

/// Replace a leading `~/` with the home directory
fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if path == "~" => home.map_or_else(|| PathBuf::from(path), Path::to_path_buf),
        _ => PathBuf::from(path),
    }
}
