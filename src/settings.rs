use std::path::Path;

use dsync_lib::{Config, DsyncError};

use crate::cli::SourceArgs;

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > $XDG_CONFIG_HOME/dsync/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, DsyncError> {
    let cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(|p| p.display().to_string())
            .or_else(|| Config::central_config_path().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "defaults".to_string());
        DsyncError::Config(format!("Failed to read config {}: {}", loc, e))
    })?;
    Ok(cfg.with_env_overrides())
}

/// Apply CLI flags over the loaded config, then validate the result.
pub fn resolve_config(
    config: Config,
    args: &SourceArgs,
    config_path: Option<&Path>,
) -> Result<Config, DsyncError> {
    let mut cfg = config;
    if let Some(document) = &args.document {
        cfg.document_path = Some(document.clone());
    }
    if let Some(file_key) = &args.file_key {
        cfg.file_key = Some(file_key.clone());
    }
    if let Some(output_dir) = &args.output_dir {
        cfg.output_dir = output_dir.clone();
    }
    if let Some(snapshot) = &args.snapshot {
        cfg.snapshot_path = snapshot.clone();
    }
    if let Some(templates) = &args.templates {
        cfg.templates_dir = Some(templates.clone());
    }
    if let Some(sample) = &args.sample_tokens {
        cfg.sample_tokens = Some(sample.clone());
    }
    if let Some(mode) = args.mode {
        cfg.resolve_mode = mode.into();
    }

    cfg.validate().map_err(|e| {
        let prefix = config_path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        DsyncError::Config(prefix)
    })?;
    Ok(cfg)
}

/// Format effective config as a single-line string.
pub fn format_effective_config(config: &Config, config_source: Option<&Path>) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    let document = match (&config.document_path, &config.file_key) {
        (Some(path), _) => format!("file:{}", path.display()),
        (None, Some(key)) => format!("figma:{key}"),
        (None, None) => "none".to_string(),
    };
    format!(
        "Effective config [{source}]: document={}, output_dir={}, snapshot={}, templates={}, max_depth={}, mode={:?}, poll_interval={}s, fetch_timeout={}s, tolerances: color={:.1}, spacing={:.1}, radius={:.1}, font_size={:.1}",
        document,
        config.output_dir.display(),
        config.snapshot_path.display(),
        config
            .templates_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string()),
        config.max_depth,
        config.resolve_mode,
        config.poll_interval.as_secs(),
        config.fetch_timeout.as_secs(),
        config.tolerances.color,
        config.tolerances.spacing,
        config.tolerances.radius,
        config.tolerances.font_size,
    )
}
