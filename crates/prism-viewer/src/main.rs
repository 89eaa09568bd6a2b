use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use prism_engine::config::RendererConfig;
use prism_engine::logging::{LoggingConfig, init_logging};
use prism_engine::window::Runtime;

const DEFAULT_CONFIG: &str = "prism.toml";

fn main() -> Result<()> {
    let mut config = load_config()?;
    if let Some(scene) = std::env::args_os().nth(1) {
        config.assets.scene = PathBuf::from(scene);
    }

    init_logging(LoggingConfig {
        filter: config.log_filter.clone(),
        ..LoggingConfig::default()
    });

    log::info!(
        "prism viewer: scene {}, shader {}",
        config.assets.scene.display(),
        config.shader.path.display()
    );

    Runtime::run(config)
}

/// `PRISM_CONFIG` names the file explicitly; otherwise `prism.toml` in the
/// working directory is used when present.
fn load_config() -> Result<RendererConfig> {
    if let Some(path) = std::env::var_os("PRISM_CONFIG") {
        let path = PathBuf::from(path);
        return RendererConfig::load(&path)
            .with_context(|| format!("loading {}", path.display()));
    }

    let path = Path::new(DEFAULT_CONFIG);
    if path.exists() {
        return RendererConfig::load(path).with_context(|| format!("loading {DEFAULT_CONFIG}"));
    }
    Ok(RendererConfig::default())
}
