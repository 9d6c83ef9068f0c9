use anyhow::Result;
use board_core::config::Config;
use board_core::io;
use std::path::Path;

use crate::root;

const HEADER: &str = "# Board configuration. Check it with `board config validate`.\n";

pub fn run(config_path: &Path, preset: &str, force: bool) -> Result<()> {
    let config = Config::preset(preset)?;
    let yaml = format!("{HEADER}{}", config.to_yaml()?);

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        io::ensure_dir(parent)?;
    }
    let written = if force {
        io::atomic_write(config_path, yaml.as_bytes())?;
        true
    } else {
        io::write_if_missing(config_path, yaml.as_bytes())?
    };

    if written {
        println!("Created {} ({} board)", config_path.display(), config.board.name);
    } else {
        println!("{} already exists, leaving it alone", config_path.display());
    }

    // Whatever is on disk now decides where the store lives.
    let config = Config::load(config_path)?;
    if let Some(dir) = config.store_dir(&root::config_dir(config_path)) {
        io::ensure_dir(&dir)?;
    }
    Ok(())
}
