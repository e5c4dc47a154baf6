pub mod config;
pub mod outcomes;

pub use config::Config;
pub use outcomes::OutcomeStore;

use std::path::PathBuf;

/// Resolves (and creates) the directory holding pomd's config and store.
///
/// `~/.config/pomd` normally, `~/.config/pomd-dev` when `POMD_ENV=dev`
/// so development runs never touch real data.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let suffix = match std::env::var("POMD_ENV") {
        Ok(v) if v == "dev" => "-dev",
        _ => "",
    };
    let dir = home.join(".config").join(format!("pomd{suffix}"));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
