//! Environment variable overrides

use std::path::PathBuf;

use super::Settings;

/// Path of the configuration file (read by the CLI)
pub const CONFIG_VAR: &str = "AUDIOCLIP_CONFIG";
pub const ASSET_URL_VAR: &str = "AUDIOCLIP_ASSET_URL";
pub const ASSET_DIGEST_VAR: &str = "AUDIOCLIP_ASSET_DIGEST";
/// Also exported to the launched entrypoint
pub const ASSET_DIR_VAR: &str = "AUDIOCLIP_ASSET_DIR";

pub(super) fn apply<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let mut applied = Vec::new();

    if let Some(url) = non_empty(ASSET_URL_VAR) {
        settings.asset.url = Some(url);
        applied.push(ASSET_URL_VAR);
    }
    if let Some(digest) = non_empty(ASSET_DIGEST_VAR) {
        settings.asset.digest = Some(digest);
        applied.push(ASSET_DIGEST_VAR);
    }
    if let Some(dir) = non_empty(ASSET_DIR_VAR) {
        settings.asset.dir = PathBuf::from(dir);
        applied.push(ASSET_DIR_VAR);
    }

    settings.origin.env_overrides = applied;
}
