//! Status command: show the stamp without re-hashing the tree

use console::Style;

use crate::config::Settings;
use crate::error::Result;
use crate::provision;

pub fn run(settings: &Settings) -> Result<()> {
    println!("Asset directory: {}", settings.asset.dir.display());
    println!("Pinned URL: {}", settings.asset_url());
    println!(
        "Pinned digest: {}",
        settings.asset.digest.as_deref().unwrap_or("(unpinned)")
    );
    println!();

    let stamp = provision::check_stamp(settings)?;
    println!("{}", Style::new().green().bold().apply_to("Provisioned"));
    super::print_stamp(&stamp);
    Ok(())
}
