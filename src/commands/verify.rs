//! Verify command: deep check of the provisioned tree

use console::Style;

use crate::config::Settings;
use crate::error::Result;
use crate::provision;

pub fn run(settings: &Settings) -> Result<()> {
    let stamp = provision::verify(settings)?;
    println!(
        "{} {} matches {}",
        Style::new().green().bold().apply_to("Verified:"),
        settings.asset.dir.display(),
        stamp.tree_digest
    );
    Ok(())
}
