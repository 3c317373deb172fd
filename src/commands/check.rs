//! Check command: runtime environment preflight only

use console::Style;

use crate::config::Settings;
use crate::error::Result;
use crate::runtime;

pub fn run(settings: &Settings) -> Result<()> {
    let report = runtime::preflight(settings);
    let ok = Style::new().green().bold();
    let fail = Style::new().red().bold();

    println!("Tools:");
    if report.tools.is_empty() {
        println!("  (none required)");
    }
    for tool in &report.tools {
        match &tool.resolved {
            Some(path) => println!("  {} {} ({})", ok.apply_to("✓"), tool.name, path.display()),
            None => println!("  {} {} (not found on PATH)", fail.apply_to("✗"), tool.name),
        }
    }

    println!("Writable directories:");
    for dir in &report.dirs {
        match &dir.error {
            None => println!("  {} {}", ok.apply_to("✓"), dir.path.display()),
            Some(reason) => println!("  {} {} ({reason})", fail.apply_to("✗"), dir.path.display()),
        }
    }

    report.into_result()?;
    println!("\n{}", ok.apply_to("Runtime environment is ready."));
    Ok(())
}
