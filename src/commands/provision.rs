//! Provision command

use console::Style;

use crate::cli::ProvisionArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::provision::{self, Outcome, ProvisionOptions};

pub fn run(settings: &Settings, args: ProvisionArgs) -> Result<()> {
    let options = ProvisionOptions {
        force: args.force,
        show_progress: !args.no_progress && console::user_attended_stderr(),
    };

    let outcome = provision::provision(settings, options)?;
    let done = Style::new().green().bold();

    match &outcome {
        Outcome::AlreadyProvisioned(_) => println!(
            "{} {}",
            done.apply_to("Already provisioned:"),
            settings.asset.dir.display()
        ),
        Outcome::Provisioned(_) => println!(
            "{} {}",
            done.apply_to("Provisioned:"),
            settings.asset.dir.display()
        ),
    }
    super::print_stamp(outcome.stamp());
    Ok(())
}
