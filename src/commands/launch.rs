//! Launch command

use crate::cli::LaunchArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::launch::LaunchPlan;
use crate::provision;

/// Returns the exit code to propagate
pub fn run(settings: &Settings, args: LaunchArgs) -> Result<i32> {
    provision::check_stamp(settings)?;
    let plan = LaunchPlan::new(settings, &args.command)?;
    plan.run()
}
