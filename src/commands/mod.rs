//! Command implementations for the runner CLI

pub mod analyze;
pub mod check;
pub mod completions;
pub mod launch;
pub mod provision;
pub mod status;
pub mod storage;
pub mod verify;
pub mod version;

use console::Style;

use crate::provision::ProvisionStamp;

/// Print the fields of a provisioning stamp
fn print_stamp(stamp: &ProvisionStamp) {
    let label = Style::new().bold();
    println!("  {} {}", label.apply_to("URL:"), stamp.url);
    println!("  {} {}", label.apply_to("Archive digest:"), stamp.archive_digest);
    println!("  {} {}", label.apply_to("Tree digest:"), stamp.tree_digest);
    println!("  {} {}", label.apply_to("Provisioned at:"), stamp.provisioned_at);
    println!("  {} {}", label.apply_to("Runner version:"), stamp.version);
}
