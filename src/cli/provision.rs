use clap::Parser;

/// Arguments for the provision command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Provision the pinned asset bundle:\n    audioclip-runner provision\n\n\
                  Reprovision even if the stamp matches:\n    audioclip-runner provision --force\n\n\
                  Override the pin from the environment:\n    \
                  AUDIOCLIP_ASSET_URL=https://example.org/assets-v2.tar.gz \\\n    \
                  AUDIOCLIP_ASSET_DIGEST=blake3:... audioclip-runner provision")]
pub struct ProvisionArgs {
    /// Download and extract again even when the bundle is already provisioned
    #[arg(long)]
    pub force: bool,

    /// Hide the download progress bar
    #[arg(long)]
    pub no_progress: bool,
}
