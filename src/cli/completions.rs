use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    audioclip-runner completions bash > ~/.bash_completion.d/audioclip-runner\n\n\
                  Generate zsh completions:\n    audioclip-runner completions zsh > ~/.zfunc/_audioclip-runner\n\n\
                  Generate fish completions:\n    audioclip-runner completions fish > ~/.config/fish/completions/audioclip-runner.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
