use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "diary", about = "Personal diary service")]
pub struct Cli {
    /// Path to a settings file, without or with its `.toml` extension.
    #[arg(long)]
    pub settings: Option<String>,
}
