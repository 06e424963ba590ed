use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use quire_types::DocumentRole;

#[derive(Parser)]
#[command(
    name = "quire",
    about = "quire: incremental, crash-safe document assembly over an object store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML config file. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Append one page image to a document
    Append(AppendArgs),
    /// Show the latest version of a document
    Show(DocumentArgs),
    /// Remove a lock left behind by a crashed writer
    Unlock(DocumentArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Overrides `bind_addr` from the config file
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args, Debug)]
pub struct DocumentArgs {
    #[arg(long, value_parser = parse_role)]
    pub role: DocumentRole,
    #[arg(long)]
    pub job: String,
}

#[derive(Args, Debug)]
pub struct AppendArgs {
    #[command(flatten)]
    pub doc: DocumentArgs,
    /// Logical page key, e.g. storyPage3
    #[arg(long)]
    pub key: String,
    /// Image path under the images root, or its public URL
    #[arg(long)]
    pub image: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub hero: Option<String>,
}

fn parse_role(s: &str) -> Result<DocumentRole, String> {
    s.parse().map_err(|e: quire_types::TypeError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_append() {
        let cli = Cli::try_parse_from([
            "quire", "--format", "json", "append", "--role", "lulu_interior", "--job", "J1",
            "--key", "cover", "--image", "j1/cover.png", "--title", "Kit",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::Append(args) => {
                assert_eq!(args.doc.role, DocumentRole::LuluInterior);
                assert_eq!(args.key, "cover");
                assert_eq!(args.title.as_deref(), Some("Kit"));
                assert!(args.hero.is_none());
            }
            _ => panic!("expected append"),
        }
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(Cli::try_parse_from(["quire", "show", "--role", "admin", "--job", "J1"]).is_err());
    }
}
