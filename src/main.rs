use anyhow::Result;
use clap::Parser;
use everlay::config::{Overrides, Settings};
use std::path::PathBuf;

/// everlay - Celeste + Everest on a copy-on-write overlay
///
/// Mounts an overlay over a read-only Celeste installation, builds and
/// installs Everest into it, links the requested mods (with their
/// dependencies) from the mod store and launches the game.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used when
/// querying Everest releases.
///
/// Examples:
///   everlay --game-dir ~/Games/Celeste   # Record the game dir and play with all mods
///   everlay --mod SpringCollab2020       # Play with one mod and its dependencies
///   everlay update                       # Check for a newer Everest
#[derive(Parser, Debug)]
#[command(author, version = env!("EVERLAY_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Save namespace; saves live in <root>/saves/<NAME> [default: default]
    #[arg(long, value_name = "NAME", global = true)]
    savepath: Option<String>,

    /// Activate only this mod and its dependencies
    #[arg(long = "mod", value_name = "NAME", global = true)]
    mod_name: Option<String>,

    /// Data root directory (also via EVERLAY_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "EVERLAY_ROOT",
        value_name = "PATH",
        global = true
    )]
    root: Option<PathBuf>,

    /// Celeste installation to overlay; remembered for later runs
    #[arg(long, value_name = "PATH", global = true)]
    game_dir: Option<PathBuf>,

    /// Release index API URL (defaults to https://api.github.com)
    #[arg(long, value_name = "URL", global = true)]
    index_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Mount the overlay and exit
    Mount,

    /// Build and install the latest Everest release
    Update(UpdateArgs),

    /// Pick one mod interactively and play it with its own saves
    Single,

    /// List mods in the mod store
    List,
}

#[derive(clap::Args, Debug)]
struct UpdateArgs {
    /// Install without asking for confirmation
    #[arg(short, long)]
    yes: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            root: self.root.clone(),
            game_dir: self.game_dir.clone(),
            save_namespace: self.savepath.clone(),
            requested_mod: self.mod_name.clone(),
            index_url: self.index_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = everlay::runtime::RealRuntime;
    let settings = Settings::resolve(&runtime, cli.overrides())?;

    match cli.command {
        None => everlay::commands::run(&runtime, &settings).await?,
        Some(Commands::Mount) => everlay::commands::mount(&runtime, &settings)?,
        Some(Commands::Update(args)) => {
            everlay::commands::update(&runtime, &settings, args.yes).await?
        }
        Some(Commands::Single) => everlay::commands::single(&runtime, &settings).await?,
        Some(Commands::List) => everlay::commands::list(&runtime, &settings)?,
    }
    Ok(())
}
