use clap::{Parser, Subcommand, ValueEnum};
use simple_stream::config::Overrides;
use simple_stream::{
    Action, Browser, Config, Outcome, Session, SimpleStreamError, TerminalHost, TitleKind,
    md5crypt,
};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Find a movie or an episode and play it
#[derive(Parser)]
#[command(name = "simple-stream", version, about)]
struct Cli {
    /// Configuration file (defaults to config.toml in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Webshare user name or email
    #[arg(long, env = "SIMPLE_STREAM_WS_USERNAME", global = true)]
    ws_username: Option<String>,

    /// Webshare password
    #[arg(long, env = "SIMPLE_STREAM_WS_PASSWORD", hide_env_values = true, global = true)]
    ws_password: Option<String>,

    /// FedAPI UI token
    #[arg(long, env = "SIMPLE_STREAM_UI_TOKEN", hide_env_values = true, global = true)]
    ui_token: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse interactively, starting at the main menu (default)
    Browse,

    /// Search files by free text
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Search the movie catalog
    Catalog {
        kind: KindArg,
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Search titles by their IMDb name
    Imdb {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Run one encoded action and print its result
    Dispatch { payload: String },

    /// Print the salted login hash for a password (diagnostics)
    Hash { password: String, salt: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Movie,
    Series,
}

impl From<KindArg> for TitleKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => TitleKind::Movie,
            KindArg::Series => TitleKind::Series,
        }
    }
}

/// Installs the stderr logger; stdout stays reserved for listings and URLs
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

/// Prints a listing as `label<TAB>info<TAB>payload` lines, or the URL to play
fn print_outcome(outcome: Outcome) {
    match outcome {
        Outcome::Listing { items, .. } => {
            for item in items {
                println!(
                    "{}\t{}\t{}",
                    item.label,
                    item.info.as_deref().unwrap_or_default(),
                    item.action.encode()
                );
            }
        }
        Outcome::Play { url, subtitles } => {
            println!("{}", url);
            for subtitle in subtitles {
                eprintln!("Subtitle: {}", subtitle);
            }
        }
        Outcome::Done => {}
    }
}

fn run(cli: Cli) -> Result<(), SimpleStreamError> {
    let command = cli.command.unwrap_or(Commands::Browse);

    if let Commands::Hash { password, salt } = &command {
        let hashed = md5crypt::derive(password, salt, md5crypt::MAGIC);
        println!("{}", hashed);
        println!("{}", md5crypt::login_digest(password, salt));
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(Overrides {
        username: cli.ws_username,
        password: cli.ws_password,
        ui_token: cli.ui_token,
    });

    let mut host = TerminalHost::new(config.player.clone());
    let mut browser = Browser::new(Session::new(config)?);

    let outcome = match command {
        Commands::Browse => return browser.run(&mut host),
        Commands::Search { query } => browser.search_files(vec![query.join(" ")], &mut host)?,
        Commands::Catalog { kind, query } => {
            browser.search_catalog(&query.join(" "), kind.into(), &mut host)?
        }
        Commands::Imdb { query } => browser.search_external(&query.join(" "))?,
        Commands::Dispatch { payload } => {
            let action = Action::decode(&payload)?;
            browser.dispatch(action, &mut host)?
        }
        Commands::Hash { .. } => Outcome::Done,
    };

    print_outcome(outcome);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
