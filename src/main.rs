use std::path::PathBuf;

use clap::{
    CommandFactory, Parser,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use podqueue::{
    cli::{self, UpdateOptions},
    config, warning,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Include episodes from the last N days
    #[clap(long, short = 'd', default_value_t = 1)]
    days: u32,

    /// Don't remove old episodes, just add new ones
    #[clap(long, short = 'k')]
    keep_old: bool,

    /// Playlist name
    #[clap(long, short = 'p', default_value = config::DEFAULT_PLAYLIST_NAME)]
    playlist: String,

    /// JPEG cover image (square, max 256KB); overrides PLAYLIST_COVER_IMAGE
    #[clap(long)]
    cover: Option<PathBuf>,

    /// Print shell completions and exit
    #[clap(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = config::load_env().await {
        warning!("Cannot load .env file. Err: {}", e);
    }

    cli::update(UpdateOptions {
        days: cli.days,
        keep_old: cli.keep_old,
        playlist: cli.playlist,
        cover: cli.cover,
    })
    .await;
}
