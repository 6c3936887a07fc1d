mod cmd;
mod modules;
mod types;

use crate::cmd::{
    crawl::{self, CrawlArgs},
    login::{self, LoginArgs},
};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::{env, str::FromStr};
use tokio::runtime::Builder;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{self, time::OffsetTime},
};

#[derive(Debug, Parser)]
#[command(name = "leetcode_archive")]
#[command(about = "Archive your accepted LeetCode problems, editorials and submissions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch newly accepted problems and submissions into the archive
    Crawl(CrawlArgs),
    /// Sign in through the browser and refresh the cookie cache
    Login(LoginArgs),
}

fn main() {
    dotenv().ok();

    let log_level = env::var("RUST_LOG").unwrap_or(String::from("info"));
    let filter = EnvFilter::builder()
        .with_default_directive(
            LevelFilter::from_str(&log_level)
                .unwrap_or(LevelFilter::INFO)
                .into(),
        )
        .from_env_lossy();
    let format = fmt::format()
        .with_level(true)
        .with_target(true)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_timer(OffsetTime::local_rfc_3339().expect("couldn't get the local time offset"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(format)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build the tokio runtime");

    let result = match Cli::parse().command {
        Commands::Crawl(args) => runtime.block_on(crawl::run(args)),
        Commands::Login(args) => runtime.block_on(login::run(args)),
    };

    if let Err(e) = result {
        tracing::error!("{:?}", e);
        std::process::exit(1);
    }
}
