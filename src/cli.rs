use clap::{Parser, Subcommand};

use crate::download::source::AudioQuality;

#[derive(Parser)]
#[command(name = "melodora")]
#[command(author, version, about = "Telegram bot that finds music and sends it as MP3", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Search with the configured backend and print the candidates
    Search {
        /// Free-text query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 5)]
        limit: usize,

        /// Print candidates as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download one track as MP3 with the configured backend
    Download {
        /// Track id (YouTube video id)
        id: String,

        /// Bitrate: low (128k), medium (192k) or high (320k)
        #[arg(short, long)]
        quality: Option<AudioQuality>,

        /// Output path (defaults to the track's file name in the current directory)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Check that yt-dlp, ffmpeg and ffprobe can be executed
    CheckTools,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
