pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "soupmate")]
#[command(about = "SoupMate - soup recipe import and hybrid retrieval", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the chat API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,
    },

    /// Run database migrations
    Migrate,

    /// Import recipes from Spoonacular
    Import {
        /// Number of recipes to import
        #[arg(short, long)]
        total: Option<usize>,

        /// Recipes per page (max 100)
        #[arg(long)]
        page_size: Option<usize>,

        /// Source name recorded for the imported recipes
        #[arg(long)]
        source: Option<String>,

        /// Offset of the first page, to resume an earlier run
        #[arg(long)]
        offset: Option<usize>,
    },

    /// Compute embeddings for chunks that have none
    Embed {
        /// Chunks per embedding request
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Search the local recipe store
    Search {
        /// Search query
        query: String,

        /// Maximum number of recipes
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
}
