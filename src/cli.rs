use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::domain::models::{PostKind, Taxonomy};

#[derive(Parser)]
#[command(name = "show-permalinks")]
#[command(version)]
#[command(about = "Permalink routing for a shows / seasons / episodes hierarchy")]
pub struct Cli {
    /// Content file to read and update
    #[arg(long, global = true)]
    pub content: Option<PathBuf>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Match a request path against the route table and print what it resolves to
    Resolve {
        /// Request path, e.g. /shows/game-of-thrones/season-1/
        path: String,
    },

    /// Print the permalink of one or more posts
    Permalink {
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Print the ordered rewrite rules
    Rules,

    /// Serve the route table and JSON endpoints over HTTP
    Serve {
        /// Address to listen on (overrides the config file)
        #[arg(long)]
        addr: Option<SocketAddr>,
    },

    /// Add a show, season, episode, page or post
    Add {
        kind: PostKind,

        title: String,

        /// Slug to use instead of one derived from the title
        #[arg(long)]
        slug: Option<String>,

        /// Parent post id (a show for seasons and posts, a season for episodes)
        #[arg(long)]
        parent: Option<u64>,

        /// Air or publish date, YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Genre for a show (repeatable)
        #[arg(long = "genre")]
        genres: Vec<String>,

        /// Tag for a show (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Add a genre or tag
    AddTerm {
        taxonomy: Taxonomy,

        name: String,

        #[arg(long)]
        slug: Option<String>,
    },

    /// Set the About page of a show, or clear it when --page is omitted
    SetAbout {
        #[arg(long)]
        show: u64,

        #[arg(long)]
        page: Option<u64>,
    },

    /// Attach a season or post to a show
    AssignShow {
        #[arg(long)]
        post: u64,

        #[arg(long)]
        show: u64,
    },

    /// List posts with their show, slug and title
    List {
        #[arg(long, conflicts_with = "terms")]
        kind: Option<PostKind>,

        /// List genres and tags instead of posts
        #[arg(long)]
        terms: bool,
    },
}
