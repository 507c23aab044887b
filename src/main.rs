mod cli;
mod config;
mod domain;
mod infra;
mod routing;
mod server;

use anyhow::{bail, Result};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::Settings;
use domain::models::{NewPost, PostKind};
use infra::store::ContentStore;
use routing::permalink::PermalinkGenerator;
use routing::resolver::Resolver;
use routing::rules::RouteTable;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(content) = cli.content {
        settings.content_path = content;
    }

    let routes = settings.route_table()?;
    let mut store =
        ContentStore::load(&settings.content_path)?.with_reserved(routes.reserved_slugs().clone());

    match cli.command {
        Command::Resolve { path } => resolve(&store, &routes, &path),
        Command::Permalink { ids } => permalinks(&store, &settings, &ids),
        Command::Rules => {
            rules(&settings, &routes);
            Ok(())
        }
        Command::Serve { addr } => {
            let addr = addr.unwrap_or(settings.listen);
            let state = server::AppState::new(store, settings, routes);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(state, addr))
        }
        Command::Add {
            kind,
            title,
            slug,
            parent,
            date,
            genres,
            tags,
        } => {
            let post = store.insert_post(NewPost {
                kind,
                title,
                slug,
                parent,
                date,
                genres,
                tags,
            })?;
            let id = post.id;
            println!("Added {} {} ({})", post.kind, id, post.slug);
            print_permalink(&store, &settings, id);
            save(&store, &settings.content_path)
        }
        Command::AddTerm {
            taxonomy,
            name,
            slug,
        } => {
            let term = store.add_term(taxonomy, &name, slug.as_deref())?;
            println!("Added {} {} ({})", term.taxonomy, term.id, term.slug);
            save(&store, &settings.content_path)
        }
        Command::SetAbout { show, page } => {
            store.set_about_page(show, page)?;
            match page {
                Some(page) => {
                    println!("Page {page} is now the About page of show {show}");
                    print_permalink(&store, &settings, page);
                }
                None => println!("Cleared the About page of show {show}"),
            }
            save(&store, &settings.content_path)
        }
        Command::AssignShow { post, show } => {
            let slug = store.assign_show(post, show)?.slug.clone();
            println!("Post {post} now belongs to show {show} ({slug})");
            print_permalink(&store, &settings, post);
            save(&store, &settings.content_path)
        }
        Command::List { kind, terms } => {
            if terms {
                list_terms(&store);
            } else {
                list(&store, kind);
            }
            Ok(())
        }
    }
}

fn resolve(store: &ContentStore, routes: &RouteTable, path: &str) -> Result<()> {
    let (route, resolution) = Resolver::new(store, routes).resolve(path);

    match &route {
        Some(route) => println!("Matched rule: {}", route.rule),
        None => println!("No rule matched"),
    }
    println!("{}", serde_json::to_string_pretty(&resolution)?);

    if !resolution.is_found() {
        bail!("Nothing found at {path}");
    }
    Ok(())
}

fn permalinks(store: &ContentStore, settings: &Settings, ids: &[u64]) -> Result<()> {
    let links = PermalinkGenerator::new(store, settings);
    let mut missing = 0;

    for id in ids {
        match links.permalink_by_id(*id) {
            Some(url) => println!("{url}"),
            None => {
                eprintln!("Error: no permalink for post {id}");
                missing += 1;
            }
        }
    }

    if missing > 0 {
        bail!("{missing} of {} post(s) have no permalink", ids.len());
    }
    Ok(())
}

fn rules(settings: &Settings, routes: &RouteTable) {
    println!("Blog structure: {}", settings.blog_structure.as_str());
    for (i, rule) in routes.rules().iter().enumerate() {
        println!("{:>2}. {:<14} {}", i + 1, rule.name.to_string(), rule.pattern.as_str());
        println!("    e.g. {}", rule.example);
    }
}

fn list(store: &ContentStore, kind: Option<PostKind>) {
    for post in store
        .posts()
        .iter()
        .filter(|p| kind.map_or(true, |k| p.kind == k))
    {
        let show = match post.kind {
            PostKind::Show => "",
            _ => store
                .owning_show(post)
                .map(|s| s.title.as_str())
                .unwrap_or("-"),
        };
        println!(
            "{:>4}  {:<8} {:<24} {:<32} {}",
            post.id, post.kind.to_string(), show, post.slug, post.title
        );
    }
}

fn list_terms(store: &ContentStore) {
    for term in store.terms() {
        let shows = store.shows_with_any_term(term.taxonomy, &[term.slug.as_str()]);
        println!(
            "{:>4}  {:<8} {:<32} {:<24} {} show(s)",
            term.id,
            term.taxonomy.to_string(),
            term.slug,
            term.name,
            shows.len()
        );
    }
}

fn print_permalink(store: &ContentStore, settings: &Settings, id: u64) {
    let links = PermalinkGenerator::new(store, settings);
    if let Some(url) = links.permalink_by_id(id) {
        println!("Permalink: {url}");
    }
}

fn save(store: &ContentStore, path: &Path) -> Result<()> {
    store.save(path)?;
    tracing::debug!(path = %path.display(), "content saved");
    Ok(())
}
