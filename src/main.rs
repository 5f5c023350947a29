//! Command-line front end.
//! Usage:
//!   cineverse popular [pages]
//!   cineverse search <query...>
//!   cineverse details <tmdb_id>
//!   cineverse favorites [title-asc|title-desc|rating-desc|rating-asc]
//!   cineverse favorite <tmdb_id>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{anyhow, bail, Context, Result};
use cineverse::app::App;
use cineverse::config::Config;
use cineverse::favorites::SortOrder;
use cineverse::models::Movie;
use cineverse::tmdb::ImageSize;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Popular { pages: u32 },
    Search { query: String },
    Details { id: i64 },
    Favorites { order: SortOrder },
    Favorite { id: i64 },
    Help,
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };
        match name.as_str() {
            "popular" => {
                let pages = match rest.first() {
                    Some(raw) => raw.parse().context("pages must be a positive number")?,
                    None => 1,
                };
                if pages == 0 {
                    bail!("pages must be a positive number");
                }
                Ok(Command::Popular { pages })
            }
            "search" => {
                let query = rest.join(" ");
                if query.trim().is_empty() {
                    bail!("search needs a query");
                }
                Ok(Command::Search { query })
            }
            "details" => Ok(Command::Details { id: parse_id(rest)? }),
            "favorites" => Ok(Command::Favorites {
                order: match rest.first() {
                    Some(raw) => SortOrder::from_str(raw)?,
                    None => SortOrder::default(),
                },
            }),
            "favorite" => Ok(Command::Favorite { id: parse_id(rest)? }),
            "help" | "-h" | "--help" => Ok(Command::Help),
            other => Err(anyhow!("unknown command '{}'", other)),
        }
    }
}

fn parse_id(rest: &[String]) -> Result<i64> {
    rest.first()
        .ok_or_else(|| anyhow!("missing movie id"))?
        .parse()
        .context("movie id must be numeric")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG may come from .env, so load it before the subscriber.
    let loaded = dotenv();
    init_tracing();
    match loaded {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    if command == Command::Help {
        print_usage();
        return Ok(());
    }

    let config = Config::from_env()?;
    let app = App::from_config(&config)?;
    run(&app, command).await
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Popular { pages } => {
            app.load_popular().await;
            loop {
                let state = app.popular.state();
                if state.error.is_some() || state.page >= pages {
                    break;
                }
                if !app.popular.load_more().await {
                    break;
                }
            }
            let state = app.popular.state();
            if let Some(err) = state.error {
                bail!(err);
            }
            println!(
                "Popular movies (page {} of {})",
                state.page, state.total_pages
            );
            print_movies(app, &state.items).await;
        }
        Command::Search { query } => {
            app.suggestions.set_query(query.as_str()).await;
            let suggestions = app.suggestions.state().suggestions;
            if !suggestions.is_empty() {
                println!("Suggestions:");
                for movie in &suggestions {
                    println!(
                        "  {} ({})",
                        movie.title,
                        cineverse::view::release_year(movie)
                            .map(|y| y.to_string())
                            .unwrap_or_else(|| "-".to_string())
                    );
                }
            }
            app.open_results(&query).await;
            let state = app.results.state();
            if let Some(err) = state.error {
                bail!(err);
            }
            println!("Results for \"{}\" ({} found)", query.trim(), state.items.len());
            print_movies(app, &state.items).await;
        }
        Command::Details { id } => {
            let details = app.movie_details(id).await.map_err(|e| anyhow!(e))?;
            let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
            println!("{} [{}]", details.title, details.id);
            println!("  Rating:   {:.1}", details.vote_average);
            if let Some(date) = details.release_date {
                println!("  Released: {}", date.format("%d/%m/%Y"));
            }
            if let Some(runtime) = details.runtime.filter(|r| *r > 0) {
                println!("  Runtime:  {} min", runtime);
            }
            println!("  Genres:   {}", genres.join(", "));
            println!(
                "  Poster:   {}",
                app.poster_url(details.poster_path.as_deref(), ImageSize::W780)
            );
            println!(
                "  Favorite: {}",
                if app.favorites.contains(details.id) { "yes" } else { "no" }
            );
            if !details.overview.is_empty() {
                println!();
                println!("{}", details.overview);
            }
        }
        Command::Favorites { order } => {
            let movies = app.favorites.sorted(order);
            if movies.is_empty() {
                println!("No favorite movies yet.");
                return Ok(());
            }
            println!("My favorites ({})", movies.len());
            print_movies(app, &movies).await;
        }
        Command::Favorite { id } => {
            let details = app.movie_details(id).await.map_err(|e| anyhow!(e))?;
            let now_favorite = app.toggle_favorite(&details.to_movie())?;
            if now_favorite {
                println!("Added '{}' to favorites", details.title);
            } else {
                println!("Removed '{}' from favorites", details.title);
            }
        }
        Command::Help => print_usage(),
    }
    Ok(())
}

async fn print_movies(app: &App, movies: &[Movie]) {
    for movie in movies {
        let card = app.card(movie).await;
        println!(
            "{}{} [{}] {} | {} | {} | {}",
            if card.favorite { "♥ " } else { "  " },
            card.title,
            card.id,
            card.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()),
            card.rating,
            card.genre,
            card.certification
        );
    }
}

fn print_usage() {
    println!("cineverse popular [pages]");
    println!("cineverse search <query...>");
    println!("cineverse details <tmdb_id>");
    println!("cineverse favorites [title-asc|title-desc|rating-desc|rating-asc]");
    println!("cineverse favorite <tmdb_id>");
}
