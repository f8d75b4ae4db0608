use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use anyhow::{bail, Context};
use clap::Parser;

mod app;
mod backup;
mod cli;
mod config;
mod eid;
mod metadata;
mod scrape;
mod store;
#[cfg(test)]
mod tests;
mod videos;
mod web;

use app::App;
use config::Config;
use inquire::error::InquireResult;
use videos::SearchQuery;

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let home = homedir::my_home()
        .context("couldn't determine home directory")?
        .context("no home directory for current user")?;
    Ok(home.join(".koleks"))
}

fn confirm(message: &str) -> anyhow::Result<bool> {
    match inquire::prompt_confirmation(message) {
        InquireResult::Ok(answer) => Ok(answer),
        InquireResult::Err(err) => bail!("An error occurred: {}", err),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = cli::Args::parse();

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    let config = Arc::new(RwLock::new(Config::load_with(&data_dir)?));
    let store = Arc::new(store::BackendJson::load(&data_dir.join("collection.json"))?);
    let app = Arc::new(App::new(store, config.clone()));

    match args.command {
        cli::Command::Daemon { addr } => {
            web::start_daemon(app, &addr);
            Ok(())
        }

        cli::Command::Add {
            url,
            title,
            category,
            notes,
            favorite,
            no_meta,
        } => {
            let create = videos::VideoCreate {
                url,
                title,
                category_id: category,
                notes,
                is_favorite: favorite,
                ..Default::default()
            };

            let video = app.create_video(create, no_meta)?;
            println!("{}", serde_json::to_string_pretty(&video).unwrap());
            Ok(())
        }

        cli::Command::Meta { url, scrape } => {
            if scrape {
                let meta = app.scrape_meta(&url);
                println!("{}", serde_json::to_string_pretty(&meta).unwrap());
            } else {
                match app.fetch_meta(&url) {
                    Some(meta) => println!("{}", serde_json::to_string_pretty(&meta).unwrap()),
                    None => println!("No usable metadata found for {url}"),
                }
            }
            Ok(())
        }

        cli::Command::Search {
            title,
            category,
            platform,
            favorite,
            exact,
            count,
        } => {
            let query = SearchQuery {
                title,
                category_id: category,
                platform,
                favorite: if favorite { Some(true) } else { None },
                exact,
                ..Default::default()
            };

            let found = app.search(query)?;

            if count {
                println!("{} videos found", found.len());
                return Ok(());
            }

            println!("{}", serde_json::to_string_pretty(&found).unwrap());
            Ok(())
        }

        cli::Command::Favorite { id } => {
            let video = app.toggle_favorite(&id)?;
            println!("{}", serde_json::to_string_pretty(&video).unwrap());
            Ok(())
        }

        cli::Command::Move { ids, category } => {
            let count = app.move_videos(&ids, category.as_deref())?;
            println!("{count} videos moved");
            Ok(())
        }

        cli::Command::Delete { ids, yes } => {
            if !yes
                && !confirm(&format!(
                    "Are you sure you want to delete {} videos?",
                    ids.len()
                ))?
            {
                return Ok(());
            }

            let count = app.delete_videos(&ids)?;
            println!("{count} videos removed");
            Ok(())
        }

        cli::Command::Category { action } => match action {
            cli::CategoryArgs::Add { name, emoji, color } => {
                let category = app.create_category(videos::CategoryCreate { name, emoji, color })?;
                println!("{}", serde_json::to_string_pretty(&category).unwrap());
                Ok(())
            }
            cli::CategoryArgs::List {} => {
                let categories = app.list_categories()?;
                println!("{}", serde_json::to_string_pretty(&categories).unwrap());
                Ok(())
            }
            cli::CategoryArgs::Update {
                id,
                name,
                emoji,
                color,
            } => {
                let category =
                    app.update_category(&id, videos::CategoryUpdate { name, emoji, color })?;
                println!("{}", serde_json::to_string_pretty(&category).unwrap());
                Ok(())
            }
            cli::CategoryArgs::Delete { id, yes } => {
                if !yes
                    && !confirm(
                        "Delete this category? Its videos will become uncategorized.",
                    )?
                {
                    return Ok(());
                }

                app.delete_category(&id)?;
                println!("category removed");
                Ok(())
            }
            cli::CategoryArgs::Lock { id, pin } => {
                let category = app.lock_category(&id, pin)?;
                println!("{}", serde_json::to_string_pretty(&category).unwrap());
                Ok(())
            }
            cli::CategoryArgs::Unlock { id } => {
                let category = app.unlock_category(&id)?;
                println!("{}", serde_json::to_string_pretty(&category).unwrap());
                Ok(())
            }
        },

        cli::Command::Export { output } => {
            let (file_name, json) = app.export_backup()?;
            let path = output.unwrap_or_else(|| PathBuf::from(file_name));

            std::fs::write(&path, json)
                .with_context(|| format!("couldn't write {}", path.display()))?;

            println!("Backup written to {}", path.display());
            Ok(())
        }

        cli::Command::Import { input, yes } => {
            let json = std::fs::read_to_string(&input)
                .with_context(|| format!("couldn't read {}", input.display()))?;

            if !yes
                && !confirm(
                    "Restoring will permanently REPLACE your entire collection. Are you really sure?",
                )?
            {
                return Ok(());
            }

            let bar = indicatif::ProgressBar::new(100);
            let summary = app.import_backup(&json, |pct| bar.set_position(pct as u64))?;
            bar.finish_and_clear();

            println!(
                "Restored {} categories and {} videos",
                summary.categories_restored, summary.videos_restored
            );
            Ok(())
        }
    }
}
