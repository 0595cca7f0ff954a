//! Subcommand implementations

use std::io::{self, IsTerminal};
use std::path::Path;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use tokio::runtime::Runtime;

use crate::api::{ApiClient, Category, CategoryForm, Textbook};
use crate::cli::{CategoryArgs, CategoryCommand, ReadArgs, TopicArgs};
use crate::config::Config;
use crate::error::{ReaderError, Result};
use crate::highlight::Highlighter;
use crate::navigation::Route;
use crate::reader::{Reader, CONTINUE_LABEL, START_LABEL, TOPIC_ERROR};
use crate::render::{RenderOptions, TopicRenderer};
use crate::session::Session;

/// Width used when stdout is not a terminal
const DEFAULT_WIDTH: usize = 80;

pub fn runtime() -> Result<Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

pub fn run_read(config: &Config, session: &Session, args: &ReadArgs) -> Result<()> {
    let rt = runtime()?;
    let api = ApiClient::new(&config.api_url, session)?;

    let start = match (&args.textbook_id, args.topic) {
        (Some(id), Some(index)) => Route::topic(id.clone(), index),
        (Some(id), None) => Route::book(id.clone()),
        (None, _) => Route::Library,
    };
    tracing::info!(api = %api.base_url(), route = %start, "starting reader");

    let mut reader = Reader::new(config, api, rt.handle().clone())?;
    reader.run(start)
}

pub fn run_library(config: &Config, session: &Session) -> Result<()> {
    let rt = runtime()?;
    let api = ApiClient::new(&config.api_url, session)?;

    rt.block_on(async {
        let (categories, textbooks) = tokio::try_join!(api.categories(), api.textbooks())?;

        // Progress is optional: signed out or a failed profile just omits it
        let user_id = if api.is_signed_in() {
            match api.profile().await {
                Ok(profile) => Some(profile.id),
                Err(e) => {
                    tracing::warn!(error = %e, "profile unavailable");
                    None
                }
            }
        } else {
            None
        };

        for category in &categories {
            let books: Vec<&Textbook> = textbooks
                .iter()
                .filter(|b| b.category.as_deref() == Some(category.id.as_str()))
                .collect();
            print_category(&api, category, &books, user_id.as_deref()).await;
        }
        Ok::<(), ReaderError>(())
    })
}

async fn print_category(api: &ApiClient, category: &Category, books: &[&Textbook], user_id: Option<&str>) {
    println!("{}", category.name);
    if !category.description.is_empty() {
        println!("{}", category.description);
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Учебник"),
        header_cell("ID"),
        header_cell("Темы"),
        header_cell(""),
    ]);
    apply_table_style(&mut table);

    for book in books {
        let status = match user_id {
            Some(user_id) => match api.progress_exists(user_id, &book.id).await {
                Ok(true) => CONTINUE_LABEL,
                Ok(false) => START_LABEL,
                Err(e) => {
                    tracing::warn!(textbook = %book.id, error = %e, "progress check failed");
                    START_LABEL
                }
            },
            None => START_LABEL,
        };
        table.add_row(vec![
            Cell::new(&book.title),
            Cell::new(&book.id),
            Cell::new(book.topics.len()),
            Cell::new(status),
        ]);
    }
    println!("{table}\n");
}

pub fn run_topic(config: &Config, session: &Session, args: &TopicArgs) -> Result<()> {
    let rt = runtime()?;
    let api = ApiClient::new(&config.api_url, session)?;

    let topic = rt
        .block_on(api.topic(&args.textbook_id, args.index))
        .map_err(|e| {
            tracing::error!(error = %e, "failed to fetch topic");
            ReaderError::Message(format!("{TOPIC_ERROR} ({e})"))
        })?;

    let tty = io::stdout().is_terminal();
    let width = args.width.unwrap_or_else(|| terminal_width(config, tty));

    let highlighter = Highlighter::new(&config.code_language);
    let options = RenderOptions {
        width,
        line_numbers: config.show_line_numbers,
        tab_width: config.tab_width,
        copied: None,
        selected: None,
    };
    tracing::debug!(language = ?highlighter.language(), width, "rendering topic");
    let rendered = TopicRenderer::new(&highlighter, options).render(&topic);

    if args.plain || !tty {
        println!("{}", rendered.to_plain());
    } else {
        println!("{}", rendered.to_ansi());
    }
    Ok(())
}

fn terminal_width(config: &Config, tty: bool) -> usize {
    let cols = if tty {
        crossterm::terminal::size()
            .map(|(cols, _)| cols as usize)
            .unwrap_or(DEFAULT_WIDTH)
    } else {
        DEFAULT_WIDTH
    };
    match config.wrap_width {
        0 => cols,
        w => w.min(cols),
    }
}

pub fn run_login(session: &mut Session, token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(ReaderError::Message("token must not be empty".to_string()));
    }
    session.login(token)?;
    match session.path() {
        Some(path) => println!("Signed in; token stored in {}", path.display()),
        None => println!("Signed in"),
    }
    Ok(())
}

pub fn run_logout(session: &mut Session) -> Result<()> {
    session.logout()?;
    println!("Signed out");
    Ok(())
}

pub fn run_rate(config: &Config, session: &Session, textbook_id: &str, rating: u8) -> Result<()> {
    let rt = runtime()?;
    let api = ApiClient::new(&config.api_url, session)?;
    rt.block_on(api.rate(textbook_id, rating))?;
    println!("{} {}", "★".repeat(rating as usize), "☆".repeat(5 - rating as usize));
    Ok(())
}

pub fn run_categories(config: &Config, session: &Session, command: &CategoryCommand) -> Result<()> {
    let rt = runtime()?;
    let api = ApiClient::new(&config.api_url, session)?;

    rt.block_on(async {
        require_admin(&api).await?;

        match command {
            CategoryCommand::List => {
                let categories = api.admin_categories().await?;
                print_categories(&api, &categories);
            }
            CategoryCommand::Add(fields) => {
                api.create_category(&category_form(fields)).await?;
                println!("Category \"{}\" created", fields.name);
            }
            CategoryCommand::Edit { id, fields } => {
                api.update_category(id, &category_form(fields)).await?;
                println!("Category {id} updated");
            }
            CategoryCommand::Delete { id } => {
                api.delete_category(id).await?;
                println!("Category {id} deleted");
            }
        }
        Ok::<(), ReaderError>(())
    })
}

/// Role check; a rejected token counts as "not an admin"
async fn require_admin(api: &ApiClient) -> Result<()> {
    match api.is_admin().await {
        Ok(true) => Ok(()),
        Ok(false) => Err(ReaderError::NotAdmin),
        Err(e) if e.is_status(401) || e.is_status(403) => Err(ReaderError::NotAdmin),
        Err(e) => Err(e),
    }
}

fn category_form(fields: &CategoryArgs) -> CategoryForm {
    CategoryForm {
        name: fields.name.clone(),
        description: fields.description.clone(),
        image: fields.image.clone(),
    }
}

fn print_categories(api: &ApiClient, categories: &[Category]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("ID"),
        header_cell("Name"),
        header_cell("Description"),
        header_cell("Image"),
    ]);
    apply_table_style(&mut table);
    for category in categories {
        table.add_row(vec![
            Cell::new(&category.id),
            Cell::new(&category.name),
            Cell::new(&category.description),
            Cell::new(
                category
                    .image
                    .as_deref()
                    .map(|path| api.asset_url(path))
                    .unwrap_or_default(),
            ),
        ]);
    }
    println!("{table}");
}

pub fn run_config(config: &Config, path: Option<&Path>, init: bool) -> Result<()> {
    if init {
        let path = match path {
            Some(path) => {
                config.save_to(path)?;
                path.to_path_buf()
            }
            None => config.save()?,
        };
        println!("Wrote {}", path.display());
        return Ok(());
    }
    if let Some(path) = path {
        println!("# {}", path.display());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
