use std::sync::Arc;

use anyhow::{bail, Context, Result};
use app_core::{
    CatalogController, CatalogView, EditorController, EditorTarget, FieldEdit, Notice,
    PetRepository, SaveOutcome,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use shared::{
    domain::{Gender, Pet, PetId},
    uri::PetUri,
};
use storage::PetStore;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, normalize_database_url};

#[derive(Parser, Debug)]
#[command(name = "pets", about = "Keep a catalog of pets in a local SQLite store")]
struct Cli {
    /// Overrides the configured database, e.g. `sqlite://./data/pets.db`.
    #[arg(long)]
    database_url: Option<String>,
    /// Print machine-readable output.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every pet.
    List,
    /// Show one pet, by id or `content://` uri.
    Show { target: String },
    /// Add a pet. A blank pet is not saved.
    Add(PetArgs),
    /// Change fields of an existing pet.
    Edit {
        target: String,
        #[command(flatten)]
        fields: PetArgs,
    },
    /// Delete one pet.
    Delete { target: String },
    /// Delete every pet.
    DeleteAll,
    /// Insert a sample pet.
    Seed,
}

#[derive(Args, Debug, Default)]
struct PetArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    breed: Option<String>,
    /// `unknown`, `male`, `female` or the numeric code 0-2.
    #[arg(long)]
    gender: Option<Gender>,
    /// Whole number; anything else is stored as 0.
    #[arg(long)]
    weight: Option<String>,
}

impl PetArgs {
    fn into_edits(self) -> Vec<FieldEdit> {
        let mut edits = Vec::new();
        if let Some(name) = self.name {
            edits.push(FieldEdit::Name(name));
        }
        if let Some(breed) = self.breed {
            edits.push(FieldEdit::Breed(breed));
        }
        if let Some(gender) = self.gender {
            edits.push(FieldEdit::Gender(gender));
        }
        if let Some(weight) = self.weight {
            edits.push(FieldEdit::Weight(weight));
        }
        edits
    }
}

#[derive(Serialize)]
struct ListEntry<'a> {
    id: i64,
    uri: String,
    name: &'a str,
    breed: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let raw_database_url = cli
        .database_url
        .as_deref()
        .unwrap_or(settings.database_url.as_str());
    let database_url = normalize_database_url(raw_database_url);
    let store = PetStore::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open pet store; verify the path and its permissions"
        );
        error
    })?;
    let repo: Arc<dyn PetRepository> = Arc::new(store);

    run(cli.command, repo, cli.json).await
}

async fn run(command: Command, repo: Arc<dyn PetRepository>, json: bool) -> Result<()> {
    match command {
        Command::List => {
            let mut catalog = CatalogController::new(repo);
            catalog.activate();
            catalog.wait_loaded().await.context("failed to load pets")?;

            let items = catalog.items();
            if json {
                let entries: Vec<_> = items
                    .iter()
                    .map(|item| ListEntry {
                        id: item.id.0,
                        uri: PetUri::with_appended_id(item.id).to_string(),
                        name: &item.title,
                        breed: &item.subtitle,
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if let CatalogView::List(items) = catalog.view() {
                for item in items {
                    println!("{:>5}  {}\n       {}", item.id.0, item.title, item.subtitle);
                }
            } else {
                println!("No pets yet. Add one with `pets add --name <NAME>`.");
            }
            catalog.teardown();
        }
        Command::Show { target } => {
            let id = parse_target(&target)?;
            let editor = EditorController::open(repo, EditorTarget::Edit(id)).await?;
            let pet = Pet {
                id,
                fields: editor.form().to_fields(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&pet)?);
            } else {
                println!("{} ({})", editor.title(), PetUri::with_appended_id(id));
                println!("  name:   {}", pet.fields.name);
                println!("  breed:  {}", pet.display_breed());
                println!("  gender: {}", pet.fields.gender.label());
                println!("  weight: {}", pet.fields.weight);
            }
        }
        Command::Add(fields) => {
            let mut editor = EditorController::open(repo, EditorTarget::Create).await?;
            for edit in fields.into_edits() {
                editor.edit(edit);
            }
            report_save(editor.save().await)?;
        }
        Command::Edit { target, fields } => {
            let id = parse_target(&target)?;
            let mut editor = EditorController::open(repo, EditorTarget::Edit(id)).await?;
            for edit in fields.into_edits() {
                editor.edit(edit);
            }
            if !editor.is_dirty() {
                println!("No changes");
                return Ok(());
            }
            report_save(editor.save().await)?;
        }
        Command::Delete { target } => {
            let id = parse_target(&target)?;
            let mut editor = EditorController::open(repo, EditorTarget::Edit(id)).await?;
            if let Some(notice) = editor.delete().await {
                report(notice)?;
            }
        }
        Command::DeleteAll => {
            let catalog = CatalogController::new(repo);
            report(catalog.delete_all_pets().await)?;
        }
        Command::Seed => {
            let catalog = CatalogController::new(repo);
            report(catalog.insert_dummy_pet().await)?;
        }
    }

    Ok(())
}

fn report_save(outcome: SaveOutcome) -> Result<()> {
    match outcome.notice() {
        Some(notice) => report(notice),
        None => {
            println!("Nothing to save");
            Ok(())
        }
    }
}

fn report(notice: Notice) -> Result<()> {
    if notice.is_error() {
        bail!("{notice}");
    }
    println!("{notice}");
    Ok(())
}

/// Accepts a bare id or a pet uri.
fn parse_target(raw: &str) -> Result<PetId> {
    if let Ok(id) = raw.trim().parse::<i64>() {
        if id <= 0 {
            bail!("pet ids start at 1, got {id}");
        }
        return Ok(PetId(id));
    }

    let uri: PetUri = raw.parse()?;
    uri.id()
        .with_context(|| format!("'{raw}' addresses every pet, not a single one"))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
