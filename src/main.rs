//! App Tags CLI
//!
//! Lists the built-in tag catalog, filters an inventory by the selected
//! tags, and prints the tags of a single package.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use app_tags::catalog::builtin_catalog;
use app_tags::expression::TagDetail;
use app_tags::icons::IconCache;
use app_tags::resolver::LoadContext;
use app_tags::selection::TagSettingsManager;
use app_tags::{
    EngineConfig, InventoryInspector, ResolutionEngine, SelectionStore, TagEvaluator, TriState, TriStateSelectable,
};

#[derive(Debug, Parser)]
#[command(
    name = "app_tags",
    disable_help_subcommand = true,
    about = "Tag apps by installer, framework and packaging traits",
    after_help = "Selections given with --select/--anti-select are applied on top of the settings file."
)]
struct Cli {
    #[arg(long, value_name = "PATH", default_value = "inventory.json", help = "JSON array of package records")]
    inventory: PathBuf,
    #[arg(long, value_name = "PATH", help = "Selected tag ids, created empty when missing")]
    settings: Option<PathBuf>,
    #[arg(long, value_name = "PATH", help = "Engine configuration, created with defaults when missing")]
    config: Option<PathBuf>,
    #[arg(long = "select", value_name = "TAG", help = "Select a tag, repeat as needed")]
    selected: Vec<String>,
    #[arg(long = "anti-select", value_name = "TAG", help = "Anti-select a tag, repeat as needed")]
    anti_selected: Vec<String>,
    #[arg(long, help = "Write the resulting selection back to the settings file")]
    persist: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every built-in tag
    Catalog,
    /// Print the packages passing the tag filter
    Filter,
    /// Print the tags that apply to one package, whatever the selection
    Tags { package: String },
    /// Print the tags of one package expressed under the selection
    Expressed { package: String },
    /// Print the activation of every tag for one package
    Details { package: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    app_tags::utils::init_logging("app_tags=info")?;
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_or_default(path)
            .await
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let catalog = Arc::new(builtin_catalog()?.available_on(&config.platform));

    if let Command::Catalog = cli.command {
        for tag in catalog.tags() {
            let label = tag.labels.full_label().unwrap_or("-");
            let requisites: Vec<&str> = tag.requisites.iter().map(|r| r.id()).collect();
            println!("{:<28} {:>4}  {:<36} {}", tag.id, tag.rank, label, requisites.join(","));
        }
        return Ok(());
    }

    let selection = Arc::new(SelectionStore::new(catalog.ids()));
    let settings = cli.settings.as_ref().map(|path| TagSettingsManager::new(path));
    if let Some(settings) = &settings {
        settings.apply_to(&selection).await?;
    }
    if !cli.selected.is_empty() || !cli.anti_selected.is_empty() {
        let mut states = selection.snapshot();
        for (ids, state) in [(&cli.selected, TriState::Selected), (&cli.anti_selected, TriState::AntiSelected)] {
            for id in ids {
                if catalog.get(id).is_none() {
                    anyhow::bail!(app_tags::TagError::UnknownTag(id.clone()));
                }
                states.insert(id.clone(), TriStateSelectable::new(id.as_str(), state));
            }
        }
        let delta = selection.replace_all(&states, false);
        info!("Selection from command line: {:?}", delta);
    }
    if let (true, Some(settings)) = (cli.persist, &settings) {
        settings.persist(&selection).await?;
    }

    let inspector = Arc::new(
        InventoryInspector::from_file(&cli.inventory)
            .await
            .with_context(|| format!("loading inventory {}", cli.inventory.display()))?,
    );
    let context = Arc::new(LoadContext::new(inspector.clone(), Arc::new(IconCache::new())));
    let engine = Arc::new(ResolutionEngine::new(catalog, selection, context, config));
    let evaluator = TagEvaluator::new(engine);

    match cli.command {
        Command::Catalog => {}
        Command::Filter => {
            let apps = inspector.apps();
            let mut passed = 0;
            for app in &apps {
                if evaluator.filter_tags(app).await {
                    println!("{}", app.package_name);
                    passed += 1;
                }
            }
            info!("{} of {} packages passed the tag filter", passed, apps.len());
        }
        Command::Tags { package } => {
            let app = inspector.app(&package)?;
            for tag in evaluator.activated_tags(&app).await {
                println!("{:<28} {:<24} {}", tag.tag_id, tag.label, serde_json::to_string(&tag.icon)?);
            }
        }
        Command::Expressed { package } => {
            let app = inspector.app(&package)?;
            for tag in evaluator.express_tags(&app).await {
                println!("{:<28} {:<24} {}", tag.tag_id, tag.label, serde_json::to_string(&tag.icon)?);
            }
        }
        Command::Details { package } => {
            let app = inspector.app(&package)?;
            evaluator
                .tag_details(&app, |detail: TagDetail| {
                    let mark = if detail.activated { "+" } else { "-" };
                    let value = detail.value.map(|v| format!(" = {}", v)).unwrap_or_default();
                    println!("{} {}{}", mark, detail.tag.id, value);
                    if let Some(description) = detail.description {
                        println!("    {}", description);
                    }
                })
                .await;
        }
    }
    Ok(())
}
