use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;

use strata_core::provider::{Provider, ResourceType};
use strata_core::resource::{Resource, ResourceId, State, Value};
use strata_core::schema::{AttributeSchema, AttributeType};
use strata_provider_azurerm::services::registrations;
use strata_provider_azurerm::{AzureRmProvider, ProviderConfig};

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Drive single Azure Resource Manager provider operations", long_about = None)]
struct Cli {
    /// JSON file with provider settings (subscription_id, client_id, timeouts, ...)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List service registrations and their resource types
    Registrations,
    /// Show the attributes of a resource type
    Schema {
        resource_type: String,

        /// Show the data source of that name
        #[arg(long)]
        data_source: bool,
    },
    /// Validate resource documents against their schemas
    Validate { file: PathBuf },
    /// Read a resource by its identifier
    Read {
        resource_type: String,
        identifier: String,
    },
    /// Create resources, or update the one at --identifier
    Apply {
        file: PathBuf,

        /// Identifier of an existing resource to update
        #[arg(long)]
        identifier: Option<String>,
    },
    /// Delete a resource by its identifier
    Delete {
        resource_type: String,
        identifier: String,
    },
    /// Check whether a resource exists
    Exists {
        resource_type: String,
        identifier: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Registrations => run_registrations(),
        Commands::Schema {
            resource_type,
            data_source,
        } => run_schema(&resource_type, data_source),
        Commands::Validate { file } => run_validate(&file),
        Commands::Read {
            resource_type,
            identifier,
        } => run_read(cli.config.as_deref(), &resource_type, &identifier).await,
        Commands::Apply { file, identifier } => {
            run_apply(cli.config.as_deref(), &file, identifier.as_deref()).await
        }
        Commands::Delete {
            resource_type,
            identifier,
        } => run_delete(cli.config.as_deref(), &resource_type, &identifier).await,
        Commands::Exists {
            resource_type,
            identifier,
        } => run_exists(cli.config.as_deref(), &resource_type, &identifier).await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_provider(config: Option<&Path>) -> Result<AzureRmProvider> {
    let attributes = match config {
        Some(path) => {
            log::debug!("Loading provider settings from {}", path.display());
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let json: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            match Value::from_json(&json) {
                Some(Value::Map(map)) => map,
                _ => bail!("{} must contain a JSON object", path.display()),
            }
        }
        None => HashMap::new(),
    };
    let config = ProviderConfig::from_attributes(&attributes)?;
    Ok(AzureRmProvider::new(config)?)
}

/// Resource documents from a file holding one document or an array of them
fn load_resources(file: &Path) -> Result<Vec<Resource>> {
    let content =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    let documents = match json {
        serde_json::Value::Array(items) => items,
        document => vec![document],
    };
    log::debug!("{} resource document(s) in {}", documents.len(), file.display());
    documents
        .iter()
        .map(|document| Resource::from_document(document).map_err(anyhow::Error::from))
        .collect()
}

fn find_type(type_name: &str, data_source: bool) -> Option<Box<dyn ResourceType>> {
    registrations()
        .into_iter()
        .flat_map(|r| {
            if data_source {
                r.data_sources()
            } else {
                r.resources()
            }
        })
        .find(|t| t.name() == type_name)
}

fn validate_resources(resources: &[Resource]) -> Result<()> {
    let mut all_errors = Vec::new();

    for resource in resources {
        let Some(resource_type) =
            find_type(&resource.id.resource_type, resource.is_data_source())
        else {
            all_errors.push(format!("{}: unknown resource type", resource.id));
            continue;
        };
        if let Err(errors) = resource_type.schema().validate(&resource.attributes) {
            for error in errors {
                all_errors.push(format!("{}: {}", resource.id, error));
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(anyhow!(all_errors.join("\n")))
    }
}

fn type_label(attr_type: &AttributeType) -> String {
    match attr_type {
        AttributeType::String => "string".to_string(),
        AttributeType::Int => "int".to_string(),
        AttributeType::Float => "float".to_string(),
        AttributeType::Bool => "bool".to_string(),
        AttributeType::Enum(variants) => variants.join(" | "),
        AttributeType::Custom { name, .. } => name.clone(),
        AttributeType::List(inner) => format!("list({})", type_label(inner)),
        AttributeType::Map(inner) => format!("map({})", type_label(inner)),
        AttributeType::Block(_) => "block".to_string(),
    }
}

fn print_attributes<'a>(attributes: impl Iterator<Item = &'a AttributeSchema>, depth: usize) {
    let mut attributes: Vec<_> = attributes.collect();
    attributes.sort_by(|a, b| a.name.cmp(&b.name));

    for attribute in attributes {
        let mut flags = Vec::new();
        if attribute.required {
            flags.push("required".yellow().to_string());
        }
        if attribute.computed {
            flags.push("computed".cyan().to_string());
        }
        if attribute.force_new {
            flags.push("force new".red().to_string());
        }
        println!(
            "{}{} {} {}",
            "  ".repeat(depth + 1),
            attribute.name.bold(),
            type_label(&attribute.attr_type).dimmed(),
            flags.join(", ")
        );
        if let AttributeType::Block(block) = &attribute.attr_type {
            print_attributes(block.attributes.values(), depth + 1);
        }
    }
}

fn state_json(state: &State) -> serde_json::Value {
    let attributes: serde_json::Map<String, serde_json::Value> = state
        .attributes
        .iter()
        .filter_map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
        .collect();
    serde_json::json!({
        "identifier": state.identifier,
        "exists": state.exists,
        "attributes": attributes,
    })
}

fn print_state(state: &State) {
    println!("{:#}", state_json(state));
}

fn run_registrations() -> Result<()> {
    for registration in registrations() {
        println!(
            "{} {}",
            registration.name().bold(),
            format!("[{}]", registration.website_categories().join(", ")).dimmed()
        );
        for resource in registration.resources() {
            println!("  {} {}", "resource".green(), resource.name());
        }
        for data_source in registration.data_sources() {
            println!("  {} {}", "data".cyan(), data_source.name());
        }
    }
    Ok(())
}

fn run_schema(type_name: &str, data_source: bool) -> Result<()> {
    let resource_type = find_type(type_name, data_source)
        .ok_or_else(|| anyhow!("Unknown resource type: {}", type_name))?;
    let schema = resource_type.schema();

    println!("{}", schema.resource_type.bold());
    if let Some(description) = &schema.description {
        println!("  {}", description);
    }
    print_attributes(schema.attributes.values(), 0);
    for group in &schema.exactly_one_of {
        println!("  exactly one of: {}", group.join(", "));
    }
    Ok(())
}

fn run_validate(file: &Path) -> Result<()> {
    let resources = load_resources(file)?;
    validate_resources(&resources)?;
    println!(
        "{} {} resource(s) valid",
        "✓".green().bold(),
        resources.len()
    );
    Ok(())
}

async fn run_read(config: Option<&Path>, type_name: &str, identifier: &str) -> Result<()> {
    let provider = load_provider(config)?;
    let id = ResourceId::new(type_name, "cli");
    let state = provider.read(&id, Some(identifier)).await?;
    if !state.exists {
        println!("{} {} does not exist", "!".yellow().bold(), identifier);
    }
    print_state(&state);
    Ok(())
}

async fn run_apply(config: Option<&Path>, file: &Path, identifier: Option<&str>) -> Result<()> {
    let resources = load_resources(file)?;
    validate_resources(&resources)?;
    if identifier.is_some() && resources.len() != 1 {
        bail!("--identifier needs exactly one resource document");
    }
    let provider = load_provider(config)?;

    for resource in &resources {
        let state = if resource.is_data_source() {
            provider.read_data_source(resource).await?
        } else if let Some(identifier) = identifier {
            let current = provider.read(&resource.id, Some(identifier)).await?;
            if !current.exists {
                bail!("{} does not exist", identifier);
            }
            println!("{} {}", "~".yellow().bold(), resource.id);
            provider
                .update(&resource.id, identifier, &current, resource)
                .await?
        } else {
            println!("{} {}", "+".green().bold(), resource.id);
            provider.create(resource).await?
        };
        print_state(&state);
    }
    Ok(())
}

async fn run_delete(config: Option<&Path>, type_name: &str, identifier: &str) -> Result<()> {
    let provider = load_provider(config)?;
    let id = ResourceId::new(type_name, "cli");
    provider.delete(&id, identifier).await?;
    println!("{} {}", "-".red().bold(), identifier);
    Ok(())
}

async fn run_exists(config: Option<&Path>, type_name: &str, identifier: &str) -> Result<()> {
    let provider = load_provider(config)?;
    let exists = provider.exists(type_name, identifier).await?;
    println!("{}", exists);
    if !exists {
        std::process::exit(2);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use strata_core::resource::Attributes;

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_single_documents_and_arrays() {
        let single = write_file(
            r#"{"type": "palo_alto_local_rulestack", "name": "test", "attributes": {"name": "lrs"}}"#,
        );
        let resources = load_resources(single.path()).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].attributes.get_str("name"), Some("lrs"));

        let array = write_file(
            r#"[{"type": "a", "name": "one"}, {"type": "b", "name": "two", "data_source": true}]"#,
        );
        let resources = load_resources(array.path()).unwrap();
        assert_eq!(resources.len(), 2);
        assert!(resources[1].is_data_source());
    }

    #[test]
    fn validation_reports_each_resource() {
        let file = write_file(
            r#"[
                {"type": "palo_alto_local_rulestack", "name": "ok",
                 "attributes": {"name": "lrs", "resource_group_name": "rg", "location": "westeurope"}},
                {"type": "palo_alto_local_rulestack", "name": "bad", "attributes": {"name": "lrs"}},
                {"type": "azurerm_nothing", "name": "x"}
            ]"#,
        );
        let resources = load_resources(file.path()).unwrap();
        let message = validate_resources(&resources).unwrap_err().to_string();
        assert!(!message.contains("palo_alto_local_rulestack.ok"));
        assert!(message.contains("palo_alto_local_rulestack.bad"));
        assert!(message.contains("azurerm_nothing.x: unknown resource type"));
    }

    #[test]
    fn data_sources_validate_against_their_own_schema() {
        let lookup = Resource::new("palo_alto_local_rulestack", "lookup")
            .with_read_only(true)
            .with_attribute("name", Value::String("lrs".to_string()))
            .with_attribute("resource_group_name", Value::String("rg".to_string()));
        assert!(validate_resources(&[lookup]).is_ok());
    }

    #[test]
    fn type_labels_nest() {
        assert_eq!(
            type_label(&AttributeType::list_of(AttributeType::list_of(AttributeType::Float))),
            "list(list(float))"
        );
        assert!(find_type("palo_alto_local_rulestack", true).is_some());
        assert!(find_type("eventgrid_event_subscription", true).is_none());
    }

    #[test]
    fn broken_files_are_errors() {
        let file = write_file("{not json");
        assert!(load_resources(file.path()).is_err());
        let file = write_file(r#"{"name": "missing type"}"#);
        assert!(load_resources(file.path()).is_err());
    }
}
