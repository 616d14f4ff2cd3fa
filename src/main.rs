use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postflow::config::{Config, OutputFormat};
use postflow::templates::TemplateRegistry;
use postflow::workflow::{
    is_yaml_path, parse_workflow, parse_workflow_file, parse_workflow_yaml, to_json, to_yaml,
    validate, validate_document, ValidationReport, WorkflowDocument, WorkflowGraph,
};

#[derive(Parser)]
#[command(name = "postflow")]
#[command(about = "Generate and validate post-triggered workflow graphs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect workflow templates
    Templates {
        #[command(subcommand)]
        action: TemplateActions,
    },
    /// Build a workflow graph from a template, validate it, and print it
    Generate(GenerateArgs),
    /// Validate a workflow graph (JSON or YAML) from a file or stdin
    Validate {
        /// Path to workflow file, or "-" for stdin
        file: Option<String>,
        /// Treat stdin as YAML
        #[arg(long)]
        yaml: bool,
        /// Print the validation report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
enum TemplateActions {
    /// List available workflow templates
    List {
        /// Show templates by category
        #[arg(long)]
        by_category: bool,
    },
    /// Show details of a specific template
    Show {
        /// Template name
        name: String,
    },
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Template name
    template: String,
    /// Slack channel (slack-notification)
    #[arg(long)]
    channel: Option<String>,
    /// Message text (slack-notification)
    #[arg(long)]
    message: Option<String>,
    /// Webhook URL (webhook-forward)
    #[arg(long)]
    url: Option<String>,
    /// HTTP method (webhook-forward)
    #[arg(long)]
    method: Option<String>,
    /// Positive sentiment channel (sentiment-filter)
    #[arg(long)]
    positive_channel: Option<String>,
    /// Negative sentiment channel (sentiment-filter)
    #[arg(long)]
    negative_channel: Option<String>,
    /// CRM: hubspot, salesforce or attio (lead-enrich)
    #[arg(long)]
    crm: Option<String>,
    /// Slack channel for the summary (competitor-engagement)
    #[arg(long)]
    slack_channel: Option<String>,
    /// Extra parameter values (key=value)
    #[arg(short, long = "param", value_parser = parse_var)]
    params: Vec<(String, String)>,
    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<String>,
    /// Output format (defaults to config)
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Json,
    Yaml,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Yaml => OutputFormat::Yaml,
        }
    }
}

fn parse_var(s: &str) -> std::result::Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("Invalid parameter format '{}'. Expected key=value", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the graph
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "postflow=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load();

    match cli.command {
        Commands::Templates { action } => match action {
            TemplateActions::List { by_category } => cmd_templates_list(&config, by_category),
            TemplateActions::Show { name } => cmd_templates_show(&config, &name)?,
        },
        Commands::Generate(args) => cmd_generate(&config, args)?,
        Commands::Validate { file, yaml, json } => cmd_validate(file.as_deref(), yaml, json)?,
        Commands::Completions { shell } => cmd_completions(shell),
    }

    Ok(())
}

/// Shell completion variants
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::PowerShell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

fn cmd_completions(shell: CompletionShell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let shell: Shell = shell.into();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}

// ============================================================================
// Template Commands
// ============================================================================

fn cmd_templates_list(config: &Config, by_category: bool) {
    let registry = TemplateRegistry::with_http_method(&config.templates.http_method);

    if by_category {
        let by_category = registry.list_by_category();
        let mut categories: Vec<_> = by_category.keys().collect();
        categories.sort();

        for category in categories {
            println!("{}:", category.to_uppercase());
            for template in &by_category[category] {
                println!("  {:<25} {}", template.name, template.description);
            }
            println!();
        }
    } else {
        println!("{:<25} {:<15} DESCRIPTION", "NAME", "CATEGORY");
        println!("{}", "-".repeat(70));

        for template in registry.list() {
            println!(
                "{:<25} {:<15} {}",
                template.name, template.category, template.description
            );
        }
    }

    println!();
    println!("Use a template with: postflow generate <name> [template args]");
}

fn cmd_templates_show(config: &Config, name: &str) -> anyhow::Result<()> {
    let registry = TemplateRegistry::with_http_method(&config.templates.http_method);
    let template = registry.get(name).ok_or_else(|| {
        let names: Vec<_> = registry.list().iter().map(|t| t.name.as_str()).collect();
        anyhow::anyhow!(
            "Unknown template '{}'. Available templates: {}",
            name,
            names.join(", ")
        )
    })?;

    println!("Template: {}", template.name);
    println!("Category: {}", template.category);
    println!("Description: {}", template.description);
    println!();

    println!("Arguments:");
    for param in &template.parameters {
        let required = if param.required && param.default.is_none() {
            " (required)"
        } else {
            ""
        };
        let default = param
            .default
            .as_ref()
            .map(|d| format!(" [default: {}]", d))
            .unwrap_or_default();
        let choices = if param.choices.is_empty() {
            String::new()
        } else {
            format!(" ({})", param.choices.join("|"))
        };

        println!("  --{}{}{}{}", param.name, choices, required, default);
        if !param.description.is_empty() {
            println!("    {}", param.description);
        }
    }

    Ok(())
}

fn collect_params(args: &GenerateArgs) -> HashMap<String, String> {
    let named = [
        ("channel", &args.channel),
        ("message", &args.message),
        ("url", &args.url),
        ("method", &args.method),
        ("positive-channel", &args.positive_channel),
        ("negative-channel", &args.negative_channel),
        ("crm", &args.crm),
        ("slack-channel", &args.slack_channel),
    ];

    let mut params: HashMap<String, String> = args.params.iter().cloned().collect();
    for (key, value) in named {
        if let Some(value) = value {
            params.insert(key.to_string(), value.clone());
        }
    }
    params
}

fn cmd_generate(config: &Config, args: GenerateArgs) -> anyhow::Result<()> {
    let registry = TemplateRegistry::with_http_method(&config.templates.http_method);
    let params = collect_params(&args);

    let graph = registry.instantiate(&args.template, &params)?;

    let format = args.format.map(OutputFormat::from).unwrap_or(config.output.format);
    let rendered = render_checked(&graph, format, config.output.pretty)
        .map_err(|e| e.context(format!("Template '{}' produced an invalid workflow", args.template)))?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &rendered)?;
            eprintln!(
                "✓ Generated workflow from template '{}' to {}",
                args.template, path
            );
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn render(graph: &WorkflowGraph, format: OutputFormat, pretty: bool) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => to_json(graph, pretty)?,
        OutputFormat::Yaml => to_yaml(graph)?,
    })
}

/// Render a graph only if it passes validation.
fn render_checked(graph: &WorkflowGraph, format: OutputFormat, pretty: bool) -> anyhow::Result<String> {
    let report = validate(graph);
    if !report.valid {
        anyhow::bail!("{}", error_lines(&report.errors).join("\n"));
    }
    render(graph, format, pretty)
}

// ============================================================================
// Validation
// ============================================================================

fn read_document(file: Option<&str>, yaml: bool) -> anyhow::Result<WorkflowDocument> {
    match file {
        Some(path) if path != "-" => {
            let path = Path::new(path);
            if !path.exists() {
                anyhow::bail!("File not found: {}", path.display());
            }
            if yaml && !is_yaml_path(path) {
                let content = std::fs::read_to_string(path)?;
                return Ok(parse_workflow_yaml(&content)?);
            }
            Ok(parse_workflow_file(path)?)
        }
        _ => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            let doc = if yaml {
                parse_workflow_yaml(&content)?
            } else {
                parse_workflow(&content)?
            };
            Ok(doc)
        }
    }
}

fn cmd_validate(file: Option<&str>, yaml: bool, json: bool) -> anyhow::Result<()> {
    let doc = read_document(file, yaml)?;
    let stdout = std::io::stdout();
    check_document(&doc, json, &mut stdout.lock())
}

/// Validate a document, write the report, and fail if it has defects.
fn check_document<W: Write>(doc: &WorkflowDocument, json: bool, out: &mut W) -> anyhow::Result<()> {
    let report = validate_document(doc);
    write_report(doc, &report, json, out)?;

    if !report.valid {
        anyhow::bail!("{} validation error(s)", report.errors.len());
    }
    Ok(())
}

fn write_report<W: Write>(
    doc: &WorkflowDocument,
    report: &ValidationReport,
    json: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(report)?)?;
    } else if report.valid {
        writeln!(out, "Workflow is valid!")?;
        if let (Some(actions), Some(edges)) = (&doc.actions, &doc.edges) {
            writeln!(out)?;
            writeln!(out, "  Actions: {}", actions.len())?;
            writeln!(out, "  Edges: {}", edges.len())?;
        }
    } else {
        for line in error_lines(&report.errors) {
            writeln!(out, "{}", line)?;
        }
    }
    Ok(())
}

fn error_lines(errors: &[String]) -> Vec<String> {
    let mut lines = vec!["Workflow validation errors:".to_string()];
    lines.extend(errors.iter().map(|e| format!("  - {}", e)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_args() {
        let cli = Cli::try_parse_from([
            "postflow",
            "generate",
            "sentiment-filter",
            "--positive-channel",
            "#pos",
            "--negative-channel",
            "#neg",
            "--format",
            "yaml",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.template, "sentiment-filter");
                assert!(args.format == Some(FormatArg::Yaml));
                let params = collect_params(&args);
                assert_eq!(params.len(), 2);
                assert_eq!(params["positive-channel"], "#pos");
            }
            _ => panic!("Expected generate command"),
        }
    }

    #[test]
    fn test_named_flags_override_params() {
        let cli = Cli::try_parse_from([
            "postflow",
            "generate",
            "slack-notification",
            "-p",
            "channel=#old",
            "-p",
            "message=a=b",
            "--channel",
            "#new",
        ])
        .unwrap();

        let Commands::Generate(args) = cli.command else {
            panic!("Expected generate command");
        };
        let params = collect_params(&args);
        assert_eq!(params["channel"], "#new");
        assert_eq!(params["message"], "a=b");
    }

    #[test]
    fn test_parse_var_rejects_missing_equals() {
        assert!(parse_var("channel").is_err());
        assert_eq!(
            parse_var("k=").unwrap(),
            ("k".to_string(), String::new())
        );
    }

    #[test]
    fn test_parse_validate_args() {
        let cli = Cli::try_parse_from(["postflow", "validate", "-", "--json"]).unwrap();
        match cli.command {
            Commands::Validate { file, yaml, json } => {
                assert_eq!(file.as_deref(), Some("-"));
                assert!(!yaml);
                assert!(json);
            }
            _ => panic!("Expected validate command"),
        }
    }

    #[test]
    fn test_render_formats() {
        let graph = postflow::templates::slack_notification("#alerts", "hi");
        let json = render(&graph, OutputFormat::Json, false).unwrap();
        assert!(json.starts_with('{'));
        let yaml = render(&graph, OutputFormat::Yaml, true).unwrap();
        assert!(yaml.contains("kind: slack_send_channel_message"));
    }

    fn report_text(doc: &WorkflowDocument, json: bool) -> (anyhow::Result<()>, String) {
        let mut out = Vec::new();
        let result = check_document(doc, json, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_check_valid_document() {
        let graph = postflow::templates::sentiment_filter("#pos", "#neg");
        let (result, text) = report_text(&WorkflowDocument::from(graph), false);
        assert!(result.is_ok());
        assert_eq!(text, "Workflow is valid!\n\n  Actions: 4\n  Edges: 4\n");
    }

    #[test]
    fn test_check_invalid_document() {
        let doc = parse_workflow(
            r#"{"trigger": {"kind": "workflows/new-post"},
                "actions": [{"id": "if1", "kind": "builtin:if"}],
                "edges": [{"from": "$trigger", "to": "if1"}, {"from": "if1", "to": "ghost"}]}"#,
        )
        .unwrap();
        let (result, text) = report_text(&doc, false);
        assert_eq!(result.unwrap_err().to_string(), "2 validation error(s)");
        assert_eq!(
            text,
            "Workflow validation errors:\n\
             \x20 - IF action 'if1' must have exactly 2 outgoing edges (has 1)\n\
             \x20 - Edge 'to' references unknown action: ghost\n"
        );
    }

    #[test]
    fn test_check_document_json_report() {
        let (result, text) = report_text(&WorkflowDocument::default(), true);
        assert!(result.is_err());
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "valid": false,
                "errors": [
                    "Missing 'trigger' field",
                    "Missing 'actions' field",
                    "Missing 'edges' field"
                ]
            })
        );

        let graph = postflow::templates::slack_notification("#alerts", "hi");
        let (result, text) = report_text(&WorkflowDocument::from(graph), true);
        assert!(result.is_ok());
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!({"valid": true, "errors": []}));
    }

    #[test]
    fn test_render_checked_refuses_invalid_graph() {
        let mut graph = postflow::templates::sentiment_filter("#pos", "#neg");
        graph.edges.pop();
        let err = render_checked(&graph, OutputFormat::Json, false).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Workflow validation errors:"));
        assert!(message.contains("must have exactly 2 outgoing edges (has 1)"));

        let graph = postflow::templates::slack_notification("#alerts", "hi");
        assert!(render_checked(&graph, OutputFormat::Json, false).is_ok());
    }
}
