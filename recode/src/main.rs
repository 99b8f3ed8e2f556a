//! Recode CLI - clean and recode survey-export CSV files
//!
//! # Main Commands
//!
//! ```bash
//! recode run export.csv                      # Interactive recoding, column by column
//! recode run export.csv -m likert.json       # Replay saved mappings
//! recode apply export.csv -m likert.json     # Replay without any prompts
//! recode strip export.csv -o clean.csv       # Remove administrative columns
//! recode template list                       # Manage stored mapping sets
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! recode inspect export.csv                  # Encoding, delimiter, column stats
//! ```

use clap::{Parser, Subcommand};
use recode::logs::{drain, log_error, log_info, log_success, LogLevel, LOG_BROADCASTER};
use recode::pipeline::{
    format_delimiter, persist_mappings, print_mappings, recode_file, summarize, write_output,
    MappingSource, RecodeMode, RecodeOptions,
};
use recode::session::{replay, ConsolePrompter, Prompter};
use recode::strip::{default_groups, strip_columns};
use recode::{parse_csv_file_auto, store, MappingRegistry, Settings};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "recode")]
#[command(about = "Clean and recode survey-export CSV files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recode a CSV file: replay mappings if given, otherwise ask per column
    Run {
        /// Input CSV file
        input: PathBuf,

        /// Mapping file to replay
        #[arg(short, long, conflicts_with = "template")]
        mappings: Option<PathBuf>,

        /// Stored mapping set to replay (registry ID)
        #[arg(short, long)]
        template: Option<String>,

        /// Output CSV file (asked for if not given)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save the session's mappings to this file
        #[arg(long)]
        save_mappings: Option<PathBuf>,

        /// Store the session's mappings in the registry under this name
        #[arg(long)]
        save_template: Option<String>,

        /// Number of rows shown per column
        #[arg(long)]
        sample_rows: Option<usize>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Replay a mapping file without prompting
    Apply {
        /// Input CSV file
        input: PathBuf,

        /// Mapping file to replay
        #[arg(short, long)]
        mappings: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Remove administrative columns from a survey export
    Strip {
        /// Input CSV file
        input: PathBuf,

        /// Output CSV file (asked for if not given)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Columns to remove instead of the default groups
        #[arg(short, long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Show encoding, delimiter and per-column statistics
    Inspect {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage stored mapping sets
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    /// List all stored mapping sets
    List,

    /// Show details of a stored mapping set
    Show {
        /// Template ID
        id: String,
    },

    /// Import a mapping file as a stored set
    Import {
        /// Mapping JSON file to import
        file: PathBuf,
        /// Name for the template
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Export a stored set as a plain mapping file
    Export {
        /// Template ID
        id: String,
        /// Destination mapping file
        file: PathBuf,
    },

    /// Delete a stored set
    Delete {
        /// Template ID
        id: String,
    },

    /// Suggest stored sets that fit a CSV file's columns
    Suggest {
        /// Input CSV file
        input: PathBuf,
    },
}

fn main() {
    let settings = Settings::from_env();
    LOG_BROADCASTER.set_quiet(settings.quiet);
    let mut log_rx = LOG_BROADCASTER.subscribe();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            mappings,
            template,
            output,
            save_mappings,
            save_template,
            sample_rows,
            delimiter,
        } => {
            let source = mappings
                .map(MappingSource::File)
                .or(template.map(MappingSource::Template));
            let options = RecodeOptions {
                mappings: source,
                delimiter,
                sample_rows: sample_rows.unwrap_or(settings.sample_rows),
                registry_dir: settings.registry_dir.clone(),
            };
            cmd_run(
                &input,
                &options,
                output,
                save_mappings,
                save_template.as_deref(),
            )
        }

        Commands::Apply {
            input,
            mappings,
            output,
            delimiter,
        } => cmd_apply(&input, &mappings, output.as_deref(), delimiter),

        Commands::Strip {
            input,
            output,
            columns,
            yes,
            delimiter,
        } => cmd_strip(&input, output, columns, yes, delimiter),

        Commands::Inspect {
            input,
            delimiter,
            json,
        } => cmd_inspect(&input, delimiter, json),

        Commands::Template { action } => cmd_template(action, &settings),
    };

    let warnings = drain(&mut log_rx)
        .iter()
        .filter(|entry| entry.level == LogLevel::Warning)
        .count();
    if warnings > 0 && !settings.quiet {
        eprintln!("⚠️  {} warning(s) during this run", warnings);
    }

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn cmd_run(
    input: &Path,
    options: &RecodeOptions,
    output: Option<PathBuf>,
    save_mappings: Option<PathBuf>,
    save_template: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut prompter = ConsolePrompter::stdio();

    let result = recode_file(input, options, &mut prompter)?;

    if result.mode == RecodeMode::Interactive {
        print_mappings(&result.mappings);

        let destination = match save_mappings {
            Some(path) => Some(path),
            None => {
                if prompter.confirm("Do you want to save the recode mappings?")? {
                    prompter.elicit_path("Save recode mappings to")?
                } else {
                    None
                }
            }
        };
        persist_mappings(&result.mappings, destination.as_deref())?;

        if let Some(name) = save_template {
            let mut registry = MappingRegistry::with_dir(&options.registry_dir);
            let id = registry.save(result.mappings.clone(), name)?;
            log_success(format!("Template saved with ID: {}", id));
        }
    }

    let destination = match output {
        Some(path) => Some(path),
        None => prompter.elicit_path("Save modified CSV to")?,
    };
    match destination {
        Some(path) => write_output(&result.table, Some(path.as_path()), result.csv_info.delimiter)?,
        None => log_info("File save cancelled"),
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_apply(
    input: &Path,
    mappings_path: &Path,
    output: Option<&Path>,
    delimiter: Option<char>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mappings = store::load(mappings_path)?;
    log_success(format!("Recode mappings loaded from {}", mappings_path.display()));

    let parsed = parse_csv_file_auto(input, delimiter)?;
    let mut table = parsed.table;

    let report = replay(&mut table, &mappings);
    log_success(report.summary());

    write_output(&table, output, parsed.delimiter)?;
    Ok(())
}

fn cmd_strip(
    input: &Path,
    output: Option<PathBuf>,
    columns: Option<Vec<String>>,
    yes: bool,
    delimiter: Option<char>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Stripping: {}", input.display());

    let parsed = parse_csv_file_auto(input, delimiter)?;
    let mut table = parsed.table;
    log_success(format!(
        "Read {} rows, {} columns",
        table.row_count(),
        table.width()
    ));

    let groups = match columns {
        Some(custom) => vec![custom],
        None => default_groups(),
    };

    let mut prompter = ConsolePrompter::stdio();
    let report = strip_columns(&mut table, &groups, &mut prompter, yes)?;
    log_success(format!(
        "{} columns removed, {} remaining",
        report.removed.len(),
        table.width()
    ));

    let destination = match output {
        Some(path) => Some(path),
        None => prompter.elicit_path("Save modified CSV to")?,
    };
    match destination {
        Some(path) => write_output(&table, Some(path.as_path()), parsed.delimiter)?,
        None => log_info("File save cancelled"),
    }

    Ok(())
}

fn cmd_inspect(
    input: &Path,
    delimiter: Option<char>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = parse_csv_file_auto(input, delimiter)?;
    let summary = summarize(&parsed.table);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    eprintln!("📄 {}", input.display());
    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(parsed.delimiter));
    eprintln!("   Rows: {}", parsed.table.row_count());
    eprintln!("   Columns: {}\n", parsed.table.width());

    for (i, column) in summary.iter().enumerate() {
        println!(
            "  [{:2}] {} ({} distinct, {} missing)",
            i + 1,
            column.name,
            column.distinct,
            column.missing
        );
    }
    Ok(())
}

fn cmd_template(
    action: TemplateAction,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = MappingRegistry::with_dir(&settings.registry_dir);

    match action {
        TemplateAction::List => {
            let templates = registry.list();
            if templates.is_empty() {
                eprintln!("📋 No templates stored yet.");
                eprintln!("   Use 'recode template import <file>' to add one.");
                return Ok(());
            }

            eprintln!("📋 Stored templates ({}):\n", templates.len());
            for t in templates {
                println!("  📄 {} ({})", t.name, t.id);
                println!("     Columns: {}", t.columns.join(", "));
                println!("     Uses: {}", t.use_count);
                if let Some(ref last) = t.last_used {
                    println!("     Last used: {}", last);
                }
                println!();
            }
        }

        TemplateAction::Show { id } => {
            let t = registry.get(&id)?;
            println!("📄 Template: {} ({})\n", t.name, t.id);
            println!("Columns: {}", t.columns.join(", "));
            println!("Created: {}", t.created_at);
            println!("Uses: {}", t.use_count);
            println!("\nMappings:");
            println!("{}", serde_json::to_string_pretty(&t.mappings)?);
        }

        TemplateAction::Import { file, name } => {
            eprintln!("📥 Importing template from: {}", file.display());
            let id = registry.import(&file, name.as_deref())?;
            eprintln!("✅ Template saved with ID: {}", id);
        }

        TemplateAction::Export { id, file } => {
            registry.export(&id, &file)?;
            eprintln!("💾 Template {} exported to: {}", id, file.display());
        }

        TemplateAction::Delete { id } => {
            registry.delete(&id)?;
            eprintln!("🗑️  Template deleted: {}", id);
        }

        TemplateAction::Suggest { input } => {
            let parsed = parse_csv_file_auto(&input, None)?;
            let columns = parsed.table.column_names();
            let compatible = registry.find_compatible(&columns);

            if compatible.is_empty() {
                eprintln!("📋 No stored template fits {}", input.display());
                return Ok(());
            }

            for (t, score) in compatible {
                println!("  📄 {} ({}) - {:.0}% of its columns present", t.name, t.id, score * 100.0);
            }
        }
    }

    Ok(())
}
