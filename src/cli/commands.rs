//! CLI command definitions for promptforge.
//!
//! Thin glue over the library index and the test harness: each command
//! prints human-readable text and exits zero on success.

use clap::Parser;
use std::collections::BTreeMap;

use crate::library::PromptLibrary;
use crate::llm::GeminiClient;
use crate::tester::PromptTester;
use crate::validate::validate_format;

/// Default directory to load prompt records from.
const DEFAULT_PROMPTS_DIR: &str = "prompts";

/// Prompt library manager and regression-test harness.
#[derive(Parser)]
#[command(name = "promptforge")]
#[command(about = "Manage and regression-test a library of LLM prompt templates")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "warn", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// List all prompts, optionally filtered by category.
    List(ListArgs),

    /// Search prompts by name, description, or tag.
    Search(SearchArgs),

    /// Show library statistics.
    Stats(StatsArgs),

    /// Validate a prompt record file and report format issues.
    Validate(ValidateArgs),

    /// Test a single prompt against the generation service.
    Test(TestArgs),

    /// Test every prompt under a directory and summarize the results.
    #[command(name = "test-batch")]
    TestBatch(TestBatchArgs),
}

/// Arguments for `promptforge list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only show prompts in this category.
    #[arg(long)]
    pub category: Option<String>,

    /// Prompt library root directory.
    #[arg(long, default_value = DEFAULT_PROMPTS_DIR)]
    pub dir: String,
}

/// Arguments for `promptforge search`.
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Search query, matched case-insensitively.
    pub query: String,

    /// Prompt library root directory.
    #[arg(long, default_value = DEFAULT_PROMPTS_DIR)]
    pub dir: String,
}

/// Arguments for `promptforge stats`.
#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Prompt library root directory.
    #[arg(long, default_value = DEFAULT_PROMPTS_DIR)]
    pub dir: String,
}

/// Arguments for `promptforge validate`.
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Record file to validate.
    pub path: String,
}

/// Arguments for `promptforge test`.
#[derive(Parser, Debug)]
pub struct TestArgs {
    /// Record file to test.
    pub path: String,

    /// Override the record's recommended model.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Explicit test input as KEY=VALUE pairs; suppresses the record's
    /// example expectations.
    #[arg(short, long = "input", value_name = "KEY=VALUE")]
    pub inputs: Vec<String>,

    /// Gemini API key (can also be set via GEMINI_API_KEY env var).
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print the full result as JSON instead of a summary line.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `promptforge test-batch`.
#[derive(Parser, Debug)]
pub struct TestBatchArgs {
    /// Directory of record files to test recursively.
    #[arg(default_value = DEFAULT_PROMPTS_DIR)]
    pub dir: String,

    /// Override every record's recommended model.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Gemini API key (can also be set via GEMINI_API_KEY env var).
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

/// Parses CLI arguments from the process environment.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses CLI arguments and runs the selected command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Runs the selected command with already-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::List(args) => {
            let library = PromptLibrary::load_dir(&args.dir)?;
            let prompts = match &args.category {
                Some(category) => {
                    let mut prompts = library.get_by_category(category);
                    prompts.sort_by(|a, b| a.name.cmp(&b.name));
                    prompts
                }
                None => library.list_prompts(),
            };
            for prompt in prompts {
                println!(
                    "  [{}] {} v{} - {}",
                    prompt.category, prompt.name, prompt.version, prompt.description
                );
            }
        }

        Commands::Search(args) => {
            let library = PromptLibrary::load_dir(&args.dir)?;
            for prompt in library.search(&args.query) {
                println!(
                    "  [{}] {} - {}",
                    prompt.category, prompt.name, prompt.description
                );
            }
        }

        Commands::Stats(args) => {
            let library = PromptLibrary::load_dir(&args.dir)?;
            let stats = library.get_stats();
            println!("Total prompts: {}", stats.total_prompts);
            println!("Categories: {}", stats.categories);
            for (category, count) in &stats.category_counts {
                println!("  {}: {}", category, count);
            }
            println!("Models used: {}", stats.models_used.join(", "));
        }

        Commands::Validate(args) => {
            let issues = validate_format(&args.path);
            if issues.is_empty() {
                println!("{}: OK", args.path);
            } else {
                println!("{}: {} issue(s)", args.path, issues.len());
                for issue in &issues {
                    println!("  - {}", issue);
                }
                anyhow::bail!("validation failed");
            }
        }

        Commands::Test(args) => {
            let client = GeminiClient::from_key_or_env(args.api_key.clone())?;
            let tester = PromptTester::new(client);

            let input = parse_inputs(&args.inputs)?;
            let result = tester
                .test_prompt(&args.path, input.as_ref(), args.model.as_deref())
                .await;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let verdict = if result.passed { "PASS" } else { "FAIL" };
                println!(
                    "{}: {} (quality {:.1}/10, {:.0}ms, {} tokens)",
                    result.prompt_name, verdict, result.quality_score, result.latency_ms,
                    result.token_count
                );
                if let Some(error) = &result.error {
                    println!("  error: {}", error);
                } else if !result.missing_keywords.is_empty() {
                    println!("  missing keywords: {}", result.missing_keywords.join(", "));
                }
            }
            if !result.passed {
                anyhow::bail!("prompt test failed");
            }
        }

        Commands::TestBatch(args) => {
            let client = GeminiClient::from_key_or_env(args.api_key.clone())?;
            let tester = PromptTester::new(client);

            let batch = tester.test_batch(&args.dir, args.model.as_deref()).await;
            println!("{}", batch.summary());
            if batch.failed > 0 {
                anyhow::bail!("{} prompt test(s) failed", batch.failed);
            }
        }
    }

    Ok(())
}

/// Parses repeated KEY=VALUE arguments into an input mapping. Returns
/// `None` when no inputs were given, so example inputs still apply.
fn parse_inputs(pairs: &[String]) -> anyhow::Result<Option<BTreeMap<String, String>>> {
    if pairs.is_empty() {
        return Ok(None);
    }
    let mut inputs = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("invalid input '{}', expected KEY=VALUE", pair))?;
        inputs.insert(key.to_string(), value.to_string());
    }
    Ok(Some(inputs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inputs_empty_is_none() {
        let parsed = parse_inputs(&[]).expect("should parse");
        assert!(parsed.is_none());
    }

    #[test]
    fn test_parse_inputs_pairs() {
        let pairs = vec!["document=Hello world".to_string(), "tone=formal".to_string()];
        let parsed = parse_inputs(&pairs).expect("should parse").expect("some");

        assert_eq!(parsed.get("document").map(String::as_str), Some("Hello world"));
        assert_eq!(parsed.get("tone").map(String::as_str), Some("formal"));
    }

    #[test]
    fn test_parse_inputs_rejects_missing_separator() {
        let pairs = vec!["no-separator".to_string()];
        assert!(parse_inputs(&pairs).is_err());
    }
}
