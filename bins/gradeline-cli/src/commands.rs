// CLI commands for grading local solutions
use anyhow::{bail, Context, Result};
use gradeline_common::types::{Language, TestCase};
use gradeline_common::Config;
use gradeline_grader::Judge0Grader;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
struct LanguageEntry {
    name: String,
    id: u32,
}

/// Load a JSON array of test cases
pub fn load_cases(path: &Path) -> Result<Vec<TestCase>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read cases file {}", path.display()))?;
    let cases: Vec<TestCase> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse cases file {}", path.display()))?;

    if cases.is_empty() {
        bail!("Cases file {} contains no test cases", path.display());
    }
    Ok(cases)
}

fn load_source(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read source file {}", path.display()))
}

fn build_grader() -> Result<Judge0Grader> {
    let config = Config::from_env();
    if config.api_keys.is_empty() {
        bail!("No judge API keys configured. Set JUDGE_API_KEYS or JUDGE_API_KEY_1..");
    }
    info!(keys = config.api_keys.len(), judge = %config.judge_base_url, "Judge client ready");
    gradeline_grader::grader_from_config(&config).context("Failed to build judge client")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", rendered);
    Ok(())
}

fn language_table() -> Vec<LanguageEntry> {
    Language::all_variants()
        .iter()
        .map(|lang| LanguageEntry {
            name: lang.to_string(),
            id: lang.judge_id(),
        })
        .collect()
}

/// Print supported languages
pub fn list_languages() -> Result<()> {
    print_json(&language_table())
}

/// Grade a local source file and print the aggregate verdict
pub async fn grade(language: &str, source: &Path, cases: &Path) -> Result<()> {
    let code = load_source(source)?;
    let cases = load_cases(cases)?;
    let grader = build_grader()?;

    let verdict = grader.grade_submission(&code, language, &cases).await?;
    print_json(&verdict)
}

/// Run a local source file and print each case's raw result
pub async fn run(language: &str, source: &Path, cases: &Path) -> Result<()> {
    let code = load_source(source)?;
    let cases = load_cases(cases)?;
    let grader = build_grader()?;

    let results = grader.run_sample(&code, language, &cases).await?;
    print_json(&results)
}
