//! Validate command implementation

use super::{loader, output};
use anyhow::Result;
use colored::Colorize;
use octofhir_cohort_diagnostics::Diagnostic;
use octofhir_cohort_eval::EngineConfig;
use octofhir_cohort_types::{Dataset, FilterGroup, FilterNode, Logic};
use std::path::PathBuf;

/// Configuration for validate command
pub struct ValidateConfig {
    pub files: Vec<PathBuf>,
    pub data: Option<PathBuf>,
    pub strict: bool,
    pub engine: EngineConfig,
    pub verbose: bool,
}

/// Validation result for a single filter file
pub struct ValidationResult {
    pub file: PathBuf,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate filter files, optionally against a dataset schema
pub async fn validate(config: ValidateConfig) -> Result<()> {
    if config.files.is_empty() {
        anyhow::bail!("No files specified for validation");
    }

    let dataset = match &config.data {
        Some(path) => Some(loader::load_dataset(path, &config.engine, None)?),
        None => None,
    };

    let mut total_errors = 0;
    let mut total_warnings = 0;
    for file in &config.files {
        if config.verbose {
            eprintln!("Validating: {}", file.display());
        }
        let filter = loader::load_filter(file)?;
        let result = check_filter(file.clone(), &filter, dataset.as_ref());

        total_errors += result.errors.len();
        total_warnings += result.warnings.len();
        print_validation_result(&result);
    }

    println!();
    if total_errors == 0 && total_warnings == 0 {
        println!(
            "{}",
            output::format_success(&format!("All {} filter(s) are valid", config.files.len()))
        );
        return Ok(());
    }

    let mut summary = Vec::new();
    if total_errors > 0 {
        summary.push(format!("{} error(s)", total_errors).red().to_string());
    }
    if total_warnings > 0 {
        summary.push(format!("{} warning(s)", total_warnings).yellow().to_string());
    }

    if total_errors > 0 {
        anyhow::bail!("Validation failed: found {}", summary.join(", "));
    }
    if config.strict {
        anyhow::bail!("Validation failed in strict mode: found {}", summary.join(", "));
    }
    eprintln!("{}", output::format_warning(&format!("Found {}", summary.join(", "))));
    Ok(())
}

/// Check one filter
///
/// Structural problems and unknown columns are errors. Empty groups are
/// warnings, since they match every row (AND) or none (OR).
pub fn check_filter(
    file: PathBuf,
    filter: &FilterGroup,
    dataset: Option<&Dataset>,
) -> ValidationResult {
    let checked = match dataset {
        Some(dataset) => filter.validate_against(&dataset.columns),
        None => filter.validate(),
    };
    let errors = match checked {
        Ok(()) => Vec::new(),
        Err(err) => err.to_diagnostics(),
    };

    let mut warnings = Vec::new();
    collect_empty_groups(filter, &mut warnings);

    ValidationResult { file, errors, warnings }
}

fn collect_empty_groups(group: &FilterGroup, warnings: &mut Vec<String>) {
    if group.rules.is_empty() {
        let matches = match (group.logic, group.negate) {
            (Logic::And, false) | (Logic::Or, true) => "every row",
            (Logic::Or, false) | (Logic::And, true) => "no row",
        };
        warnings.push(format!("Group '{}' has no rules and matches {}", group.id, matches));
    }
    for child in &group.rules {
        if let FilterNode::Group(nested) = child {
            collect_empty_groups(nested, warnings);
        }
    }
}

fn print_validation_result(result: &ValidationResult) {
    let status = if result.success() {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("{} {}", status, result.file.display().to_string().cyan());

    for error in &result.errors {
        println!("  {}", error.render_colored().replace('\n', "\n  "));
    }
    for warning in &result.warnings {
        println!("  {}: {}", "warning".yellow().bold(), warning);
    }
}
