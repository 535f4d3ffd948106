use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use plugbridge_validate::{validate_artifacts, ArtifactLayout, ArtifactValidation, ValidationSummary};

use crate::config::Config;

/// Errors listed before the rest are summarised.
const ERROR_DISPLAY_LIMIT: usize = 10;

/// Handle the `validate` command.
pub(crate) fn handle_validate_command(
    config: &Config,
    artifacts_dir: Option<PathBuf>,
) -> Result<()> {
    let dir = config.output_dir(artifacts_dir)?;
    if !dir.is_dir() {
        bail!(
            "Artifacts directory not found: {}. Run `plugbridge build` first.",
            dir.display()
        );
    }

    let results = validate_artifacts(&dir, &ArtifactLayout::default())
        .with_context(|| format!("failed to validate {}", dir.display()))?;
    if results.is_empty() {
        bail!("No artifacts found in {}", dir.display());
    }

    let summary = ValidationSummary::from_results(&results);
    print!("{}", render_results(&dir, &results, &summary));
    if !summary.all_valid() {
        bail!("{} artifact(s) failed validation", summary.invalid);
    }
    Ok(())
}

fn render_results(dir: &Path, results: &[ArtifactValidation], summary: &ValidationSummary) -> String {
    let mut out = format!(
        "Validated {} artifacts: {} valid, {} invalid\n",
        summary.total, summary.valid, summary.invalid
    );
    if summary.invalid == 0 {
        return out;
    }

    out.push_str(&format!("\nErrors ({}):\n", summary.invalid));
    for result in results.iter().filter(|r| !r.is_valid()).take(ERROR_DISPLAY_LIMIT) {
        let shown = result.path.strip_prefix(dir).unwrap_or(result.path.as_path());
        if let Some(err) = result.error() {
            out.push_str(&format!("  - {} ({}): {}\n", shown.display(), result.kind, err));
        }
    }
    if summary.invalid > ERROR_DISPLAY_LIMIT {
        out.push_str(&format!(
            "  ... and {} more\n",
            summary.invalid - ERROR_DISPLAY_LIMIT
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugbridge_validate::{ArtifactKind, ValidationError};

    fn result(name: &str, outcome: Result<(), ValidationError>) -> ArtifactValidation {
        ArtifactValidation {
            path: PathBuf::from("/out/base/agent/ns").join(format!("{name}.md")),
            kind: ArtifactKind::Agent,
            name: name.to_string(),
            outcome,
        }
    }

    #[test]
    fn all_valid_prints_counts_only() {
        let results = vec![result("a", Ok(())), result("b", Ok(()))];
        let summary = ValidationSummary::from_results(&results);
        let out = render_results(Path::new("/out"), &results, &summary);
        assert_eq!(out, "Validated 2 artifacts: 2 valid, 0 invalid\n");
    }

    #[test]
    fn errors_are_capped() {
        let results: Vec<_> = (0..12)
            .map(|i| result(&format!("a{i}"), Err(ValidationError::schema("Missing 'mode' field"))))
            .collect();
        let summary = ValidationSummary::from_results(&results);
        let out = render_results(Path::new("/out"), &results, &summary);

        assert!(out.starts_with("Validated 12 artifacts: 0 valid, 12 invalid\n"));
        assert_eq!(out.matches("  - base/agent/ns/").count(), ERROR_DISPLAY_LIMIT);
        assert!(out.contains("  ... and 2 more\n"));
    }
}
