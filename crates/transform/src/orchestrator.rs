//! Build driver: scan plugins, convert every artifact, write the output tree.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use plugbridge_discovery::{
    list_plugins, parse_agent, parse_command, parse_skill, plugins_root, scan_plugin,
    PluginSource,
};
use plugbridge_validate::{ArtifactKind, ArtifactLayout};

use crate::engine::{transform_agent, transform_command, transform_skill};
use crate::generator::{generate_agent, generate_command, generate_skill, GeneratedArtifact};
use crate::manifest::{generate_manifest, MANIFEST_FILE};
use crate::registry::{PlatformRegistry, DEFAULT_REGISTRY_PATH};
use crate::report::{ArtifactFailure, BuildReport, FailureStage, PluginBuildReport};
use crate::Result;

/// Default build output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "dist/opencode";

/// Which plugins a build covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PluginSelection {
    /// Every directory under `<source_root>/plugins`.
    #[default]
    All,
    /// Only these plugin directory names.
    Named(Vec<String>),
}

impl PluginSelection {
    /// `"all"` selects everything; anything else names one plugin.
    pub fn from_arg(arg: &str) -> Self {
        if arg.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Named(vec![arg.to_string()])
        }
    }
}

/// Parameters for a build run.
///
/// ```
/// use plugbridge_transform::{BuildOptions, PluginSelection};
///
/// let options = BuildOptions::new(".", "dist/opencode");
/// assert_eq!(options.plugins, PluginSelection::All);
/// assert!(options.registry_path.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directory containing `plugins/`.
    pub source_root: PathBuf,
    pub output_dir: PathBuf,
    pub plugins: PluginSelection,
    /// Explicit registry override file. When unset the conventional
    /// `<source_root>/config/platform_registry.yaml` is used if present.
    pub registry_path: Option<PathBuf>,
}

impl BuildOptions {
    pub fn new(source_root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_dir: output_dir.into(),
            plugins: PluginSelection::All,
            registry_path: None,
        }
    }
}

/// Load the registry for a build. Failure here aborts the whole run.
pub fn load_registry(options: &BuildOptions) -> Result<PlatformRegistry> {
    let registry = match &options.registry_path {
        Some(path) => PlatformRegistry::load(path)?,
        None => PlatformRegistry::load_or_default(&options.source_root.join(DEFAULT_REGISTRY_PATH))?,
    };
    Ok(registry)
}

fn select_plugins(options: &BuildOptions) -> Result<Vec<PluginSource>> {
    let names = match &options.plugins {
        PluginSelection::All => list_plugins(&options.source_root)?,
        PluginSelection::Named(names) => names.clone(),
    };
    let root = plugins_root(&options.source_root);
    let mut sources = Vec::with_capacity(names.len());
    for name in names {
        let dir = root.join(&name);
        if !dir.is_dir() {
            bail!("unknown plugin '{}': {} does not exist", name, dir.display());
        }
        sources.push(scan_plugin(&dir)?);
    }
    Ok(sources)
}

/// Run a full build.
///
/// Per-artifact failures are collected in the returned report; only
/// registry, scanning and output-directory problems are errors.
pub fn build(options: &BuildOptions) -> Result<BuildReport> {
    let sources = select_plugins(options)?;
    let registry = load_registry(options)?
        .with_namespaces(sources.iter().map(|s| s.namespace.clone()))?;
    info!(
        plugins = sources.len(),
        output = %options.output_dir.display(),
        "starting build"
    );

    let mut report = BuildReport::new();
    for source in &sources {
        report.push(build_plugin(source, &registry, &options.output_dir)?);
    }
    info!(
        generated = report.total_generated(),
        failed = report.failure_count(),
        "build finished"
    );
    Ok(report)
}

struct Job<'a> {
    kind: ArtifactKind,
    path: &'a Path,
}

/// A converted artifact, ready to be written.
struct Rendered {
    kind: ArtifactKind,
    name: String,
    artifact: GeneratedArtifact,
    /// Source skill directory and files to copy from it.
    support: Option<(PathBuf, Vec<PathBuf>)>,
}

fn fallback_name(kind: ArtifactKind, path: &Path) -> String {
    let name = match kind {
        ArtifactKind::Skill => path.file_name(),
        _ => path.file_stem(),
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn convert(
    job: &Job<'_>,
    registry: &PlatformRegistry,
    namespace: &str,
    layout: &ArtifactLayout,
) -> std::result::Result<Rendered, ArtifactFailure> {
    let kind = job.kind;
    let parse_failed = |e: plugbridge_discovery::ParseError| {
        ArtifactFailure::new(kind, fallback_name(kind, job.path), FailureStage::Parse, e.to_string())
    };
    let failed = |name: &str, stage: FailureStage, reason: String| {
        ArtifactFailure::new(kind, name, stage, reason)
    };

    match kind {
        ArtifactKind::Command => {
            let source = parse_command(job.path).map_err(parse_failed)?;
            let target = transform_command(&source, registry)
                .map_err(|e| failed(&source.name, FailureStage::Transform, e.reason))?;
            let artifact = generate_command(&target, &source.name, namespace, layout)
                .map_err(|e| failed(&source.name, FailureStage::Generate, e.reason))?;
            Ok(Rendered {
                kind,
                name: source.name,
                artifact,
                support: None,
            })
        }
        ArtifactKind::Agent => {
            let source = parse_agent(job.path).map_err(parse_failed)?;
            let target = transform_agent(&source, registry)
                .map_err(|e| failed(&source.name, FailureStage::Transform, e.reason))?;
            let artifact = generate_agent(&target, namespace, layout)
                .map_err(|e| failed(&source.name, FailureStage::Generate, e.reason))?;
            Ok(Rendered {
                kind,
                name: source.name,
                artifact,
                support: None,
            })
        }
        ArtifactKind::Skill => {
            let source = parse_skill(job.path).map_err(parse_failed)?;
            let target = transform_skill(&source, registry)
                .map_err(|e| failed(source.name(), FailureStage::Transform, e.reason))?;
            let generated = generate_skill(&target, layout)
                .map_err(|e| failed(source.name(), FailureStage::Generate, e.reason))?;
            Ok(Rendered {
                kind,
                name: source.name().to_string(),
                artifact: generated.artifact,
                support: Some((job.path.to_path_buf(), generated.supporting_files)),
            })
        }
    }
}

fn write_artifact(plugin_out: &Path, artifact: &GeneratedArtifact) -> Result<()> {
    let path = plugin_out.join(&artifact.relative_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, &artifact.content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), "wrote artifact");
    Ok(())
}

fn copy_supporting_files(source_dir: &Path, target_dir: &Path, files: &[PathBuf]) -> Result<()> {
    for relative in files {
        let from = source_dir.join(relative);
        let to = target_dir.join(relative);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::copy(&from, &to).with_context(|| {
            format!("failed to copy {} to {}", from.display(), to.display())
        })?;
    }
    Ok(())
}

fn write_rendered(plugin_out: &Path, rendered: &Rendered) -> Result<()> {
    write_artifact(plugin_out, &rendered.artifact)?;
    if let Some((source_dir, files)) = &rendered.support {
        let skill_out = plugin_out
            .join(&rendered.artifact.relative_path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| plugin_out.to_path_buf());
        copy_supporting_files(source_dir, &skill_out, files)?;
    }
    Ok(())
}

/// Build one plugin into `<output_root>/<plugin>/`.
///
/// The plugin output directory is cleared first. Conversion runs in
/// parallel; writes happen in source order afterwards.
pub fn build_plugin(
    source: &PluginSource,
    registry: &PlatformRegistry,
    output_root: &Path,
) -> Result<PluginBuildReport> {
    let plugin_out = output_root.join(&source.dir_name);
    if plugin_out.exists() {
        fs::remove_dir_all(&plugin_out)
            .with_context(|| format!("failed to clear {}", plugin_out.display()))?;
    }
    fs::create_dir_all(&plugin_out)
        .with_context(|| format!("failed to create {}", plugin_out.display()))?;

    let layout = registry.artifact_layout();
    let jobs: Vec<Job<'_>> = source
        .commands
        .iter()
        .map(|path| Job {
            kind: ArtifactKind::Command,
            path,
        })
        .chain(source.agents.iter().map(|path| Job {
            kind: ArtifactKind::Agent,
            path,
        }))
        .chain(source.skills.iter().map(|path| Job {
            kind: ArtifactKind::Skill,
            path,
        }))
        .collect();

    let outcomes: Vec<_> = jobs
        .par_iter()
        .map(|job| convert(job, registry, &source.namespace, &layout))
        .collect();

    let mut report = PluginBuildReport::new(&source.dir_name, &source.namespace);
    let mut written: HashSet<PathBuf> = HashSet::new();
    for outcome in outcomes {
        let rendered = match outcome {
            Ok(rendered) => rendered,
            Err(failure) => {
                warn!(artifact = %failure.name, kind = %failure.kind, "{}", failure.reason);
                report.failures.push(failure);
                continue;
            }
        };
        if !written.insert(rendered.artifact.relative_path.clone()) {
            report.failures.push(ArtifactFailure::new(
                rendered.kind,
                &rendered.name,
                FailureStage::Write,
                format!(
                    "duplicate {} name; {} already generated",
                    rendered.kind,
                    rendered.artifact.relative_path.display()
                ),
            ));
            continue;
        }
        match write_rendered(&plugin_out, &rendered) {
            Ok(()) => report.record(rendered.kind, rendered.name),
            Err(err) => {
                warn!(artifact = %rendered.name, error = %err, "failed to write artifact");
                report.failures.push(ArtifactFailure::new(
                    rendered.kind,
                    rendered.name,
                    FailureStage::Write,
                    format!("{err:#}"),
                ));
            }
        }
    }

    let manifest = generate_manifest(
        &source.namespace,
        &source.version,
        report.commands.clone(),
        report.agents.clone(),
        report.skills.clone(),
    )
    .context("failed to render manifest")?;
    let manifest_path = plugin_out.join(MANIFEST_FILE);
    fs::write(&manifest_path, manifest)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    info!(
        plugin = %source.dir_name,
        commands = report.commands.len(),
        agents = report.agents.len(),
        skills = report.skills.len(),
        failed = report.failures.len(),
        "built plugin"
    );
    Ok(report)
}
