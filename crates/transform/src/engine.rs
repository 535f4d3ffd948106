//! Transformation engine: pure Claude Code → OpenCode record conversion.
//!
//! Every function here takes a parsed source record plus the shared
//! registry and returns a new target record. Nothing touches the
//! filesystem.

use regex::Regex;

use plugbridge_discovery::{SourceAgent, SourceCommand, SourceSkill, INHERIT_MODEL};
use plugbridge_validate::ArtifactKind;

use crate::error::TransformError;
use crate::fence::replace_outside_fences;
use crate::models::{Permissions, TargetAgent, TargetCommand, TargetSkill};
use crate::registry::{PlatformRegistry, SemanticTool};

/// One tool → permission rule: (category, action, source name, target name).
///
/// Both spellings are accepted so callers may pass either tool list.
const PERMISSION_RULES: &[(&str, &str, &str, &str)] = &[
    ("file", "read", "Read", "read_file"),
    ("file", "write", "Write", "write_file"),
    ("file", "edit", "Edit", "edit_file"),
    ("bash", "execute", "Bash", "bash_run"),
    ("search", "grep", "Grep", "grep_file"),
    ("search", "glob", "Glob", "glob_pattern"),
];

/// Rewrite `ns:` to `ns/` for every known namespace, anywhere in the text.
///
/// Code examples are rewritten too: the colon form is never valid OpenCode
/// syntax. Applying this twice is the same as applying it once.
pub fn rewrite_namespaces<S: AsRef<str>>(text: &str, namespaces: &[S]) -> String {
    let mut result = text.to_string();
    for namespace in namespaces {
        let namespace = namespace.as_ref();
        result = result.replace(&format!("{namespace}:"), &format!("{namespace}/"));
    }
    result
}

fn namespace_alternation<S: AsRef<str>>(namespaces: &[S]) -> String {
    namespaces
        .iter()
        .map(|ns| regex::escape(ns.as_ref()))
        .collect::<Vec<_>>()
        .join("|")
}

/// Pattern for `/<namespace>:<command-name>` sub-command references.
pub fn slash_command_pattern<S: AsRef<str>>(namespaces: &[S]) -> Result<Regex, regex::Error> {
    if namespaces.is_empty() {
        // Matches nothing.
        return Regex::new(r"[^\s\S]");
    }
    Regex::new(&format!(
        r"/({}):([a-z-]+)",
        namespace_alternation(namespaces)
    ))
}

/// Replace `/ns:cmd` outside code fences with `invoke("ns:cmd")`.
pub fn rewrite_slash_commands<S: AsRef<str>>(
    text: &str,
    namespaces: &[S],
    invoke: &str,
) -> Result<String, regex::Error> {
    let pattern = slash_command_pattern(namespaces)?;
    Ok(replace_outside_fences(text, &pattern, |caps| {
        format!("{invoke}(\"{}:{}\")", &caps[1], &caps[2])
    }))
}

/// Pattern for a native skill invocation of `skill_name`.
///
/// "Skill tool" followed, possibly across lines, by `skill: <name>`. The
/// name must end at a non-name character or the end of the text; that
/// character is captured as group 1 so a rewrite can put it back.
pub fn skill_invocation_pattern(skill_name: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?s)Skill tool.*?skill:\s*{}([^A-Za-z0-9_-]|$)",
        regex::escape(skill_name)
    ))
}

/// Replace native skill invocations outside code fences with `<short_form> tool`.
pub fn rewrite_skill_invocations(
    text: &str,
    skill_name: &str,
    short_form: &str,
) -> Result<String, regex::Error> {
    let pattern = skill_invocation_pattern(skill_name)?;
    Ok(replace_outside_fences(text, &pattern, |caps| {
        let boundary = caps.get(1).map_or("", |m| m.as_str());
        format!("{short_form} tool{boundary}")
    }))
}

/// Translate Claude Code tool names; tools with no equivalent are dropped.
pub fn translate_tools(tools: &[String], registry: &PlatformRegistry) -> Vec<String> {
    tools
        .iter()
        .filter_map(|tool| registry.map_tool(tool))
        .map(str::to_string)
        .collect()
}

/// Derive OpenCode permissions from a tool list.
///
/// Categories with no granted action are absent. The result depends only on
/// which tools are present, not on their order.
pub fn derive_permissions<S: AsRef<str>>(tools: &[S]) -> Permissions {
    let has = |name: &str| tools.iter().any(|t| t.as_ref() == name);
    let mut permissions = Permissions::new();
    for (category, action, source, target) in PERMISSION_RULES {
        if has(*source) || has(*target) {
            permissions
                .entry(category.to_string())
                .or_default()
                .push(action.to_string());
        }
    }
    permissions
}

/// Convert a command.
///
/// The delegation agent is always left unset; `subtask` is false and the
/// model is inherited from the OpenCode configuration.
pub fn transform_command(
    command: &SourceCommand,
    registry: &PlatformRegistry,
) -> Result<TargetCommand, TransformError> {
    let template = rewrite_namespaces(&command.content, registry.namespaces());
    TargetCommand::new(
        template,
        command.description.clone(),
        command.argument_hint.clone(),
    )
    .map_err(|reason| TransformError::new(ArtifactKind::Command, &command.name, reason))
}

/// Convert an agent.
pub fn transform_agent(
    agent: &SourceAgent,
    registry: &PlatformRegistry,
) -> Result<TargetAgent, TransformError> {
    let fail = |reason: String| TransformError::new(ArtifactKind::Agent, &agent.name, reason);

    let tools = translate_tools(&agent.tools, registry);
    // Permissions come from the source spelling, before translation.
    let permissions = derive_permissions(&agent.tools);
    let content = rewrite_slash_commands(
        &agent.content,
        registry.namespaces(),
        registry.semantic(SemanticTool::SlashCommand),
    )
    .map_err(|e| fail(format!("invalid sub-command pattern: {e}")))?;

    let model = (agent.model != INHERIT_MODEL).then(|| agent.model.clone());

    TargetAgent::new(
        agent.name.clone(),
        agent.description.clone(),
        model,
        tools,
        permissions,
        content,
    )
    .map_err(fail)
}

/// Convert a skill.
pub fn transform_skill(
    skill: &SourceSkill,
    registry: &PlatformRegistry,
) -> Result<TargetSkill, TransformError> {
    let fail = |reason: String| TransformError::new(ArtifactKind::Skill, skill.name(), reason);

    let short_form = registry.skill_invocation(skill.name());
    let content = rewrite_skill_invocations(skill.content(), skill.name(), &short_form)
        .map_err(|e| fail(format!("invalid skill pattern: {e}")))?;

    TargetSkill::new(
        skill.name(),
        skill.description(),
        content,
        skill.supporting_files().to_vec(),
    )
    .map(|target| target.with_allowed_tools(skill.allowed_tools().to_vec()))
    .map_err(fail)
}
