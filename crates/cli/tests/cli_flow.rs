//! CLI integration tests driving the `plugbridge` binary.
//!
//! Each test runs the binary with `HOME` and the config file pointed into a
//! temporary directory so nothing outside the fixture is touched.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result};
use plugbridge_test_utils::PluginFixture;
use scopeguard::defer_on_unwind;
use serde_json::Value;

fn plugbridge(fixture: &PluginFixture, args: &[&str]) -> Result<Output> {
    let bin_path = env!("CARGO_BIN_EXE_plugbridge");
    Command::new(bin_path)
        .args(args)
        .env("HOME", fixture.path("home"))
        .env("PLUGBRIDGE_CONFIG", fixture.path("home/config.toml"))
        .env_remove("PLUGBRIDGE_OPENCODE_DIR")
        .env_remove("PLUGBRIDGE_BACKUP_DIR")
        .env_remove("RUST_LOG")
        .current_dir(fixture.tempdir.path())
        .output()
        .with_context(|| format!("failed to execute plugbridge {}", args.join(" ")))
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn build_args<'a>(fixture_source: &'a str, out: &'a str) -> Vec<&'a str> {
    vec!["build", "--source-root", fixture_source, "--output-dir", out]
}

#[test]
fn given_plugin_when_build_json_then_stdout_is_json_and_validate_passes() -> Result<()> {
    // GIVEN a plugin source tree
    let fixture = PluginFixture::new()?;
    fixture.sample_plugin("base")?;
    let source = fixture.source_root.to_string_lossy().into_owned();
    let out = fixture.path("dist").to_string_lossy().into_owned();

    // WHEN building with --json
    let mut args = build_args(&source, &out);
    args.push("--json");
    let output = plugbridge(&fixture, &args)?;
    let stdout = text(&output.stdout);
    let stderr = text(&output.stderr);
    defer_on_unwind! {
        eprintln!("build stdout:\n{stdout}\nbuild stderr:\n{stderr}");
    }

    // THEN stdout is exactly the JSON result
    assert!(output.status.success());
    let json: Value = serde_json::from_str(&stdout)?;
    assert_eq!(json["status"], "success");
    assert_eq!(json["commands"], 2);
    assert_eq!(json["agents"], 2);
    assert_eq!(json["skills"], 1);
    assert!(Path::new(&out).join("base/command/rp1-base/build.md").is_file());

    // AND the output validates
    let output = plugbridge(&fixture, &["validate", "--artifacts-dir", &out])?;
    assert!(output.status.success(), "{}", text(&output.stderr));
    assert!(text(&output.stdout).contains("Validated 5 artifacts: 5 valid, 0 invalid"));
    Ok(())
}

#[test]
fn given_broken_agent_when_build_then_exit_code_is_one() -> Result<()> {
    let fixture = PluginFixture::new()?;
    fixture.sample_plugin("base")?;
    fixture.add_agent("base", "broken", "---\nname: broken\n---\n\nNo description.\n")?;
    let source = fixture.source_root.to_string_lossy().into_owned();
    let out = fixture.path("dist").to_string_lossy().into_owned();

    let output = plugbridge(&fixture, &build_args(&source, &out))?;
    let stdout = text(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("Build complete: 6 processed, 1 failed"), "{stdout}");
    assert!(stdout.contains("agent 'broken'"), "{stdout}");
    // The rest of the plugin is still generated.
    assert!(Path::new(&out).join("base/agent/rp1-base/builder.md").is_file());
    Ok(())
}

#[test]
fn given_build_when_install_and_verify_then_installation_is_healthy() -> Result<()> {
    // GIVEN built artifacts
    let fixture = PluginFixture::new()?;
    fixture.sample_plugin("base")?;
    let source = fixture.source_root.to_string_lossy().into_owned();
    let out = fixture.path("dist").to_string_lossy().into_owned();
    let target = fixture.path("opencode").to_string_lossy().into_owned();
    assert!(plugbridge(&fixture, &build_args(&source, &out))?.status.success());

    // WHEN doing a dry run first
    let output = plugbridge(
        &fixture,
        &["install", "--artifacts-dir", &out, "--target-dir", &target, "--dry-run"],
    )?;
    assert!(output.status.success(), "{}", text(&output.stderr));
    assert!(text(&output.stdout).contains("command/rp1-base/build.md"));
    assert!(!Path::new(&target).exists());

    // AND then installing for real
    let output = plugbridge(
        &fixture,
        &["install", "--artifacts-dir", &out, "--target-dir", &target],
    )?;
    assert!(output.status.success(), "{}", text(&output.stderr));

    // THEN files are in place and the backup went under HOME
    assert!(Path::new(&target).join("agent/rp1-base/searcher.md").is_file());
    assert!(Path::new(&target).join("skills/maestro/SKILL.md").is_file());
    let backups = fixture.path("home/.plugbridge/backups");
    assert_eq!(fs::read_dir(&backups)?.count(), 1);

    // AND verify reports a healthy installation
    let output = plugbridge(
        &fixture,
        &["verify", "--artifacts-dir", &out, "--target-dir", &target],
    )?;
    let stdout = text(&output.stdout);
    assert!(output.status.success(), "{stdout}");
    assert!(stdout.contains("Commands: 2/2"));
    assert!(stdout.contains("Installation is healthy."));
    Ok(())
}

#[test]
fn given_missing_file_when_verify_then_exit_code_is_one() -> Result<()> {
    let fixture = PluginFixture::new()?;
    fixture.sample_plugin("base")?;
    let source = fixture.source_root.to_string_lossy().into_owned();
    let out = fixture.path("dist").to_string_lossy().into_owned();
    let target = fixture.path("opencode").to_string_lossy().into_owned();
    assert!(plugbridge(&fixture, &build_args(&source, &out))?.status.success());
    assert!(plugbridge(&fixture, &["install", "--artifacts-dir", &out, "--target-dir", &target])?
        .status
        .success());

    fs::remove_file(Path::new(&target).join("command/rp1-base/review.md"))?;
    let output = plugbridge(
        &fixture,
        &["verify", "--artifacts-dir", &out, "--target-dir", &target],
    )?;

    assert_eq!(output.status.code(), Some(1));
    assert!(text(&output.stdout).contains("Missing commands (1): review."));
    Ok(())
}

#[test]
fn given_config_file_when_build_then_output_dir_comes_from_config() -> Result<()> {
    let fixture = PluginFixture::new()?;
    fixture.sample_plugin("base")?;
    fs::create_dir_all(fixture.path("home"))?;
    fs::write(
        fixture.path("home/config.toml"),
        format!(
            "[build]\nsource_root = \"{}\"\noutput_dir = \"configured-out\"\n",
            fixture.source_root.display()
        ),
    )?;

    let output = plugbridge(&fixture, &["build"])?;

    assert!(output.status.success(), "{}", text(&output.stderr));
    assert!(fixture.path("configured-out/base/manifest.json").is_file());
    Ok(())
}

#[test]
fn given_output_when_clean_force_then_directory_is_removed() -> Result<()> {
    let fixture = PluginFixture::new()?;
    let out = fixture.path("dist");
    fs::create_dir_all(out.join("base"))?;
    let out = out.to_string_lossy().into_owned();

    let output = plugbridge(&fixture, &["clean", "--output-dir", &out, "--force"])?;

    assert!(output.status.success(), "{}", text(&output.stderr));
    assert!(!Path::new(&out).exists());
    Ok(())
}

#[test]
fn given_no_build_output_when_validate_then_exit_code_is_one() -> Result<()> {
    let fixture = PluginFixture::new()?;
    let missing = fixture.path("nothing").to_string_lossy().into_owned();

    let output = plugbridge(&fixture, &["validate", "--artifacts-dir", &missing])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(text(&output.stderr).contains("Artifacts directory not found"));
    Ok(())
}
