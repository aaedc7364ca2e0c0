//! `modscan scan` command handler

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use modscan_core::config::ModscanConfig;
use modscan_module_scanner::{
    ArtifactRecord, ModuleScannerBuilder, ModuleScannerConfig, ScanObject, ScanReport, Summary,
    load_known_modules,
};

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `scan` command.
///
/// Returns `CliError::SuspiciousFound` (exit code 4) when any module was
/// classified as suspicious.
pub async fn execute(
    args: ScanArgs,
    config: &ModscanConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let scanner_config = scanner_config(&args, config)?;

    let known = load_known_modules(&scanner_config.known_modules_path).await?;
    let scanner = ModuleScannerBuilder::new()
        .config(scanner_config)
        .known_modules(known)
        .build()?;

    let paths = args.paths;
    let objects = tokio::task::spawn_blocking(move || collect_objects(&paths))
        .await
        .map_err(|e| CliError::Command(format!("spawn_blocking failed: {e}")))??;
    info!(objects = objects.len(), "starting module scan");

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling scan");
                cancel.cancel();
            }
        })
    };

    let outcome = scanner.scan(objects, cancel).await;
    interrupt.abort();
    let outcome = outcome?;

    let output = ScanOutput::from_summary(&outcome.summary);
    writer.render(&output)?;

    let suspicious = outcome.summary.suspicious.len();
    if suspicious > 0 {
        return Err(CliError::SuspiciousFound(suspicious));
    }

    Ok(())
}

/// Merge command-line overrides into the configured scanner section.
fn scanner_config(
    args: &ScanArgs,
    config: &ModscanConfig,
) -> Result<ModuleScannerConfig, CliError> {
    let mut scanner_config = ModuleScannerConfig::from_core(&config.scanner);

    if let Some(repository) = &args.repository {
        scanner_config.repository_path = repository.clone();
    }
    if let Some(known) = &args.known {
        scanner_config.known_modules_path = known.clone();
    }
    if args.accept_file_name_derived {
        scanner_config.accept_file_name_derived = true;
    }
    if let Some(workers) = args.workers {
        scanner_config.workers = workers;
    }
    if let Some(started_after) = &args.started_after {
        scanner_config.started_after = started_after.clone();
    }
    for alias in &args.aliases {
        let (group, prefix) = parse_alias(alias)?;
        scanner_config
            .group_aliases
            .entry(group.to_owned())
            .or_default()
            .push(prefix.to_owned());
    }

    scanner_config.validate()?;
    Ok(scanner_config)
}

fn parse_alias(alias: &str) -> Result<(&str, &str), CliError> {
    match alias.split_once('=') {
        Some((group, prefix)) if !group.trim().is_empty() && !prefix.trim().is_empty() => {
            Ok((group.trim(), prefix.trim()))
        }
        _ => Err(CliError::Command(format!(
            "invalid alias: {alias} (expected: GROUP=PREFIX)"
        ))),
    }
}

/// Turn command-line paths into scan objects (synchronous I/O).
///
/// A directory becomes one object holding its direct `.jar` children in name
/// order; a file becomes a single-artifact object.
fn collect_objects(paths: &[PathBuf]) -> Result<Vec<ScanObject>, CliError> {
    let mut objects = Vec::with_capacity(paths.len());

    for path in paths {
        let metadata = std::fs::metadata(path).map_err(|e| {
            CliError::Command(format!("cannot access {}: {e}", path.display()))
        })?;

        if metadata.is_dir() {
            let jars = list_jars(path)?;
            if jars.is_empty() {
                warn!(dir = %path.display(), "no JAR files in directory");
            }
            let artifacts = jars.into_iter().map(ArtifactRecord::from_jar).collect();
            objects.push(ScanObject::new(path.display().to_string(), artifacts));
        } else {
            objects.push(ScanObject::new(
                path.display().to_string(),
                vec![ArtifactRecord::from_jar(path)],
            ));
        }
    }

    Ok(objects)
}

fn list_jars(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    // 재귀 없이 1단계만 탐색
    let entries = std::fs::read_dir(dir)?;

    let mut jars = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to read directory entry");
                continue;
            }
        };
        let path = entry.path();
        let is_jar = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"));
        if is_jar && path.is_file() {
            jars.push(path);
        }
    }

    jars.sort();
    Ok(jars)
}

/// Scan result payload.
///
/// JSON carries the structured report; text and Markdown use the summary's
/// own renderings.
#[derive(Serialize)]
pub struct ScanOutput {
    #[serde(flatten)]
    pub report: ScanReport,
    #[serde(skip)]
    pub summary_lines: Vec<String>,
    #[serde(skip)]
    pub markdown_lines: Vec<String>,
}

impl ScanOutput {
    pub fn from_summary(summary: &Summary) -> Self {
        Self {
            report: summary.report(),
            summary_lines: summary.to_strings(),
            markdown_lines: summary.to_markdown(),
        }
    }
}

impl Render for ScanOutput {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        for line in &self.summary_lines {
            writeln!(w, "{line}")?;
        }

        let suspicious = [
            ("Syntax Error", &self.report.syntax),
            ("Impostor", &self.report.impostors),
            ("Unexpected Naming", &self.report.naming),
        ];
        for (title, entries) in suspicious {
            if entries.is_empty() {
                continue;
            }
            writeln!(w)?;
            writeln!(w, "{}", format!("{title} ({})", entries.len()).red().bold())?;
            for entry in entries {
                writeln!(
                    w,
                    "  {:<40} {}:{} ({})",
                    entry.module, entry.group, entry.artifact, entry.line
                )?;
            }
        }

        if !self.report.scan_errors.is_empty() {
            writeln!(w)?;
            writeln!(
                w,
                "{}",
                format!("Scan Errors ({})", self.report.scan_errors.len()).yellow()
            )?;
            for error in &self.report.scan_errors {
                writeln!(w, "  {} -> {}", error.line, error.error)?;
            }
        }

        Ok(())
    }

    fn render_markdown(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for line in &self.markdown_lines {
            writeln!(w, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modscan_module_scanner::testing::JarBuilder;

    fn scan_args(paths: Vec<PathBuf>) -> ScanArgs {
        ScanArgs {
            paths,
            repository: None,
            known: None,
            accept_file_name_derived: false,
            aliases: Vec::new(),
            workers: None,
            started_after: None,
        }
    }

    #[test]
    fn test_parse_alias() {
        assert_eq!(
            parse_alias("io.projectreactor=reactor").unwrap(),
            ("io.projectreactor", "reactor")
        );
        assert!(parse_alias("no-separator").is_err());
        assert!(parse_alias("=reactor").is_err());
        assert!(parse_alias("group=").is_err());
    }

    #[test]
    fn test_scanner_config_applies_overrides() {
        let mut args = scan_args(vec![PathBuf::from(".")]);
        args.repository = Some("/srv/m2".to_owned());
        args.accept_file_name_derived = true;
        args.workers = Some(2);
        args.aliases = vec!["io.projectreactor=reactor".to_owned()];

        let config = scanner_config(&args, &ModscanConfig::default()).unwrap();
        assert_eq!(config.repository_path, "/srv/m2");
        assert!(config.accept_file_name_derived);
        assert_eq!(config.workers, 2);
        assert_eq!(config.group_aliases["io.projectreactor"], vec!["reactor"]);
    }

    #[test]
    fn test_scanner_config_rejects_invalid_workers() {
        let mut args = scan_args(vec![PathBuf::from(".")]);
        args.workers = Some(0);
        let err = scanner_config(&args, &ModscanConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_collect_objects_lists_direct_jars_sorted() {
        let dir = tempfile::tempdir().unwrap();
        JarBuilder::new().write_to(&dir.path().join("b.jar")).unwrap();
        JarBuilder::new().write_to(&dir.path().join("a.JAR")).unwrap();
        std::fs::write(dir.path().join("a.pom"), "<project/>").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        JarBuilder::new()
            .write_to(&dir.path().join("nested").join("c.jar"))
            .unwrap();

        let objects = collect_objects(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(objects.len(), 1);
        let names: Vec<_> = objects[0]
            .artifacts
            .iter()
            .map(|a| a.jar.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JAR", "b.jar"]);
    }

    #[test]
    fn test_collect_objects_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("one.jar");
        JarBuilder::new().write_to(&jar).unwrap();

        let objects = collect_objects(std::slice::from_ref(&jar)).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].artifacts.len(), 1);
        assert_eq!(objects[0].artifacts[0].jar, jar);
    }

    #[test]
    fn test_collect_objects_missing_path_fails() {
        let err = collect_objects(&[PathBuf::from("/nonexistent/libs")]).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_scan_output_renders_all_formats() {
        let mut summary = Summary::with_timestamp("2026-01-01-00-00-00");
        summary.begin_object("libs");
        summary.record_error("libs/broken.jar", "archive unreadable");
        let output = ScanOutput::from_summary(&summary);

        let mut text = Vec::new();
        output.render_text(&mut text).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.contains("Summary of 2026-01-01-00-00-00"));
        assert!(text.contains("libs/broken.jar -> archive unreadable"));

        let mut markdown = Vec::new();
        output.render_markdown(&mut markdown).unwrap();
        let markdown = String::from_utf8(markdown).unwrap();
        assert!(markdown.starts_with("# Scan `2026-01-01-00-00-00`"));

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["objects"], 1);
        assert_eq!(json["errors"], 1);
        assert!(json.get("summary_lines").is_none());
    }

    #[tokio::test]
    async fn test_execute_reports_suspicious_modules() {
        let dir = tempfile::tempdir().unwrap();
        JarBuilder::new()
            .manifest(&[("Automatic-Module-Name", "com.elsewhere.odd")])
            .write_to(&dir.path().join("odd-1.0.jar"))
            .unwrap();
        std::fs::write(
            dir.path().join("odd-1.0.pom"),
            "<project><groupId>org.example</groupId><artifactId>odd</artifactId></project>",
        )
        .unwrap();

        let err = execute(
            scan_args(vec![dir.path().to_path_buf()]),
            &ModscanConfig::default(),
            &OutputWriter::new(crate::cli::OutputFormat::Json),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::SuspiciousFound(1)));
        assert_eq!(err.exit_code(), 4);
    }
}
