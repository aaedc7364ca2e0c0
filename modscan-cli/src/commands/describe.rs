//! `modscan describe` command handler

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use modscan_core::config::ModscanConfig;
use modscan_module_scanner::{
    JarArchive, ModuleIdentityResolver, ModuleScannerConfig, ModuleScannerError, Resolution,
};

use crate::cli::DescribeArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `describe` command.
///
/// Only module identity is resolved; the POM is not consulted.
pub async fn execute(
    args: DescribeArgs,
    config: &ModscanConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let scanner_config = ModuleScannerConfig::from_core(&config.scanner);
    let accept = args.accept_file_name_derived || scanner_config.accept_file_name_derived;
    let max_size = scanner_config.max_archive_size;

    info!(path = %args.jar.display(), "describing artifact");

    let jar = args.jar;
    let report = tokio::task::spawn_blocking(move || describe(jar, max_size, accept))
        .await
        .map_err(|e| CliError::Command(format!("spawn_blocking failed: {e}")))??;

    writer.render(&report)
}

fn describe(
    jar: PathBuf,
    max_size: u64,
    accept: bool,
) -> Result<DescribeReport, ModuleScannerError> {
    let archive = JarArchive::open(&jar, max_size)?;
    let resolution = ModuleIdentityResolver::new().describe(&archive)?;

    let path = jar.display().to_string();
    Ok(match resolution {
        Resolution::Declared(identity) => DescribeReport {
            path,
            module: Some(identity.name),
            source: Some(identity.source.as_str()),
            valid: true,
        },
        Resolution::Derived(identity) => DescribeReport {
            path,
            module: Some(identity.name),
            source: Some(identity.source.as_str()),
            valid: accept,
        },
        Resolution::Absent => DescribeReport {
            path,
            module: None,
            source: None,
            valid: false,
        },
    })
}

/// Module identity of one artifact.
#[derive(Debug, Serialize)]
pub struct DescribeReport {
    pub path: String,
    pub module: Option<String>,
    pub source: Option<&'static str>,
    /// Whether the name would be accepted by a scan with the same settings.
    pub valid: bool,
}

impl Render for DescribeReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Artifact: {}", self.path.bold())?;
        match (&self.module, self.source) {
            (Some(module), Some(source)) => {
                writeln!(w, "  Module: {module}")?;
                writeln!(w, "  Source: {source}")?;
                if self.valid {
                    writeln!(w, "  Result: {}", "ACCEPTED".green().bold())?;
                } else {
                    writeln!(
                        w,
                        "  Result: {} (file-name derived, use --accept-file-name-derived)",
                        "REJECTED".red().bold()
                    )?;
                }
            }
            _ => writeln!(w, "  Module: {}", "(none)".dimmed())?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modscan_module_scanner::testing::JarBuilder;

    fn write(dir: &std::path::Path, name: &str, builder: JarBuilder) -> PathBuf {
        let path = dir.join(name);
        builder.write_to(&path).unwrap();
        path
    }

    #[test]
    fn test_describe_manifest_name() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write(
            dir.path(),
            "automatic-module-name-present.jar",
            JarBuilder::new().manifest(&[("Automatic-Module-Name", "org.apiguardian.api")]),
        );
        let report = describe(jar, 1024 * 1024, false).unwrap();
        assert_eq!(report.module.as_deref(), Some("org.apiguardian.api"));
        assert_eq!(report.source, Some("manifest_attribute"));
        assert!(report.valid);
    }

    #[test]
    fn test_describe_derived_name_depends_on_acceptance() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write(
            dir.path(),
            "automatic-module-name-not-present.jar",
            JarBuilder::new().directory("META-INF/"),
        );

        let rejected = describe(jar.clone(), 1024 * 1024, false).unwrap();
        assert_eq!(
            rejected.module.as_deref(),
            Some("automatic.module.name.not.present")
        );
        assert!(!rejected.valid);

        let accepted = describe(jar, 1024 * 1024, true).unwrap();
        assert!(accepted.valid);
    }

    #[test]
    fn test_describe_without_meta_inf_fails() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write(
            dir.path(),
            "bare.jar",
            JarBuilder::new().stored("a/B.class", b"\xca\xfe\xba\xbe"),
        );
        let err = describe(jar, 1024 * 1024, true).unwrap_err();
        assert!(matches!(err, ModuleScannerError::MetaInfNotPresent { .. }));
    }

    #[test]
    fn test_render_text_rejected() {
        let report = DescribeReport {
            path: "x.jar".to_owned(),
            module: Some("x".to_owned()),
            source: Some("file_name_derived"),
            valid: false,
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("REJECTED"));
        assert!(output.contains("Source: file_name_derived"));
    }
}
