//! 모듈 스캐너 오케스트레이터 -- 전체 스캔 흐름 관리
//!
//! [`ModuleScanner`]는 스캔 객체 목록을 받아 아티팩트마다 블로킹 분석 태스크를
//! 실행하고, 결과를 제출 순서대로 단일 집계 루프에서 [`Summary`]에 반영합니다.
//!
//! # 내부 아키텍처
//!
//! ```text
//! ScanObject --> ArtifactRecord --spawn_blocking--> ArtifactAnalyzer
//!                                                     |
//!                          JarArchive -> ModuleIdentityResolver -> ModuleIdentity
//!                          PomParser  -> CoordinateResolver     -> ResolvedCoordinate
//!                                                     |
//!                                                   Item
//!                                                     |
//!                         (제출 순서) 집계 루프 --> Classifier --> Summary
//! ```
//!
//! 동시에 실행되는 분석은 `workers`개로 제한됩니다.
//! 취소되면 실행 중인 분석 결과는 버리고 부분 요약을 `cancelled`로 표시해 반환합니다.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use modscan_core::metrics as m;

use crate::archive::{Archive, JarArchive};
use crate::classify::Classifier;
use crate::config::ModuleScannerConfig;
use crate::error::ModuleScannerError;
use crate::known::KnownModules;
use crate::module::ModuleIdentityResolver;
use crate::pom::{
    CoordinateResolver, DocumentCache, DocumentLoader, NoParentLoader, PomParser,
    RepositoryLoader,
};
use crate::summary::Summary;
use crate::types::Item;

/// 임베디드 POM 디렉토리
const EMBEDDED_POM_DIR: &str = "META-INF/maven/";

/// 분석 대상 아티팩트 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    /// 출처 참조 (리포트에 그대로 표기)
    pub line: String,
    /// JAR 경로
    pub jar: PathBuf,
    /// 명시적 POM 경로 (없으면 형제 `.pom` 또는 임베디드 POM 사용)
    pub pom: Option<PathBuf>,
}

impl ArtifactRecord {
    /// JAR 경로만으로 레코드를 생성합니다 (`line`은 경로 문자열).
    pub fn from_jar(jar: impl Into<PathBuf>) -> Self {
        let jar = jar.into();
        Self {
            line: jar.display().to_string(),
            jar,
            pom: None,
        }
    }

    pub fn with_pom(mut self, pom: impl Into<PathBuf>) -> Self {
        self.pom = Some(pom.into());
        self
    }
}

/// 스캔 객체 (아티팩트 묶음 하나)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanObject {
    pub name: String,
    pub artifacts: Vec<ArtifactRecord>,
}

impl ScanObject {
    pub fn new(name: impl Into<String>, artifacts: Vec<ArtifactRecord>) -> Self {
        Self {
            name: name.into(),
            artifacts,
        }
    }
}

/// 스캔 결과
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub summary: Summary,
    /// 실행 중 추가/갱신된 항목을 포함한 알려진 모듈 DB
    pub known: KnownModules,
}

/// 아티팩트 하나를 분석하는 동기 분석기
///
/// `spawn_blocking` 태스크마다 복제되며, 부모 문서 로더는 태스크 간에 공유됩니다.
#[derive(Clone)]
pub struct ArtifactAnalyzer {
    identity: ModuleIdentityResolver,
    parser: PomParser,
    coordinates: CoordinateResolver,
    loader: Arc<dyn DocumentLoader>,
    accept_file_name_derived: bool,
    max_archive_size: u64,
    max_document_size: u64,
}

impl ArtifactAnalyzer {
    pub fn new(config: &ModuleScannerConfig, loader: Arc<dyn DocumentLoader>) -> Self {
        Self {
            identity: ModuleIdentityResolver::new(),
            parser: PomParser::new(),
            coordinates: CoordinateResolver::new(),
            loader,
            accept_file_name_derived: config.accept_file_name_derived,
            max_archive_size: config.max_archive_size,
            max_document_size: config.max_document_size,
        }
    }

    /// 아티팩트를 분석합니다 (동기 I/O).
    ///
    /// 모듈명을 결정할 수 없으면 `Ok(None)`을 반환합니다.
    pub fn analyze(&self, record: &ArtifactRecord) -> Result<Option<Item>, ModuleScannerError> {
        let archive = JarArchive::open(&record.jar, self.max_archive_size)?;

        let Some(identity) = self
            .identity
            .resolve(&archive, self.accept_file_name_derived)?
        else {
            debug!(line = %record.line, "no module name, skipping coordinate lookup");
            return Ok(None);
        };

        let (bytes, origin) = self.coordinate_document(record, &archive)?;
        let document = self.parser.parse(&bytes, &origin)?;
        let coordinate = self.coordinates.resolve(&document, self.loader.as_ref())?;

        Ok(Some(Item {
            module_name: identity.name.clone(),
            line: record.line.clone(),
            identity,
            coordinate,
        }))
    }

    /// POM 바이트와 출처를 찾습니다: 명시 경로 -> 형제 `.pom` -> 단일 임베디드 POM
    fn coordinate_document(
        &self,
        record: &ArtifactRecord,
        archive: &JarArchive,
    ) -> Result<(Vec<u8>, String), ModuleScannerError> {
        if let Some(pom) = &record.pom {
            return self.read_document(pom);
        }

        let sibling = record.jar.with_extension("pom");
        if sibling.is_file() {
            return self.read_document(&sibling);
        }

        let embedded: Vec<String> = archive
            .entries_under(EMBEDDED_POM_DIR)
            .into_iter()
            .filter(|name| name.ends_with("/pom.xml"))
            .collect();
        match embedded.as_slice() {
            [entry] => {
                let bytes = archive.read_entry(entry)?;
                Ok((bytes, format!("{}!/{entry}", archive.path())))
            }
            entries => {
                debug!(
                    line = %record.line,
                    embedded = entries.len(),
                    "no unambiguous coordinate document"
                );
                Err(ModuleScannerError::DocumentNotFound {
                    path: record.jar.display().to_string(),
                })
            }
        }
    }

    fn read_document(&self, path: &Path) -> Result<(Vec<u8>, String), ModuleScannerError> {
        let display = path.display().to_string();
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ModuleScannerError::DocumentNotFound {
                    path: display.clone(),
                }
            } else {
                ModuleScannerError::Io {
                    path: display.clone(),
                    source: e,
                }
            }
        })?;
        if metadata.len() > self.max_document_size {
            return Err(ModuleScannerError::FileTooBig {
                path: display,
                size: metadata.len(),
                max: self.max_document_size,
            });
        }
        let bytes = std::fs::read(path).map_err(|e| ModuleScannerError::Io {
            path: display.clone(),
            source: e,
        })?;
        Ok((bytes, display))
    }
}

type AnalysisHandle = JoinHandle<Result<Option<Item>, ModuleScannerError>>;

/// 모듈 스캐너 오케스트레이터
pub struct ModuleScanner {
    config: ModuleScannerConfig,
    analyzer: ArtifactAnalyzer,
    known: KnownModules,
}

impl ModuleScanner {
    pub fn config(&self) -> &ModuleScannerConfig {
        &self.config
    }

    /// 시작 시점의 알려진 모듈 DB
    pub fn known(&self) -> &KnownModules {
        &self.known
    }

    /// 스캔 객체 목록을 스캔합니다.
    ///
    /// 아티팩트 단위 에러는 요약에 기록되고 스캔은 계속됩니다.
    /// `cancel`이 취소되면 지금까지의 부분 요약을 `cancelled = true`로 반환합니다.
    pub async fn scan(
        &self,
        objects: Vec<ScanObject>,
        cancel: CancellationToken,
    ) -> Result<ScanOutcome, ModuleScannerError> {
        let mut summary = Summary::new();
        summary.started_with = self.known.len();
        if !self.config.started_after.is_empty() {
            summary.started_after = Some(self.config.started_after.clone());
        }

        let mut classifier =
            Classifier::new(self.known.clone(), self.config.group_aliases.clone());
        let mut in_flight: VecDeque<(String, AnalysisHandle)> =
            VecDeque::with_capacity(self.config.workers);

        info!(
            objects = objects.len(),
            workers = self.config.workers,
            known = self.known.len(),
            "module scan started"
        );

        'objects: for object in objects {
            if cancel.is_cancelled() {
                break;
            }
            debug!(object = %object.name, artifacts = object.artifacts.len(), "scanning object");
            summary.begin_object(&object.name);

            for record in object.artifacts {
                if cancel.is_cancelled() {
                    break 'objects;
                }

                while in_flight.len() >= self.config.workers {
                    if !self
                        .drain_one(&mut in_flight, &mut summary, &mut classifier, &cancel)
                        .await?
                    {
                        break 'objects;
                    }
                }

                let analyzer = self.analyzer.clone();
                let line = record.line.clone();
                let handle = tokio::task::spawn_blocking(move || analyzer.analyze(&record));
                in_flight.push_back((line, handle));
            }
        }

        while !in_flight.is_empty() {
            if !self
                .drain_one(&mut in_flight, &mut summary, &mut classifier, &cancel)
                .await?
            {
                break;
            }
        }

        if cancel.is_cancelled() {
            for (line, handle) in in_flight.drain(..) {
                debug!(line = %line, "discarding in-flight analysis");
                handle.abort();
            }
            summary.cancelled = true;
            warn!(
                lines = summary.scan_line_counter,
                "module scan cancelled, returning partial summary"
            );
        }

        info!(
            objects = summary.scan_object_counter,
            lines = summary.scan_line_counter,
            modules = summary.scan_module_counter,
            uniques = summary.uniques.len(),
            updates = summary.updates.len(),
            suspicious = summary.suspicious.len(),
            errors = summary.scan_error_counter,
            "module scan completed"
        );

        Ok(ScanOutcome {
            summary,
            known: classifier.into_known(),
        })
    }

    /// 가장 먼저 제출된 분석 결과를 기다려 집계합니다.
    ///
    /// 취소되면 false를 반환합니다 (대기 중이던 태스크는 큐에 남음).
    async fn drain_one(
        &self,
        in_flight: &mut VecDeque<(String, AnalysisHandle)>,
        summary: &mut Summary,
        classifier: &mut Classifier,
        cancel: &CancellationToken,
    ) -> Result<bool, ModuleScannerError> {
        let Some((line, mut handle)) = in_flight.pop_front() else {
            return Ok(true);
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                in_flight.push_front((line, handle));
                Ok(false)
            }
            joined = &mut handle => {
                fold(summary, classifier, &line, joined)?;
                Ok(true)
            }
        }
    }
}

/// 분석 결과 하나를 요약에 반영합니다.
fn fold(
    summary: &mut Summary,
    classifier: &mut Classifier,
    line: &str,
    joined: Result<Result<Option<Item>, ModuleScannerError>, JoinError>,
) -> Result<(), ModuleScannerError> {
    summary.scan_line_counter += 1;
    metrics::counter!(m::SCANNER_ARTIFACTS_SCANNED_TOTAL).increment(1);

    match joined {
        Ok(Ok(Some(item))) => {
            summary.scan_module_counter += 1;
            metrics::counter!(
                m::SCANNER_MODULES_DETECTED_TOTAL,
                m::LABEL_SOURCE => item.identity.source.as_str()
            )
            .increment(1);

            let classification = classifier.classify(summary, item);
            metrics::counter!(
                m::SCANNER_CLASSIFICATIONS_TOTAL,
                m::LABEL_BUCKET => classification.as_str()
            )
            .increment(1);
        }
        Ok(Ok(None)) => {
            debug!(line, "artifact has no module name");
        }
        Ok(Err(e)) if e.is_artifact_error() => {
            warn!(line, error = %e, "artifact analysis failed, skipping");
            metrics::counter!(m::SCANNER_ERRORS_TOTAL).increment(1);
            summary.record_error(line, e.to_string());
        }
        Ok(Err(e)) => return Err(e),
        Err(e) => {
            warn!(line, error = %e, "analysis task failed");
            metrics::counter!(m::SCANNER_ERRORS_TOTAL).increment(1);
            summary.record_error(line, format!("analysis task failed: {e}"));
        }
    }

    Ok(())
}

/// 알려진 모듈 DB를 읽습니다 (블로킹 I/O는 `spawn_blocking`에서 실행).
///
/// 경로가 비어 있으면 빈 DB를 반환합니다.
pub async fn load_known_modules(path: &str) -> Result<KnownModules, ModuleScannerError> {
    if path.is_empty() {
        return Ok(KnownModules::new());
    }
    let path = PathBuf::from(path);
    tokio::task::spawn_blocking(move || KnownModules::load(&path))
        .await
        .map_err(|e| ModuleScannerError::Channel(format!("spawn_blocking failed: {e}")))?
}

/// 모듈 스캐너 빌더
pub struct ModuleScannerBuilder {
    config: ModuleScannerConfig,
    known: KnownModules,
    loader: Option<Arc<dyn DocumentLoader>>,
}

impl ModuleScannerBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: ModuleScannerConfig::default(),
            known: KnownModules::new(),
            loader: None,
        }
    }

    /// 스캐너 설정을 지정합니다.
    pub fn config(mut self, config: ModuleScannerConfig) -> Self {
        self.config = config;
        self
    }

    /// 시작 시점의 알려진 모듈 DB를 지정합니다.
    pub fn known_modules(mut self, known: KnownModules) -> Self {
        self.known = known;
        self
    }

    /// 부모 문서 로더를 지정합니다.
    ///
    /// 지정하지 않으면 `repository_path`가 있을 때 캐시된 [`RepositoryLoader`],
    /// 없으면 부모를 해석하지 않는 [`NoParentLoader`]를 사용합니다.
    pub fn loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// 스캐너를 빌드합니다.
    ///
    /// # Errors
    ///
    /// 설정 유효성 검증 실패 시 `ModuleScannerError::Config`
    pub fn build(self) -> Result<ModuleScanner, ModuleScannerError> {
        self.config.validate()?;

        let loader = self.loader.unwrap_or_else(|| {
            if self.config.repository_path.is_empty() {
                Arc::new(NoParentLoader)
            } else {
                Arc::new(DocumentCache::new(
                    RepositoryLoader::new(&self.config.repository_path)
                        .with_max_document_size(self.config.max_document_size),
                ))
            }
        });

        let analyzer = ArtifactAnalyzer::new(&self.config, loader);

        Ok(ModuleScanner {
            config: self.config,
            analyzer,
            known: self.known,
        })
    }
}

impl Default for ModuleScannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::JarBuilder;
    use crate::types::ModuleSource;

    const APIGUARDIAN_POM: &str = "<project><groupId>org.apiguardian</groupId>\
        <artifactId>apiguardian-api</artifactId><version>1.1.2</version>\
        <name>org.apiguardian:apiguardian-api</name></project>";

    fn write_jar(dir: &Path, name: &str, builder: JarBuilder) -> PathBuf {
        let path = dir.join(name);
        builder.write_to(&path).unwrap();
        path
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = ModuleScannerBuilder::new()
            .config(ModuleScannerConfig {
                workers: 0,
                ..Default::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn analyzer_uses_sibling_pom() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_jar(
            dir.path(),
            "apiguardian-api-1.1.2.jar",
            JarBuilder::new().manifest(&[("Automatic-Module-Name", "org.apiguardian.api")]),
        );
        std::fs::write(dir.path().join("apiguardian-api-1.1.2.pom"), APIGUARDIAN_POM).unwrap();

        let analyzer =
            ArtifactAnalyzer::new(&ModuleScannerConfig::default(), Arc::new(NoParentLoader));
        let item = analyzer
            .analyze(&ArtifactRecord::from_jar(&jar))
            .unwrap()
            .unwrap();
        assert_eq!(item.module_name, "org.apiguardian.api");
        assert_eq!(item.identity.source, ModuleSource::ManifestAttribute);
        assert_eq!(item.coordinate.group, "org.apiguardian");
        assert_eq!(item.coordinate.artifact, "apiguardian-api");
    }

    #[test]
    fn analyzer_uses_embedded_pom() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_jar(
            dir.path(),
            "explicit-module.jar",
            JarBuilder::new()
                .module_info("ice.cream")
                .stored(
                    "META-INF/maven/ice/cream/pom.xml",
                    b"<project><groupId>ice</groupId><artifactId>cream</artifactId></project>",
                ),
        );

        let analyzer =
            ArtifactAnalyzer::new(&ModuleScannerConfig::default(), Arc::new(NoParentLoader));
        let item = analyzer
            .analyze(&ArtifactRecord::from_jar(&jar))
            .unwrap()
            .unwrap();
        assert_eq!(item.module_name, "ice.cream");
        assert_eq!(item.coordinate.group, "ice");
    }

    #[test]
    fn analyzer_prefers_explicit_pom() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_jar(
            dir.path(),
            "a.jar",
            JarBuilder::new().manifest(&[("Automatic-Module-Name", "org.apiguardian.api")]),
        );
        std::fs::write(
            dir.path().join("a.pom"),
            "<project><groupId>wrong</groupId><artifactId>wrong</artifactId></project>",
        )
        .unwrap();
        let explicit = dir.path().join("explicit.xml");
        std::fs::write(&explicit, APIGUARDIAN_POM).unwrap();

        let analyzer =
            ArtifactAnalyzer::new(&ModuleScannerConfig::default(), Arc::new(NoParentLoader));
        let item = analyzer
            .analyze(&ArtifactRecord::from_jar(&jar).with_pom(&explicit))
            .unwrap()
            .unwrap();
        assert_eq!(item.coordinate.group, "org.apiguardian");
    }

    #[test]
    fn analyzer_without_pom_is_document_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_jar(
            dir.path(),
            "a.jar",
            JarBuilder::new().manifest(&[("Automatic-Module-Name", "a.b")]),
        );
        let analyzer =
            ArtifactAnalyzer::new(&ModuleScannerConfig::default(), Arc::new(NoParentLoader));
        let err = analyzer
            .analyze(&ArtifactRecord::from_jar(&jar))
            .unwrap_err();
        assert!(matches!(err, ModuleScannerError::DocumentNotFound { .. }));
    }

    #[test]
    fn analyzer_skips_coordinates_when_no_module_name() {
        let dir = tempfile::tempdir().unwrap();
        let jar = write_jar(dir.path(), "-1.0.jar", JarBuilder::new().directory("META-INF/"));
        let analyzer =
            ArtifactAnalyzer::new(&ModuleScannerConfig::default(), Arc::new(NoParentLoader));
        assert_eq!(analyzer.analyze(&ArtifactRecord::from_jar(&jar)).unwrap(), None);
    }

    #[tokio::test]
    async fn scan_aggregates_results_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_jar(
            dir.path(),
            "apiguardian-api-1.1.2.jar",
            JarBuilder::new().manifest(&[("Automatic-Module-Name", "org.apiguardian.api")]),
        );
        std::fs::write(dir.path().join("apiguardian-api-1.1.2.pom"), APIGUARDIAN_POM).unwrap();
        let broken = dir.path().join("broken.jar");
        std::fs::write(&broken, b"not a zip").unwrap();

        let scanner = ModuleScannerBuilder::new().build().unwrap();
        let outcome = scanner
            .scan(
                vec![ScanObject::new(
                    "libs",
                    vec![
                        ArtifactRecord::from_jar(&good),
                        ArtifactRecord::from_jar(&broken),
                    ],
                )],
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let summary = outcome.summary;
        assert_eq!(summary.scan_object_counter, 1);
        assert_eq!(summary.scan_line_counter, 2);
        assert_eq!(summary.scan_module_counter, 1);
        assert_eq!(summary.scan_error_counter, 1);
        assert!(summary.uniques.contains_key("org.apiguardian.api"));
        assert_eq!(summary.errors[0].line, broken.display().to_string());
        assert!(!summary.cancelled);
        assert!(outcome.known.contains("org.apiguardian.api"));
    }

    #[tokio::test]
    async fn scan_with_cancelled_token_returns_partial_summary() {
        let scanner = ModuleScannerBuilder::new().build().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = scanner
            .scan(
                vec![ScanObject::new(
                    "libs",
                    vec![ArtifactRecord::from_jar("/nonexistent/a.jar")],
                )],
                cancel,
            )
            .await
            .unwrap();
        assert!(outcome.summary.cancelled);
        assert_eq!(outcome.summary.scan_line_counter, 0);
        assert_eq!(outcome.summary.scan_object_counter, 0);
    }

    #[tokio::test]
    async fn scan_records_started_with_and_after() {
        let mut known = KnownModules::new();
        known.insert(
            "a.b",
            crate::types::ResolvedCoordinate {
                group: "a".to_owned(),
                artifact: "b".to_owned(),
                version: None,
                name: None,
            },
        );
        let scanner = ModuleScannerBuilder::new()
            .config(ModuleScannerConfig {
                started_after: "batch-7".to_owned(),
                ..Default::default()
            })
            .known_modules(known)
            .build()
            .unwrap();

        let outcome = scanner
            .scan(Vec::new(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.summary.started_with, 1);
        assert_eq!(outcome.summary.started_after.as_deref(), Some("batch-7"));
    }

    #[tokio::test]
    async fn load_known_modules_empty_path() {
        let known = load_known_modules("").await.unwrap();
        assert!(known.is_empty());
    }
}
