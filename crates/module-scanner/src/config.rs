//! 모듈 스캐너 설정
//!
//! [`ModuleScannerConfig`]는 core의 [`ScannerSection`](modscan_core::config::ScannerSection)을
//! 확장하여 스캐너 고유 설정(아카이브/문서 크기 제한)을 추가합니다.
//!
//! # 사용 예시
//!
//! ```
//! use modscan_module_scanner::ModuleScannerConfigBuilder;
//!
//! let config = ModuleScannerConfigBuilder::new()
//!     .accept_file_name_derived(true)
//!     .workers(8)
//!     .group_alias("io.projectreactor", "reactor")
//!     .build()
//!     .unwrap();
//! assert_eq!(config.workers, 8);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModuleScannerError;

/// 설정 상한값 상수
const MAX_WORKERS: usize = 256;
const MAX_ARCHIVE_SIZE: u64 = 1024 * 1024 * 1024; // 1 GB
const MAX_DOCUMENT_SIZE: u64 = 16 * 1024 * 1024; // 16 MB
const MAX_PATH_LEN: usize = 4096;

/// 모듈 스캐너 설정
///
/// # 필드
///
/// - **accept_file_name_derived**: 파일명 기반 모듈명 허용 여부
/// - **repository_path**: 부모 POM 조회용 로컬 Maven 저장소 (비어 있으면 부모 해석 불가)
/// - **known_modules_path**: 알려진 모듈 DB 경로 (비어 있으면 빈 DB)
/// - **started_after**: 리포트에 표기할 이전 실행의 마지막 처리 대상
/// - **group_aliases**: 그룹 -> 모듈명 접두어 별칭
/// - **workers**: 동시 분석 작업 수
/// - **max_archive_size**: JAR 최대 크기 (바이트)
/// - **max_document_size**: POM 최대 크기 (바이트)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleScannerConfig {
    pub accept_file_name_derived: bool,
    pub repository_path: String,
    pub known_modules_path: String,
    pub started_after: String,
    pub group_aliases: BTreeMap<String, Vec<String>>,
    pub workers: usize,

    // --- 모듈 고유 확장 ---
    /// JAR 최대 허용 크기 (바이트)
    pub max_archive_size: u64,
    /// POM 최대 허용 크기 (바이트)
    pub max_document_size: u64,
}

impl Default for ModuleScannerConfig {
    fn default() -> Self {
        Self {
            accept_file_name_derived: false,
            repository_path: String::new(),
            known_modules_path: String::new(),
            started_after: String::new(),
            group_aliases: BTreeMap::new(),
            workers: 4,
            max_archive_size: 256 * 1024 * 1024, // 256 MB
            max_document_size: 1024 * 1024,      // 1 MB
        }
    }
}

impl ModuleScannerConfig {
    /// core의 `ScannerSection`에서 스캐너 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값을 사용합니다.
    pub fn from_core(core: &modscan_core::config::ScannerSection) -> Self {
        Self {
            accept_file_name_derived: core.accept_file_name_derived,
            repository_path: core.repository_path.clone(),
            known_modules_path: core.known_modules_path.clone(),
            started_after: core.started_after.clone(),
            group_aliases: core.group_aliases.clone(),
            workers: core.workers,
            ..Self::default()
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `workers`: 1-256
    /// - `max_archive_size`: 1-1073741824 (1GB)
    /// - `max_document_size`: 1-16777216 (16MB)
    /// - 경로: `..` 컴포넌트 금지, 4096자 이하
    /// - `group_aliases`: 빈 그룹/별칭 금지
    pub fn validate(&self) -> Result<(), ModuleScannerError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ModuleScannerError::Config {
                field: "workers".to_owned(),
                reason: format!("must be 1-{MAX_WORKERS}"),
            });
        }

        if self.max_archive_size == 0 || self.max_archive_size > MAX_ARCHIVE_SIZE {
            return Err(ModuleScannerError::Config {
                field: "max_archive_size".to_owned(),
                reason: format!("must be 1-{MAX_ARCHIVE_SIZE}"),
            });
        }

        if self.max_document_size == 0 || self.max_document_size > MAX_DOCUMENT_SIZE {
            return Err(ModuleScannerError::Config {
                field: "max_document_size".to_owned(),
                reason: format!("must be 1-{MAX_DOCUMENT_SIZE}"),
            });
        }

        for (field, path) in [
            ("repository_path", &self.repository_path),
            ("known_modules_path", &self.known_modules_path),
        ] {
            validate_path(field, path)?;
        }

        for (group, aliases) in &self.group_aliases {
            if group.is_empty() || aliases.iter().any(String::is_empty) {
                return Err(ModuleScannerError::Config {
                    field: "group_aliases".to_owned(),
                    reason: format!("group '{group}' has an empty group or alias"),
                });
            }
        }

        Ok(())
    }
}

/// 선택적 경로 설정을 검증합니다 (빈 값은 미사용).
fn validate_path(field: &str, path: &str) -> Result<(), ModuleScannerError> {
    if path.is_empty() {
        return Ok(());
    }

    // Path traversal 체크: Path::components()로 ParentDir 컴포넌트 검출
    if std::path::Path::new(path)
        .components()
        .any(|c| c == std::path::Component::ParentDir)
    {
        return Err(ModuleScannerError::Config {
            field: field.to_owned(),
            reason: format!("'{path}' contains path traversal pattern '..'"),
        });
    }

    if path.len() > MAX_PATH_LEN {
        return Err(ModuleScannerError::Config {
            field: field.to_owned(),
            reason: format!("path exceeds maximum length {MAX_PATH_LEN}"),
        });
    }

    Ok(())
}

/// [`ModuleScannerConfig`] 빌더
///
/// 유연한 설정 구성 및 빌드 시 유효성 검증을 제공합니다.
#[derive(Default)]
pub struct ModuleScannerConfigBuilder {
    config: ModuleScannerConfig,
}

impl ModuleScannerConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept_file_name_derived(mut self, accept: bool) -> Self {
        self.config.accept_file_name_derived = accept;
        self
    }

    /// 로컬 Maven 저장소 경로를 설정합니다.
    pub fn repository_path(mut self, path: impl Into<String>) -> Self {
        self.config.repository_path = path.into();
        self
    }

    /// 알려진 모듈 DB 경로를 설정합니다.
    pub fn known_modules_path(mut self, path: impl Into<String>) -> Self {
        self.config.known_modules_path = path.into();
        self
    }

    pub fn started_after(mut self, name: impl Into<String>) -> Self {
        self.config.started_after = name.into();
        self
    }

    /// 그룹 별칭을 하나 추가합니다.
    pub fn group_alias(mut self, group: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.config
            .group_aliases
            .entry(group.into())
            .or_default()
            .push(prefix.into());
        self
    }

    /// 동시 분석 작업 수를 설정합니다.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// JAR 최대 크기(바이트)를 설정합니다.
    pub fn max_archive_size(mut self, size: u64) -> Self {
        self.config.max_archive_size = size;
        self
    }

    /// POM 최대 크기(바이트)를 설정합니다.
    pub fn max_document_size(mut self, size: u64) -> Self {
        self.config.max_document_size = size;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `ModuleScannerError::Config` 반환
    pub fn build(self) -> Result<ModuleScannerConfig, ModuleScannerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ModuleScannerConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_preserves_values() {
        let core = modscan_core::config::ScannerSection {
            accept_file_name_derived: true,
            repository_path: "/srv/m2".to_owned(),
            known_modules_path: "/srv/modules.properties".to_owned(),
            started_after: "batch-041".to_owned(),
            workers: 12,
            group_aliases: BTreeMap::from([(
                "io.projectreactor".to_owned(),
                vec!["reactor".to_owned()],
            )]),
        };
        let config = ModuleScannerConfig::from_core(&core);
        assert!(config.accept_file_name_derived);
        assert_eq!(config.repository_path, "/srv/m2");
        assert_eq!(config.known_modules_path, "/srv/modules.properties");
        assert_eq!(config.started_after, "batch-041");
        assert_eq!(config.workers, 12);
        assert_eq!(config.group_aliases["io.projectreactor"], vec!["reactor"]);
        // extended fields use defaults
        assert_eq!(config.max_archive_size, 256 * 1024 * 1024);
        assert_eq!(config.max_document_size, 1024 * 1024);
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let config = ModuleScannerConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_too_many_workers() {
        let config = ModuleScannerConfig {
            workers: 1000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_sizes() {
        let config = ModuleScannerConfig {
            max_archive_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ModuleScannerConfig {
            max_document_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_path_traversal() {
        let config = ModuleScannerConfig {
            repository_path: "/srv/../etc".to_owned(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("repository_path"));
    }

    #[test]
    fn validate_rejects_empty_alias() {
        let config = ModuleScannerConfigBuilder::new()
            .group_alias("org.example", "")
            .build();
        assert!(config.is_err());
    }

    #[test]
    fn builder_all_setters() {
        let config = ModuleScannerConfigBuilder::new()
            .accept_file_name_derived(true)
            .repository_path("/srv/m2")
            .known_modules_path("/srv/modules.properties")
            .started_after("batch-001")
            .group_alias("io.projectreactor", "reactor")
            .group_alias("io.projectreactor", "reactor.netty")
            .workers(2)
            .max_archive_size(1024)
            .max_document_size(512)
            .build()
            .unwrap();

        assert!(config.accept_file_name_derived);
        assert_eq!(config.repository_path, "/srv/m2");
        assert_eq!(config.started_after, "batch-001");
        assert_eq!(
            config.group_aliases["io.projectreactor"],
            vec!["reactor", "reactor.netty"]
        );
        assert_eq!(config.workers, 2);
        assert_eq!(config.max_archive_size, 1024);
        assert_eq!(config.max_document_size, 512);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = ModuleScannerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ModuleScannerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.workers, deserialized.workers);
        assert_eq!(config.max_archive_size, deserialized.max_archive_size);
    }
}
