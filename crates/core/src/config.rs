//! 설정 관리: modscan.toml 파싱 및 런타임 설정
//!
//! [`ModscanConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`MODSCAN_SCANNER_WORKERS=8` 형식)
//! 3. 설정 파일 (`modscan.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), modscan_core::error::ModscanError> {
//! use modscan_core::config::ModscanConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ModscanConfig::load("modscan.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ModscanConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ModscanError};

/// modscan 통합 설정
///
/// `modscan.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModscanConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 모듈 스캐너 설정
    #[serde(default)]
    pub scanner: ScannerSection,
}

impl ModscanConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ModscanError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ModscanError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ModscanError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ModscanError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ModscanError> {
        toml::from_str(toml_str).map_err(|e| {
            ModscanError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `MODSCAN_{SECTION}_{FIELD}`
    /// 예: `MODSCAN_SCANNER_REPOSITORY_PATH=/srv/m2`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "MODSCAN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "MODSCAN_GENERAL_LOG_FORMAT");

        // Scanner
        override_bool(
            &mut self.scanner.accept_file_name_derived,
            "MODSCAN_SCANNER_ACCEPT_FILE_NAME_DERIVED",
        );
        override_string(
            &mut self.scanner.repository_path,
            "MODSCAN_SCANNER_REPOSITORY_PATH",
        );
        override_string(
            &mut self.scanner.known_modules_path,
            "MODSCAN_SCANNER_KNOWN_MODULES_PATH",
        );
        override_string(
            &mut self.scanner.started_after,
            "MODSCAN_SCANNER_STARTED_AFTER",
        );
        override_usize(&mut self.scanner.workers, "MODSCAN_SCANNER_WORKERS");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ModscanError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.scanner.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanner.workers".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        for (group, aliases) in &self.scanner.group_aliases {
            if group.is_empty() || aliases.iter().any(String::is_empty) {
                return Err(ConfigError::InvalidValue {
                    field: "scanner.group_aliases".to_owned(),
                    reason: format!("group '{group}' has an empty group or alias"),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 모듈 스캐너 설정 섹션 (`[scanner]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSection {
    /// 파일명 기반 모듈명을 유효한 결과로 받아들일지 여부
    pub accept_file_name_derived: bool,
    /// 부모 POM을 찾을 로컬 Maven 저장소 경로 (비어 있으면 부모 해석 불가)
    pub repository_path: String,
    /// 기존 모듈 DB(`modules.properties`) 경로 (비어 있으면 빈 DB로 시작)
    pub known_modules_path: String,
    /// 이전 실행의 마지막 처리 대상 (리포트 표기용)
    pub started_after: String,
    /// 동시 분석 작업 수
    pub workers: usize,
    /// Maven 그룹 별칭 (그룹 -> 모듈명 접두어 목록)
    pub group_aliases: BTreeMap<String, Vec<String>>,
}

impl Default for ScannerSection {
    fn default() -> Self {
        Self {
            accept_file_name_derived: false,
            repository_path: String::new(),
            known_modules_path: String::new(),
            started_after: String::new(),
            workers: 4,
            group_aliases: BTreeMap::new(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}
