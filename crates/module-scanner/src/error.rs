//! 모듈 스캐너 에러 타입
//!
//! [`ModuleScannerError`]는 모듈 스캐너 내에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<ModuleScannerError> for ModscanError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **아카이브**: `ArchiveUnreadable`, `EntryNotFound`, `FileTooBig`
//! - **모듈 식별**: `MetaInfNotPresent`, `AssertionFailure`, `MalformedDescriptor`
//! - **빌드 좌표**: `MalformedDocument`, `DocumentNotFound`, `UnresolvableParent`,
//!   `MissingCoordinate`, `CyclicParentChain`
//! - **설정**: `Config`
//! - **실행**: `Channel`, `Io`
//!
//! 아티팩트 단위 에러([`ModuleScannerError::is_artifact_error`])는 스캔 경계에서
//! 기록되고 실행을 중단시키지 않습니다.

use modscan_core::error::{ModscanError, ScanError};

/// 모듈 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ModuleScannerError {
    /// 아카이브를 열 수 없거나 ZIP 형식이 아님
    #[error("archive unreadable: {path}: {reason}")]
    ArchiveUnreadable {
        /// 아카이브 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 아카이브에 요청한 엔트리가 없음
    #[error("entry not found: {archive}!/{entry}")]
    EntryNotFound {
        /// 아카이브 경로
        archive: String,
        /// 엔트리 경로
        entry: String,
    },

    /// 파일명 기반 모듈명에 필요한 `META-INF/` 디렉토리가 없음
    #[error("META-INF not present: {path}")]
    MetaInfNotPresent {
        /// 아카이브 경로
        path: String,
    },

    /// 호출자가 파일명 기반 모듈명을 허용하지 않음
    #[error("file-name derived module name rejected: {path}: '{candidate}'")]
    AssertionFailure {
        /// 아카이브 경로
        path: String,
        /// 파일명에서 유도된 후보 모듈명
        candidate: String,
    },

    /// `module-info.class` 파싱 실패
    #[error("malformed module descriptor: {path}: {reason}")]
    MalformedDescriptor {
        /// 아카이브 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// POM 문서 구조 오류
    #[error("malformed document: {origin}: {reason}")]
    MalformedDocument {
        /// 문서 출처 (파일 경로 또는 아카이브 엔트리)
        origin: String,
        /// 실패 사유
        reason: String,
    },

    /// 아티팩트의 POM 문서를 찾을 수 없음
    #[error("coordinate document not found for {path}")]
    DocumentNotFound {
        /// 아티팩트 경로
        path: String,
    },

    /// 부모 POM을 찾을 수 없음
    #[error("unresolvable parent: {group}:{artifact}:{version}")]
    UnresolvableParent {
        group: String,
        artifact: String,
        version: String,
    },

    /// 부모 체인 전체를 병합한 뒤에도 좌표 필드가 비어 있음
    #[error("missing coordinate '{field}' in {origin}")]
    MissingCoordinate {
        /// 누락된 필드 (group, artifact)
        field: &'static str,
        /// 문서 출처
        origin: String,
    },

    /// 부모 체인에 순환 참조가 있음
    #[error("cyclic parent chain at {group}:{artifact}:{version}")]
    CyclicParentChain {
        group: String,
        artifact: String,
        version: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널/태스크 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 파일 크기 초과
    #[error("file too large: {path}: {size} bytes (max: {max})")]
    FileTooBig {
        /// 파일 경로
        path: String,
        /// 실제 파일 크기 (바이트)
        size: u64,
        /// 최대 허용 크기 (바이트)
        max: u64,
    },
}

impl ModuleScannerError {
    /// 아티팩트 하나에 국한된 에러인지 반환합니다.
    ///
    /// 이 에러들은 해당 아티팩트만 분류에서 제외하고 스캔은 계속됩니다.
    pub fn is_artifact_error(&self) -> bool {
        !matches!(self, Self::Config { .. } | Self::Channel(_))
    }
}

impl From<ModuleScannerError> for ModscanError {
    fn from(err: ModuleScannerError) -> Self {
        match err {
            ModuleScannerError::ArchiveUnreadable { .. }
            | ModuleScannerError::EntryNotFound { .. }
            | ModuleScannerError::MetaInfNotPresent { .. }
            | ModuleScannerError::AssertionFailure { .. }
            | ModuleScannerError::MalformedDescriptor { .. }
            | ModuleScannerError::FileTooBig { .. } => {
                ModscanError::Scan(ScanError::Artifact(err.to_string()))
            }
            ModuleScannerError::MalformedDocument { .. }
            | ModuleScannerError::DocumentNotFound { .. }
            | ModuleScannerError::UnresolvableParent { .. }
            | ModuleScannerError::MissingCoordinate { .. }
            | ModuleScannerError::CyclicParentChain { .. } => {
                ModscanError::Scan(ScanError::Coordinate(err.to_string()))
            }
            ModuleScannerError::Config { field, reason } => {
                ModscanError::Config(modscan_core::error::ConfigError::InvalidValue {
                    field,
                    reason,
                })
            }
            ModuleScannerError::Channel(msg) => ModscanError::Scan(ScanError::Failed(msg)),
            ModuleScannerError::Io { source, .. } => ModscanError::Io(source),
        }
    }
}
