//! 에러 타입: 도메인별 에러 정의

/// modscan 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ModscanError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스캔 처리 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스캔 처리 에러
///
/// 모듈 크레이트의 세부 에러가 워크스페이스 경계를 넘을 때 사용하는 분류입니다.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 아카이브(JAR) 읽기 또는 모듈 식별 실패
    #[error("artifact error: {0}")]
    Artifact(String),

    /// 빌드 좌표(POM) 파싱 또는 해석 실패
    #[error("coordinate error: {0}")]
    Coordinate(String),

    /// 스캔 실행 실패 (채널, 태스크 등)
    #[error("scan failed: {0}")]
    Failed(String),
}
