//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 모듈 크레이트는 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//! 익스포터 설치는 바이너리의 책임이며, 설치되지 않으면 기록은 무시됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `modscan_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use modscan_core::metrics as m;
//!
//! metrics::counter!(m::SCANNER_ARTIFACTS_SCANNED_TOTAL).increment(1);
//! ```

use metrics::describe_counter;

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 분류 버킷 레이블 키 (unique, update, known, syntax, naming, impostor)
pub const LABEL_BUCKET: &str = "bucket";

/// 모듈명 출처 레이블 키 (explicit_descriptor, manifest_attribute, file_name_derived)
pub const LABEL_SOURCE: &str = "source";

// ─── Module Scanner 메트릭 ─────────────────────────────────────────

/// 분석 시도한 아티팩트 수 (counter)
pub const SCANNER_ARTIFACTS_SCANNED_TOTAL: &str = "modscan_scanner_artifacts_scanned_total";

/// 모듈명이 확인된 아티팩트 수 (counter, label: source)
pub const SCANNER_MODULES_DETECTED_TOTAL: &str = "modscan_scanner_modules_detected_total";

/// 분류 결과 수 (counter, label: bucket)
pub const SCANNER_CLASSIFICATIONS_TOTAL: &str = "modscan_scanner_classifications_total";

/// 아티팩트 단위 스캔 에러 수 (counter)
pub const SCANNER_ERRORS_TOTAL: &str = "modscan_scanner_errors_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_metrics() {
    describe_counter!(
        SCANNER_ARTIFACTS_SCANNED_TOTAL,
        "Total number of artifacts submitted for module analysis"
    );
    describe_counter!(
        SCANNER_MODULES_DETECTED_TOTAL,
        "Total number of artifacts whose module name was resolved, by source"
    );
    describe_counter!(
        SCANNER_CLASSIFICATIONS_TOTAL,
        "Total number of classified modules, by result bucket"
    );
    describe_counter!(
        SCANNER_ERRORS_TOTAL,
        "Total number of artifacts excluded from classification due to errors"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        SCANNER_ARTIFACTS_SCANNED_TOTAL,
        SCANNER_MODULES_DETECTED_TOTAL,
        SCANNER_CLASSIFICATIONS_TOTAL,
        SCANNER_ERRORS_TOTAL,
    ];

    #[test]
    fn all_metrics_start_with_modscan_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("modscan_"),
                "Metric '{}' does not start with 'modscan_' prefix",
                name
            );
        }
    }

    #[test]
    fn counters_end_with_total() {
        for name in ALL_METRIC_NAMES {
            assert!(name.ends_with("_total"), "counter '{}' lacks _total", name);
        }
    }

    #[test]
    fn describe_metrics_without_recorder_is_noop() {
        describe_metrics();
    }
}
