//! 스캔 실행 요약 -- 카운터, 분류 버킷, 보고서
//!
//! [`Summary`]는 스캔 한 번 동안 단일 집계 경로가 소유하고 갱신합니다.
//! 보고서 생성 시점에 의심 버킷을 모듈명 순으로 정렬합니다.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Item;

/// 타임스탬프 형식 (예: `2026-10-16-09-30-00`)
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// 의심 모듈 버킷
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspicious {
    /// 다른 좌표로 이미 알려진 모듈명
    pub impostors: Vec<Item>,
    /// 그룹(또는 별칭)으로 시작하지 않는 모듈명
    pub naming: Vec<Item>,
    /// 모듈명 문법 위반
    pub syntax: Vec<Item>,
}

impl Suspicious {
    pub fn len(&self) -> usize {
        self.impostors.len() + self.naming.len() + self.syntax.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sort(&mut self) {
        for bucket in [&mut self.impostors, &mut self.naming, &mut self.syntax] {
            bucket.sort_by(|a, b| a.module_name.cmp(&b.module_name));
        }
    }
}

/// 분류에서 제외된 아티팩트 하나의 에러
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanErrorRecord {
    /// 출처 참조
    pub line: String,
    /// 에러 메시지
    pub error: String,
}

/// 스캔 한 번의 요약
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// 생성 시각
    pub timestamp: String,
    /// 처리한 아티팩트 레코드 수
    pub scan_line_counter: u64,
    /// 처리한 스캔 객체 수
    pub scan_object_counter: u64,
    /// 모듈명이 결정된 아티팩트 수
    pub scan_module_counter: u64,
    /// 분류에서 제외된 아티팩트 수
    pub scan_error_counter: u64,
    /// 처음 처리한 객체 이름
    pub first_processed: Option<String>,
    /// 마지막으로 처리한 객체 이름
    pub last_processed: Option<String>,
    /// 이전 실행의 마지막 처리 대상 (리포트 표기용)
    pub started_after: Option<String>,
    /// 시작 시점의 알려진 모듈 수
    pub started_with: usize,
    /// 새 모듈
    pub uniques: BTreeMap<String, Item>,
    /// 이름/버전이 바뀐 알려진 모듈
    pub updates: BTreeMap<String, Item>,
    pub suspicious: Suspicious,
    pub errors: Vec<ScanErrorRecord>,
    /// 취소로 중단되었는지 여부
    pub cancelled: bool,
}

impl Default for Summary {
    fn default() -> Self {
        Self::new()
    }
}

impl Summary {
    /// 현재 시각으로 빈 요약을 생성합니다.
    pub fn new() -> Self {
        Self::with_timestamp(chrono::Local::now().format(TIMESTAMP_FORMAT).to_string())
    }

    /// 지정한 타임스탬프로 빈 요약을 생성합니다.
    pub fn with_timestamp(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            scan_line_counter: 0,
            scan_object_counter: 0,
            scan_module_counter: 0,
            scan_error_counter: 0,
            first_processed: None,
            last_processed: None,
            started_after: None,
            started_with: 0,
            uniques: BTreeMap::new(),
            updates: BTreeMap::new(),
            suspicious: Suspicious::default(),
            errors: Vec::new(),
            cancelled: false,
        }
    }

    /// 객체 하나의 처리 시작을 기록합니다.
    pub fn begin_object(&mut self, name: &str) {
        self.scan_object_counter += 1;
        if self.first_processed.is_none() {
            self.first_processed = Some(name.to_owned());
        }
        self.last_processed = Some(name.to_owned());
    }

    /// 아티팩트 에러를 기록합니다.
    pub fn record_error(&mut self, line: impl Into<String>, error: impl Into<String>) {
        self.scan_error_counter += 1;
        self.errors.push(ScanErrorRecord {
            line: line.into(),
            error: error.into(),
        });
    }

    /// 의심 모듈이 하나라도 있는지 반환합니다.
    pub fn has_suspicious(&self) -> bool {
        !self.suspicious.is_empty()
    }

    /// 요약 블록을 줄 단위로 생성합니다.
    pub fn to_strings(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Summary of {}", self.timestamp),
            String::new(),
            format!("{} objects processed", self.scan_object_counter),
            format!("{} lines scanned", self.scan_line_counter),
            format!("{} modules detected", self.scan_module_counter),
            format!("Started with {} well-known modules", self.started_with),
            format!(
                "Started after: {}",
                self.started_after.as_deref().unwrap_or("")
            ),
            format!(
                "First processed: {}",
                self.first_processed.as_deref().unwrap_or("")
            ),
            format!(
                "Last processed: {}",
                self.last_processed.as_deref().unwrap_or("")
            ),
            String::new(),
            format!("{} new modules found", self.uniques.len()),
            format!("{} modules updated", self.updates.len()),
            String::new(),
            format!(
                "{} module names were syntactically invalid",
                self.suspicious.syntax.len()
            ),
            format!(
                "{} module names didn't start with the group or an alias",
                self.suspicious.naming.len()
            ),
            format!("{} impostors detected", self.suspicious.impostors.len()),
            String::new(),
            format!("{} artifacts failed to scan", self.scan_error_counter),
        ];
        if self.cancelled {
            lines.push("Scan was cancelled before completion".to_owned());
        }
        lines
    }

    /// 요약 블록과 각 버킷 목록을 포함한 Markdown 문서를 생성합니다.
    pub fn to_markdown(&self) -> Vec<String> {
        let mut suspicious = self.suspicious.clone();
        suspicious.sort();

        let mut md = vec![
            format!("# Scan `{}`", self.timestamp),
            String::new(),
            "## Summary".to_owned(),
            String::new(),
            "```".to_owned(),
        ];
        md.extend(self.to_strings());
        md.push("```".to_owned());
        md.push(String::new());

        md.push(format!("### {} new modules", self.uniques.len()));
        md.extend(self.uniques.values().map(bullet));
        md.push(String::new());
        md.push(format!("### {} updated modules", self.updates.len()));
        md.extend(self.updates.values().map(bullet));
        md.push(String::new());

        md.push("## Suspicious Modules".to_owned());
        md.push(String::new());
        md.push("Modules listed below were not added to the known-module database.".to_owned());
        md.push(String::new());
        for (title, bucket) in [
            ("Syntax Error", &suspicious.syntax),
            ("Impostor", &suspicious.impostors),
            ("Unexpected Naming", &suspicious.naming),
        ] {
            md.push(format!("### {title} ({})", bucket.len()));
            md.push(String::new());
            md.extend(bucket.iter().map(bullet));
            md.push(String::new());
        }

        if !self.errors.is_empty() {
            md.push(format!("## Scan Errors ({})", self.errors.len()));
            md.push(String::new());
            md.extend(
                self.errors
                    .iter()
                    .map(|e| format!("- {} -> {}", e.line, e.error)),
            );
            md.push(String::new());
        }

        md
    }

    /// 직렬화 가능한 보고서를 생성합니다.
    pub fn report(&self) -> ScanReport {
        let mut suspicious = self.suspicious.clone();
        suspicious.sort();

        ScanReport {
            timestamp: self.timestamp.clone(),
            objects: self.scan_object_counter,
            lines: self.scan_line_counter,
            modules: self.scan_module_counter,
            errors: self.scan_error_counter,
            started_with: self.started_with,
            started_after: self.started_after.clone(),
            first_processed: self.first_processed.clone(),
            last_processed: self.last_processed.clone(),
            cancelled: self.cancelled,
            uniques: self.uniques.values().map(ReportEntry::from).collect(),
            updates: self.updates.values().map(ReportEntry::from).collect(),
            syntax: suspicious.syntax.iter().map(ReportEntry::from).collect(),
            impostors: suspicious.impostors.iter().map(ReportEntry::from).collect(),
            naming: suspicious.naming.iter().map(ReportEntry::from).collect(),
            scan_errors: self.errors.clone(),
        }
    }
}

fn bullet(item: &Item) -> String {
    format!("- {item}")
}

/// 보고서의 버킷 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub module: String,
    pub line: String,
    pub group: String,
    pub artifact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl From<&Item> for ReportEntry {
    fn from(item: &Item) -> Self {
        Self {
            module: item.module_name.clone(),
            line: item.line.clone(),
            group: item.coordinate.group.clone(),
            artifact: item.coordinate.artifact.clone(),
            version: item.coordinate.version.clone(),
        }
    }
}

/// 완료된 스캔의 구조화된 보고서 (버킷은 모듈명 순)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub timestamp: String,
    pub objects: u64,
    pub lines: u64,
    pub modules: u64,
    pub errors: u64,
    pub started_with: usize,
    pub started_after: Option<String>,
    pub first_processed: Option<String>,
    pub last_processed: Option<String>,
    pub cancelled: bool,
    pub uniques: Vec<ReportEntry>,
    pub updates: Vec<ReportEntry>,
    pub syntax: Vec<ReportEntry>,
    pub impostors: Vec<ReportEntry>,
    pub naming: Vec<ReportEntry>,
    pub scan_errors: Vec<ScanErrorRecord>,
}
