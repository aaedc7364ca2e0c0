//! 알려진 모듈 데이터베이스
//!
//! 모듈명을 키로 이전 실행에서 확인된 빌드 좌표를 보관합니다.
//! 스캔 중에는 새로 발견된 모듈이 추가되어 이후 아티팩트 분류에 사용됩니다.
//!
//! # 형식 (`modules.properties`)
//!
//! ```text
//! # comment
//! org.apiguardian.api=org.apiguardian:apiguardian-api:1.1.2
//! ice.cream=ice:cream
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::ModuleScannerError;
use crate::types::ResolvedCoordinate;

/// 모듈명 -> 빌드 좌표
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownModules {
    modules: BTreeMap<String, ResolvedCoordinate>,
}

impl KnownModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// properties 텍스트를 파싱합니다.
    ///
    /// 빈 줄과 `#`/`!` 주석은 건너뜁니다. 같은 모듈명이 여러 번 나오면 마지막 값이 남습니다.
    ///
    /// # Errors
    ///
    /// `name=group:artifact[:version]` 형식이 아닌 줄이 있으면 `MalformedDocument`
    pub fn parse_properties(text: &str, origin: &str) -> Result<Self, ModuleScannerError> {
        let mut modules = BTreeMap::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let malformed = |reason: &str| ModuleScannerError::MalformedDocument {
                origin: origin.to_owned(),
                reason: format!("line {}: {reason}", index + 1),
            };

            let (name, value) = line
                .split_once('=')
                .ok_or_else(|| malformed("expected 'module.name=group:artifact[:version]'"))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(malformed("empty module name"));
            }

            let mut parts = value.trim().split(':');
            let coordinate = match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(group), Some(artifact), version, None)
                    if !group.is_empty() && !artifact.is_empty() =>
                {
                    ResolvedCoordinate {
                        group: group.to_owned(),
                        artifact: artifact.to_owned(),
                        version: version.filter(|v| !v.is_empty()).map(str::to_owned),
                        name: None,
                    }
                }
                _ => return Err(malformed("expected 'group:artifact[:version]'")),
            };

            modules.insert(name.to_owned(), coordinate);
        }

        debug!(origin, modules = modules.len(), "known modules parsed");
        Ok(Self { modules })
    }

    /// 파일에서 properties를 읽습니다 (동기 I/O).
    pub fn load(path: &Path) -> Result<Self, ModuleScannerError> {
        let text = std::fs::read_to_string(path).map_err(|e| ModuleScannerError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse_properties(&text, &path.display().to_string())
    }

    pub fn get(&self, module_name: &str) -> Option<&ResolvedCoordinate> {
        self.modules.get(module_name)
    }

    pub fn contains(&self, module_name: &str) -> bool {
        self.modules.contains_key(module_name)
    }

    /// 좌표를 기록하고 이전 값을 반환합니다.
    pub fn insert(
        &mut self,
        module_name: impl Into<String>,
        coordinate: ResolvedCoordinate,
    ) -> Option<ResolvedCoordinate> {
        self.modules.insert(module_name.into(), coordinate)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// 모듈명 순으로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedCoordinate)> {
        self.modules.iter().map(|(k, v)| (k.as_str(), v))
    }
}
