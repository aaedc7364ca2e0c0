//! 도메인 타입 -- 모듈 식별 결과와 빌드 좌표
//!
//! 모듈 식별([`ModuleIdentity`]), POM 문서([`CoordinateDocument`]),
//! 해석된 좌표([`ResolvedCoordinate`]), 분류 항목([`Item`]) 등을 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 모듈명을 얻은 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleSource {
    /// `module-info.class`에 선언된 이름
    ExplicitDescriptor,
    /// `MANIFEST.MF`의 `Automatic-Module-Name` 속성
    ManifestAttribute,
    /// JAR 파일명에서 유도한 이름
    FileNameDerived,
}

impl ModuleSource {
    /// 메트릭 레이블 등에 사용하는 짧은 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExplicitDescriptor => "explicit_descriptor",
            Self::ManifestAttribute => "manifest_attribute",
            Self::FileNameDerived => "file_name_derived",
        }
    }
}

impl fmt::Display for ModuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 아티팩트 하나의 모듈 식별 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleIdentity {
    /// 점으로 구분된 모듈명 (예: `org.apiguardian.api`)
    pub name: String,
    /// 이름의 출처
    pub source: ModuleSource,
    /// 호출자가 받아들인 이름인지 여부
    ///
    /// 허용되지 않은 파일명 기반 이름에서만 false입니다.
    pub valid: bool,
}

impl ModuleIdentity {
    /// 유효한 식별 결과를 생성합니다.
    pub fn new(name: impl Into<String>, source: ModuleSource) -> Self {
        Self {
            name: name.into(),
            source,
            valid: true,
        }
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.source)
    }
}

/// 부모 POM 참조 `(groupId, artifactId, version)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParentReference {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl ParentReference {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ParentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

/// 파싱된 POM 문서 하나
///
/// 모든 필드는 해석 전에는 선택적입니다. `group`과 `version`은 문서에 없으면
/// 파싱 시점에 부모 참조의 값으로 채워집니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateDocument {
    /// 문서 출처 (에러 메시지용)
    pub origin: String,
    pub group: Option<String>,
    pub artifact: Option<String>,
    pub version: Option<String>,
    /// 표시 이름 (`<name>`), 템플릿 토큰을 포함할 수 있음
    pub name: Option<String>,
    /// 부모 POM 참조
    pub parent: Option<ParentReference>,
}

impl CoordinateDocument {
    /// 이 문서 자신의 좌표를 반환합니다 (세 필드가 모두 있을 때만).
    pub fn reference(&self) -> Option<ParentReference> {
        match (&self.group, &self.artifact, &self.version) {
            (Some(g), Some(a), Some(v)) => Some(ParentReference::new(g, a, v)),
            _ => None,
        }
    }
}

/// 부모 체인을 따라 해석된 빌드 좌표
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCoordinate {
    pub group: String,
    pub artifact: String,
    pub version: Option<String>,
    pub name: Option<String>,
}

impl ResolvedCoordinate {
    /// `group`과 `artifact`가 같은지 비교합니다 (이름/버전 변경은 무시).
    pub fn same_origin(&self, other: &ResolvedCoordinate) -> bool {
        self.group == other.group && self.artifact == other.artifact
    }
}

impl fmt::Display for ResolvedCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

/// 분류된 아티팩트 하나 (모듈명으로 식별)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// 모듈명
    pub module_name: String,
    /// 출처 참조 (입력 레코드 줄 또는 아티팩트 경로)
    pub line: String,
    pub identity: ModuleIdentity,
    pub coordinate: ResolvedCoordinate,
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` -> {}", self.module_name, self.line)
    }
}
