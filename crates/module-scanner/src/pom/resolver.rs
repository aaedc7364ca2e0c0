//! 빌드 좌표 해석기 -- 부모 체인 상속 + 이름 템플릿 치환
//!
//! [`CoordinateResolver`]는 문서의 `parent` 참조를 [`DocumentLoader`]로 따라가며
//! 루트에서 리프 방향으로 필드를 병합합니다.
//!
//! # 병합 규칙
//!
//! - 자식이 명시한 필드가 우선하고, 없는 필드는 부모에서 상속합니다.
//! - 이름의 `${parent.name}` / `${project.parent.name}`은 해석된 부모 이름으로,
//!   `${project.groupId}` 등은 병합된 좌표로 치환합니다.
//! - 리프에 이름이 없고 부모가 있으면 `"<상속된 이름> of <group>"`이 됩니다.
//! - 부모가 없는 문서의 이름은 치환 없이 그대로 사용합니다.
//! - 방문한 `(group, artifact, version)`이 다시 나타나면 `CyclicParentChain`입니다.

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::PomParser;
use crate::error::ModuleScannerError;
use crate::types::{CoordinateDocument, ParentReference, ResolvedCoordinate};

/// 부모 POM 문서 공급자
///
/// 찾을 수 없는 참조는 `UnresolvableParent`로 실패해야 합니다.
/// 스캔 중 여러 블로킹 태스크에서 동시에 호출됩니다.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, reference: &ParentReference)
    -> Result<Arc<CoordinateDocument>, ModuleScannerError>;
}

impl<F> DocumentLoader for F
where
    F: Fn(&ParentReference) -> Result<Arc<CoordinateDocument>, ModuleScannerError> + Send + Sync,
{
    fn load(
        &self,
        reference: &ParentReference,
    ) -> Result<Arc<CoordinateDocument>, ModuleScannerError> {
        self(reference)
    }
}

/// 부모 조회를 지원하지 않는 로더 (항상 `UnresolvableParent`)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParentLoader;

impl DocumentLoader for NoParentLoader {
    fn load(
        &self,
        reference: &ParentReference,
    ) -> Result<Arc<CoordinateDocument>, ModuleScannerError> {
        Err(unresolvable(reference))
    }
}

fn unresolvable(reference: &ParentReference) -> ModuleScannerError {
    ModuleScannerError::UnresolvableParent {
        group: reference.group.clone(),
        artifact: reference.artifact.clone(),
        version: reference.version.clone(),
    }
}

/// 로컬 Maven 저장소 레이아웃 로더
///
/// `<root>/<group를 경로로>/<artifact>/<version>/<artifact>-<version>.pom`
pub struct RepositoryLoader {
    root: PathBuf,
    max_document_size: u64,
    parser: PomParser,
}

impl RepositoryLoader {
    /// 기본 문서 크기 제한 (1 MB)
    pub const DEFAULT_MAX_DOCUMENT_SIZE: u64 = 1024 * 1024;

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_document_size: Self::DEFAULT_MAX_DOCUMENT_SIZE,
            parser: PomParser::new(),
        }
    }

    /// 문서 크기 제한을 설정합니다.
    pub fn with_max_document_size(mut self, max: u64) -> Self {
        self.max_document_size = max;
        self
    }

    /// 참조에 해당하는 POM 경로를 반환합니다.
    ///
    /// 경로 구분자나 `..`를 포함한 좌표는 저장소 밖을 가리킬 수 있어 `None`입니다.
    pub fn document_path(&self, reference: &ParentReference) -> Option<PathBuf> {
        let segments = [&reference.artifact, &reference.version];
        if segments.iter().any(|s| !is_plain_segment(s))
            || reference.group.split('.').any(|s| !is_plain_segment(s))
        {
            return None;
        }

        let mut path = self.root.clone();
        path.extend(reference.group.split('.'));
        path.push(&reference.artifact);
        path.push(&reference.version);
        path.push(format!("{}-{}.pom", reference.artifact, reference.version));
        Some(path)
    }
}

fn is_plain_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

impl DocumentLoader for RepositoryLoader {
    fn load(
        &self,
        reference: &ParentReference,
    ) -> Result<Arc<CoordinateDocument>, ModuleScannerError> {
        let Some(path) = self.document_path(reference) else {
            debug!(reference = %reference, "rejecting non-plain coordinate");
            return Err(unresolvable(reference));
        };

        let metadata = match std::fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            _ => {
                debug!(reference = %reference, path = %path.display(), "parent document not in repository");
                return Err(unresolvable(reference));
            }
        };
        if metadata.len() > self.max_document_size {
            return Err(ModuleScannerError::FileTooBig {
                path: path.display().to_string(),
                size: metadata.len(),
                max: self.max_document_size,
            });
        }

        let bytes = std::fs::read(&path).map_err(|e| ModuleScannerError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let document = self.parser.parse(&bytes, &path.display().to_string())?;

        debug!(reference = %reference, path = %path.display(), "parent document loaded");
        Ok(Arc::new(document))
    }
}

/// 로더 결과 캐시
///
/// 동시 읽기를 허용하며, 같은 참조를 동시에 적재해도 먼저 기록된 문서가 유지됩니다.
pub struct DocumentCache<L> {
    inner: L,
    documents: RwLock<HashMap<ParentReference, Arc<CoordinateDocument>>>,
}

impl<L: DocumentLoader> DocumentCache<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// 캐시된 문서 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L: DocumentLoader> DocumentLoader for DocumentCache<L> {
    fn load(
        &self,
        reference: &ParentReference,
    ) -> Result<Arc<CoordinateDocument>, ModuleScannerError> {
        {
            let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(document) = documents.get(reference) {
                return Ok(Arc::clone(document));
            }
        }

        let document = self.inner.load(reference)?;
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            documents.entry(reference.clone()).or_insert(document),
        ))
    }
}

/// 병합 중간 결과
#[derive(Debug, Clone, Default)]
struct Merged {
    group: Option<String>,
    artifact: Option<String>,
    version: Option<String>,
    name: Option<String>,
}

/// 빌드 좌표 해석기
///
/// 같은 로더로 같은 문서를 두 번 해석하면 같은 결과를 반환합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateResolver;

impl CoordinateResolver {
    pub fn new() -> Self {
        Self
    }

    /// 문서를 부모 체인과 병합해 좌표를 해석합니다.
    ///
    /// # Errors
    ///
    /// - `UnresolvableParent`: 로더가 부모를 찾지 못함
    /// - `CyclicParentChain`: 부모 체인이 순환함
    /// - `MissingCoordinate`: 병합 후에도 `group` 또는 `artifact`가 없음
    pub fn resolve(
        &self,
        document: &CoordinateDocument,
        loader: &dyn DocumentLoader,
    ) -> Result<ResolvedCoordinate, ModuleScannerError> {
        let mut visited = HashSet::new();
        if let Some(own) = document.reference() {
            visited.insert(own);
        }

        let merged = merge(document, loader, &mut visited, true)?;

        let group = merged
            .group
            .ok_or_else(|| ModuleScannerError::MissingCoordinate {
                field: "group",
                origin: document.origin.clone(),
            })?;
        let artifact = merged
            .artifact
            .ok_or_else(|| ModuleScannerError::MissingCoordinate {
                field: "artifact",
                origin: document.origin.clone(),
            })?;

        Ok(ResolvedCoordinate {
            group,
            artifact,
            version: merged.version,
            name: merged.name,
        })
    }
}

fn merge(
    document: &CoordinateDocument,
    loader: &dyn DocumentLoader,
    visited: &mut HashSet<ParentReference>,
    leaf: bool,
) -> Result<Merged, ModuleScannerError> {
    let Some(reference) = &document.parent else {
        return Ok(Merged {
            group: document.group.clone(),
            artifact: document.artifact.clone(),
            version: document.version.clone(),
            name: document.name.clone(),
        });
    };

    if !visited.insert(reference.clone()) {
        return Err(ModuleScannerError::CyclicParentChain {
            group: reference.group.clone(),
            artifact: reference.artifact.clone(),
            version: reference.version.clone(),
        });
    }

    let parent_document = loader.load(reference)?;
    let parent = merge(&parent_document, loader, visited, false)?;

    let mut merged = Merged {
        group: document.group.clone().or(parent.group),
        artifact: document.artifact.clone().or(parent.artifact),
        version: document.version.clone().or(parent.version),
        name: None,
    };

    merged.name = match &document.name {
        Some(template) => Some(substitute(
            template,
            &merged,
            parent.name.as_deref(),
            reference,
        )),
        None if leaf => parent.name.map(|inherited| match &merged.group {
            Some(group) => format!("{inherited} of {group}"),
            None => inherited,
        }),
        None => parent.name,
    };

    Ok(merged)
}

fn lookup<'a>(
    key: &str,
    project: &'a Merged,
    parent_name: Option<&'a str>,
    parent: &'a ParentReference,
) -> Option<&'a str> {
    match key {
        "parent.name" | "project.parent.name" => parent_name,
        "project.groupId" => project.group.as_deref(),
        "project.artifactId" => project.artifact.as_deref(),
        "project.version" => project.version.as_deref(),
        "project.parent.groupId" => Some(parent.group.as_str()),
        "project.parent.artifactId" => Some(parent.artifact.as_str()),
        "project.parent.version" => Some(parent.version.as_str()),
        _ => None,
    }
}

/// `${...}` 토큰을 치환합니다. 알 수 없거나 값이 없는 토큰은 그대로 둡니다.
fn substitute(
    template: &str,
    project: &Merged,
    parent_name: Option<&str>,
    parent: &ParentReference,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match lookup(key, project, parent_name, parent) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 1]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
