//! 아카이브 리더 -- JAR(ZIP) 엔트리와 매니페스트 조회
//!
//! [`Archive`] trait은 모듈 식별기가 아카이브에 요구하는 최소 인터페이스입니다.
//! [`JarArchive`]는 파일 또는 메모리의 ZIP32 아카이브를 구현합니다.
//!
//! # 계약
//!
//! - `has_entry()` / `has_entries_under()`는 실패하지 않습니다.
//! - `read_entry()`는 엔트리가 없으면 `EntryNotFound`를 반환합니다.
//!   존재 여부가 불확실하면 먼저 `has_entry()`로 확인합니다.
//! - `read_header_attribute()`는 매니페스트가 없거나 키가 없으면 `None`입니다.

pub mod manifest;
pub(crate) mod zip;

use std::path::Path;

use tracing::debug;

use crate::error::ModuleScannerError;
use manifest::Manifest;
use zip::ZipIndex;

/// 매니페스트 엔트리 경로
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// 메타데이터 루트 디렉토리
pub const META_INF_DIR: &str = "META-INF/";

/// 단일 엔트리 해제 최대 크기 (64 MB)
const MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

/// 패키징된 아티팩트에 대한 읽기 전용 접근
pub trait Archive: Send + Sync {
    /// 아티팩트 파일명 (예: `apiguardian-api-1.1.2.jar`)
    fn file_name(&self) -> &str;

    /// 엔트리 존재 여부를 반환합니다.
    fn has_entry(&self, path: &str) -> bool;

    /// `dir` 아래에 엔트리가 하나라도 있는지 반환합니다 (`dir`은 `/`로 끝남).
    fn has_entries_under(&self, dir: &str) -> bool;

    /// 엔트리 원본 바이트를 읽습니다.
    fn read_entry(&self, path: &str) -> Result<Vec<u8>, ModuleScannerError>;

    /// 매니페스트 메인 섹션 속성을 조회합니다.
    fn read_header_attribute(&self, key: &str) -> Option<String>;

    /// `dir` 아래 엔트리 이름 목록을 반환합니다.
    fn entries_under(&self, dir: &str) -> Vec<String>;
}

/// ZIP32 기반 JAR 아카이브
///
/// 아카이브 전체를 메모리에 올린 뒤 중앙 디렉토리를 인덱싱합니다.
/// 매니페스트는 열 때 한 번 파싱합니다.
pub struct JarArchive {
    /// 표시용 경로
    path: String,
    file_name: String,
    data: Vec<u8>,
    index: ZipIndex,
    manifest: Option<Manifest>,
}

impl std::fmt::Debug for JarArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JarArchive")
            .field("path", &self.path)
            .field("entries", &self.index.len())
            .field("size", &self.data.len())
            .finish_non_exhaustive()
    }
}

impl JarArchive {
    /// 파일에서 아카이브를 엽니다 (동기 I/O).
    ///
    /// # Errors
    ///
    /// - `FileTooBig`: 파일 크기가 `max_size` 초과
    /// - `ArchiveUnreadable`: 읽기 실패 또는 ZIP32 형식이 아님
    pub fn open(path: &Path, max_size: u64) -> Result<Self, ModuleScannerError> {
        let display = path.display().to_string();

        let metadata = std::fs::metadata(path).map_err(|e| ModuleScannerError::ArchiveUnreadable {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        if metadata.len() > max_size {
            return Err(ModuleScannerError::FileTooBig {
                path: display,
                size: metadata.len(),
                max: max_size,
            });
        }

        let data = std::fs::read(path).map_err(|e| ModuleScannerError::ArchiveUnreadable {
            path: display.clone(),
            reason: e.to_string(),
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| display.clone());

        Self::with_path(display, file_name, data)
    }

    /// 메모리의 바이트로 아카이브를 엽니다.
    pub fn from_bytes(
        file_name: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<Self, ModuleScannerError> {
        let file_name = file_name.into();
        Self::with_path(file_name.clone(), file_name, data)
    }

    fn with_path(
        path: String,
        file_name: String,
        data: Vec<u8>,
    ) -> Result<Self, ModuleScannerError> {
        if !zip::is_zip_magic(&data) {
            return Err(ModuleScannerError::ArchiveUnreadable {
                path,
                reason: "not a zip archive".to_owned(),
            });
        }

        let index = ZipIndex::parse(&data)
            .map_err(|reason| ModuleScannerError::ArchiveUnreadable {
                path: path.clone(),
                reason,
            })?;

        let mut archive = Self {
            path,
            file_name,
            data,
            index,
            manifest: None,
        };

        if archive.has_entry(MANIFEST_PATH) {
            match archive.read_entry(MANIFEST_PATH) {
                Ok(bytes) => archive.manifest = Some(Manifest::parse(&bytes)),
                Err(e) => {
                    // 손상된 매니페스트는 속성 없음으로 취급
                    debug!(path = %archive.path, error = %e, "failed to read manifest");
                }
            }
        }

        debug!(
            path = %archive.path,
            entries = archive.index.len(),
            has_manifest = archive.manifest.is_some(),
            "archive opened"
        );

        Ok(archive)
    }

    /// 표시용 경로를 반환합니다.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 엔트리 수를 반환합니다.
    pub fn entry_count(&self) -> usize {
        self.index.len()
    }
}

impl Archive for JarArchive {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn has_entry(&self, path: &str) -> bool {
        self.index.get(path).is_some()
    }

    fn has_entries_under(&self, dir: &str) -> bool {
        self.index.names_under(dir).next().is_some()
    }

    fn read_entry(&self, path: &str) -> Result<Vec<u8>, ModuleScannerError> {
        let entry = self
            .index
            .get(path)
            .ok_or_else(|| ModuleScannerError::EntryNotFound {
                archive: self.path.clone(),
                entry: path.to_owned(),
            })?;

        self.index
            .extract(&self.data, entry, MAX_ENTRY_SIZE)
            .map_err(|reason| ModuleScannerError::ArchiveUnreadable {
                path: self.path.clone(),
                reason,
            })
    }

    fn read_header_attribute(&self, key: &str) -> Option<String> {
        self.manifest
            .as_ref()
            .and_then(|m| m.get(key))
            .map(str::to_owned)
    }

    fn entries_under(&self, dir: &str) -> Vec<String> {
        self.index.names_under(dir).map(str::to_owned).collect()
    }
}
