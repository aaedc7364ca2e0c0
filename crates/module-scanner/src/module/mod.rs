//! 모듈 식별기 -- 아티팩트의 정식 모듈명 결정
//!
//! 세 전략을 우선순위대로 적용하고 처음 성공한 결과를 사용합니다.
//!
//! ```text
//! module-info.class 존재?  --> ExplicitDescriptor (항상 유효)
//!        | no
//! Automatic-Module-Name?    --> ManifestAttribute  (값 그대로)
//!        | no
//! META-INF/ 존재?  --no-->  MetaInfNotPresent
//!        | yes
//! 파일명 유도               --> FileNameDerived    (호출자 허용 시에만 유효,
//!                                                  문법 위반 시 없음)
//! ```

mod descriptor;
mod name;

pub use name::{derive_from_file_name, is_valid_module_name};

use tracing::debug;

use crate::archive::{Archive, META_INF_DIR};
use crate::error::ModuleScannerError;
use crate::types::{ModuleIdentity, ModuleSource};

/// 모듈 디스크립터 엔트리 경로
pub const DESCRIPTOR_ENTRY: &str = "module-info.class";

/// 자동 모듈명 매니페스트 속성
pub const AUTOMATIC_MODULE_NAME: &str = "Automatic-Module-Name";

/// 수용 정책 적용 전의 식별 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// 디스크립터나 매니페스트에 선언된 이름
    Declared(ModuleIdentity),
    /// 파일명에서 유도된 이름 (`valid = false`)
    Derived(ModuleIdentity),
    /// 이름을 결정할 수 없음
    Absent,
}

impl Resolution {
    /// 후보 이름을 반환합니다.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Declared(identity) | Self::Derived(identity) => Some(&identity.name),
            Self::Absent => None,
        }
    }
}

type Strategy = fn(&dyn Archive) -> Result<Option<String>, ModuleScannerError>;

/// 우선순위 순서의 전략 목록
const STRATEGIES: &[(ModuleSource, Strategy)] = &[
    (ModuleSource::ExplicitDescriptor, from_descriptor),
    (ModuleSource::ManifestAttribute, from_manifest),
    (ModuleSource::FileNameDerived, from_file_name),
];

fn from_descriptor(archive: &dyn Archive) -> Result<Option<String>, ModuleScannerError> {
    if !archive.has_entry(DESCRIPTOR_ENTRY) {
        return Ok(None);
    }
    let bytes = archive.read_entry(DESCRIPTOR_ENTRY)?;
    descriptor::parse_module_name(&bytes)
        .map(Some)
        .map_err(|reason| ModuleScannerError::MalformedDescriptor {
            path: archive.file_name().to_owned(),
            reason,
        })
}

fn from_manifest(archive: &dyn Archive) -> Result<Option<String>, ModuleScannerError> {
    // 빈 값은 선언이 없는 것으로 본다
    Ok(archive
        .read_header_attribute(AUTOMATIC_MODULE_NAME)
        .filter(|value| !value.trim().is_empty()))
}

fn from_file_name(archive: &dyn Archive) -> Result<Option<String>, ModuleScannerError> {
    if !archive.has_entries_under(META_INF_DIR) {
        return Err(ModuleScannerError::MetaInfNotPresent {
            path: archive.file_name().to_owned(),
        });
    }
    Ok(derive_from_file_name(archive.file_name()).filter(|candidate| {
        let legal = is_valid_module_name(candidate);
        if !legal {
            debug!(
                artifact = %archive.file_name(),
                candidate = %candidate,
                "derived module name violates module-name grammar"
            );
        }
        legal
    }))
}

/// 모듈 식별기
///
/// 상태가 없으므로 여러 스레드에서 공유할 수 있습니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleIdentityResolver;

impl ModuleIdentityResolver {
    pub fn new() -> Self {
        Self
    }

    /// 수용 정책 없이 식별 결과를 반환합니다.
    ///
    /// # Errors
    ///
    /// - `MalformedDescriptor`: `module-info.class`를 파싱할 수 없음
    /// - `MetaInfNotPresent`: 선언된 이름이 없고 `META-INF/`도 없음
    pub fn describe(&self, archive: &dyn Archive) -> Result<Resolution, ModuleScannerError> {
        for (source, strategy) in STRATEGIES {
            let Some(name) = strategy(archive)? else {
                continue;
            };

            debug!(
                artifact = %archive.file_name(),
                module = %name,
                source = %source,
                "module name detected"
            );

            let identity = ModuleIdentity::new(name, *source);
            return Ok(match source {
                ModuleSource::FileNameDerived => Resolution::Derived(ModuleIdentity {
                    valid: false,
                    ..identity
                }),
                _ => Resolution::Declared(identity),
            });
        }

        debug!(artifact = %archive.file_name(), "no module name could be determined");
        Ok(Resolution::Absent)
    }

    /// 모듈 식별 결과를 반환합니다.
    ///
    /// 파일명 유도 이름은 `accept_file_name_derived`가 true일 때만 반환하고,
    /// 아니면 후보를 담은 `AssertionFailure`로 실패합니다.
    /// 이름을 결정할 수 없으면 `Ok(None)`입니다.
    pub fn resolve(
        &self,
        archive: &dyn Archive,
        accept_file_name_derived: bool,
    ) -> Result<Option<ModuleIdentity>, ModuleScannerError> {
        match self.describe(archive)? {
            Resolution::Declared(identity) => Ok(Some(identity)),
            Resolution::Derived(identity) if accept_file_name_derived => Ok(Some(ModuleIdentity {
                valid: true,
                ..identity
            })),
            Resolution::Derived(identity) => Err(ModuleScannerError::AssertionFailure {
                path: archive.file_name().to_owned(),
                candidate: identity.name,
            }),
            Resolution::Absent => Ok(None),
        }
    }
}
