//! 분류기 -- 모듈 식별 결과와 빌드 좌표를 대조해 신뢰 등급을 결정
//!
//! 규칙은 순서대로 적용되며 처음 맞는 규칙에서 끝납니다.
//!
//! 1. 모듈명 문법 위반 -> `Syntax`
//! 2. 모듈명이 그룹이나 그룹 별칭으로 시작하지 않음 -> `Naming`
//! 3. 다른 그룹/아티팩트로 이미 알려진 모듈명 -> `Impostor`
//! 4. 처음 보는 모듈명 -> `Unique` (데이터베이스에 추가)
//! 5. 이름/버전이 바뀐 알려진 모듈 -> `Update`
//! 6. 그 외 -> `Known` (버킷 없음)

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::known::KnownModules;
use crate::module::is_valid_module_name;
use crate::summary::Summary;
use crate::types::{Item, ResolvedCoordinate};

/// 아티팩트 하나의 분류 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Unique,
    Update,
    Known,
    Impostor,
    Naming,
    Syntax,
}

impl Classification {
    /// 메트릭 레이블용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unique => "unique",
            Self::Update => "update",
            Self::Known => "known",
            Self::Impostor => "impostor",
            Self::Naming => "naming",
            Self::Syntax => "syntax",
        }
    }

    /// 의심 등급인지 반환합니다.
    pub fn is_suspicious(&self) -> bool {
        matches!(self, Self::Impostor | Self::Naming | Self::Syntax)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 분류기
///
/// 알려진 모듈 데이터베이스를 소유하며, 새 모듈과 갱신을 실행 중에 반영합니다.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    known: KnownModules,
    group_aliases: BTreeMap<String, Vec<String>>,
}

impl Classifier {
    pub fn new(known: KnownModules, group_aliases: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            known,
            group_aliases,
        }
    }

    /// 현재 데이터베이스 (실행 중 추가분 포함)
    pub fn known(&self) -> &KnownModules {
        &self.known
    }

    /// 데이터베이스를 넘겨받습니다.
    pub fn into_known(self) -> KnownModules {
        self.known
    }

    /// 항목을 분류하고 요약의 해당 버킷에 기록합니다.
    pub fn classify(&mut self, summary: &mut Summary, item: Item) -> Classification {
        let classification = self.decide(&item);

        debug!(
            module = %item.module_name,
            line = %item.line,
            coordinate = %item.coordinate,
            classification = %classification,
            "artifact classified"
        );

        match classification {
            Classification::Syntax => summary.suspicious.syntax.push(item),
            Classification::Naming => summary.suspicious.naming.push(item),
            Classification::Impostor => summary.suspicious.impostors.push(item),
            Classification::Unique => {
                self.known
                    .insert(item.module_name.clone(), item.coordinate.clone());
                summary.uniques.insert(item.module_name.clone(), item);
            }
            Classification::Update => {
                self.known
                    .insert(item.module_name.clone(), item.coordinate.clone());
                summary.updates.insert(item.module_name.clone(), item);
            }
            Classification::Known => {}
        }

        classification
    }

    fn decide(&self, item: &Item) -> Classification {
        let name = item.module_name.as_str();
        let coordinate = &item.coordinate;

        if !is_valid_module_name(name) {
            return Classification::Syntax;
        }
        if !self.matches_group(name, &coordinate.group) {
            return Classification::Naming;
        }

        match self.known.get(name) {
            None => Classification::Unique,
            Some(previous) if !previous.same_origin(coordinate) => Classification::Impostor,
            Some(previous) if changed(previous, coordinate) => Classification::Update,
            Some(_) => Classification::Known,
        }
    }

    fn matches_group(&self, name: &str, group: &str) -> bool {
        name.starts_with(group)
            || self
                .group_aliases
                .get(group)
                .is_some_and(|aliases| aliases.iter().any(|alias| name.starts_with(alias.as_str())))
    }
}

/// 기록된 값이 있는 필드만 비교합니다.
fn changed(previous: &ResolvedCoordinate, current: &ResolvedCoordinate) -> bool {
    let differs = |old: &Option<String>, new: &Option<String>| old.is_some() && old != new;
    differs(&previous.name, &current.name) || differs(&previous.version, &current.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModuleIdentity, ModuleSource};

    fn coordinate(group: &str, artifact: &str, version: Option<&str>) -> ResolvedCoordinate {
        ResolvedCoordinate {
            group: group.to_owned(),
            artifact: artifact.to_owned(),
            version: version.map(str::to_owned),
            name: None,
        }
    }

    fn item(name: &str, coordinate: ResolvedCoordinate) -> Item {
        Item {
            module_name: name.to_owned(),
            line: format!("{name}.jar"),
            identity: ModuleIdentity::new(name, ModuleSource::ManifestAttribute),
            coordinate,
        }
    }

    #[test]
    fn new_module_is_unique_then_known() {
        let mut classifier = Classifier::default();
        let mut summary = Summary::with_timestamp("t");

        let c = coordinate("org.apiguardian", "apiguardian-api", Some("1.1.2"));
        assert_eq!(
            classifier.classify(&mut summary, item("org.apiguardian.api", c.clone())),
            Classification::Unique
        );
        assert!(summary.uniques.contains_key("org.apiguardian.api"));
        assert!(classifier.known().contains("org.apiguardian.api"));

        assert_eq!(
            classifier.classify(&mut summary, item("org.apiguardian.api", c)),
            Classification::Known
        );
        assert_eq!(summary.uniques.len(), 1);
        assert!(summary.updates.is_empty());
    }

    #[test]
    fn invalid_grammar_is_syntax_first() {
        let mut classifier = Classifier::default();
        let mut summary = Summary::with_timestamp("t");
        // 그룹으로도 시작하지 않지만 문법 위반이 먼저
        let result = classifier.classify(&mut summary, item("int.foo", coordinate("x", "y", None)));
        assert_eq!(result, Classification::Syntax);
        assert_eq!(summary.suspicious.syntax.len(), 1);
        assert!(summary.suspicious.naming.is_empty());
        assert!(!classifier.known().contains("int.foo"));
    }

    #[test]
    fn name_outside_group_is_naming() {
        let mut classifier = Classifier::default();
        let mut summary = Summary::with_timestamp("t");
        let result = classifier.classify(
            &mut summary,
            item("com.other.lib", coordinate("org.example", "lib", None)),
        );
        assert_eq!(result, Classification::Naming);
        assert_eq!(summary.suspicious.naming.len(), 1);
    }

    #[test]
    fn alias_prefix_is_accepted() {
        let aliases = BTreeMap::from([(
            "io.projectreactor".to_owned(),
            vec!["reactor".to_owned()],
        )]);
        let mut classifier = Classifier::new(KnownModules::new(), aliases);
        let mut summary = Summary::with_timestamp("t");
        let result = classifier.classify(
            &mut summary,
            item("reactor.core", coordinate("io.projectreactor", "reactor-core", None)),
        );
        assert_eq!(result, Classification::Unique);
    }

    #[test]
    fn known_name_under_other_coordinate_is_impostor() {
        let mut known = KnownModules::new();
        known.insert("org.example.lib", coordinate("org.example", "lib", Some("1")));
        let mut classifier = Classifier::new(known, BTreeMap::new());
        let mut summary = Summary::with_timestamp("t");

        let result = classifier.classify(
            &mut summary,
            item("org.example.lib", coordinate("org.example", "lib-fork", Some("1"))),
        );
        assert_eq!(result, Classification::Impostor);
        assert_eq!(summary.suspicious.impostors.len(), 1);
        // 데이터베이스는 바뀌지 않음
        assert_eq!(
            classifier.known().get("org.example.lib").unwrap().artifact,
            "lib"
        );
    }

    #[test]
    fn changed_version_is_update() {
        let mut known = KnownModules::new();
        known.insert("org.example.lib", coordinate("org.example", "lib", Some("1")));
        let mut classifier = Classifier::new(known, BTreeMap::new());
        let mut summary = Summary::with_timestamp("t");

        let result = classifier.classify(
            &mut summary,
            item("org.example.lib", coordinate("org.example", "lib", Some("2"))),
        );
        assert_eq!(result, Classification::Update);
        assert!(summary.updates.contains_key("org.example.lib"));
        assert_eq!(
            classifier
                .known()
                .get("org.example.lib")
                .unwrap()
                .version
                .as_deref(),
            Some("2")
        );
    }

    #[test]
    fn unrecorded_fields_do_not_count_as_change() {
        let mut known = KnownModules::new();
        known.insert("org.example.lib", coordinate("org.example", "lib", None));
        let mut classifier = Classifier::new(known, BTreeMap::new());
        let mut summary = Summary::with_timestamp("t");

        let result = classifier.classify(
            &mut summary,
            item("org.example.lib", coordinate("org.example", "lib", Some("9"))),
        );
        assert_eq!(result, Classification::Known);
    }

    #[test]
    fn each_item_lands_in_at_most_one_bucket() {
        let mut classifier = Classifier::default();
        let mut summary = Summary::with_timestamp("t");
        let items = [
            item("a.b", coordinate("a", "b", None)),
            item("a.b", coordinate("a", "c", None)),
            item("x.y", coordinate("a", "d", None)),
            item("a.void", coordinate("a", "e", None)),
            item("a.b", coordinate("a", "b", None)),
        ];
        let count = items.len();
        let mut bucketed = 0;
        for it in items {
            if classifier.classify(&mut summary, it) != Classification::Known {
                bucketed += 1;
            }
        }
        let total = summary.uniques.len()
            + summary.updates.len()
            + summary.suspicious.len();
        assert_eq!(total, bucketed);
        assert_eq!(count - bucketed, 1);
    }

    #[test]
    fn classification_labels() {
        assert_eq!(Classification::Impostor.as_str(), "impostor");
        assert!(Classification::Naming.is_suspicious());
        assert!(!Classification::Update.is_suspicious());
    }
}
