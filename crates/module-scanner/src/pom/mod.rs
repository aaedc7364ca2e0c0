//! POM 문서 파서 -- 빌드 좌표 추출
//!
//! [`PomParser`]는 `quick-xml` 풀 파서로 POM을 순회하며 최상위
//! `groupId`/`artifactId`/`version`/`name`과 `parent` 블록만 수집합니다.
//! `dependencies`, `build` 등 중첩 요소 안의 같은 이름 요소는 무시합니다.
//!
//! # 형식
//!
//! ```xml
//! <project xmlns="http://maven.apache.org/POM/4.0.0">
//!   <parent>
//!     <groupId>foo.bar</groupId>
//!     <artifactId>parent</artifactId>
//!     <version>1</version>
//!   </parent>
//!   <artifactId>baz</artifactId>
//! </project>
//! ```

pub mod resolver;

pub use resolver::{
    CoordinateResolver, DocumentCache, DocumentLoader, NoParentLoader, RepositoryLoader,
};

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::ModuleScannerError;
use crate::types::{CoordinateDocument, ParentReference};

const ROOT: &str = "project";
const PARENT: &str = "parent";

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// 요소 스택 기준 현재 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Group,
    Artifact,
    Version,
    Name,
}

impl Field {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "groupId" => Some(Self::Group),
            "artifactId" => Some(Self::Artifact),
            "version" => Some(Self::Version),
            "name" => Some(Self::Name),
            _ => None,
        }
    }
}

#[derive(Default)]
struct ParentFields {
    group: Option<String>,
    artifact: Option<String>,
    version: Option<String>,
}

/// POM 문서 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct PomParser;

impl PomParser {
    pub fn new() -> Self {
        Self
    }

    /// POM 바이트를 파싱합니다.
    ///
    /// `origin`은 에러 메시지와 [`CoordinateDocument::origin`]에 사용됩니다.
    ///
    /// # Errors
    ///
    /// 루트가 `project`가 아니거나, 태그가 맞지 않거나 닫히지 않았거나,
    /// UTF-8이 아니거나, `parent` 블록이 불완전하면 `MalformedDocument`를 반환합니다.
    pub fn parse(&self, bytes: &[u8], origin: &str) -> Result<CoordinateDocument, ModuleScannerError> {
        let malformed = |reason: String| ModuleScannerError::MalformedDocument {
            origin: origin.to_owned(),
            reason,
        };

        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        std::str::from_utf8(bytes).map_err(|e| malformed(format!("invalid UTF-8: {e}")))?;

        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut doc = CoordinateDocument {
            origin: origin.to_owned(),
            ..Default::default()
        };
        let mut parent: Option<ParentFields> = None;
        let mut stack: Vec<String> = Vec::new();
        let mut root_seen = false;

        loop {
            let event = reader.read_event().map_err(|e| {
                malformed(format!(
                    "xml error at position {}: {e}",
                    reader.buffer_position()
                ))
            })?;

            match event {
                Event::Start(start) => {
                    let tag = local_name(start.local_name().as_ref(), &malformed)?;
                    if stack.is_empty() {
                        check_root(&tag, root_seen, &malformed)?;
                        root_seen = true;
                    } else if stack.len() == 1 && tag == PARENT {
                        parent.get_or_insert_with(ParentFields::default);
                    }
                    stack.push(tag);
                }
                Event::Empty(empty) => {
                    let tag = local_name(empty.local_name().as_ref(), &malformed)?;
                    if stack.is_empty() {
                        check_root(&tag, root_seen, &malformed)?;
                        root_seen = true;
                    } else if stack.len() == 1 && tag == PARENT {
                        parent.get_or_insert_with(ParentFields::default);
                    }
                }
                Event::End(end) => {
                    let tag = local_name(end.local_name().as_ref(), &malformed)?;
                    match stack.pop() {
                        Some(open) if open == tag => {}
                        Some(open) => {
                            return Err(malformed(format!(
                                "mismatched end tag: expected </{open}>, found </{tag}>"
                            )));
                        }
                        None => return Err(malformed(format!("unexpected end tag </{tag}>"))),
                    }
                }
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map_err(|e| malformed(format!("bad text content: {e}")))?;
                    assign(&stack, value.trim(), &mut doc, &mut parent, &malformed)?;
                }
                Event::CData(cdata) => {
                    let value = String::from_utf8(cdata.into_inner().into_owned())
                        .map_err(|e| malformed(format!("invalid UTF-8 in CDATA: {e}")))?;
                    assign(&stack, value.trim(), &mut doc, &mut parent, &malformed)?;
                }
                Event::Eof => break,
                // 선언, 주석, 처리 명령, DOCTYPE
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(malformed(format!("unclosed element <{open}>")));
        }
        if !root_seen {
            return Err(malformed(format!("missing <{ROOT}> root element")));
        }

        if let Some(fields) = parent {
            let reference = match (fields.group, fields.artifact, fields.version) {
                (Some(group), Some(artifact), Some(version)) => {
                    ParentReference::new(group, artifact, version)
                }
                _ => {
                    return Err(malformed(
                        "parent requires groupId, artifactId and version".to_owned(),
                    ));
                }
            };
            if doc.group.is_none() {
                doc.group = Some(reference.group.clone());
            }
            if doc.version.is_none() {
                doc.version = Some(reference.version.clone());
            }
            doc.parent = Some(reference);
        }

        Ok(doc)
    }
}

fn local_name<F>(raw: &[u8], malformed: &F) -> Result<String, ModuleScannerError>
where
    F: Fn(String) -> ModuleScannerError,
{
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|e| malformed(format!("invalid element name: {e}")))
}

fn check_root<F>(tag: &str, root_seen: bool, malformed: &F) -> Result<(), ModuleScannerError>
where
    F: Fn(String) -> ModuleScannerError,
{
    if root_seen {
        return Err(malformed(format!("unexpected second root element <{tag}>")));
    }
    if tag != ROOT {
        return Err(malformed(format!(
            "root element must be <{ROOT}>, found <{tag}>"
        )));
    }
    Ok(())
}

/// 현재 요소 스택에 맞는 필드에 텍스트를 기록합니다.
fn assign<F>(
    stack: &[String],
    value: &str,
    doc: &mut CoordinateDocument,
    parent: &mut Option<ParentFields>,
    malformed: &F,
) -> Result<(), ModuleScannerError>
where
    F: Fn(String) -> ModuleScannerError,
{
    if value.is_empty() {
        return Ok(());
    }

    match stack {
        [] => Err(malformed("text outside of root element".to_owned())),
        [_, tag] => {
            let slot = match Field::from_tag(tag) {
                Some(Field::Group) => &mut doc.group,
                Some(Field::Artifact) => &mut doc.artifact,
                Some(Field::Version) => &mut doc.version,
                Some(Field::Name) => &mut doc.name,
                None => return Ok(()),
            };
            append(slot, value);
            Ok(())
        }
        [_, block, tag] if block == PARENT => {
            let Some(fields) = parent.as_mut() else {
                return Ok(());
            };
            let slot = match Field::from_tag(tag) {
                Some(Field::Group) => &mut fields.group,
                Some(Field::Artifact) => &mut fields.artifact,
                Some(Field::Version) => &mut fields.version,
                _ => return Ok(()),
            };
            append(slot, value);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// 주석 등으로 텍스트가 나뉘어 들어오면 이어 붙입니다.
fn append(slot: &mut Option<String>, value: &str) {
    match slot {
        Some(existing) => existing.push_str(value),
        None => *slot = Some(value.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Result<CoordinateDocument, ModuleScannerError> {
        PomParser::new().parse(xml.as_bytes(), "test.pom")
    }

    #[test]
    fn parse_top_level_fields() {
        let doc = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <project xmlns="http://maven.apache.org/POM/4.0.0">
              <modelVersion>4.0.0</modelVersion>
              <groupId>org.apiguardian</groupId>
              <artifactId>apiguardian-api</artifactId>
              <version>1.1.2</version>
              <name>org.apiguardian:apiguardian-api</name>
            </project>"#,
        )
        .unwrap();

        assert_eq!(doc.origin, "test.pom");
        assert_eq!(doc.group.as_deref(), Some("org.apiguardian"));
        assert_eq!(doc.artifact.as_deref(), Some("apiguardian-api"));
        assert_eq!(doc.version.as_deref(), Some("1.1.2"));
        assert_eq!(doc.name.as_deref(), Some("org.apiguardian:apiguardian-api"));
        assert!(doc.parent.is_none());
    }

    #[test]
    fn nested_elements_are_not_top_level_fields() {
        let doc = parse(
            r#"<project>
              <artifactId>baz</artifactId>
              <dependencies>
                <dependency>
                  <groupId>junit</groupId>
                  <artifactId>junit</artifactId>
                  <version>4.13</version>
                </dependency>
              </dependencies>
              <build><plugins><plugin><groupId>x</groupId></plugin></plugins></build>
            </project>"#,
        )
        .unwrap();

        assert_eq!(doc.artifact.as_deref(), Some("baz"));
        assert_eq!(doc.group, None);
        assert_eq!(doc.version, None);
    }

    #[test]
    fn group_and_version_fall_back_to_parent() {
        let doc = parse(
            r#"<project>
              <parent>
                <groupId>foo.bar</groupId>
                <artifactId>parent</artifactId>
                <version>1</version>
              </parent>
              <artifactId>baz</artifactId>
            </project>"#,
        )
        .unwrap();

        assert_eq!(doc.group.as_deref(), Some("foo.bar"));
        assert_eq!(doc.version.as_deref(), Some("1"));
        assert_eq!(doc.artifact.as_deref(), Some("baz"));
        assert_eq!(doc.name, None);
        assert_eq!(
            doc.parent,
            Some(ParentReference::new("foo.bar", "parent", "1"))
        );
    }

    #[test]
    fn own_fields_override_parent_fallback() {
        let doc = parse(
            r#"<project>
              <parent><groupId>foo</groupId><artifactId>p</artifactId><version>1</version></parent>
              <groupId>foo.child</groupId>
              <artifactId>c</artifactId>
              <version>2</version>
            </project>"#,
        )
        .unwrap();
        assert_eq!(doc.group.as_deref(), Some("foo.child"));
        assert_eq!(doc.version.as_deref(), Some("2"));
    }

    #[test]
    fn namespace_prefixes_are_ignored() {
        let doc = parse(
            r#"<pom:project xmlns:pom="http://maven.apache.org/POM/4.0.0">
              <pom:groupId>g</pom:groupId>
              <pom:artifactId>a</pom:artifactId>
            </pom:project>"#,
        )
        .unwrap();
        assert_eq!(doc.group.as_deref(), Some("g"));
        assert_eq!(doc.artifact.as_deref(), Some("a"));
    }

    #[test]
    fn template_tokens_are_left_untouched() {
        let doc = parse(
            r#"<project><artifactId>a</artifactId><name>${project.parent.name} core</name></project>"#,
        )
        .unwrap();
        assert_eq!(doc.name.as_deref(), Some("${project.parent.name} core"));
    }

    #[test]
    fn entities_and_cdata_are_decoded() {
        let doc = parse(
            r#"<project><artifactId>a</artifactId><name>A &amp; B</name><version><![CDATA[1.0]]></version></project>"#,
        )
        .unwrap();
        assert_eq!(doc.name.as_deref(), Some("A & B"));
        assert_eq!(doc.version.as_deref(), Some("1.0"));
    }

    #[test]
    fn wrong_root_is_malformed() {
        let err = parse("<settings><groupId>g</groupId></settings>").unwrap_err();
        assert!(matches!(err, ModuleScannerError::MalformedDocument { .. }));
    }

    #[test]
    fn empty_document_is_malformed() {
        assert!(parse("").is_err());
        assert!(parse(r#"<?xml version="1.0"?>"#).is_err());
    }

    #[test]
    fn unclosed_element_is_malformed() {
        let err = parse("<project><groupId>g</groupId>").unwrap_err();
        assert!(matches!(err, ModuleScannerError::MalformedDocument { .. }));
    }

    #[test]
    fn mismatched_tags_are_malformed() {
        let err = parse("<project><groupId>g</artifactId></project>").unwrap_err();
        assert!(matches!(err, ModuleScannerError::MalformedDocument { .. }));
    }

    #[test]
    fn incomplete_parent_is_malformed() {
        let err = parse(
            "<project><parent><groupId>g</groupId><artifactId>p</artifactId></parent></project>",
        )
        .unwrap_err();
        assert!(err.to_string().contains("parent"));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let err = PomParser::new()
            .parse(b"<project><name>\xff\xfe</name></project>", "bad.pom")
            .unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn self_closing_root_is_empty_document() {
        let doc = parse("<project/>").unwrap();
        assert_eq!(doc.group, None);
        assert_eq!(doc.artifact, None);
    }
}
