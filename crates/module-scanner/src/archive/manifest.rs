//! `META-INF/MANIFEST.MF` 메인 섹션 파서
//!
//! # 형식
//!
//! ```text
//! Manifest-Version: 1.0
//! Automatic-Module-Name: org.apiguardian.api
//! Implementation-Title: very long value that is
//!  continued on the next line
//!
//! Name: org/example/
//! Sealed: true
//! ```
//!
//! 첫 빈 줄까지가 메인 섹션입니다. 공백 하나로 시작하는 줄은 앞 값의
//! 연속입니다. 속성 이름은 대소문자를 구분하지 않습니다.

/// 매니페스트 메인 섹션 속성
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    /// 매니페스트 바이트를 파싱합니다.
    ///
    /// 잘못된 줄(`:` 없음)은 무시합니다. UTF-8이 아닌 바이트는 대체 문자로 바뀝니다.
    pub fn parse(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        let mut attributes: Vec<(String, String)> = Vec::new();
        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                break;
            }
            if let Some(continuation) = line.strip_prefix(' ') {
                if let Some((_, value)) = attributes.last_mut() {
                    value.push_str(continuation);
                }
                continue;
            }
            match line.split_once(':') {
                Some((key, value)) => {
                    let value = value.strip_prefix(' ').unwrap_or(value);
                    attributes.push((key.trim().to_owned(), value.to_owned()));
                }
                None => {
                    tracing::debug!(line, "ignoring malformed manifest line");
                }
            }
        }

        Self { attributes }
    }

    /// 속성 값을 조회합니다 (이름 대소문자 무시, 첫 번째 값 우선).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim_end())
    }

    /// 속성 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_main_section() {
        let manifest = Manifest::parse(
            b"Manifest-Version: 1.0\r\nAutomatic-Module-Name: org.apiguardian.api\r\n\r\n",
        );
        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest.get("Automatic-Module-Name"),
            Some("org.apiguardian.api")
        );
    }

    #[test]
    fn keys_are_case_insensitive() {
        let manifest = Manifest::parse(b"automatic-module-name: a.b\n");
        assert_eq!(manifest.get("Automatic-Module-Name"), Some("a.b"));
    }

    #[test]
    fn continuation_lines_are_joined() {
        let manifest = Manifest::parse(
            b"Manifest-Version: 1.0\nAutomatic-Module-Name: org.example.very.lo\n ng.name\n",
        );
        assert_eq!(
            manifest.get("Automatic-Module-Name"),
            Some("org.example.very.long.name")
        );
    }

    #[test]
    fn per_entry_sections_are_ignored() {
        let manifest = Manifest::parse(
            b"Manifest-Version: 1.0\n\nName: org/example/\nAutomatic-Module-Name: nope\n",
        );
        assert_eq!(manifest.get("Automatic-Module-Name"), None);
    }

    #[test]
    fn missing_key_is_none() {
        let manifest = Manifest::parse(b"Manifest-Version: 1.0\n");
        assert_eq!(manifest.get("Automatic-Module-Name"), None);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let manifest = Manifest::parse(b"garbage line\nCreated-By: hand\n");
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("Created-By"), Some("hand"));
    }

    #[test]
    fn empty_manifest() {
        assert!(Manifest::parse(b"").is_empty());
    }
}
