//! 모듈명 문법 검사와 파일명 기반 모듈명 유도

/// Java 예약어와 리터럴 (모듈명 세그먼트로 사용 불가)
const RESERVED: &[&str] = &[
    "abstract",
    "assert",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "extends",
    "false",
    "final",
    "finally",
    "float",
    "for",
    "goto",
    "if",
    "implements",
    "import",
    "instanceof",
    "int",
    "interface",
    "long",
    "native",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "short",
    "static",
    "strictfp",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "true",
    "try",
    "void",
    "volatile",
    "while",
    "_",
];

/// 모듈명이 문법에 맞는지 검사합니다.
///
/// 점으로 구분된 세그먼트마다 문자로 시작하고 문자/숫자/`_`만 포함해야 하며,
/// 예약어는 허용되지 않습니다.
///
/// ```
/// use modscan_module_scanner::module::is_valid_module_name;
///
/// assert!(is_valid_module_name("org.apiguardian.api"));
/// assert!(!is_valid_module_name("org.example.int"));
/// assert!(!is_valid_module_name("9lives"));
/// ```
pub fn is_valid_module_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_valid_segment)
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    let starts_with_letter = chars.next().is_some_and(char::is_alphabetic);
    starts_with_letter
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !RESERVED.contains(&segment)
}

/// JAR 파일명에서 모듈명 후보를 유도합니다.
///
/// 1. `.jar` 확장자 제거
/// 2. 버전 시작 위치(`-` 뒤에 숫자가 오고 `.` 또는 끝으로 이어지는 곳)에서 자름
/// 3. 영숫자가 아닌 문자 연속을 `.` 하나로 치환, 앞뒤 `.` 제거
/// 4. 소문자화
///
/// 결과가 비면 `None`을 반환합니다.
///
/// ```
/// use modscan_module_scanner::module::derive_from_file_name;
///
/// assert_eq!(
///     derive_from_file_name("automatic-module-name-not-present.jar").as_deref(),
///     Some("automatic.module.name.not.present")
/// );
/// assert_eq!(
///     derive_from_file_name("commons-lang3-3.12.0.jar").as_deref(),
///     Some("commons.lang3")
/// );
/// ```
pub fn derive_from_file_name(file_name: &str) -> Option<String> {
    let stem = strip_jar_extension(file_name);
    let stem = match version_start(stem) {
        Some(pos) => &stem[..pos],
        None => stem,
    };

    let mut name = String::with_capacity(stem.len());
    let mut pending_dot = false;
    for c in stem.chars() {
        if c.is_alphanumeric() {
            if pending_dot && !name.is_empty() {
                name.push('.');
            }
            pending_dot = false;
            name.extend(c.to_lowercase());
        } else {
            pending_dot = true;
        }
    }

    if name.is_empty() { None } else { Some(name) }
}

fn strip_jar_extension(file_name: &str) -> &str {
    let len = file_name.len();
    if len >= 4
        && file_name.is_char_boundary(len - 4)
        && file_name[len - 4..].eq_ignore_ascii_case(".jar")
    {
        &file_name[..len - 4]
    } else {
        file_name
    }
}

/// 첫 번째 `-<digits>(.|끝)` 위치를 찾습니다.
fn version_start(stem: &str) -> Option<usize> {
    let bytes = stem.as_bytes();
    bytes.iter().enumerate().find_map(|(i, &b)| {
        if b != b'-' {
            return None;
        }
        let digits = bytes[i + 1..]
            .iter()
            .take_while(|d| d.is_ascii_digit())
            .count();
        if digits == 0 {
            return None;
        }
        match bytes.get(i + 1 + digits) {
            None | Some(b'.') => Some(i),
            Some(_) => None,
        }
    })
}
