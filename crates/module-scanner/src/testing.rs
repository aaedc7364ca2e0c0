//! 테스트/벤치마크용 픽스처 빌더
//!
//! 디스크의 바이너리 픽스처 없이 JAR과 `module-info.class`를 메모리에서 조립합니다.
//!
//! ```
//! use modscan_module_scanner::testing::{JarBuilder, module_info_class};
//!
//! let jar = JarBuilder::new()
//!     .manifest(&[("Created-By", "hand")])
//!     .stored("module-info.class", &module_info_class("ice.cream"))
//!     .build();
//! assert!(jar.starts_with(b"PK\x03\x04"));
//! ```

use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::Crc;
use flate2::write::DeflateEncoder;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

struct PendingEntry {
    name: String,
    data: Vec<u8>,
    deflate: bool,
}

/// 메모리 ZIP(JAR) 빌더
///
/// 엔트리는 추가한 순서대로 기록됩니다.
#[derive(Default)]
pub struct JarBuilder {
    entries: Vec<PendingEntry>,
    comment: String,
}

impl JarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 비압축 엔트리를 추가합니다.
    pub fn stored(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(PendingEntry {
            name: name.to_owned(),
            data: data.to_vec(),
            deflate: false,
        });
        self
    }

    /// deflate 압축 엔트리를 추가합니다.
    pub fn deflated(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(PendingEntry {
            name: name.to_owned(),
            data: data.to_vec(),
            deflate: true,
        });
        self
    }

    /// 디렉토리 엔트리를 추가합니다 (`name`은 `/`로 끝나야 함).
    pub fn directory(self, name: &str) -> Self {
        self.stored(name, &[])
    }

    /// `META-INF/MANIFEST.MF`를 추가합니다. `Manifest-Version`은 자동으로 붙습니다.
    pub fn manifest(self, attributes: &[(&str, &str)]) -> Self {
        let mut text = String::from("Manifest-Version: 1.0\r\n");
        for (key, value) in attributes {
            text.push_str(key);
            text.push_str(": ");
            text.push_str(value);
            text.push_str("\r\n");
        }
        text.push_str("\r\n");
        self.deflated("META-INF/MANIFEST.MF", text.as_bytes())
    }

    /// 모듈 디스크립터(`module-info.class`)를 추가합니다.
    pub fn module_info(self, module_name: &str) -> Self {
        self.stored("module-info.class", &module_info_class(module_name))
    }

    /// 아카이브 코멘트를 설정합니다.
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_owned();
        self
    }

    /// ZIP 바이트를 생성합니다.
    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let mut crc = Crc::new();
            crc.update(&entry.data);

            let (method, payload) = if entry.deflate {
                match deflate(&entry.data) {
                    Ok(compressed) => (METHOD_DEFLATE, compressed),
                    Err(_) => (METHOD_STORED, entry.data.clone()),
                }
            } else {
                (METHOD_STORED, entry.data.clone())
            };

            let offset = out.len() as u32;
            let name = entry.name.as_bytes();

            // local file header
            out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes()); // version needed
            out.extend_from_slice(&0u16.to_le_bytes()); // flags
            out.extend_from_slice(&method.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // time + date
            out.extend_from_slice(&crc.sum().to_le_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes()); // extra
            out.extend_from_slice(name);
            out.extend_from_slice(&payload);

            // central directory header
            central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
            central.extend_from_slice(&20u16.to_le_bytes()); // version made by
            central.extend_from_slice(&20u16.to_le_bytes()); // version needed
            central.extend_from_slice(&0u16.to_le_bytes()); // flags
            central.extend_from_slice(&method.to_le_bytes());
            central.extend_from_slice(&0u32.to_le_bytes()); // time + date
            central.extend_from_slice(&crc.sum().to_le_bytes());
            central.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            central.extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(name.len() as u16).to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes()); // extra
            central.extend_from_slice(&0u16.to_le_bytes()); // comment
            central.extend_from_slice(&0u16.to_le_bytes()); // disk start
            central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
            central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
            central.extend_from_slice(&offset.to_le_bytes());
            central.extend_from_slice(name);
        }

        let cd_offset = out.len() as u32;
        let cd_size = central.len() as u32;
        let count = self.entries.len() as u16;
        out.extend_from_slice(&central);

        // end of central directory
        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // disk
        out.extend_from_slice(&0u16.to_le_bytes()); // cd disk
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&(self.comment.len() as u16).to_le_bytes());
        out.extend_from_slice(self.comment.as_bytes());

        out
    }

    /// ZIP 바이트를 파일로 씁니다.
    pub fn write_to(self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.build())
    }
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// 모듈명을 선언하는 최소 `module-info.class` 바이트를 생성합니다.
///
/// `requires java.base` 하나만 포함합니다.
pub fn module_info_class(module_name: &str) -> Vec<u8> {
    let mut pool = ConstantPool::default();
    let this_name = pool.utf8("module-info");
    let this_class = pool.tagged(7, this_name);
    let attr_name = pool.utf8("Module");
    let name_utf8 = pool.utf8(module_name);
    let module = pool.tagged(19, name_utf8);
    let base_utf8 = pool.utf8("java.base");
    let base = pool.tagged(19, base_utf8);

    let mut out = Vec::new();
    out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // minor
    out.extend_from_slice(&53u16.to_be_bytes()); // major (Java 9)
    out.extend_from_slice(&(pool.count + 1).to_be_bytes());
    out.extend_from_slice(&pool.bytes);
    out.extend_from_slice(&0x8000u16.to_be_bytes()); // ACC_MODULE
    out.extend_from_slice(&this_class.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // super_class
    out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
    out.extend_from_slice(&0u16.to_be_bytes()); // fields
    out.extend_from_slice(&0u16.to_be_bytes()); // methods
    out.extend_from_slice(&1u16.to_be_bytes()); // attributes

    let mut body = Vec::new();
    body.extend_from_slice(&module.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes()); // module_flags
    body.extend_from_slice(&0u16.to_be_bytes()); // module_version
    body.extend_from_slice(&1u16.to_be_bytes()); // requires_count
    body.extend_from_slice(&base.to_be_bytes());
    body.extend_from_slice(&0x8000u16.to_be_bytes()); // ACC_MANDATED
    body.extend_from_slice(&0u16.to_be_bytes());
    for _ in 0..4 {
        body.extend_from_slice(&0u16.to_be_bytes()); // exports, opens, uses, provides
    }

    out.extend_from_slice(&attr_name.to_be_bytes());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

#[derive(Default)]
struct ConstantPool {
    bytes: Vec<u8>,
    count: u16,
}

impl ConstantPool {
    fn utf8(&mut self, value: &str) -> u16 {
        self.bytes.push(1);
        self.bytes
            .extend_from_slice(&(value.len() as u16).to_be_bytes());
        self.bytes.extend_from_slice(value.as_bytes());
        self.count += 1;
        self.count
    }

    fn tagged(&mut self, tag: u8, index: u16) -> u16 {
        self.bytes.push(tag);
        self.bytes.extend_from_slice(&index.to_be_bytes());
        self.count += 1;
        self.count
    }
}
