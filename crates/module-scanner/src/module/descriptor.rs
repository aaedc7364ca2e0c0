//! `module-info.class` 파서
//!
//! 클래스 파일에서 모듈명 하나만 읽습니다. 상수 풀을 인덱싱한 뒤
//! `ACC_MODULE` 플래그를 확인하고 `Module` 속성의 `module_name_index`를 따라갑니다.
//!
//! # Invariants
//! - 모든 길이/인덱스는 버퍼 경계와 상수 풀 크기로 검증합니다.
//! - 실패는 사유 문자열로 반환하며 호출자가 경로를 붙입니다.

const MAGIC: u32 = 0xCAFE_BABE;
const ACC_MODULE: u16 = 0x8000;

const TAG_UTF8: u8 = 1;
const TAG_MODULE: u8 = 19;

/// 상수 풀 엔트리 (모듈명 추적에 필요한 것만 보존)
#[derive(Debug, Clone, Copy)]
enum Constant<'a> {
    Utf8(&'a [u8]),
    Module(u16),
    Other,
    /// long/double 뒤의 빈 슬롯
    Unusable,
}

struct ClassReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ClassReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], String> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| format!("truncated class file at offset {}", self.pos))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, String> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, String> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, String> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn skip(&mut self, len: usize) -> Result<(), String> {
        self.bytes(len).map(|_| ())
    }

    /// 필드/메서드 테이블을 건너뜁니다.
    fn skip_members(&mut self) -> Result<(), String> {
        let count = self.u16()?;
        for _ in 0..count {
            self.skip(6)?; // access_flags, name_index, descriptor_index
            self.skip_attributes()?;
        }
        Ok(())
    }

    fn skip_attributes(&mut self) -> Result<(), String> {
        let count = self.u16()?;
        for _ in 0..count {
            self.skip(2)?;
            let len = self.u32()? as usize;
            self.skip(len)?;
        }
        Ok(())
    }
}

/// 모듈 디스크립터 바이트에서 모듈명을 추출합니다.
pub(crate) fn parse_module_name(data: &[u8]) -> Result<String, String> {
    let mut reader = ClassReader::new(data);

    if reader.u32()? != MAGIC {
        return Err("bad class file magic".to_owned());
    }
    reader.skip(4)?; // minor, major

    let pool = read_constant_pool(&mut reader)?;

    let access_flags = reader.u16()?;
    if access_flags & ACC_MODULE == 0 {
        return Err("class is not a module descriptor (ACC_MODULE not set)".to_owned());
    }

    reader.skip(4)?; // this_class, super_class
    let interfaces = reader.u16()? as usize;
    reader.skip(interfaces * 2)?;
    reader.skip_members()?; // fields
    reader.skip_members()?; // methods

    let attributes = reader.u16()?;
    for _ in 0..attributes {
        let name_index = reader.u16()?;
        let len = reader.u32()? as usize;
        let body = reader.bytes(len)?;
        if utf8_at(&pool, name_index)? != "Module" {
            continue;
        }

        let mut attr = ClassReader::new(body);
        let module_index = attr.u16()?;
        let name_index = match pool.get(usize::from(module_index)) {
            Some(Constant::Module(index)) => *index,
            _ => return Err(format!("constant #{module_index} is not a module")),
        };
        return utf8_at(&pool, name_index);
    }

    Err("Module attribute not found".to_owned())
}

fn read_constant_pool<'a>(reader: &mut ClassReader<'a>) -> Result<Vec<Constant<'a>>, String> {
    let count = reader.u16()?;
    if count == 0 {
        return Err("empty constant pool".to_owned());
    }

    // 인덱스 0은 사용하지 않음
    let mut pool = Vec::with_capacity(usize::from(count));
    pool.push(Constant::Unusable);

    while pool.len() < usize::from(count) {
        let tag = reader.u8()?;
        match tag {
            TAG_UTF8 => {
                let len = reader.u16()? as usize;
                pool.push(Constant::Utf8(reader.bytes(len)?));
            }
            TAG_MODULE => pool.push(Constant::Module(reader.u16()?)),
            // Class, String, MethodType, Package
            7 | 8 | 16 | 20 => {
                reader.skip(2)?;
                pool.push(Constant::Other);
            }
            // MethodHandle
            15 => {
                reader.skip(3)?;
                pool.push(Constant::Other);
            }
            // Integer, Float, Field/Method/InterfaceMethodref, NameAndType, Dynamic, InvokeDynamic
            3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                reader.skip(4)?;
                pool.push(Constant::Other);
            }
            // Long, Double
            5 | 6 => {
                reader.skip(8)?;
                pool.push(Constant::Other);
                pool.push(Constant::Unusable);
            }
            other => {
                return Err(format!(
                    "unknown constant pool tag {other} at index {}",
                    pool.len()
                ));
            }
        }
    }

    Ok(pool)
}

fn utf8_at(pool: &[Constant<'_>], index: u16) -> Result<String, String> {
    match pool.get(usize::from(index)) {
        Some(Constant::Utf8(bytes)) => std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| format!("constant #{index} is not valid UTF-8")),
        _ => Err(format!("constant #{index} is not a UTF-8 entry")),
    }
}
