//! ZIP32 중앙 디렉토리 인덱스 + 엔트리 해제
//!
//! # Invariants
//! - 모든 크기/오프셋은 신뢰하지 않으며 버퍼 길이로 검증한 뒤 사용합니다.
//! - 해제된 데이터는 중앙 디렉토리에 기록된 크기와 CRC-32로 검증합니다.
//!
//! # Supported
//! - Zip32 (EOCD + central directory)
//! - 엔트리: stored (method 0), deflate (method 8)
//!
//! # Not Supported
//! - Zip64 (0xFFFF / 0xFFFFFFFF sentinel 필드)
//! - 다중 디스크 아카이브, 암호화 엔트리

use std::collections::BTreeMap;
use std::io::Read;
use std::ops::Bound;

use flate2::Crc;
use flate2::read::DeflateDecoder;

const SIG_EOCD: u32 = 0x0605_4b50;
const SIG_CDFH: u32 = 0x0201_4b50;
const SIG_LFH: u32 = 0x0403_4b50;

const EOCD_MIN_LEN: usize = 22;
/// 중앙 디렉토리 고정 헤더 길이
const CDFH_LEN: usize = 46;
/// 로컬 파일 헤더 고정 길이
const LFH_LEN: usize = 30;
const MAX_COMMENT_LEN: usize = u16::MAX as usize;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

const FLAG_ENCRYPTED: u16 = 0x0001;

/// ZIP 처리 실패 사유 (호출자가 경로를 붙여 에러로 변환)
pub(crate) type ZipResult<T> = Result<T, String>;

/// 중앙 디렉토리 엔트리 메타데이터
#[derive(Debug, Clone)]
pub(crate) struct ZipEntry {
    pub name: String,
    pub flags: u16,
    pub method: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub local_header_offset: u64,
}

impl ZipEntry {
    pub fn is_encrypted(&self) -> bool {
        (self.flags & FLAG_ENCRYPTED) != 0
    }
}

/// 이름으로 정렬된 엔트리 인덱스
#[derive(Debug, Default)]
pub(crate) struct ZipIndex {
    entries: BTreeMap<String, ZipEntry>,
}

impl ZipIndex {
    /// 아카이브 바이트에서 EOCD를 찾아 중앙 디렉토리를 읽습니다.
    pub fn parse(data: &[u8]) -> ZipResult<Self> {
        let eocd_pos = find_eocd(data).ok_or("end of central directory not found")?;
        let eocd = &data[eocd_pos..];

        let disk_no = le_u16(eocd, 4);
        let cd_disk = le_u16(eocd, 6);
        let entries_disk = le_u16(eocd, 8);
        let entries_total = le_u16(eocd, 10);
        let cd_size = le_u32(eocd, 12);
        let cd_off = le_u32(eocd, 16);

        if entries_total == u16::MAX || cd_size == u32::MAX || cd_off == u32::MAX {
            return Err("zip64 archives are not supported".to_owned());
        }
        if disk_no != 0 || cd_disk != 0 || entries_disk != entries_total {
            return Err("multi-disk archives are not supported".to_owned());
        }

        let cd_start = cd_off as usize;
        let cd_end = cd_start
            .checked_add(cd_size as usize)
            .filter(|end| *end <= eocd_pos)
            .ok_or("central directory out of bounds")?;

        let mut entries = BTreeMap::new();
        let mut pos = cd_start;
        for _ in 0..entries_total {
            if pos + CDFH_LEN > cd_end || le_u32(data, pos) != SIG_CDFH {
                return Err(format!("bad central directory header at offset {pos}"));
            }
            let flags = le_u16(data, pos + 8);
            let method = le_u16(data, pos + 10);
            let crc32 = le_u32(data, pos + 16);
            let compressed_size = le_u32(data, pos + 20);
            let uncompressed_size = le_u32(data, pos + 24);
            let name_len = le_u16(data, pos + 28) as usize;
            let extra_len = le_u16(data, pos + 30) as usize;
            let comment_len = le_u16(data, pos + 32) as usize;
            let local_header_offset = le_u32(data, pos + 42);

            if compressed_size == u32::MAX
                || uncompressed_size == u32::MAX
                || local_header_offset == u32::MAX
            {
                return Err("zip64 entries are not supported".to_owned());
            }

            let name_start = pos + CDFH_LEN;
            let next = name_start + name_len + extra_len + comment_len;
            if next > cd_end {
                return Err(format!("central directory entry at {pos} overruns directory"));
            }
            let name = String::from_utf8_lossy(&data[name_start..name_start + name_len])
                .into_owned();

            // 중복 이름은 첫 엔트리를 유지
            entries.entry(name.clone()).or_insert(ZipEntry {
                name,
                flags,
                method,
                crc32,
                compressed_size: u64::from(compressed_size),
                uncompressed_size: u64::from(uncompressed_size),
                local_header_offset: u64::from(local_header_offset),
            });
            pos = next;
        }

        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&ZipEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 디렉토리 접두어 아래의 엔트리 이름을 정렬 순서로 반환합니다.
    pub fn names_under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(name, _)| name.starts_with(prefix))
            .map(|(name, _)| name.as_str())
    }

    /// 엔트리 데이터를 해제하고 크기/CRC를 검증합니다.
    pub fn extract(&self, data: &[u8], entry: &ZipEntry, max_size: u64) -> ZipResult<Vec<u8>> {
        if entry.is_encrypted() {
            return Err(format!("entry '{}' is encrypted", entry.name));
        }
        if entry.uncompressed_size > max_size {
            return Err(format!(
                "entry '{}' expands to {} bytes (max: {max_size})",
                entry.name, entry.uncompressed_size
            ));
        }

        let lfh = entry.local_header_offset as usize;
        if lfh + LFH_LEN > data.len() || le_u32(data, lfh) != SIG_LFH {
            return Err(format!("bad local header for '{}'", entry.name));
        }
        let name_len = le_u16(data, lfh + 26) as usize;
        let extra_len = le_u16(data, lfh + 28) as usize;
        let start = lfh + LFH_LEN + name_len + extra_len;
        let end = start
            .checked_add(entry.compressed_size as usize)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| format!("entry '{}' data out of bounds", entry.name))?;
        let raw = &data[start..end];

        let out = match entry.method {
            METHOD_STORED => raw.to_vec(),
            METHOD_DEFLATE => {
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                DeflateDecoder::new(raw)
                    .take(entry.uncompressed_size + 1)
                    .read_to_end(&mut out)
                    .map_err(|e| format!("inflate '{}' failed: {e}", entry.name))?;
                out
            }
            other => {
                return Err(format!(
                    "entry '{}' uses unsupported compression method {other}",
                    entry.name
                ));
            }
        };

        if out.len() as u64 != entry.uncompressed_size {
            return Err(format!(
                "entry '{}' size mismatch: expected {}, got {}",
                entry.name,
                entry.uncompressed_size,
                out.len()
            ));
        }

        let mut crc = Crc::new();
        crc.update(&out);
        if crc.sum() != entry.crc32 {
            return Err(format!("entry '{}' crc mismatch", entry.name));
        }

        Ok(out)
    }
}

/// ZIP 시그니처(`PK..`)로 시작하는지 확인합니다.
pub(crate) fn is_zip_magic(header: &[u8]) -> bool {
    header.len() >= 4
        && header[0] == b'P'
        && header[1] == b'K'
        && matches!((header[2], header[3]), (3, 4) | (5, 6) | (7, 8))
}

/// 뒤에서부터 EOCD 시그니처를 찾습니다.
///
/// 코멘트 길이가 파일 끝을 넘는 후보는 건너뜁니다.
fn find_eocd(data: &[u8]) -> Option<usize> {
    if data.len() < EOCD_MIN_LEN {
        return None;
    }
    let last = data.len() - EOCD_MIN_LEN;
    let first = last.saturating_sub(MAX_COMMENT_LEN);
    (first..=last).rev().find(|&pos| {
        le_u32(data, pos) == SIG_EOCD
            && pos + EOCD_MIN_LEN + le_u16(data, pos + 20) as usize <= data.len()
    })
}

#[inline]
fn le_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

#[inline]
fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
