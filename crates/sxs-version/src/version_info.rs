use anyhow::{anyhow, bail, Context, Result};
use sxs_core::VersionKey;

use crate::pe::{read_u16, read_u32};

const ROOT_KEY: &str = "VS_VERSION_INFO";
const STRING_FILE_INFO_KEY: &str = "StringFileInfo";
const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;
const FIXED_FILE_INFO_LEN: usize = 52;
const BLOCK_HEADER_LEN: usize = 6;
const TEXT_VALUE_TYPE: u16 = 1;
const MAX_BLOCK_DEPTH: usize = 8;

/// Fixed and string-table version metadata of an executable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileVersionInfo {
    pub file_major: u16,
    pub file_minor: u16,
    pub file_build: u16,
    pub file_private: u16,
    pub file_description: Option<String>,
    pub file_version: Option<String>,
    pub product_name: Option<String>,
    pub product_version: Option<String>,
    pub company_name: Option<String>,
}

impl FileVersionInfo {
    /// `major.minor.build`; the private part never takes part in the key.
    pub fn version_key(&self) -> VersionKey {
        VersionKey::new(
            u64::from(self.file_major),
            u64::from(self.file_minor),
            u64::from(self.file_build),
        )
    }
}

struct Block<'a> {
    key: String,
    kind: u16,
    value: &'a [u8],
    children: Vec<Block<'a>>,
    len: usize,
}

fn align4(offset: usize) -> usize {
    (offset + 3) & !3
}

fn parse_block(data: &[u8], start: usize, depth: usize) -> Result<Block<'_>> {
    if depth > MAX_BLOCK_DEPTH {
        bail!("version resource nests deeper than {MAX_BLOCK_DEPTH} levels");
    }
    let declared_len = read_u16(data, start)? as usize;
    if declared_len < BLOCK_HEADER_LEN {
        bail!("version block at {start:#x} has invalid length {declared_len}");
    }
    let end = start
        .checked_add(declared_len)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| anyhow!("version block at {start:#x} runs past end of resource"))?;
    let value_len = read_u16(data, start + 2)? as usize;
    let kind = read_u16(data, start + 4)?;

    let mut key_units = Vec::new();
    let mut cursor = start + BLOCK_HEADER_LEN;
    loop {
        if cursor + 2 > end {
            bail!("version block key at {start:#x} is not terminated");
        }
        let unit = read_u16(data, cursor)?;
        cursor += 2;
        if unit == 0 {
            break;
        }
        key_units.push(unit);
    }
    let key = String::from_utf16_lossy(&key_units);

    let value_start = align4(cursor).min(end);
    let value_bytes = if kind == TEXT_VALUE_TYPE {
        value_len * 2
    } else {
        value_len
    };
    let value_end = value_start.saturating_add(value_bytes).min(end);
    let value = &data[value_start..value_end];

    let mut children = Vec::new();
    let mut child_start = align4(value_end);
    while child_start + BLOCK_HEADER_LEN <= end {
        let child = parse_block(&data[..end], child_start, depth + 1)
            .with_context(|| format!("invalid child of version block '{key}'"))?;
        child_start = align4(child_start + child.len);
        children.push(child);
    }

    Ok(Block {
        key,
        kind,
        value,
        children,
        len: declared_len,
    })
}

fn decode_text(value: &[u8]) -> String {
    let units = value
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0)
        .collect::<Vec<_>>();
    String::from_utf16_lossy(&units)
}

/// Parses a raw `VS_VERSIONINFO` resource.
pub fn parse_version_info(resource: &[u8]) -> Result<FileVersionInfo> {
    let root = parse_block(resource, 0, 0).context("malformed version resource")?;
    if root.key != ROOT_KEY {
        bail!("version resource root key is '{}', expected '{ROOT_KEY}'", root.key);
    }
    if root.value.len() < FIXED_FILE_INFO_LEN {
        bail!("version resource has no fixed file info");
    }
    if read_u32(root.value, 0)? != FIXED_FILE_INFO_SIGNATURE {
        bail!("fixed file info signature mismatch");
    }

    let version_ms = read_u32(root.value, 8)?;
    let version_ls = read_u32(root.value, 12)?;
    let mut info = FileVersionInfo {
        file_major: (version_ms >> 16) as u16,
        file_minor: (version_ms & 0xffff) as u16,
        file_build: (version_ls >> 16) as u16,
        file_private: (version_ls & 0xffff) as u16,
        ..FileVersionInfo::default()
    };

    let tables = root
        .children
        .iter()
        .filter(|child| child.key == STRING_FILE_INFO_KEY)
        .flat_map(|string_file_info| string_file_info.children.iter());
    for table in tables {
        for entry in &table.children {
            let text = if entry.kind == TEXT_VALUE_TYPE {
                decode_text(entry.value)
            } else {
                String::from_utf8_lossy(entry.value)
                    .trim_end_matches('\0')
                    .to_string()
            };
            let slot = match entry.key.as_str() {
                "FileDescription" => &mut info.file_description,
                "FileVersion" => &mut info.file_version,
                "ProductName" => &mut info.product_name,
                "ProductVersion" => &mut info.product_version,
                "CompanyName" => &mut info.company_name,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(text);
            }
        }
    }

    Ok(info)
}
