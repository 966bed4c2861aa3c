//! Synthesized PE images carrying a version resource, for tests that need a
//! real-looking editor executable on disk.

use std::fs;
use std::io;
use std::path::Path;

const SECTION_RVA: u32 = 0x1000;
const FILE_ALIGNMENT: usize = 0x200;
const OPTIONAL_HEADER_LEN: usize = 240;

#[derive(Debug, Clone)]
pub struct FixtureVersion {
    pub file_version: (u16, u16, u16, u16),
    pub strings: Vec<(String, String)>,
}

impl FixtureVersion {
    /// An editor binary as the Unity installer ships it.
    pub fn unity_editor(major: u16, minor: u16, build: u16) -> Self {
        Self {
            file_version: (major, minor, build, 0),
            strings: vec![
                ("CompanyName".to_string(), "Unity Technologies ApS".to_string()),
                ("FileDescription".to_string(), "Unity Editor".to_string()),
                (
                    "FileVersion".to_string(),
                    format!("{major}.{minor}.{build}.0"),
                ),
                ("ProductName".to_string(), "Unity Editor".to_string()),
            ],
        }
    }

    pub fn with_string(mut self, key: &str, value: &str) -> Self {
        self.strings.retain(|(existing, _)| existing != key);
        self.strings.push((key.to_string(), value.to_string()));
        self
    }

    pub fn without_string(mut self, key: &str) -> Self {
        self.strings.retain(|(existing, _)| existing != key);
        self
    }
}

fn utf16z(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

fn pad4(bytes: &mut Vec<u8>) {
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
}

fn encode_block(key: &str, kind: u16, value_len: u16, value: &[u8], children: &[Vec<u8>]) -> Vec<u8> {
    let mut block = vec![0, 0];
    block.extend_from_slice(&value_len.to_le_bytes());
    block.extend_from_slice(&kind.to_le_bytes());
    block.extend_from_slice(&utf16z(key));
    pad4(&mut block);
    block.extend_from_slice(value);
    for child in children {
        pad4(&mut block);
        block.extend_from_slice(child);
    }
    let len = block.len() as u16;
    block[..2].copy_from_slice(&len.to_le_bytes());
    block
}

/// Encodes a `VS_VERSIONINFO` resource.
pub fn version_resource(version: &FixtureVersion) -> Vec<u8> {
    let (major, minor, build, private) = version.file_version;
    let version_ms = (u32::from(major) << 16) | u32::from(minor);
    let version_ls = (u32::from(build) << 16) | u32::from(private);

    let mut fixed = Vec::with_capacity(52);
    for field in [
        0xFEEF_04BD_u32,
        0x0001_0000,
        version_ms,
        version_ls,
        version_ms,
        version_ls,
        0x3f,
        0,
        0x0004_0004,
        1,
        0,
        0,
        0,
    ] {
        fixed.extend_from_slice(&field.to_le_bytes());
    }

    let strings = version
        .strings
        .iter()
        .map(|(key, value)| {
            let encoded = utf16z(value);
            encode_block(key, 1, (encoded.len() / 2) as u16, &encoded, &[])
        })
        .collect::<Vec<_>>();
    let table = encode_block("040904b0", 1, 0, &[], &strings);
    let string_file_info = encode_block("StringFileInfo", 1, 0, &[], &[table]);
    encode_block("VS_VERSION_INFO", 0, fixed.len() as u16, &fixed, &[string_file_info])
}

/// Builds a minimal PE32+ image whose only section holds a resource tree with
/// a single `RT_VERSION` entry.
pub fn pe_image(version: &FixtureVersion) -> Vec<u8> {
    pe_image_with_resource(&version_resource(version))
}

pub fn pe_image_with_resource(version_data: &[u8]) -> Vec<u8> {
    let mut rsrc = Vec::new();
    // type directory -> name directory -> language directory -> data entry
    for (id, target) in [(16_u32, 0x8000_0000_u32 | 24), (1, 0x8000_0000 | 48), (0x409, 72)] {
        rsrc.extend_from_slice(&[0; 12]);
        rsrc.extend_from_slice(&0_u16.to_le_bytes());
        rsrc.extend_from_slice(&1_u16.to_le_bytes());
        rsrc.extend_from_slice(&id.to_le_bytes());
        rsrc.extend_from_slice(&target.to_le_bytes());
    }
    let data_offset = 88_u32;
    rsrc.extend_from_slice(&(SECTION_RVA + data_offset).to_le_bytes());
    rsrc.extend_from_slice(&(version_data.len() as u32).to_le_bytes());
    rsrc.extend_from_slice(&[0; 8]);
    rsrc.extend_from_slice(version_data);

    let raw_size = rsrc.len().div_ceil(FILE_ALIGNMENT) * FILE_ALIGNMENT;

    let mut image = vec![0_u8; FILE_ALIGNMENT + raw_size];
    image[..2].copy_from_slice(b"MZ");
    image[0x3c..0x40].copy_from_slice(&64_u32.to_le_bytes());
    image[64..68].copy_from_slice(b"PE\0\0");

    let coff = 68;
    image[coff..coff + 2].copy_from_slice(&0x8664_u16.to_le_bytes());
    image[coff + 2..coff + 4].copy_from_slice(&1_u16.to_le_bytes());
    image[coff + 16..coff + 18].copy_from_slice(&(OPTIONAL_HEADER_LEN as u16).to_le_bytes());
    image[coff + 18..coff + 20].copy_from_slice(&0x22_u16.to_le_bytes());

    let optional = coff + 20;
    image[optional..optional + 2].copy_from_slice(&0x20b_u16.to_le_bytes());
    image[optional + 108..optional + 112].copy_from_slice(&16_u32.to_le_bytes());
    let resource_dir = optional + 112 + 2 * 8;
    image[resource_dir..resource_dir + 4].copy_from_slice(&SECTION_RVA.to_le_bytes());
    image[resource_dir + 4..resource_dir + 8].copy_from_slice(&(rsrc.len() as u32).to_le_bytes());

    let section = optional + OPTIONAL_HEADER_LEN;
    image[section..section + 8].copy_from_slice(b".rsrc\0\0\0");
    image[section + 8..section + 12].copy_from_slice(&(rsrc.len() as u32).to_le_bytes());
    image[section + 12..section + 16].copy_from_slice(&SECTION_RVA.to_le_bytes());
    image[section + 16..section + 20].copy_from_slice(&(raw_size as u32).to_le_bytes());
    image[section + 20..section + 24].copy_from_slice(&(FILE_ALIGNMENT as u32).to_le_bytes());

    image[FILE_ALIGNMENT..FILE_ALIGNMENT + rsrc.len()].copy_from_slice(&rsrc);
    image
}

pub fn write_pe_image(path: &Path, version: &FixtureVersion) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, pe_image(version))
}
