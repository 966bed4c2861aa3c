use anyhow::{anyhow, bail, Context, Result};

const DOS_MAGIC: &[u8; 2] = b"MZ";
const PE_SIGNATURE: &[u8; 4] = b"PE\0\0";
const PE32_MAGIC: u16 = 0x10b;
const PE32_PLUS_MAGIC: u16 = 0x20b;
const COFF_HEADER_LEN: usize = 20;
const SECTION_HEADER_LEN: usize = 40;
const RESOURCE_DIRECTORY_INDEX: usize = 2;
const RESOURCE_DIRECTORY_LEN: usize = 16;
const RESOURCE_ENTRY_LEN: usize = 8;
const RT_VERSION: u32 = 16;
const SUBDIRECTORY_FLAG: u32 = 0x8000_0000;
const NAME_IS_STRING_FLAG: u32 = 0x8000_0000;

pub(crate) fn read_u16(bytes: &[u8], offset: usize) -> Result<u16> {
    let end = offset.checked_add(2).ok_or_else(|| anyhow!("offset overflow"))?;
    let slice = bytes
        .get(offset..end)
        .ok_or_else(|| anyhow!("truncated data reading u16 at {offset:#x}"))?;
    Ok(u16::from_le_bytes([slice[0], slice[1]]))
}

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    let end = offset.checked_add(4).ok_or_else(|| anyhow!("offset overflow"))?;
    let slice = bytes
        .get(offset..end)
        .ok_or_else(|| anyhow!("truncated data reading u32 at {offset:#x}"))?;
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

#[derive(Debug, Clone, Copy)]
struct Section {
    virtual_address: u32,
    virtual_size: u32,
    raw_size: u32,
    raw_offset: u32,
}

impl Section {
    fn contains(&self, rva: u32) -> bool {
        let span = self.virtual_size.max(self.raw_size);
        rva >= self.virtual_address && rva - self.virtual_address < span
    }
}

struct PeImage<'a> {
    bytes: &'a [u8],
    sections: Vec<Section>,
}

impl<'a> PeImage<'a> {
    fn rva_to_offset(&self, rva: u32) -> Result<usize> {
        let section = self
            .sections
            .iter()
            .find(|section| section.contains(rva))
            .ok_or_else(|| anyhow!("rva {rva:#x} is not mapped by any section"))?;
        let offset = u64::from(section.raw_offset) + u64::from(rva - section.virtual_address);
        usize::try_from(offset).context("section offset does not fit in memory")
    }

    fn slice_at_rva(&self, rva: u32, len: u32) -> Result<&'a [u8]> {
        let start = self.rva_to_offset(rva)?;
        let end = start
            .checked_add(len as usize)
            .ok_or_else(|| anyhow!("resource length overflow"))?;
        self.bytes
            .get(start..end)
            .ok_or_else(|| anyhow!("resource data at rva {rva:#x} runs past end of file"))
    }
}

/// Locates the raw `VS_VERSIONINFO` resource bytes inside a PE image.
///
/// Takes the first name and first language under `RT_VERSION`, which is
/// what the Windows version APIs do for single-language executables.
pub fn find_version_resource(image: &[u8]) -> Result<&[u8]> {
    if image.get(..2) != Some(DOS_MAGIC.as_slice()) {
        bail!("not a PE image: missing MZ header");
    }
    let pe_offset = read_u32(image, 0x3c).context("truncated DOS header")? as usize;
    if image.get(pe_offset..pe_offset.saturating_add(4)) != Some(PE_SIGNATURE.as_slice()) {
        bail!("not a PE image: missing PE signature at {pe_offset:#x}");
    }

    let coff = pe_offset + 4;
    let section_count = read_u16(image, coff + 2)? as usize;
    let optional_len = read_u16(image, coff + 16)? as usize;
    let optional = coff + COFF_HEADER_LEN;

    let (rva_count_offset, directories_offset) = match read_u16(image, optional)? {
        PE32_MAGIC => (optional + 92, optional + 96),
        PE32_PLUS_MAGIC => (optional + 108, optional + 112),
        other => bail!("unsupported optional header magic {other:#x}"),
    };
    let rva_count = read_u32(image, rva_count_offset)? as usize;
    if rva_count <= RESOURCE_DIRECTORY_INDEX {
        bail!("image has no resource data directory");
    }
    let resource_entry = directories_offset + RESOURCE_DIRECTORY_INDEX * 8;
    let resource_rva = read_u32(image, resource_entry)?;
    let resource_size = read_u32(image, resource_entry + 4)?;
    if resource_rva == 0 || resource_size == 0 {
        bail!("image has no resources");
    }

    let sections_offset = optional + optional_len;
    let mut sections = Vec::with_capacity(section_count);
    for index in 0..section_count {
        let header = sections_offset + index * SECTION_HEADER_LEN;
        sections.push(Section {
            virtual_size: read_u32(image, header + 8)?,
            virtual_address: read_u32(image, header + 12)?,
            raw_size: read_u32(image, header + 16)?,
            raw_offset: read_u32(image, header + 20)?,
        });
    }

    let pe = PeImage {
        bytes: image,
        sections,
    };
    let resources = pe
        .slice_at_rva(resource_rva, resource_size)
        .context("failed to map resource section")?;

    let type_dir = find_directory_entry(resources, 0, Some(RT_VERSION))?
        .ok_or_else(|| anyhow!("image has no version resource"))?;
    let name_dir = expect_subdirectory(type_dir, "version type")?;
    let name_entry = find_directory_entry(resources, name_dir, None)?
        .ok_or_else(|| anyhow!("version resource has no entries"))?;
    let language_dir = expect_subdirectory(name_entry, "version name")?;
    let language_entry = find_directory_entry(resources, language_dir, None)?
        .ok_or_else(|| anyhow!("version resource has no language entries"))?;
    if language_entry & SUBDIRECTORY_FLAG != 0 {
        bail!("version resource language entry is not a data entry");
    }

    let data_entry = language_entry as usize;
    let data_rva = read_u32(resources, data_entry)?;
    let data_size = read_u32(resources, data_entry + 4)?;
    pe.slice_at_rva(data_rva, data_size)
        .context("failed to map version resource data")
}

fn expect_subdirectory(entry: u32, what: &str) -> Result<usize> {
    if entry & SUBDIRECTORY_FLAG == 0 {
        bail!("{what} entry is not a directory");
    }
    Ok((entry & !SUBDIRECTORY_FLAG) as usize)
}

/// Returns the raw `OffsetToData` of the first entry in the directory at
/// `offset`, or of the first id entry equal to `id` when one is given.
fn find_directory_entry(resources: &[u8], offset: usize, id: Option<u32>) -> Result<Option<u32>> {
    if offset.saturating_add(RESOURCE_DIRECTORY_LEN) > resources.len() {
        bail!("resource directory at {offset:#x} is out of bounds");
    }
    let named = read_u16(resources, offset + 12)? as usize;
    let ids = read_u16(resources, offset + 14)? as usize;

    for index in 0..named + ids {
        let entry = offset + RESOURCE_DIRECTORY_LEN + index * RESOURCE_ENTRY_LEN;
        let name = read_u32(resources, entry)?;
        let data = read_u32(resources, entry + 4)?;
        match id {
            None => return Ok(Some(data)),
            Some(wanted) if name & NAME_IS_STRING_FLAG == 0 && name == wanted => {
                return Ok(Some(data))
            }
            Some(_) => {}
        }
    }
    Ok(None)
}
