//! Archive fixtures

use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

/// One tar entry: name, mode, content
pub struct TarEntry<'a> {
    pub name: &'a str,
    pub mode: u32,
    pub data: &'a [u8],
}

/// Build a tar.gz in memory; entry names are written verbatim into the header
/// so hostile names (`../../evil`, `/etc/passwd`) survive
pub fn tar_gz(entries: &[TarEntry<'_>]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for entry in entries {
        let mut header = tar::Header::new_old();
        {
            let old = header.as_old_mut();
            let name = entry.name.as_bytes();
            old.name[..name.len()].copy_from_slice(name);
        }
        header.set_size(entry.data.len() as u64);
        header.set_mode(entry.mode);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, entry.data).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// A release archive with docs plus one executable at `bin/tool`
pub fn tool_archive(binary: &[u8]) -> Vec<u8> {
    tar_gz(&[
        TarEntry {
            name: "README.md",
            mode: 0o644,
            data: b"# tool\n",
        },
        TarEntry {
            name: "bin/tool",
            mode: 0o755,
            data: binary,
        },
    ])
}

/// Hex SHA-256 of some bytes
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// `checksums.txt` content in goreleaser layout
pub fn checksums_txt(entries: &[(&str, &str)]) -> String {
    entries
        .iter()
        .map(|(hex, name)| format!("{}  {}\n", hex, name))
        .collect()
}
