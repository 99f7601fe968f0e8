//! A root façade tying the binary NBT codec, the `.dat` envelope, and the SNBT text
//! format together behind one entry point, so callers don't need to know which of the
//! three wire shapes a given source uses before they can read it.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::io::{self as nbt_io, NbtIoError};
use crate::settings::{Endianness, IoOptions, NbtCompression, SnbtParseOptions, SnbtWriteOptions};
use crate::snbt::{self, SnbtError};
use crate::tag::{NbtTag, string_to_snbt};

/// A decoded root tag together with the name attached to it on the wire. Binary NBT
/// always carries a root name (often empty). SNBT has no wire-level concept of a root
/// name either, but [`read_snbt`](RootNbt::read_snbt)/[`write_snbt`](RootNbt::write_snbt)
/// support an optional `key:` prefix ahead of the value so a name can still round-trip
/// through text; a name-less document still parses to the empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct RootNbt {
    pub name: String,
    pub tag:  NbtTag,
}

impl RootNbt {
    pub fn new(name: impl Into<String>, tag: NbtTag) -> Self {
        RootNbt { name: name.into(), tag }
    }
}

/// Errors that can occur while reading or writing through the root façade. Wraps the
/// binary and textual error types so callers dealing with mixed sources can match on
/// one error enum, while the underlying `read_nbt`/`parse_any` calls still return their
/// own specific typed errors to anyone calling them directly.
#[derive(Error, Debug)]
pub enum RootError {
    /// Failed while decoding or encoding binary NBT.
    #[error(transparent)]
    Nbt(#[from] NbtIoError),
    /// Failed while parsing SNBT text.
    #[error(transparent)]
    Snbt(#[from] SnbtError),
    /// A native I/O error not already wrapped by [`RootError::Nbt`], e.g. reading the
    /// SNBT source into a `String`, or a file-level failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The input was not valid UTF-8, so it cannot be SNBT text.
    #[error("SNBT source was not valid UTF-8: {0}")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}

/// Sniffs the compression envelope from the first two bytes of `reader`, per the
/// Gzip (`1F 8B`) / Zlib (`78 9C`) magic numbers; anything else is treated as
/// uncompressed. The sniffed bytes are not lost: the returned reader yields them
/// again before the rest of the stream.
fn sniff_compression<R: Read>(mut reader: R) -> io::Result<(NbtCompression, impl Read)> {
    let mut magic = [0u8; 2];
    let mut filled = 0;

    while filled < magic.len() {
        let n = reader.read(&mut magic[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    let compression = match &magic[..filled] {
        [0x1F, 0x8B] => NbtCompression::GzipCompressed,
        [0x78, 0x9C] => NbtCompression::ZlibCompressed,
        _ => NbtCompression::Uncompressed,
    };

    Ok((compression, Cursor::new(magic[..filled].to_vec()).chain(reader)))
}

impl RootNbt {
    // ================================
    //      nbt (raw binary)
    // ================================

    /// Reads raw binary NBT from `reader`, auto-detecting the compression envelope by
    /// sniffing its first two bytes. `byte_order` must still be supplied: there is
    /// nothing in the byte stream itself to distinguish Java's big-endian encoding
    /// from Bedrock's little-endian one.
    pub fn read_nbt<R: Read>(mut reader: R, byte_order: Endianness) -> Result<Self, RootError> {
        log::debug!("decoding binary NBT, byte order {byte_order:?}, auto-detecting compression");

        let (compression, mut sniffed) = sniff_compression(&mut reader)?;
        let opts = IoOptions { endianness: byte_order, compression, ..IoOptions::java() };

        let (tag, name) = nbt_io::read_nbt(&mut sniffed, opts)?;
        Ok(RootNbt { name, tag })
    }

    /// Reads raw binary NBT from `reader` using an explicit, caller-chosen [`IoOptions`],
    /// skipping compression auto-detection entirely.
    pub fn read_nbt_with_options<R: Read>(
        mut reader: R,
        opts: IoOptions,
    ) -> Result<Self, RootError> {
        log::debug!("decoding binary NBT with explicit options {opts:?}");
        let (tag, name) = nbt_io::read_nbt(&mut reader, opts)?;
        Ok(RootNbt { name, tag })
    }

    /// Writes this root as raw binary NBT, using the compression and byte order given
    /// by `opts`.
    pub fn write_nbt<W: Write>(&self, mut writer: W, opts: IoOptions) -> Result<(), RootError> {
        log::debug!("encoding binary NBT with options {opts:?}");
        nbt_io::write_nbt(&mut writer, opts, Some(&self.name), &self.tag)?;
        Ok(())
    }

    /// Reads raw binary NBT from a file at `path`, auto-detecting compression.
    pub fn read_nbt_file(path: impl AsRef<Path>, byte_order: Endianness) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::debug!("reading binary NBT file {}", path.display());
        let file = File::open(path)?;
        Ok(Self::read_nbt(BufReader::new(file), byte_order)?)
    }

    /// Writes this root as raw binary NBT to a file at `path`, truncating or creating
    /// it as needed.
    pub fn write_nbt_file(&self, path: impl AsRef<Path>, opts: IoOptions) -> anyhow::Result<()> {
        let path = path.as_ref();
        log::debug!("writing binary NBT file {}", path.display());
        let file = File::create(path)?;
        self.write_nbt(BufWriter::new(file), opts)?;
        Ok(())
    }

    // ================================
    //      dat (binary + 8-byte prelude)
    // ================================

    /// Reads a `.dat`-style file: an 8-byte prelude (`tool_version`, `payload_length`,
    /// both informational) followed by standard binary NBT, auto-detecting compression
    /// on the payload.
    pub fn read_dat<R: Read>(mut reader: R, byte_order: Endianness) -> Result<Self, RootError> {
        log::debug!("decoding .dat NBT, byte order {byte_order:?}");

        let header_opts = IoOptions { endianness: byte_order, ..IoOptions::java() };
        let (tool_version, payload_length) = nbt_io::read_bedrock_header(&mut reader, header_opts)?;

        if tool_version != 8 {
            log::warn!(
                "unexpected .dat tool_version {tool_version} (expected 8); ignoring, \
                 payload_length reported as {payload_length}"
            );
        }

        Self::read_nbt(reader, byte_order)
    }

    /// Writes this root as a `.dat` file: the legacy `0x0A 0x00 0x00 0x00` marker and a
    /// payload length prelude, followed by the uncompressed NBT payload.
    ///
    /// The prelude's `payload_length` only makes sense for an uncompressed payload, so
    /// `opts.compression` must be [`NbtCompression::Uncompressed`].
    pub fn write_dat<W: Write>(&self, mut writer: W, opts: IoOptions) -> Result<(), RootError> {
        if !matches!(opts.compression, NbtCompression::Uncompressed) {
            return Err(NbtIoError::Custom(
                "write_dat requires an uncompressed payload so payload_length is meaningful".into(),
            )
            .into());
        }

        let mut payload = Vec::new();
        nbt_io::write_nbt(&mut payload, opts, Some(&self.name), &self.tag)?;

        log::debug!("writing .dat NBT, payload length {}", payload.len());
        nbt_io::write_bedrock_header(&mut writer, opts, 10, payload.len())?;
        writer.write_all(&payload)?;
        Ok(())
    }

    /// Reads a `.dat` file from `path`.
    pub fn read_dat_file(path: impl AsRef<Path>, byte_order: Endianness) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::debug!("reading .dat file {}", path.display());
        let file = File::open(path)?;
        Ok(Self::read_dat(BufReader::new(file), byte_order)?)
    }

    /// Writes this root as a `.dat` file at `path`.
    pub fn write_dat_file(&self, path: impl AsRef<Path>, opts: IoOptions) -> anyhow::Result<()> {
        let path = path.as_ref();
        log::debug!("writing .dat file {}", path.display());
        let file = File::create(path)?;
        self.write_dat(BufWriter::new(file), opts)?;
        Ok(())
    }

    // ================================
    //      snbt (text)
    // ================================

    /// Reads SNBT text from `reader`. An optional leading `key:` names the root the
    /// same way [`write_snbt`](Self::write_snbt) emits one; `self.name` is the empty
    /// string if the text is just a bare value.
    pub fn read_snbt<R: Read>(mut reader: R, opts: SnbtParseOptions) -> Result<Self, RootError> {
        log::debug!("parsing SNBT text with options {opts:?}");

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let text = String::from_utf8(bytes)?;

        let (name, tag) = snbt::parse_root(&text, opts)?;
        Ok(RootNbt { name, tag })
    }

    /// Writes this root's tag as SNBT text, prefixed with `<name>:` (quoted/escaped like
    /// any other SNBT string) when `self.name` isn't empty.
    pub fn write_snbt<W: Write>(
        &self,
        mut writer: W,
        opts: SnbtWriteOptions,
        pretty: bool,
    ) -> Result<(), RootError> {
        log::debug!("writing SNBT text, pretty={pretty}");

        let value = if pretty {
            self.tag.to_pretty_snbt_with_options(opts)
        } else {
            self.tag.to_snbt_with_options(opts)
        };

        let text = if self.name.is_empty() {
            value
        } else {
            let key = string_to_snbt(&self.name, opts);
            if pretty { format!("{key}: {value}") } else { format!("{key}:{value}") }
        };

        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Reads an SNBT text file at `path`.
    pub fn read_snbt_file(
        path: impl AsRef<Path>,
        opts: SnbtParseOptions,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::debug!("reading SNBT file {}", path.display());
        let file = File::open(path)?;
        Ok(Self::read_snbt(BufReader::new(file), opts)?)
    }

    /// Writes this root's tag as SNBT text to a file at `path`.
    pub fn write_snbt_file(
        &self,
        path: impl AsRef<Path>,
        opts: SnbtWriteOptions,
        pretty: bool,
    ) -> anyhow::Result<()> {
        let path = path.as_ref();
        log::debug!("writing SNBT file {}", path.display());
        let file = File::create(path)?;
        self.write_snbt(BufWriter::new(file), opts, pretty)?;
        Ok(())
    }

    // Note: a `path(...)` query method for navigating into the tree by a path-like
    // string is deliberately not provided. No published semantics for such a query
    // exist to implement against; adding one now would mean inventing behavior rather
    // than specifying it.
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::NbtCompound;

    fn sample_root() -> RootNbt {
        let mut compound = NbtCompound::new();
        compound.insert("v", 1i32);
        RootNbt::new("", NbtTag::Compound(compound))
    }

    #[test]
    fn nbt_round_trips_through_auto_detected_compression() {
        let root = sample_root();
        let opts = IoOptions::java();

        let mut bytes = Vec::new();
        root.write_nbt(&mut bytes, opts).unwrap();

        let read_back = RootNbt::read_nbt(Cursor::new(bytes), Endianness::BigEndian).unwrap();
        assert_eq!(read_back, root);
    }

    #[test]
    fn nbt_round_trips_uncompressed() {
        let root = sample_root();
        let opts = IoOptions::java_uncompressed();

        let mut bytes = Vec::new();
        root.write_nbt(&mut bytes, opts).unwrap();
        assert_ne!(&bytes[..2], &[0x1F, 0x8B]);
        assert_ne!(&bytes[..2], &[0x78, 0x9C]);

        let read_back = RootNbt::read_nbt(Cursor::new(bytes), Endianness::BigEndian).unwrap();
        assert_eq!(read_back, root);
    }

    #[test]
    fn dat_round_trips_and_ignores_tool_version() {
        let root = sample_root();
        let opts = IoOptions::java_uncompressed();

        let mut bytes = Vec::new();
        root.write_dat(&mut bytes, opts).unwrap();

        let read_back = RootNbt::read_dat(Cursor::new(bytes), Endianness::BigEndian).unwrap();
        assert_eq!(read_back, root);
    }

    #[test]
    fn dat_rejects_compressed_write() {
        let root = sample_root();
        let opts = IoOptions::java();
        let mut bytes = Vec::new();
        assert!(root.write_dat(&mut bytes, opts).is_err());
    }

    #[test]
    fn snbt_round_trips_with_no_root_name() {
        let root = sample_root();

        let mut text = Vec::new();
        root.write_snbt(&mut text, SnbtWriteOptions::default_updated(), false).unwrap();
        assert_eq!(text, b"{v:1}");

        let read_back =
            RootNbt::read_snbt(Cursor::new(text), SnbtParseOptions::default_updated()).unwrap();
        assert_eq!(read_back, root);
    }

    #[test]
    fn snbt_round_trips_with_root_name() {
        let mut compound = NbtCompound::new();
        compound.insert("v", 1i32);
        let root = RootNbt::new("x", NbtTag::Compound(compound));

        let mut text = Vec::new();
        root.write_snbt(&mut text, SnbtWriteOptions::default_updated(), false).unwrap();
        assert_eq!(text, b"x:{v:1}");

        let read_back =
            RootNbt::read_snbt(Cursor::new(text), SnbtParseOptions::default_updated()).unwrap();
        assert_eq!(read_back, root);
    }

    #[test]
    fn pretty_snbt_root_name_has_space_after_colon() {
        let mut compound = NbtCompound::new();
        compound.insert("v", 1i32);
        let root = RootNbt::new("x", NbtTag::Compound(compound));

        let mut text = Vec::new();
        root.write_snbt(&mut text, SnbtWriteOptions::default_updated(), true).unwrap();
        assert!(String::from_utf8(text).unwrap().starts_with("x: {"));
    }
}
