use std::io;
use std::io::{Read, Write};

use flate2::Compression;
use flate2::{
    read::{GzDecoder, ZlibDecoder},
    write::{GzEncoder, ZlibEncoder},
};
use thiserror::Error;

use crate::raw;
use crate::{
    settings::{DepthLimit, Endianness, IoOptions, NbtCompression},
    tag::{NbtCompound, NbtList, NbtTag},
};


/// Read the Bedrock Edition NBT header. The first number is the version of `level.dat` format
/// if reading that file, and is otherwise always `8`. The second number is the length
/// of the NBT file, excluding the header.
pub fn read_bedrock_header<R: Read>(
    reader: &mut R,
    opts: IoOptions,
) -> Result<(i32, i32), NbtIoError> {
    Ok((raw::read_i32(reader, opts)?, raw::read_i32(reader, opts)?))
}

/// Write the Bedrock Edition NBT header. The first number is the version of `level.dat` format
/// if writing that file, and should otherwise always be `8`. The second number is the length
/// of the NBT file, excluding the header.
pub fn write_bedrock_header<W: Write>(
    writer: &mut W,
    opts: IoOptions,
    first_num: i32,
    nbt_len: usize,
) -> Result<(), NbtIoError> {
    raw::write_i32(writer, opts, first_num)?;
    raw::write_usize_as_i32(writer, opts, nbt_len)?;
    Ok(())
}

/// A reader adapter that tracks how many bytes have been consumed so far, so that
/// errors encountered partway through a decode can report a byte offset. Wraps any
/// `Read` impl, including a decompressing reader, in which case the offset is
/// relative to the decompressed stream rather than the file on disk.
struct CountingReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> CountingReader<R> {
    fn new(inner: R) -> Self {
        CountingReader { inner, offset: 0 }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.offset += n as u64;
        Ok(n)
    }
}

/// A [`Read`] implementor that can additionally report its current byte offset into
/// the stream, so that a parse error can be reported alongside the position it
/// occurred at.
trait CountingRead: Read {
    fn byte_offset(&self) -> u64;
}

impl<R: Read> CountingRead for CountingReader<R> {
    fn byte_offset(&self) -> u64 {
        self.offset
    }
}

/// Renders a short hex/ascii excerpt of `bytes`, eliding anything past the first ten
/// bytes with `...`, for use in error messages that point at a specific offending
/// byte region.
fn format_excerpt(bytes: &[u8]) -> String {
    const MAX_SHOWN: usize = 10;

    let elided = bytes.len() > MAX_SHOWN;
    let shown = if elided { &bytes[..MAX_SHOWN] } else { bytes };

    let hex = shown.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ");

    let ascii: String = shown.iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect();

    if elided {
        format!("{hex} ... |{ascii}...|")
    } else {
        format!("{hex} |{ascii}|")
    }
}

/// Reads an `i32` length prefix as a `usize`, reporting the byte offset and raw
/// bytes of the prefix if it turns out to be negative.
fn read_len<R: CountingRead>(reader: &mut R, opts: IoOptions) -> Result<usize, NbtIoError> {
    let offset = reader.byte_offset();
    let value = raw::read_i32(reader, opts)?;

    usize::try_from(value).map_err(|_| {
        let bytes = match opts.endianness {
            Endianness::BigEndian => value.to_be_bytes(),
            Endianness::LittleEndian => value.to_le_bytes(),
        };
        NbtIoError::NegativeLength { value, offset, excerpt: format_excerpt(&bytes) }
    })
}

/// Reads the given encoding of NBT data from the given reader, returning the root tag
/// (a Compound or a List, unless the `allow_any_root` feature is enabled) and its name.
pub fn read_nbt<R: Read>(
    reader: &mut R,
    opts: IoOptions
) -> Result<(NbtTag, String), NbtIoError> {

    match opts.compression {
        NbtCompression::Uncompressed =>
            read_nbt_uncompressed(&mut CountingReader::new(reader), opts),
        NbtCompression::ZlibCompressed | NbtCompression::ZlibCompressedWith(_) =>
            read_nbt_uncompressed(&mut CountingReader::new(ZlibDecoder::new(reader)), opts),
        NbtCompression::GzipCompressed | NbtCompression::GzipCompressedWith(_) =>
            read_nbt_uncompressed(&mut CountingReader::new(GzDecoder::new(reader)), opts),
    }
}

/// Convenience wrapper over [`read_nbt`] for the common case (Java Edition files, and
/// most Bedrock Edition files) of a root Compound tag. Fails with [`NbtIoError::UnsupportedRootTag`]
/// if the root turned out to be some other kind, such as a List.
pub fn read_nbt_compound<R: Read>(
    reader: &mut R,
    opts: IoOptions,
) -> Result<(NbtCompound, String), NbtIoError> {
    match read_nbt(reader, opts)? {
        (NbtTag::Compound(compound), name) => Ok((compound, name)),
        (other, _) => {
            let found = raw::id_for_tag(Some(&other));
            Err(NbtIoError::UnsupportedRootTag { found, offset: 0, excerpt: format_excerpt(&[found]) })
        }
    }
}

fn root_tag_id_allowed(tag_id: u8) -> bool {
    if cfg!(feature = "allow_any_root") {
        tag_id != 0x0 && tag_id <= 0xC
    } else {
        tag_id == 0x9 || tag_id == 0xA
    }
}

fn read_nbt_uncompressed<R: CountingRead>(
    reader: &mut R, opts: IoOptions
) -> Result<(NbtTag, String), NbtIoError> {

    let offset = reader.byte_offset();
    let root_id = raw::read_u8(reader, opts)?;

    if !root_tag_id_allowed(root_id) {
        return Err(NbtIoError::UnsupportedRootTag {
            found: root_id,
            offset,
            excerpt: format_excerpt(&[root_id]),
        });
    }

    let root_name = raw::read_string(reader, opts)?;
    let root = read_tag_body_dyn(reader, opts, root_id, 0)?;

    Ok((root, root_name))
}

fn read_tag_body_dyn<R: CountingRead>(
    reader: &mut R, opts: IoOptions, tag_id: u8, current_depth: u32
) -> Result<NbtTag, NbtIoError> {

    macro_rules! drive_reader {
        ($($id:literal)*) => {
            match tag_id {
                $( $id => read_tag_body_const::<_, $id>(reader, opts, current_depth), )*
                _ => Err(NbtIoError::InvalidTagId {
                    id: tag_id,
                    offset: reader.byte_offset(),
                    excerpt: format_excerpt(&[tag_id]),
                })
            }
        };
    }

    drive_reader!(0x1 0x2 0x3 0x4 0x5 0x6 0x7 0x8 0x9 0xA 0xB 0xC)
}

#[inline]
fn read_tag_body_const<R: CountingRead, const TAG_ID: u8>(
    reader: &mut R, opts: IoOptions, current_depth: u32
) -> Result<NbtTag, NbtIoError> {

    let tag = match TAG_ID {
        0x1 => NbtTag::Byte   (raw::read_i8 (reader, opts)?),
        0x2 => NbtTag::Short  (raw::read_i16(reader, opts)?),
        0x3 => NbtTag::Int    (raw::read_i32(reader, opts)?),
        0x4 => NbtTag::Long   (raw::read_i64(reader, opts)?),
        0x5 => NbtTag::Float  (raw::read_f32(reader, opts)?),
        0x6 => NbtTag::Double (raw::read_f64(reader, opts)?),
        0x7 => {
            let len = read_len(reader, opts)?;
            let mut array = vec![0u8; len];

            reader.read_exact(&mut array)?;

            NbtTag::ByteArray(raw::cast_byte_buf_to_signed(array))
        }
        0x8 => NbtTag::String(raw::read_string(reader, opts)?),
        0x9 => {
            let tag_id_offset = reader.byte_offset();
            let tag_id = raw::read_u8(reader, opts)?;
            let len = read_len(reader, opts)?;

            // Make sure we don't have an invalid type or a nonempty list of TAG_End
            if tag_id > 0xC || (tag_id == 0 && len > 0) {
                return Err(NbtIoError::InvalidTagId {
                    id: tag_id,
                    offset: tag_id_offset,
                    excerpt: format_excerpt(&[tag_id]),
                });
            }

            if len == 0 {
                return Ok(NbtTag::List(NbtList::new()));
            }

            if current_depth >= opts.depth_limit.0 {
                return Err(NbtIoError::ExceededDepthLimit {
                    limit: opts.depth_limit
                });
            }

            let mut list = NbtList::with_capacity(len);

            macro_rules! drive_reader {
                ($($id:literal)*) => {
                    match tag_id {
                        $(
                            $id => {
                                for _ in 0 .. len {
                                    list.push_unchecked(read_tag_body_const::<_, $id>(
                                        reader, opts, current_depth + 1
                                    )?);
                                }
                            },
                        )*
                        _ => return Err(NbtIoError::InvalidTagId {
                            id: tag_id,
                            offset: tag_id_offset,
                            excerpt: format_excerpt(&[tag_id]),
                        })
                    }
                };
            }

            drive_reader!(0x1 0x2 0x3 0x4 0x5 0x6 0x7 0x8 0x9 0xA 0xB 0xC);

            NbtTag::List(list)
        }
        0xA => {
            let mut compound = NbtCompound::new();
            let mut tag_id = raw::read_u8(reader, opts)?;

            if tag_id != 0x0 && current_depth >= opts.depth_limit.0 {
                return Err(NbtIoError::ExceededDepthLimit {
                    limit: opts.depth_limit
                });
            }

            // Read until TAG_End
            while tag_id != 0x0 {
                let key_offset = reader.byte_offset();
                let name = raw::read_string(reader, opts)?;
                let tag = read_tag_body_dyn(reader, opts, tag_id, current_depth + 1)?;

                if compound.contains_key(&name) {
                    return Err(NbtIoError::DuplicateKey {
                        excerpt: format_excerpt(raw::bytes_from_string(&name, opts).as_ref()),
                        name,
                        offset: key_offset,
                    });
                }
                compound.insert(name, tag);
                tag_id = raw::read_u8(reader, opts)?;
            }

            NbtTag::Compound(compound)
        }
        0xB => {
            let len = read_len(reader, opts)?;
            NbtTag::IntArray(raw::read_i32_array(reader, opts, len)?)
        }
        0xC => {
            let len = read_len(reader, opts)?;
            NbtTag::LongArray(raw::read_i64_array(reader, opts, len)?)
        }
        _ => unreachable!("read_tag_body_const called with unchecked TAG_ID"),
    };

    Ok(tag)
}

/// Writes the given encoding of NBT data to the given writer. The root tag must be a
/// Compound or a List (unless the `allow_any_root` feature is enabled), matching what
/// [`read_nbt`] accepts. If no root name is provided, the empty string is used.
pub fn write_nbt<W: Write>(
    writer: &mut W,
    opts: IoOptions,
    root_name: Option<&str>,
    root: &NbtTag,
) -> Result<(), NbtIoError> {

    let (mode, compression) = match opts.compression {
        NbtCompression::Uncompressed => {
            return write_nbt_uncompressed(writer, opts, root_name, root);
        }
        NbtCompression::ZlibCompressed => (2, Compression::default()),
        NbtCompression::ZlibCompressedWith(compression) => (2, compression.into()),
        NbtCompression::GzipCompressed => (1, Compression::default()),
        NbtCompression::GzipCompressedWith(compression) => (1, compression.into()),
    };

    if mode == 1 {
        write_nbt_uncompressed(&mut GzEncoder::new(writer, compression), opts, root_name, root)
    } else {
        write_nbt_uncompressed(&mut ZlibEncoder::new(writer, compression), opts, root_name, root)
    }
}

/// Convenience wrapper over [`write_nbt`] for a root Compound tag.
pub fn write_nbt_compound<W: Write>(
    writer: &mut W,
    opts: IoOptions,
    root_name: Option<&str>,
    root: &NbtCompound,
) -> Result<(), NbtIoError> {
    write_nbt(writer, opts, root_name, &NbtTag::Compound(root.clone()))
}

/// Writes the given tag with the given name to the provided writer, writing only the raw
/// NBT data without any compression.
fn write_nbt_uncompressed<W>(
    writer: &mut W,
    opts: IoOptions,
    root_name: Option<&str>,
    root: &NbtTag,
) -> Result<(), NbtIoError>
where
    W: Write,
{
    let root_id = raw::id_for_tag(Some(root));
    if !root_tag_id_allowed(root_id) {
        return Err(NbtIoError::UnsupportedRootTag {
            found: root_id,
            offset: 0,
            excerpt: format_excerpt(&[root_id]),
        });
    }

    raw::write_u8(writer, opts, root_id)?;
    raw::write_string(writer, opts, root_name.unwrap_or(""))?;
    write_tag_body(writer, opts, root, 0)
}

fn write_tag_body<W: Write>(
    writer: &mut W,
    opts: IoOptions,
    tag: &NbtTag,
    current_depth: u32,
) -> Result<(), NbtIoError> {
    match tag {
        &NbtTag::Byte  (value) => raw::write_i8 (writer, opts, value)?,
        &NbtTag::Short (value) => raw::write_i16(writer, opts, value)?,
        &NbtTag::Int   (value) => raw::write_i32(writer, opts, value)?,
        &NbtTag::Long  (value) => raw::write_i64(writer, opts, value)?,
        &NbtTag::Float (value) => raw::write_f32(writer, opts, value)?,
        &NbtTag::Double(value) => raw::write_f64(writer, opts, value)?,
        NbtTag::ByteArray(value) => {
            raw::write_usize_as_i32(writer, opts, value.len())?;
            writer.write_all(raw::cast_bytes_to_unsigned(value.as_slice()))?;
        }
        NbtTag::String(value) => raw::write_string(writer, opts, value)?,
        NbtTag::List(value) =>
            if value.is_empty() {
                writer.write_all(&[raw::id_for_tag(None), 0, 0, 0, 0])?;
            } else {
                let list_type = raw::id_for_tag(Some(&value[0]));
                raw::write_u8(writer, opts, list_type)?;
                raw::write_usize_as_i32(writer, opts, value.len())?;

                if current_depth >= opts.depth_limit.0 && !value.is_empty() {
                    return Err(NbtIoError::ExceededDepthLimit {
                        limit: opts.depth_limit
                    });
                }

                for sub_tag in value.as_ref() {
                    let tag_id = raw::id_for_tag(Some(sub_tag));
                    if tag_id != list_type {
                        return Err(NbtIoError::NonHomogenousList {
                            list_type,
                            encountered_type: tag_id,
                        });
                    }

                    write_tag_body(writer, opts, sub_tag, current_depth + 1)?;
                }
            },
        NbtTag::Compound(value) => {
            if current_depth >= opts.depth_limit.0 && !value.is_empty() {
                return Err(NbtIoError::ExceededDepthLimit {
                    limit: opts.depth_limit
                });
            }

            for (name, tag) in value.inner() {
                raw::write_u8(writer, opts, raw::id_for_tag(Some(tag)))?;
                raw::write_string(writer, opts, name)?;
                write_tag_body(writer, opts, tag, current_depth + 1)?;
            }

            // TAG_End
            raw::write_u8(writer, opts, raw::id_for_tag(None))?;
        }
        NbtTag::IntArray(value) => {
            raw::write_usize_as_i32(writer, opts, value.len())?;

            for &int in value.iter() {
                raw::write_i32(writer, opts, int)?;
            }
        }
        NbtTag::LongArray(value) => {
            raw::write_usize_as_i32(writer, opts, value.len())?;

            for &long in value.iter() {
                raw::write_i64(writer, opts, long)?;
            }
        }
    }

    Ok(())
}

/// Describes an error which occurred during the reading or writing of NBT byte data.
#[derive(Error, Debug)]
pub enum NbtIoError {
    /// A native I/O error.
    #[error(transparent)]
    StdIo(#[from] io::Error),
    /// No root tag was found. All NBT byte data must start with a valid root tag,
    /// which by default means a Compound or List tag.
    #[error("NBT tree does not start with a valid root tag")]
    MissingRootTag,
    /// The limit on recursive nesting depth of NBT lists and compounds was exceeded.
    #[error("Exceeded depth limit {} for nested tag lists and compound tags", limit.0)]
    ExceededDepthLimit {
        /// The limit which was exceeded.
        limit: DepthLimit
    },
    /// A sequential data structure was found to be non-homogenous. All sequential structures
    /// in NBT data are homogenous.
    #[error(
        "Encountered non-homogenous list or sequential type: \
        expected 0x{list_type:X} but found 0x{encountered_type:X}"
    )]
    NonHomogenousList {
        /// The list type.
        list_type: u8,
        /// The encountered type.
        encountered_type: u8,
    },
    /// The length of a string or sequential length was too large to fit in the numeric type
    /// it needed to.
    #[error(
        "Length of a string or sequential type must fit in an i16, i32, or usize, \
        depending on situation"
    )]
    ExcessiveLength,
    /// The length of a string or sequential type was negative.
    #[error(
        "Length of a string or sequential type must be nonnegative \
        (found {value} at byte offset {offset}: {excerpt})"
    )]
    NegativeLength {
        /// The (negative) length that was read.
        value: i32,
        /// The byte offset the length prefix started at.
        offset: u64,
        /// A hex/ascii excerpt of the offending bytes.
        excerpt: String,
    },
    /// An invalid tag ID was encountered.
    #[error("Encountered invalid tag ID 0x{id:X} at byte offset {offset}: {excerpt}")]
    InvalidTagId {
        /// The invalid id.
        id: u8,
        /// The byte offset the id was read from.
        offset: u64,
        /// A hex/ascii excerpt of the offending byte.
        excerpt: String,
    },
    /// The root tag's id was not one this configuration accepts. By default, only
    /// Compound (`0xA`) and List (`0x9`) may be used as a root tag; the `allow_any_root`
    /// feature relaxes this to any of the twelve tag kinds.
    #[error(
        "NBT tree must start with a Compound or List root tag, but found 0x{found:X} \
        at byte offset {offset}: {excerpt}"
    )]
    UnsupportedRootTag {
        /// The id that was found where a root tag id was expected.
        found: u8,
        /// The byte offset the id was read from.
        offset: u64,
        /// A hex/ascii excerpt of the offending byte.
        excerpt: String,
    },
    /// A compound tag contained the same key twice.
    #[error("Duplicate key {name:?} in compound tag at byte offset {offset}: {excerpt}")]
    DuplicateKey {
        /// The repeated key.
        name: String,
        /// The byte offset the second occurrence of the key started at.
        offset: u64,
        /// A hex/ascii excerpt of the key's encoded bytes.
        excerpt: String,
    },
    /// An invalid CESU-8 string was encountered.
    #[error("Encountered invalid CESU-8 string")]
    InvalidCesu8String,
    /// An invalid UTF-8 string was encountered.
    #[error("Encountered invalid UTF-8 string")]
    InvalidUtf8String,
    /// A custom error message.
    #[error("{0}")]
    Custom(Box<str>),
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::IoOptions;

    fn roundtrip(root: NbtTag, opts: IoOptions) -> NbtTag {
        let mut buf = Vec::new();
        write_nbt(&mut buf, opts, Some("root"), &root).expect("write should succeed");
        let (decoded, name) = read_nbt(&mut &buf[..], opts).expect("read should succeed");
        assert_eq!(name, "root");
        decoded
    }

    #[test]
    fn roundtrips_compound_root_java() {
        let mut compound = NbtCompound::new();
        compound.insert("byte", NbtTag::Byte(5));
        compound.insert("str", NbtTag::String("hello".to_owned()));
        let root = NbtTag::Compound(compound);

        assert_eq!(roundtrip(root.clone(), IoOptions::java_uncompressed()), root);
    }

    #[test]
    fn roundtrips_list_root() {
        let mut list = NbtList::new();
        list.push(NbtTag::Int(1)).unwrap();
        list.push(NbtTag::Int(2)).unwrap();
        let root = NbtTag::List(list);

        assert_eq!(roundtrip(root.clone(), IoOptions::java_uncompressed()), root);
    }

    #[test]
    fn rejects_scalar_root_by_default() {
        let mut buf = Vec::new();
        let opts = IoOptions::java_uncompressed();
        // A bare Int root is not representable through the public write_nbt API without
        // the allow_any_root feature, so construct the bytes directly: tag id 0x3 (Int),
        // empty name, then a 4-byte payload.
        buf.push(0x3);
        buf.extend_from_slice(&[0, 0]); // name length 0
        buf.extend_from_slice(&[0, 0, 0, 7]); // payload

        let err = read_nbt(&mut &buf[..], opts).unwrap_err();
        assert!(matches!(err, NbtIoError::UnsupportedRootTag { found: 0x3, .. }));
    }

    #[test]
    fn rejects_duplicate_compound_key() {
        let mut buf = Vec::new();
        let opts = IoOptions::java_uncompressed();

        buf.push(0xA); // Compound root
        buf.extend_from_slice(&[0, 0]); // root name length 0

        // First entry: Byte "a" = 1
        buf.push(0x1);
        buf.extend_from_slice(&[0, 1, b'a']);
        buf.push(1);

        // Second entry, same key: Byte "a" = 2
        buf.push(0x1);
        buf.extend_from_slice(&[0, 1, b'a']);
        buf.push(2);

        buf.push(0x0); // TAG_End

        let err = read_nbt(&mut &buf[..], opts).unwrap_err();
        assert!(matches!(err, NbtIoError::DuplicateKey { name, .. } if name == "a"));
    }

    #[test]
    fn rejects_invalid_tag_id() {
        let mut buf = Vec::new();
        let opts = IoOptions::java_uncompressed();

        buf.push(0xA); // Compound root
        buf.extend_from_slice(&[0, 0]);
        buf.push(0xFF); // invalid element tag id
        buf.extend_from_slice(&[0, 1, b'z']); // entry name, read before the tag id is validated

        let err = read_nbt(&mut &buf[..], opts).unwrap_err();
        assert!(matches!(err, NbtIoError::InvalidTagId { id: 0xFF, .. }));
    }

    #[test]
    fn write_nbt_accepts_list_root() {
        let mut list = NbtList::new();
        list.push_unchecked(NbtTag::Byte(1));
        let mut buf = Vec::new();
        let tag = NbtTag::List(list);
        write_nbt(&mut buf, IoOptions::java_uncompressed(), None, &tag).unwrap();
    }

    #[test]
    fn exceeding_depth_limit_on_read_errors() {
        use crate::settings::DepthLimit;

        let opts = IoOptions { depth_limit: DepthLimit(1), ..IoOptions::java_uncompressed() };

        let mut buf = Vec::new();
        buf.push(0xA); // root compound
        buf.extend_from_slice(&[0, 0]);
        buf.push(0xA); // nested compound entry "x", at depth 1
        buf.extend_from_slice(&[0, 1, b'x']);
        buf.push(0x1); // inner entry tag id: Byte (nonempty, so the depth check fires)
        buf.extend_from_slice(&[0, 1, b'y']);
        buf.push(5);
        buf.push(0x0); // outer TAG_End (unreached)

        let err = read_nbt(&mut &buf[..], opts).unwrap_err();
        assert!(matches!(err, NbtIoError::ExceededDepthLimit { .. }));
    }
}
