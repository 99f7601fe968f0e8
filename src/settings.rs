use flate2::Compression;


// ================================
//      Limits
// ================================

/// The recursive NBT tags (Compounds and Lists) can be nested up to (and including)
/// 512 levels deep in the standard specification.
///
/// Note that this crate uses recursive functions to read and write NBT data;
/// if the limit is too high and unreasonably nested data is received,
/// a crash could occur from the nested function calls exceeding the maximum stack size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DepthLimit(pub(crate) u32);

impl Default for DepthLimit {
    /// The maximum depth that NBT compounds and tags can be nested in the standard Minecraft specification.
    fn default() -> Self {
        Self(512)
    }
}

impl DepthLimit {
    pub fn limit(self) -> u32 {
        self.0
    }

    /// Builds a depth limit from a raw value. Values much above the default of 512 risk a
    /// stack overflow, since this crate's decoder and encoder recurse once per nesting level.
    pub fn new(limit: u32) -> Self {
        Self(limit)
    }
}


// ================================
//      IO Settings
// ================================

/// Encoding options for reading/writing NBT data from/to bytes (e.g. from/to a file).
#[derive(Debug, Clone, Copy)]
pub struct IoOptions {
    /// Byte order of the numeric and length fields in NBT data.
    ///
    /// Bedrock Edition is LittleEndian, Java is BigEndian.
    pub endianness: Endianness,
    /// Compression of NBT bytes.
    ///
    /// Default: Gzip compression with the default compression level.
    pub compression: NbtCompression,
    /// The byte encoding used by strings on the wire. Note that the NBT tags in this crate
    /// always store strings using Rust's encoding, UTF-8; this setting only controls how
    /// bytes are translated to and from that representation.
    ///
    /// Default: CESU-8 for Java, UTF-8 for Bedrock.
    pub string_encoding: StringEncoding,
    /// The maximum depth that NBT compounds and tags can be recursively nested.
    ///
    /// Default: 512, the limit used by Minecraft.
    pub depth_limit: DepthLimit,
}

impl IoOptions {
    /// Default Java encoding for NBT bytes.
    #[inline]
    pub fn java() -> Self {
        Self {
            endianness:      Endianness::BigEndian,
            compression:     NbtCompression::GzipCompressed,
            string_encoding: StringEncoding::Cesu8,
            depth_limit:     DepthLimit::default(),
        }
    }

    /// Default Java encoding for NBT bytes, but with no compression.
    #[inline]
    pub fn java_uncompressed() -> Self {
        Self {
            compression: NbtCompression::Uncompressed,
            ..Self::java()
        }
    }

    /// Default Bedrock encoding for NBT bytes.
    #[inline]
    pub fn bedrock() -> Self {
        Self {
            endianness:      Endianness::LittleEndian,
            compression:     NbtCompression::GzipCompressed,
            string_encoding: StringEncoding::Utf8,
            depth_limit:     DepthLimit::default(),
        }
    }

    /// Default Bedrock encoding for NBT bytes, but with no compression.
    #[inline]
    pub fn bedrock_uncompressed() -> Self {
        Self {
            compression: NbtCompression::Uncompressed,
            ..Self::bedrock()
        }
    }
}

/// Byte order of NBT data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// Used by Java Edition.
    BigEndian,
    /// Used by Bedrock Edition.
    LittleEndian,
}

/// Describes the compression options for NBT data:
/// uncompressed, Zlib-compressed, and Gzip-compressed.
#[derive(Debug, Clone, Copy)]
pub enum NbtCompression {
    /// Uncompressed NBT data.
    Uncompressed,
    /// Zlib-compressed NBT data. When writing, the default compression level will be used.
    ZlibCompressed,
    /// Zlib-compressed NBT data with the given compression level.
    ZlibCompressedWith(CompressionLevel),
    /// Gzip-compressed NBT data. When writing, the default compression level will be used.
    GzipCompressed,
    /// Gzip-compressed NBT data with the given compression level.
    GzipCompressedWith(CompressionLevel),
}

#[derive(Debug, Clone, Copy)]
pub struct CompressionLevel(u8);

impl From<Compression> for CompressionLevel {
    fn from(value: Compression) -> Self {
        Self(value.level() as u8)
    }
}

impl From<CompressionLevel> for Compression {
    fn from(value: CompressionLevel) -> Self {
        Compression::new(u32::from(value.0))
    }
}

/// String encodings used by Minecraft. Java is CESU-8, Bedrock is UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringEncoding {
    /// Used by Bedrock.
    Utf8,
    /// Used by Java.
    Cesu8,
}


// ================================
//      SNBT Options
// ================================

/// Determines which version of the SNBT specification should be used to convert between
/// NBT and SNBT. The updated version is used in Java Edition at or above 1.21.5.
/// The original version is used by Java before 1.21.5, as well as by other versions
/// of Minecraft (including Bedrock).
///
/// Converting NBT to SNBT is compatible with both versions by default; the version mostly
/// affects which SNBT text is accepted when parsing, and a few details of how list and
/// numeric-array homogeneity mismatches are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnbtVersion {
    /// For Java 1.21.5 and later. Unquoted strings may not start with `+`, `-`, `.`, or a
    /// digit, and leading zeroes are prohibited in integers. A heterogeneous tag list is
    /// accepted by wrapping every element in a single-entry compound rather than rejected,
    /// and numeric arrays accept any element that fits losslessly (same size or smaller)
    /// rather than requiring an exact-size match.
    UpdatedJava,
    /// For Java before 1.21.5, or Bedrock Edition. A heterogeneous tag list or a numeric
    /// array element of the wrong size is rejected outright rather than coerced.
    Original,
}

/// Options for parsing SNBT text into NBT data. See [`SnbtVersion`] for the two supported
/// dialects of SNBT.
#[derive(Debug, Clone, Copy)]
pub struct SnbtParseOptions {
    /// Which dialect of SNBT is being parsed.
    pub version: SnbtVersion,
    /// The maximum depth that NBT compounds and tags can be recursively nested.
    ///
    /// Default: 512, the limit used by Minecraft.
    pub depth_limit: DepthLimit,
    /// How the unquoted symbols `true` and `false` should be parsed.
    ///
    /// Default: `AsDetected`.
    pub true_false: ParseTrueFalse,
    /// How unquoted symbols like `Infinityf`, which likely came from a non-finite float,
    /// should be parsed.
    ///
    /// Default: `AsDetected`.
    pub non_finite: ParseNonFinite,
    /// Whether non-finite floating-point numbers should be replaced with finite values
    /// (`MAX`/`MIN` for infinities, `0.` for NaN) rather than rejected outright.
    ///
    /// Default: `true`.
    pub replace_non_finite: bool,
    /// The escape sequences recognized in quoted strings. Note that `\\`, `\'`, and `\"`
    /// are always allowed, independent of this setting.
    ///
    /// Default: all escapes.
    pub enabled_escape_sequences: EnabledEscapeSequences,
    /// How to handle an escape sequence not in the list of enabled escape sequences.
    ///
    /// Default: `Error`.
    pub handle_invalid_escape: HandleInvalidEscape,
}

impl Default for SnbtParseOptions {
    #[inline]
    fn default() -> Self {
        Self::default_updated()
    }
}

impl SnbtParseOptions {
    /// The default settings for the `UpdatedJava` version.
    #[inline]
    pub fn default_updated() -> Self {
        Self {
            version:                  SnbtVersion::UpdatedJava,
            depth_limit:              DepthLimit::default(),
            true_false:               ParseTrueFalse::AsDetected,
            non_finite:               ParseNonFinite::AsDetected,
            replace_non_finite:       true,
            enabled_escape_sequences: EnabledEscapeSequences::all_escapes(),
            handle_invalid_escape:    HandleInvalidEscape::Error,
        }
    }

    /// The default settings for the `Original` version.
    #[inline]
    pub fn default_original() -> Self {
        Self {
            version:                  SnbtVersion::Original,
            depth_limit:              DepthLimit::default(),
            true_false:               ParseTrueFalse::AsDetected,
            non_finite:               ParseNonFinite::AsDetected,
            replace_non_finite:       true,
            enabled_escape_sequences: EnabledEscapeSequences::no_escapes(),
            handle_invalid_escape:    HandleInvalidEscape::Error,
        }
    }
}

/// SNBT allows the unquoted symbols `true` and `false` to be used instead of `1b` and `0b`.
/// This enum indicates whether they should always be parsed as bytes, always parsed
/// as unquoted strings, or parsed as bytes unless they occur as a compound key or as an
/// element of a list of String tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTrueFalse {
    AsByte,
    AsDetected,
    AsString,
}

/// How an unquoted non-finite numeric literal (e.g. `Infinityd`, `NaNf`) should be parsed:
/// always as a number, always as a string, as a number unless it occurs as a compound key
/// or list-of-String element, or rejected outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseNonFinite {
    AsDetected,
    AsFloat,
    AsString,
    Error,
}

/// How to handle an invalid or disabled escape sequence in a quoted string when parsing SNBT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleInvalidEscape {
    /// Copy the escape sequence verbatim into the final string.
    CopyVerbatim,
    /// Ignore the escape sequence, as though it weren't there.
    Ignore,
    /// Halt parsing and return an error.
    Error,
}

/// Options for writing NBT data to SNBT text. See [`SnbtVersion`] for the two supported
/// dialects of SNBT; the version currently has no effect on how NBT data is written, since
/// both dialects can read back the same SNBT text produced here.
#[derive(Debug, Clone, Copy)]
pub struct SnbtWriteOptions {
    /// Which dialect of SNBT this is nominally written for.
    pub version: SnbtVersion,
    /// The maximum depth that NBT compounds and tags can be recursively nested.
    ///
    /// Default: 512, the limit used by Minecraft.
    pub depth_limit: DepthLimit,
    /// How to print a non-finite float/double tag.
    ///
    /// Default: `PrintFloats`.
    pub non_finite: WriteNonFinite,
    /// Which escape sequences are used when writing a string tag into a quoted SNBT string.
    /// Escapes are only used when a simpler unescaped representation is not possible, and
    /// `\\`, `\'`, `\"` are always allowed regardless of this setting.
    ///
    /// Default: all escapes except `\n`, `\r`, `\s`.
    pub enabled_escape_sequences: EnabledEscapeSequences,
    /// Indentation width, in spaces, used by the pretty printer. Must be in `1..=16`.
    ///
    /// Default: `2`.
    pub indent_width: u8,
}

impl Default for SnbtWriteOptions {
    #[inline]
    fn default() -> Self {
        Self::default_updated()
    }
}

impl SnbtWriteOptions {
    /// The default settings for writing `UpdatedJava`-flavored SNBT.
    #[inline]
    pub fn default_updated() -> Self {
        Self {
            version:     SnbtVersion::UpdatedJava,
            depth_limit: DepthLimit::default(),
            non_finite:  WriteNonFinite::PrintFloats,
            enabled_escape_sequences: EnabledEscapeSequences::from_fn(|e| !matches!(
                e,
                EscapeSequence::N | EscapeSequence::R | EscapeSequence::S
            )),
            indent_width: 2,
        }
    }

    /// The default settings for writing `Original`-flavored SNBT.
    #[inline]
    pub fn default_original() -> Self {
        Self {
            version:                  SnbtVersion::Original,
            enabled_escape_sequences: EnabledEscapeSequences::no_escapes(),
            ..Self::default_updated()
        }
    }
}

/// How a non-finite float/double tag should be printed: in its numeric form
/// (substituting `MAX`/`MIN`/`0.`) or in Minecraft's `Infinityd`/`NaNf`-style string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteNonFinite {
    /// Display positive infinity as though it were the `MAX` constant of `f32`/`f64`,
    /// negative infinity as `MIN`, and NaN as `0.`.
    PrintFloats,
    /// Display positive infinity as `Infinityd`/`Infinityf`, negative infinity as
    /// `-Infinityd`/`-Infinityf`, and NaN as `NaNd`/`NaNf`.
    PrintStrings,
}

/// Escape sequences which are enabled when reading or writing quoted SNBT strings.
/// Note that the escapes `\\`, `\'`, and `\"` are always allowed; these settings do not
/// control those escapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnabledEscapeSequences(u16);

impl EnabledEscapeSequences {
    /// Enables the escape sequences for which the provided function returns `true`.
    #[inline]
    pub fn from_fn(f: impl Fn(EscapeSequence) -> bool) -> Self {
        use EscapeSequence as E;

        let mut bits = 0;

        for escape in [
            E::B, E::F, E::N, E::R, E::S, E::T,
            E::UnicodeTwo, E::UnicodeFour, E::UnicodeEight, E::UnicodeNamed,
        ] {
            if f(escape) {
                bits |= 1 << (escape as u8)
            }
        }

        Self(bits)
    }

    /// Enables all escape sequences.
    #[inline]
    pub fn all_escapes() -> Self {
        Self::from_fn(|_| true)
    }

    /// Disables all escape sequences.
    #[inline]
    pub fn no_escapes() -> Self {
        Self(0)
    }

    /// Enables `\n` (newline), `\r` (carriage return), and `\t` (horizontal tab).
    #[inline]
    pub fn standard_whitespace_escapes() -> Self {
        Self::from_fn(|escape| matches!(
            escape,
            EscapeSequence::N | EscapeSequence::R | EscapeSequence::T
        ))
    }

    /// Enables `\b`, `\f`, `\n`, `\r`, `\s`, and `\t`.
    #[inline]
    pub fn one_character_escapes() -> Self {
        Self::from_fn(|escape| matches!(
            escape,
            EscapeSequence::B | EscapeSequence::F | EscapeSequence::N
                | EscapeSequence::R | EscapeSequence::S | EscapeSequence::T
        ))
    }

    /// Enables unicode escapes: `\x`, `\u`, and `\U` for two-, four-, or eight-character
    /// escapes, respectively, and `\N{----}` for named unicode escapes. Note that the named
    /// escape setting is ignored if the `named_escapes` feature is not enabled.
    #[inline]
    pub fn unicode_escapes() -> Self {
        Self::from_fn(|escape| matches!(
            escape,
            EscapeSequence::UnicodeTwo | EscapeSequence::UnicodeFour
                | EscapeSequence::UnicodeEight | EscapeSequence::UnicodeNamed
        ))
    }

    /// Whether the provided escape sequence is enabled.
    #[inline]
    pub fn is_enabled(self, escape: EscapeSequence) -> bool {
        0 != self.0 & (1 << (escape as u8))
    }
}

/// The escape sequences allowed in quoted SNBT strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EscapeSequence {
    /// `\b`, backspace
    B = 0,
    /// `\f`, form feed
    F = 1,
    /// `\n`, newline
    N = 2,
    /// `\r`, carriage return
    R = 3,
    /// `\s`, space
    S = 4,
    /// `\t`, horizontal tab
    T = 5,
    /// `\x--`, two-character unicode escape
    UnicodeTwo = 6,
    /// `\u----`, four-character unicode escape
    UnicodeFour = 7,
    /// `\U--------`, eight-character unicode escape
    UnicodeEight = 8,
    /// `\N{----}`, named unicode escape (`----` stands for a name of any length).
    ///
    /// If the `named_escapes` feature is not enabled, this option is ignored.
    UnicodeNamed = 9,
}
