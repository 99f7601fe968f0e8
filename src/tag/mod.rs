mod compound;
mod list;

pub use compound::NbtCompound;
pub use list::NbtList;

use std::fmt;
#[cfg(not(feature = "preserve_order"))]
use std::collections::HashMap;

use crate::raw;
use crate::repr::NbtStructureError;
use crate::settings::{EscapeSequence, SnbtWriteOptions, WriteNonFinite};

#[cfg(feature = "preserve_order")]
pub(crate) type Map<T> = indexmap::IndexMap<String, T>;
#[cfg(not(feature = "preserve_order"))]
pub(crate) type Map<T> = HashMap<String, T>;


/// A single NBT tag and its payload.
///
/// There are twelve concrete kinds; the thirteenth id in the wire format, `TAG_End`
/// (id `0`), is a sentinel that only ever marks the end of a compound's entry list or
/// fills in for an empty, typeless list. It never appears as a value here.
#[derive(Clone, PartialEq, Debug)]
pub enum NbtTag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(NbtList),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtTag {
    /// The name Minecraft gives this tag's kind, e.g. `"Int"` or `"Compound"`.
    pub const fn tag_name(&self) -> &'static str {
        match self {
            NbtTag::Byte(..)      => "Byte",
            NbtTag::Short(..)     => "Short",
            NbtTag::Int(..)       => "Int",
            NbtTag::Long(..)      => "Long",
            NbtTag::Float(..)     => "Float",
            NbtTag::Double(..)    => "Double",
            NbtTag::ByteArray(..) => "ByteArray",
            NbtTag::String(..)    => "String",
            NbtTag::List(..)      => "List",
            NbtTag::Compound(..)  => "Compound",
            NbtTag::IntArray(..)  => "IntArray",
            NbtTag::LongArray(..) => "LongArray",
        }
    }

    /// This tag's wire type id, `0x1` through `0xC`.
    pub const fn numeric_tag_id(&self) -> u8 {
        raw::id_for_tag(Some(self))
    }

    pub fn to_snbt(&self) -> String {
        self.to_snbt_with_options(SnbtWriteOptions::default())
    }

    pub fn to_pretty_snbt(&self) -> String {
        self.to_pretty_snbt_with_options(SnbtWriteOptions::default())
    }

    pub fn to_snbt_with_options(&self, opts: SnbtWriteOptions) -> String {
        format!("{}", TagWithOptions(self, opts))
    }

    pub fn to_pretty_snbt_with_options(&self, opts: SnbtWriteOptions) -> String {
        format!("{:#}", TagWithOptions(self, opts))
    }
}

impl fmt::Display for NbtTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        TagWithOptions(self, SnbtWriteOptions::default()).fmt(f)
    }
}

/// Wraps a tag (or list, or compound) together with the options controlling how it's
/// printed to SNBT. Implements [`Display`](fmt::Display): the compact form is used by
/// default, and the pretty, multi-line form is used when the alternate flag (`{:#}`)
/// is set.
pub(crate) struct TagWithOptions<'a>(pub &'a NbtTag, pub SnbtWriteOptions);

/// Same as [`TagWithOptions`], but for a bare list.
pub(crate) struct ListWithOptions<'a>(pub &'a NbtList, pub SnbtWriteOptions);

/// Same as [`TagWithOptions`], but for a bare compound.
pub(crate) struct CompoundWithOptions<'a>(pub &'a NbtCompound, pub SnbtWriteOptions);

impl fmt::Display for TagWithOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pretty = f.alternate();
        recursively_format_tag(self.0, f, 0, self.1, pretty)
    }
}

impl fmt::Display for ListWithOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        TagWithOptions(&NbtTag::List(self.0.clone()), self.1).fmt(f)
    }
}

impl fmt::Display for CompoundWithOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        TagWithOptions(&NbtTag::Compound(self.0.clone()), self.1).fmt(f)
    }
}

fn indent(f: &mut fmt::Formatter<'_>, opts: SnbtWriteOptions, depth: usize) -> fmt::Result {
    for _ in 0..depth * usize::from(opts.indent_width) {
        write!(f, " ")?;
    }
    Ok(())
}

fn check_depth_limit(depth: usize, opts: SnbtWriteOptions) -> Option<&'static str> {
    if depth as u32 >= opts.depth_limit.limit() {
        log::warn!("exceeded depth limit of {} while formatting SNBT", opts.depth_limit.limit());
        Some("<!-- depth limit exceeded -->")
    } else {
        None
    }
}

fn is_numeric_scalar(tag: &NbtTag) -> bool {
    matches!(
        tag,
        NbtTag::Byte(_) | NbtTag::Short(_) | NbtTag::Int(_)
            | NbtTag::Long(_) | NbtTag::Float(_) | NbtTag::Double(_)
    )
}

/// Renders a numeric scalar tag the same way [`recursively_format_tag`] would, without
/// needing a `Formatter` to write into. Only called on tags already checked by
/// [`is_numeric_scalar`].
fn format_numeric_scalar(tag: &NbtTag, opts: SnbtWriteOptions) -> String {
    match tag {
        NbtTag::Byte(value)   => format!("{value}b"),
        NbtTag::Short(value)  => format!("{value}s"),
        NbtTag::Int(value)    => format!("{value}"),
        NbtTag::Long(value)   => format!("{value}l"),
        NbtTag::Float(value)  => format!("{}f", format_non_finite_f32(*value, opts)),
        NbtTag::Double(value) => format!("{}d", format_non_finite_f64(*value, opts)),
        _ => unreachable!("format_numeric_scalar is only called on is_numeric_scalar tags"),
    }
}

fn is_byte_or_short(tag: &NbtTag) -> bool {
    matches!(tag, NbtTag::Byte(_) | NbtTag::Short(_))
}

fn is_scalar(tag: &NbtTag) -> bool {
    is_numeric_scalar(tag) || matches!(tag, NbtTag::String(_))
}

/// Whether a non-empty list is short and plain enough to render on a single line
/// even in the pretty (multi-line) form, instead of one element per line. Keeps
/// small numeric triples (coordinates, colors) and single-string lists readable
/// without the vertical sprawl a generic one-per-line layout would give them.
fn fits_one_line_list(list: &NbtList) -> bool {
    let len = list.len();
    if len <= 3 && list.iter().all(is_numeric_scalar) {
        return true;
    }
    if len <= 5 && list.iter().all(is_byte_or_short) {
        return true;
    }
    if len == 1 && matches!(list[0], NbtTag::String(_)) {
        return true;
    }
    false
}

/// Minimum element count at which pretty-printed arrays and numeric lists switch from
/// one-element-per-line to the near-square grid layout.
const GRID_THRESHOLD: usize = 16;

fn recursively_format_tag(
    tag: &NbtTag,
    f: &mut fmt::Formatter<'_>,
    depth: usize,
    opts: SnbtWriteOptions,
    pretty: bool,
) -> fmt::Result {
    match tag {
        NbtTag::Byte(value)   => write!(f, "{value}b"),
        NbtTag::Short(value)  => write!(f, "{value}s"),
        NbtTag::Int(value)    => write!(f, "{value}"),
        NbtTag::Long(value)   => write!(f, "{value}l"),
        NbtTag::Float(value)  => write!(f, "{}f", format_non_finite_f32(*value, opts)),
        NbtTag::Double(value) => write!(f, "{}d", format_non_finite_f64(*value, opts)),
        NbtTag::String(value) => write!(f, "{}", string_to_snbt(value, opts)),

        NbtTag::ByteArray(values) => write_prim_array(f, "B", values, depth, opts, pretty, |v| format!("{v}B")),
        NbtTag::IntArray(values)  => write_prim_array(f, "I", values, depth, opts, pretty, |v| format!("{v}")),
        NbtTag::LongArray(values) => write_prim_array(f, "L", values, depth, opts, pretty, |v| format!("{v}L")),

        NbtTag::List(list) => {
            if let Some(msg) = check_depth_limit(depth, opts) {
                return write!(f, "{msg}");
            }

            if list.is_empty() {
                return write!(f, "[]");
            }

            if pretty && fits_one_line_list(list) {
                write!(f, "[")?;
                for (index, element) in list.iter().enumerate() {
                    recursively_format_tag(element, f, depth + 1, opts, false)?;
                    if index + 1 != list.len() { write!(f, ", ")?; }
                }
                return write!(f, "]");
            }

            if pretty && list.len() >= GRID_THRESHOLD && list.iter().all(is_numeric_scalar) {
                write!(f, "[")?;
                return write_grid_body(f, list.as_ref(), depth, opts, |tag| format_numeric_scalar(tag, opts));
            }

            write!(f, "[")?;
            if pretty { writeln!(f)?; }

            for (index, element) in list.iter().enumerate() {
                if pretty { indent(f, opts, depth + 1)?; }
                recursively_format_tag(element, f, depth + 1, opts, pretty)?;
                if index + 1 != list.len() { write!(f, ",")?; }
                if pretty { writeln!(f)?; }
            }

            if pretty { indent(f, opts, depth)?; }
            write!(f, "]")
        },

        NbtTag::Compound(compound) => {
            if let Some(msg) = check_depth_limit(depth, opts) {
                return write!(f, "{msg}");
            }

            if compound.is_empty() {
                return write!(f, "{{}}");
            }

            if pretty && compound.len() == 1 {
                let (key, value) = compound.iter().next().expect("checked len == 1");
                if is_scalar(value) {
                    write!(f, "{{{}: ", string_to_snbt(key, opts))?;
                    recursively_format_tag(value, f, depth + 1, opts, false)?;
                    return write!(f, "}}");
                }
            }

            write!(f, "{{")?;
            if pretty { writeln!(f)?; }

            let len = compound.len();
            for (index, (key, value)) in compound.iter().enumerate() {
                if pretty { indent(f, opts, depth + 1)?; }
                write!(f, "{}:", string_to_snbt(key, opts))?;
                if pretty { write!(f, " ")?; }
                recursively_format_tag(value, f, depth + 1, opts, pretty)?;
                if index + 1 != len { write!(f, ",")?; }
                if pretty { writeln!(f)?; }
            }

            if pretty { indent(f, opts, depth)?; }
            write!(f, "}}")
        },
    }
}

/// Prints a typed numeric array (`[B; ...]`, `[I; ...]`, `[L; ...]`). In the pretty form,
/// arrays of 16 or more elements are laid out in a near-square grid (`h = w =
/// ceil(sqrt(len))` elements per row) instead of one element per line, which keeps long
/// arrays (chunk heightmaps, biome arrays) readable instead of sprawling vertically.
fn write_prim_array<T>(
    f: &mut fmt::Formatter<'_>,
    prefix: &str,
    values: &[T],
    depth: usize,
    opts: SnbtWriteOptions,
    pretty: bool,
    render: impl Fn(&T) -> String,
) -> fmt::Result {
    write!(f, "[{prefix};")?;

    if values.is_empty() {
        return write!(f, "]");
    }

    if !pretty || values.len() < GRID_THRESHOLD {
        if pretty { writeln!(f)?; } else { write!(f, " ")?; }
        for (index, value) in values.iter().enumerate() {
            if pretty { indent(f, opts, depth + 1)?; }
            write!(f, "{}", render(value))?;
            if index + 1 != values.len() { write!(f, ",")?; }
            if pretty { writeln!(f)?; } else if index + 1 != values.len() { write!(f, " ")?; }
        }
        if pretty { indent(f, opts, depth)?; }
        return write!(f, "]");
    }

    write_grid_body(f, values, depth, opts, render)
}

/// Writes the body of a near-square grid layout (`h = w = ceil(sqrt(len))` elements per
/// row) and the closing bracket. The caller has already written the opening bracket
/// (and, for typed arrays, the `B;`/`I;`/`L;` prefix).
fn write_grid_body<T>(
    f: &mut fmt::Formatter<'_>,
    values: &[T],
    depth: usize,
    opts: SnbtWriteOptions,
    render: impl Fn(&T) -> String,
) -> fmt::Result {
    let side = (values.len() as f64).sqrt().ceil() as usize;
    writeln!(f)?;
    for (row_index, row) in values.chunks(side).enumerate() {
        indent(f, opts, depth + 1)?;
        for (col_index, value) in row.iter().enumerate() {
            write!(f, "{}", render(value))?;
            let is_last_overall = row_index * side + col_index + 1 == values.len();
            if !is_last_overall { write!(f, ",")?; }
            if col_index + 1 != row.len() { write!(f, " ")?; }
        }
        writeln!(f)?;
    }
    indent(f, opts, depth)?;
    write!(f, "]")
}

fn format_non_finite_f32(value: f32, opts: SnbtWriteOptions) -> String {
    if value.is_finite() {
        return format!("{value}");
    }
    match opts.non_finite {
        WriteNonFinite::PrintFloats => {
            if value.is_nan() { "0".to_owned() }
            else if value.is_sign_positive() { format!("{}", f32::MAX) }
            else { format!("{}", f32::MIN) }
        },
        WriteNonFinite::PrintStrings => {
            if value.is_nan() { "NaN".to_owned() }
            else if value.is_sign_positive() { "Infinity".to_owned() }
            else { "-Infinity".to_owned() }
        },
    }
}

fn format_non_finite_f64(value: f64, opts: SnbtWriteOptions) -> String {
    if value.is_finite() {
        return format!("{value}");
    }
    match opts.non_finite {
        WriteNonFinite::PrintFloats => {
            if value.is_nan() { "0".to_owned() }
            else if value.is_sign_positive() { format!("{}", f64::MAX) }
            else { format!("{}", f64::MIN) }
        },
        WriteNonFinite::PrintStrings => {
            if value.is_nan() { "NaN".to_owned() }
            else if value.is_sign_positive() { "Infinity".to_owned() }
            else { "-Infinity".to_owned() }
        },
    }
}

/// Whether `s` needs quoting to round-trip as an SNBT string: empty strings, strings
/// containing characters outside `[0-9a-zA-Z_.+-]`, and strings that would otherwise
/// be read back as a different tag kind (a number, or `true`/`false`) all require quotes.
pub fn should_quote(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    if !s.chars().all(crate::snbt::allowed_unquoted) {
        return true;
    }
    crate::snbt::is_ambiguous(s)
}

/// Renders a string as it would appear in SNBT: quoted and escaped if necessary,
/// bare otherwise.
pub fn string_to_snbt(s: &str, opts: SnbtWriteOptions) -> String {
    if !should_quote(s) {
        return s.to_owned();
    }

    let quote = if s.contains('"') && !s.contains('\'') { '\'' } else { '"' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);

    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            },
            '\x08' if opts.enabled_escape_sequences.is_enabled(EscapeSequence::B) => out.push_str("\\b"),
            '\x0c' if opts.enabled_escape_sequences.is_enabled(EscapeSequence::F) => out.push_str("\\f"),
            '\n' if opts.enabled_escape_sequences.is_enabled(EscapeSequence::N) => out.push_str("\\n"),
            '\r' if opts.enabled_escape_sequences.is_enabled(EscapeSequence::R) => out.push_str("\\r"),
            '\x20' if opts.enabled_escape_sequences.is_enabled(EscapeSequence::S) => out.push_str("\\s"),
            '\t' if opts.enabled_escape_sequences.is_enabled(EscapeSequence::T) => out.push_str("\\t"),
            c => out.push(c),
        }
    }

    out.push(quote);
    out
}


// ================================
//      From / TryFrom conversions
// ================================

macro_rules! tag_from {
    ($variant:ident, $t:ty) => {
        impl From<$t> for NbtTag {
            fn from(value: $t) -> Self {
                NbtTag::$variant(value)
            }
        }
    };
}

tag_from!(Byte, i8);
tag_from!(Short, i16);
tag_from!(Int, i32);
tag_from!(Long, i64);
tag_from!(Float, f32);
tag_from!(Double, f64);
tag_from!(ByteArray, Vec<i8>);
tag_from!(String, String);
tag_from!(List, NbtList);
tag_from!(Compound, NbtCompound);
tag_from!(IntArray, Vec<i32>);
tag_from!(LongArray, Vec<i64>);

impl From<bool> for NbtTag {
    fn from(value: bool) -> Self {
        NbtTag::Byte(if value { 1 } else { 0 })
    }
}

impl From<&str> for NbtTag {
    fn from(value: &str) -> Self {
        NbtTag::String(value.to_owned())
    }
}

macro_rules! prim_from_tag {
    ($variant:ident, $t:ty) => {
        impl TryFrom<&NbtTag> for $t {
            type Error = NbtStructureError;

            fn try_from(tag: &NbtTag) -> Result<Self, Self::Error> {
                match tag {
                    NbtTag::$variant(value) => Ok(*value),
                    other => Err(NbtStructureError::type_mismatch(
                        stringify!($variant),
                        other.tag_name(),
                    )),
                }
            }
        }

        impl TryFrom<&mut NbtTag> for $t {
            type Error = NbtStructureError;

            fn try_from(tag: &mut NbtTag) -> Result<Self, Self::Error> {
                <$t>::try_from(&*tag)
            }
        }
    };
}

prim_from_tag!(Byte, i8);
prim_from_tag!(Short, i16);
prim_from_tag!(Int, i32);
prim_from_tag!(Long, i64);
prim_from_tag!(Float, f32);
prim_from_tag!(Double, f64);

macro_rules! ref_from_tag {
    ($variant:ident, $owned:ty, $borrowed:ty, $as_ref:expr) => {
        impl<'a> TryFrom<&'a NbtTag> for &'a $borrowed {
            type Error = NbtStructureError;

            fn try_from(tag: &'a NbtTag) -> Result<Self, Self::Error> {
                match tag {
                    NbtTag::$variant(value) => Ok($as_ref(value)),
                    other => Err(NbtStructureError::type_mismatch(
                        stringify!($variant),
                        other.tag_name(),
                    )),
                }
            }
        }

        impl<'a> TryFrom<&'a mut NbtTag> for &'a mut $owned {
            type Error = NbtStructureError;

            fn try_from(tag: &'a mut NbtTag) -> Result<Self, Self::Error> {
                let found = tag.tag_name();
                match tag {
                    NbtTag::$variant(value) => Ok(value),
                    _ => Err(NbtStructureError::type_mismatch(stringify!($variant), found)),
                }
            }
        }
    };
}

ref_from_tag!(String, String, str, |v: &String| v.as_str());
ref_from_tag!(ByteArray, Vec<i8>, [i8], |v: &Vec<i8>| v.as_slice());
ref_from_tag!(IntArray, Vec<i32>, [i32], |v: &Vec<i32>| v.as_slice());
ref_from_tag!(LongArray, Vec<i64>, [i64], |v: &Vec<i64>| v.as_slice());

impl<'a> TryFrom<&'a NbtTag> for &'a NbtList {
    type Error = NbtStructureError;

    fn try_from(tag: &'a NbtTag) -> Result<Self, Self::Error> {
        match tag {
            NbtTag::List(list) => Ok(list),
            other => Err(NbtStructureError::type_mismatch("List", other.tag_name())),
        }
    }
}

impl<'a> TryFrom<&'a mut NbtTag> for &'a mut NbtList {
    type Error = NbtStructureError;

    fn try_from(tag: &'a mut NbtTag) -> Result<Self, Self::Error> {
        let found = tag.tag_name();
        match tag {
            NbtTag::List(list) => Ok(list),
            _ => Err(NbtStructureError::type_mismatch("List", found)),
        }
    }
}

impl<'a> TryFrom<&'a NbtTag> for &'a NbtCompound {
    type Error = NbtStructureError;

    fn try_from(tag: &'a NbtTag) -> Result<Self, Self::Error> {
        match tag {
            NbtTag::Compound(compound) => Ok(compound),
            other => Err(NbtStructureError::type_mismatch("Compound", other.tag_name())),
        }
    }
}

impl<'a> TryFrom<&'a mut NbtTag> for &'a mut NbtCompound {
    type Error = NbtStructureError;

    fn try_from(tag: &'a mut NbtTag) -> Result<Self, Self::Error> {
        let found = tag.tag_name();
        match tag {
            NbtTag::Compound(compound) => Ok(compound),
            _ => Err(NbtStructureError::type_mismatch("Compound", found)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SnbtWriteOptions;

    fn pretty_with_indent(tag: &NbtTag, indent_width: u8) -> String {
        let opts = SnbtWriteOptions { indent_width, ..SnbtWriteOptions::default() };
        tag.to_pretty_snbt_with_options(opts)
    }

    #[test]
    fn single_scalar_compound_prints_on_one_line() {
        let mut inner = NbtCompound::new();
        inner.insert("v", NbtTag::Int(1));
        let mut outer = NbtCompound::new();
        outer.insert("x", NbtTag::Compound(inner));

        assert_eq!(pretty_with_indent(&NbtTag::Compound(outer), 4), "{\n    x: {v: 1}\n}");
    }

    #[test]
    fn short_numeric_list_prints_on_one_line() {
        let mut list = NbtList::new();
        list.push(NbtTag::Int(1)).unwrap();
        list.push(NbtTag::Int(2)).unwrap();
        list.push(NbtTag::Int(3)).unwrap();

        assert_eq!(pretty_with_indent(&NbtTag::List(list), 2), "[1, 2, 3]");
    }

    #[test]
    fn long_numeric_list_still_multilines() {
        let mut list = NbtList::new();
        for i in 0..4 {
            list.push(NbtTag::Int(i)).unwrap();
        }

        let printed = pretty_with_indent(&NbtTag::List(list), 2);
        assert!(printed.contains('\n'));
    }

    #[test]
    fn int_array_grid_layout_starts_at_sixteen_elements() {
        let fifteen: Vec<i32> = (0..15).collect();
        let sixteen: Vec<i32> = (0..16).collect();

        let printed_15 = NbtTag::IntArray(fifteen).to_pretty_snbt();
        let printed_16 = NbtTag::IntArray(sixteen).to_pretty_snbt();

        // Below the grid threshold, every element gets its own line: 15 commas/elements
        // means 15 newlines inside the brackets. At 16, the grid groups several per line.
        let per_line_count = printed_15.lines().count();
        let grid_line_count = printed_16.lines().count();
        assert!(grid_line_count < per_line_count + 2);
    }

    #[test]
    fn empty_containers_print_compactly() {
        assert_eq!(NbtTag::Compound(NbtCompound::new()).to_pretty_snbt(), "{}");
        assert_eq!(NbtTag::List(NbtList::new()).to_pretty_snbt(), "[]");
    }

    #[test]
    fn should_quote_detects_ambiguous_bare_words() {
        assert!(should_quote(""));
        assert!(should_quote("true"));
        assert!(should_quote("1"));
        assert!(!should_quote("hello_world"));
    }
}
