use std::fmt;

use crate::repr::{NbtReprError, NbtStructureError};
use crate::settings::SnbtWriteOptions;
use super::{Map, NbtTag, TagWithOptions};


/// A named collection of NBT tags: a `TAG_Compound`.
///
/// Keys are unique; inserting a tag under a key that's already present overwrites the
/// previous value, the same way a map normally would. Binary decoding and SNBT parsing
/// enforce a stricter rule of their own (a duplicate key within a single encoded
/// compound is a decode error) at the point where bytes/text are turned into a
/// compound in the first place, rather than inside this type.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct NbtCompound(pub(crate) Map<NbtTag>);

impl NbtCompound {
    #[inline]
    pub fn new() -> Self {
        NbtCompound(Map::default())
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        NbtCompound(Map::with_capacity(capacity))
    }

    #[inline]
    pub fn inner(&self) -> &Map<NbtTag> {
        &self.0
    }

    #[inline]
    pub fn inner_mut(&mut self) -> &mut Map<NbtTag> {
        &mut self.0
    }

    #[inline]
    pub fn into_inner(self) -> Map<NbtTag> {
        self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &NbtTag)> {
        self.0.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut NbtTag)> {
        self.0.iter_mut()
    }

    /// Inserts a tag under `name`, overwriting and returning any previous value.
    /// This is a plain map insert: it does not reject duplicates. The decoder and the
    /// SNBT parser are responsible for rejecting a duplicate key while an encoded
    /// compound is being built, since at that point a duplicate indicates malformed
    /// input rather than an intentional update.
    pub fn insert<K: Into<String>, T: Into<NbtTag>>(&mut self, name: K, value: T) -> Option<NbtTag> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get<'a, T>(&'a self, name: &str) -> Result<T, NbtReprError>
    where
        T: TryFrom<&'a NbtTag>,
        T::Error: std::error::Error + 'static,
    {
        let tag = self.get_tag(name)?;
        T::try_from(tag).map_err(NbtReprError::from_any)
    }

    pub fn get_mut<'a, T>(&'a mut self, name: &str) -> Result<T, NbtReprError>
    where
        T: TryFrom<&'a mut NbtTag>,
        T::Error: std::error::Error + 'static,
    {
        let tag = self.0.get_mut(name)
            .ok_or_else(|| NbtStructureError::missing_tag(name))?;
        T::try_from(tag).map_err(NbtReprError::from_any)
    }

    pub fn get_tag(&self, name: &str) -> Result<&NbtTag, NbtReprError> {
        self.0.get(name).ok_or_else(|| NbtStructureError::missing_tag(name).into())
    }

    pub fn get_tag_mut(&mut self, name: &str) -> Result<&mut NbtTag, NbtReprError> {
        self.0.get_mut(name).ok_or_else(|| NbtStructureError::missing_tag(name).into())
    }

    /// Removes and returns the tag under `name`, if present.
    pub fn remove_tag(&mut self, name: &str) -> Option<NbtTag> {
        #[cfg(feature = "preserve_order")]
        { self.0.shift_remove(name) }
        #[cfg(not(feature = "preserve_order"))]
        { self.0.remove(name) }
    }

    pub fn to_snbt(&self) -> String {
        self.to_snbt_with_options(SnbtWriteOptions::default())
    }

    pub fn to_pretty_snbt(&self) -> String {
        self.to_pretty_snbt_with_options(SnbtWriteOptions::default())
    }

    pub fn to_snbt_with_options(&self, opts: SnbtWriteOptions) -> String {
        format!("{}", TagWithOptions(&NbtTag::Compound(self.clone()), opts))
    }

    pub fn to_pretty_snbt_with_options(&self, opts: SnbtWriteOptions) -> String {
        format!("{:#}", TagWithOptions(&NbtTag::Compound(self.clone()), opts))
    }
}

impl fmt::Display for NbtCompound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", NbtTag::Compound(self.clone()))
    }
}

impl IntoIterator for NbtCompound {
    type Item = (String, NbtTag);
    type IntoIter = <Map<NbtTag> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a NbtCompound {
    type Item = (&'a String, &'a NbtTag);
    type IntoIter = <&'a Map<NbtTag> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, NbtTag)> for NbtCompound {
    fn from_iter<I: IntoIterator<Item = (String, NbtTag)>>(iter: I) -> Self {
        NbtCompound(Map::from_iter(iter))
    }
}

impl Extend<(String, NbtTag)> for NbtCompound {
    fn extend<I: IntoIterator<Item = (String, NbtTag)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}
