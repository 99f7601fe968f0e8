use std::{borrow, fmt, mem, ops, slice, vec};

use crate::raw;
use crate::repr::{NbtReprError, NbtStructureError};
use crate::settings::SnbtWriteOptions;
use super::{NbtTag, TagWithOptions};


/// An ordered, homogeneous sequence of NBT tags: a `TAG_List`.
///
/// Every element of a list must be the same concrete tag kind (an empty list has no
/// kind yet, and will accept any first element). Attempting to push or insert a tag
/// of a different kind than the list's existing elements returns an error rather than
/// silently mixing kinds, since the binary format has no way to represent a
/// heterogeneous list (it stores one shared element type id for the whole list).
#[repr(transparent)]
#[derive(Clone, PartialEq, Default, Debug)]
pub struct NbtList(pub(crate) Vec<NbtTag>);

impl NbtList {
    #[inline]
    pub const fn new() -> Self {
        NbtList(Vec::new())
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        NbtList(Vec::with_capacity(capacity))
    }

    #[inline]
    pub fn inner(&self) -> &Vec<NbtTag> {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> Vec<NbtTag> {
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
    pub fn iter(&self) -> slice::Iter<'_, NbtTag> {
        self.0.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, NbtTag> {
        self.0.iter_mut()
    }

    /// The wire type id shared by every element currently in the list, or `None`
    /// if the list is empty (and so accepts any kind for its first element).
    pub fn element_type_id(&self) -> Option<u8> {
        self.0.first().map(|tag| raw::id_for_tag(Some(tag)))
    }

    fn check_homogeneous(&self, tag: &NbtTag) -> Result<(), NbtReprError> {
        if let Some(first) = self.0.first() {
            if mem::discriminant(first) != mem::discriminant(tag) {
                return Err(NbtStructureError::type_mismatch(
                    first.tag_name(),
                    tag.tag_name(),
                ).into());
            }
        }
        Ok(())
    }

    /// Appends a tag to the end of the list, rejecting it if its kind doesn't match
    /// the kind already established by the list's existing elements.
    pub fn push<T: Into<NbtTag>>(&mut self, value: T) -> Result<(), NbtReprError> {
        let tag = value.into();
        self.check_homogeneous(&tag)?;
        self.0.push(tag);
        Ok(())
    }

    /// Appends a tag without checking homogeneity. Only used internally, by callers
    /// (the binary decoder, the SNBT parser) that have already verified every element
    /// shares one kind before building the list.
    pub(crate) fn push_unchecked<T: Into<NbtTag>>(&mut self, value: T) {
        self.0.push(value.into());
    }

    /// Inserts a tag at `index`, rejecting it if its kind doesn't match the list's
    /// established element kind.
    pub fn insert<T: Into<NbtTag>>(&mut self, index: usize, value: T) -> Result<(), NbtReprError> {
        let tag = value.into();
        self.check_homogeneous(&tag)?;
        self.0.insert(index, tag);
        Ok(())
    }

    pub fn get<'a, T>(&'a self, index: usize) -> Result<T, NbtReprError>
    where
        T: TryFrom<&'a NbtTag>,
        T::Error: std::error::Error + 'static,
    {
        let tag = self.get_tag(index)?;
        T::try_from(tag).map_err(NbtReprError::from_any)
    }

    pub fn get_mut<'a, T>(&'a mut self, index: usize) -> Result<T, NbtReprError>
    where
        T: TryFrom<&'a mut NbtTag>,
        T::Error: std::error::Error + 'static,
    {
        let len = self.0.len();
        let tag = self.0.get_mut(index)
            .ok_or_else(|| NbtStructureError::invalid_index(index, len))?;
        T::try_from(tag).map_err(NbtReprError::from_any)
    }

    pub fn get_tag(&self, index: usize) -> Result<&NbtTag, NbtReprError> {
        self.0.get(index)
            .ok_or_else(|| NbtStructureError::invalid_index(index, self.0.len()).into())
    }

    pub fn get_tag_mut(&mut self, index: usize) -> Result<&mut NbtTag, NbtReprError> {
        let len = self.0.len();
        self.0.get_mut(index)
            .ok_or_else(|| NbtStructureError::invalid_index(index, len).into())
    }

    pub fn remove_tag(&mut self, index: usize) -> Result<NbtTag, NbtReprError> {
        let len = self.0.len();
        if index >= len {
            return Err(NbtStructureError::invalid_index(index, len).into());
        }
        Ok(self.0.remove(index))
    }

    pub fn to_snbt(&self) -> String {
        self.to_snbt_with_options(SnbtWriteOptions::default())
    }

    pub fn to_pretty_snbt(&self) -> String {
        self.to_pretty_snbt_with_options(SnbtWriteOptions::default())
    }

    pub fn to_snbt_with_options(&self, opts: SnbtWriteOptions) -> String {
        format!("{}", TagWithOptions(&NbtTag::List(self.clone()), opts))
    }

    pub fn to_pretty_snbt_with_options(&self, opts: SnbtWriteOptions) -> String {
        format!("{:#}", TagWithOptions(&NbtTag::List(self.clone()), opts))
    }
}

impl fmt::Display for NbtList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", NbtTag::List(self.clone()))
    }
}

impl From<Vec<NbtTag>> for NbtList {
    fn from(value: Vec<NbtTag>) -> Self {
        NbtList(value)
    }
}

impl FromIterator<NbtTag> for NbtList {
    fn from_iter<T: IntoIterator<Item = NbtTag>>(iter: T) -> Self {
        NbtList(Vec::from_iter(iter))
    }
}

impl Extend<NbtTag> for NbtList {
    fn extend<T: IntoIterator<Item = NbtTag>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for NbtList {
    type Item = NbtTag;
    type IntoIter = vec::IntoIter<NbtTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a NbtList {
    type Item = &'a NbtTag;
    type IntoIter = slice::Iter<'a, NbtTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a mut NbtList {
    type Item = &'a mut NbtTag;
    type IntoIter = slice::IterMut<'a, NbtTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter_mut()
    }
}

impl ops::Index<usize> for NbtList {
    type Output = NbtTag;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl ops::IndexMut<usize> for NbtList {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl AsRef<[NbtTag]> for NbtList {
    fn as_ref(&self) -> &[NbtTag] {
        &self.0
    }
}

impl AsMut<[NbtTag]> for NbtList {
    fn as_mut(&mut self) -> &mut [NbtTag] {
        &mut self.0
    }
}

impl borrow::Borrow<[NbtTag]> for NbtList {
    fn borrow(&self) -> &[NbtTag] {
        &self.0
    }
}

impl borrow::BorrowMut<[NbtTag]> for NbtList {
    fn borrow_mut(&mut self) -> &mut [NbtTag] {
        &mut self.0
    }
}

impl ops::Deref for NbtList {
    type Target = [NbtTag];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ops::DerefMut for NbtList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
