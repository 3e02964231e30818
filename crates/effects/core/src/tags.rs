use std::collections::HashSet;
use std::fmt;

use crate::name::Tag;

/// Unordered set of unique tags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TagSet {
    tags: HashSet<Tag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tag: Tag) -> bool {
        self.tags.insert(tag)
    }

    pub fn remove(&mut self, tag: Tag) -> bool {
        self.tags.remove(&tag)
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// True when every tag of `other` is present. Vacuously true for an
    /// empty `other`.
    pub fn has_all(&self, other: &TagSet) -> bool {
        other.tags.is_subset(&self.tags)
    }

    /// True when at least one tag of `other` is present. False for an empty
    /// `other`.
    pub fn has_any(&self, other: &TagSet) -> bool {
        !self.tags.is_disjoint(&other.tags)
    }

    /// Adds every tag of `other` to this set.
    pub fn append(&mut self, other: &TagSet) {
        self.tags.extend(other.tags.iter().copied());
    }

    pub fn union(&self, other: &TagSet) -> TagSet {
        let mut out = self.clone();
        out.append(other);
        out
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tags.iter().copied()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for TagSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(Tag::new).collect()
    }
}

impl Extend<Tag> for TagSet {
    fn extend<I: IntoIterator<Item = Tag>>(&mut self, iter: I) {
        self.tags.extend(iter);
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.tags.iter().map(|tag| tag.as_str()).collect();
        names.sort_unstable();
        write!(f, "[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_requirements() {
        let owned: TagSet = ["Buff", "Fire"].into_iter().collect();
        let empty = TagSet::new();
        assert!(owned.has_all(&empty));
        assert!(!owned.has_any(&empty));
    }

    #[test]
    fn has_all_and_any() {
        let owned: TagSet = ["Buff", "Fire"].into_iter().collect();
        let fire: TagSet = ["Fire"].into_iter().collect();
        let fire_ice: TagSet = ["Fire", "Ice"].into_iter().collect();

        assert!(owned.has_all(&fire));
        assert!(!owned.has_all(&fire_ice));
        assert!(owned.has_any(&fire_ice));
        assert!(owned.has_tag(Tag::new("Buff")));
    }

    #[test]
    fn union_and_display_are_sorted() {
        let a: TagSet = ["b"].into_iter().collect();
        let b: TagSet = ["a", "b"].into_iter().collect();
        let merged = a.union(&b);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.to_string(), "[a, b]");
    }
}
