use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order-independent set of declaration modifiers.
///
/// Member declarations accept modifier keywords in any order, so they are
/// accumulated into this bitset first and only interpreted once the
/// declaration kind (method, property, constant, class) is known.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u16);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const PUBLIC: Modifiers = Modifiers(1 << 0);
    pub const PROTECTED: Modifiers = Modifiers(1 << 1);
    pub const PRIVATE: Modifiers = Modifiers(1 << 2);
    pub const STATIC: Modifiers = Modifiers(1 << 3);
    pub const ABSTRACT: Modifiers = Modifiers(1 << 4);
    pub const FINAL: Modifiers = Modifiers(1 << 5);
    pub const READONLY: Modifiers = Modifiers(1 << 6);
    /// Legacy `var` property marker.
    pub const VAR: Modifiers = Modifiers(1 << 7);
    pub const PUBLIC_SET: Modifiers = Modifiers(1 << 8);
    pub const PROTECTED_SET: Modifiers = Modifiers(1 << 9);
    pub const PRIVATE_SET: Modifiers = Modifiers(1 << 10);

    pub const VISIBILITY: Modifiers = Modifiers(0b111);
    pub const SET_VISIBILITY: Modifiers = Modifiers(0b111 << 8);

    const NAMES: [(Modifiers, &'static str); 11] = [
        (Modifiers::PUBLIC, "public"),
        (Modifiers::PROTECTED, "protected"),
        (Modifiers::PRIVATE, "private"),
        (Modifiers::STATIC, "static"),
        (Modifiers::ABSTRACT, "abstract"),
        (Modifiers::FINAL, "final"),
        (Modifiers::READONLY, "readonly"),
        (Modifiers::VAR, "var"),
        (Modifiers::PUBLIC_SET, "public(set)"),
        (Modifiers::PROTECTED_SET, "protected(set)"),
        (Modifiers::PRIVATE_SET, "private(set)"),
    ];

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every flag of `other` is set.
    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Modifiers) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Modifiers) {
        self.0 &= !other.0;
    }

    pub fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(Modifiers::ABSTRACT)
    }

    pub fn is_final(self) -> bool {
        self.contains(Modifiers::FINAL)
    }

    pub fn is_readonly(self) -> bool {
        self.contains(Modifiers::READONLY)
    }

    /// Visibility written in the source, if any. `var` counts as public.
    pub fn explicit_visibility(self) -> Option<Visibility> {
        if self.contains(Modifiers::PRIVATE) {
            Some(Visibility::Private)
        } else if self.contains(Modifiers::PROTECTED) {
            Some(Visibility::Protected)
        } else if self.intersects(Modifiers(Modifiers::PUBLIC.0 | Modifiers::VAR.0)) {
            Some(Visibility::Public)
        } else {
            None
        }
    }

    /// Effective visibility; members without one are public.
    pub fn visibility(self) -> Visibility {
        self.explicit_visibility().unwrap_or(Visibility::Public)
    }

    /// Asymmetric write visibility, e.g. `private(set)`.
    pub fn set_visibility(self) -> Option<Visibility> {
        if self.contains(Modifiers::PRIVATE_SET) {
            Some(Visibility::Private)
        } else if self.contains(Modifiers::PROTECTED_SET) {
            Some(Visibility::Protected)
        } else if self.contains(Modifiers::PUBLIC_SET) {
            Some(Visibility::Public)
        } else {
            None
        }
    }

    /// Number of distinct visibility keywords present.
    pub fn visibility_count(self) -> u32 {
        (self.0 & Modifiers::VISIBILITY.0).count_ones()
    }

    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Modifiers::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Modifiers) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modifiers(")?;
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            f.write_str(name)?;
        }
        write!(f, ")")
    }
}

impl Serialize for Modifiers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names: Vec<&str> = self.names().collect();
        let mut seq = serializer.serialize_seq(Some(names.len()))?;
        for name in names {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut a = Modifiers::NONE;
        a.insert(Modifiers::FINAL);
        a.insert(Modifiers::PUBLIC);
        a.insert(Modifiers::STATIC);

        let b = Modifiers::STATIC | Modifiers::FINAL | Modifiers::PUBLIC;
        assert_eq!(a, b);
        assert_eq!(a.visibility(), Visibility::Public);
    }

    #[test]
    fn test_default_visibility_is_public() {
        assert_eq!(Modifiers::NONE.explicit_visibility(), None);
        assert_eq!(Modifiers::NONE.visibility(), Visibility::Public);
        assert_eq!(Modifiers::VAR.explicit_visibility(), Some(Visibility::Public));
    }

    #[test]
    fn test_set_visibility() {
        let m = Modifiers::PUBLIC | Modifiers::PRIVATE_SET;
        assert_eq!(m.visibility(), Visibility::Public);
        assert_eq!(m.set_visibility(), Some(Visibility::Private));
        assert_eq!(m.visibility_count(), 1);
    }

    #[test]
    fn test_remove_and_contains() {
        let mut m = Modifiers::ABSTRACT | Modifiers::PROTECTED;
        assert!(m.contains(Modifiers::ABSTRACT));
        m.remove(Modifiers::ABSTRACT);
        assert!(!m.is_abstract());
        assert!(m.intersects(Modifiers::VISIBILITY));
    }

    #[test]
    fn test_debug_lists_names() {
        let m = Modifiers::PRIVATE | Modifiers::STATIC;
        assert_eq!(format!("{m:?}"), "Modifiers(private | static)");
    }

    #[test]
    fn test_serializes_as_name_list() {
        let m = Modifiers::PUBLIC | Modifiers::READONLY;
        assert_eq!(
            serde_json::to_string(&m).unwrap(),
            r#"["public","readonly"]"#
        );
    }
}
