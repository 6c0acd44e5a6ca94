use std::{
    borrow::Borrow,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
};

use widestring::{U16Str, U16String};

/// Text key identifying one interceptable call site.
///
/// Keys arrive from the instrumentation layer as UTF-16 and are kept that way, so two keys are
/// equal exactly when their code units are equal. No normalization happens here; producing a
/// canonical key is the caller's job. A key that is not valid UTF-16 is still a valid key.
///
/// `StubKey` borrows as [`U16Str`], which lets the registry be queried with a borrowed wide
/// string without allocating.
///
/// # Examples
///
/// ```rust
/// use stubgate::StubKey;
/// use widestring::u16str;
///
/// let key = StubKey::new("Foo.Bar.get_Baz");
/// assert_eq!(key.as_ustr(), u16str!("Foo.Bar.get_Baz"));
/// assert_eq!(key.to_string(), "Foo.Bar.get_Baz");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StubKey(U16String);

impl StubKey {
    /// Encodes `key` as UTF-16 and wraps it.
    #[must_use]
    pub fn new(key: &str) -> Self {
        StubKey(U16String::from_str(key))
    }

    /// Copies the code units of a wide string into a new key.
    #[must_use]
    pub fn from_wide(key: &U16Str) -> Self {
        StubKey(key.to_ustring())
    }

    /// The UTF-16 code units of this key.
    #[must_use]
    pub fn as_ustr(&self) -> &U16Str {
        self.0.as_ustr()
    }

    /// Number of UTF-16 code units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the empty key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Must hash exactly like `U16Str` for the `Borrow` lookup to hit.
impl Hash for StubKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_ustr().hash(state);
    }
}

impl Borrow<U16Str> for StubKey {
    fn borrow(&self) -> &U16Str {
        self.0.as_ustr()
    }
}

impl Deref for StubKey {
    type Target = U16Str;

    fn deref(&self) -> &U16Str {
        self.0.as_ustr()
    }
}

impl From<&str> for StubKey {
    fn from(key: &str) -> Self {
        StubKey::new(key)
    }
}

impl From<String> for StubKey {
    fn from(key: String) -> Self {
        StubKey::new(&key)
    }
}

impl From<&U16Str> for StubKey {
    fn from(key: &U16Str) -> Self {
        StubKey::from_wide(key)
    }
}

impl From<U16String> for StubKey {
    fn from(key: U16String) -> Self {
        StubKey(key)
    }
}

impl fmt::Debug for StubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StubKey({:?})", self.0.to_string_lossy())
    }
}

impl fmt::Display for StubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_string_lossy())
    }
}
