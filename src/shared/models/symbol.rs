//! Interned textual identifiers.
//!
//! `Symbol` is the Rust analogue of the original `boost::flyweight<string>`:
//! a cheap, `Clone`-able handle into a process-wide, append-only string
//! table. Interning is keyed by content, so two `Symbol`s built from equal
//! strings always share the same backing allocation.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

static INTERNER: Lazy<RwLock<ahash::AHashSet<Arc<str>>>> =
    Lazy::new(|| RwLock::new(ahash::AHashSet::new()));

/// An interned, globally unique textual name.
///
/// Two `Symbol`s compare equal iff their underlying strings are equal.
/// `Hash` is computed over the underlying string (not the allocation's
/// address), so a `Symbol` can look up entries in a `HashMap<Symbol, _>`
/// via a borrowed `&str` through `Borrow<str>`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Symbol(#[serde(with = "symbol_text")] Arc<str>);

impl Symbol {
    /// Interns `s`, returning the existing `Symbol` if `s` was seen before.
    pub fn intern(s: &str) -> Self {
        if let Some(existing) = INTERNER.read().get(s) {
            return Symbol(existing.clone());
        }
        let mut table = INTERNER.write();
        if let Some(existing) = table.get(s) {
            return Symbol(existing.clone());
        }
        let arc: Arc<str> = Arc::from(s);
        table.insert(arc.clone());
        Symbol(arc)
    }

    /// Returns the interned string this symbol refers to.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::intern(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::intern(&s)
    }
}

mod symbol_text {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::sync::Arc;

    pub fn serialize<S: Serializer>(s: &Arc<str>, ser: S) -> Result<S::Ok, S::Error> {
        s.as_ref().serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Arc<str>, D::Error> {
        let s = String::deserialize(de)?;
        Ok(super::Symbol::intern(&s).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_strings_intern_to_equal_symbols() {
        let a = Symbol::intern("INITIAL TIME");
        let b = Symbol::intern("INITIAL TIME");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "INITIAL TIME");
    }

    #[test]
    fn hash_agrees_with_string_hash() {
        use std::collections::hash_map::DefaultHasher;

        let sym = Symbol::intern("rate");
        let mut h1 = DefaultHasher::new();
        sym.hash(&mut h1);

        let mut h2 = DefaultHasher::new();
        "rate".hash(&mut h2);

        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn distinct_strings_are_distinct_symbols() {
        assert_ne!(Symbol::intern("a"), Symbol::intern("b"));
    }
}
