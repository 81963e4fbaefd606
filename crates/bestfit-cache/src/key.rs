//! Deterministic cache keys.

use std::fmt;

use sha2::{Digest, Sha256};

/// Cache key: operation kind plus a SHA-256 digest of its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

/// Incremental builder for a [`CacheKey`].
pub struct CacheKeyBuilder {
    kind: &'static str,
    hasher: Sha256,
}

impl CacheKey {
    /// Start a key for an operation kind (`"catalog"`, `"on-demand-price"`, ...).
    pub fn builder(kind: &'static str) -> CacheKeyBuilder {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        CacheKeyBuilder { kind, hasher }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CacheKeyBuilder {
    /// Mix one parameter into the key.
    ///
    /// Parts are length-prefixed, so `["ab", "c"]` and `["a", "bc"]`
    /// produce different keys.
    pub fn part(mut self, value: impl AsRef<str>) -> Self {
        let bytes = value.as_ref().as_bytes();
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
        self
    }

    /// Mix an ordered list of parameters into the key.
    pub fn parts<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values: Vec<S> = values.into_iter().collect();
        let mut builder = self.part(values.len().to_string());
        for value in &values {
            builder = builder.part(value);
        }
        builder
    }

    pub fn finish(self) -> CacheKey {
        CacheKey(format!("{}:{}", self.kind, hex::encode(self.hasher.finalize())))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_parts_same_key() {
        let a = CacheKey::builder("catalog").part("us-east-1").finish();
        let b = CacheKey::builder("catalog").part("us-east-1").finish();
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("catalog:"));
        assert_eq!(a.as_str().len(), "catalog:".len() + 64);
    }

    #[test]
    fn kind_and_region_change_key() {
        let catalog = CacheKey::builder("catalog").part("us-east-1").finish();
        let other_region = CacheKey::builder("catalog").part("us-west-2").finish();
        let other_kind = CacheKey::builder("spot-price").part("us-east-1").finish();
        assert_ne!(catalog, other_region);
        assert_ne!(catalog, other_kind);
    }

    #[test]
    fn parts_are_length_prefixed() {
        let a = CacheKey::builder("k").part("ab").part("c").finish();
        let b = CacheKey::builder("k").part("a").part("bc").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn list_boundaries_matter() {
        let a = CacheKey::builder("k").parts(["x", "y"]).part("z").finish();
        let b = CacheKey::builder("k").parts(["x"]).part("y").part("z").finish();
        assert_ne!(a, b);
    }
}
