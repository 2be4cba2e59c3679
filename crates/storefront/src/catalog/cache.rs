//! Cache types for catalog documents.

/// Cache key for catalog documents.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Catalog,
}
