//! Well-known framework names the cache generator recognizes.

/// Singular cache-get marker.
pub const CACHEABLE: &str = "cachet.annotation.Cacheable";
/// Aggregate (repeatable container) form of [`CACHEABLE`].
pub const CACHEABLES: &str = "cachet.annotation.Cacheables";
/// Singular cache-put marker.
pub const CACHE_PUT: &str = "cachet.annotation.CachePut";
/// Aggregate form of [`CACHE_PUT`].
pub const CACHE_PUTS: &str = "cachet.annotation.CachePuts";
/// Singular cache-invalidate marker.
pub const CACHE_INVALIDATE: &str = "cachet.annotation.CacheInvalidate";
/// Aggregate form of [`CACHE_INVALIDATE`].
pub const CACHE_INVALIDATES: &str = "cachet.annotation.CacheInvalidates";

/// Generic mapping annotation used to point at an explicit mapper.
pub const MAPPING: &str = "cachet.annotation.Mapping";

/// Synchronous cache contract supertype, `Cache<K, V>`.
pub const CACHE: &str = "cachet.cache.Cache";
/// Async-capable cache contract supertype, `AsyncCache<K, V>`.
pub const ASYNC_CACHE: &str = "cachet.cache.AsyncCache";

/// Largest supported key-mapper arity. The mapper interface family is
/// generated up to 9 type parameters.
pub const MAX_KEY_ARITY: usize = 9;

const KEY_MAPPER_PREFIX: &str = "cachet.cache.mapper.CacheKeyMapper";

/// Qualified name of the N-ary key-mapper interface, `1..=9`.
pub fn key_mapper_name(arity: usize) -> Option<String> {
    if (1..=MAX_KEY_ARITY).contains(&arity) {
        Some(format!("{}{}", KEY_MAPPER_PREFIX, arity))
    } else {
        None
    }
}

/// Inverse of [`key_mapper_name`]: arity of a key-mapper interface name.
pub fn key_mapper_arity(name: &str) -> Option<usize> {
    let digits = name.strip_prefix(KEY_MAPPER_PREFIX)?;
    let arity: usize = digits.parse().ok()?;
    if (1..=MAX_KEY_ARITY).contains(&arity) {
        Some(arity)
    } else {
        None
    }
}
