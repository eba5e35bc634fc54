//! Tenancy: directory lookups, host resolution, canonical URLs

mod canonical;
mod directory;
mod resolver;

pub use canonical::canonical_base;
pub use directory::{
    keys as directory_keys, CachedDirectory, DirectoryCache, TenantDirectory, TenantSnapshot,
};
pub use resolver::{HostResolution, HostResolver, MatchKind};
