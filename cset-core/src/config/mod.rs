mod cset_config;

pub use cset_config::{CsetConfig, HgCacheConfig};
