//! External collaborator interfaces the core consumes but never implements.
//!
//! The core holds no process-global state (no ambient logger, no ambient
//! config): a config lookup and an ignore predicate are passed in explicitly
//! by the caller wherever one is needed, matching the "no shared mutable
//! state, no global singletons" stance the rest of this crate takes.

/// A pure `key -> value?` lookup, used only to read a handful of
/// well-known keys (`user.name`, `user.email`, `init.defaultBranch`,
/// `core.ignorecase`). The core treats any other key as opaque to it.
pub trait ConfigLookup {
    /// Looks up `key`, returning `None` if unset.
    fn get(&self, key: &str) -> Option<String>;
}

impl<F> ConfigLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// A config lookup that never has anything set, for callers with no
/// configuration source of their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConfig;

impl ConfigLookup for NoConfig {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
}

/// A pure predicate deciding whether a repository-relative path is ignored.
/// The core never interprets ignore syntax itself — see the Open Question
/// on glob-engine choice — it only ever asks this predicate.
pub trait IgnoreFilter {
    /// Returns `true` if `path` (a directory, if `is_dir`) should be
    /// excluded from working-directory scans.
    fn is_ignored(&self, path: &str, is_dir: bool) -> bool;
}

impl<F> IgnoreFilter for F
where
    F: Fn(&str, bool) -> bool,
{
    fn is_ignored(&self, path: &str, is_dir: bool) -> bool {
        self(path, is_dir)
    }
}

/// An ignore filter that never excludes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIgnores;

impl IgnoreFilter for NoIgnores {
    fn is_ignored(&self, _path: &str, _is_dir: bool) -> bool {
        false
    }
}
