use std::path::PathBuf;

use ipn_repo::{InitOptions, RepoConfig};

/// How [`Node::create`](crate::Node::create) sets a node up.
#[derive(Clone, Debug)]
pub struct NodeOptions {
    /// Repository root directory.
    pub repo: PathBuf,
    /// Initialize the repository if it is not initialized yet.
    pub init: bool,
    /// Start the node once created.
    pub start: bool,
    pub init_options: InitOptions,
    /// Config written at init; the identity section is always generated.
    pub config: Option<RepoConfig>,
}

impl NodeOptions {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: RepoConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_init_options(mut self, init_options: InitOptions) -> Self {
        self.init_options = init_options;
        self
    }

    /// Create the node without initializing or starting it.
    pub fn offline(mut self) -> Self {
        self.init = false;
        self.start = false;
        self
    }
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            repo: PathBuf::from(".ipn"),
            init: true,
            start: true,
            init_options: InitOptions::default(),
            config: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_init_and_start() {
        let opts = NodeOptions::new("/tmp/node");
        assert_eq!(opts.repo, PathBuf::from("/tmp/node"));
        assert!(opts.init && opts.start);
        assert!(opts.config.is_none());

        let opts = opts.offline();
        assert!(!opts.init && !opts.start);
    }
}
