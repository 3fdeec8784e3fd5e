//! A pattern-matching core for rule-based modeling over a typed,
//! attributed entity graph.
//!
//! ## Pipeline
//!
//! ```text
//! Entities + constraint source
//!     ↓
//! [GraphContainer::build]      → connected, uniquely-id'd entity graph
//!     ↓
//! [Pattern::build]             → literal-attr stripping, constraint parsing,
//!                                 namespace verification, canonical labeling
//!     ↓
//! [Network::add_pattern]       → incremental discrimination network insertion
//!     ↓
//! Matcher-held network, ready for token propagation
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use wc_rules_matcher::entity::Entity;
//! use wc_rules_matcher::pattern::{ParentSource, Pattern};
//! use wc_rules_matcher::Matcher;
//!
//! let x = Entity::new("x", "X");
//! let pattern = Pattern::build(
//!     ParentSource::Entity { entities: vec![x], seed_id: "x".to_string() },
//!     "",
//! ).unwrap();
//!
//! let mut matcher = Matcher::new(0);
//! matcher.register(pattern).unwrap();
//! ```

pub mod canonical;
pub mod config;
pub mod entity;
pub mod error;
pub mod expr;
pub mod graph_container;
pub mod id;
pub mod indexer;
pub mod pattern;
pub mod rete;
pub mod slicer;
pub mod token;
pub mod value;

pub use config::MatcherConfig;
pub use error::{MatchError, MatchResult};
pub use id::IdGenerator;
pub use pattern::Pattern;
pub use rete::Network;

/// Installs a process-wide `tracing` subscriber honoring `config.logging`
/// (`RUST_LOG`-style `EnvFilter` seeded from the configured level). Meant
/// for binaries embedding this crate; a no-op if a subscriber is already
/// installed.
pub fn init_tracing(config: &config::LoggingConfig) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::instrument;

/// Owns the discrimination network and id generator, and tracks compiled
/// patterns by the pattern-local names assigned at registration.
pub struct Matcher {
    network: Network,
    ids: IdGenerator,
    patterns: BTreeMap<String, Rc<Pattern>>,
}

impl Matcher {
    pub fn new(id_seed: u64) -> Self {
        Matcher {
            network: Network::new(),
            ids: IdGenerator::new(id_seed),
            patterns: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &MatcherConfig) -> Self {
        Self::new(config.id_seed)
    }

    pub fn next_id(&mut self) -> String {
        self.ids.next_id()
    }

    /// Compiles and inserts a pattern into the network, returning the name
    /// it was registered under.
    #[instrument(skip(self, pattern))]
    pub fn register(&mut self, pattern: Pattern) -> MatchResult<String> {
        let name = self.next_id();
        let pattern = Rc::new(pattern);
        tracing::debug!(pattern = %name, vars = pattern.variable_names().len(), "compiling pattern into network");
        self.network.add_pattern(&name, &pattern)?;
        self.patterns.insert(name.clone(), pattern);
        tracing::info!(pattern = %name, "pattern registered");
        Ok(name)
    }

    pub fn pattern(&self, name: &str) -> Option<&Pattern> {
        self.patterns.get(name).map(Rc::as_ref)
    }

    /// Clones the `Rc` a registered pattern is held under, for building a
    /// child pattern (`ParentSource::Pattern`) that references it as a
    /// helper.
    pub fn pattern_rc(&self, name: &str) -> Option<Rc<Pattern>> {
        self.patterns.get(name).cloned()
    }

    pub fn network(&self) -> &Network {
        &self.network
    }
}
