//! Crowdgen Core: deterministic composition engine for token-sale contracts.
//!
//! Given a validated sale configuration, this crate decides:
//! - which reusable modules the token and sale contracts inherit, in order
//! - the flat outer-constructor argument list and each module's slice of it
//! - the batch-initialization fragments (arrays + calls) the deploy script runs
//! - how raw values become typed literals (`uint`, `address`, `bool`)
//!
//! Everything is a pure function of the configuration. Text only appears at
//! the `render` boundary.

pub mod assemble;
pub mod compose;
pub mod config;
pub mod convert;
pub mod fragment;
pub mod module;
pub mod render;
pub mod selector;

pub use compose::{compose, ComposeError, CompositionPlan};
pub use config::Configuration;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: plans can be built on one thread and read on another.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<config::Configuration>();
        require_sync::<config::Configuration>();
        require_send::<compose::CompositionPlan>();
        require_sync::<compose::CompositionPlan>();
        require_send::<compose::ComposeError>();
        require_sync::<compose::ComposeError>();
        require_send::<fragment::Fragment>();
        require_sync::<fragment::Fragment>();
        require_send::<convert::Literal>();
        require_sync::<convert::Literal>();
        require_sync::<selector::RegistryRow>();
    }

    /// Each registry only lists modules for the contract it builds, and
    /// between them they cover every module.
    #[test]
    fn registries_match_module_targets() {
        use module::{ModuleId, ModuleTarget};

        assert!(selector::SALE_REGISTRY
            .iter()
            .all(|row| row.id.target() == ModuleTarget::Sale));
        assert!(selector::TOKEN_REGISTRY
            .iter()
            .all(|row| row.id.target() == ModuleTarget::Token));

        let mut listed: Vec<ModuleId> = selector::SALE_REGISTRY
            .iter()
            .chain(selector::TOKEN_REGISTRY)
            .map(|row| row.id)
            .collect();
        listed.sort();
        let mut all = ModuleId::ALL.to_vec();
        all.sort();
        assert_eq!(listed, all);
    }
}
