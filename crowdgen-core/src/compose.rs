//! Composition: configuration in, `CompositionPlan` out.
//!
//! `compose` runs selection, argument assembly and fragment generation in one
//! pass, checks the plan invariants, and returns an immutable plan. It performs
//! no I/O and holds no state, so identical input always yields an identical plan.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::assemble::{assemble_arguments, ArgSlice, ArgumentLayout, IndexedParam};
use crate::config::{ConfigError, ConfigFingerprint, Configuration};
use crate::convert::ConvertError;
use crate::fragment::{Fragment, RenderedFragment};
use crate::module::{ModuleDescriptor, ModuleId};
use crate::selector::{generate_fragments, select_modules};

/// Errors that halt composition.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),
    #[error("module {module} needs address role '{role}', which is not configured")]
    MissingAddress { role: String, module: ModuleId },
    /// The module registry produced an inconsistent plan.
    #[error("plan invariant violated: {0}")]
    Invariant(String),
}

/// Everything the template layer needs to emit the contracts and the
/// deployment script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositionPlan {
    pub fingerprint: ConfigFingerprint,
    pub token_modules: Vec<ModuleDescriptor>,
    pub sale_modules: Vec<ModuleDescriptor>,
    #[serde(flatten)]
    pub arguments: ArgumentLayout,
    pub fragments: Vec<Fragment>,
}

/// Build the composition plan for a validated configuration.
pub fn compose(config: &Configuration) -> Result<CompositionPlan, ComposeError> {
    let fingerprint = config.fingerprint()?;
    let selection = select_modules(config)?;
    let arguments = assemble_arguments(&selection.sale_modules);
    let fragments = generate_fragments(config, &selection);

    let plan = CompositionPlan {
        fingerprint,
        token_modules: selection.token_modules,
        sale_modules: selection.sale_modules,
        arguments,
        fragments,
    };
    plan.validate()?;

    info!(
        fingerprint = %plan.fingerprint,
        sale_modules = plan.sale_modules.len(),
        token_modules = plan.token_modules.len(),
        constructor_args = plan.arguments.len(),
        fragments = plan.fragments.len(),
        "composition plan built"
    );
    Ok(plan)
}

impl CompositionPlan {
    pub fn constructor_args(&self) -> &[IndexedParam] {
        &self.arguments.constructor_args
    }

    pub fn module_arg_slices(&self) -> &[ArgSlice] {
        &self.arguments.module_arg_slices
    }

    pub fn sale_ids(&self) -> Vec<ModuleId> {
        self.sale_modules.iter().map(|m| m.id).collect()
    }

    pub fn token_ids(&self) -> Vec<ModuleId> {
        self.token_modules.iter().map(|m| m.id).collect()
    }

    pub fn rendered_fragments(&self) -> Vec<RenderedFragment> {
        self.fragments.iter().map(Fragment::rendered).collect()
    }

    /// Every array name declared by any fragment, in emission order.
    pub fn array_names(&self) -> Vec<&str> {
        self.fragments.iter().flat_map(Fragment::array_names).collect()
    }

    /// Check every structural invariant of the plan.
    pub fn validate(&self) -> Result<(), ComposeError> {
        let invariant = |msg: String| Err(ComposeError::Invariant(msg));

        for (label, modules) in [("token", &self.token_modules), ("sale", &self.sale_modules)] {
            let mut seen = HashSet::new();
            if let Some(dup) = modules.iter().find(|m| !seen.insert(m.id)) {
                return invariant(format!("{} appears twice in {label} modules", dup.id));
            }
        }

        let slice_order: Vec<_> = self.module_arg_slices().iter().map(|s| s.module).collect();
        if slice_order != self.sale_ids() {
            return invariant("argument slices do not follow sale module order".into());
        }
        self.arguments
            .check_partition()
            .map_err(ComposeError::Invariant)?;

        if let Some(arg) = self.constructor_args().iter().find(|a| !a.param.is_consistent()) {
            return invariant(format!(
                "argument {} ({}) carries a literal of the wrong type",
                arg.index, arg.param.source_path
            ));
        }

        let mut names = HashSet::new();
        for fragment in &self.fragments {
            if let Some(name) = fragment.undeclared_references().first() {
                return invariant(format!("{name} is used before it is declared"));
            }
            if let Some(array) = fragment.arrays.iter().find(|a| !a.is_homogeneous()) {
                return invariant(format!("{} mixes element types", array.name));
            }
            for name in fragment.array_names() {
                if !names.insert(name) {
                    return invariant(format!("array name {name} is declared twice"));
                }
            }
        }
        Ok(())
    }
}
