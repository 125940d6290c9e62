//! Module selector: one declarative registry, iterated once.
//!
//! Each row is `{id, predicate, param factory, optional fragment factory}`.
//! Row order is the dependency order: it fixes the inheritance list, the order
//! base constructors run in, and therefore the order of deployment arguments.
//! Adding a module means adding a row.

use tracing::debug;

use crate::compose::ComposeError;
use crate::config::Configuration;
use crate::convert::{Address, Literal};
use crate::fragment::{self, Fragment};
use crate::module::{ModuleDescriptor, ModuleId, ParamSpec};

pub type Predicate = fn(&Configuration) -> bool;
pub type ParamFactory = fn(&Configuration) -> Result<Vec<ParamSpec>, ComposeError>;
pub type FragmentFactory = fn(&Configuration) -> Vec<Fragment>;

/// A module the selector may include.
pub struct RegistryRow {
    pub id: ModuleId,
    pub applies: Predicate,
    pub params: ParamFactory,
    pub fragments: Option<FragmentFactory>,
}

/// A batch-data feature that is not tied to a sale module.
pub struct FeatureRow {
    pub name: &'static str,
    pub applies: Predicate,
    pub fragments: FragmentFactory,
}

// ─── Registries ─────────────────────────────────────────────────────

pub static SALE_REGISTRY: &[RegistryRow] = &[
    RegistryRow {
        id: ModuleId::BaseCrowdsale,
        applies: always,
        params: base_crowdsale_params,
        fragments: Some(fund_distribution),
    },
    RegistryRow {
        id: ModuleId::MiniMeBaseCrowdsale,
        applies: is_minime,
        params: token_base_params,
        fragments: None,
    },
    RegistryRow {
        id: ModuleId::ZeppelinBaseCrowdsale,
        applies: is_zeppelin,
        params: token_base_params,
        fragments: None,
    },
    RegistryRow {
        id: ModuleId::BonusCrowdsale,
        applies: has_bonus_rate,
        params: bonus_params,
        fragments: Some(fragment::bonus_curves),
    },
    RegistryRow {
        id: ModuleId::PurchaseLimitedCrowdsale,
        applies: has_max_purchase_limit,
        params: purchase_limit_params,
        fragments: None,
    },
    RegistryRow {
        id: ModuleId::MinimumPaymentCrowdsale,
        applies: has_min_purchase_limit,
        params: minimum_payment_params,
        fragments: None,
    },
    RegistryRow {
        id: ModuleId::BlockIntervalCrowdsale,
        applies: has_block_interval,
        params: block_interval_params,
        fragments: None,
    },
    RegistryRow {
        id: ModuleId::KycCrowdsale,
        applies: has_kyc_stage,
        params: kyc_params,
        fragments: None,
    },
    RegistryRow {
        id: ModuleId::StagedCrowdsale,
        applies: has_stages,
        params: staged_params,
        fragments: Some(staged_periods),
    },
];

pub static TOKEN_REGISTRY: &[RegistryRow] = &[
    RegistryRow {
        id: ModuleId::MiniMeToken,
        applies: is_minime,
        params: no_params,
        fragments: None,
    },
    RegistryRow {
        id: ModuleId::Mintable,
        applies: is_zeppelin,
        params: no_params,
        fragments: None,
    },
    RegistryRow {
        id: ModuleId::BurnableToken,
        applies: is_burnable,
        params: no_params,
        fragments: None,
    },
    RegistryRow {
        id: ModuleId::Pausable,
        applies: is_pausable,
        params: no_params,
        fragments: None,
    },
];

pub static FEATURE_REGISTRY: &[FeatureRow] = &[FeatureRow {
    name: "token_lock",
    applies: uses_locker,
    fragments: fragment::token_locks,
}];

// ─── Predicates ─────────────────────────────────────────────────────

fn always(_: &Configuration) -> bool {
    true
}

fn is_minime(config: &Configuration) -> bool {
    config.token.token_type.is_minime
}

fn is_zeppelin(config: &Configuration) -> bool {
    !config.token.token_type.is_minime
}

// MiniMe is exclusive: token options only apply to the Zeppelin family.
fn is_burnable(config: &Configuration) -> bool {
    is_zeppelin(config) && config.token.token_option.burnable
}

fn is_pausable(config: &Configuration) -> bool {
    is_zeppelin(config) && config.token.token_option.pausable
}

fn has_bonus_rate(config: &Configuration) -> bool {
    !config.sale.rate.is_static
}

fn has_max_purchase_limit(config: &Configuration) -> bool {
    config.sale.valid_purchase.max_purchase_limit.is_positive()
}

fn has_min_purchase_limit(config: &Configuration) -> bool {
    config.sale.valid_purchase.min_purchase_limit.is_positive()
}

fn has_block_interval(config: &Configuration) -> bool {
    config.sale.valid_purchase.block_interval > 0
}

fn has_stages(config: &Configuration) -> bool {
    !config.sale.stages.is_empty()
}

fn has_kyc_stage(config: &Configuration) -> bool {
    has_stages(config) && config.requires_kyc()
}

fn uses_locker(config: &Configuration) -> bool {
    config.locker.use_locker
}

// ─── Param factories ────────────────────────────────────────────────

fn require_address(
    config: &Configuration,
    role: &str,
    module: ModuleId,
) -> Result<Address, ComposeError> {
    config
        .address_of(role)
        .cloned()
        .ok_or_else(|| ComposeError::MissingAddress {
            role: role.to_string(),
            module,
        })
}

fn no_params(_: &Configuration) -> Result<Vec<ParamSpec>, ComposeError> {
    Ok(Vec::new())
}

fn base_crowdsale_params(config: &Configuration) -> Result<Vec<ParamSpec>, ComposeError> {
    let sale = &config.sale;
    Ok(vec![
        ParamSpec::resolved("input.sale.start_time", sale.start_time),
        ParamSpec::resolved("input.sale.end_time", sale.end_time),
        ParamSpec::resolved("input.sale.rate.base_rate", sale.rate.base_rate),
        ParamSpec::resolved("input.sale.coeff", sale.coeff),
        ParamSpec::resolved("input.sale.max_cap", sale.max_cap),
        ParamSpec::resolved("input.sale.min_cap", sale.min_cap),
        ParamSpec::resolved(
            "address.vault",
            require_address(config, "vault", ModuleId::BaseCrowdsale)?,
        ),
        ParamSpec::resolved("input.sale.new_token_owner", sale.new_token_owner.clone()),
    ])
}

/// Shared by the MiniMe and Zeppelin flavoured bases.
fn token_base_params(config: &Configuration) -> Result<Vec<ParamSpec>, ComposeError> {
    let module = if is_minime(config) {
        ModuleId::MiniMeBaseCrowdsale
    } else {
        ModuleId::ZeppelinBaseCrowdsale
    };
    Ok(vec![ParamSpec::resolved(
        "address.token",
        require_address(config, "token", module)?,
    )])
}

fn bonus_params(config: &Configuration) -> Result<Vec<ParamSpec>, ComposeError> {
    Ok(vec![ParamSpec::resolved(
        "input.sale.rate.bonus_coeff",
        config.sale.rate.bonus_coeff,
    )])
}

fn purchase_limit_params(config: &Configuration) -> Result<Vec<ParamSpec>, ComposeError> {
    Ok(vec![ParamSpec::resolved(
        "input.sale.valid_purchase.max_purchase_limit",
        config.sale.valid_purchase.max_purchase_limit,
    )])
}

fn minimum_payment_params(config: &Configuration) -> Result<Vec<ParamSpec>, ComposeError> {
    Ok(vec![ParamSpec::resolved(
        "input.sale.valid_purchase.min_purchase_limit",
        config.sale.valid_purchase.min_purchase_limit,
    )])
}

fn block_interval_params(config: &Configuration) -> Result<Vec<ParamSpec>, ComposeError> {
    Ok(vec![ParamSpec::resolved(
        "input.sale.valid_purchase.block_interval",
        config.sale.valid_purchase.block_interval,
    )])
}

fn kyc_params(config: &Configuration) -> Result<Vec<ParamSpec>, ComposeError> {
    Ok(vec![ParamSpec::resolved(
        "address.kyc",
        require_address(config, "kyc", ModuleId::KycCrowdsale)?,
    )])
}

fn staged_params(config: &Configuration) -> Result<Vec<ParamSpec>, ComposeError> {
    Ok(vec![ParamSpec::resolved(
        "input.sale.stages_length",
        Literal::Uint(config.sale.stages.len() as u128),
    )])
}

// ─── Fragment adapters ──────────────────────────────────────────────

fn fund_distribution(config: &Configuration) -> Vec<Fragment> {
    vec![fragment::fund_distribution(config)]
}

fn staged_periods(config: &Configuration) -> Vec<Fragment> {
    vec![fragment::staged_periods(config)]
}

// ─── Selection ──────────────────────────────────────────────────────

/// Ordered module lists for both generated contracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSelection {
    pub token_modules: Vec<ModuleDescriptor>,
    pub sale_modules: Vec<ModuleDescriptor>,
}

impl ModuleSelection {
    pub fn sale_ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.sale_modules.iter().map(|m| m.id)
    }

    pub fn token_ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.token_modules.iter().map(|m| m.id)
    }

    pub fn has_sale_module(&self, id: ModuleId) -> bool {
        self.sale_modules.iter().any(|m| m.id == id)
    }
}

fn select_from(
    registry: &[RegistryRow],
    config: &Configuration,
) -> Result<Vec<ModuleDescriptor>, ComposeError> {
    registry
        .iter()
        .filter(|row| (row.applies)(config))
        .map(|row| {
            let params = (row.params)(config)?;
            debug!(module = %row.id, params = params.len(), "module selected");
            Ok(ModuleDescriptor::new(row.id, params))
        })
        .collect()
}

/// Evaluate every registry predicate, in registry order.
pub fn select_modules(config: &Configuration) -> Result<ModuleSelection, ComposeError> {
    Ok(ModuleSelection {
        token_modules: select_from(TOKEN_REGISTRY, config)?,
        sale_modules: select_from(SALE_REGISTRY, config)?,
    })
}

/// Batch fragments for every selected module, then for standalone features.
///
/// Counters used for naming are local to each factory, so repeated features
/// never share a suffix sequence.
pub fn generate_fragments(config: &Configuration, selection: &ModuleSelection) -> Vec<Fragment> {
    let module_fragments = SALE_REGISTRY
        .iter()
        .filter(|row| selection.has_sale_module(row.id))
        .filter_map(|row| row.fragments)
        .flat_map(|factory| factory(config));

    let feature_fragments = FEATURE_REGISTRY
        .iter()
        .filter(|row| (row.applies)(config))
        .flat_map(|row| {
            debug!(feature = row.name, "feature fragments requested");
            (row.fragments)(config)
        });

    module_fragments
        .chain(feature_fragments)
        .inspect(|f| debug!(kind = ?f.kind, arrays = f.arrays.len(), "fragment generated"))
        .collect()
}
