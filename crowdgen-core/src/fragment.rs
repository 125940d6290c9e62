//! Batch fragments: paired declare/initialize units for array-shaped data.
//!
//! A `Fragment` is structured: named, typed arrays plus one call site that
//! references them. Code text is produced by `render`, which always emits
//! every declaration before the call.
//!
//! Feature factories:
//! - `fund_distribution`: ether holders → `vault.initHolders`
//! - `bonus_curves`: time-keyed and amount-keyed bonus stages (two fragments)
//! - `staged_periods`: six parallel per-stage arrays → `crowdsale.initPeriods`
//! - `token_locks`: one fragment per beneficiary with `release{N}*` arrays

use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::convert::{Literal, ParamType};
use crate::render;

/// Which feature a fragment initializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "feature", rename_all = "snake_case")]
pub enum FragmentKind {
    FundDistribution,
    BonusByTime,
    BonusByAmount,
    StagedPeriods,
    /// 1-indexed beneficiary position.
    TokenLock { beneficiary: usize },
}

/// A named array of literals of a single type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchArray {
    pub name: String,
    pub element_type: ParamType,
    pub elements: Vec<Literal>,
}

impl BatchArray {
    pub fn new<I, T>(name: impl Into<String>, element_type: ParamType, elements: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Literal>,
    {
        Self {
            name: name.into(),
            element_type,
            elements: elements.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_homogeneous(&self) -> bool {
        self.elements
            .iter()
            .all(|e| e.param_type() == self.element_type)
    }
}

/// Argument of an initialization call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CallArg {
    /// Reference to an array declared by the same fragment.
    Array(String),
    Value(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    /// Deployed instance the call is made on (`vault`, `crowdsale`, `locker`).
    pub receiver: String,
    pub entry_point: String,
    pub args: Vec<CallArg>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub arrays: Vec<BatchArray>,
    pub call: CallSite,
}

impl Fragment {
    pub fn new(kind: FragmentKind, receiver: &str, entry_point: &str) -> Self {
        Self {
            kind,
            arrays: Vec::new(),
            call: CallSite {
                receiver: receiver.to_string(),
                entry_point: entry_point.to_string(),
                args: Vec::new(),
            },
        }
    }

    /// Declare an array and pass it as the next call argument.
    pub fn with_array(mut self, array: BatchArray) -> Self {
        self.call.args.push(CallArg::Array(array.name.clone()));
        self.arrays.push(array);
        self
    }

    /// Pass a literal as the next call argument.
    pub fn with_value(mut self, value: impl Into<Literal>) -> Self {
        self.call.args.push(CallArg::Value(value.into()));
        self
    }

    pub fn array_names(&self) -> impl Iterator<Item = &str> {
        self.arrays.iter().map(|a| a.name.as_str())
    }

    /// Names referenced by the call but not declared by this fragment.
    pub fn undeclared_references(&self) -> Vec<&str> {
        self.call
            .args
            .iter()
            .filter_map(|arg| match arg {
                CallArg::Array(name) if !self.arrays.iter().any(|a| &a.name == name) => {
                    Some(name.as_str())
                }
                _ => None,
            })
            .collect()
    }

    pub fn declare_code(&self) -> String {
        render::declare_code(self)
    }

    pub fn init_code(&self) -> String {
        render::init_code(self)
    }

    pub fn rendered(&self) -> RenderedFragment {
        RenderedFragment {
            kind: self.kind,
            declare_code: self.declare_code(),
            init_code: self.init_code(),
        }
    }
}

/// Code text of a fragment, as handed to the template layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFragment {
    pub kind: FragmentKind,
    pub declare_code: String,
    pub init_code: String,
}

// ─── Feature factories ──────────────────────────────────────────────

pub fn fund_distribution(config: &Configuration) -> Fragment {
    let holders = &config.sale.distribution.ether;
    Fragment::new(FragmentKind::FundDistribution, "vault", "initHolders")
        .with_array(BatchArray::new(
            "holderAddresses",
            ParamType::Address,
            holders.iter().map(|h| h.holder.clone()),
        ))
        .with_array(BatchArray::new(
            "holderRatios",
            ParamType::Uint,
            holders.iter().map(|h| h.ratio),
        ))
}

pub fn bonus_curves(config: &Configuration) -> Vec<Fragment> {
    let bonus = &config.sale.rate.bonus;
    let by_time = Fragment::new(FragmentKind::BonusByTime, "crowdsale", "setBonusesForTimes")
        .with_array(BatchArray::new(
            "bonusTimeStages",
            ParamType::Uint,
            bonus.time_bonuses.iter().map(|b| b.bonus_time_stage),
        ))
        .with_array(BatchArray::new(
            "bonusTimeRatios",
            ParamType::Uint,
            bonus.time_bonuses.iter().map(|b| b.bonus_time_ratio),
        ));
    let by_amount = Fragment::new(
        FragmentKind::BonusByAmount,
        "crowdsale",
        "setBonusesForAmounts",
    )
    .with_array(BatchArray::new(
        "bonusAmountStages",
        ParamType::Uint,
        bonus.amount_bonuses.iter().map(|b| b.bonus_amount_stage),
    ))
    .with_array(BatchArray::new(
        "bonusAmountRatios",
        ParamType::Uint,
        bonus.amount_bonuses.iter().map(|b| b.bonus_amount_ratio),
    ));
    vec![by_time, by_amount]
}

pub fn staged_periods(config: &Configuration) -> Fragment {
    let stages = &config.sale.stages;
    let column = |name: &str, ty: ParamType, f: fn(&crate::config::StageConfig) -> Literal| {
        BatchArray::new(name, ty, stages.iter().map(f))
    };
    Fragment::new(FragmentKind::StagedPeriods, "crowdsale", "initPeriods")
        .with_array(column("periodStartTimes", ParamType::Uint, |s| {
            s.start_time.into()
        }))
        .with_array(column("periodEndTimes", ParamType::Uint, |s| {
            s.end_time.into()
        }))
        .with_array(column("periodCapRatios", ParamType::Uint, |s| {
            s.cap_ratio.into()
        }))
        .with_array(column("periodMaxPurchaseLimits", ParamType::Uint, |s| {
            s.max_purchase_limit.into()
        }))
        .with_array(column("periodMinPurchaseLimits", ParamType::Uint, |s| {
            s.min_purchase_limit.into()
        }))
        .with_array(column("periodKycs", ParamType::Bool, |s| s.kyc.into()))
}

/// One fragment per beneficiary; array names carry the beneficiary's 1-based position.
pub fn token_locks(config: &Configuration) -> Vec<Fragment> {
    config
        .locker
        .beneficiaries
        .iter()
        .enumerate()
        .map(|(i, beneficiary)| {
            let n = i + 1;
            Fragment::new(FragmentKind::TokenLock { beneficiary: n }, "locker", "lock")
                .with_value(beneficiary.address.clone())
                .with_value(beneficiary.is_straight)
                .with_array(BatchArray::new(
                    format!("release{n}Times"),
                    ParamType::Uint,
                    beneficiary.release.iter().map(|r| r.release_time),
                ))
                .with_array(BatchArray::new(
                    format!("release{n}Ratios"),
                    ParamType::Uint,
                    beneficiary.release.iter().map(|r| r.release_ratio),
                ))
        })
        .collect()
}
