//! Module descriptors: the closed set of reusable contract modules and their
//! constructor parameter specs.
//!
//! Selection logic works on `ModuleId` only. Contract names and import
//! statements are resolved at the template boundary (see `render`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::convert::{Literal, ParamType};

/// Which generated contract a module is mixed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleTarget {
    Token,
    Sale,
}

/// Every module the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModuleId {
    // Sale
    BaseCrowdsale,
    MiniMeBaseCrowdsale,
    ZeppelinBaseCrowdsale,
    BonusCrowdsale,
    PurchaseLimitedCrowdsale,
    MinimumPaymentCrowdsale,
    BlockIntervalCrowdsale,
    KycCrowdsale,
    StagedCrowdsale,
    // Token
    MiniMeToken,
    Mintable,
    BurnableToken,
    Pausable,
}

impl ModuleId {
    pub const ALL: [ModuleId; 13] = [
        Self::BaseCrowdsale,
        Self::MiniMeBaseCrowdsale,
        Self::ZeppelinBaseCrowdsale,
        Self::BonusCrowdsale,
        Self::PurchaseLimitedCrowdsale,
        Self::MinimumPaymentCrowdsale,
        Self::BlockIntervalCrowdsale,
        Self::KycCrowdsale,
        Self::StagedCrowdsale,
        Self::MiniMeToken,
        Self::Mintable,
        Self::BurnableToken,
        Self::Pausable,
    ];

    pub const fn target(self) -> ModuleTarget {
        match self {
            Self::MiniMeToken | Self::Mintable | Self::BurnableToken | Self::Pausable => {
                ModuleTarget::Token
            }
            _ => ModuleTarget::Sale,
        }
    }

    /// Location of the module source, relative to the generated contracts directory.
    pub const fn import_ref(self) -> ImportRef {
        ImportRef(match self {
            Self::BaseCrowdsale => "base/crowdsale/BaseCrowdsale.sol",
            Self::MiniMeBaseCrowdsale => "base/crowdsale/MiniMeBaseCrowdsale.sol",
            Self::ZeppelinBaseCrowdsale => "base/crowdsale/ZeppelinBaseCrowdsale.sol",
            Self::BonusCrowdsale => "base/crowdsale/BonusCrowdsale.sol",
            Self::PurchaseLimitedCrowdsale => "base/crowdsale/PurchaseLimitedCrowdsale.sol",
            Self::MinimumPaymentCrowdsale => "base/crowdsale/MinimumPaymentCrowdsale.sol",
            Self::BlockIntervalCrowdsale => "base/crowdsale/BlockIntervalCrowdsale.sol",
            Self::KycCrowdsale => "base/crowdsale/KYCCrowdsale.sol",
            Self::StagedCrowdsale => "base/crowdsale/StagedCrowdsale.sol",
            Self::MiniMeToken => "base/minime/MiniMeToken.sol",
            Self::Mintable => "base/zeppelin/token/Mintable.sol",
            Self::BurnableToken => "base/zeppelin/token/BurnableToken.sol",
            Self::Pausable => "base/zeppelin/lifecycle/Pausable.sol",
        })
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Opaque reference to a module's source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ImportRef(pub &'static str);

impl ImportRef {
    pub const fn path(self) -> &'static str {
        self.0
    }
}

/// One constructor parameter owned by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub ty: ParamType,
    /// Dotted reference into the configuration document (`input.sale.max_cap`,
    /// `address.vault`). Used for documentation and argument naming.
    pub source_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<Literal>,
}

impl ParamSpec {
    pub fn new(ty: ParamType, source_path: impl Into<String>) -> Self {
        Self {
            ty,
            source_path: source_path.into(),
            literal: None,
        }
    }

    /// A spec whose type is taken from an already-resolved literal.
    pub fn resolved(source_path: impl Into<String>, literal: impl Into<Literal>) -> Self {
        let literal = literal.into();
        Self {
            ty: literal.param_type(),
            source_path: source_path.into(),
            literal: Some(literal),
        }
    }

    /// Last segment of the source path (`input.sale.max_cap` → `max_cap`).
    pub fn arg_name(&self) -> &str {
        self.source_path
            .rsplit('.')
            .next()
            .unwrap_or(&self.source_path)
    }

    /// False if a resolved literal disagrees with the declared type.
    pub fn is_consistent(&self) -> bool {
        self.literal
            .as_ref()
            .map_or(true, |lit| lit.param_type() == self.ty)
    }
}

/// A selected module with its constructor parameters, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    pub id: ModuleId,
    pub import_ref: ImportRef,
    pub constructor_params: Vec<ParamSpec>,
}

impl ModuleDescriptor {
    pub fn new(id: ModuleId, constructor_params: Vec<ParamSpec>) -> Self {
        Self {
            id,
            import_ref: id.import_ref(),
            constructor_params,
        }
    }

    pub fn param_count(&self) -> usize {
        self.constructor_params.len()
    }
}
