//! End-to-end composition tests.
//!
//! Tests:
//! 1. Static rate, no stages, no limits: two base sale modules, Mintable token
//! 2. Bonus rate with a KYC stage: bonus, KYC and staged modules plus fragments
//! 3. A single purchase limit adds exactly one module and one argument
//! 4. Three lock beneficiaries produce release1..release3 fragments
//! 5. Composing twice yields identical plans
//! 6. The sample input file composes into the full module set
//! 7. Rendered deployment arguments follow the plan's argument table

use std::path::Path;

use crowdgen_core::compose::compose;
use crowdgen_core::config::{Beneficiary, Configuration, Release, StageConfig};
use crowdgen_core::convert::{Address, Amount, Literal, ParamType, Timestamp};
use crowdgen_core::fragment::FragmentKind;
use crowdgen_core::module::ModuleId;
use crowdgen_core::render;

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn base_config() -> Configuration {
    Configuration::from_json_str(
        r#"{
            "token": { "token_type": { "is_minime": false } },
            "sale": {
                "start_time": "2018-02-01 00:00:00",
                "end_time": "2018-03-01 00:00:00",
                "coeff": 1000,
                "max_cap": "4e22",
                "min_cap": "1e21",
                "new_token_owner": "0x557678cf28594495ef4b08a6447726f931f8d787",
                "rate": { "is_static": true, "base_rate": 200 }
            },
            "address": {
                "vault": "0x00000000000000000000000000000000000000a1",
                "token": "0x00000000000000000000000000000000000000a2",
                "kyc": "0x00000000000000000000000000000000000000a3"
            }
        }"#,
    )
    .unwrap()
}

fn stage(start: u64, kyc: bool) -> StageConfig {
    StageConfig {
        start_time: Timestamp(start),
        end_time: Timestamp(start + 86_400),
        cap_ratio: 50,
        max_purchase_limit: Amount::ZERO,
        min_purchase_limit: Amount::ZERO,
        kyc,
    }
}

fn sample_path() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/sample1.json")
}

// ──────────────────────────────────────────────
// Scenarios
// ──────────────────────────────────────────────

#[test]
fn static_rate_selects_only_base_modules() {
    let plan = compose(&base_config()).unwrap();

    assert_eq!(
        plan.sale_ids(),
        [ModuleId::BaseCrowdsale, ModuleId::ZeppelinBaseCrowdsale]
    );
    assert_eq!(plan.token_ids(), [ModuleId::Mintable]);

    let kinds: Vec<_> = plan.fragments.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, [FragmentKind::FundDistribution]);

    // No holders configured: the fragment keeps its shape with empty arrays.
    let rendered = &plan.rendered_fragments()[0];
    assert_eq!(
        rendered.declare_code,
        "const holderAddresses = [];\nconst holderRatios = [];"
    );
    assert_eq!(
        rendered.init_code,
        "await vault.initHolders(holderAddresses, holderRatios);"
    );
}

#[test]
fn bonus_rate_with_kyc_stage() {
    let mut config = base_config();
    config.sale.rate.is_static = false;
    config.sale.rate.bonus_coeff = Amount(1000);
    config.sale.stages = vec![stage(1_517_443_200, false), stage(1_518_048_000, true)];

    let plan = compose(&config).unwrap();
    assert_eq!(
        plan.sale_ids(),
        [
            ModuleId::BaseCrowdsale,
            ModuleId::ZeppelinBaseCrowdsale,
            ModuleId::BonusCrowdsale,
            ModuleId::KycCrowdsale,
            ModuleId::StagedCrowdsale,
        ]
    );

    let kinds: Vec<_> = plan.fragments.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        [
            FragmentKind::FundDistribution,
            FragmentKind::BonusByTime,
            FragmentKind::BonusByAmount,
            FragmentKind::StagedPeriods,
        ]
    );

    let staged = plan
        .fragments
        .iter()
        .find(|f| f.kind == FragmentKind::StagedPeriods)
        .unwrap();
    let kycs = staged.arrays.iter().find(|a| a.name == "periodKycs").unwrap();
    assert_eq!(kycs.elements, [Literal::Bool(false), Literal::Bool(true)]);

    // The staged module's single argument is the stage count.
    let slice = plan.arguments.slice_of(ModuleId::StagedCrowdsale).unwrap();
    let params = plan.arguments.params_for(slice);
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].param.literal, Some(Literal::Uint(2)));
}

#[test]
fn max_purchase_limit_alone_adds_one_argument() {
    let baseline = compose(&base_config()).unwrap();

    let mut config = base_config();
    config.sale.valid_purchase.max_purchase_limit = Amount(100);
    config.sale.valid_purchase.min_purchase_limit = Amount::ZERO;
    let plan = compose(&config).unwrap();

    assert_eq!(
        plan.sale_ids(),
        [
            ModuleId::BaseCrowdsale,
            ModuleId::ZeppelinBaseCrowdsale,
            ModuleId::PurchaseLimitedCrowdsale,
        ]
    );
    assert_eq!(plan.constructor_args().len(), baseline.constructor_args().len() + 1);

    let last = plan.constructor_args().last().unwrap();
    assert_eq!(last.param.ty, ParamType::Uint);
    assert_eq!(last.param.literal, Some(Literal::Uint(100)));
}

#[test]
fn three_beneficiaries_produce_suffixed_lock_fragments() {
    let mut config = base_config();
    config.locker.use_locker = true;
    config.locker.beneficiaries = (1..=3)
        .map(|i| Beneficiary {
            address: Address::new(format!("0x00000000000000000000000000000000000000b{i}")),
            is_straight: i % 2 == 0,
            release: vec![Release {
                release_time: Timestamp(1_530_000_000 + i),
                release_ratio: 100,
            }],
        })
        .collect();

    let plan = compose(&config).unwrap();
    let locks: Vec<_> = plan
        .fragments
        .iter()
        .filter(|f| matches!(f.kind, FragmentKind::TokenLock { .. }))
        .collect();
    assert_eq!(locks.len(), 3);

    for (i, lock) in locks.iter().enumerate() {
        let n = i + 1;
        assert_eq!(lock.kind, FragmentKind::TokenLock { beneficiary: n });
        assert_eq!(
            lock.array_names().collect::<Vec<_>>(),
            [format!("release{n}Times"), format!("release{n}Ratios")]
        );
        assert!(lock.init_code().starts_with("await locker.lock("));
    }
}

// ──────────────────────────────────────────────
// Determinism and file input
// ──────────────────────────────────────────────

#[test]
fn composition_is_idempotent() {
    let config = Configuration::from_file(&sample_path()).unwrap();
    let first = compose(&config).unwrap();
    let second = compose(&config).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn sample_file_selects_every_configured_module() {
    let config = Configuration::from_file(&sample_path()).unwrap();
    assert_eq!(config.sale.start_time, Timestamp(1_517_443_200));
    assert_eq!(config.sale.end_time, Timestamp(1_519_862_400));

    let plan = compose(&config).unwrap();
    assert_eq!(plan.token_ids(), [ModuleId::Mintable, ModuleId::BurnableToken]);
    assert_eq!(
        plan.sale_ids(),
        [
            ModuleId::BaseCrowdsale,
            ModuleId::ZeppelinBaseCrowdsale,
            ModuleId::BonusCrowdsale,
            ModuleId::PurchaseLimitedCrowdsale,
            ModuleId::MinimumPaymentCrowdsale,
            ModuleId::BlockIntervalCrowdsale,
            ModuleId::KycCrowdsale,
            ModuleId::StagedCrowdsale,
        ]
    );
    assert_eq!(plan.constructor_args().len(), 15);
    assert_eq!(plan.fragments.len(), 6);
    assert_eq!(
        plan.array_names().iter().filter(|n| n.starts_with("release")).count(),
        4
    );
    assert_eq!(plan.fingerprint, config.fingerprint().unwrap());
}

#[test]
fn rendered_constructor_matches_argument_table() {
    let config = Configuration::from_file(&sample_path()).unwrap();
    let plan = compose(&config).unwrap();

    let calls = render::super_constructor_calls(&plan.arguments);
    assert_eq!(calls.len(), plan.sale_modules.len());
    assert_eq!(
        calls[0],
        "BaseCrowdsale(start_time, end_time, base_rate, coeff, max_cap, min_cap, vault, new_token_owner)"
    );
    assert_eq!(calls[1], "ZeppelinBaseCrowdsale(token)");
    assert_eq!(calls[6], "KYCCrowdsale(kyc)");

    let deploy = render::deploy_arg_list(&plan.arguments);
    assert_eq!(deploy.len(), 15);
    assert_eq!(deploy[6], "parseAddress(args[6])");
    assert_eq!(deploy[14], "parseUint(args[14])");

    assert_eq!(
        render::inheritance_list(&plan.token_modules),
        "Mintable, BurnableToken"
    );
}

#[test]
fn deploy_arguments_parse_against_plan() {
    let plan = compose(&base_config()).unwrap();
    let raw: Vec<String> = plan
        .constructor_args()
        .iter()
        .map(|a| a.param.literal.as_ref().unwrap().to_string())
        .collect();
    let parsed = plan.arguments.parse_deploy_args(&raw).unwrap();
    let expected: Vec<_> = plan
        .constructor_args()
        .iter()
        .map(|a| a.param.literal.clone().unwrap())
        .collect();
    assert_eq!(parsed, expected);
}
