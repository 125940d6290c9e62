//! Template boundary: turns identifiers and structured fragments into text.
//!
//! Nothing upstream of this module handles contract names, import statements
//! or code strings. Output forms:
//! - contract names / `import "./…";` statements / inheritance lists
//! - typed outer-constructor parameter list and per-parent forwarding calls
//! - deployment-script argument expressions (`parseUint(args[3])`)
//! - fragment declarations (`const name = [..];`) and calls (`await r.f(..);`)

use crate::assemble::{ArgSlice, ArgumentLayout, IndexedParam};
use crate::convert::ParamType;
use crate::fragment::{BatchArray, CallArg, Fragment};
use crate::module::{ImportRef, ModuleDescriptor, ModuleId};

pub const fn contract_name(id: ModuleId) -> &'static str {
    match id {
        ModuleId::BaseCrowdsale => "BaseCrowdsale",
        ModuleId::MiniMeBaseCrowdsale => "MiniMeBaseCrowdsale",
        ModuleId::ZeppelinBaseCrowdsale => "ZeppelinBaseCrowdsale",
        ModuleId::BonusCrowdsale => "BonusCrowdsale",
        ModuleId::PurchaseLimitedCrowdsale => "PurchaseLimitedCrowdsale",
        ModuleId::MinimumPaymentCrowdsale => "MinimumPaymentCrowdsale",
        ModuleId::BlockIntervalCrowdsale => "BlockIntervalCrowdsale",
        ModuleId::KycCrowdsale => "KYCCrowdsale",
        ModuleId::StagedCrowdsale => "StagedCrowdsale",
        ModuleId::MiniMeToken => "MiniMeToken",
        ModuleId::Mintable => "Mintable",
        ModuleId::BurnableToken => "BurnableToken",
        ModuleId::Pausable => "Pausable",
    }
}

pub fn import_statement(import_ref: ImportRef) -> String {
    format!("import \"./{}\";", import_ref.path())
}

pub fn import_statements(modules: &[ModuleDescriptor]) -> Vec<String> {
    modules.iter().map(|m| import_statement(m.import_ref)).collect()
}

/// `BaseCrowdsale, ZeppelinBaseCrowdsale, …` in module order.
pub fn inheritance_list(modules: &[ModuleDescriptor]) -> String {
    modules
        .iter()
        .map(|m| contract_name(m.id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn indent(level: usize) -> String {
    "  ".repeat(level)
}

/// Typed parameter list of the outer constructor: `uint start_time, …`.
pub fn constructor_parameters(layout: &ArgumentLayout) -> String {
    layout
        .constructor_args
        .iter()
        .map(|a| format!("{} {}", a.param.ty, a.param.arg_name()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `Parent(arg, arg)` forwarding the parent's own slice of the outer arguments.
pub fn super_constructor_call(module: ModuleId, params: &[IndexedParam]) -> String {
    let args = params
        .iter()
        .map(|a| a.param.arg_name())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({})", contract_name(module), args)
}

/// One forwarding call per sale module, in inheritance order.
pub fn super_constructor_calls(layout: &ArgumentLayout) -> Vec<String> {
    layout
        .module_arg_slices
        .iter()
        .map(|slice: &ArgSlice| super_constructor_call(slice.module, layout.params_for(slice)))
        .collect()
}

/// Runtime parse call for the argument at `index` of the deployment script.
pub fn deploy_arg_expr(ty: ParamType, index: usize) -> String {
    format!("{}(args[{}])", ty.parse_fn(), index)
}

pub fn deploy_arg_list(layout: &ArgumentLayout) -> Vec<String> {
    layout
        .type_table()
        .into_iter()
        .map(|(index, ty)| deploy_arg_expr(ty, index))
        .collect()
}

fn array_declaration(array: &BatchArray) -> String {
    if array.elements.is_empty() {
        return format!("const {} = [];", array.name);
    }
    let body = array
        .elements
        .iter()
        .map(|e| format!("{}{},", indent(1), e.render()))
        .collect::<Vec<_>>()
        .join("\n");
    format!("const {} = [\n{}\n];", array.name, body)
}

/// All array declarations of a fragment, in declaration order.
pub fn declare_code(fragment: &Fragment) -> String {
    fragment
        .arrays
        .iter()
        .map(array_declaration)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The initialization call; only references arrays from `declare_code`.
pub fn init_code(fragment: &Fragment) -> String {
    let args = fragment
        .call
        .args
        .iter()
        .map(|arg| match arg {
            CallArg::Array(name) => name.clone(),
            CallArg::Value(lit) => lit.render(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "await {}.{}({});",
        fragment.call.receiver, fragment.call.entry_point, args
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble_arguments;
    use crate::convert::{Address, Amount, Literal, Timestamp};
    use crate::fragment::FragmentKind;
    use crate::module::ParamSpec;

    fn layout() -> ArgumentLayout {
        assemble_arguments(&[
            ModuleDescriptor::new(
                ModuleId::BaseCrowdsale,
                vec![
                    ParamSpec::resolved("input.sale.start_time", Timestamp(10)),
                    ParamSpec::resolved("address.vault", Address::new("0xVa")),
                ],
            ),
            ModuleDescriptor::new(ModuleId::Mintable, vec![]),
            ModuleDescriptor::new(
                ModuleId::KycCrowdsale,
                vec![ParamSpec::resolved("address.kyc", Address::new("0xKy"))],
            ),
        ])
    }

    #[test]
    fn contract_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            ModuleId::ALL.iter().map(|id| contract_name(*id)).collect();
        assert_eq!(names.len(), ModuleId::ALL.len());
        assert_eq!(contract_name(ModuleId::KycCrowdsale), "KYCCrowdsale");
    }

    #[test]
    fn imports_and_inheritance_keep_module_order() {
        let modules = [
            ModuleDescriptor::new(ModuleId::BaseCrowdsale, vec![]),
            ModuleDescriptor::new(ModuleId::BonusCrowdsale, vec![]),
        ];
        assert_eq!(inheritance_list(&modules), "BaseCrowdsale, BonusCrowdsale");
        assert_eq!(
            import_statements(&modules),
            [
                "import \"./base/crowdsale/BaseCrowdsale.sol\";",
                "import \"./base/crowdsale/BonusCrowdsale.sol\";",
            ]
        );
    }

    #[test]
    fn super_calls_forward_each_slice() {
        let layout = layout();
        assert_eq!(
            super_constructor_calls(&layout),
            ["BaseCrowdsale(start_time, vault)", "Mintable()", "KYCCrowdsale(kyc)"]
        );
        assert_eq!(
            constructor_parameters(&layout),
            "uint start_time, address vault, address kyc"
        );
    }

    #[test]
    fn deploy_args_use_global_indices() {
        assert_eq!(
            deploy_arg_list(&layout()),
            ["parseUint(args[0])", "parseAddress(args[1])", "parseAddress(args[2])"]
        );
        assert_eq!(deploy_arg_expr(ParamType::Bool, 7), "parseBool(args[7])");
    }

    #[test]
    fn fragment_renders_declarations_then_call() {
        let frag = Fragment::new(FragmentKind::TokenLock { beneficiary: 2 }, "locker", "lock")
            .with_value(Address::new("0xBe"))
            .with_value(true)
            .with_array(BatchArray::new("release2Times", ParamType::Uint, [Timestamp(5)]))
            .with_array(BatchArray::new(
                "release2Ratios",
                ParamType::Uint,
                [Amount(40), Amount(60)],
            ));
        assert_eq!(
            declare_code(&frag),
            "const release2Times = [\n  5,\n];\nconst release2Ratios = [\n  40,\n  60,\n];"
        );
        assert_eq!(
            init_code(&frag),
            "await locker.lock(\"0xBe\", true, release2Times, release2Ratios);"
        );
    }

    #[test]
    fn empty_batch_renders_empty_arrays_and_same_call() {
        let frag = Fragment::new(FragmentKind::FundDistribution, "vault", "initHolders")
            .with_array(BatchArray::new("holderAddresses", ParamType::Address, Vec::<Literal>::new()))
            .with_array(BatchArray::new("holderRatios", ParamType::Uint, Vec::<Literal>::new()));
        assert_eq!(
            frag.declare_code(),
            "const holderAddresses = [];\nconst holderRatios = [];"
        );
        assert_eq!(frag.init_code(), "await vault.initHolders(holderAddresses, holderRatios);");
    }
}
