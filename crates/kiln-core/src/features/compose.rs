//! Assembles a custom validator from resolved feature fragments.
//!
//! The composer is purely structural: it renders each fragment against the custom
//! project's names, merges imports and parameters, distributes per-action checks into
//! redeemer branches, and plans the inline tests. The custom validator template turns the
//! resulting [`ComposedValidator`] into Aiken source.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::json;

use crate::catalogue::features::{
    BOUNDED_OPERATIONS, BURN_VERIFICATION, DATUM_CONTINUITY, ONE_SHOT, REFERENCE_SAFETY,
    SIGNATURE_AUTH, TIMELOCK, VALUE_PRESERVATION,
};
use crate::catalogue::{ActionScope, Purpose};
use crate::error::RenderError;
use crate::features::ResolvedFeatures;
use crate::options::CustomSpec;
use crate::spec_parser::{ActionSpec, FieldSpec, FieldType};
use crate::templates::renderer::TemplateRenderer;

/// Datum field names tried, in order, before falling back to the first `Int` field.
const DEADLINE_NAMES: [&str; 5] = ["deadline", "lock_until", "expiry", "expires_at", "lock_time"];

/// Identifiers the composed code refers to.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorNames<'a> {
    pub validator: &'a str,
    pub datum_type: &'a str,
    pub redeemer_type: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// One `when redeemer is` arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub pattern: String,
    /// Indented for the arm body; always ends with `True`.
    pub body: String,
}

/// An inline Aiken test calling the validator handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    pub name: String,
    pub should_fail: bool,
    /// `Transaction` record fields layered over `transaction.placeholder`.
    pub tx_fields: Vec<String>,
    pub call: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedValidator {
    /// Merged `use` lines, sorted by module.
    pub imports: Vec<String>,
    pub params: Vec<Param>,
    /// Indented preamble blocks separated by blank lines; empty when no feature has one.
    pub preamble: String,
    pub branches: Vec<Branch>,
    /// Test constants and builder functions, one declaration per entry.
    pub helpers: Vec<String>,
    pub tests: Vec<TestCase>,
}

impl ComposedValidator {
    /// `name: Type, ...` for the validator header.
    pub fn param_list(&self) -> String {
        self.params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The `Int` datum field the timelock check compares against.
pub fn deadline_field(fields: &[FieldSpec]) -> Option<&FieldSpec> {
    DEADLINE_NAMES
        .iter()
        .find_map(|name| {
            fields
                .iter()
                .find(|f| f.name == *name && f.ty == FieldType::Int)
        })
        .or_else(|| fields.iter().find(|f| f.ty == FieldType::Int))
}

/// Compose the resolved features of `spec` into validator pieces.
pub fn compose(
    renderer: &TemplateRenderer,
    spec: &CustomSpec,
    resolved: &ResolvedFeatures<'_>,
    names: ValidatorNames<'_>,
) -> Result<ComposedValidator, RenderError> {
    let context = json!({
        "datum_type": names.datum_type,
        "deadline_field": deadline_field(&spec.datum_fields).map(|f| f.name.as_str()).unwrap_or(""),
    });

    let mut imports: Vec<&str> = match spec.purpose {
        Purpose::Spend => vec!["use cardano/transaction.{OutputReference, Transaction}"],
        Purpose::Mint => vec![
            "use cardano/assets.{PolicyId}",
            "use cardano/transaction.{Transaction}",
        ],
    };
    let mut params: Vec<Param> = Vec::new();
    let mut preamble = Vec::new();
    let mut checks: Vec<(&ActionScope, String)> = Vec::new();

    for feature in resolved.iter() {
        let fragment = &feature.fragment;
        imports.extend(fragment.imports.iter().copied());
        for (name, ty) in fragment.params {
            if !params.iter().any(|p| p.name == *name) {
                params.push(Param {
                    name: name.to_string(),
                    ty: ty.to_string(),
                });
            }
        }
        if !fragment.preamble.is_empty() {
            preamble.push(indent(&renderer.render(fragment.preamble, &context)?, 4));
        }
        if !fragment.per_action.is_empty() {
            checks.push((&fragment.scope, renderer.render(fragment.per_action, &context)?));
        }
    }

    let branches = spec
        .redeemer_actions
        .iter()
        .map(|action| {
            let mut body: Vec<String> = checks
                .iter()
                .filter(|(scope, _)| scope.applies_to(&action.name))
                .map(|(_, code)| indent(code, 8))
                .collect();
            body.push(indent("True", 8));
            Branch {
                pattern: branch_pattern(action),
                body: body.join("\n"),
            }
        })
        .collect();

    let plan = TestPlan::new(spec, resolved, &params, names);
    imports.extend(plan.imports());

    Ok(ComposedValidator {
        imports: merge_imports(imports),
        helpers: plan.helpers(),
        tests: plan.cases(),
        params,
        preamble: preamble.join("\n\n"),
        branches,
    })
}

/// Merge `use` lines by module. Brace imports from one module are unioned; a bare import
/// of a module that also has a brace import is dropped, since the brace form already
/// brings the module into scope.
fn merge_imports<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut modules: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for line in lines {
        let line = line.trim().trim_start_matches("use ").trim();
        let (module, items) = match line.split_once(".{") {
            Some((module, rest)) => (module, rest.trim_end_matches('}')),
            None => (line, ""),
        };
        modules
            .entry(module)
            .or_default()
            .extend(items.split(',').map(str::trim).filter(|s| !s.is_empty()));
    }
    modules
        .into_iter()
        .map(|(module, items)| {
            if items.is_empty() {
                format!("use {module}")
            } else {
                let items: Vec<&str> = items.into_iter().collect();
                format!("use {}.{{{}}}", module, items.join(", "))
            }
        })
        .collect()
}

fn indent(code: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    code.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn branch_pattern(action: &ActionSpec) -> String {
    if action.fields.is_empty() {
        action.variant_name()
    } else {
        format!("{} {{ .. }}", action.variant_name())
    }
}

/// `WithdrawAll` → `withdraw_all`
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Which single thing a negative test breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tweak {
    None,
    WrongSigner,
    BeforeDeadline,
    ReferenceScript,
    DrainValue,
    BelowFloor,
    NoSeed,
}

struct TestPlan<'a> {
    spec: &'a CustomSpec,
    names: ValidatorNames<'a>,
    args: String,
    sig: bool,
    timelock: bool,
    continuity: bool,
    ref_safety: bool,
    value: bool,
    bounded: bool,
    burn: bool,
    one_shot: bool,
}

impl<'a> TestPlan<'a> {
    fn new(
        spec: &'a CustomSpec,
        resolved: &ResolvedFeatures<'_>,
        params: &[Param],
        names: ValidatorNames<'a>,
    ) -> Self {
        let args = params
            .iter()
            .map(|p| match (p.name.as_str(), p.ty.as_str()) {
                ("admin_pkh", _) => "test_admin",
                ("min_lovelace", _) => "2_000_000",
                (_, "OutputReference") => "test_oref()",
                (_, "Int") => "0",
                _ => "#\"00\"",
            })
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            spec,
            names,
            args,
            sig: resolved.contains(SIGNATURE_AUTH),
            timelock: resolved.contains(TIMELOCK),
            continuity: resolved.contains(DATUM_CONTINUITY),
            ref_safety: resolved.contains(REFERENCE_SAFETY),
            value: resolved.contains(VALUE_PRESERVATION),
            bounded: resolved.contains(BOUNDED_OPERATIONS),
            burn: resolved.contains(BURN_VERIFICATION),
            one_shot: resolved.contains(ONE_SHOT),
        }
    }

    fn uses_address(&self) -> bool {
        self.spec
            .datum_fields
            .iter()
            .chain(self.spec.redeemer_actions.iter().flat_map(|a| a.fields.iter()))
            .any(|f| f.ty == FieldType::Address)
    }

    fn imports(&self) -> Vec<&'static str> {
        let mut imports = vec![];
        if self.spec.purpose == Purpose::Mint {
            imports.push("use cardano/assets");
        }
        if self.continuity {
            imports.extend([
                "use cardano/address.{Address, Script}",
                "use cardano/assets",
                "use cardano/transaction.{Input, Output}",
            ]);
        }
        if self.one_shot {
            imports.extend([
                "use cardano/address.{Address, VerificationKey}",
                "use cardano/assets",
                "use cardano/transaction.{Input, NoDatum, Output}",
            ]);
        }
        if self.uses_address() {
            imports.push("use cardano/address.{Address, VerificationKey}");
        }
        imports
    }

    fn helpers(&self) -> Vec<String> {
        let mut helpers = Vec::new();
        if self.sig {
            helpers.push("const test_admin: ByteArray = #\"aabbccdd\"".to_string());
        }
        if self.timelock {
            helpers.push("const test_deadline: Int = 1_000_000".to_string());
        }
        if self.spec.purpose == Purpose::Mint {
            helpers.push("const test_policy: ByteArray = #\"eeff0011\"".to_string());
        }
        if self.uses_address() {
            helpers.push(
                "fn test_address() -> Address {\n  \
                 Address { payment_credential: VerificationKey(#\"aa\"), stake_credential: None }\n}"
                    .to_string(),
            );
        }
        if self.spec.purpose == Purpose::Spend || self.one_shot {
            helpers.push(
                "fn test_oref() -> OutputReference {\n  \
                 OutputReference {\n    \
                 transaction_id: #\"0000000000000000000000000000000000000000000000000000000000000001\",\n    \
                 output_index: 0,\n  \
                 }\n}"
                    .to_string(),
            );
        }
        if self.spec.purpose == Purpose::Spend {
            let fields: Vec<String> = self
                .spec
                .datum_fields
                .iter()
                .map(|f| format!("    {}: {},", f.name, self.datum_value(f)))
                .collect();
            helpers.push(format!(
                "fn test_datum() -> {} {{\n  {} {{\n{}\n  }}\n}}",
                self.names.datum_type,
                self.names.datum_type,
                fields.join("\n")
            ));
        }
        if self.continuity {
            helpers.push(
                "fn script_address() -> Address {\n  \
                 Address { payment_credential: Script(#\"ee\"), stake_credential: None }\n}"
                    .to_string(),
            );
            helpers.push(
                "fn script_input() -> Input {\n  \
                 Input { output_reference: test_oref(), output: continuing_output(10_000_000, None) }\n}"
                    .to_string(),
            );
            helpers.push(
                "fn continuing_output(lovelace: Int, reference_script: Option<ByteArray>) -> Output {\n  \
                 Output {\n    \
                 address: script_address(),\n    \
                 value: assets.from_lovelace(lovelace),\n    \
                 datum: InlineDatum(test_datum()),\n    \
                 reference_script,\n  \
                 }\n}"
                    .to_string(),
            );
        }
        if self.one_shot {
            helpers.push(
                "fn seed_input() -> Input {\n  \
                 Input {\n    \
                 output_reference: test_oref(),\n    \
                 output: Output {\n      \
                 address: Address { payment_credential: VerificationKey(#\"aa\"), stake_credential: None },\n      \
                 value: assets.from_lovelace(2_000_000),\n      \
                 datum: NoDatum,\n      \
                 reference_script: None,\n    \
                 },\n  \
                 }\n}"
                    .to_string(),
            );
        }
        helpers
    }

    fn datum_value(&self, field: &FieldSpec) -> String {
        let name = field.name.as_str();
        let is_deadline = deadline_field(&self.spec.datum_fields).is_some_and(|d| d.name == name);
        match field.ty {
            FieldType::ByteArray
                if self.sig && ["admin", "owner", "signer"].iter().any(|k| name.contains(k)) =>
            {
                "test_admin".into()
            }
            FieldType::ByteArray => "#\"aabbccdd\"".into(),
            FieldType::Int if self.timelock && is_deadline => "test_deadline".into(),
            FieldType::Int
                if ["amount", "balance", "total"].iter().any(|k| name.contains(k)) =>
            {
                "10_000_000".into()
            }
            FieldType::Int => "0".into(),
            FieldType::Bool => "True".into(),
            FieldType::Address => "test_address()".into(),
            FieldType::ListInt | FieldType::ListByteArray => "[]".into(),
        }
    }

    fn action_value(action: &ActionSpec) -> String {
        if action.fields.is_empty() {
            return action.variant_name();
        }
        let fields: Vec<String> = action
            .fields
            .iter()
            .map(|f| {
                let value = match f.ty {
                    FieldType::Int => "5_000_000",
                    FieldType::ByteArray => "#\"aabb\"",
                    FieldType::Bool => "True",
                    FieldType::Address => "test_address()",
                    FieldType::ListInt | FieldType::ListByteArray => "[]",
                };
                format!("{}: {}", f.name, value)
            })
            .collect();
        format!("{} {{ {} }}", action.variant_name(), fields.join(", "))
    }

    fn call(&self, handler_args: &str) -> String {
        let handler = self.spec.purpose.as_str();
        if self.args.is_empty() {
            format!("{}.{}({})", self.names.validator, handler, handler_args)
        } else {
            format!(
                "{}.{}({}, {})",
                self.names.validator, handler, self.args, handler_args
            )
        }
    }

    fn spend_tx(&self, tweak: Tweak) -> Vec<String> {
        let mut fields = Vec::new();
        if self.sig {
            fields.push(match tweak {
                Tweak::WrongSigner => "extra_signatories: [#\"deadbeef\"]".to_string(),
                _ => "extra_signatories: [test_admin]".to_string(),
            });
        }
        if self.timelock {
            fields.push(match tweak {
                Tweak::BeforeDeadline => "validity_range: interval.before(test_deadline - 1)".to_string(),
                _ => "validity_range: interval.after(test_deadline + 1)".to_string(),
            });
        }
        if self.continuity {
            let lovelace = match tweak {
                Tweak::DrainValue => "5_000_000",
                Tweak::BelowFloor => "1_000_000",
                _ => "10_000_000",
            };
            let script = match tweak {
                Tweak::ReferenceScript => "Some(#\"deadbeef\")",
                _ => "None",
            };
            fields.push("inputs: [script_input()]".to_string());
            fields.push(format!("outputs: [continuing_output({lovelace}, {script})]"));
        }
        fields
    }

    fn mint_tx(&self, tweak: Tweak, quantity: i64) -> Vec<String> {
        let mut fields = Vec::new();
        if self.sig {
            fields.push(match tweak {
                Tweak::WrongSigner => "extra_signatories: []".to_string(),
                _ => "extra_signatories: [test_admin]".to_string(),
            });
        }
        if self.one_shot {
            fields.push(match tweak {
                Tweak::NoSeed => "inputs: []".to_string(),
                _ => "inputs: [seed_input()]".to_string(),
            });
        }
        fields.push(format!(
            "mint: assets.from_asset(test_policy, \"token\", {quantity})"
        ));
        fields
    }

    fn cases(&self) -> Vec<TestCase> {
        match self.spec.purpose {
            Purpose::Spend => self.spend_cases(),
            Purpose::Mint => self.mint_cases(),
        }
    }

    fn spend_cases(&self) -> Vec<TestCase> {
        let Some(action) = self.spec.redeemer_actions.first() else {
            return Vec::new();
        };
        let prefix = snake_case(&action.variant_name());
        let redeemer = Self::action_value(action);
        let with_datum = self.call(&format!("Some(test_datum()), {redeemer}, test_oref(), tx"));

        let mut cases = vec![TestCase {
            name: format!("{prefix}_succeeds"),
            should_fail: false,
            tx_fields: self.spend_tx(Tweak::None),
            call: with_datum.clone(),
        }];
        let negatives = [
            (self.sig, Tweak::WrongSigner, "without_admin_signature_fails"),
            (self.timelock, Tweak::BeforeDeadline, "before_deadline_fails"),
            (self.ref_safety, Tweak::ReferenceScript, "with_reference_script_fails"),
            (self.value, Tweak::DrainValue, "draining_value_fails"),
            (self.bounded, Tweak::BelowFloor, "below_floor_fails"),
        ];
        for (enabled, tweak, suffix) in negatives {
            if enabled {
                cases.push(TestCase {
                    name: format!("{prefix}_{suffix}"),
                    should_fail: true,
                    tx_fields: self.spend_tx(tweak),
                    call: with_datum.clone(),
                });
            }
        }
        cases.push(TestCase {
            name: format!("{prefix}_without_datum_fails"),
            should_fail: true,
            tx_fields: self.spend_tx(Tweak::None),
            call: self.call(&format!("None, {redeemer}, test_oref(), tx")),
        });
        cases
    }

    fn mint_cases(&self) -> Vec<TestCase> {
        let mut cases = Vec::new();
        let is_burn = |a: &&ActionSpec| a.name.eq_ignore_ascii_case("burn");

        let minting = self
            .spec
            .redeemer_actions
            .iter()
            .find(|a| !(self.burn && is_burn(a)));
        if let Some(action) = minting {
            let prefix = snake_case(&action.variant_name());
            let call = self.call(&format!("{}, test_policy, tx", Self::action_value(action)));
            cases.push(TestCase {
                name: format!("{prefix}_succeeds"),
                should_fail: false,
                tx_fields: self.mint_tx(Tweak::None, 1),
                call: call.clone(),
            });
            if self.sig {
                cases.push(TestCase {
                    name: format!("{prefix}_without_admin_signature_fails"),
                    should_fail: true,
                    tx_fields: self.mint_tx(Tweak::WrongSigner, 1),
                    call: call.clone(),
                });
            }
            if self.one_shot {
                cases.push(TestCase {
                    name: format!("{prefix}_without_seed_fails"),
                    should_fail: true,
                    tx_fields: self.mint_tx(Tweak::NoSeed, 1),
                    call,
                });
            }
        }

        if self.burn {
            if let Some(action) = self.spec.redeemer_actions.iter().find(is_burn) {
                let call = self.call(&format!("{}, test_policy, tx", Self::action_value(action)));
                cases.push(TestCase {
                    name: "burn_succeeds".into(),
                    should_fail: false,
                    tx_fields: self.mint_tx(Tweak::None, -1),
                    call: call.clone(),
                });
                cases.push(TestCase {
                    name: "burn_with_positive_quantity_fails".into(),
                    should_fail: true,
                    tx_fields: self.mint_tx(Tweak::None, 1),
                    call,
                });
            }
        }
        cases
    }
}
