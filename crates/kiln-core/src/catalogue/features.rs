//! Built-in feature definitions.
//!
//! Fragment bodies are small Handlebars templates rendered against the custom project's
//! context (`datum_type`, `deadline_field`). They are written unindented; the composer
//! indents them into the validator body.

use serde::Serialize;

use super::Purpose;

/// Which redeemer branches a feature's per-action code is emitted into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionScope {
    #[default]
    All,
    /// Only the action with this name (compared case-insensitively).
    Named(&'static str),
}

impl ActionScope {
    pub fn applies_to(&self, action: &str) -> bool {
        match self {
            ActionScope::All => true,
            ActionScope::Named(name) => name.eq_ignore_ascii_case(action),
        }
    }
}

/// Code a feature contributes to a custom validator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fragment {
    /// `use` lines. Brace imports from the same module are merged by the composer.
    pub imports: &'static [&'static str],
    /// Validator parameters as `(name, type)`, deduplicated by name across features.
    pub params: &'static [(&'static str, &'static str)],
    /// Emitted once before the `when redeemer is` match.
    pub preamble: &'static str,
    /// Emitted inside every redeemer branch selected by `scope`.
    pub per_action: &'static str,
    pub scope: ActionScope,
}

/// A composable security check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub name: &'static str,
    #[serde(skip)]
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    /// `None` means the feature applies to any purpose.
    pub purpose: Option<Purpose>,
    pub depends_on: &'static [&'static str],
    pub conflicts_with: &'static [&'static str],
    #[serde(skip)]
    pub fragment: Fragment,
}

pub const SIGNATURE_AUTH: &str = "signature-auth";
pub const TIMELOCK: &str = "timelock";
pub const DATUM_CONTINUITY: &str = "datum-continuity";
pub const REFERENCE_SAFETY: &str = "reference-safety";
pub const VALUE_PRESERVATION: &str = "value-preservation";
pub const BOUNDED_OPERATIONS: &str = "bounded-operations";
pub const BURN_VERIFICATION: &str = "burn-verification";
pub const ONE_SHOT: &str = "one-shot";

/// Declaration order doubles as the render-order tie-break.
pub fn builtin() -> Vec<Feature> {
    vec![
        Feature {
            name: SIGNATURE_AUTH,
            aliases: &["sig", "signature", "signature_auth"],
            description: "Require the admin key in extra_signatories",
            purpose: None,
            depends_on: &[],
            conflicts_with: &[],
            fragment: Fragment {
                imports: &["use aiken/collection/list"],
                params: &[("admin_pkh", "ByteArray")],
                per_action: "// Admin must sign the transaction\n\
                             expect list.has(self.extra_signatories, admin_pkh)",
                ..Fragment::default()
            },
        },
        Feature {
            name: TIMELOCK,
            aliases: &["time-lock", "time_lock"],
            description: "Only allow spending once the datum deadline has passed",
            purpose: Some(Purpose::Spend),
            depends_on: &[],
            conflicts_with: &[],
            fragment: Fragment {
                imports: &["use aiken/interval"],
                per_action: "// Validity range must lie entirely after the deadline\n\
                             expect interval.is_entirely_after(self.validity_range, datum.{{deadline_field}})",
                ..Fragment::default()
            },
        },
        Feature {
            name: DATUM_CONTINUITY,
            aliases: &["datum", "continuity", "datum_continuity"],
            description: "Locate the continuing output and require a well-typed inline datum",
            purpose: Some(Purpose::Spend),
            depends_on: &[],
            conflicts_with: &[],
            fragment: Fragment {
                imports: &[
                    "use aiken/collection/list",
                    "use cardano/transaction.{InlineDatum}",
                ],
                preamble: "// Locate our own input to learn the script address\n\
                           expect Some(own_input) =\n  \
                           list.find(self.inputs, fn(i) { i.output_reference == own_ref })\n\
                           let own_address = own_input.output.address\n\
                           \n\
                           // The continuing output goes back to the same address\n\
                           expect Some(cont_output) =\n  \
                           list.find(self.outputs, fn(o) { o.address == own_address })\n\
                           \n\
                           // and carries an inline datum of the same shape\n\
                           expect InlineDatum(raw) = cont_output.datum\n\
                           expect _out_datum: {{datum_type}} = raw",
                ..Fragment::default()
            },
        },
        Feature {
            name: REFERENCE_SAFETY,
            aliases: &["ref-safety", "refsafety", "reference_safety"],
            description: "Reject reference script injection on the continuing output",
            purpose: Some(Purpose::Spend),
            depends_on: &[DATUM_CONTINUITY],
            conflicts_with: &[],
            fragment: Fragment {
                preamble: "// No reference script may ride along on the continuing output\n\
                           expect cont_output.reference_script == None",
                ..Fragment::default()
            },
        },
        Feature {
            name: VALUE_PRESERVATION,
            aliases: &["value", "preservation", "value_preservation"],
            description: "Keep non-ADA assets intact and never let the locked ADA decrease",
            purpose: Some(Purpose::Spend),
            depends_on: &[DATUM_CONTINUITY],
            conflicts_with: &[],
            fragment: Fragment {
                imports: &["use cardano/assets.{lovelace_of, without_lovelace}"],
                preamble: "let input_lovelace = lovelace_of(own_input.output.value)\n\
                           let output_lovelace = lovelace_of(cont_output.value)",
                per_action: "// Non-ADA assets are preserved and ADA never decreases\n\
                             expect without_lovelace(cont_output.value) == without_lovelace(own_input.output.value)\n\
                             expect output_lovelace >= input_lovelace",
                ..Fragment::default()
            },
        },
        Feature {
            name: BOUNDED_OPERATIONS,
            aliases: &["bounded", "floor", "bounded_operations"],
            description: "Enforce a minimum lovelace floor on the continuing output",
            purpose: Some(Purpose::Spend),
            depends_on: &[DATUM_CONTINUITY],
            conflicts_with: &[],
            fragment: Fragment {
                imports: &["use cardano/assets.{lovelace_of}"],
                params: &[("min_lovelace", "Int")],
                per_action: "// Continuing output keeps at least the lovelace floor\n\
                             expect lovelace_of(cont_output.value) >= min_lovelace",
                ..Fragment::default()
            },
        },
        Feature {
            name: BURN_VERIFICATION,
            aliases: &["burn", "burn_verification"],
            description: "The Burn action may only destroy tokens of this policy",
            purpose: Some(Purpose::Mint),
            depends_on: &[],
            conflicts_with: &[],
            fragment: Fragment {
                imports: &["use aiken/collection/dict", "use cardano/assets"],
                per_action: "// Every quantity under this policy must be negative\n\
                             expect\n  \
                             dict.foldl(assets.tokens(self.mint, policy_id), True, fn(_name, qty, ok) { ok && qty < 0 })",
                scope: ActionScope::Named("Burn"),
                ..Fragment::default()
            },
        },
        Feature {
            name: ONE_SHOT,
            aliases: &["oneshot", "one_shot", "seed"],
            description: "Tie the policy to a seed UTxO so it can only ever run once",
            purpose: Some(Purpose::Mint),
            depends_on: &[],
            conflicts_with: &[BURN_VERIFICATION],
            fragment: Fragment {
                imports: &[
                    "use aiken/collection/list",
                    "use cardano/transaction.{OutputReference}",
                ],
                params: &[("seed_ref", "OutputReference")],
                per_action: "// The seed UTxO must be consumed by this transaction\n\
                             expect list.any(self.inputs, fn(i) { i.output_reference == seed_ref })",
                ..Fragment::default()
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_aliases_unique() {
        let features = builtin();
        let mut keys: Vec<&str> = features
            .iter()
            .flat_map(|f| std::iter::once(f.name).chain(f.aliases.iter().copied()))
            .collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_action_scope() {
        assert!(ActionScope::All.applies_to("Deposit"));
        assert!(ActionScope::Named("Burn").applies_to("burn"));
        assert!(!ActionScope::Named("Burn").applies_to("Mint"));
    }

    #[test]
    fn test_one_shot_conflicts_with_burn() {
        let features = builtin();
        let one_shot = features.iter().find(|f| f.name == ONE_SHOT).unwrap();
        assert_eq!(one_shot.conflicts_with, &[BURN_VERIFICATION]);
    }
}
