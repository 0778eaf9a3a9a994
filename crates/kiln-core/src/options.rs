//! Caller-facing generation options and their validation.
//!
//! [`GenerateOptions`] is the raw request as it arrives from the CLI or any other caller.
//! [`ResolvedOptions::resolve`] checks it fail-fast and produces everything the renderer
//! needs; [`diagnose`] runs the same checks but keeps going, collecting every problem for
//! interactive feedback.

use serde::{Deserialize, Serialize};

use crate::catalogue::{self, Purpose, Template, TemplateOption};
use crate::error::{KilnError, ValidationError};
use crate::features::{self, ResolvedFeatures};
use crate::profile::ScanProfile;
use crate::spec_parser::{self, ActionSpec, FieldSpec};

/// A generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Template slug or alias.
    pub template: String,
    pub namespace: String,
    pub project_name: String,

    // --- simple_mint ---
    pub time_lock: bool,
    pub token_name: Option<String>,
    pub asset_name: Option<String>,

    // --- vesting ---
    pub cancellable: bool,
    pub partial_claim: bool,

    /// Required for the custom template, rejected for every other one.
    pub custom: Option<CustomInput>,

    /// Emit `.aikido.toml` with this scanner profile.
    pub scan_profile: Option<String>,
    /// Skip the verification pipeline for this generation.
    pub skip_verify: bool,
}

impl GenerateOptions {
    pub fn new(
        template: impl Into<String>,
        namespace: impl Into<String>,
        project_name: impl Into<String>,
    ) -> Self {
        Self {
            template: template.into(),
            namespace: namespace.into(),
            project_name: project_name.into(),
            ..Self::default()
        }
    }
}

/// Raw DSL input for the custom template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomInput {
    /// `spend` or `mint`.
    pub purpose: String,
    /// Comma-separated feature names or aliases.
    pub features: String,
    /// Field list, e.g. `owner:ByteArray,deadline:Int`.
    pub datum: String,
    /// Action list, e.g. `Deposit(amount:Int),Withdraw`.
    pub redeemer: String,
}

/// Parsed custom-template input. Built per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomSpec {
    pub purpose: Purpose,
    /// Features as selected by the caller, before dependency closure.
    pub features: Vec<String>,
    pub datum_fields: Vec<FieldSpec>,
    pub redeemer_actions: Vec<ActionSpec>,
}

impl CustomSpec {
    /// Parse the raw input. Purpose errors come first, then datum, then redeemer.
    pub fn parse(input: &CustomInput) -> Result<Self, KilnError> {
        let purpose: Purpose = input.purpose.parse()?;
        let datum_fields = spec_parser::parse_fields(&input.datum)?;
        let redeemer_actions = spec_parser::parse_actions(&input.redeemer)?;
        check_names(&datum_fields, &redeemer_actions)?;
        Ok(Self {
            purpose,
            features: split_features(&input.features),
            datum_fields,
            redeemer_actions,
        })
    }

    /// Requirements a resolved feature set places on the datum and redeemer.
    pub fn check_requirements(&self, resolved: &ResolvedFeatures<'_>) -> Result<(), ValidationError> {
        if self.redeemer_actions.is_empty() {
            return Err(ValidationError::MissingInput(
                "custom validators need at least one redeemer action".into(),
            ));
        }
        if self.purpose == Purpose::Spend && self.datum_fields.is_empty() {
            return Err(ValidationError::MissingInput(
                "custom spend validators need at least one datum field".into(),
            ));
        }
        if resolved.contains(catalogue::features::TIMELOCK)
            && features::deadline_field(&self.datum_fields).is_none()
        {
            return Err(ValidationError::FeatureRequirement {
                feature: catalogue::features::TIMELOCK.into(),
                requirement: "needs an Int datum field to use as the deadline".into(),
            });
        }
        if resolved.contains(catalogue::features::BURN_VERIFICATION)
            && !self
                .redeemer_actions
                .iter()
                .any(|a| a.name.eq_ignore_ascii_case("burn"))
        {
            return Err(ValidationError::FeatureRequirement {
                feature: catalogue::features::BURN_VERIFICATION.into(),
                requirement: "needs a redeemer action named Burn".into(),
            });
        }
        Ok(())
    }
}

/// Template toggles after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toggles {
    pub time_lock: bool,
    pub cancellable: bool,
    pub partial_claim: bool,
    pub token_name: String,
    pub asset_name: String,
}

/// A validated request, ready to render.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub template: &'static Template,
    pub namespace: String,
    pub project_name: String,
    pub purpose: Purpose,
    /// Validator module name: project name plus the template suffix.
    pub validator_name: String,
    pub toggles: Toggles,
    pub custom: Option<CustomSpec>,
    pub features: Option<ResolvedFeatures<'static>>,
    pub scan_profile: Option<ScanProfile>,
    pub skip_verify: bool,
}

impl ResolvedOptions {
    /// Validate `options` and resolve everything rendering depends on.
    ///
    /// Identifier and template checks run before any DSL parsing, which runs before
    /// feature resolution.
    pub fn resolve(options: &GenerateOptions) -> Result<Self, KilnError> {
        check_identifier("namespace", &options.namespace)?;
        check_identifier("project_name", &options.project_name)?;
        let template = catalogue::template(&options.template)?;
        check_toggles(template, options)?;
        let toggles = toggles(options)?;
        let scan_profile = options
            .scan_profile
            .as_deref()
            .map(ScanProfile::parse)
            .transpose()?;

        let (purpose, custom, features) = if template.is_custom() {
            let input = options.custom.as_ref().ok_or_else(|| {
                ValidationError::MissingInput(
                    "the custom template needs a purpose, a datum and a redeemer".into(),
                )
            })?;
            let spec = CustomSpec::parse(input)?;
            let resolved = catalogue::feature_graph()
                .resolve(spec.purpose, spec.features.iter().map(String::as_str))?;
            spec.check_requirements(&resolved)?;
            (spec.purpose, Some(spec), Some(resolved))
        } else {
            // Every catalogue template except custom carries a fixed purpose.
            (template.purpose.unwrap_or(Purpose::Spend), None, None)
        };

        let suffix = match (template.is_custom(), purpose) {
            (true, Purpose::Mint) => "mint",
            _ => template.validator_suffix,
        };

        Ok(Self {
            template,
            namespace: options.namespace.clone(),
            validator_name: format!("{}_{}", options.project_name, suffix),
            project_name: options.project_name.clone(),
            purpose,
            toggles,
            custom,
            features,
            scan_profile,
            skip_verify: options.skip_verify,
        })
    }
}

/// Run every independent check and collect all failures as messages.
///
/// Identifier, template, datum, and redeemer problems are reported together; feature
/// resolution is only attempted once the purpose parsed, and requirement checks only once
/// resolution succeeded.
pub fn diagnose(options: &GenerateOptions) -> Vec<String> {
    let mut errors = Vec::new();
    let mut push = |e: KilnError| errors.push(e.to_string());

    if let Err(e) = check_identifier("namespace", &options.namespace) {
        push(e.into());
    }
    if let Err(e) = check_identifier("project_name", &options.project_name) {
        push(e.into());
    }
    if let Err(e) = toggles(options) {
        push(e.into());
    }
    if let Some(profile) = options.scan_profile.as_deref() {
        if let Err(e) = ScanProfile::parse(profile) {
            push(e.into());
        }
    }

    let template = match catalogue::template(&options.template) {
        Ok(t) => t,
        Err(e) => {
            push(e.into());
            return errors;
        }
    };
    if let Err(e) = check_toggles(template, options) {
        push(e.into());
    }
    if !template.is_custom() {
        return errors;
    }

    let Some(input) = options.custom.as_ref() else {
        push(
            ValidationError::MissingInput(
                "the custom template needs a purpose, a datum and a redeemer".into(),
            )
            .into(),
        );
        return errors;
    };

    let purpose = input.purpose.parse::<Purpose>().map_err(|e| push(e.into())).ok();
    let datum = spec_parser::parse_fields(&input.datum).map_err(|e| push(e.into())).ok();
    let redeemer = spec_parser::parse_actions(&input.redeemer)
        .map_err(|e| push(e.into()))
        .ok();

    if let Err(e) = check_names(
        datum.as_deref().unwrap_or_default(),
        redeemer.as_deref().unwrap_or_default(),
    ) {
        push(e.into());
    }

    let Some(purpose) = purpose else {
        return errors;
    };
    let features = split_features(&input.features);
    let resolved = match catalogue::feature_graph()
        .resolve(purpose, features.iter().map(String::as_str))
    {
        Ok(r) => r,
        Err(e) => {
            push(e.into());
            return errors;
        }
    };

    if let (Some(datum_fields), Some(redeemer_actions)) = (datum, redeemer) {
        let spec = CustomSpec {
            purpose,
            features,
            datum_fields,
            redeemer_actions,
        };
        if let Err(e) = spec.check_requirements(&resolved) {
            push(e.into());
        }
    }
    errors
}

/// `[a-z][a-z0-9_]*`
pub fn is_identifier(s: &str) -> bool {
    spec_parser::is_field_identifier(s)
}

fn check_identifier(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !is_identifier(value) {
        return Err(ValidationError::InvalidIdentifier {
            field,
            value: value.to_string(),
        });
    }
    if spec_parser::is_keyword(value) {
        return Err(ValidationError::ReservedName {
            kind: field,
            name: value.to_string(),
        });
    }
    Ok(())
}

/// Field names must not be keywords; action constructors must not shadow ones in scope.
fn check_names(fields: &[FieldSpec], actions: &[ActionSpec]) -> Result<(), ValidationError> {
    let all_fields = fields.iter().chain(actions.iter().flat_map(|a| a.fields.iter()));
    for field in all_fields {
        if spec_parser::is_keyword(&field.name) {
            return Err(ValidationError::ReservedName {
                kind: "field",
                name: field.name.clone(),
            });
        }
    }
    for action in actions {
        let variant = action.variant_name();
        if spec_parser::is_reserved_constructor(&variant) {
            return Err(ValidationError::ReservedName {
                kind: "action",
                name: variant,
            });
        }
    }
    Ok(())
}

fn check_toggles(template: &Template, options: &GenerateOptions) -> Result<(), ValidationError> {
    let set = [
        (TemplateOption::TimeLock, options.time_lock),
        (TemplateOption::TokenName, options.token_name.is_some()),
        (TemplateOption::AssetName, options.asset_name.is_some()),
        (TemplateOption::Cancellable, options.cancellable),
        (TemplateOption::PartialClaim, options.partial_claim),
        (TemplateOption::Features, options.custom.is_some()),
    ];
    match set
        .iter()
        .find(|(option, present)| *present && !template.allows(*option))
    {
        Some((option, _)) => Err(ValidationError::UnsupportedOption {
            template: template.slug.to_string(),
            option: if *option == TemplateOption::Features {
                "custom".to_string()
            } else {
                option.to_string()
            },
        }),
        None => Ok(()),
    }
}

fn toggles(options: &GenerateOptions) -> Result<Toggles, ValidationError> {
    let default_name = default_asset_name(&options.project_name);
    Ok(Toggles {
        time_lock: options.time_lock,
        cancellable: options.cancellable,
        partial_claim: options.partial_claim,
        token_name: asset_name_or("token_name", options.token_name.as_deref(), &default_name)?,
        asset_name: asset_name_or("asset_name", options.asset_name.as_deref(), &default_name)?,
    })
}

/// Only caller-supplied names are checked; the fallback is valid by construction.
fn asset_name_or(field: &'static str, given: Option<&str>, fallback: &str) -> Result<String, ValidationError> {
    match given {
        Some(value) => {
            check_asset_name(field, value)?;
            Ok(value.to_string())
        }
        None => Ok(fallback.to_string()),
    }
}

/// PascalCase project name, cut to the 32-byte asset name limit.
fn default_asset_name(project_name: &str) -> String {
    pascal_case(project_name).chars().take(MAX_ASSET_NAME).collect()
}

const MAX_ASSET_NAME: usize = 32;

fn check_asset_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let ok = (1..=MAX_ASSET_NAME).contains(&value.len())
        && value
            .bytes()
            .all(|b| b == b' ' || (b.is_ascii_graphic() && b != b'"' && b != b'\\'));
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidAssetName {
            field,
            value: value.to_string(),
        })
    }
}

fn split_features(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `my_vesting` → `MyVesting`
pub fn pascal_case(s: &str) -> String {
    s.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(purpose: &str, features: &str, datum: &str, redeemer: &str) -> GenerateOptions {
        GenerateOptions {
            custom: Some(CustomInput {
                purpose: purpose.into(),
                features: features.into(),
                datum: datum.into(),
                redeemer: redeemer.into(),
            }),
            ..GenerateOptions::new("custom", "acme", "vault")
        }
    }

    #[test]
    fn test_resolve_vesting() {
        let options = GenerateOptions {
            cancellable: true,
            ..GenerateOptions::new("vesting", "myorg", "my_vesting")
        };
        let resolved = ResolvedOptions::resolve(&options).unwrap();
        assert_eq!(resolved.validator_name, "my_vesting_vesting");
        assert_eq!(resolved.purpose, Purpose::Spend);
        assert!(resolved.toggles.cancellable);
        assert!(resolved.features.is_none());
    }

    #[test]
    fn test_invalid_identifiers() {
        for bad in ["", "MyOrg", "1org", "my-org", "org name"] {
            let err = ResolvedOptions::resolve(&GenerateOptions::new("vesting", bad, "proj")).unwrap_err();
            assert!(
                matches!(
                    err,
                    KilnError::Validation(ValidationError::InvalidIdentifier { field: "namespace", .. })
                ),
                "{bad}"
            );
        }
        let err = ResolvedOptions::resolve(&GenerateOptions::new("vesting", "org", "Proj")).unwrap_err();
        assert!(matches!(
            err,
            KilnError::Validation(ValidationError::InvalidIdentifier { field: "project_name", .. })
        ));
    }

    #[test]
    fn test_unsupported_toggle() {
        let options = GenerateOptions {
            time_lock: true,
            ..GenerateOptions::new("escrow", "org", "deal")
        };
        let err = ResolvedOptions::resolve(&options).unwrap_err();
        assert!(err.to_string().contains("time_lock"));
    }

    #[test]
    fn test_custom_requires_input() {
        let err = ResolvedOptions::resolve(&GenerateOptions::new("custom", "org", "v")).unwrap_err();
        assert!(matches!(err, KilnError::Validation(ValidationError::MissingInput(_))));
    }

    #[test]
    fn test_custom_input_rejected_elsewhere() {
        let mut options = custom("spend", "", "owner:ByteArray", "Claim");
        options.template = "vesting".into();
        let err = ResolvedOptions::resolve(&options).unwrap_err();
        assert!(err.to_string().contains("'custom'"));
    }

    #[test]
    fn test_custom_resolves_features() {
        let options = custom("spend", "sig, value", "owner:ByteArray,balance:Int", "Deposit(amount:Int),Withdraw");
        let resolved = ResolvedOptions::resolve(&options).unwrap();
        assert_eq!(resolved.validator_name, "vault_validator");
        assert_eq!(
            resolved.features.unwrap().names(),
            vec!["signature-auth", "datum-continuity", "value-preservation"]
        );
    }

    #[test]
    fn test_custom_mint_suffix() {
        let options = custom("mint", "sig,burn", "", "Mint,Burn");
        let resolved = ResolvedOptions::resolve(&options).unwrap();
        assert_eq!(resolved.validator_name, "vault_mint");
    }

    #[test]
    fn test_timelock_needs_int_field() {
        let options = custom("spend", "timelock", "owner:ByteArray", "Claim");
        let err = ResolvedOptions::resolve(&options).unwrap_err();
        assert!(matches!(
            err,
            KilnError::Validation(ValidationError::FeatureRequirement { .. })
        ));
    }

    #[test]
    fn test_burn_needs_burn_action() {
        let options = custom("mint", "burn", "", "Mint");
        let err = ResolvedOptions::resolve(&options).unwrap_err();
        assert!(err.to_string().contains("Burn"));
    }

    #[test]
    fn test_spend_needs_datum() {
        let options = custom("spend", "", "", "Claim");
        let err = ResolvedOptions::resolve(&options).unwrap_err();
        assert!(matches!(err, KilnError::Validation(ValidationError::MissingInput(_))));
    }

    #[test]
    fn test_purpose_conflict_surfaces() {
        let options = custom("mint", "timelock", "", "Mint");
        let err = ResolvedOptions::resolve(&options).unwrap_err();
        assert!(matches!(err, KilnError::Resolution(_)));
    }

    #[test]
    fn test_long_project_name_gets_truncated_asset_name() {
        let resolved = ResolvedOptions::resolve(&GenerateOptions::new(
            "simple_mint",
            "myorg",
            "quarterly_employee_token_vesting_schedule",
        ))
        .unwrap();
        assert_eq!(resolved.toggles.token_name, "QuarterlyEmployeeTokenVestingSch");
        assert_eq!(resolved.toggles.asset_name.len(), 32);
    }

    #[test]
    fn test_explicit_asset_name_still_checked() {
        let options = GenerateOptions {
            asset_name: Some("x".repeat(33)),
            ..GenerateOptions::new("simple_mint", "org", "coin")
        };
        let err = ResolvedOptions::resolve(&options).unwrap_err();
        assert!(matches!(
            err,
            KilnError::Validation(ValidationError::InvalidAssetName { field: "asset_name", .. })
        ));
    }

    #[test]
    fn test_keyword_project_name_rejected() {
        for word in ["test", "type", "validator"] {
            let err = ResolvedOptions::resolve(&GenerateOptions::new("escrow", "org", word)).unwrap_err();
            assert!(
                matches!(
                    err,
                    KilnError::Validation(ValidationError::ReservedName { kind: "project_name", .. })
                ),
                "{word}"
            );
        }
        let err = ResolvedOptions::resolve(&GenerateOptions::new("escrow", "use", "deal")).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_keyword_field_rejected() {
        for (datum, redeemer) in [
            ("when:Int", "Claim"),
            ("owner:ByteArray", "Pay(fn:Int)"),
        ] {
            let err = ResolvedOptions::resolve(&custom("spend", "", datum, redeemer)).unwrap_err();
            assert!(
                matches!(
                    err,
                    KilnError::Validation(ValidationError::ReservedName { kind: "field", .. })
                ),
                "{datum} {redeemer}"
            );
        }
    }

    #[test]
    fn test_reserved_constructor_rejected() {
        for redeemer in ["True", "Some(value:Int)", "none", "Transaction"] {
            let err = ResolvedOptions::resolve(&custom("spend", "", "owner:ByteArray", redeemer))
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    KilnError::Validation(ValidationError::ReservedName { kind: "action", .. })
                ),
                "{redeemer}"
            );
        }
    }

    #[test]
    fn test_diagnose_reports_reserved_names() {
        let errors = diagnose(&custom("spend", "", "let:Int", "Claim"));
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].contains("'let'"));
    }

    #[test]
    fn test_diagnose_collects_independent_errors() {
        let mut options = custom("spend", "sig", "owner:Strin", "Deposit(amount:Int");
        options.namespace = "Bad".into();
        let errors = diagnose(&options);
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors[0].contains("namespace"));
        assert!(errors[1].contains("Strin"));
        assert!(errors[2].contains("syntax"));
    }

    #[test]
    fn test_diagnose_clean() {
        let options = custom("spend", "sig,timelock", "owner:ByteArray,deadline:Int", "Claim");
        assert!(diagnose(&options).is_empty());
    }

    #[test]
    fn test_asset_name_validation() {
        let options = GenerateOptions {
            token_name: Some("Bad\"Name".into()),
            ..GenerateOptions::new("mint", "org", "coin")
        };
        assert!(matches!(
            ResolvedOptions::resolve(&options).unwrap_err(),
            KilnError::Validation(ValidationError::InvalidAssetName { field: "token_name", .. })
        ));
    }

    #[test]
    fn test_default_token_name() {
        let resolved = ResolvedOptions::resolve(&GenerateOptions::new("mint", "org", "my_coin")).unwrap();
        assert_eq!(resolved.toggles.token_name, "MyCoin");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("my_vesting"), "MyVesting");
        assert_eq!(pascal_case("a__b"), "AB");
        assert_eq!(pascal_case("x1"), "X1");
    }
}
