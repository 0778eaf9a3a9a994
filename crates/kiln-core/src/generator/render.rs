//! Renders a [`ResolvedOptions`] into a [`GeneratedProject`].
//!
//! Catalogue templates share one flat context ([`ProjectContext`]); the custom template
//! gets its type declarations straight from the parsed datum and redeemer, and its
//! validator body from [`compose`](crate::features::compose).

use serde::Serialize;
use serde_json::json;

use super::{GeneratedFile, GeneratedProject};
use crate::catalogue::Purpose;
use crate::error::RenderError;
use crate::features::{compose, ValidatorNames};
use crate::options::{pascal_case, CustomSpec, ResolvedOptions};
use crate::spec_parser::{FieldSpec, FieldType};
use crate::templates::embedded::{self, TemplateSources};
use crate::templates::renderer::TemplateRenderer;
use crate::version::{PINNED_COMPILER, PINNED_STDLIB};

/// Plutus version written to every manifest.
pub const PLUTUS_VERSION: &str = "v3";

/// Variables available to every catalogue template.
#[derive(Debug, Serialize)]
struct ProjectContext<'a> {
    namespace: &'a str,
    project_name: &'a str,
    module_path: String,
    validator_name: &'a str,
    description: &'a str,
    compiler_version: String,
    plutus_version: &'static str,
    stdlib_version: String,
    time_lock: bool,
    cancellable: bool,
    partial_claim: bool,
    token_name: &'a str,
    asset_name: &'a str,
}

impl<'a> ProjectContext<'a> {
    fn new(opts: &'a ResolvedOptions) -> Self {
        Self {
            namespace: &opts.namespace,
            project_name: &opts.project_name,
            module_path: module_path(opts),
            validator_name: &opts.validator_name,
            description: opts.template.description,
            compiler_version: format!("v{PINNED_COMPILER}"),
            plutus_version: PLUTUS_VERSION,
            stdlib_version: format!("v{PINNED_STDLIB}"),
            time_lock: opts.toggles.time_lock,
            cancellable: opts.toggles.cancellable,
            partial_claim: opts.toggles.partial_claim,
            token_name: &opts.toggles.token_name,
            asset_name: &opts.toggles.asset_name,
        }
    }
}

/// A variant of the custom redeemer type.
#[derive(Debug, Serialize)]
struct VariantContext<'a> {
    variant: String,
    fields: &'a [FieldSpec],
}

/// Renders projects from the embedded templates.
#[derive(Default)]
pub struct ProjectRenderer {
    renderer: TemplateRenderer,
}

impl ProjectRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manifest, optional scanner profile, types module, library modules, validators.
    pub fn render(&self, opts: &ResolvedOptions) -> Result<GeneratedProject, RenderError> {
        let ctx = ProjectContext::new(opts);
        let mut project = GeneratedProject::new();

        project.push(GeneratedFile::new(
            "aiken.toml",
            self.renderer.render(embedded::AIKEN_TOML, &ctx)?,
        ))?;
        if let Some(profile) = &opts.scan_profile {
            project.push(GeneratedFile::new(
                ".aikido.toml",
                self.renderer.render(embedded::AIKIDO_TOML, profile)?,
            ))?;
        }

        let lib = format!("lib/{}", ctx.module_path);
        let Some(sources) = embedded::sources(opts.template.slug) else {
            let (types, validator) = self.render_custom(opts)?;
            project.push(GeneratedFile::new(format!("{lib}/types.ak"), types))?;
            project.push(GeneratedFile::new(
                format!("validators/{}.ak", opts.validator_name),
                validator,
            ))?;
            return Ok(project);
        };

        project.push(GeneratedFile::new(
            format!("{lib}/types.ak"),
            self.renderer.render(sources.types, &ctx)?,
        ))?;
        for module in sources.lib_modules {
            project.push(GeneratedFile::new(
                format!("{lib}/{}.ak", module.module),
                self.renderer.render(module.source, &ctx)?,
            ))?;
        }
        for validator in sources.validators {
            project.push(GeneratedFile::new(
                format!("validators/{}{}.ak", opts.validator_name, validator.suffix),
                self.renderer.render(validator.source, &ctx)?,
            ))?;
        }

        tracing::debug!(
            template = opts.template.slug,
            validators = sources.validators.len(),
            files = project.len(),
            "rendered project"
        );
        Ok(project)
    }

    /// The project plus a TypeScript client under `sdk/`.
    ///
    /// Fails with [`RenderError::UnsupportedOperation`] before rendering anything when the
    /// template has no SDK.
    pub fn render_sdk(&self, opts: &ResolvedOptions) -> Result<GeneratedProject, RenderError> {
        let sources = embedded::sources(opts.template.slug)
            .filter(|_| opts.template.supports_sdk)
            .and_then(|s| s.sdk_types.map(|sdk| (s, sdk)));
        let Some((sources, sdk_types)) = sources else {
            return Err(RenderError::UnsupportedOperation {
                template: opts.template.slug.to_string(),
                operation: "SDK generation",
            });
        };

        let mut project = self.render(opts)?;
        for file in self.sdk_files(opts, &sources, sdk_types)? {
            project.push(file)?;
        }
        Ok(project)
    }

    fn sdk_files(
        &self,
        opts: &ResolvedOptions,
        sources: &TemplateSources,
        sdk_types: &str,
    ) -> Result<Vec<GeneratedFile>, RenderError> {
        let ctx = ProjectContext::new(opts);
        let client_class = format!("{}Client", pascal_case(&opts.project_name));
        let validator_name = format!("{}{}", opts.validator_name, sources.primary_suffix());
        let sdk = json!({
            "namespace": ctx.namespace,
            "project_name": ctx.project_name,
            "module_path": ctx.module_path,
            "package_name": opts.project_name.replace('_', "-"),
            "validator_name": validator_name,
            "handler": opts.purpose.as_str(),
            "client_class": client_class,
            "sdk_datum": sources.datum_type.unwrap_or(""),
            "sdk_redeemer": sources.redeemer_type,
        });

        let header = self.renderer.render(embedded::SDK_PLUTUS_TS, &sdk)?;
        let body = self.renderer.render(sdk_types, &ctx)?;

        Ok(vec![
            GeneratedFile::new(
                "sdk/package.json",
                self.renderer.render(embedded::SDK_PACKAGE_JSON, &sdk)?,
            ),
            GeneratedFile::new(
                "sdk/tsconfig.json",
                self.renderer.render(embedded::SDK_TSCONFIG, &sdk)?,
            ),
            GeneratedFile::new("sdk/src/types.ts", format!("{header}\n{body}")),
            GeneratedFile::new(
                "sdk/src/client.ts",
                self.renderer.render(embedded::SDK_CLIENT_TS, &sdk)?,
            ),
            GeneratedFile::new(
                "sdk/src/index.ts",
                self.renderer.render(embedded::SDK_INDEX_TS, &sdk)?,
            ),
        ])
    }

    fn render_custom(&self, opts: &ResolvedOptions) -> Result<(String, String), RenderError> {
        let (Some(spec), Some(resolved)) = (&opts.custom, &opts.features) else {
            return Err(RenderError::Template(
                "custom template rendered without parsed custom input".into(),
            ));
        };

        let pascal = pascal_case(&opts.project_name);
        let datum_type = format!("{pascal}Datum");
        let redeemer_type = format!("{pascal}Action");
        let has_datum = !spec.datum_fields.is_empty();

        let types = self.renderer.render(
            embedded::CUSTOM_TYPES,
            &json!({
                "project_name": opts.project_name,
                "uses_address": uses_address(spec),
                "datum_type": datum_type,
                "redeemer_type": redeemer_type,
                "datum_fields": spec.datum_fields,
                "actions": variants(spec),
            }),
        )?;

        let composed = compose(
            &self.renderer,
            spec,
            resolved,
            ValidatorNames {
                validator: &opts.validator_name,
                datum_type: &datum_type,
                redeemer_type: &redeemer_type,
            },
        )?;

        let mut exported: Vec<String> = Vec::new();
        if has_datum {
            exported.push(datum_type.clone());
        }
        exported.push(redeemer_type.clone());
        exported.extend(spec.redeemer_actions.iter().map(|a| a.variant_name()));
        let types_import = format!("use {}/types.{{{}}}", module_path(opts), exported.join(", "));

        let names = resolved.names();
        let feature_list = if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        };

        let validator = self.renderer.render(
            embedded::CUSTOM_VALIDATOR,
            &json!({
                "imports": composed.imports,
                "types_import": types_import,
                "feature_list": feature_list,
                "validator_name": opts.validator_name,
                "params": composed.param_list(),
                "is_spend": spec.purpose == Purpose::Spend,
                "datum_type": datum_type,
                "redeemer_type": redeemer_type,
                "preamble": composed.preamble,
                "branches": composed.branches,
                "helpers": composed.helpers,
                "tests": composed.tests,
            }),
        )?;
        Ok((types, validator))
    }
}

fn module_path(opts: &ResolvedOptions) -> String {
    format!("{}/{}", opts.namespace, opts.project_name)
}

fn uses_address(spec: &CustomSpec) -> bool {
    spec.datum_fields
        .iter()
        .chain(spec.redeemer_actions.iter().flat_map(|a| a.fields.iter()))
        .any(|f| f.ty == FieldType::Address)
}

fn variants(spec: &CustomSpec) -> Vec<VariantContext<'_>> {
    spec.redeemer_actions
        .iter()
        .map(|a| VariantContext {
            variant: a.variant_name(),
            fields: &a.fields,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CustomInput, GenerateOptions};

    fn render(options: GenerateOptions) -> GeneratedProject {
        let resolved = ResolvedOptions::resolve(&options).unwrap();
        ProjectRenderer::new().render(&resolved).unwrap()
    }

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
    fn test_vesting_layout() {
        let project = render(GenerateOptions {
            cancellable: true,
            partial_claim: true,
            ..GenerateOptions::new("vesting", "myorg", "my_vesting")
        });
        let paths: Vec<_> = project.paths().collect();
        assert_eq!(
            paths,
            vec![
                "aiken.toml",
                "lib/myorg/my_vesting/types.ak",
                "validators/my_vesting_vesting.ak",
            ]
        );
        let manifest = &project.get("aiken.toml").unwrap().content;
        assert!(manifest.contains("name = \"myorg/my_vesting\""));
        assert!(manifest.contains("compiler = \"v1.1.21\""));
        assert!(manifest.contains("plutus = \"v3\""));

        let types = &project.get("lib/myorg/my_vesting/types.ak").unwrap().content;
        assert!(types.contains("Claim { amount: Int }"));
        assert!(types.contains("Cancel"));
        let validator = &project.get("validators/my_vesting_vesting.ak").unwrap().content;
        assert!(validator.contains("validator my_vesting_vesting"));
        assert!(validator.contains("use myorg/my_vesting/types."));
    }

    #[test]
    fn test_every_catalogue_template_renders() {
        for template in crate::catalogue::templates().iter().filter(|t| !t.is_custom()) {
            let project = render(GenerateOptions::new(template.slug, "org", "proj"));
            let sources = embedded::sources(template.slug).unwrap();
            assert_eq!(
                project.len(),
                2 + sources.lib_modules.len() + sources.validators.len(),
                "{}",
                template.slug
            );
            for file in project.files() {
                assert!(!file.content.contains("{{"), "{} {}", template.slug, file.path);
            }
        }
    }

    #[test]
    fn test_scan_profile_adds_config() {
        let project = render(GenerateOptions {
            scan_profile: Some("strict".into()),
            ..GenerateOptions::new("escrow", "org", "deal")
        });
        let config = &project.get(".aikido.toml").unwrap().content;
        assert!(config.contains("fail_on = \"medium\""));
        assert!(config.contains("include_tests = true"));
    }

    #[test]
    fn test_simple_mint_names() {
        let project = render(GenerateOptions {
            time_lock: true,
            token_name: Some("Gold".into()),
            ..GenerateOptions::new("mint", "org", "coin")
        });
        let validator = &project.get("validators/coin_mint.ak").unwrap().content;
        assert!(validator.contains("validator coin_mint"));
        assert!(validator.contains("Gold"));
    }

    #[test]
    fn test_custom_spend_render() {
        let project = render(custom(
            "spend",
            "sig,timelock,ref-safety",
            "owner:ByteArray,deadline:Int,payee:Address",
            "Withdraw(amount:Int),Close",
        ));
        let types = &project.get("lib/acme/vault/types.ak").unwrap().content;
        assert!(types.contains("pub type VaultDatum {"));
        assert!(types.contains("  deadline: Int,"));
        assert!(types.contains("use cardano/address.{Address}"));
        assert!(types.contains("  Withdraw {\n    amount: Int,\n  }"));
        assert!(types.contains("  Close\n"));

        let validator = &project.get("validators/vault_validator.ak").unwrap().content;
        assert!(validator.contains("use acme/vault/types.{VaultDatum, VaultAction, Withdraw, Close}"));
        assert!(validator.contains("validator vault_validator(admin_pkh: ByteArray) {"));
        assert!(validator.contains(
            "/// Features: signature-auth, timelock, datum-continuity, reference-safety"
        ));
        assert!(validator.contains("datum_opt: Option<VaultDatum>"));
        assert!(validator.contains("Withdraw { .. } -> {"));
        assert!(validator.contains("test withdraw_before_deadline_fails() fail {"));
    }

    #[test]
    fn test_custom_mint_render() {
        let project = render(custom("mint", "burn", "", "Mint,Burn"));
        let types = &project.get("lib/acme/vault/types.ak").unwrap().content;
        assert!(!types.contains("VaultDatum"));
        let validator = &project.get("validators/vault_mint.ak").unwrap().content;
        assert!(validator.contains("validator vault_mint {"));
        assert!(validator.contains("mint(redeemer: VaultAction, policy_id: PolicyId, self: Transaction)"));
        assert!(validator.contains("use acme/vault/types.{VaultAction, Mint, Burn}"));
        assert!(validator.contains("/// Features: burn-verification"));
    }

    #[test]
    fn test_sdk_files() {
        let resolved =
            ResolvedOptions::resolve(&GenerateOptions::new("vesting", "myorg", "my_vesting")).unwrap();
        let project = ProjectRenderer::new().render_sdk(&resolved).unwrap();
        assert_eq!(project.len(), 8);
        let client = &project.get("sdk/src/client.ts").unwrap().content;
        assert!(client.contains("\"my_vesting_vesting.my_vesting_vesting.spend\""));
        assert!(client.contains("export class MyVestingClient"));
        let package = &project.get("sdk/package.json").unwrap().content;
        assert!(package.contains("\"@myorg/my-vesting\""));
        let types = &project.get("sdk/src/types.ts").unwrap().content;
        assert!(types.contains("export type PlutusData"));
        assert!(types.contains("VestingDatum"));
    }

    #[test]
    fn test_sdk_mint_client_has_no_datum() {
        let resolved = ResolvedOptions::resolve(&GenerateOptions::new("mint", "org", "coin")).unwrap();
        let project = ProjectRenderer::new().render_sdk(&resolved).unwrap();
        let client = &project.get("sdk/src/client.ts").unwrap().content;
        assert!(client.contains("coin_mint.coin_mint.mint"));
        assert!(!client.contains("encodeDatum"));
    }

    #[test]
    fn test_sdk_unsupported() {
        for options in [
            GenerateOptions::new("dex_pool", "org", "amm"),
            custom("spend", "", "owner:ByteArray", "Claim"),
        ] {
            let resolved = ResolvedOptions::resolve(&options).unwrap();
            let err = ProjectRenderer::new().render_sdk(&resolved).unwrap_err();
            assert!(matches!(err, RenderError::UnsupportedOperation { .. }));
        }
    }

    #[test]
    fn test_referral_renders_both_validators() {
        let project = render(GenerateOptions::new("referral", "myorg", "invite"));
        let paths: Vec<_> = project.paths().collect();
        assert_eq!(
            paths,
            vec![
                "aiken.toml",
                "lib/myorg/invite/types.ak",
                "lib/myorg/invite/validation.ak",
                "validators/invite_referral_treasury.ak",
                "validators/invite_referral_mint.ak",
            ]
        );
        let validation = &project.get("lib/myorg/invite/validation.ak").unwrap().content;
        assert!(validation.contains("pub fn referral_token_name"));
        assert!(validation.contains("blake2b_256"));
        let treasury = &project.get("validators/invite_referral_treasury.ak").unwrap().content;
        assert!(treasury.contains("validator invite_referral_treasury(referral_policy: PolicyId)"));
        assert!(treasury.contains("use myorg/invite/validation.{"));
        let mint = &project.get("validators/invite_referral_mint.ak").unwrap().content;
        assert!(mint.contains("validator invite_referral_mint(admin: ByteArray)"));
        assert!(mint.contains("invite_referral_mint.mint("));
    }

    #[test]
    fn test_referral_sdk_targets_treasury() {
        let resolved =
            ResolvedOptions::resolve(&GenerateOptions::new("referral_system", "myorg", "invite")).unwrap();
        let project = ProjectRenderer::new().render_sdk(&resolved).unwrap();
        let client = &project.get("sdk/src/client.ts").unwrap().content;
        assert!(client.contains("\"invite_referral_treasury.invite_referral_treasury.spend\""));
        assert!(client.contains("type ReferralTreasuryDatum"));
        let types = &project.get("sdk/src/types.ts").unwrap().content;
        assert!(types.contains("invite_referral_mint.invite_referral_mint.mint"));
        assert!(types.contains("export function encodeMintRedeemer"));
    }

    #[test]
    fn test_oracle_sdk() {
        let resolved = ResolvedOptions::resolve(&GenerateOptions::new("oracle", "org", "feed")).unwrap();
        let project = ProjectRenderer::new().render_sdk(&resolved).unwrap();
        assert_eq!(project.len(), 8);
        let client = &project.get("sdk/src/client.ts").unwrap().content;
        assert!(client.contains("feed_settlement.feed_settlement.spend"));
        let types = &project.get("sdk/src/types.ts").unwrap().content;
        assert!(types.contains("strikePrice: bigint"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let options = custom("spend", "value,bounded", "owner:ByteArray,balance:Int", "Deposit(amount:Int)");
        assert_eq!(render(options.clone()).fingerprint(), render(options).fingerprint());
    }
}
