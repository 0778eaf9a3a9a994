//! Compile-time embedded templates.
//!
//! Paths are relative to this file (`crates/kiln-core/src/templates/embedded.rs`). To add a
//! template, place it under `templates/`, add a constant here, and wire it into
//! [`sources`].

// -------------------------------------------------------
// Project scaffolding
// -------------------------------------------------------

pub const AIKEN_TOML: &str = include_str!("../../../../templates/base/aiken.toml.hbs");
pub const AIKIDO_TOML: &str = include_str!("../../../../templates/base/aikido.toml.hbs");

// -------------------------------------------------------
// Catalogue validators
// -------------------------------------------------------

pub const SIMPLE_MINT_TYPES: &str = include_str!("../../../../templates/simple_mint/types.ak.hbs");
pub const SIMPLE_MINT_VALIDATOR: &str = include_str!("../../../../templates/simple_mint/validator.ak.hbs");
pub const SIMPLE_MINT_SDK_TYPES: &str = include_str!("../../../../templates/simple_mint/sdk/types.ts.hbs");

pub const VESTING_TYPES: &str = include_str!("../../../../templates/vesting/types.ak.hbs");
pub const VESTING_VALIDATOR: &str = include_str!("../../../../templates/vesting/validator.ak.hbs");
pub const VESTING_SDK_TYPES: &str = include_str!("../../../../templates/vesting/sdk/types.ts.hbs");

pub const ESCROW_TYPES: &str = include_str!("../../../../templates/escrow/types.ak.hbs");
pub const ESCROW_VALIDATOR: &str = include_str!("../../../../templates/escrow/validator.ak.hbs");
pub const ESCROW_SDK_TYPES: &str = include_str!("../../../../templates/escrow/sdk/types.ts.hbs");

pub const TREASURY_TYPES: &str = include_str!("../../../../templates/multisig_treasury/types.ak.hbs");
pub const TREASURY_VALIDATOR: &str = include_str!("../../../../templates/multisig_treasury/validator.ak.hbs");
pub const TREASURY_SDK_TYPES: &str = include_str!("../../../../templates/multisig_treasury/sdk/types.ts.hbs");

pub const SETTLEMENT_TYPES: &str = include_str!("../../../../templates/oracle_settlement/types.ak.hbs");
pub const SETTLEMENT_VALIDATOR: &str = include_str!("../../../../templates/oracle_settlement/validator.ak.hbs");
pub const SETTLEMENT_SDK_TYPES: &str = include_str!("../../../../templates/oracle_settlement/sdk/types.ts.hbs");

pub const MARKETPLACE_TYPES: &str = include_str!("../../../../templates/nft_marketplace/types.ak.hbs");
pub const MARKETPLACE_VALIDATOR: &str = include_str!("../../../../templates/nft_marketplace/validator.ak.hbs");
pub const MARKETPLACE_SDK_TYPES: &str = include_str!("../../../../templates/nft_marketplace/sdk/types.ts.hbs");

pub const STAKING_TYPES: &str = include_str!("../../../../templates/staking_pool/types.ak.hbs");
pub const STAKING_VALIDATOR: &str = include_str!("../../../../templates/staking_pool/validator.ak.hbs");
pub const STAKING_SDK_TYPES: &str = include_str!("../../../../templates/staking_pool/sdk/types.ts.hbs");

pub const REFERRAL_TYPES: &str = include_str!("../../../../templates/referral_system/types.ak.hbs");
pub const REFERRAL_VALIDATION: &str = include_str!("../../../../templates/referral_system/validation.ak.hbs");
pub const REFERRAL_TREASURY_VALIDATOR: &str =
    include_str!("../../../../templates/referral_system/treasury_validator.ak.hbs");
pub const REFERRAL_MINT_VALIDATOR: &str =
    include_str!("../../../../templates/referral_system/mint_validator.ak.hbs");
pub const REFERRAL_SDK_TYPES: &str = include_str!("../../../../templates/referral_system/sdk/types.ts.hbs");

pub const DEX_TYPES: &str = include_str!("../../../../templates/dex_pool/types.ak.hbs");
pub const DEX_VALIDATOR: &str = include_str!("../../../../templates/dex_pool/validator.ak.hbs");

pub const LENDING_TYPES: &str = include_str!("../../../../templates/lending_pool/types.ak.hbs");
pub const LENDING_VALIDATOR: &str = include_str!("../../../../templates/lending_pool/validator.ak.hbs");

pub const GOVERNANCE_TYPES: &str = include_str!("../../../../templates/dao_governance/types.ak.hbs");
pub const GOVERNANCE_VALIDATOR: &str = include_str!("../../../../templates/dao_governance/validator.ak.hbs");

pub const STREAM_TYPES: &str = include_str!("../../../../templates/streaming_payments/types.ak.hbs");
pub const STREAM_VALIDATOR: &str = include_str!("../../../../templates/streaming_payments/validator.ak.hbs");

// -------------------------------------------------------
// Custom (composed) validator
// -------------------------------------------------------

pub const CUSTOM_TYPES: &str = include_str!("../../../../templates/custom/types.ak.hbs");
pub const CUSTOM_VALIDATOR: &str = include_str!("../../../../templates/custom/validator.ak.hbs");

// -------------------------------------------------------
// TypeScript SDK
// -------------------------------------------------------

pub const SDK_PACKAGE_JSON: &str = include_str!("../../../../templates/sdk_base/package.json.hbs");
pub const SDK_TSCONFIG: &str = include_str!("../../../../templates/sdk_base/tsconfig.json.hbs");
pub const SDK_PLUTUS_TS: &str = include_str!("../../../../templates/sdk_base/plutus.ts.hbs");
pub const SDK_CLIENT_TS: &str = include_str!("../../../../templates/sdk_base/client.ts.hbs");
pub const SDK_INDEX_TS: &str = include_str!("../../../../templates/sdk_base/index.ts.hbs");

/// One validator module of a template.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorSource {
    /// Appended to the project's validator name, for the file and the validator it declares.
    pub suffix: &'static str,
    pub source: &'static str,
}

/// A library module rendered next to `types.ak`, at `lib/<module_path>/<module>.ak`.
#[derive(Debug, Clone, Copy)]
pub struct LibSource {
    pub module: &'static str,
    pub source: &'static str,
}

/// Sources of one catalogue template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateSources {
    pub types: &'static str,
    pub lib_modules: &'static [LibSource],
    /// Never empty. The first entry is the validator the SDK client targets.
    pub validators: &'static [ValidatorSource],
    /// Template-specific `sdk/src/types.ts` body, for templates that support the SDK.
    pub sdk_types: Option<&'static str>,
    /// Datum and redeemer type names used by the SDK client.
    pub datum_type: Option<&'static str>,
    pub redeemer_type: &'static str,
}

impl TemplateSources {
    /// Name suffix of the validator the SDK client targets.
    pub fn primary_suffix(&self) -> &'static str {
        self.validators.first().map_or("", |v| v.suffix)
    }
}

/// A template with one validator named after the project and no extra library modules.
const fn single(
    types: &'static str,
    validator: &'static [ValidatorSource],
    sdk_types: Option<&'static str>,
    datum_type: Option<&'static str>,
    redeemer_type: &'static str,
) -> TemplateSources {
    TemplateSources {
        types,
        lib_modules: &[],
        validators: validator,
        sdk_types,
        datum_type,
        redeemer_type,
    }
}

macro_rules! validator {
    ($source:expr) => {
        &[ValidatorSource {
            suffix: "",
            source: $source,
        }]
    };
}

/// Sources for a catalogue slug. `None` for the custom template, which is composed.
pub fn sources(slug: &str) -> Option<TemplateSources> {
    let sources = match slug {
        "simple_mint" => single(
            SIMPLE_MINT_TYPES,
            validator!(SIMPLE_MINT_VALIDATOR),
            Some(SIMPLE_MINT_SDK_TYPES),
            None,
            "MintAction",
        ),
        "vesting" => single(
            VESTING_TYPES,
            validator!(VESTING_VALIDATOR),
            Some(VESTING_SDK_TYPES),
            Some("VestingDatum"),
            "VestingRedeemer",
        ),
        "escrow" => single(
            ESCROW_TYPES,
            validator!(ESCROW_VALIDATOR),
            Some(ESCROW_SDK_TYPES),
            Some("EscrowDatum"),
            "EscrowAction",
        ),
        "multisig_treasury" => single(
            TREASURY_TYPES,
            validator!(TREASURY_VALIDATOR),
            Some(TREASURY_SDK_TYPES),
            Some("TreasuryDatum"),
            "TreasuryAction",
        ),
        "oracle_settlement" => single(
            SETTLEMENT_TYPES,
            validator!(SETTLEMENT_VALIDATOR),
            Some(SETTLEMENT_SDK_TYPES),
            Some("SettlementDatum"),
            "SettlementAction",
        ),
        "nft_marketplace" => single(
            MARKETPLACE_TYPES,
            validator!(MARKETPLACE_VALIDATOR),
            Some(MARKETPLACE_SDK_TYPES),
            Some("ListingDatum"),
            "MarketplaceAction",
        ),
        "staking_pool" => single(
            STAKING_TYPES,
            validator!(STAKING_VALIDATOR),
            Some(STAKING_SDK_TYPES),
            Some("StakeDatum"),
            "StakeAction",
        ),
        "referral_system" => TemplateSources {
            types: REFERRAL_TYPES,
            lib_modules: &[LibSource {
                module: "validation",
                source: REFERRAL_VALIDATION,
            }],
            validators: &[
                ValidatorSource {
                    suffix: "_treasury",
                    source: REFERRAL_TREASURY_VALIDATOR,
                },
                ValidatorSource {
                    suffix: "_mint",
                    source: REFERRAL_MINT_VALIDATOR,
                },
            ],
            sdk_types: Some(REFERRAL_SDK_TYPES),
            datum_type: Some("ReferralTreasuryDatum"),
            redeemer_type: "ReferralTreasuryAction",
        },
        "dex_pool" => single(DEX_TYPES, validator!(DEX_VALIDATOR), None, Some("PoolDatum"), "PoolAction"),
        "lending_pool" => single(
            LENDING_TYPES,
            validator!(LENDING_VALIDATOR),
            None,
            Some("LendingDatum"),
            "LendingAction",
        ),
        "dao_governance" => single(
            GOVERNANCE_TYPES,
            validator!(GOVERNANCE_VALIDATOR),
            None,
            Some("ProposalDatum"),
            "ProposalAction",
        ),
        "streaming_payments" => single(
            STREAM_TYPES,
            validator!(STREAM_VALIDATOR),
            None,
            Some("StreamDatum"),
            "StreamAction",
        ),
        _ => return None,
    };
    Some(sources)
}
