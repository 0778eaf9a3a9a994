//! Static registry of templates and composable features.
//!
//! Both tables are built once on first use and never mutated, so lookups are lock-free and
//! safe to share across threads. Slugs and feature names accept a few short aliases
//! (`mint`, `treasury`, `sig`, `ref-safety`, ...) for command-line convenience.

pub mod features;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::features::FeatureGraph;

pub use features::{ActionScope, Feature, Fragment};

/// Operational mode of a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Spend,
    Mint,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Spend => "spend",
            Purpose::Mint => "mint",
        }
    }
}

impl FromStr for Purpose {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spend" => Ok(Purpose::Spend),
            "mint" => Ok(Purpose::Mint),
            _ => Err(ValidationError::InvalidPurpose(s.to_string())),
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A template-specific toggle or input recognized by [`GenerateOptions`](crate::options::GenerateOptions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateOption {
    TimeLock,
    TokenName,
    AssetName,
    Cancellable,
    PartialClaim,
    Purpose,
    Features,
    Datum,
    Redeemer,
}

impl TemplateOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateOption::TimeLock => "time_lock",
            TemplateOption::TokenName => "token_name",
            TemplateOption::AssetName => "asset_name",
            TemplateOption::Cancellable => "cancellable",
            TemplateOption::PartialClaim => "partial_claim",
            TemplateOption::Purpose => "purpose",
            TemplateOption::Features => "features",
            TemplateOption::Datum => "datum",
            TemplateOption::Redeemer => "redeemer",
        }
    }
}

impl fmt::Display for TemplateOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named blueprint producing a fixed project shape.
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub slug: &'static str,
    #[serde(skip)]
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub allowed_options: &'static [TemplateOption],
    pub supports_sdk: bool,
    /// Fixed purpose for catalogue templates; `None` when the caller chooses (custom).
    pub purpose: Option<Purpose>,
    /// Appended to the project name to form the validator module name.
    #[serde(skip)]
    pub validator_suffix: &'static str,
}

impl Template {
    pub fn is_custom(&self) -> bool {
        self.slug == CUSTOM
    }

    pub fn allows(&self, option: TemplateOption) -> bool {
        self.allowed_options.contains(&option)
    }
}

/// Slug of the free-form composable template.
pub const CUSTOM: &str = "custom";

static TEMPLATES: &[Template] = &[
    Template {
        slug: "simple_mint",
        aliases: &["simple-mint", "mint"],
        description: "CIP-25 minting policy with admin signature and optional time-lock",
        allowed_options: &[
            TemplateOption::TimeLock,
            TemplateOption::TokenName,
            TemplateOption::AssetName,
        ],
        supports_sdk: true,
        purpose: Some(Purpose::Mint),
        validator_suffix: "mint",
    },
    Template {
        slug: "vesting",
        aliases: &[],
        description: "Time-locked fund release with beneficiary claim and optional cancel",
        allowed_options: &[TemplateOption::Cancellable, TemplateOption::PartialClaim],
        supports_sdk: true,
        purpose: Some(Purpose::Spend),
        validator_suffix: "vesting",
    },
    Template {
        slug: "escrow",
        aliases: &[],
        description: "Two-party escrow with deadline, completion, and mutual cancellation",
        allowed_options: &[],
        supports_sdk: true,
        purpose: Some(Purpose::Spend),
        validator_suffix: "escrow",
    },
    Template {
        slug: "multisig_treasury",
        aliases: &["multisig-treasury", "treasury"],
        description: "N-of-M multisig treasury with deposit, withdraw, datum continuity, and 2 ADA floor",
        allowed_options: &[],
        supports_sdk: true,
        purpose: Some(Purpose::Spend),
        validator_suffix: "treasury",
    },
    Template {
        slug: "oracle_settlement",
        aliases: &["oracle-settlement", "oracle"],
        description: "Oracle-gated settlement with deadline and buyer reclaim",
        allowed_options: &[],
        supports_sdk: true,
        purpose: Some(Purpose::Spend),
        validator_suffix: "settlement",
    },
    Template {
        slug: "nft_marketplace",
        aliases: &["nft-marketplace", "marketplace"],
        description: "NFT marketplace with list, buy, delist, and price updates",
        allowed_options: &[],
        supports_sdk: true,
        purpose: Some(Purpose::Spend),
        validator_suffix: "marketplace",
    },
    Template {
        slug: "staking_pool",
        aliases: &["staking-pool", "staking"],
        description: "Staking pool with deposit, time-locked withdraw, and admin rewards",
        allowed_options: &[],
        supports_sdk: true,
        purpose: Some(Purpose::Spend),
        validator_suffix: "pool",
    },
    Template {
        slug: "referral_system",
        aliases: &["referral-system", "referral"],
        description: "Referral token policy plus reward treasury, with anti-sybil minting rules",
        allowed_options: &[],
        supports_sdk: true,
        purpose: Some(Purpose::Spend),
        validator_suffix: "referral",
    },
    Template {
        slug: "dex_pool",
        aliases: &["dex-pool", "dex"],
        description: "Constant-product AMM pool with swap fee, liquidity shares, and fee management",
        allowed_options: &[],
        supports_sdk: false,
        purpose: Some(Purpose::Spend),
        validator_suffix: "pool",
    },
    Template {
        slug: "lending_pool",
        aliases: &["lending-pool", "lending"],
        description: "Collateralized credit line with supply, borrow, repay, and admin price feed",
        allowed_options: &[],
        supports_sdk: false,
        purpose: Some(Purpose::Spend),
        validator_suffix: "lending",
    },
    Template {
        slug: "dao_governance",
        aliases: &["dao-governance", "governance"],
        description: "Token-weighted treasury proposals with quorum, execution, and reclaim",
        allowed_options: &[],
        supports_sdk: false,
        purpose: Some(Purpose::Spend),
        validator_suffix: "governance",
    },
    Template {
        slug: "streaming_payments",
        aliases: &["streaming-payments", "streaming"],
        description: "Payment stream released in time-based tranches, with cancel and top-up",
        allowed_options: &[],
        supports_sdk: false,
        purpose: Some(Purpose::Spend),
        validator_suffix: "stream",
    },
    Template {
        slug: CUSTOM,
        aliases: &[],
        description: "Custom validator with composable features (sig, timelock, datum-continuity, ...)",
        allowed_options: &[
            TemplateOption::Purpose,
            TemplateOption::Features,
            TemplateOption::Datum,
            TemplateOption::Redeemer,
        ],
        supports_sdk: false,
        purpose: None,
        validator_suffix: "validator",
    },
];

static TEMPLATE_INDEX: LazyLock<BTreeMap<&'static str, &'static Template>> = LazyLock::new(|| {
    let mut index = BTreeMap::new();
    for template in TEMPLATES {
        index.insert(template.slug, template);
        for alias in template.aliases {
            index.insert(*alias, template);
        }
    }
    index
});

static FEATURE_GRAPH: LazyLock<FeatureGraph> = LazyLock::new(|| {
    FeatureGraph::build(features::builtin())
        .expect("built-in feature catalogue must be acyclic with declared dependencies")
});

/// All templates in declaration order.
pub fn templates() -> &'static [Template] {
    TEMPLATES
}

/// Look up a template by slug or alias (case-insensitive).
pub fn template(slug: &str) -> Result<&'static Template, ValidationError> {
    TEMPLATE_INDEX
        .get(slug.trim().to_ascii_lowercase().as_str())
        .copied()
        .ok_or_else(|| ValidationError::UnknownTemplate {
            slug: slug.to_string(),
            available: TEMPLATES.iter().map(|t| t.slug).collect::<Vec<_>>().join(", "),
        })
}

/// The process-wide feature dependency graph.
pub fn feature_graph() -> &'static FeatureGraph {
    &FEATURE_GRAPH
}

/// All features in declaration order.
pub fn features() -> &'static [Feature] {
    FEATURE_GRAPH.features()
}

/// Look up a feature by name or alias.
pub fn feature(name: &str) -> Result<&'static Feature, ValidationError> {
    FEATURE_GRAPH
        .lookup(name)
        .map(|idx| FEATURE_GRAPH.feature(idx))
        .ok_or_else(|| ValidationError::UnknownFeature {
            name: name.to_string(),
            available: FEATURE_GRAPH
                .features()
                .iter()
                .map(|f| f.name)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_lookup_by_slug_and_alias() {
        assert_eq!(template("vesting").unwrap().slug, "vesting");
        assert_eq!(template("mint").unwrap().slug, "simple_mint");
        assert_eq!(template("Treasury").unwrap().slug, "multisig_treasury");
        assert_eq!(template("oracle").unwrap().slug, "oracle_settlement");
        assert_eq!(template("dex").unwrap().slug, "dex_pool");
        assert_eq!(template("streaming-payments").unwrap().slug, "streaming_payments");
    }

    #[test]
    fn test_template_lookup_unknown() {
        let err = template("perpetuals").unwrap_err();
        assert!(matches!(err, ValidationError::UnknownTemplate { .. }));
        assert!(err.to_string().contains("vesting"));
    }

    #[test]
    fn test_slugs_unique_and_custom_last() {
        let mut slugs: Vec<_> = templates().iter().map(|t| t.slug).collect();
        assert_eq!(slugs.last(), Some(&CUSTOM));
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), templates().len());
    }

    #[test]
    fn test_builtin_feature_graph_builds() {
        assert_eq!(features().len(), features::builtin().len());
        assert_eq!(feature("sig").unwrap().name, "signature-auth");
        assert_eq!(feature("ref-safety").unwrap().name, "reference-safety");
        assert!(feature("teleport").is_err());
    }

    #[test]
    fn test_purpose_parse() {
        assert_eq!("spend".parse::<Purpose>(), Ok(Purpose::Spend));
        assert_eq!(" MINT ".parse::<Purpose>(), Ok(Purpose::Mint));
        assert!("withdraw".parse::<Purpose>().is_err());
    }

    #[test]
    fn test_aliases_do_not_shadow_slugs() {
        let slugs: Vec<_> = templates().iter().map(|t| t.slug).collect();
        for template in templates() {
            for alias in template.aliases {
                assert!(!slugs.contains(alias), "{alias}");
            }
        }
        assert_eq!(TEMPLATE_INDEX.len(), slugs.len() + templates().iter().map(|t| t.aliases.len()).sum::<usize>());
    }

    #[test]
    fn test_custom_purpose_is_open() {
        let custom = template(CUSTOM).unwrap();
        assert!(custom.is_custom());
        assert!(custom.purpose.is_none());
        assert!(!custom.supports_sdk);
    }
}
