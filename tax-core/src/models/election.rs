use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::BenefitKind;

/// A taxpayer's choices and facts for one tax year.
///
/// Benefits are keyed by [`BenefitKind`]; core and custom benefits are
/// elected the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxpayerElection {
    #[serde(default)]
    pub elected: BTreeSet<BenefitKind>,
    /// Self-declared. Ignored whenever `hours_worked` is recorded, even when
    /// `false` and the recorded hours reach the minimum.
    #[serde(default)]
    pub meets_hours_criterion: bool,
    pub hours_worked: Option<u32>,
    pub years_as_entrepreneur: Option<u32>,
    /// How many earlier years each capped benefit has been used.
    #[serde(default)]
    pub usage_counts: BTreeMap<BenefitKind, u32>,
}

impl TaxpayerElection {
    pub fn elect(
        mut self,
        kind: BenefitKind,
    ) -> Self {
        self.elected.insert(kind);
        self
    }

    pub fn is_elected(
        &self,
        kind: &BenefitKind,
    ) -> bool {
        self.elected.contains(kind)
    }

    pub fn usage_count(
        &self,
        kind: &BenefitKind,
    ) -> u32 {
        self.usage_counts.get(kind).copied().unwrap_or(0)
    }

    /// Merges per-benefit enabled flags kept for custom benefits.
    pub fn with_custom_enabled<I, S>(
        mut self,
        ids: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.elected
            .extend(ids.into_iter().map(|id| BenefitKind::parse(id.as_ref())));
        self
    }

    /// Same facts with nothing elected.
    pub fn without_benefits(&self) -> Self {
        Self {
            elected: BTreeSet::new(),
            ..self.clone()
        }
    }
}

/// Settings record in the shape older storage and screens use: one
/// `applies_*` flag per core benefit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxpayerSettings {
    #[serde(default)]
    pub applies_zelfstandigenaftrek: bool,
    #[serde(default)]
    pub applies_startersaftrek: bool,
    #[serde(default)]
    pub applies_mkb_winstvrijstelling: bool,
    #[serde(default)]
    pub meets_hours_criterion: bool,
    #[serde(default)]
    pub starter_years_used: u32,
}

impl From<TaxpayerSettings> for TaxpayerElection {
    fn from(settings: TaxpayerSettings) -> Self {
        let flags = [
            (
                settings.applies_zelfstandigenaftrek,
                BenefitKind::SelfEmployedDeduction,
            ),
            (settings.applies_startersaftrek, BenefitKind::StarterDeduction),
            (
                settings.applies_mkb_winstvrijstelling,
                BenefitKind::SmeProfitExemption,
            ),
        ];

        let mut usage_counts = BTreeMap::new();
        if settings.starter_years_used > 0 {
            usage_counts.insert(BenefitKind::StarterDeduction, settings.starter_years_used);
        }

        Self {
            elected: flags
                .into_iter()
                .filter_map(|(applies, kind)| applies.then_some(kind))
                .collect(),
            meets_hours_criterion: settings.meets_hours_criterion,
            hours_worked: None,
            years_as_entrepreneur: None,
            usage_counts,
        }
    }
}
