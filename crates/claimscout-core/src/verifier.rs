use std::collections::HashSet;

use claimscout_api::TitleDetails;

use crate::config::RightsConfig;

/// Outcome of checking a title's companies and networks against the watched ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub is_verified: bool,
    pub holder_name: Option<String>,
}

impl VerificationResult {
    fn verified(name: &str) -> Self {
        Self {
            is_verified: true,
            holder_name: Some(name.to_string()),
        }
    }

    fn rejected() -> Self {
        Self {
            is_verified: false,
            holder_name: None,
        }
    }
}

/// Decides whether a catalog entry belongs to the watched rights holder.
#[derive(Debug, Clone)]
pub struct RightsVerifier {
    company_ids: HashSet<u64>,
    network_ids: HashSet<u64>,
}

impl RightsVerifier {
    pub fn new(
        company_ids: impl IntoIterator<Item = u64>,
        network_ids: impl IntoIterator<Item = u64>,
    ) -> Self {
        Self {
            company_ids: company_ids.into_iter().collect(),
            network_ids: network_ids.into_iter().collect(),
        }
    }

    pub fn from_config(rights: &RightsConfig) -> Self {
        Self::new(
            rights.company_ids.iter().copied(),
            rights.network_ids.iter().copied(),
        )
    }

    /// Companies are checked before networks; the first hit names the holder.
    pub fn verify(&self, details: &TitleDetails) -> VerificationResult {
        if let Some(company) = details
            .companies
            .iter()
            .find(|c| self.company_ids.contains(&c.id))
        {
            return VerificationResult::verified(&company.name);
        }

        if let Some(network) = details
            .networks
            .iter()
            .find(|n| self.network_ids.contains(&n.id))
        {
            return VerificationResult::verified(&network.name);
        }

        VerificationResult::rejected()
    }
}
