//! Claim model and status state machine.
//!
//! # Responsibility
//! - Represent a loss/damage report against one contract.
//! - Own the closed set of claim statuses and the allowed transition graph.
//!
//! # Invariants
//! - Status is decoded from a closed code set; unknown codes are rejected.
//! - `Paid` is terminal; `Rejected -> Approved` (appeal) is the only backward edge.

use super::contract::ContractId;
use super::Cents;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub type ClaimId = Uuid;

/// Claim lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Reported, awaiting a decision.
    Filed,
    /// Accepted; counts toward the running coverage total.
    Approved,
    /// Declined. Can be appealed back to `Approved`.
    Rejected,
    /// Reimbursement paid out. Terminal.
    Paid,
}

/// Returned when a persisted or caller-supplied status code is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown claim status `{0}`")]
pub struct UnknownClaimStatus(pub String);

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 4] = [
        ClaimStatus::Filed,
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
        ClaimStatus::Paid,
    ];

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Filed => "filed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }

    /// Whether the state machine has an edge `self -> next`.
    pub fn can_transition_to(self, next: ClaimStatus) -> bool {
        matches!(
            (self, next),
            (Self::Filed, Self::Approved)
                | (Self::Filed, Self::Rejected)
                | (Self::Approved, Self::Paid)
                | (Self::Approved, Self::Rejected)
                | (Self::Rejected, Self::Approved)
        )
    }

    /// Approved and paid claims consume the contract's sum insured.
    pub fn counts_toward_coverage(self) -> bool {
        matches!(self, Self::Approved | Self::Paid)
    }
}

impl Display for ClaimStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for ClaimStatus {
    type Err = UnknownClaimStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "filed" => Ok(Self::Filed),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "paid" => Ok(Self::Paid),
            other => Err(UnknownClaimStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub contract_id: ContractId,
    pub date: NaiveDate,
    pub description: String,
    pub is_theft: bool,
    pub status: ClaimStatus,
    /// Amount the holder may be reimbursed; already clamped at filing time.
    pub reimbursable: Cents,
    pub repaired: bool,
    /// Police file reference; set once authorities have reviewed a theft.
    pub file_reference: Option<String>,
    /// Police outcome recorded with `file_reference`. A denied report keeps
    /// the reference but leaves this `false`.
    #[serde(default)]
    pub police_confirmed: bool,
}

impl Claim {
    /// Creates a claim in `Filed` state.
    pub fn filed(
        id: ClaimId,
        contract_id: ContractId,
        date: NaiveDate,
        description: impl Into<String>,
        is_theft: bool,
        reimbursable: Cents,
    ) -> Self {
        Self {
            id,
            contract_id,
            date,
            description: description.into(),
            is_theft,
            status: ClaimStatus::Filed,
            reimbursable,
            repaired: false,
            file_reference: None,
            police_confirmed: false,
        }
    }

    /// A theft claim is confirmed only by a police report that confirmed it.
    pub fn theft_confirmed(&self) -> bool {
        self.is_theft && self.file_reference.is_some() && self.police_confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::ClaimStatus::{self, *};

    #[test]
    fn transition_graph_matches_lifecycle() {
        let allowed = [
            (Filed, Approved),
            (Filed, Rejected),
            (Approved, Paid),
            (Approved, Rejected),
            (Rejected, Approved),
        ];
        for from in ClaimStatus::ALL {
            for to in ClaimStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn paid_is_terminal() {
        assert!(ClaimStatus::ALL.iter().all(|next| !Paid.can_transition_to(*next)));
    }

    #[test]
    fn codes_round_trip_and_unknown_is_rejected() {
        for status in ClaimStatus::ALL {
            assert_eq!(status.as_code().parse::<ClaimStatus>().unwrap(), status);
        }
        let err = "Reimbursement".parse::<ClaimStatus>().unwrap_err();
        assert_eq!(err.0, "Reimbursement");
    }

    #[test]
    fn denied_police_report_does_not_confirm_theft() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut claim = super::Claim::filed(
            uuid::Uuid::from_u128(1),
            uuid::Uuid::from_u128(2),
            date,
            "bike stolen",
            true,
            100,
        );
        claim.file_reference = Some("PR-9".to_string());
        assert!(!claim.theft_confirmed());
        claim.police_confirmed = true;
        assert!(claim.theft_confirmed());
    }

    #[test]
    fn only_approved_and_paid_count_toward_coverage() {
        assert!(Approved.counts_toward_coverage());
        assert!(Paid.counts_toward_coverage());
        assert!(!Filed.counts_toward_coverage());
        assert!(!Rejected.counts_toward_coverage());
    }
}
