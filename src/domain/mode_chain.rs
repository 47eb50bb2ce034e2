//! Tiered fallback: normal → relaxed → force.
//!
//! Tiers are evaluated in configured order through one `evaluate(tier)`
//! callback. The first tier that yields any candidate wins and no later tier
//! is evaluated. When every tier is empty the chain reports exhaustion with
//! the per-tier statistics; it never substitutes a pick.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::domain::config::{ModeConfig, NormalizationConfig};
use crate::domain::indicator::IndicatorSet;
use crate::domain::regime::RegimeState;
use crate::domain::risk_filter::{CandidateFilter, RejectReason};
use crate::domain::scoring::{ScoreCard, rank_order, score};
use crate::domain::snapshot::SymbolSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeTier {
    Normal,
    Relaxed,
    Force,
}

impl ModeTier {
    pub const ALL: [ModeTier; 3] = [ModeTier::Normal, ModeTier::Relaxed, ModeTier::Force];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeTier::Normal => "normal",
            ModeTier::Relaxed => "relaxed",
            ModeTier::Force => "force",
        }
    }
}

impl fmt::Display for ModeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(ModeTier::Normal),
            "relaxed" => Ok(ModeTier::Relaxed),
            "force" => Ok(ModeTier::Force),
            other => Err(format!(
                "unknown mode '{other}', expected normal, relaxed or force"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub symbol: String,
    pub name: String,
    pub tier: ModeTier,
    pub score: ScoreCard,
    pub indicators: IndicatorSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierStats {
    pub tier: ModeTier,
    pub scanned: usize,
    pub passed: usize,
    pub rejected: BTreeMap<RejectReason, usize>,
}

impl TierStats {
    pub fn new(tier: ModeTier) -> Self {
        TierStats {
            tier,
            scanned: 0,
            passed: 0,
            rejected: BTreeMap::new(),
        }
    }

    /// "price_out_of_range=3, below_ma20=2"
    pub fn rejection_summary(&self) -> String {
        if self.rejected.is_empty() {
            return "none".to_string();
        }
        self.rejected
            .iter()
            .map(|(reason, count)| format!("{reason}={count}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Candidates produced by one tier, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSet {
    pub tier: ModeTier,
    pub candidates: Vec<Candidate>,
    pub stats: TierStats,
}

impl CandidateSet {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Highest-ranked candidate; the list is already sorted.
    pub fn into_best(mut self) -> Option<Candidate> {
        if self.is_empty() {
            None
        } else {
            Some(self.candidates.swap_remove(0))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainOutcome {
    pub winner: Candidate,
    pub tier_stats: Vec<TierStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainExhausted {
    pub tried: Vec<ModeTier>,
    pub tier_stats: Vec<TierStats>,
}

impl ChainExhausted {
    /// Comma-joined tier names, e.g. "normal,relaxed,force".
    pub fn tried_label(&self) -> String {
        self.tried
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub fn run_chain<F>(tiers: &[ModeTier], mut evaluate: F) -> Result<ChainOutcome, ChainExhausted>
where
    F: FnMut(ModeTier) -> CandidateSet,
{
    let mut tier_stats = Vec::with_capacity(tiers.len());
    for &tier in tiers {
        let set = evaluate(tier);
        debug!(
            tier = %set.tier,
            scanned = set.stats.scanned,
            passed = set.stats.passed,
            "tier evaluated"
        );
        tier_stats.push(set.stats.clone());
        if let Some(winner) = set.into_best() {
            return Ok(ChainOutcome { winner, tier_stats });
        }
    }
    Err(ChainExhausted {
        tried: tiers.to_vec(),
        tier_stats,
    })
}

/// Filter and score every snapshot under one tier.
pub fn evaluate_tier(
    tier: ModeTier,
    mode: &ModeConfig,
    snapshots: &[SymbolSnapshot],
    regime: RegimeState,
    filter: &dyn CandidateFilter,
    norm: &NormalizationConfig,
) -> CandidateSet {
    let mut stats = TierStats::new(tier);
    let mut candidates = Vec::new();

    for snap in snapshots {
        stats.scanned += 1;
        let report = filter.evaluate(snap, tier, mode, regime);
        if let Some(reason) = report.first_failure() {
            debug!(symbol = %snap.info.symbol, tier = %tier, %reason, "rejected");
            *stats.rejected.entry(reason).or_insert(0) += 1;
            continue;
        }
        let Some(ind) = &snap.indicators else {
            *stats
                .rejected
                .entry(RejectReason::InsufficientHistory)
                .or_insert(0) += 1;
            continue;
        };
        stats.passed += 1;
        candidates.push(Candidate {
            symbol: snap.info.symbol.clone(),
            name: snap.info.name.clone(),
            tier,
            score: score(ind, &mode.weights, norm),
            indicators: ind.clone(),
        });
    }

    candidates.sort_by(|a, b| rank_order(a.score.total, &a.symbol, b.score.total, &b.symbol));
    CandidateSet {
        tier,
        candidates,
        stats,
    }
}
