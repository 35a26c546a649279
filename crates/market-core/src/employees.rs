//! Employee archetypes, compensation, and chemistry.

use serde::{Deserialize, Serialize};

/// Employee archetype.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EmployeeType {
    Trader,
    Engineer,
    Analyst,
    Quant,
    Recruiter,
    Intern,
}

impl EmployeeType {
    /// All archetypes, in candidate-generation order.
    pub const ALL: [EmployeeType; 6] = [
        EmployeeType::Trader,
        EmployeeType::Engineer,
        EmployeeType::Quant,
        EmployeeType::Analyst,
        EmployeeType::Recruiter,
        EmployeeType::Intern,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Keyed bonus channels fed by employees and external providers.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum BonusKind {
    /// Extra revenue fraction on sells.
    TradeProfit,
    /// Extra factory output fraction.
    FactoryOutput,
    /// Price-noise reduction fraction.
    TrendVisibility,
    /// Extra DAS yield fraction.
    DasYield,
}

/// What an archetype's per-level bonus feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BonusTarget {
    /// Bonus accrues to one keyed channel.
    Keyed(BonusKind),
    /// Interns: a small flat bonus spread across the standard channels.
    Flat,
}

/// Static definition for one archetype.
#[derive(Clone, Debug)]
pub struct EmployeeDef {
    /// Archetype.
    pub kind: EmployeeType,
    /// Display label.
    pub label: &'static str,
    /// Bonus channel this archetype feeds.
    pub bonus: BonusTarget,
    /// Bonus per level.
    pub base_bonus_per_level: f64,
    /// Salary per tick per level.
    pub base_salary_per_tick: f64,
    /// Flavor description.
    pub description: &'static str,
}

/// All archetype definitions, indexed by `EmployeeType`.
pub const EMPLOYEE_DEFS: [EmployeeDef; 6] = [
    EmployeeDef {
        kind: EmployeeType::Trader,
        label: "Trader",
        bonus: BonusTarget::Keyed(BonusKind::TradeProfit),
        base_bonus_per_level: 0.04,
        base_salary_per_tick: 0.5,
        description: "Reduces effective spread on trades",
    },
    EmployeeDef {
        kind: EmployeeType::Engineer,
        label: "Engineer",
        bonus: BonusTarget::Keyed(BonusKind::FactoryOutput),
        base_bonus_per_level: 0.05,
        base_salary_per_tick: 0.6,
        description: "Boosts factory production output",
    },
    EmployeeDef {
        kind: EmployeeType::Analyst,
        label: "Analyst",
        bonus: BonusTarget::Keyed(BonusKind::TrendVisibility),
        base_bonus_per_level: 0.03,
        base_salary_per_tick: 0.45,
        description: "Improves market read accuracy",
    },
    EmployeeDef {
        kind: EmployeeType::Quant,
        label: "Quant",
        bonus: BonusTarget::Keyed(BonusKind::DasYield),
        base_bonus_per_level: 0.04,
        base_salary_per_tick: 0.65,
        description: "Structured products specialist. Boosts DAS yields.",
    },
    EmployeeDef {
        kind: EmployeeType::Recruiter,
        label: "Recruiter",
        bonus: BonusTarget::Keyed(BonusKind::TradeProfit),
        base_bonus_per_level: 0.02,
        base_salary_per_tick: 0.7,
        description: "Maintains department morale across all team compositions",
    },
    EmployeeDef {
        kind: EmployeeType::Intern,
        label: "Intern",
        bonus: BonusTarget::Flat,
        base_bonus_per_level: 0.01,
        base_salary_per_tick: 0.1,
        description: "Provides marginal value at minimal cost. Eager to learn.",
    },
];

/// Look up the static definition for an archetype.
pub fn employee_def(kind: EmployeeType) -> &'static EmployeeDef {
    &EMPLOYEE_DEFS[kind.index()]
}

/// Upfront hire cost as a multiple of per-tick salary.
pub const HIRE_COST_MULTIPLIER: f64 = 10.0;

/// Cash cost of a manual candidate pool refresh.
pub const REFRESH_POOL_BASE_COST: f64 = 5.0;

/// Ticks between automatic candidate pool refreshes.
pub const POOL_REFRESH_TICKS: u32 = 20;

/// Total VP columns allocated; the upper two unlock conditionally.
pub const MAX_VP_SLOTS: usize = 4;

/// VP columns active from the start.
pub const INITIAL_VP_SLOTS: usize = 2;

/// IC report slots per VP column.
pub const ICS_PER_VP: usize = 3;

/// Effectiveness bonus per 100 ticks of tenure (caps at 5 stacks).
pub const TENURE_BONUS_PER_100_TICKS: f64 = 0.05;

/// VP salary and bonus premium over the base rate.
pub const VP_PREMIUM: f64 = 1.5;

/// Morale modifier per tick for an IC reporting to a VP, keyed
/// `[vp archetype][ic archetype]`. Positive = good fit.
pub const CHEMISTRY: [[f64; 6]; 6] = [
    // trader:    trader engineer analyst quant recruiter intern
    [0.4, -0.3, 0.1, 0.2, 0.0, 0.0],
    // engineer
    [-0.3, 0.4, 0.1, 0.0, 0.0, 0.0],
    // analyst
    [0.1, 0.1, 0.4, 0.3, 0.0, -0.2],
    // quant
    [0.2, 0.0, 0.3, 0.4, -0.1, -0.2],
    // recruiter
    [0.2, 0.2, 0.2, 0.1, 0.2, 0.2],
    // intern
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
];

/// Chemistry modifier for an IC of type `ic` reporting to a VP of type `vp`.
pub fn chemistry(vp: EmployeeType, ic: EmployeeType) -> f64 {
    // CHEMISTRY rows/columns follow declaration order, not ALL order.
    CHEMISTRY[vp.index()][ic.index()]
}

/// Candidate first names.
pub const FIRST_NAMES: &[&str] = &[
    "John", "Sam", "Peter", "Will", "Sarah", "Seth", "Jared", "Eric", "Mary", "Ramesh",
    "Kevin", "Jeremy", "Demi", "Stanley", "Simon", "Paul", "Zachary", "Penn", "Aasif",
    "Ashley", "Chad", "Bryce", "Madison", "Synergy", "Pipeline", "Leverage", "Devin",
    "Tanner", "Equity", "Brayden", "Whitney", "Sterling", "Ashton", "Blaine", "Devon",
    "Parker", "Lane", "Camden", "Chandler", "Shelby", "Quinn", "Reese", "Skyler",
    "Taylor",
];

/// Candidate last names.
pub const LAST_NAMES: &[&str] = &[
    "Tuld", "Rogers", "Sullivan", "Emerson", "Robertson", "Bregman", "Cohen", "Dale",
    "Shah", "Spacey", "Irons", "Moore", "Quinto", "Tucci", "Baker", "Bettany",
    "Badgley", "Mandvi", "Williams", "Buzzword", "Disruption", "Paradigm",
    "Blockchain", "Deliverable", "Synergize", "Bandwidth", "Greenfield",
    "Stakeholder", "Verticals", "Optics", "Mindshare", "Throughput", "Scalability",
    "Alignment", "Pivot", "Uplift", "Backlog",
];

/// Deadpan quit messages, played completely straight.
pub const QUIT_MESSAGES: &[&str] = &[
    "has accepted a counteroffer from a Web3 startup",
    "has departed to pursue a consulting opportunity",
    "has filed a voluntary separation agreement",
    "has transitioned to a personal sabbatical",
    "is no longer with the organization effective immediately",
    "has been recruited by a stealth-mode venture",
    "has elected to explore the broader talent marketplace",
    "has resigned citing irreconcilable cultural misalignment",
];

/// Deadpan raise demand messages.
pub const RAISE_MESSAGES: &[&str] = &[
    "has submitted a compensation realignment request",
    "has initiated a market-rate adjustment discussion",
    "requires an equity refresh conversation",
    "has flagged their comp band as below-market",
    "has scheduled a total rewards review",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defs_indexed_by_type() {
        for kind in EmployeeType::ALL {
            assert_eq!(employee_def(kind).kind, kind);
        }
    }

    #[test]
    fn chemistry_matrix_is_bounded() {
        for row in &CHEMISTRY {
            for &v in row {
                assert!((-0.5..=0.5).contains(&v));
            }
        }
    }

    #[test]
    fn interns_are_cheapest() {
        let intern = employee_def(EmployeeType::Intern).base_salary_per_tick;
        for kind in EmployeeType::ALL {
            if kind != EmployeeType::Intern {
                assert!(employee_def(kind).base_salary_per_tick > intern);
            }
        }
    }
}
