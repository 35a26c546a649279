//! HR org chart: VP/IC slots, candidate pool, morale and tenure simulation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use market_core::employees::{
    chemistry, employee_def, BonusTarget, FIRST_NAMES, HIRE_COST_MULTIPLIER, ICS_PER_VP,
    INITIAL_VP_SLOTS, LAST_NAMES, MAX_VP_SLOTS, POOL_REFRESH_TICKS, QUIT_MESSAGES,
    RAISE_MESSAGES, TENURE_BONUS_PER_100_TICKS, VP_PREMIUM,
};
use market_core::{BonusKind, EmployeeType};

use crate::rng::SeededRng;

/// Ticks of tenure between raise demands.
const RAISE_INTERVAL: u64 = 40;

/// Base morale decay per tick.
const BURNOUT_RATE: f64 = 0.5;

/// Morale penalty per empty IC slot under a VP.
const UNDERSTAFFED_PENALTY: f64 = 0.2;

/// Morale hit to teammates when a colleague is fired, and to employees
/// moved by a reorg.
const DISRUPTION_PENALTY: f64 = 8.0;

/// An employee somewhere in the org chart or candidate pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Stable id, unique within one engine.
    pub id: u32,
    /// Generated display name.
    pub name: String,
    /// Archetype.
    pub kind: EmployeeType,
    /// Level 1-3; scales salary and bonus.
    pub level: u8,
    /// Morale in [0, 100]; 0 means the employee quits.
    pub morale: f64,
    /// Ticks employed.
    pub tenure: u64,
    /// Set every 40 tenure ticks until the caller grants or denies.
    pub raise_pending: bool,
    /// Starts at 1.0; +0.25 per accepted raise, permanent.
    pub salary_multiplier: f64,
}

impl Employee {
    /// Per-tick salary before any VP premium.
    pub fn salary_per_tick(&self) -> f64 {
        employee_def(self.kind).base_salary_per_tick
            * f64::from(self.level)
            * self.salary_multiplier
    }

    /// Upfront cost to hire this candidate.
    pub fn hire_cost(&self) -> f64 {
        self.salary_per_tick() * HIRE_COST_MULTIPLIER
    }

    /// Raw per-level bonus before effectiveness scaling.
    pub fn bonus(&self) -> f64 {
        employee_def(self.kind).base_bonus_per_level * f64::from(self.level)
    }

    /// Morale step function times the tenure bonus (caps at +25%).
    pub fn effectiveness(&self) -> f64 {
        let base = if self.morale >= 70.0 {
            1.0
        } else if self.morale >= 40.0 {
            0.75
        } else if self.morale >= 25.0 {
            0.5
        } else {
            0.25
        };
        let stacks = (self.tenure / 100).min(5) as f64;
        base * (1.0 + stacks * TENURE_BONUS_PER_100_TICKS)
    }
}

/// Kind of HR notice surfaced to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoraleNoticeKind {
    /// Employee left (morale 0 or management vacancy).
    Quit,
    /// Employee demands a raise; resolve with grant or deny.
    RaiseDemand,
}

/// An HR notice produced by the per-tick morale/tenure pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoraleNotice {
    /// Notice kind.
    pub kind: MoraleNoticeKind,
    /// Affected employee's name.
    pub employee: String,
    /// Deadpan one-liner for the news ticker.
    pub message: String,
}

/// One VP column: an optional VP plus its IC report slots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VpSlot {
    /// Column lead; ICs require one.
    pub vp: Option<Employee>,
    /// Fixed-size report slots.
    pub ics: Vec<Option<Employee>>,
}

impl VpSlot {
    fn empty() -> Self {
        VpSlot {
            vp: None,
            ics: vec![None; ICS_PER_VP],
        }
    }
}

/// Position in the org chart: a VP column plus `None` for the VP seat or
/// `Some(i)` for IC seat `i`.
pub type SlotRef = (usize, Option<usize>);

/// The HR department tree and candidate pool.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrgChart {
    slots: Vec<VpSlot>,
    pool: Vec<Employee>,
    pool_tick_counter: u32,
    expanded: bool,
    next_employee_id: u32,
}

impl OrgChart {
    /// Create an empty chart with a freshly generated candidate pool.
    pub fn new(rng: &mut SeededRng) -> Self {
        let mut chart = OrgChart {
            slots: (0..MAX_VP_SLOTS).map(|_| VpSlot::empty()).collect(),
            pool: Vec::new(),
            pool_tick_counter: 0,
            expanded: false,
            next_employee_id: 1,
        };
        chart.refresh_pool(rng, 2);
        chart
    }

    /// Active VP columns: 2 initially, all 4 after the expansion unlock.
    pub fn active_slot_count(&self) -> usize {
        if self.expanded {
            MAX_VP_SLOTS
        } else {
            INITIAL_VP_SLOTS
        }
    }

    /// Whether the upper VP columns are unlocked.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Unlock VP columns 3 and 4. Never re-locked, even by prestige.
    pub fn unlock_expansion(&mut self) {
        self.expanded = true;
    }

    /// Active VP columns.
    pub fn slots(&self) -> &[VpSlot] {
        &self.slots[..self.active_slot_count()]
    }

    /// All employees currently placed in the chart.
    pub fn employees(&self) -> impl Iterator<Item = &Employee> {
        self.slots
            .iter()
            .flat_map(|slot| slot.vp.iter().chain(slot.ics.iter().flatten()))
    }

    /// Number of placed employees.
    pub fn employee_count(&self) -> usize {
        self.employees().count()
    }

    /// Current hiring candidates.
    pub fn candidate_pool(&self) -> &[Employee] {
        &self.pool
    }

    fn generate_candidate(&mut self, rng: &mut SeededRng, max_level: u8) -> Employee {
        let kind = EmployeeType::ALL[rng.next_index(EmployeeType::ALL.len())];
        let r = rng.next_f64();
        let level = if max_level >= 3 && r > 0.92 {
            3
        } else if max_level >= 2 && r > 0.55 {
            2
        } else {
            1
        };
        let first = FIRST_NAMES[rng.next_index(FIRST_NAMES.len())];
        let last = LAST_NAMES[rng.next_index(LAST_NAMES.len())];
        let id = self.next_employee_id;
        self.next_employee_id += 1;
        Employee {
            id,
            name: format!("{first} {last}"),
            kind,
            level,
            morale: 80.0,
            tenure: 0,
            raise_pending: false,
            salary_multiplier: 1.0,
        }
    }

    /// Replace the candidate pool with three fresh candidates.
    pub fn refresh_pool(&mut self, rng: &mut SeededRng, max_level: u8) {
        self.pool = (0..3).map(|_| self.generate_candidate(rng, max_level)).collect();
        self.pool_tick_counter = 0;
    }

    /// Per-tick pool aging. Returns true when the pool auto-refreshed.
    pub fn tick_pool(&mut self, rng: &mut SeededRng, max_level: u8) -> bool {
        self.pool_tick_counter += 1;
        if self.pool_tick_counter >= POOL_REFRESH_TICKS {
            self.refresh_pool(rng, max_level);
            true
        } else {
            false
        }
    }

    /// Employee at a chart position.
    pub fn employee(&self, slot: SlotRef) -> Option<&Employee> {
        let (vp_idx, ic_idx) = slot;
        let column = self.slots.get(vp_idx)?;
        match ic_idx {
            None => column.vp.as_ref(),
            Some(i) => column.ics.get(i)?.as_ref(),
        }
    }

    fn employee_mut(&mut self, slot: SlotRef) -> Option<&mut Employee> {
        let (vp_idx, ic_idx) = slot;
        let column = self.slots.get_mut(vp_idx)?;
        match ic_idx {
            None => column.vp.as_mut(),
            Some(i) => column.ics.get_mut(i)?.as_mut(),
        }
    }

    /// Per-tick morale pass. Burnout, chemistry, understaffing; quits at 0.
    /// A VP quitting takes its reports with it.
    pub fn tick_morale(&mut self, rng: &mut SeededRng) -> Vec<MoraleNotice> {
        let mut notices = Vec::new();
        let active = self.active_slot_count();

        for slot in self.slots.iter_mut().take(active) {
            let Some(vp) = slot.vp.as_mut() else { continue };

            let empty_ics = slot.ics.iter().filter(|ic| ic.is_none()).count();
            vp.morale = (vp.morale - BURNOUT_RATE - empty_ics as f64 * UNDERSTAFFED_PENALTY)
                .clamp(0.0, 100.0);

            if vp.morale <= 0.0 {
                let quip = QUIT_MESSAGES[rng.next_index(QUIT_MESSAGES.len())];
                notices.push(MoraleNotice {
                    kind: MoraleNoticeKind::Quit,
                    employee: vp.name.clone(),
                    message: format!("{} {}", vp.name, quip),
                });
                for seat in slot.ics.iter_mut() {
                    if let Some(ic) = seat.take() {
                        notices.push(MoraleNotice {
                            kind: MoraleNoticeKind::Quit,
                            employee: ic.name.clone(),
                            message: format!(
                                "{} has departed following a management vacancy",
                                ic.name
                            ),
                        });
                    }
                }
                slot.vp = None;
                continue;
            }

            let vp_kind = vp.kind;
            for seat in slot.ics.iter_mut() {
                let Some(ic) = seat.as_mut() else { continue };
                ic.morale = (ic.morale - BURNOUT_RATE + chemistry(vp_kind, ic.kind))
                    .clamp(0.0, 100.0);
                if ic.morale <= 0.0 {
                    let quip = QUIT_MESSAGES[rng.next_index(QUIT_MESSAGES.len())];
                    notices.push(MoraleNotice {
                        kind: MoraleNoticeKind::Quit,
                        employee: ic.name.clone(),
                        message: format!("{} {}", ic.name, quip),
                    });
                    *seat = None;
                }
            }
        }

        notices
    }

    /// Per-tick tenure pass. Flags raise demands every 40 tenure ticks.
    pub fn tick_tenure(&mut self, rng: &mut SeededRng) -> Vec<MoraleNotice> {
        let mut notices = Vec::new();
        let active = self.active_slot_count();

        for slot in self.slots.iter_mut().take(active) {
            for emp in slot.vp.iter_mut().chain(slot.ics.iter_mut().flatten()) {
                emp.tenure += 1;
                if emp.tenure % RAISE_INTERVAL == 0 && !emp.raise_pending {
                    emp.raise_pending = true;
                    let quip = RAISE_MESSAGES[rng.next_index(RAISE_MESSAGES.len())];
                    notices.push(MoraleNotice {
                        kind: MoraleNoticeKind::RaiseDemand,
                        employee: emp.name.clone(),
                        message: format!("{} {}", emp.name, quip),
                    });
                }
            }
        }

        notices
    }

    /// Grant a pending raise: +0.25 salary multiplier, +10 morale.
    pub fn grant_raise(&mut self, slot: SlotRef) -> bool {
        match self.employee_mut(slot) {
            Some(emp) if emp.raise_pending => {
                emp.salary_multiplier += 0.25;
                emp.morale = (emp.morale + 10.0).min(100.0);
                emp.raise_pending = false;
                true
            }
            _ => false,
        }
    }

    /// Deny a pending raise: -15 morale.
    pub fn deny_raise(&mut self, slot: SlotRef) -> bool {
        match self.employee_mut(slot) {
            Some(emp) if emp.raise_pending => {
                emp.morale = (emp.morale - 15.0).max(0.0);
                emp.raise_pending = false;
                true
            }
            _ => false,
        }
    }

    /// Hire a pool candidate into a chart position. ICs require a VP above
    /// them. Returns the hired employee's name.
    pub fn hire(&mut self, candidate_idx: usize, slot: SlotRef) -> Option<String> {
        if candidate_idx >= self.pool.len() {
            return None;
        }
        let (vp_idx, ic_idx) = slot;
        if vp_idx >= self.active_slot_count() {
            return None;
        }

        let column = &mut self.slots[vp_idx];
        match ic_idx {
            None => {
                if column.vp.is_some() {
                    return None;
                }
                let candidate = self.pool.remove(candidate_idx);
                let name = candidate.name.clone();
                column.vp = Some(candidate);
                Some(name)
            }
            Some(i) => {
                if i >= ICS_PER_VP || column.ics[i].is_some() || column.vp.is_none() {
                    return None;
                }
                let candidate = self.pool.remove(candidate_idx);
                let name = candidate.name.clone();
                column.ics[i] = Some(candidate);
                Some(name)
            }
        }
    }

    /// Fire the employee at a position. Firing a VP displaces its reports;
    /// firing an IC dents the column's morale.
    pub fn fire(&mut self, slot: SlotRef) -> Option<Employee> {
        let (vp_idx, ic_idx) = slot;
        let column = self.slots.get_mut(vp_idx)?;

        match ic_idx {
            None => {
                let vp = column.vp.take()?;
                for seat in column.ics.iter_mut() {
                    *seat = None;
                }
                Some(vp)
            }
            Some(i) => {
                if i >= ICS_PER_VP {
                    return None;
                }
                let ic = column.ics[i].take()?;
                if let Some(vp) = column.vp.as_mut() {
                    vp.morale = (vp.morale - DISRUPTION_PENALTY).max(0.0);
                }
                for teammate in column.ics.iter_mut().flatten() {
                    teammate.morale = (teammate.morale - DISRUPTION_PENALTY).max(0.0);
                }
                Some(ic)
            }
        }
    }

    /// Fire the most expensive safe victim: ICs anywhere, VPs only when
    /// report-free (a VP firing would cascade). Returns the employee and
    /// its per-tick payroll cost, premium included. None when the chart
    /// is empty.
    pub fn fire_most_expensive(&mut self) -> Option<(Employee, f64)> {
        let mut best: Option<(f64, SlotRef)> = None;
        let active = self.active_slot_count();

        for (v, slot) in self.slots.iter().enumerate().take(active) {
            for (i, seat) in slot.ics.iter().enumerate() {
                if let Some(ic) = seat {
                    let salary = ic.salary_per_tick();
                    if best.map_or(true, |(s, _)| salary > s) {
                        best = Some((salary, (v, Some(i))));
                    }
                }
            }
            if let Some(vp) = &slot.vp {
                if slot.ics.iter().all(|ic| ic.is_none()) {
                    let salary = vp.salary_per_tick() * VP_PREMIUM;
                    if best.map_or(true, |(s, _)| salary > s) {
                        best = Some((salary, (v, None)));
                    }
                }
            }
        }

        let (cost, slot) = best?;
        debug!(column = slot.0, "shedding most expensive employee");
        self.fire(slot).map(|emp| (emp, cost))
    }

    /// Swap two chart positions. An IC seat can only be filled in a column
    /// that has a VP. Moved employees take a morale hit.
    pub fn swap(&mut self, from: SlotRef, to: SlotRef) -> bool {
        if from == to {
            return false;
        }
        let (from_vp, from_ic) = from;
        let (to_vp, to_ic) = to;
        let active = self.active_slot_count();
        if from_vp >= active || to_vp >= active {
            return false;
        }
        if from_ic.map_or(false, |i| i >= ICS_PER_VP)
            || to_ic.map_or(false, |i| i >= ICS_PER_VP)
        {
            return false;
        }

        if self.employee(from).is_none() && self.employee(to).is_none() {
            return false;
        }
        if to_ic.is_some() && self.slots[to_vp].vp.is_none() && from_ic.is_some() {
            return false;
        }
        if from_ic.is_some() && self.slots[from_vp].vp.is_none() && to_ic.is_some() {
            return false;
        }

        let mut emp_a = self.take(from);
        let mut emp_b = self.take(to);
        if let Some(emp) = emp_a.as_mut() {
            emp.morale = (emp.morale - DISRUPTION_PENALTY).max(0.0);
        }
        if let Some(emp) = emp_b.as_mut() {
            emp.morale = (emp.morale - DISRUPTION_PENALTY).max(0.0);
        }
        self.put(from, emp_b);
        self.put(to, emp_a);
        true
    }

    fn take(&mut self, slot: SlotRef) -> Option<Employee> {
        let (vp_idx, ic_idx) = slot;
        let column = &mut self.slots[vp_idx];
        match ic_idx {
            None => column.vp.take(),
            Some(i) => column.ics[i].take(),
        }
    }

    fn put(&mut self, slot: SlotRef, emp: Option<Employee>) {
        let (vp_idx, ic_idx) = slot;
        let column = &mut self.slots[vp_idx];
        match ic_idx {
            None => column.vp = emp,
            Some(i) => column.ics[i] = emp,
        }
    }

    /// Aggregate keyed bonuses across the chart. VPs contribute at 1.5x;
    /// repeated archetypes decay at 100/85/70/55%; interns feed a flat
    /// bonus into the standard channels.
    pub fn bonuses(&self) -> BTreeMap<BonusKind, f64> {
        let mut bonuses: BTreeMap<BonusKind, f64> = BTreeMap::new();
        let mut type_counts: BTreeMap<EmployeeType, u32> = BTreeMap::new();
        let active = self.active_slot_count();

        for slot in self.slots.iter().take(active) {
            let Some(vp) = &slot.vp else { continue };
            accumulate(&mut bonuses, &mut type_counts, vp, VP_PREMIUM);
            for ic in slot.ics.iter().flatten() {
                accumulate(&mut bonuses, &mut type_counts, ic, 1.0);
            }
        }

        bonuses
    }

    /// Total salary per tick across the chart; VPs draw a 1.5x premium.
    pub fn total_salary(&self) -> f64 {
        let active = self.active_slot_count();
        let mut total = 0.0;
        for slot in self.slots.iter().take(active) {
            if let Some(vp) = &slot.vp {
                total += vp.salary_per_tick() * VP_PREMIUM;
            }
            for ic in slot.ics.iter().flatten() {
                total += ic.salary_per_tick();
            }
        }
        total
    }

    /// Clear the chart and regenerate the pool. The expansion unlock is
    /// preserved; it is gated by lifetime progression, not this run.
    pub fn reset(&mut self, rng: &mut SeededRng) {
        for slot in self.slots.iter_mut() {
            *slot = VpSlot::empty();
        }
        self.refresh_pool(rng, 2);
    }

    /// Place a generated employee directly as the first VP. Used by
    /// prestige preservation.
    pub fn seed_employee(&mut self, rng: &mut SeededRng, max_level: u8) -> String {
        let emp = self.generate_candidate(rng, max_level);
        let name = emp.name.clone();
        self.slots[0].vp = Some(emp);
        name
    }
}

fn accumulate(
    bonuses: &mut BTreeMap<BonusKind, f64>,
    type_counts: &mut BTreeMap<EmployeeType, u32>,
    emp: &Employee,
    premium: f64,
) {
    let count = type_counts.entry(emp.kind).or_insert(0);
    *count += 1;
    let factor = diminishing_factor(*count);
    let value = emp.bonus() * premium * emp.effectiveness() * factor;

    match employee_def(emp.kind).bonus {
        BonusTarget::Keyed(kind) => {
            *bonuses.entry(kind).or_insert(0.0) += value;
        }
        BonusTarget::Flat => {
            for kind in [
                BonusKind::TradeProfit,
                BonusKind::FactoryOutput,
                BonusKind::TrendVisibility,
            ] {
                *bonuses.entry(kind).or_insert(0.0) += value;
            }
        }
    }
}

// 1st of a type = 100%, 2nd = 85%, 3rd = 70%, 4th+ = 55%.
fn diminishing_factor(count: u32) -> f64 {
    match count {
        0 | 1 => 1.0,
        2 => 0.85,
        3 => 0.7,
        _ => 0.55,
    }
}
