//! Watering schedule derivation: turns a needs-watering prediction and the
//! current hour into one optimal watering time plus up to two alternatives,
//! constrained to realistic morning/evening windows.
//!
//! The deriver is a pure decision engine — no I/O, no clock reads; the only
//! side effect is consuming entropy from the injected [`RandomSource`].
//!
//! ## Optimal-slot rule
//!
//! ```text
//! needs watering?   evening slot left today?   optimal
//!      yes                   yes               first evening hour > now, today
//!      yes                   no                earliest morning hour, tomorrow
//!      no                    —                 earliest morning hour, tomorrow
//! ```
//!
//! Alternatives cover the window the optimal slot is *not* in (one random
//! hour from it), or a different hour of the same window when one remains.
//! Every emitted time gets a random quarter-hour minute.

use std::collections::VecDeque;
use std::ops::RangeInclusive;

/// Fallbacks when a window ends up empty after partitioning.
pub const DEFAULT_MORNING_HOURS: &[u8] = &[6, 7, 8, 9];
pub const DEFAULT_EVENING_HOURS: &[u8] = &[17, 18, 19];

/// Hours-of-day that count as a morning/evening slot when partitioning a
/// configured hour list.
const MORNING_SPAN: RangeInclusive<u8> = 5..=12;
const EVENING_SPAN: RangeInclusive<u8> = 16..=20;

/// Minute values a suggested time can land on.
const MINUTE_CHOICES: [u8; 4] = [0, 15, 30, 45];

// ---------------------------------------------------------------------------
// Random source
// ---------------------------------------------------------------------------

/// Injectable entropy seam so tests can script every pick and assert exact
/// schedules.
pub trait RandomSource {
    /// Uniform index in `0..len`. Callers guarantee `len > 0`.
    fn pick_index(&mut self, len: usize) -> usize;
}

/// Production source backed by `fastrand`, freshly seeded per instance.
pub struct SystemRandom(fastrand::Rng);

impl SystemRandom {
    pub fn new() -> Self {
        Self(fastrand::Rng::new())
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        self.0.usize(..len)
    }
}

/// Test source replaying a fixed queue of indices.
#[allow(dead_code)]
pub struct ScriptedRandom(VecDeque<usize>);

#[allow(dead_code)]
impl ScriptedRandom {
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self(picks.into_iter().collect())
    }
}

impl RandomSource for ScriptedRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        let idx = self.0.pop_front().expect("scripted picks exhausted");
        assert!(idx < len, "scripted pick {idx} out of range 0..{len}");
        idx
    }
}

// ---------------------------------------------------------------------------
// Watering windows
// ---------------------------------------------------------------------------

/// The two allowed watering windows. Both hour lists are sorted ascending,
/// deduplicated and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WateringWindows {
    morning: Vec<u8>,
    evening: Vec<u8>,
}

impl WateringWindows {
    /// Partition a configured hour list into morning (5–12) and evening
    /// (16–20) windows. An empty partition falls back to that partition's
    /// realistic defaults only; hours in neither span are dropped.
    pub fn from_hours(hours: &[u8]) -> Self {
        let morning = partition(hours, MORNING_SPAN, DEFAULT_MORNING_HOURS);
        let evening = partition(hours, EVENING_SPAN, DEFAULT_EVENING_HOURS);
        Self { morning, evening }
    }

    pub fn morning(&self) -> &[u8] {
        &self.morning
    }

    pub fn evening(&self) -> &[u8] {
        &self.evening
    }
}

impl Default for WateringWindows {
    fn default() -> Self {
        Self {
            morning: DEFAULT_MORNING_HOURS.to_vec(),
            evening: DEFAULT_EVENING_HOURS.to_vec(),
        }
    }
}

fn partition(hours: &[u8], span: RangeInclusive<u8>, defaults: &[u8]) -> Vec<u8> {
    let mut kept: Vec<u8> = hours.iter().copied().filter(|h| span.contains(h)).collect();
    kept.sort_unstable();
    kept.dedup();
    if kept.is_empty() {
        defaults.to_vec()
    } else {
        kept
    }
}

// ---------------------------------------------------------------------------
// Derived schedule
// ---------------------------------------------------------------------------

/// Whether a slot lands on the request's day or the day after. Only `HH:MM`
/// reaches the wire; the tag exists so the date rules stay assertable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDay {
    Today,
    Tomorrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WateringSlot {
    pub day: ScheduleDay,
    pub hour: u8,
    pub minute: u8,
}

impl WateringSlot {
    /// Zero-padded 24-hour `HH:MM`.
    pub fn hhmm(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedSchedule {
    pub optimal: WateringSlot,
    /// 0–2 entries, morning suggestion first.
    pub alternatives: Vec<WateringSlot>,
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive the watering schedule for a prediction made at `current_hour`
/// (0–23, validated by the caller).
pub fn derive(
    needs_watering: bool,
    current_hour: u8,
    windows: &WateringWindows,
    rng: &mut impl RandomSource,
) -> DerivedSchedule {
    let morning = windows.morning();
    let evening = windows.evening();

    // Optimal slot: next evening hour still ahead of us today, otherwise
    // (and whenever no watering is needed) the earliest morning hour of
    // tomorrow.
    let (optimal_day, optimal_hour) = if needs_watering {
        match evening.iter().copied().find(|&h| h > current_hour) {
            Some(h) => (ScheduleDay::Today, h),
            None => (ScheduleDay::Tomorrow, morning[0]),
        }
    } else {
        (ScheduleDay::Tomorrow, morning[0])
    };

    let mut alternatives: Vec<(ScheduleDay, u8)> = Vec::with_capacity(2);

    // Morning suggestion: a random morning hour, or a *different* morning
    // hour when the optimal slot already is one. Always tomorrow.
    if morning.contains(&optimal_hour) {
        let others: Vec<u8> = morning.iter().copied().filter(|&h| h != optimal_hour).collect();
        if !others.is_empty() {
            alternatives.push((ScheduleDay::Tomorrow, pick_hour(rng, &others)));
        }
    } else {
        alternatives.push((ScheduleDay::Tomorrow, pick_hour(rng, morning)));
    }

    // Evening suggestion, symmetric. Today only while the earliest evening
    // slot is still strictly ahead.
    let evening_day = if current_hour < evening[0] {
        ScheduleDay::Today
    } else {
        ScheduleDay::Tomorrow
    };
    if evening.contains(&optimal_hour) {
        let others: Vec<u8> = evening.iter().copied().filter(|&h| h != optimal_hour).collect();
        if !others.is_empty() {
            alternatives.push((evening_day, pick_hour(rng, &others)));
        }
    } else {
        alternatives.push((evening_day, pick_hour(rng, evening)));
    }

    // Snap every emitted time to a random quarter-hour, optimal first.
    let optimal = WateringSlot {
        day: optimal_day,
        hour: optimal_hour,
        minute: pick_minute(rng),
    };
    let alternatives = alternatives
        .into_iter()
        .map(|(day, hour)| WateringSlot {
            day,
            hour,
            minute: pick_minute(rng),
        })
        .collect();

    DerivedSchedule {
        optimal,
        alternatives,
    }
}

fn pick_hour(rng: &mut impl RandomSource, hours: &[u8]) -> u8 {
    hours[rng.pick_index(hours.len())]
}

fn pick_minute(rng: &mut impl RandomSource) -> u8 {
    MINUTE_CHOICES[rng.pick_index(MINUTE_CHOICES.len())]
}

// ===========================================================================
// Tests
// ===========================================================================
