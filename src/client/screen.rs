//! Corner-region toast presentation as explicit scheduled state transitions.
//!
//! The screen never sleeps on its own: callers pass the current `Instant` in
//! and apply due transitions with [`ToastScreen::advance`]. An async driver
//! ([`drive`]) is provided for hosts that want wall-clock playback.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::toasts::{Toast, ToastKind, ToastPosition};

/// Exit transition length, applied to manual and automatic dismissal alike.
pub const EXIT_TRANSITION: Duration = Duration::from_millis(300);

pub type UnitId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Inserted but not yet shown; promoted on the next advance so the
    /// entrance transition has a frame boundary to animate across.
    Entering,
    Shown,
    /// Exit transition in progress; removed once it elapses.
    Hiding,
}

/// One visible toast: title, message and a close affordance.
#[derive(Debug, Clone)]
pub struct NotificationUnit {
    pub id: UnitId,
    pub title: String,
    pub message: String,
    pub kind: ToastKind,
    pub state: UnitState,
}

#[derive(Debug, Clone)]
enum Action {
    Show(Toast),
    Enter(UnitId),
    Hide(UnitId),
    Remove(UnitId),
}

#[derive(Debug, Clone)]
struct Scheduled {
    due: Instant,
    action: Action,
}

#[derive(Debug, Default)]
struct Region {
    units: Vec<NotificationUnit>,
}

const REGION_COUNT: usize = 4;

fn region_index(position: ToastPosition) -> Option<usize> {
    match position {
        ToastPosition::TopRight => Some(0),
        ToastPosition::TopLeft => Some(1),
        ToastPosition::BottomRight => Some(2),
        ToastPosition::BottomLeft => Some(3),
        ToastPosition::Unknown => None,
    }
}

/// Four corner regions plus the pending transition queue.
#[derive(Debug, Default)]
pub struct ToastScreen {
    regions: [Region; REGION_COUNT],
    pending: Vec<Scheduled>,
    next_unit: UnitId,
}

impl ToastScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Units currently stacked in the region for `position`, in insertion
    /// order. Empty for `Unknown`, which has no region.
    pub fn units(&self, position: ToastPosition) -> &[NotificationUnit] {
        match region_index(position) {
            Some(index) => &self.regions[index].units,
            None => &[],
        }
    }

    pub fn unit_state(&self, id: UnitId) -> Option<UnitState> {
        self.regions
            .iter()
            .flat_map(|region| region.units.iter())
            .find(|unit| unit.id == id)
            .map(|unit| unit.state)
    }

    /// Present `toast` immediately. A toast with an unresolvable position is
    /// silently never shown.
    pub fn show(&mut self, toast: &Toast, now: Instant) -> Option<UnitId> {
        let Some(region) = region_index(toast.position) else {
            debug!(
                target = "toastdeck::screen",
                position = toast.position.as_str(),
                "no render region for position; toast not shown"
            );
            return None;
        };

        self.next_unit += 1;
        let id = self.next_unit;
        self.regions[region].units.push(NotificationUnit {
            id,
            title: toast.title.clone(),
            message: toast.message.clone(),
            kind: toast.kind,
            state: UnitState::Entering,
        });

        // Entrance toggles on the next frame, never in the inserting one.
        self.schedule(now, Action::Enter(id));
        if toast.auto_hide {
            let delay = Duration::from_millis(toast.duration.max(0) as u64);
            self.schedule(now + delay, Action::Hide(id));
        }
        Some(id)
    }

    /// Queue a presentation for a later instant (staggered playback).
    pub fn schedule_show(&mut self, toast: Toast, at: Instant) {
        self.schedule(at, Action::Show(toast));
    }

    /// Manual close. Cancels any pending auto-hide for the unit; a unit that
    /// is already gone or already hiding is left alone.
    pub fn dismiss(&mut self, id: UnitId, now: Instant) {
        let Some(unit) = self
            .regions
            .iter_mut()
            .flat_map(|region| region.units.iter_mut())
            .find(|unit| unit.id == id)
        else {
            return;
        };
        if unit.state == UnitState::Hiding {
            return;
        }
        unit.state = UnitState::Hiding;
        self.cancel_hide(id);
        self.schedule(now + EXIT_TRANSITION, Action::Remove(id));
    }

    /// Drop every unit and every pending transition.
    pub fn clear(&mut self) {
        for region in &mut self.regions {
            region.units.clear();
        }
        self.pending.clear();
    }

    /// Apply every transition due at `now`. Transitions scheduled while
    /// applying (entrances, removals) wait for the next advance.
    pub fn advance(&mut self, now: Instant) {
        let mut due = Vec::new();
        self.pending.retain(|scheduled| {
            if scheduled.due <= now {
                due.push(scheduled.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|scheduled| scheduled.due);

        for scheduled in due {
            match scheduled.action {
                Action::Show(toast) => {
                    self.show(&toast, scheduled.due);
                }
                Action::Enter(id) => self.set_state(id, UnitState::Entering, UnitState::Shown),
                Action::Hide(id) => {
                    if self.set_state_checked(id, UnitState::Hiding) {
                        self.schedule(scheduled.due + EXIT_TRANSITION, Action::Remove(id));
                    }
                }
                Action::Remove(id) => self.remove(id),
            }
        }
    }

    /// Earliest pending transition, if any; hosts sleep until this.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|scheduled| scheduled.due).min()
    }

    fn schedule(&mut self, due: Instant, action: Action) {
        self.pending.push(Scheduled { due, action });
    }

    fn cancel_hide(&mut self, id: UnitId) {
        self.pending
            .retain(|scheduled| !matches!(scheduled.action, Action::Hide(unit) if unit == id));
    }

    fn set_state(&mut self, id: UnitId, from: UnitState, to: UnitState) {
        if let Some(unit) = self
            .regions
            .iter_mut()
            .flat_map(|region| region.units.iter_mut())
            .find(|unit| unit.id == id)
        {
            if unit.state == from {
                unit.state = to;
            }
        }
    }

    /// Move a unit into `Hiding` unless it is already hiding or gone;
    /// returns whether the transition took place.
    fn set_state_checked(&mut self, id: UnitId, to: UnitState) -> bool {
        match self
            .regions
            .iter_mut()
            .flat_map(|region| region.units.iter_mut())
            .find(|unit| unit.id == id)
        {
            Some(unit) if unit.state != UnitState::Hiding => {
                unit.state = to;
                true
            }
            _ => false,
        }
    }

    // Detaching an already-removed unit is a no-op, not an error.
    fn remove(&mut self, id: UnitId) {
        for region in &mut self.regions {
            region.units.retain(|unit| unit.id != id);
        }
    }
}

/// Play the pending transitions against the wall clock until none remain.
pub async fn drive(screen: &mut ToastScreen) {
    while let Some(deadline) = screen.next_deadline() {
        tokio::time::sleep_until(deadline.into()).await;
        screen.advance(Instant::now());
    }
}
