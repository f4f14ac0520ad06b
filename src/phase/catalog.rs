//! Phase timeline
//!
//! An immutable, ordered chain of phases bracketed by a `waiting` phase
//! and a terminal `complete` phase. The catalog is built once and only
//! ever read afterwards.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::PhaseError;

/// Name of the initial phase every catalog starts with.
pub const WAITING: &str = "waiting";

/// Name of the terminal phase every catalog ends with.
pub const COMPLETE: &str = "complete";

/// Ordinal position of a phase within its catalog.
///
/// Only a [`PhaseCatalog`] hands these out, so an id is always valid
/// for the catalog that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PhaseId(usize);

impl PhaseId {
    /// Zero-based position in the catalog (`waiting` is 0).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phase {
    id: PhaseId,
    /// Machine name, also used as the scene state sent to the renderer
    pub name: String,
    /// Human-facing title
    pub display_name: String,
    /// Nominal duration in seconds; 0 means "advance only on user action"
    pub duration: f64,
    /// Declared user-controlled (tap to continue)
    pub user_controlled: bool,
    /// Entering this phase plays no transition sound
    pub silent_transition: bool,
}

impl Phase {
    /// Position of this phase in its catalog.
    #[must_use]
    pub const fn id(&self) -> PhaseId {
        self.id
    }

    /// A phase leaves only on explicit advance when it is flagged
    /// user-controlled or has no duration.
    #[must_use]
    pub fn is_user_controlled(&self) -> bool {
        self.user_controlled || self.duration <= 0.0
    }

    /// Whether time drives this phase's progress.
    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.duration > 0.0
    }

    /// Whether this is one of the two boundary phases.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.name == WAITING || self.name == COMPLETE
    }
}

/// Description of an active phase used to build a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSpec {
    /// Machine name
    pub name: String,
    /// Human-facing title (defaults to `name` when empty)
    pub display_name: String,
    /// Duration in seconds (0 = user-controlled)
    pub duration: f64,
    /// Explicit tap-to-continue flag
    pub user_controlled: bool,
    /// Suppress the transition sound when entering this phase
    pub silent_transition: bool,
}

impl PhaseSpec {
    /// A phase that auto-advances after `duration` seconds.
    #[must_use]
    pub fn timed(name: &str, display_name: &str, duration: f64) -> Self {
        Self {
            name: name.to_owned(),
            display_name: display_name.to_owned(),
            duration,
            user_controlled: false,
            silent_transition: false,
        }
    }

    /// A phase that only leaves on explicit advance.
    #[must_use]
    pub fn user_controlled(name: &str, display_name: &str, duration: f64) -> Self {
        Self {
            user_controlled: true,
            ..Self::timed(name, display_name, duration)
        }
    }

    /// Marks the phase as a silent-transition target.
    #[must_use]
    pub const fn silent(mut self) -> Self {
        self.silent_transition = true;
        self
    }
}

/// The fixed, ordered phase chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseCatalog {
    phases: Vec<Phase>,
}

impl PhaseCatalog {
    /// Builds a catalog from the active phases, adding the `waiting` and
    /// `complete` boundaries.
    ///
    /// # Errors
    ///
    /// Returns a [`PhaseError`] when there are no active phases, a name is
    /// reserved or duplicated, or a duration is negative or not finite.
    pub fn new(specs: Vec<PhaseSpec>) -> Result<Self, PhaseError> {
        if specs.is_empty() {
            return Err(PhaseError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for spec in &specs {
            if spec.name == WAITING || spec.name == COMPLETE {
                return Err(PhaseError::ReservedName(spec.name.clone()));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(PhaseError::DuplicateName(spec.name.clone()));
            }
            if !spec.duration.is_finite() || spec.duration < 0.0 {
                return Err(PhaseError::InvalidDuration {
                    name: spec.name.clone(),
                    duration: spec.duration,
                });
            }
        }

        Ok(Self::assemble(specs))
    }

    /// The catalog of "The Invisible Cost" experience.
    #[must_use]
    pub fn invisible_cost() -> Self {
        Self::assemble(vec![
            PhaseSpec::user_controlled("industry_selection", "Choose Your Industry", 0.0),
            PhaseSpec::timed("building_tension", "Building Tension", 12.0),
            PhaseSpec::timed("industry_vignette", "Industry Vignette", 10.0),
            PhaseSpec::user_controlled("pattern_break", "Pattern Break", 6.0),
            PhaseSpec::timed("sucker_punch_reveal", "The Reveal", 10.0),
            PhaseSpec::timed("comparison_carousel", "What It Really Costs", 15.0),
            PhaseSpec::timed("agentic_orchestration", "Agentic Orchestration", 14.0),
            PhaseSpec::timed("automation_reveal", "Automation Reveal", 8.0).silent(),
            PhaseSpec::timed("human_return", "Restoration", 12.0),
            PhaseSpec::user_controlled("call_to_action", "Where Will You Lead?", 0.0),
        ])
    }

    fn assemble(specs: Vec<PhaseSpec>) -> Self {
        let boundary = |name: &str, display: &str| PhaseSpec {
            name: name.to_owned(),
            display_name: display.to_owned(),
            duration: 0.0,
            user_controlled: true,
            silent_transition: true,
        };

        let phases = std::iter::once(boundary(WAITING, "Waiting"))
            .chain(specs)
            .chain(std::iter::once(boundary(COMPLETE, "Complete")))
            .enumerate()
            .map(|(idx, spec)| Phase {
                id: PhaseId(idx),
                display_name: if spec.display_name.is_empty() {
                    spec.name.clone()
                } else {
                    spec.display_name
                },
                name: spec.name,
                duration: spec.duration,
                user_controlled: spec.user_controlled,
                silent_transition: spec.silent_transition,
            })
            .collect();

        Self { phases }
    }

    /// Every phase in order, boundaries included.
    #[must_use]
    pub fn all_phases(&self) -> &[Phase] {
        &self.phases
    }

    /// The phases between `waiting` and `complete`.
    pub fn active_phases(&self) -> impl Iterator<Item = &Phase> {
        self.phases[1..self.phases.len() - 1].iter()
    }

    /// Looks up a phase by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was produced by a different, shorter catalog.
    #[must_use]
    pub fn phase(&self, id: PhaseId) -> &Phase {
        &self.phases[id.0]
    }

    /// The phase after `id`, or `None` for the terminal phase.
    #[must_use]
    pub fn next(&self, id: PhaseId) -> Option<&Phase> {
        self.phases.get(id.0 + 1)
    }

    /// Whether `id` is the terminal `complete` phase.
    #[must_use]
    pub fn is_terminal(&self, id: PhaseId) -> bool {
        id.0 + 1 == self.phases.len()
    }

    /// The initial `waiting` phase.
    #[must_use]
    pub fn waiting(&self) -> &Phase {
        &self.phases[0]
    }

    /// The terminal `complete` phase.
    #[must_use]
    pub fn complete(&self) -> &Phase {
        &self.phases[self.phases.len() - 1]
    }

    /// The first phase after `waiting`.
    #[must_use]
    pub fn first_active(&self) -> &Phase {
        &self.phases[1]
    }

    /// Finds a phase by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// Total number of phases, boundaries included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Always `false`: a catalog holds at least its two boundaries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Sum of timed durations, ignoring user-controlled waits.
    #[must_use]
    pub fn nominal_runtime(&self) -> f64 {
        self.active_phases()
            .filter(|p| !p.is_user_controlled())
            .map(|p| p.duration)
            .sum()
    }
}

impl Default for PhaseCatalog {
    fn default() -> Self {
        Self::invisible_cost()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> PhaseCatalog {
        PhaseCatalog::new(vec![
            PhaseSpec::timed("a", "A", 5.0),
            PhaseSpec::user_controlled("b", "B", 0.0),
            PhaseSpec::timed("c", "C", 3.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_boundaries_are_added() {
        let catalog = abc();
        let names: Vec<&str> = catalog.all_phases().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["waiting", "a", "b", "c", "complete"]);
        assert_eq!(catalog.waiting().name, WAITING);
        assert_eq!(catalog.complete().name, COMPLETE);
        assert_eq!(catalog.first_active().name, "a");
    }

    #[test]
    fn test_next_is_linear_and_undefined_only_at_terminal() {
        let catalog = abc();
        let mut id = catalog.waiting().id();
        let mut visited = vec![];
        while let Some(next) = catalog.next(id) {
            visited.push(next.name.clone());
            id = next.id();
        }
        assert_eq!(visited, ["a", "b", "c", "complete"]);
        assert!(catalog.is_terminal(id));
        assert!(!catalog.is_terminal(catalog.waiting().id()));
    }

    #[test]
    fn test_zero_duration_is_user_controlled() {
        let catalog = PhaseCatalog::new(vec![PhaseSpec::timed("x", "X", 0.0)]).unwrap();
        let phase = catalog.first_active();
        assert!(!phase.user_controlled);
        assert!(phase.is_user_controlled());
        assert!(!phase.is_timed());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(
            PhaseCatalog::new(vec![]),
            Err(PhaseError::EmptyCatalog)
        ));
    }

    #[test]
    fn test_reserved_and_duplicate_names_rejected() {
        assert!(matches!(
            PhaseCatalog::new(vec![PhaseSpec::timed("complete", "", 1.0)]),
            Err(PhaseError::ReservedName(_))
        ));
        assert!(matches!(
            PhaseCatalog::new(vec![
                PhaseSpec::timed("a", "", 1.0),
                PhaseSpec::timed("a", "", 2.0),
            ]),
            Err(PhaseError::DuplicateName(name)) if name == "a"
        ));
    }

    #[test]
    fn test_invalid_duration_rejected() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                PhaseCatalog::new(vec![PhaseSpec::timed("a", "", bad)]),
                Err(PhaseError::InvalidDuration { .. })
            ));
        }
    }

    #[test]
    fn test_display_name_defaults_to_name() {
        let catalog = PhaseCatalog::new(vec![PhaseSpec::timed("intro", "", 1.0)]).unwrap();
        assert_eq!(catalog.first_active().display_name, "intro");
    }

    #[test]
    fn test_default_catalog_shape() {
        let catalog = PhaseCatalog::invisible_cost();
        assert_eq!(catalog.len(), 12);
        assert!(catalog.first_active().is_user_controlled());
        assert!(
            catalog
                .by_name("automation_reveal")
                .unwrap()
                .silent_transition
        );
        assert!(catalog.by_name("call_to_action").unwrap().is_user_controlled());
        assert!((catalog.nominal_runtime() - 81.0).abs() < f64::EPSILON);
    }
}
