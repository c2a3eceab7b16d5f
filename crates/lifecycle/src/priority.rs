//! Priority degradation.

use bugzilla::Priority;
use config::Transition;

/// Next priority along `transitions` for `current`.
///
/// The first transition whose `from` equals `current` applies; without one
/// the priority is left unchanged.
pub fn degrade(transitions: &[Transition], current: &Priority) -> Priority {
    transitions
        .iter()
        .find(|transition| &transition.from == current)
        .map_or_else(|| current.clone(), |transition| transition.to.clone())
}
