//! Configuration surface of the engine.

use crate::dpe::Rdpe;

/// What the outer solver is trying to establish about the roots. The
/// restart stage is more permissive when isolating or approximating than
/// when merely counting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Goal {
    Count,
    #[default]
    Isolate,
    Approximate,
}

/// Tunables shared by every engine pass. Owned by the solve context.
#[derive(Clone, Debug)]
pub struct Config {
    /// Seed for randomized angular offsets. `None` selects the
    /// deterministic gcd-based schedule.
    pub random_seed: Option<u64>,

    /// Relative spacing under which neighbouring annuli are merged.
    pub circle_relative_distance: f64,

    /// Cap on the Newton iterations locating a gravity centre.
    pub max_newt_it: usize,

    /// Relative cluster width under which roots are tagged output-ready.
    pub eps_out: Rdpe,

    pub goal: Goal,

    /// Coefficients are not available as moduli; place starting points
    /// equispaced on the unit circle and skip everything else.
    pub user_defined: bool,

    /// Polynomial has vanishing interior coefficients worth skipping.
    pub sparse: bool,

    /// Base working precision (bits) of the multiprecision tier.
    pub mpwp: u32,

    /// Requested output precision (bits).
    pub prec_out: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            random_seed: None,
            circle_relative_distance: 0.005,
            max_newt_it: 15,
            eps_out: Rdpe::from_parts(0.5, -52),
            goal: Goal::default(),
            user_defined: false,
            sparse: false,
            mpwp: 64,
            prec_out: 53,
        }
    }
}

impl Config {
    /// Unit roundoff of the multiprecision tier at precision `wp`.
    #[must_use]
    pub fn mp_epsilon(wp: u32) -> Rdpe {
        Rdpe::from_parts(1.0, 1 - i64::from(wp))
    }
}
