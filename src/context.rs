//! The solve context: every piece of state shared by the engine passes.

use num::complex::Complex64;
use num::{Complex, Zero};

use crate::cluster::Clusters;
use crate::config::Config;
use crate::dpe::{self, Rdpe};
use crate::error::{Error, Result};
use crate::mp;

/// Arithmetic tier currently driving the iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Float,
    Dpe,
    Mp,
}

/// Where an approximation stands in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Stage {
    /// Still being iterated.
    #[default]
    Iterating,
    /// Cluster width fell below the output tolerance; ready to report.
    OutputReady,
    /// Not representable at the current tier.
    NotRepresentable,
    /// Not representable at the hardware-double tier only.
    FloatOutOfRange,
    /// Approximated to the requested precision.
    Approximated,
    /// Recognized as a multiple root.
    Multiple,
}

/// How much is known about the approximation's inclusion disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Isolation {
    #[default]
    Unknown,
    Isolated,
    Approximated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RootStatus {
    pub stage: Stage,
    pub isolation: Isolation,
}

/// Process-wide mutable state of one solve.
///
/// All three tiers' coefficient and root vectors coexist: tier promotion
/// keeps the lower tiers' results around, and the multiprecision restart
/// stages values through the DPE vectors. The caller has exclusive access
/// for the duration of each engine call; nothing here suspends or blocks.
pub struct Context {
    pub cfg: Config,

    /// Degree of the polynomial.
    pub n: usize,

    pub phase: Phase,

    /// Coefficients, constant term first.
    pub fpc: Vec<Complex64>,
    pub dpc: Vec<Complex<Rdpe>>,
    pub mfpc: Vec<rug::Complex>,

    /// Coefficient moduli.
    pub fap: Vec<f64>,
    pub dap: Vec<Rdpe>,

    /// Non-zero coefficient mask.
    pub spar: Vec<bool>,

    /// Root approximations per tier.
    pub froot: Vec<Complex64>,
    pub droot: Vec<Complex<Rdpe>>,
    pub mroot: Vec<rug::Complex>,

    /// Inclusion-radius estimates.
    pub frad: Vec<f64>,
    pub drad: Vec<Rdpe>,

    pub status: Vec<RootStatus>,
    pub again: Vec<bool>,

    pub clusters: Clusters,

    /// Angular offset used for the previously placed cluster.
    pub last_sigma: f64,

    /// Set by the isolation probe when a cluster passes the Newton
    /// isolation test without shifting.
    pub newton_isolated: bool,

    /// Current base working precision (bits) of the multiprecision tier.
    pub mpwp: u32,

    pub(crate) rng: fastrand::Rng,
}

impl Context {
    /// Builds a context from hardware-double coefficients, constant term
    /// first; the DPE and multiprecision mirrors are derived from them.
    ///
    /// # Errors
    /// [`Error::DegreeTooSmall`] for fewer than two coefficients and
    /// [`Error::ZeroLeadingCoefficient`] when the top coefficient vanishes.
    pub fn new(coeffs: &[Complex64], cfg: Config) -> Result<Self> {
        if coeffs.len() < 2 {
            return Err(Error::DegreeTooSmall);
        }
        let n = coeffs.len() - 1;
        if coeffs[n].is_zero() {
            return Err(Error::ZeroLeadingCoefficient);
        }

        let mpwp = cfg.mpwp;
        let fpc = coeffs.to_vec();
        let dpc: Vec<Complex<Rdpe>> = fpc
            .iter()
            .map(|c| Complex::new(Rdpe::from(c.re), Rdpe::from(c.im)))
            .collect();
        let mfpc: Vec<rug::Complex> = fpc
            .iter()
            .map(|c| rug::Complex::with_val(mpwp, (c.re, c.im)))
            .collect();
        Ok(Self::assemble(fpc, dpc, mfpc, cfg))
    }

    /// Builds a context from exact multiprecision coefficients; the lower
    /// tiers are truncations.
    ///
    /// # Errors
    /// Same as [`Context::new`].
    pub fn from_mp(coeffs: &[rug::Complex], cfg: Config) -> Result<Self> {
        if coeffs.len() < 2 {
            return Err(Error::DegreeTooSmall);
        }
        let n = coeffs.len() - 1;
        if coeffs[n].real().is_zero() && coeffs[n].imag().is_zero() {
            return Err(Error::ZeroLeadingCoefficient);
        }

        let mpwp = cfg.mpwp;
        let mfpc: Vec<rug::Complex> = coeffs
            .iter()
            .map(|c| rug::Complex::with_val(mpwp, c))
            .collect();
        let dpc: Vec<Complex<Rdpe>> = mfpc.iter().map(mp::to_cdpe).collect();
        let fpc: Vec<Complex64> = dpc
            .iter()
            .map(|c| Complex64::new(c.re.to_f64(), c.im.to_f64()))
            .collect();
        Ok(Self::assemble(fpc, dpc, mfpc, cfg))
    }

    fn assemble(
        fpc: Vec<Complex64>,
        dpc: Vec<Complex<Rdpe>>,
        mfpc: Vec<rug::Complex>,
        cfg: Config,
    ) -> Self {
        let n = fpc.len() - 1;
        let mpwp = cfg.mpwp;
        let fap: Vec<f64> = fpc.iter().map(|c| num::Complex::norm(*c)).collect();
        let dap: Vec<Rdpe> = dpc.iter().map(dpe::cmod).collect();
        let spar: Vec<bool> = dap.iter().map(|a| !a.is_zero()).collect();
        let rng = fastrand::Rng::with_seed(cfg.random_seed.unwrap_or(0));

        Self {
            cfg,
            n,
            phase: Phase::Float,
            fpc,
            dpc,
            mfpc,
            fap,
            dap,
            spar,
            froot: vec![Complex64::zero(); n],
            droot: vec![Complex::new(Rdpe::ZERO, Rdpe::ZERO); n],
            mroot: vec![rug::Complex::with_val(mpwp, (0.0, 0.0)); n],
            frad: vec![f64::MAX; n],
            drad: vec![Rdpe::MAX; n],
            status: vec![RootStatus::default(); n],
            again: vec![true; n],
            clusters: Clusters::singletons(n),
            last_sigma: 0.0,
            newton_isolated: false,
            mpwp,
            rng,
        }
    }

    /// Unit roundoff at the current working precision.
    #[must_use]
    pub fn mp_epsilon(&self) -> Rdpe {
        Config::mp_epsilon(self.mpwp)
    }

    /// Installs a cluster partition produced by cluster analysis.
    ///
    /// # Errors
    /// [`Error::LengthMismatch`] if the partition does not cover `0..n`.
    pub fn set_clusters(&mut self, clusters: Clusters) -> Result<()> {
        if clusters.len() != self.n {
            return Err(Error::LengthMismatch {
                expected: self.n,
                got: clusters.len(),
            });
        }
        self.clusters = clusters;
        Ok(())
    }

    /// Tags every member of cluster `k` with the given stage.
    pub(crate) fn tag_cluster(&mut self, k: usize, stage: Stage) {
        for j in 0..self.clusters.size(k) {
            let l = self.clusters.index(k, j);
            self.status[l].stage = stage;
        }
    }
}
