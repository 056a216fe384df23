//! Starting approximations and cluster restarts for simultaneous
//! polynomial root-finders.
//!
//! An Aberth-Ehrlich style iteration converges globally only if its
//! starting points are already spread the way the roots are. This crate
//! places those points: it derives annular root bounds from the upper
//! convex hull of the coefficients' log-moduli (the Rouché-based criterion
//! of [Bini 1996](https://doi.org/10.1007/BF02207694)), distributes
//! approximations over the annuli with an angular schedule that keeps
//! successive clusters interleaved, and — when the outer iteration finds a
//! cluster of suspected multiple roots — recentres the polynomial at the
//! cluster's gravity centre by Horner deflation and reseeds it.
//!
//! Everything is instantiated at three arithmetic tiers: hardware double,
//! double with extended exponent ([`dpe::Rdpe`]), and arbitrary precision
//! (`rug`). State shared across calls lives in an explicit [`Context`].
//!
//! ```
//! use polystart::{start, Config, Context};
//! use num::complex::Complex64;
//!
//! // p(x) = x^5 - 1
//! let mut coeffs = vec![Complex64::new(0.0, 0.0); 6];
//! coeffs[0] = Complex64::new(-1.0, 0.0);
//! coeffs[5] = Complex64::new(1.0, 0.0);
//!
//! let mut s = Context::new(&coeffs, Config::default()).unwrap();
//! start::fresh(&mut s);
//! for z in &s.froot {
//!     assert!((z.norm() - 1.0).abs() < 1e-14);
//! }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub use num;

pub mod cluster;
pub mod config;
pub mod context;
pub mod dpe;
pub mod error;
pub mod hull;
mod mp;
pub mod newton;
pub mod radii;
pub mod restart;
pub mod scalar;
pub mod shift;
pub mod start;
pub mod util;

pub use cluster::Clusters;
pub use config::{Config, Goal};
pub use context::{Context, Isolation, Phase, RootStatus, Stage};
pub use dpe::Rdpe;
pub use error::{Error, Result};
