//! Association and mediation analysis of VDR variants, vitamin D, and
//! type 2 diabetes in a simulated African-ancestry cohort.
//!
//! Three stages: [`simulate`] generates a cohort under Hardy-Weinberg
//! equilibrium, [`assoc`] and [`mediation`] run the statistical battery
//! over it, and [`io`] moves cohort and result tables through delimited
//! files.

pub mod error;
pub mod logging;
pub mod qc;
pub mod types;

pub mod stats;

pub mod assoc;
pub mod io;
pub mod mediation;
pub mod pipeline;
pub mod simulate;
