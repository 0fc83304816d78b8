pub mod controls;
pub mod mpc;
#[cfg(feature = "clarabel")]
pub(crate) mod solvers;
pub mod thermal;
pub mod units;
