//! Core hypervisor modules
//!
//! Architecture independent state shared by the trap handlers.

pub mod percpu;

pub use percpu::{CpuStat, PerCpu};
