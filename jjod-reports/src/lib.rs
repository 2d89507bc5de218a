//! Token transfer and holder CSV reports.
//!
//! Resolves a confirmed block through the jsearch API and writes two
//! reports for it: every transfer of the token up to that block, and
//! every holder's balance at that block.

pub mod config;
pub mod report;
pub mod run;
pub mod units;
