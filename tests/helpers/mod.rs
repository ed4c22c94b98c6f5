// Test helpers shared by the billing test binaries.
//
// In-memory repositories and a scripted gateway stand in for MySQL and the
// HTTP gateway so cycles can be asserted on exactly: which invoices were
// written, how many charges went out, and in what status everything ended.

#![allow(dead_code)]

pub mod gateway;

pub use clock::*;
pub use gateway::*;
pub use stores::*;
pub use test_data::*;
