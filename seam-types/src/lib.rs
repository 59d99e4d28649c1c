//! Shared plain-data types for the seam split keyboard core: the replicated
//! state blocks and their fixed-layout wire encodings. This crate is kept
//! free of executor and hardware dependencies so host-side tooling can reuse
//! the wire contract.
#![no_std]

pub mod config;
pub mod runtime;
pub mod text;
pub mod wire;

/// Capacity of the buffer menu value handlers render into. Values longer
/// than this are truncated, never overflowed.
pub const VALUE_TEXT_LEN: usize = 16;

/// Short human-readable rendering of a menu value.
pub type ValueText = heapless::String<VALUE_TEXT_LEN>;
