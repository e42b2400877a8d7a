//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the role traits defined
//! in phonebox-core:
//!
//! - I/O module chain over cascaded shift registers
//! - Buzzer, alarm light and status LED on plain GPIO

#![no_std]
#![deny(unsafe_code)]

pub mod chain;
pub mod indicator;
