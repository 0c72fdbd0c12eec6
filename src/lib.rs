//! llvmpack - LLVM+Clang toolchain release pipeline library
//!
//! This library provides the building blocks for packaging an LLVM+Clang
//! toolchain and publishing it as a GitHub release asset:
//! - Binary dependency auditing (objdump-based)
//! - Minimum compatible runtime summary (per-library maximum versions)
//! - Idempotent find-or-create-then-upload release publishing
//! - Fixed-interval retry of the whole publish sequence

pub mod audit;
pub mod cli;
pub mod domain;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod publish;
pub mod retry;
pub mod toolchain;
