// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod entry;
pub mod known_col;

pub use entry::{ElapsedTime, Entry, EntryData, EntryForm};
pub use known_col::KnownCol;
