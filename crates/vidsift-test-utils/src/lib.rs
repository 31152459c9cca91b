// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test utilities for the vidsift workspace: an in-memory fake of
//! the chat transport and a harness that assembles the full pipeline over
//! a temp store.

pub mod fake_client;
pub mod harness;

pub use fake_client::{video_message, FakeChatClient, ForwardRecord};
pub use harness::{TestHarness, TestHarnessBuilder};
