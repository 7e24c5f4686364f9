// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire-level building blocks: primitive codec, buffer writer/reader and
//! wide integers. Nothing here knows about schemas.

pub mod ser;
pub mod wide;
