// SPDX-License-Identifier: MIT

//! Building blocks shared by flows: the tool trait and the error types.

pub mod error;
pub mod tool;
