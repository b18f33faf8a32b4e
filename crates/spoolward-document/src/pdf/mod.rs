// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: typesetting text into print-ready PDFs.

pub mod writer;

pub use writer::{PageSize, PdfWriter};
