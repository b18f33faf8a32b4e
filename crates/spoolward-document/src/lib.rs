// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// spoolward-document: content materialization for the Spoolward print queue.
//
// Turns job payloads (HTML, plain text, PDF path, base64 PDF) into a PDF file
// on disk that the OS spooler can print.  HTML is rendered by a headless
// browser when one is available and by a built-in text typesetter otherwise.

pub mod html;
pub mod materialize;
pub mod pdf;
pub mod render;

pub use materialize::{Artifact, Materializer};
pub use pdf::writer::PdfWriter;
pub use render::{BuiltinRenderer, ChromiumRenderer, HtmlRenderer, renderer_for};
