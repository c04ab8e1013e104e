//! Pipeline stages for page-by-page model processing.
//!
//! Each submodule implements one step so it can be tested on its own. The
//! orchestrator in [`crate::batch`] strings them together, one page at a
//! time.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ render ──▶ encode ──▶ llm ──▶ normalize ──▶ persist
//! (walk dir)   (pdfium)   (base64)   (VLM)   (fence/JSON)   (atomic write)
//! ```
//!
//! 1. [`discover`]: find `.pdf` files under the input root and load them
//! 2. [`render`]: rasterise pages lazily; pdfium runs in `spawn_blocking`
//! 3. [`encode`]: PNG-encode the page and pair it with the instruction
//! 4. [`llm`]: the [`llm::ModelClient`] seam and the timeout-bounded call;
//!    the only stage with network I/O
//! 5. [`normalize`]: pass text through, or unwrap and parse entity JSON
//! 6. [`persist`]: write `{document}_page_{n}.{txt|json}`

pub mod discover;
pub mod encode;
pub mod llm;
pub mod normalize;
pub mod persist;
pub mod render;
