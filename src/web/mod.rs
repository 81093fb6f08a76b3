//! HTTP API for aligning and combining TOCs.
//!
//! ## Starting the Server
//!
//! ```text
//! # Default: 127.0.0.1:3000 (or $PORT)
//! toc-align serve
//!
//! # Bind to all interfaces with semantic matching enabled
//! OPENAI_API_KEY=... toc-align serve --address 0.0.0.0
//! ```
//!
//! ## API Endpoints
//!
//! - `POST /api/align-tocs` - Align `{toc1, toc2, strategy?}`; returns rows and a summary
//! - `POST /api/combine` - Merge `{toc1, toc2}` into `{combinedToc}`
//! - `GET /api/health` - Liveness and which oracle features are configured

pub mod server;
