//! # askmydocs
//!
//! Ask questions about a PDF and get answers with cited source pages.
//!
//! The pipeline extracts a PDF's text page by page, splits it into
//! overlapping chunks, builds a searchable index under a pluggable
//! scoring strategy (lexical, tfidf, or dense), and answers questions by
//! retrieving the top-k chunks and prompting a generative model with a
//! citation-labeled context.
//!
//! ```text
//! ┌───────┐   ┌─────────┐   ┌─────────┐   ┌────────────┐
//! │  PDF  │──▶│ Chunker │──▶│ Indexer │──▶│   SQLite   │
//! └───────┘   └─────────┘   └─────────┘   └─────┬──────┘
//!                                               │
//!                            ┌──────────────────┤
//!                            ▼                  ▼
//!                      ┌───────────┐     ┌────────────┐
//!                      │ Retriever │────▶│  Composer  │──▶ answer + sources
//!                      └───────────┘     └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ask init                          # create the index database
//! ask index report.pdf              # chunk, index, persist
//! ask query report.pdf "What does section 3 conclude?"
//! ask serve                         # expose /documents and /query over HTTP
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Pipeline error taxonomy |
//! | [`models`] | Core data types |
//! | [`pdf`] | Per-page PDF text extraction |
//! | [`chunk`] | Overlapping character-window chunking |
//! | [`tfidf`] | TF-IDF vectorizer |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Index build and serialization |
//! | [`retrieve`] | Top-k retrieval |
//! | [`answer`] | Prompt assembly and answer composition |
//! | [`generate`] | Generative-model client |
//! | [`store`] | Persistent index store |
//! | [`pipeline`] | Dependency-injected service facade |
//! | [`server`] | HTTP layer |

pub mod answer;
pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod generate;
pub mod index;
pub mod migrate;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod retrieve;
pub mod server;
pub mod store;
pub mod tfidf;
