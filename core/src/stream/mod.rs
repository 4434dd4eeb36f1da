// ## 1️⃣ `mod.rs`: public façade + re-exports

//! Parallel, chunk-based streaming encryption and decryption.
//!
//! Layering, bottom up: `chunking` splits input, `chunk_worker` seals/opens
//! single chunks, `io` restores order on output, `pipeline` wires the stages
//! together under one `control` plane, and `core` is the public [`Cypher`] API.

pub mod chunking;
pub mod chunk_worker;
pub mod control;
pub mod io;
pub mod parallelism;
pub mod pipeline;
pub mod core;

pub use io::{InputSource, OutputSink};
pub use control::{CancelToken, PipelineState};
pub use self::core::{Cypher, CypherBuilder, CypherConfig};
