// Titanic Chat Agent — library root
//
// Layering (one-way, top to bottom):
//   server.rs  → thin HTTP boundary (axum routes, JSON marshaling)
//   engine/    → business logic: dataset store, handlers, resolver,
//                polisher, and the query-service orchestration
//   atoms/     → pure data types, error enum, constants; no I/O,
//                no imports from engine/

pub mod atoms;
pub mod engine;
pub mod server;

pub use atoms::error::{AgentError, AgentResult};
pub use engine::agent::Agent;
pub use engine::config::AgentConfig;
pub use engine::dataset::Dataset;
