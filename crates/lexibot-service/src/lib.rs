//! The query service: embed the question, retrieve the nearest chunks,
//! assemble the prompt, and generate an answer. Includes the axum router
//! that exposes it as `POST /ask`.

pub mod routes;
pub mod service;

pub use routes::{router, AppState, AskRequest, AskResponse};
pub use service::{build_prompt, QueryService, DEFAULT_TOP_K, MAX_GEN_TOKENS};
