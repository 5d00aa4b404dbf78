//! Homologador Server - HTTP REST API for vehicle catalog homologation
//!
//! Exposes the [`homologador::Homologator`] over HTTP: the catalog and embedder are loaded
//! once at startup from the pipeline YAML, then every request runs one ranked query.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints (No Authentication)
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe with catalog and embedder summary
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Protected Endpoints (API key required when keys are configured)
//!
//! - `POST /api/v1/homologate` - Ranked matches grouped by source
//! - `POST /api/v1/homologate/flat` - Ranked matches as one source-tagged list
//! - `GET /api/v1/catalog/stats` - Catalog, alias, and cache statistics
//! - `POST /homologar` - Legacy endpoint (`marca`, `submarca`, `año`, `modelo`, `version`)
//!
//! Invalid queries answer 400, embedding provider failures 502 (no upstream detail in the body).

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
