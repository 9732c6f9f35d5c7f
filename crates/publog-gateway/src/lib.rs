//! HTTP gateway for the PubLog dataset service.
//!
//! This crate exposes the service's query and administration operations as
//! a JSON API under `/api/v1`. Handlers are thin: they parse parameters, run
//! the blocking service call on tokio's blocking pool, and map results to
//! responses.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Clients (HTTP)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      publog-gateway                          │
//! │  ┌─────────────┐ ┌─────────────────┐ ┌──────────────────┐   │
//! │  │   Router    │ │    Handlers     │ │  spawn_blocking  │   │
//! │  │ + middleware│ │ (JSON mapping)  │ │     bridge       │   │
//! │  └─────────────┘ └─────────────────┘ └──────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                     ┌────────────────┐
//!                     │ PublogService  │
//!                     └────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use publog_core::Catalog;
//! use publog_gateway::{create_router, GatewayConfig, GatewayState};
//! use publog_service::{PublogService, ServiceConfig};
//! use publog_store::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::default();
//! let store = SqliteStore::shared(&config.db_path)?;
//! let catalog = Arc::new(Catalog::publog(&config.data_dir));
//! let service = Arc::new(PublogService::new(store, catalog, config));
//!
//! let state = GatewayState::new(service, GatewayConfig::default());
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{GatewayConfig, Settings};
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;
