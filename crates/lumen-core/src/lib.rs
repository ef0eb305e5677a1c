//! # lumen-core
//!
//! Client-side reconciliation engine for the lumen smart-light dashboard.
//!
//! The dashboard has three asynchronous, conflicting sources of truth for
//! the same device state: a fixed-interval status poll, optimistic local
//! updates applied the moment the user acts, and the settled results of
//! in-flight control requests. This crate merges them into one consistent
//! on-screen representation without letting a poll visibly snap a control
//! the user is still touching.
//!
//! # Components
//!
//! - [`api::ApiClient`] — HTTP client for the device-control REST API
//! - [`session::Session`] — bearer token, connectivity flag, persistence
//! - [`model::StatusModel`] — last-known authoritative device state
//! - [`lock::InteractionLock`] — time-windowed gate over the brightness display
//! - [`engine::Engine`] — poller + command dispatcher, one `select!` loop
//! - [`view::ViewState`] — pure projection from (model, lock) to widgets
//! - [`chart::ChartSeries`] — history chart projection with live append
//! - [`mock::MockApi`] — scripted API for testing the engine
//!
//! # Example
//!
//! ```no_run
//! use lumen_core::api::ApiClient;
//! use lumen_core::engine::{Engine, EngineConfig};
//! use lumen_core::messages::{Intent, UiEvent};
//! use lumen_core::session::{Session, TokenStore};
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiClient::new("http://127.0.0.1:8000")?;
//! let session = Session::new(TokenStore::new());
//! let (intent_tx, intent_rx) = mpsc::channel::<Intent>(32);
//! let (event_tx, mut event_rx) = mpsc::channel::<UiEvent>(32);
//! let cancel = CancellationToken::new();
//!
//! let engine = Engine::new(api, session, EngineConfig::default(), intent_rx, event_tx, cancel);
//! tokio::spawn(engine.run());
//!
//! intent_tx.send(Intent::Login {
//!     username: "admin".into(),
//!     password: "secret".into(),
//! }).await?;
//!
//! while let Some(event) = event_rx.recv().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod chart;
pub mod engine;
pub mod error;
pub mod lock;
pub mod messages;
pub mod mock;
pub mod model;
pub mod session;
pub mod traits;
pub mod view;

pub use api::ApiClient;
pub use chart::ChartSeries;
pub use engine::{Engine, EngineConfig, today};
pub use error::{Error, Result};
pub use lock::InteractionLock;
pub use messages::{Intent, UiEvent};
pub use mock::MockApi;
pub use model::StatusModel;
pub use session::{Session, TokenStore};
pub use traits::DeviceApi;
pub use view::ViewState;
