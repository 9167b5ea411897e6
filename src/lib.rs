//! Lumen - mock smart lights for LLM agents
//!
//! Two independent pieces live in this crate:
//!
//! - a light registry exposed to agents through the [`Kernel`] plugin contract
//! - a console chat loop that talks to Gemini and can call kernel functions
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lumen::{ApiKeyAuth, ChatSession, GeminiClient, Kernel, SwitchPlugin};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let auth = ApiKeyAuth::from_env()?;
//!     let client = GeminiClient::new(
//!         auth.api_key(),
//!         "gemini-1.5-flash",
//!         std::time::Duration::from_secs(120),
//!     )?;
//!
//!     let mut kernel = Kernel::new();
//!     kernel.add_plugin(Box::new(SwitchPlugin::new()))?;
//!
//!     let mut session = ChatSession::new(Arc::new(client)).with_kernel(kernel);
//!     let reply = session.send("Please turn on the lights").await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod chat;
pub mod config;
pub mod lights;
pub mod llm;
pub mod tools;

// Re-export the public API
pub use auth::ApiKeyAuth;
pub use chat::{run_chat_loop, ChatHistory, ChatOptions, ChatRole, ChatSession};
pub use config::Config;
pub use lights::{LightRecord, LightRegistry, LightStore, LightUpdate};
pub use llm::{ChatBackend, GeminiClient};
pub use tools::{
    FunctionSpec, Kernel, KernelError, LightsPlugin, Plugin, PluginError, SwitchPlugin,
};
