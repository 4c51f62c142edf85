//! Task board back-end — project/task tracking with an AI assist gateway.
//!
//! ## Overview
//!
//! The board subsystem serves a Kanban-style project manager: projects own
//! tasks, each task sits in one of three fixed status columns ("To Do",
//! "In Progress", "Done"), and the client drags tasks between columns via a
//! status-only move endpoint. Two AI endpoints build prompts from stored
//! board data and relay Gemini's reply verbatim.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌────────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (axum Router, ServerConfig, CORS)  │
//! │ (browser)│ <─────── │    └─ api.rs  (route handlers, AppState)       │
//! └──────────┘          │         │                    │                 │
//!                       │         │ DbHandle::call()   │ TextGenerator   │
//!                       │         v                    v                 │
//!                       │  db.rs (SQLite store)   ai.rs (GeminiClient)   │
//!                       └────────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module   | Responsibility                                           |
//! |----------|----------------------------------------------------------|
//! | `models` | Shared types: `Project`, `Task`, `TaskStatus`            |
//! | `db`     | SQLite access via `DbHandle` (thin `Arc<Mutex<_>>`)      |
//! | `ai`     | `TextGenerator` trait, Gemini client, prompt builders    |
//!
//! ## Typical Request Flow (move task → "In Progress")
//!
//! 1. `PUT /api/tasks/{id}/move` → `api::move_task()`
//! 2. The payload's `status` string is parsed into a `TaskStatus`; anything
//!    outside the three columns is rejected before touching the store.
//! 3. `db::BoardDb::set_task_status()` writes the new column and returns the
//!    updated task, which is echoed back as the response body.

pub mod ai;
pub mod api;
pub mod db;
pub mod models;
pub mod server;
