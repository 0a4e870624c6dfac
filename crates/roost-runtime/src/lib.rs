//! # roost-runtime
//!
//! The execution harness — the shared machinery every routine runs
//! through. Routines supply a prompt, a capability allow-list, and an
//! output handler; the harness supplies everything generic: locating prior
//! conversation state, deciding whether to fork it, invoking the engine,
//! and committing or discarding resulting state afterward.
//!
//! ## Invocation lifecycle
//!
//! ```text
//!   run(name)
//!      │
//!      ▼
//!  ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//!  │ Registry │ → │ Session  │ → │  Prompt  │ → │  Engine  │
//!  │  lookup  │   │ resolver │   │  build   │   │  invoke  │
//!  └──────────┘   └──────────┘   └──────────┘   └──────────┘
//!                      │                             │
//!                 session store                      ▼
//!                      ▲                        ┌──────────┐   ┌──────────┐
//!                      └─────────────────────── │  Session │ → │  Output  │
//!                                               │  commit  │   │  handle  │
//!                                               └──────────┘   └──────────┘
//! ```
//!
//! Commit strictly precedes output handling, so persisted state reflects
//! what the engine actually produced regardless of what the handler does
//! with it. Concurrent runs never share mutable state beyond the store
//! itself; the last commit wins.

pub mod harness;
pub mod registry;
pub mod resolver;

pub use harness::{Harness, RunReport};
pub use registry::RoutineRegistry;
pub use resolver::{SessionPlan, SessionResolver};
