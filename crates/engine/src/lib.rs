// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! supvisors-engine: the Commander/Starter/Stopper and the fleet FSM
//! (spec.md §4.7-§4.8). Owns the decision logic of the single-threaded
//! cooperative event loop; holds no transport or tokio-runtime setup of
//! its own beyond `async fn` signatures driven by the daemon's loop.

pub mod commander;
pub mod error;
pub mod fsm;

pub use commander::{Commander, FailureAction, FailureOutcome, OPERATION_TIMEOUT_MS};
pub use error::EngineError;
pub use fsm::{Fsm, FsmState};
