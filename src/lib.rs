//! # ndfc-rest - REST orchestration core for Cisco NDFC/DCNM controllers
//!
//! Fabric automation against an NDFC/DCNM controller always has the same
//! shape: build a desired-state payload, read the current state, compute the
//! minimal difference, and issue REST calls to converge - all under a
//! check-mode/idempotence contract. This crate is the shared machinery that
//! shape rests on, independent of any particular fabric resource.
//!
//! ## Layers
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    Task runner (caller)                   │
//! │    builds payloads, inspects results, reports outcome     │
//! └───────────────────────────────────────────────────────────┘
//!                │                                 │
//!                ▼                                 ▼
//! ┌──────────────────────────────┐  ┌──────────────────────────┐
//! │           RestSend           │  │   VerifyPlaybookParams   │
//! │  check-mode suppression,     │  │  template dependency     │
//! │  poll budget, settings       │  │  rules over playbook /   │
//! │  save-restore, auto-register │  │  controller / defaults   │
//! └──────────────────────────────┘  └──────────────────────────┘
//!        │              │
//!        ▼              ▼
//! ┌─────────────┐  ┌──────────────────┐  ┌───────────────────────┐
//! │   Sender    │  │ ResponseHandler  │  │ WaitForControllerDone │
//! │ one request │  │ envelope ->      │  │ poll an ISSU view     │
//! │ per call    │  │ success/changed/ │  │ until actions settle  │
//! │             │  │ found            │  │                       │
//! └─────────────┘  └──────────────────┘  └───────────────────────┘
//! ```
//!
//! Every [`RestSend::commit`](rest_send::RestSend::commit) leaves a record in
//! the embedded [`Results`](results::Results) accumulator; the task runner
//! collapses it once at the end with
//! [`build_final_result`](results::Results::build_final_result) into the
//! `{changed, failed, diff, response, result, metadata}` report.
//!
//! The crate is deliberately single-threaded and synchronous: one blocking
//! round trip per request, fixed-interval sleeps for the only waiting
//! construct, no locking needed anywhere.
//!
//! ## Quick example
//!
//! ```rust,ignore
//! use ndfc_rest::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let config = ControllerConfig::load(None)?;
//!     let mut rest_send = RestSend::new(HttpSender::new(&config)?)
//!         .with_check_mode(false);
//!
//!     rest_send.results_mut().set_action("fabric_query");
//!     let result = rest_send.commit(
//!         Verb::Get,
//!         "/api/v1/lan-fabric/rest/control/fabrics/f1",
//!         None,
//!     )?;
//!
//!     if result.found == Some(false) {
//!         println!("fabric f1 does not exist");
//!     }
//!     println!("{}", serde_json::to_string_pretty(
//!         &rest_send.into_results().build_final_result(),
//!     )?);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod issu;
pub mod response;
pub mod rest_send;
pub mod results;
pub mod sender;
pub mod verify;
pub mod wait_for;

pub use config::ControllerConfig;
pub use error::{Error, Result};
pub use issu::{FilterKey, SwitchIssuDetails, ISSU_PATH};
pub use response::{RequestResult, ResponseHandler};
pub use rest_send::{RestSend, Settings};
pub use results::{FinalResult, Results, TaskMetadata};
pub use sender::{HttpSender, Sender, Verb};
pub use verify::{Operator, Rule, VerifyPlaybookParams};
pub use wait_for::{ControllerView, WaitForControllerDone};

pub mod prelude {
    //! Convenient re-exports of the types most callers need.

    pub use crate::config::ControllerConfig;
    pub use crate::error::{Error, Result};
    pub use crate::issu::{FilterKey, SwitchIssuDetails};
    pub use crate::response::{RequestResult, ResponseHandler};
    pub use crate::rest_send::RestSend;
    pub use crate::results::Results;
    pub use crate::sender::{HttpSender, Sender, Verb};
    pub use crate::verify::VerifyPlaybookParams;
    pub use crate::wait_for::WaitForControllerDone;
}
