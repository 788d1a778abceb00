//! relink Core Components
//!
//! This crate provides the reconciliation engine: rename inference between
//! two module snapshots, import edit derivation, syntax-preserving import
//! rewriting, post-run verification and the reconciler configuration.

mod config;
mod error;
pub mod reconcile;
mod report;
mod rewrite;
pub mod verify;

pub use config::{ReconcilerConfig, CONFIG_FILE_NAME};
pub use error::CoreError;
pub use reconcile::{
    ChangeStatus, Correspondence, ImportChange, MatchStrategy, ReconcileOptions, Reconciler,
};
pub use report::{FileOutcome, ReconcileReport};
pub use rewrite::{ImportRewriter, Rewritten};
pub use verify::{CommandTestRunner, TestOutcome, TestRunner};
