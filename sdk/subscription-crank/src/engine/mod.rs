//! The recurring billing crank: read, select, charge, report.

pub mod executor;
pub mod notify;
pub mod pass;
pub mod reader;
pub mod report;
pub mod selector;

pub use executor::{ChargeExecutor, ChargeOutcome};
pub use notify::{ChannelNotifier, DueNotifier, NoopNotifier, SpoolNotifier};
pub use pass::CrankLoop;
pub use reader::{AccountSnapshot, ListedSubscription, UndecodableRecord};
pub use report::{EntryOutcome, PassReport, PassStatus, ReportEntry};
pub use selector::{DueItem, Selection, SkipReason, SkippedItem};
