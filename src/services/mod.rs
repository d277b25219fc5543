//! Service layer for the notifier.
//!
//! This module contains the collaborators of a cycle:
//! - Job search (`Fetcher`, `SerpApiFetcher`)
//! - Source platform labels (`classify`)
//! - Digest rendering (`render`)
//! - Delivery (`Notifier`, `ResendNotifier`)

pub mod digest;
pub mod notify;
pub mod platform;
pub mod search;

pub use digest::{Digest, render};
pub use notify::{Notifier, ResendNotifier, build_notifier};
pub use platform::classify;
pub use search::{Fetcher, SerpApiFetcher};
