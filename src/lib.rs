//! # rxcast: multicast subjects with per-subscriber backpressure
//!
//! A subject takes values, an error, or a completion from producers and fans
//! them out to any number of subscribers. Each subscriber owns a delivery
//! channel and a consumption loop, so it runs at its own pace and applies
//! its own overload policy when it falls behind.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use futures::executor::block_on;
//! use rxcast::prelude::*;
//!
//! let subject = Subject::<&str, String>::new();
//! let (_subscription, observer) = subject.subscribe();
//!
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//! observer.on_next(move |v| c_seen.lock().unwrap().push(v)).unwrap();
//!
//! subject.next("hello");
//! subject.complete();
//! block_on(observer.finished());
//!
//! assert_eq!(*seen.lock().unwrap(), vec!["hello"]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Subject`] | Hot multicast source; producers call [`Emitter`] methods on it |
//! | [`ReplaySubject`] | Subject that replays its last `n` values to late subscribers |
//! | [`SubjectConfig`] | Overload policy, channel size, gated delivery, scheduler |
//! | [`Observer`] | Read side of one subscription: sinks or a `Stream` |
//! | [`SubjectSubscription`] | Handle to stop one subscriber |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): `futures::executor::ThreadPool` as a
//!   [`Scheduler`](scheduler::Scheduler)
//! - **`tokio-scheduler`**: `tokio::runtime::Handle` as a scheduler
//!
//! [`Subject`]: subject::Subject
//! [`ReplaySubject`]: subject::ReplaySubject
//! [`Emitter`]: subject::Emitter
//! [`SubjectConfig`]: config::SubjectConfig
//! [`Observer`]: observer::Observer
//! [`SubjectSubscription`]: subject::SubjectSubscription

pub mod channel;
pub mod config;
pub mod error;
pub mod notification;
pub mod observer;
pub mod prelude;
pub mod scheduler;
pub mod subject;
pub mod subscription;

pub use prelude::*;
