pub use crate::{
  config::{Backpressure, PublishMode, SubjectConfig},
  error::Error,
  notification::Notification,
  observer::{Observer, ObserverStream},
  scheduler::{NewThread, Scheduler},
  subject::{Emitter, ReplaySubject, Subject, SubjectSubscription},
  subscription::{Subscription, SubscriptionGuard},
};
