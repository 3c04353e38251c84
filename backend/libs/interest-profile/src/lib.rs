//! Nova interest profiles
//!
//! Tracks which topics a user keeps coming back to and persists the result
//! client-side (a cookie by default) with a one year expiry:
//! - `InterestProfileStore` records visits and serves profile reads/summaries
//! - `ProfileStorage` adapters decide where the encoded profile lives
//! - Missing, expired or corrupt data always reads as an empty profile

mod clock;
mod codec;
mod error;
mod metrics;
mod profile;
mod store;

pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{decode_profile, encode_profile};
pub use error::{ProfileError, ProfileResult, StorageError, StorageResult};
pub use profile::{InterestSummary, TopicInterest, TopicRef, UserInterestProfile};
pub use storage::{
    CookieStorage, CookieUpdate, FileStorage, MemoryStorage, ProfileStorage, UnavailableStorage,
};
pub use store::{
    InterestProfileStore, StoreConfig, DEFAULT_EXPIRY_DAYS, DEFAULT_MAX_ENCODED_LEN,
    DEFAULT_STORAGE_KEY,
};
