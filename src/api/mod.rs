//! Remote API capability and its mock implementation.

mod client;
mod fixture;
mod mock;
mod types;

pub use client::{ProgressFn, RemoteApi, PROFILE_ENDPOINT, SETTINGS_ENDPOINT};
pub use fixture::{default_profile, DurableFixtures, FixtureStore, InMemoryFixtures};
pub use mock::{ApiCalls, MockApi, UPDATE_FAILED_MESSAGE};
pub use types::{Preferences, PreferencesUpdate, ProfileUpdate, UserProfile};
