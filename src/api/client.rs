use color_eyre::Result;
use futures::future::BoxFuture;

use super::types::{ProfileUpdate, UserProfile};
use crate::offline::QueuedMutation;

/// Logical endpoint for profile mutations.
pub const PROFILE_ENDPOINT: &str = "/api/user/profile";

/// Logical endpoint for settings mutations.
pub const SETTINGS_ENDPOINT: &str = "/api/user/settings";

/// Upload progress callback, called with a percentage.
pub type ProgressFn<'a> = Box<dyn FnMut(u8) + Send + 'a>;

/// The remote side of the profile service.
///
/// Error messages are meant for the user and end up in the state store
/// verbatim.
pub trait RemoteApi: Send + Sync {
  /// Fetch the current profile.
  fn fetch_profile(&self) -> BoxFuture<'_, Result<UserProfile>>;

  /// Apply a partial update; returns the server's view of the profile.
  fn update_profile(&self, update: ProfileUpdate) -> BoxFuture<'_, Result<UserProfile>>;

  /// Upload a picture and return its remote URI.
  fn upload_picture<'a>(
    &'a self,
    uri: &'a str,
    on_progress: ProgressFn<'a>,
  ) -> BoxFuture<'a, Result<String>>;

  /// Re-issue a mutation that was queued while offline.
  fn apply_mutation<'a>(&'a self, mutation: &'a QueuedMutation) -> BoxFuture<'a, Result<()>>;

  /// Restore the remote's data to its default fixture.
  fn reset_to_default(&self);
}
