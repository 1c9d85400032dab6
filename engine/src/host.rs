//! The host's side-effecting calls.
//!
//! The engine decides; the host enforces. Each method is called at most once
//! per write, except [`Host::grant_access`], which is called once per
//! access-assignment rule that yields a non-empty grant.

use syncguard_schema::{AccessGrant, Expiry, Rejection, RequiredAccess};

/// Operations the engine asks the host to perform.
pub trait Host {
    /// Checks that the writer holds any of the required authorizations.
    ///
    /// # Errors
    ///
    /// Returns the host's own rejection; the engine propagates it unchanged.
    fn require_access(&mut self, required: &RequiredAccess) -> Result<(), Rejection>;

    /// Assigns the document to the given channels.
    fn assign_channels(&mut self, channels: &[String]);

    /// Issues one access grant.
    fn grant_access(&mut self, grant: &AccessGrant);

    /// Sets the document's expiry.
    fn set_expiry(&mut self, expiry: &Expiry);
}

impl<H: Host + ?Sized> Host for &mut H {
    fn require_access(&mut self, required: &RequiredAccess) -> Result<(), Rejection> {
        (**self).require_access(required)
    }

    fn assign_channels(&mut self, channels: &[String]) {
        (**self).assign_channels(channels);
    }

    fn grant_access(&mut self, grant: &AccessGrant) {
        (**self).grant_access(grant);
    }

    fn set_expiry(&mut self, expiry: &Expiry) {
        (**self).set_expiry(expiry);
    }
}
