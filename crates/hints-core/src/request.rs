//! Inbound request interface.

/// Header names the hook reads and forwards.
pub mod header {
    /// Credential header forwarded on refresh calls.
    pub const AUTHORIZATION: &str = "authorization";
    /// Resource-hint header fetched from the origin.
    pub const LINK: &str = "link";
}

/// The inbound client request as seen by the hook.
///
/// The platform integration adapts its native request type to this; tests
/// use an in-memory double.
pub trait ClientRequest {
    /// All values of an incoming header, in wire order, or `None` when absent.
    fn header(&self, name: &str) -> Option<Vec<String>>;

    /// Set a named variable consumable later in request processing.
    fn set_variable(&self, name: &str, value: &str);

    /// The request's own target URL.
    fn url(&self) -> &str;
}
