use std::time::Duration;

/// Default address of the realtime database service
pub const DEFAULT_HOST: &str = "http://localhost:3000";

/// Default remote module name
pub const DEFAULT_MODULE_NAME: &str = "quickstart-chat";

/// Durable storage key holding the session's auth token
pub const TOKEN_STORAGE_KEY: &str = "spacetimedb_token";

/// Delay between a disconnect and the single reconnect attempt it schedules
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Number of hex characters shown when a user has no display name
pub const SHORT_IDENTITY_LEN: usize = 8;

/// Identity size in bytes
pub const IDENTITY_SIZE: usize = 32;

/// Subscription queries
pub const USER_QUERY: &str = "SELECT * FROM User";
pub const MESSAGE_QUERY: &str = "SELECT * FROM Message";

/// Reducer names as registered by the remote module
pub const REDUCER_SET_NAME: &str = "SetName";
pub const REDUCER_SEND_MESSAGE: &str = "SendMessage";

/// Sender label for messages whose author is not in the local mirror
pub const UNKNOWN_SENDER: &str = "unknown";

/// Placeholder shown in the message list while disconnected
pub const DISCONNECTED_PLACEHOLDER: &str = "Disconnected. Attempting to reconnect...";

/// Placeholder once the reconnect limit is spent
pub const GAVE_UP_PLACEHOLDER: &str = "Disconnected. Reconnect limit reached.";

/// Every relation this client subscribes to, in registration order.
pub fn subscription_queries() -> Vec<String> {
    vec![USER_QUERY.to_string(), MESSAGE_QUERY.to_string()]
}
