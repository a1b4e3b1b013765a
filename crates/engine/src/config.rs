use std::time::Duration;

/// Scheduler and channel configuration loaded from environment variables.
///
/// All fields except `FCM_SERVER_KEY` have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often the scheduler polls for due jobs.
    pub poll_interval: Duration,
    /// How long a claimed job stays leased to one scheduler instance.
    pub lease: chrono::Duration,
    /// Expo push endpoint.
    pub expo_push_url: String,
    /// FCM multicast send endpoint.
    pub fcm_send_url: String,
    /// FCM server key, sent as the `Authorization: key=...` header.
    pub fcm_server_key: String,
    /// Per-chunk HTTP timeout for both channels.
    pub chunk_timeout: Duration,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                                   |
    /// |----------------------|-------------------------------------------|
    /// | `POLL_INTERVAL_SECS` | `60`                                      |
    /// | `LEASE_SECS`         | `300`                                     |
    /// | `EXPO_PUSH_URL`      | `https://exp.host/--/api/v2/push/send`    |
    /// | `FCM_SEND_URL`       | `https://fcm.googleapis.com/fcm/send`     |
    /// | `FCM_SERVER_KEY`     | (required)                                |
    /// | `CHUNK_TIMEOUT_SECS` | `10`                                      |
    pub fn from_env() -> Self {
        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let lease_secs: i64 = std::env::var("LEASE_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("LEASE_SECS must be a valid i64");

        let expo_push_url = std::env::var("EXPO_PUSH_URL")
            .unwrap_or_else(|_| "https://exp.host/--/api/v2/push/send".into());

        let fcm_send_url = std::env::var("FCM_SEND_URL")
            .unwrap_or_else(|_| "https://fcm.googleapis.com/fcm/send".into());

        let fcm_server_key = std::env::var("FCM_SERVER_KEY").expect("FCM_SERVER_KEY must be set");

        let chunk_timeout_secs: u64 = std::env::var("CHUNK_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("CHUNK_TIMEOUT_SECS must be a valid u64");

        Self {
            poll_interval: Duration::from_secs(poll_interval_secs),
            lease: chrono::Duration::seconds(lease_secs),
            expo_push_url,
            fcm_send_url,
            fcm_server_key,
            chunk_timeout: Duration::from_secs(chunk_timeout_secs),
        }
    }
}
