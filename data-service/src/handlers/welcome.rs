use chrono::Local;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Plain-text greeting stamped with the server's local time.
pub async fn index() -> String {
    format!(
        "Welcome to the data service! The current time is: {}",
        Local::now().format(TIMESTAMP_FORMAT)
    )
}
