// backend/services/notifications/consumer/src/main.rs

use notifications::bootstrap::run_consumer;
use shared_kernel::errors::AppResult;

#[tokio::main]
async fn main() -> AppResult<()> {
    run_consumer().await
}
