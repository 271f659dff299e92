// backend/services/products/workers/outbox-dispatcher/src/main.rs

use products::infrastructure::bootstrap::run_outbox_dispatcher;
use shared_kernel::errors::AppResult;

#[tokio::main]
async fn main() -> AppResult<()> {
    run_outbox_dispatcher().await
}
