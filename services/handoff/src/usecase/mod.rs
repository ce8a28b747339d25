pub mod complete;
pub mod generate;
pub mod history;
pub mod status;
pub mod validate;

use crate::domain::repository::ChangeNotifier;
use crate::domain::types::OrderChangeEvent;

/// The write has already happened, so a failed push must not fail the request.
/// Watchers resynchronise from the snapshot when they reconnect.
async fn publish_or_warn<N: ChangeNotifier>(notifier: &N, event: OrderChangeEvent) {
    let order_id = event.order_id;
    if let Err(e) = notifier.publish(event).await {
        tracing::warn!(error = ?e, %order_id, "failed to publish order change");
    }
}
