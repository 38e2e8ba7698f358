use crate::client::FleetRouting;
use crate::errors::OptimizationError;
use crate::metrics_defs::{OPTIMIZE_DURATION, OPTIMIZE_REQUESTS, OPTIMIZE_SHIPMENTS};
use crate::request::OptimizeToursRequest;
use serde_json::Value;
use shared::{counter, histogram};
use std::time::Instant;

/// Validates a decoded request body and forwards it to the optimization service.
///
/// Invalid requests are rejected before any upstream call. Upstream failures
/// are returned as is; nothing is retried.
pub async fn optimize_tours(
    client: &dyn FleetRouting,
    body: Value,
) -> Result<Value, OptimizationError> {
    let request = match OptimizeToursRequest::from_value(body) {
        Ok(request) => request,
        Err(e) => {
            counter!(OPTIMIZE_REQUESTS, "outcome" => "invalid").increment(1);
            tracing::info!(error = %e, "Rejected optimization request");
            return Err(e);
        }
    };

    let shipments = request.model.shipments.len();
    let vehicles = request.model.vehicles.len();
    histogram!(OPTIMIZE_SHIPMENTS).record(shipments as f64);
    tracing::debug!(shipments, vehicles, "Forwarding optimization request");

    let start = Instant::now();
    let result = client.optimize_tours(request).await;
    histogram!(OPTIMIZE_DURATION).record(start.elapsed().as_secs_f64());

    match result {
        Ok(response) => {
            counter!(OPTIMIZE_REQUESTS, "outcome" => "success").increment(1);
            tracing::info!(
                shipments,
                vehicles,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Optimization request completed"
            );
            Ok(response)
        }
        Err(e) => {
            counter!(OPTIMIZE_REQUESTS, "outcome" => "upstream_error").increment(1);
            tracing::warn!(code = ?e.code, error = %e, "Optimization service returned an error");
            Err(e.into())
        }
    }
}
