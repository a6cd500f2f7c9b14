//! API Handlers
//!
//! HTTP request handlers for the operational admin endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{CacheInfo, CacheMetrics};
use crate::config::{AppConfig, CacheConfig, CacheConfigUpdate};
use crate::domain::{FinancialCache, InvalidationTarget};
use crate::error::{CacheError, Result};
use crate::models::{ClearResponse, HealthResponse, InvalidatePatternRequest, InvalidateResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Financial data cache
    pub cache: FinancialCache,
}

impl AppState {
    /// Creates a new AppState around an existing facade.
    pub fn new(cache: FinancialCache) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(FinancialCache::with_config(config.cache.clone())?))
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Json<CacheMetrics> {
    Json(state.cache.metrics().await)
}

/// Handler for GET /info
pub async fn info_handler(State(state): State<AppState>) -> Json<CacheInfo> {
    Json(state.cache.info().await)
}

/// Handler for POST /invalidate
///
/// Removes every key matching a raw pattern.
pub async fn invalidate_pattern_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidatePatternRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.handle().invalidate_pattern(&req.pattern).await;

    Ok(Json(InvalidateResponse::new(req.pattern, removed)))
}

/// Handler for POST /invalidate/:domain
///
/// Runs a named facade invalidation, including its cascades.
pub async fn invalidate_domain_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    let target: InvalidationTarget = domain.parse()?;
    let removed = state.cache.invalidate(target).await;

    Ok(Json(InvalidateResponse::new(target.to_string(), removed)))
}

/// Handler for DELETE /clear
///
/// Empties the cache and resets metrics.
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.handle().clear().await;
    Json(ClearResponse::new())
}

/// Handler for PATCH /config
///
/// Merges a partial configuration and returns the resulting one.
pub async fn update_config_handler(
    State(state): State<AppState>,
    Json(update): Json<CacheConfigUpdate>,
) -> Result<Json<CacheConfig>> {
    let config = state.cache.handle().update_config(&update).await?;
    Ok(Json(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionFilters;
    use serde_json::json;

    fn state() -> AppState {
        AppState::from_config(&AppConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_metrics_handler_starts_empty() {
        let response = metrics_handler(State(state())).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
        assert_eq!(response.entry_count, 0);
    }

    #[tokio::test]
    async fn test_invalidate_domain_handler_cascades() {
        let state = state();
        let none = TransactionFilters::new();
        state.cache.set_revenues(&none, &json!([])).await.unwrap();
        state.cache.set_stats(&none, &json!({})).await.unwrap();

        let response = invalidate_domain_handler(State(state.clone()), Path("revenues".to_string()))
            .await
            .unwrap();

        assert_eq!(response.target, "revenues");
        assert_eq!(response.removed, 2);
    }

    #[tokio::test]
    async fn test_invalidate_unknown_domain() {
        let result = invalidate_domain_handler(State(state()), Path("budgets".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalidate_pattern_rejects_empty() {
        let req = InvalidatePatternRequest {
            pattern: "".to_string(),
        };
        let result = invalidate_pattern_handler(State(state()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_update_config_handler() {
        let update = CacheConfigUpdate {
            max_entries: Some(42),
            ..Default::default()
        };
        let response = update_config_handler(State(state()), Json(update))
            .await
            .unwrap();
        assert_eq!(response.max_entries, 42);
    }

    #[tokio::test]
    async fn test_clear_handler() {
        let state = state();
        state.cache.set_bank_accounts(&json!(["a"])).await.unwrap();

        clear_handler(State(state.clone())).await;

        assert_eq!(state.cache.info().await.entry_count, 0);
    }
}
