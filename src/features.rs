//! Feature catalog routing.
//!
//! Only features listed in [`FEATURE_ROUTES`] are reachable from the
//! sidebar; other catalog entries can be granted but never render.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub const COMPANIES_FEATURE: &str = "companies";
pub const WAREHOUSE_FEATURE: &str = "warehouse";

/// Feature code to API route.
pub const FEATURE_ROUTES: &[(&str, &str)] = &[
    (COMPANIES_FEATURE, "/api/v1/company"),
    (WAREHOUSE_FEATURE, "/api/v1/warehouse"),
];

/// Route of a feature, if it has one.
pub fn feature_route(code: &str) -> Option<&'static str> {
    FEATURE_ROUTES
        .iter()
        .find(|(feature, _)| *feature == code)
        .map(|(_, route)| *route)
}

/// Entry rendered in the navigation sidebar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SidebarFeature {
    pub code: String,
    pub name: String,
    pub url: String,
}

/// State of a catalog feature for one company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    Enabled,
    Disabled,
    NotGranted,
}

/// Row of the company feature overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FeatureOverviewEntry {
    pub feature_id: Uuid,
    pub code: String,
    pub name: String,
    pub status: FeatureStatus,
    /// Grant backing the status, absent when not granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_id: Option<Uuid>,
    /// Route, only when enabled and routed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_are_known_for_core_features() {
        assert_eq!(feature_route("companies"), Some("/api/v1/company"));
        assert_eq!(feature_route("warehouse"), Some("/api/v1/warehouse"));
        assert_eq!(feature_route("users"), None);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(FeatureStatus::NotGranted).unwrap(),
            serde_json::json!("not_granted")
        );
    }
}
