//! Resource provider trait: the repository behind SCIM operations.
//!
//! A provider stores resources, runs filters over them for searches and
//! applies PATCH requests, with optional version-aware concurrency control.
//!
//! # Key Types
//!
//! - [`ResourceProvider`] - CRUD, search and patch over one storage backend
//! - [`SearchRequest`] - filter, sort and pagination parameters of a query
//! - [`SearchPage`] - one page of search results plus the total match count

use super::extensions::RequestContext;
use crate::patch::PatchRequest;
use crate::resource::{RawVersion, VersionedResource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// Sort direction of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Query parameters of a search (RFC 7644 section 3.4.2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
    /// 1-based index of the first result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_attributes: Vec<String>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, sort_order: SortOrder) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = sort_order;
        self
    }

    pub fn with_start_index(mut self, start_index: usize) -> Self {
        self.start_index = Some(start_index);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_excluded_attributes(mut self, excluded_attributes: Vec<String>) -> Self {
        self.excluded_attributes = excluded_attributes;
        self
    }
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub resources: Vec<VersionedResource>,
    /// Number of resources matching the filter, across all pages
    pub total_results: usize,
    /// 1-based index of the first resource in `resources`
    pub start_index: usize,
}

/// Storage CRUD plus search and patch for SCIM resources.
///
/// `expected_version`, when given, must equal the stored version or the
/// operation fails with a version mismatch and changes nothing.
pub trait ResourceProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a resource. Server-assigned attributes (`id`, `meta`) are
    /// generated; client-supplied values for them are ignored.
    fn create_resource(
        &self,
        resource_type: &str,
        data: Value,
        context: &RequestContext,
    ) -> impl Future<Output = Result<VersionedResource, Self::Error>> + Send;

    fn get_resource(
        &self,
        resource_type: &str,
        id: &str,
        context: &RequestContext,
    ) -> impl Future<Output = Result<Option<VersionedResource>, Self::Error>> + Send;

    /// Replace a resource's content wholesale (HTTP PUT).
    fn update_resource(
        &self,
        resource_type: &str,
        id: &str,
        data: Value,
        expected_version: Option<&RawVersion>,
        context: &RequestContext,
    ) -> impl Future<Output = Result<VersionedResource, Self::Error>> + Send;

    fn delete_resource(
        &self,
        resource_type: &str,
        id: &str,
        expected_version: Option<&RawVersion>,
        context: &RequestContext,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Filter, sort and page the resources of a type.
    fn search_resources(
        &self,
        resource_type: &str,
        request: &SearchRequest,
        context: &RequestContext,
    ) -> impl Future<Output = Result<SearchPage, Self::Error>> + Send;

    /// Apply a PATCH request atomically.
    fn patch_resource(
        &self,
        resource_type: &str,
        id: &str,
        request: &PatchRequest,
        expected_version: Option<&RawVersion>,
        context: &RequestContext,
    ) -> impl Future<Output = Result<VersionedResource, Self::Error>> + Send;

    fn resource_exists(
        &self,
        resource_type: &str,
        id: &str,
        context: &RequestContext,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
