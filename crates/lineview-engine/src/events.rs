//! Execution event rows and the paged fetch request.

use serde::{Deserialize, Serialize};

use crate::interval::TimeInterval;

/// One execution event as listed by the lineage server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionEvent {
    /// Server-side identifier, when the server provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_event_id: Option<String>,
    pub framework_name: String,
    pub application_name: String,
    pub application_id: String,
    /// Millisecond epoch timestamp of the execution.
    pub timestamp: i64,
    /// URI of the written data source.
    pub datasource: String,
    pub datasource_type: String,
    pub write_mode: String,
}

impl ExecutionEvent {
    /// The seven searchable fields, as text.
    pub fn searchable_fields(&self) -> [std::borrow::Cow<'_, str>; 7] {
        use std::borrow::Cow;
        [
            Cow::Borrowed(self.framework_name.as_str()),
            Cow::Borrowed(self.application_name.as_str()),
            Cow::Borrowed(self.application_id.as_str()),
            Cow::Owned(self.timestamp.to_string()),
            Cow::Borrowed(self.datasource.as_str()),
            Cow::Borrowed(self.datasource_type.as_str()),
            Cow::Borrowed(self.write_mode.as_str()),
        ]
    }
}

/// One page of execution events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionEventsPage {
    #[serde(default)]
    pub elements: Vec<ExecutionEvent>,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub total_count: u64,
}

/// Parameters of the "fetch execution events" request.
///
/// Every value is a decimal-encoded millisecond timestamp or count, which
/// is what the server's query interface expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchParams {
    pub timestamp_start: String,
    pub timestamp_end: String,
    pub as_at_time: String,
    pub offset: String,
}

impl FetchParams {
    /// Request `offset` into the events within `range`, as of `as_at_ms`.
    pub fn new(range: TimeInterval, as_at_ms: i64, offset: u64) -> Self {
        Self {
            timestamp_start: range.start_ms().to_string(),
            timestamp_end: range.end_ms().to_string(),
            as_at_time: as_at_ms.to_string(),
            offset: offset.to_string(),
        }
    }

    /// The same request at another offset.
    #[must_use]
    pub fn at_offset(&self, offset: u64) -> Self {
        Self {
            offset: offset.to_string(),
            ..self.clone()
        }
    }

    /// Offset parsed back to a number; malformed values read as zero.
    pub fn offset_value(&self) -> u64 {
        self.offset.parse().unwrap_or(0)
    }
}

/// Built-in rows for offline browsing.
pub fn sample_events() -> Vec<ExecutionEvent> {
    let row = |app: &str, id: &str, ts: i64, ds: &str, ty: &str, mode: &str| ExecutionEvent {
        execution_event_id: None,
        framework_name: "Spark".into(),
        application_name: app.into(),
        application_id: id.into(),
        timestamp: ts,
        datasource: ds.into(),
        datasource_type: ty.into(),
        write_mode: mode.into(),
    };
    vec![
        row(
            "Marketing Ingest",
            "app-20240102-0001",
            1_704_186_000_000,
            "hdfs://warehouse/marketing/raw.parquet",
            "parquet",
            "append",
        ),
        row(
            "Marketing Ingest",
            "app-20240102-0002",
            1_704_272_400_000,
            "hdfs://warehouse/marketing/campaigns.csv",
            "csv",
            "overwrite",
        ),
        row(
            "Sales Rollup",
            "app-20240103-0007",
            1_704_358_800_000,
            "s3://lake/sales/daily.parquet",
            "parquet",
            "overwrite",
        ),
        row(
            "Sales Rollup",
            "app-20240104-0003",
            1_704_445_200_000,
            "s3://lake/sales/weekly",
            "delta",
            "append",
        ),
        row(
            "Customer Merge",
            "app-20240105-0011",
            1_704_531_600_000,
            "jdbc:postgresql://crm/customers",
            "jdbc",
            "overwrite",
        ),
        row(
            "Customer Merge",
            "app-20240106-0004",
            1_704_618_000_000,
            "hdfs://warehouse/crm/customers.parquet",
            "parquet",
            "append",
        ),
        row(
            "Audit Export",
            "app-20240107-0002",
            1_704_704_400_000,
            "file:///exports/audit.json",
            "json",
            "overwrite",
        ),
    ]
}

/// One page of [`sample_events`], ignoring the requested time range.
pub fn sample_page(offset: u64, size: u64) -> ExecutionEventsPage {
    let rows = sample_events();
    let total_count = rows.len() as u64;
    let skip = usize::try_from(offset).unwrap_or(usize::MAX);
    let take = usize::try_from(size.max(1)).unwrap_or(usize::MAX);
    ExecutionEventsPage {
        elements: rows.into_iter().skip(skip).take(take).collect(),
        offset,
        total_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_params_are_decimal_strings() {
        let params = FetchParams::new(TimeInterval::ordered(1_000, 2_000), 3_000, 20);
        let json = serde_json::to_value(&params).unwrap();

        assert_eq!(json["timestampStart"], "1000");
        assert_eq!(json["timestampEnd"], "2000");
        assert_eq!(json["asAtTime"], "3000");
        assert_eq!(json["offset"], "20");
        assert_eq!(params.at_offset(30).offset_value(), 30);
    }

    #[test]
    fn test_event_uses_camel_case_wire_names() {
        let json = r#"{
            "frameworkName": "Spark",
            "applicationName": "job",
            "applicationId": "app-1",
            "timestamp": 42,
            "datasource": "hdfs://x",
            "datasourceType": "parquet",
            "writeMode": "append"
        }"#;
        let event: ExecutionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.application_id, "app-1");
        assert_eq!(event.execution_event_id, None);
        assert_eq!(event.searchable_fields()[3], "42");
    }

    #[test]
    fn test_sample_events() {
        let events = sample_events();
        assert_eq!(events.len(), 7);
        assert!(events.iter().all(|e| e.framework_name == "Spark"));
        assert_eq!(
            events
                .iter()
                .filter(|e| e.datasource_type == "parquet")
                .count(),
            3
        );
    }

    #[test]
    fn test_sample_page_slices_rows() {
        let page = sample_page(5, 5);
        assert_eq!(page.elements.len(), 2);
        assert_eq!(page.offset, 5);
        assert_eq!(page.total_count, 7);
        assert!(sample_page(10, 5).elements.is_empty());
    }
}
