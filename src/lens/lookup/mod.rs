//! IP information lookup lens
//!
//! Combines the transport client with the response transformer and provides
//! rendering into the supported output formats.

use anyhow::Result;

use crate::client::{GeoClient, LookupError, LookupResult};
use crate::lens::report::{categorize, IpReport};
use crate::lens::utils::OutputFormat;

/// IP information lookup lens
///
/// # Example
///
/// ```rust,ignore
/// use ipscope::{GeoClient, IpscopeConfig, LookupLens};
///
/// let config = IpscopeConfig::new(&None)?;
/// let lens = LookupLens::new(GeoClient::new(&config));
///
/// let report = lens.lookup_address("8.8.8.8")?;
/// println!("{}", report.basic.ip_address);
/// ```
pub struct LookupLens {
    client: GeoClient,
}

impl LookupLens {
    /// Create a new lookup lens around a client
    pub fn new(client: GeoClient) -> Self {
        Self { client }
    }

    /// Look up the caller's current public IP
    pub fn lookup_current(&self) -> LookupResult<IpReport> {
        let raw = self.client.fetch_current()?;
        categorize(&raw).ok_or(LookupError::InvalidResponse)
    }

    /// Look up a specific IP address
    pub fn lookup_address(&self, address: &str) -> LookupResult<IpReport> {
        let raw = self.client.fetch_for_address(address)?;
        categorize(&raw).ok_or(LookupError::InvalidResponse)
    }

    /// Probe the upstream API; true iff it is reachable and the key works
    pub fn test_connection(&self) -> bool {
        self.client.check_connectivity()
    }

    /// Render a report in the requested output format
    pub fn format_report(&self, report: &IpReport, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string(report)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Text => Ok(report.to_text()),
            #[cfg(feature = "display")]
            OutputFormat::Table => Ok(render_table(report, false)),
            #[cfg(feature = "display")]
            OutputFormat::Markdown => Ok(render_table(report, true)),
            #[cfg(not(feature = "display"))]
            OutputFormat::Table | OutputFormat::Markdown => Err(anyhow::anyhow!(
                "table output requires the 'display' feature"
            )),
        }
    }
}

#[cfg(feature = "display")]
fn render_table(report: &IpReport, markdown: bool) -> String {
    use tabled::settings::Style;
    use tabled::{Table, Tabled};

    #[derive(Tabled)]
    struct ReportRow {
        #[tabled(rename = "Category")]
        category: &'static str,
        #[tabled(rename = "Field")]
        field: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows: Vec<ReportRow> = report
        .sections()
        .into_iter()
        .flat_map(|(category, fields)| {
            fields
                .into_iter()
                .map(move |(field, value)| ReportRow {
                    category,
                    field,
                    value,
                })
        })
        .collect();

    match markdown {
        true => Table::new(rows).with(Style::markdown()).to_string(),
        false => Table::new(rows).with(Style::rounded()).to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IpscopeConfig;
    use serde_json::json;

    fn sample_report() -> IpReport {
        categorize(&json!({
            "ip_address": "1.1.1.1",
            "city": "Sydney",
            "connection": {"isp_name": "Cloudflare, Inc.", "autonomous_system_number": 13335},
            "security": {"is_vpn": false, "is_proxy": false, "is_tor": false, "is_relay": false}
        }))
        .unwrap()
    }

    fn offline_lens() -> LookupLens {
        LookupLens::new(GeoClient::new(&IpscopeConfig {
            api_key: "test-key".to_string(),
            base_url: "http://127.0.0.1:1/".to_string(),
            lookup_timeout_secs: 1,
            connect_timeout_secs: 1,
        }))
    }

    #[test]
    fn test_lookup_empty_address_is_invalid_input() {
        let lens = offline_lens();
        assert_eq!(
            lens.lookup_address(""),
            Err(LookupError::InvalidInput("".to_string()))
        );
    }

    #[test]
    fn test_format_json() {
        let lens = offline_lens();
        let report = sample_report();

        let json_out = lens.format_report(&report, OutputFormat::Json).unwrap();
        assert!(json_out.contains("\"IP Address\":\"1.1.1.1\""));

        let pretty = lens
            .format_report(&report, OutputFormat::JsonPretty)
            .unwrap();
        assert!(pretty.contains("\"ISP\": \"Cloudflare, Inc.\""));
    }

    #[test]
    fn test_format_text() {
        let lens = offline_lens();
        let report = sample_report();
        let text = lens.format_report(&report, OutputFormat::Text).unwrap();
        assert!(text.contains("1.1.1.1"));
        assert!(text.contains("Sydney"));
        assert!(text.contains("> CONNECTION"));
    }

    #[cfg(feature = "display")]
    #[test]
    fn test_format_table() {
        let lens = offline_lens();
        let report = sample_report();

        let table = lens.format_report(&report, OutputFormat::Table).unwrap();
        assert!(table.contains("Category"));
        assert!(table.contains("1.1.1.1"));
        assert!(table.contains("13335"));

        let md = lens.format_report(&report, OutputFormat::Markdown).unwrap();
        assert!(md.contains("|"));
        assert!(md.contains("Cloudflare, Inc."));
    }
}
