//! Response transformer: raw geolocation JSON into a categorized report
//!
//! The transformation is a pure function of the raw response. Every field of
//! every category is always present in the output; missing optional fields
//! become the [`SENTINEL`] value, so categorization never fails once the
//! required `ip_address` key is present.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder substituted for any missing optional field
pub const SENTINEL: &str = "N/A";

// =============================================================================
// Types
// =============================================================================

/// IP address and location fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    #[serde(rename = "IP Address")]
    pub ip_address: String,
    #[serde(rename = "IP Version")]
    pub ip_version: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Country Code")]
    pub country_code: String,
    #[serde(rename = "Continent")]
    pub continent: String,
    #[serde(rename = "Postal Code")]
    pub postal_code: String,
    #[serde(rename = "Latitude")]
    pub latitude: String,
    #[serde(rename = "Longitude")]
    pub longitude: String,
}

/// ISP and network fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    #[serde(rename = "ISP")]
    pub isp: String,
    #[serde(rename = "Organization")]
    pub organization: String,
    #[serde(rename = "ASN")]
    pub asn: String,
    #[serde(rename = "ASN Organization")]
    pub asn_organization: String,
    #[serde(rename = "Connection Type")]
    pub connection_type: String,
}

/// Timezone fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimezoneInfo {
    #[serde(rename = "Timezone Name")]
    pub name: String,
    #[serde(rename = "Abbreviation")]
    pub abbreviation: String,
    #[serde(rename = "GMT Offset")]
    pub gmt_offset: String,
    #[serde(rename = "Current Time")]
    pub current_time: String,
    #[serde(rename = "Is DST")]
    pub is_dst: String,
}

/// VPN/proxy/Tor/relay detection flags plus the derived threat label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityInfo {
    #[serde(rename = "Is VPN")]
    pub is_vpn: bool,
    #[serde(rename = "Is Proxy")]
    pub is_proxy: bool,
    #[serde(rename = "Is Tor")]
    pub is_tor: bool,
    #[serde(rename = "Is Relay")]
    pub is_relay: bool,
    #[serde(rename = "Threat Level")]
    pub threat_level: String,
}

/// Local currency fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    #[serde(rename = "Currency Name")]
    pub currency_name: String,
    #[serde(rename = "Currency Code")]
    pub currency_code: String,
    #[serde(rename = "Currency Symbol")]
    pub currency_symbol: String,
}

/// Country flag fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagInfo {
    #[serde(rename = "Flag Emoji")]
    pub emoji: String,
    #[serde(rename = "Flag Unicode")]
    pub unicode: String,
    #[serde(rename = "Flag PNG")]
    pub png: String,
    #[serde(rename = "Flag SVG")]
    pub svg: String,
}

/// Fully categorized IP information: six fixed categories, always populated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpReport {
    pub basic: BasicInfo,
    pub connection: ConnectionInfo,
    pub timezone: TimezoneInfo,
    pub security: SecurityInfo,
    pub currency: CurrencyInfo,
    pub flag: FlagInfo,
}

// =============================================================================
// Validation & categorization
// =============================================================================

/// True iff `raw` is a non-empty JSON object containing an `ip_address` key
pub fn validate(raw: &Value) -> bool {
    raw.as_object()
        .map(|obj| obj.contains_key("ip_address"))
        .unwrap_or(false)
}

/// Transform a raw response into a categorized report
///
/// Returns `None` when [`validate`] fails; otherwise every category is fully
/// populated, with [`SENTINEL`] standing in for absent fields.
pub fn categorize(raw: &Value) -> Option<IpReport> {
    if !validate(raw) {
        return None;
    }

    Some(IpReport {
        basic: basic_info(raw),
        connection: connection_info(raw),
        timezone: timezone_info(raw),
        security: security_info(raw),
        currency: currency_info(raw),
        flag: flag_info(raw),
    })
}

fn basic_info(raw: &Value) -> BasicInfo {
    let ip_address = field(raw, "ip_address");
    let ip_version = ip_version(raw.get("ip_address").and_then(Value::as_str).unwrap_or(""));
    BasicInfo {
        ip_address,
        ip_version: ip_version.to_string(),
        city: field(raw, "city"),
        region: field(raw, "region"),
        country: field(raw, "country"),
        country_code: field(raw, "country_code"),
        continent: field(raw, "continent"),
        postal_code: field(raw, "postal_code"),
        latitude: field(raw, "latitude"),
        longitude: field(raw, "longitude"),
    }
}

fn connection_info(raw: &Value) -> ConnectionInfo {
    let group = group(raw, "connection");
    ConnectionInfo {
        isp: field(group, "isp_name"),
        organization: field(group, "organization_name"),
        asn: field(group, "autonomous_system_number"),
        asn_organization: field(group, "autonomous_system_organization"),
        connection_type: field(group, "connection_type"),
    }
}

fn timezone_info(raw: &Value) -> TimezoneInfo {
    let group = group(raw, "timezone");
    TimezoneInfo {
        name: field(group, "name"),
        abbreviation: field(group, "abbreviation"),
        gmt_offset: field(group, "gmt_offset"),
        current_time: field(group, "current_time"),
        is_dst: field(group, "is_dst"),
    }
}

fn security_info(raw: &Value) -> SecurityInfo {
    let group = group(raw, "security");
    SecurityInfo {
        is_vpn: flag_set(group, "is_vpn"),
        is_proxy: flag_set(group, "is_proxy"),
        is_tor: flag_set(group, "is_tor"),
        is_relay: flag_set(group, "is_relay"),
        threat_level: threat_level(group),
    }
}

fn currency_info(raw: &Value) -> CurrencyInfo {
    let group = group(raw, "currency");
    CurrencyInfo {
        currency_name: field(group, "currency_name"),
        currency_code: field(group, "currency_code"),
        currency_symbol: field(group, "currency_symbol"),
    }
}

fn flag_info(raw: &Value) -> FlagInfo {
    let group = group(raw, "flag");
    FlagInfo {
        emoji: field(group, "emoji"),
        unicode: field(group, "unicode"),
        png: field(group, "png"),
        svg: field(group, "svg"),
    }
}

// =============================================================================
// Derived values
// =============================================================================

/// Classify an address string by syntax alone
///
/// A colon means IPv6, a period means IPv4, anything else is unknown. This is
/// deliberately not RFC-conformant validation; malformed input yields
/// "Unknown" rather than an error.
pub fn ip_version(address: &str) -> &'static str {
    if address.contains(':') {
        "IPv6"
    } else if address.contains('.') {
        "IPv4"
    } else {
        "Unknown"
    }
}

/// Names of the four detection flags, in the fixed order they are reported
const THREAT_FLAGS: [(&str, &str); 4] = [
    ("is_vpn", "VPN"),
    ("is_proxy", "Proxy"),
    ("is_tor", "Tor"),
    ("is_relay", "Relay"),
];

/// Aggregate the four detection flags into a threat label
///
/// Zero flags set is "Clean", one is "Low", two or more is "Medium". There is
/// no higher tier regardless of how many flags are set.
pub fn threat_level(security: &Value) -> String {
    let detected: Vec<&str> = THREAT_FLAGS
        .iter()
        .filter(|(key, _)| flag_set(security, key))
        .map(|(_, name)| *name)
        .collect();

    match detected.as_slice() {
        [] => "Clean".to_string(),
        [single] => format!("Low ({} detected)", single),
        multiple => format!("Medium (Multiple: {})", multiple.join(", ")),
    }
}

// =============================================================================
// Field access helpers
// =============================================================================

/// Look up an optional nested group, defaulting to null when absent
fn group<'a>(raw: &'a Value, key: &str) -> &'a Value {
    raw.get(key).unwrap_or(&Value::Null)
}

/// Read a field as a display string, substituting the sentinel when absent
fn field(obj: &Value, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => SENTINEL.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Read a detection flag, treating non-boolean values by JSON truthiness
fn flag_set(obj: &Value, key: &str) -> bool {
    match obj.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Null) | None => false,
    }
}

// =============================================================================
// Rendering views
// =============================================================================

impl IpReport {
    /// Ordered (category, field, value) view used by text and table rendering
    pub fn sections(&self) -> Vec<(&'static str, Vec<(&'static str, String)>)> {
        vec![
            (
                "BASIC",
                vec![
                    ("IP Address", self.basic.ip_address.clone()),
                    ("IP Version", self.basic.ip_version.clone()),
                    ("City", self.basic.city.clone()),
                    ("Region", self.basic.region.clone()),
                    ("Country", self.basic.country.clone()),
                    ("Country Code", self.basic.country_code.clone()),
                    ("Continent", self.basic.continent.clone()),
                    ("Postal Code", self.basic.postal_code.clone()),
                    ("Latitude", self.basic.latitude.clone()),
                    ("Longitude", self.basic.longitude.clone()),
                ],
            ),
            (
                "CONNECTION",
                vec![
                    ("ISP", self.connection.isp.clone()),
                    ("Organization", self.connection.organization.clone()),
                    ("ASN", self.connection.asn.clone()),
                    ("ASN Organization", self.connection.asn_organization.clone()),
                    ("Connection Type", self.connection.connection_type.clone()),
                ],
            ),
            (
                "TIMEZONE",
                vec![
                    ("Timezone Name", self.timezone.name.clone()),
                    ("Abbreviation", self.timezone.abbreviation.clone()),
                    ("GMT Offset", self.timezone.gmt_offset.clone()),
                    ("Current Time", self.timezone.current_time.clone()),
                    ("Is DST", self.timezone.is_dst.clone()),
                ],
            ),
            (
                "SECURITY",
                vec![
                    ("Is VPN", self.security.is_vpn.to_string()),
                    ("Is Proxy", self.security.is_proxy.to_string()),
                    ("Is Tor", self.security.is_tor.to_string()),
                    ("Is Relay", self.security.is_relay.to_string()),
                    ("Threat Level", self.security.threat_level.clone()),
                ],
            ),
            (
                "CURRENCY",
                vec![
                    ("Currency Name", self.currency.currency_name.clone()),
                    ("Currency Code", self.currency.currency_code.clone()),
                    ("Currency Symbol", self.currency.currency_symbol.clone()),
                ],
            ),
            (
                "FLAG",
                vec![
                    ("Flag Emoji", self.flag.emoji.clone()),
                    ("Flag Unicode", self.flag.unicode.clone()),
                    ("Flag PNG", self.flag.png.clone()),
                    ("Flag SVG", self.flag.svg.clone()),
                ],
            ),
        ]
    }

    /// Render the report as plain text: section headers, dotted field lines,
    /// and a trailing generation timestamp
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&"=".repeat(80));
        out.push_str("\nIP ADDRESS INFORMATION REPORT\n");
        out.push_str(&"=".repeat(80));
        out.push('\n');

        for (category, fields) in self.sections() {
            out.push_str(&format!("\n> {}\n", category));
            out.push_str(&"-".repeat(60));
            out.push('\n');
            for (label, value) in fields {
                out.push_str(&format!("{:.<25} {}\n", label, value));
            }
        }

        out.push('\n');
        out.push_str(&"=".repeat(80));
        out.push_str(&format!(
            "\nReport generated at: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        out
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_response() -> Value {
        json!({
            "ip_address": "8.8.8.8",
            "city": "Mountain View",
            "region": "California",
            "country": "United States",
            "country_code": "US",
            "continent": "North America",
            "postal_code": "94035",
            "latitude": 37.386,
            "longitude": -122.0838,
            "connection": {
                "isp_name": "Google LLC",
                "organization_name": "Google Public DNS",
                "autonomous_system_number": 15169,
                "autonomous_system_organization": "GOOGLE",
                "connection_type": "Corporate"
            },
            "timezone": {
                "name": "America/Los_Angeles",
                "abbreviation": "PST",
                "gmt_offset": -8,
                "current_time": "2025-11-24T10:30:00",
                "is_dst": false
            },
            "security": {
                "is_vpn": false,
                "is_proxy": false,
                "is_tor": false,
                "is_relay": false
            },
            "currency": {
                "currency_name": "US Dollar",
                "currency_code": "USD",
                "currency_symbol": "$"
            }
        })
    }

    #[test]
    fn test_validate() {
        assert!(validate(&sample_response()));
        assert!(validate(&json!({"ip_address": "1.1.1.1"})));
        assert!(!validate(&Value::Null));
        assert!(!validate(&json!({})));
        assert!(!validate(&json!({"city": "Test"})));
        assert!(!validate(&json!("not an object")));
    }

    #[test]
    fn test_categorize_invalid_returns_none() {
        assert!(categorize(&Value::Null).is_none());
        assert!(categorize(&json!({})).is_none());
        assert!(categorize(&json!({"city": "Test"})).is_none());
    }

    #[test]
    fn test_categorize_full_sample() {
        let report = categorize(&sample_response()).unwrap();

        assert_eq!(report.basic.ip_address, "8.8.8.8");
        assert_eq!(report.basic.ip_version, "IPv4");
        assert_eq!(report.basic.city, "Mountain View");
        assert_eq!(report.basic.latitude, "37.386");
        assert_eq!(report.basic.longitude, "-122.0838");

        assert_eq!(report.connection.isp, "Google LLC");
        assert_eq!(report.connection.asn, "15169");
        assert_eq!(report.connection.asn_organization, "GOOGLE");

        assert_eq!(report.timezone.name, "America/Los_Angeles");
        assert_eq!(report.timezone.gmt_offset, "-8");
        assert_eq!(report.timezone.is_dst, "false");

        assert!(!report.security.is_vpn);
        assert_eq!(report.security.threat_level, "Clean");

        assert_eq!(report.currency.currency_code, "USD");

        // flag group absent entirely
        assert_eq!(report.flag.emoji, SENTINEL);
        assert_eq!(report.flag.svg, SENTINEL);
    }

    #[test]
    fn test_categorize_minimal_is_total() {
        // only the required field: everything else must be the sentinel
        let report = categorize(&json!({"ip_address": "1.1.1.1"})).unwrap();

        assert_eq!(report.basic.ip_address, "1.1.1.1");
        assert_eq!(report.basic.ip_version, "IPv4");
        assert_eq!(report.basic.city, SENTINEL);
        assert_eq!(report.basic.region, SENTINEL);
        assert_eq!(report.connection.isp, SENTINEL);
        assert_eq!(report.connection.organization, SENTINEL);
        assert_eq!(report.timezone.name, SENTINEL);
        assert_eq!(report.currency.currency_name, SENTINEL);
        assert_eq!(report.flag.emoji, SENTINEL);

        assert!(!report.security.is_vpn);
        assert!(!report.security.is_proxy);
        assert!(!report.security.is_tor);
        assert!(!report.security.is_relay);
        assert_eq!(report.security.threat_level, "Clean");
    }

    #[test]
    fn test_null_field_becomes_sentinel() {
        let report = categorize(&json!({"ip_address": "1.1.1.1", "city": null})).unwrap();
        assert_eq!(report.basic.city, SENTINEL);
    }

    #[test]
    fn test_ip_version_heuristic() {
        assert_eq!(ip_version("8.8.8.8"), "IPv4");
        assert_eq!(ip_version("192.168.1.1"), "IPv4");
        assert_eq!(ip_version("2001:4860:4860::8888"), "IPv6");
        assert_eq!(ip_version("::1"), "IPv6");
        assert_eq!(ip_version(""), "Unknown");
        assert_eq!(ip_version("notanip"), "Unknown");
    }

    #[test]
    fn test_threat_level_clean() {
        let security = json!({
            "is_vpn": false, "is_proxy": false, "is_tor": false, "is_relay": false
        });
        assert_eq!(threat_level(&security), "Clean");
        assert_eq!(threat_level(&json!({})), "Clean");
        assert_eq!(threat_level(&Value::Null), "Clean");
    }

    #[test]
    fn test_threat_level_single() {
        let security = json!({"is_vpn": true});
        let level = threat_level(&security);
        assert!(level.contains("Low"));
        assert!(level.contains("VPN"));
        assert_eq!(level, "Low (VPN detected)");
    }

    #[test]
    fn test_threat_level_multiple() {
        let security = json!({"is_vpn": true, "is_proxy": true});
        let level = threat_level(&security);
        assert!(level.contains("Medium"));
        assert_eq!(level, "Medium (Multiple: VPN, Proxy)");

        // fixed reporting order regardless of how many flags are set
        let all = json!({
            "is_relay": true, "is_tor": true, "is_proxy": true, "is_vpn": true
        });
        assert_eq!(threat_level(&all), "Medium (Multiple: VPN, Proxy, Tor, Relay)");
    }

    #[test]
    fn test_flag_truthiness_looseness() {
        // non-boolean flags resolve by truthiness rather than erroring
        let security = json!({"is_vpn": 1, "is_proxy": "", "is_tor": "yes", "is_relay": 0});
        let info = security_info(&json!({"ip_address": "x", "security": security}));
        assert!(info.is_vpn);
        assert!(!info.is_proxy);
        assert!(info.is_tor);
        assert!(!info.is_relay);
        assert_eq!(info.threat_level, "Medium (Multiple: VPN, Tor)");
    }

    #[test]
    fn test_serde_labels_round_trip() {
        let report = categorize(&sample_response()).unwrap();
        let value = serde_json::to_value(&report).unwrap();

        // human-readable labels on the wire
        assert_eq!(value["basic"]["IP Address"], "8.8.8.8");
        assert_eq!(value["connection"]["ISP"], "Google LLC");
        assert_eq!(value["security"]["Threat Level"], "Clean");
        assert_eq!(value["security"]["Is VPN"], false);

        // reparsing yields the identical report
        let parsed: IpReport = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_text_rendering() {
        let report = categorize(&sample_response()).unwrap();
        let text = report.to_text();

        assert!(text.contains("IP ADDRESS INFORMATION REPORT"));
        assert!(text.contains("> BASIC"));
        assert!(text.contains("> SECURITY"));
        assert!(text.contains("IP Address"));
        assert!(text.contains("8.8.8.8"));
        assert!(text.contains("Report generated at:"));
        // dotted padding between label and value
        assert!(text.contains("City....................."));
    }
}
