#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Ipscope - an IP address information toolkit
//!
//! Ipscope looks up IP address information (geolocation, ISP, timezone,
//! security flags, currency, country flag) from the Abstract API IP
//! geolocation service, reshapes it into six fixed display categories, and
//! renders it as text, tables, JSON, exported files, or a small REST API.
//! It can be used as both a command-line application and a library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (core) | Client, transformer, export | `ureq`, `serde_json` |
//! | `display` | Table formatting | `tabled` |
//! | `cli` | Full CLI binary with REST server | All above + `clap`, `axum` |
//!
//! # Architecture
//!
//! - **[`config`]**: Configuration management (API key, endpoint, timeouts)
//! - **[`client`]**: Blocking transport adapter for the geolocation endpoint
//! - **[`lens`]**: High-level operations
//!   - `report`: pure response transformer (validate, categorize, derive)
//!   - `lookup`: lookups plus output rendering
//!   - `export`: one-shot JSON/text file export
//! - **[`server`]**: REST API (requires `cli`)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ipscope::{GeoClient, IpscopeConfig, LookupLens};
//!
//! let config = IpscopeConfig::new(&None)?;
//! let lens = LookupLens::new(GeoClient::new(&config));
//!
//! let report = lens.lookup_address("8.8.8.8")?;
//! println!("{} is {}", report.basic.ip_address, report.security.threat_level);
//! ```

pub mod client;
pub mod config;
pub mod lens;

// Server module - requires CLI feature
#[cfg(feature = "cli")]
pub mod server;

// =============================================================================
// Configuration
// =============================================================================

pub use config::IpscopeConfig;

// =============================================================================
// Client
// =============================================================================

pub use client::{GeoClient, LookupError, LookupResult};

// =============================================================================
// Lens
// =============================================================================

pub use lens::export::{save_json, save_text};
pub use lens::lookup::LookupLens;
pub use lens::report::{
    categorize, ip_version, threat_level, validate, BasicInfo, ConnectionInfo, CurrencyInfo,
    FlagInfo, IpReport, SecurityInfo, TimezoneInfo, SENTINEL,
};
pub use lens::utils::OutputFormat;

// =============================================================================
// Server (REST API) - requires "cli" feature
// =============================================================================

#[cfg(feature = "cli")]
pub use server::{create_router, start_server, ServerConfig, ServerState};
