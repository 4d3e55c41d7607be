//! Ad request URL generation
//!
//! Builds the ad server request URL from explicitly supplied device
//! signals:
//!
//! ```text
//! http://<host>/m/ad?v=6&id=<unit>&nv=<version>&udid=..&q=..&ll=..&lla=..
//!     &z=..&o=..&sc_a=..&mr=1&mcc=..&mnc=..&iso=..&cn=..&ct=..&av=..
//! ```
//!
//! Empty values are left out.

mod network;

use mraid_platform::DeviceOrientation;
use thiserror::Error;
use tracing::trace;
use url::Url;

pub use network::{ConnectivityType, NetworkType, PhoneType, Telephony};

/// Path of the ad handler on the ad server
pub const AD_HANDLER: &str = "/m/ad";
/// Request API version
pub const API_VERSION: &str = "6";
/// Version reported as `nv`
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors building an ad request URL
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdUrlError {
    #[error("Invalid ad server host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },
}

pub type Result<T> = std::result::Result<T, AdUrlError>;

/// Device location
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters
    pub accuracy: f32,
}

/// Everything the generator reads from the device
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceSignals {
    pub udid: Option<String>,
    /// Additional keyword from an integration, appended to the publisher's
    pub extra_keyword: Option<String>,
    /// `+hhmm` offset; the local offset when absent
    pub timezone: Option<String>,
    pub orientation: DeviceOrientation,
    pub density: f32,
    pub mraid_supported: bool,
    pub telephony: Telephony,
    pub connectivity: Option<ConnectivityType>,
    /// Whether the app may read the network state
    pub network_state_permission: bool,
    pub app_version: Option<String>,
}

impl Default for DeviceSignals {
    fn default() -> Self {
        Self {
            udid: None,
            extra_keyword: None,
            timezone: None,
            orientation: DeviceOrientation::Undefined,
            density: 1.0,
            mraid_supported: true,
            telephony: Telephony::default(),
            connectivity: None,
            network_state_permission: false,
            app_version: None,
        }
    }
}

/// Orientation code sent as `o`
pub fn orientation_code(orientation: DeviceOrientation) -> &'static str {
    match orientation {
        DeviceOrientation::Portrait => "p",
        DeviceOrientation::Landscape => "l",
        DeviceOrientation::Square => "s",
        DeviceOrientation::Undefined => "u",
    }
}

/// Local UTC offset formatted as `+hhmm`
pub fn local_timezone_offset() -> String {
    chrono::Local::now().format("%z").to_string()
}

/// Join publisher keywords with an extra keyword
pub fn add_keyword(keywords: Option<&str>, addition: Option<&str>) -> Option<String> {
    let keywords = keywords.filter(|k| !k.is_empty());
    let addition = addition.filter(|a| !a.is_empty());
    match (keywords, addition) {
        (Some(keywords), Some(addition)) => Some(format!("{keywords},{addition}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

/// Ad request URL builder
#[derive(Clone, Debug, Default)]
pub struct AdUrlGenerator {
    ad_unit_id: Option<String>,
    keywords: Option<String>,
    location: Option<Location>,
}

impl AdUrlGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ad unit id
    pub fn with_ad_unit_id(mut self, ad_unit_id: impl Into<String>) -> Self {
        self.ad_unit_id = Some(ad_unit_id.into());
        self
    }

    /// Set the publisher keywords
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Set the device location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Build the request URL for `host`
    pub fn generate_url(&self, host: &str, signals: &DeviceSignals) -> Result<Url> {
        let mut url = Url::parse(&format!("http://{host}{AD_HANDLER}")).map_err(|err| {
            AdUrlError::InvalidHost {
                host: host.to_string(),
                reason: err.to_string(),
            }
        })?;

        let timezone = signals
            .timezone
            .clone()
            .unwrap_or_else(local_timezone_offset);
        let keywords = add_keyword(self.keywords.as_deref(), signals.extra_keyword.as_deref());
        let (latlon, accuracy) = match self.location {
            Some(location) => (
                Some(format!("{},{}", location.latitude, location.longitude)),
                Some((location.accuracy as i64).to_string()),
            ),
            None => (None, None),
        };
        let (mcc, mnc) = signals.telephony.mcc_mnc();
        let network = NetworkType::from_connectivity(
            signals.connectivity,
            signals.network_state_permission,
        );

        let params: [(&str, Option<String>); 17] = [
            ("v", Some(API_VERSION.to_string())),
            ("id", self.ad_unit_id.clone()),
            ("nv", Some(SDK_VERSION.to_string())),
            ("udid", signals.udid.clone()),
            ("q", keywords),
            ("ll", latlon),
            ("lla", accuracy),
            ("z", Some(timezone)),
            ("o", Some(orientation_code(signals.orientation).to_string())),
            ("sc_a", Some(format!("{:?}", signals.density))),
            ("mr", signals.mraid_supported.then(|| "1".to_string())),
            ("mcc", Some(mcc)),
            ("mnc", Some(mnc)),
            ("iso", signals.telephony.network_country_iso.clone()),
            ("cn", signals.telephony.network_operator_name.clone()),
            ("ct", Some(network.code().to_string())),
            ("av", signals.app_version.clone()),
        ];

        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                if let Some(value) = value.filter(|value| !value.is_empty()) {
                    query.append_pair(key, &value);
                }
            }
        }

        trace!(%url, "Generated ad request URL");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn signals() -> DeviceSignals {
        DeviceSignals {
            udid: Some("sha:abc123".into()),
            timezone: Some("-0800".into()),
            orientation: DeviceOrientation::Portrait,
            density: 2.0,
            telephony: Telephony {
                network_operator: Some("310260".into()),
                network_country_iso: Some("us".into()),
                network_operator_name: Some("T-Mobile".into()),
                ..Default::default()
            },
            connectivity: Some(ConnectivityType::Wifi),
            network_state_permission: true,
            app_version: Some("2.1".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_url() {
        let url = AdUrlGenerator::new()
            .with_ad_unit_id("agltb3B1Yi1pbmNyDAsSBFNpdGUY")
            .with_keywords("sports")
            .with_location(Location {
                latitude: 37.5,
                longitude: -122.25,
                accuracy: 12.7,
            })
            .generate_url("ads.mopub.com", &DeviceSignals {
                extra_keyword: Some("m_age:30".into()),
                ..signals()
            })
            .unwrap();

        assert_eq!(url.host_str(), Some("ads.mopub.com"));
        assert_eq!(url.path(), "/m/ad");
        let expected: Vec<(String, String)> = [
            ("v", "6"),
            ("id", "agltb3B1Yi1pbmNyDAsSBFNpdGUY"),
            ("nv", SDK_VERSION),
            ("udid", "sha:abc123"),
            ("q", "sports,m_age:30"),
            ("ll", "37.5,-122.25"),
            ("lla", "12"),
            ("z", "-0800"),
            ("o", "p"),
            ("sc_a", "2.0"),
            ("mr", "1"),
            ("mcc", "310"),
            ("mnc", "260"),
            ("iso", "us"),
            ("cn", "T-Mobile"),
            ("ct", "2"),
            ("av", "2.1"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(query(&url), expected);
    }

    #[test]
    fn test_empty_values_are_omitted() {
        let url = AdUrlGenerator::new()
            .generate_url(
                "ads.mopub.com",
                &DeviceSignals {
                    timezone: Some("+0000".into()),
                    mraid_supported: false,
                    ..Default::default()
                },
            )
            .unwrap();

        let keys: Vec<String> = query(&url).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["v", "nv", "z", "o", "sc_a", "ct"]);
        assert!(url.as_str().contains("ct=0"));
        assert!(url.as_str().contains("o=u"));
    }

    #[test]
    fn test_add_keyword() {
        assert_eq!(add_keyword(Some("a"), Some("b")).as_deref(), Some("a,b"));
        assert_eq!(add_keyword(Some(""), Some("b")).as_deref(), Some("b"));
        assert_eq!(add_keyword(Some("a"), None).as_deref(), Some("a"));
        assert_eq!(add_keyword(None, Some("")), None);
    }

    #[test]
    fn test_local_timezone_format() {
        let offset = local_timezone_offset();
        assert_eq!(offset.len(), 5);
        assert!(offset.starts_with('+') || offset.starts_with('-'));
    }

    #[test]
    fn test_invalid_host() {
        assert!(matches!(
            AdUrlGenerator::new().generate_url("bad host", &DeviceSignals::default()),
            Err(AdUrlError::InvalidHost { .. })
        ));
    }
}
