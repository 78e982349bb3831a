//! Built-in catalog of simulated grid sites.

use std::time::Duration;

/// Site used when the configured name is not in the catalog.
pub const DEFAULT_SITE: &str = "auckland-penrose";

/// Static description of a simulated substation or power station.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteProfile {
    /// Lookup name, e.g. "auckland-penrose"
    pub name: &'static str,
    /// Identifier stamped on messages, e.g. "AKL_PENROSE"
    pub site_id: &'static str,
    pub display_name: &'static str,
    pub lat: f64,
    pub lon: f64,
    /// Customers whose ICCP associations terminate at this site
    pub customers: &'static [&'static str],
    /// Mean seconds between messages
    pub message_frequency_secs: f64,
}

impl SiteProfile {
    /// Region code derived from the site id prefix ("AKL_PENROSE" -> "AKL").
    pub fn region(&self) -> &'static str {
        self.site_id.split('_').next().unwrap_or(self.site_id)
    }

    /// Default inter-message interval for this site.
    pub fn message_interval(&self) -> Duration {
        Duration::from_secs_f64(self.message_frequency_secs)
    }

    /// ICCP association name for a customer at this site.
    pub fn association(&self, customer: &str) -> String {
        format!("{}-{customer}-01", self.site_id)
    }

    /// Look up a site by name.
    pub fn find(name: &str) -> Option<&'static SiteProfile> {
        SITES.iter().find(|site| site.name == name)
    }

    /// Look up a site by name, falling back to [`DEFAULT_SITE`].
    pub fn resolve(name: &str) -> &'static SiteProfile {
        match Self::find(name) {
            Some(site) => site,
            None => {
                tracing::warn!(
                    requested = name,
                    fallback = DEFAULT_SITE,
                    "Unknown site, using default"
                );
                &SITES[0]
            }
        }
    }
}

pub static SITES: [SiteProfile; 5] = [
    SiteProfile {
        name: "auckland-penrose",
        site_id: "AKL_PENROSE",
        display_name: "Auckland Penrose 330kV",
        lat: -36.8485,
        lon: 174.7633,
        customers: &["CONTACT_ENERGY", "MERCURY_ENERGY", "GENESIS_ENERGY"],
        message_frequency_secs: 1.5,
    },
    SiteProfile {
        name: "wellington-central",
        site_id: "WLG_CENTRAL",
        display_name: "Wellington Central 220kV",
        lat: -41.2865,
        lon: 174.7762,
        customers: &["MERCURY_ENERGY", "GENESIS_ENERGY"],
        message_frequency_secs: 2.0,
    },
    SiteProfile {
        name: "christchurch-addington",
        site_id: "CHC_ADDINGTON",
        display_name: "Christchurch Addington 66kV",
        lat: -43.5321,
        lon: 172.6362,
        customers: &["MERIDIAN_ENERGY", "CONTACT_ENERGY"],
        message_frequency_secs: 1.8,
    },
    SiteProfile {
        name: "huntly-power",
        site_id: "HUNTLY_POWER",
        display_name: "Huntly Power Station",
        lat: -37.5483,
        lon: 175.0681,
        customers: &["GENESIS_ENERGY"],
        message_frequency_secs: 0.8,
    },
    SiteProfile {
        name: "manapouri-power",
        site_id: "MANAPOURI_POWER",
        display_name: "Manapouri Power Station",
        lat: -45.5361,
        lon: 167.1761,
        customers: &["MERIDIAN_ENERGY"],
        message_frequency_secs: 1.0,
    },
];
