//! Carbon intensity API integration

use crate::carbon_aware::types::{CarbonIntensityData, CarbonProvider};
use crate::error::{Error, Result};
use chrono::Utc;
use reqwest::blocking::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Intensity returned by the mock provider for every region
pub const MOCK_INTENSITY: f64 = 350.0;

/// Default timeout for provider requests
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of current grid carbon intensity
pub trait CarbonIntensityProvider: Send + Sync {
    /// Current carbon intensity for a region in gCO2/kWh
    fn get_intensity(&self, region: &str) -> Result<f64>;
}

impl<P: CarbonIntensityProvider + ?Sized> CarbonIntensityProvider for Box<P> {
    fn get_intensity(&self, region: &str) -> Result<f64> {
        (**self).get_intensity(region)
    }
}

/// Carbon intensity API client
#[derive(Clone)]
pub struct CarbonIntensityAPI {
    client: Client,
    provider: CarbonProvider,
}

impl CarbonIntensityAPI {
    /// Create new carbon intensity API client
    pub fn new(provider: CarbonProvider) -> Result<Self> {
        Self::with_timeout(provider, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(provider: CarbonProvider, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, provider })
    }

    pub fn provider(&self) -> &CarbonProvider {
        &self.provider
    }

    /// Fetch the current reading for a specific region
    pub fn fetch_region(&self, region: &str) -> Result<CarbonIntensityData> {
        match &self.provider {
            CarbonProvider::ElectricityMap { url, token } => {
                self.fetch_electricitymap_data(url, token, region)
            }
            CarbonProvider::Custom { url, auth_header } => {
                self.fetch_custom_data(url, auth_header, region)
            }
            CarbonProvider::Mock => Ok(self.fetch_mock_data(region)),
        }
    }

    /// Fetch data from ElectricityMap API
    fn fetch_electricitymap_data(
        &self,
        base_url: &str,
        token: &str,
        region: &str,
    ) -> Result<CarbonIntensityData> {
        let url = format!(
            "{}/v3/carbon-intensity/latest",
            base_url.trim_end_matches('/')
        );

        let mut request = self.client.get(&url).query(&[("zone", region)]);

        if !token.is_empty() {
            request = request.header("auth-token", token);
        }

        let response = request.send()?;

        if !response.status().is_success() {
            return Err(Error::NetworkError(format!(
                "ElectricityMap API error: {}",
                response.status()
            )));
        }

        let json: Value = response.json()?;

        let intensity = json
            .get("carbonIntensity")
            .and_then(|ci| ci.as_f64())
            .ok_or_else(|| Error::ParseError("Missing carbonIntensity field".to_string()))?;

        let timestamp = match json.get("datetime").and_then(|dt| dt.as_str()) {
            Some(datetime) => match chrono::DateTime::parse_from_rfc3339(datetime) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(e) => {
                    warn!("Failed to parse datetime '{}': {}", datetime, e);
                    Utc::now()
                }
            },
            None => Utc::now(),
        };

        let zone = json
            .get("zone")
            .and_then(|z| z.as_str())
            .unwrap_or(region);

        info!(
            "Fetched carbon intensity {} gCO2/kWh for {} from ElectricityMap",
            intensity, zone
        );

        Ok(CarbonIntensityData {
            region: zone.to_string(),
            carbon_intensity: intensity,
            timestamp,
            source: "ElectricityMap".to_string(),
        })
    }

    /// Fetch data from custom API
    fn fetch_custom_data(
        &self,
        url: &str,
        auth_header: &Option<String>,
        region: &str,
    ) -> Result<CarbonIntensityData> {
        let mut request = self.client.get(url);

        if let Some(auth) = auth_header {
            request = request.header("Authorization", auth);
        }

        let response = request.send()?;

        if !response.status().is_success() {
            return Err(Error::NetworkError(format!(
                "Custom API error: {}",
                response.status()
            )));
        }

        let json: Value = response.json()?;

        // Expected format: {"regions": [{"region": "us-east-1", "carbonIntensity": 380, ...}]}
        let regions = json
            .get("regions")
            .and_then(|r| r.as_array())
            .ok_or_else(|| Error::ParseError("Expected a regions array".to_string()))?;

        let data = regions
            .iter()
            .filter_map(parse_custom_region_data)
            .find(|data| data.region == region)
            .ok_or_else(|| Error::RegionNotFound(region.to_string()))?;

        info!(
            "Fetched carbon intensity {} gCO2/kWh for {} from custom API",
            data.carbon_intensity, region
        );

        Ok(data)
    }

    /// Generate mock data for testing
    fn fetch_mock_data(&self, region: &str) -> CarbonIntensityData {
        debug!("Using mock carbon intensity for {}", region);
        CarbonIntensityData {
            region: region.to_string(),
            carbon_intensity: MOCK_INTENSITY,
            timestamp: Utc::now(),
            source: "Mock".to_string(),
        }
    }

    /// Validate API connectivity
    pub fn health_check(&self) -> Result<bool> {
        match &self.provider {
            CarbonProvider::ElectricityMap { url, .. } => {
                let health_url = format!("{}/health", url.trim_end_matches('/'));
                let response = self.client.get(&health_url).send()?;
                Ok(response.status().is_success())
            }
            CarbonProvider::Custom { url, .. } => {
                let response = self.client.get(url).send()?;
                Ok(response.status().is_success())
            }
            CarbonProvider::Mock => Ok(true),
        }
    }
}

impl CarbonIntensityProvider for CarbonIntensityAPI {
    fn get_intensity(&self, region: &str) -> Result<f64> {
        self.fetch_region(region).map(|data| data.carbon_intensity)
    }
}

/// Parse region data from custom API response
fn parse_custom_region_data(item: &Value) -> Option<CarbonIntensityData> {
    let region = item.get("region").and_then(|r| r.as_str())?;
    let intensity = item.get("carbonIntensity").and_then(|ci| ci.as_f64())?;

    let timestamp = item
        .get("timestamp")
        .and_then(|ts| ts.as_str())
        .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Some(CarbonIntensityData {
        region: region.to_string(),
        carbon_intensity: intensity,
        timestamp,
        source: "Custom API".to_string(),
    })
}

/// Provider answering from a fixed table of readings
#[derive(Clone, Debug, Default)]
pub struct StaticIntensityProvider {
    readings: HashMap<String, f64>,
    fallback: Option<f64>,
}

impl StaticIntensityProvider {
    /// Same reading for every region
    pub fn uniform(intensity: f64) -> Self {
        Self {
            readings: HashMap::new(),
            fallback: Some(intensity),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>, intensity: f64) -> Self {
        self.readings.insert(region.into(), intensity);
        self
    }
}

impl CarbonIntensityProvider for StaticIntensityProvider {
    fn get_intensity(&self, region: &str) -> Result<f64> {
        self.readings
            .get(region)
            .copied()
            .or(self.fallback)
            .ok_or_else(|| Error::RegionNotFound(region.to_string()))
    }
}
