// src/fetch/providers/weather.rs
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::capability::Credential;
use crate::config::FetchParams;
use crate::error::FetchError;
use crate::fetch::types::{Category, SourceRecord, WeatherRecord};
use crate::fetch::{get_json, SourceFetcher};

/// Open-Meteo current conditions. Free, no key.
pub struct OpenMeteo {
    client: reqwest::Client,
    endpoint: String,
    city: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    current: OmCurrent,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    weather_code: u16,
}

impl OpenMeteo {
    pub fn new(client: reqwest::Client, endpoint: String, params: &FetchParams) -> Self {
        Self {
            client,
            endpoint,
            city: params.city.clone(),
            latitude: params.latitude,
            longitude: params.longitude,
        }
    }

    fn parse(&self, resp: OmResponse) -> Result<SourceRecord, FetchError> {
        let temperature = finite(resp.current.temperature_2m)?;
        let condition = wmo_condition(resp.current.weather_code).ok_or_else(|| {
            FetchError::malformed(format!("unknown weather code {}", resp.current.weather_code))
        })?;
        Ok(SourceRecord::Weather(WeatherRecord {
            temperature,
            condition: condition.to_string(),
            location: self.city.clone(),
        }))
    }
}

#[async_trait]
impl SourceFetcher for OpenMeteo {
    fn category(&self) -> Category {
        Category::Weather
    }

    fn name(&self) -> &'static str {
        "open-meteo"
    }

    async fn fetch(&self, timeout: Duration) -> Result<SourceRecord, FetchError> {
        let req = self.client.get(&self.endpoint).query(&[
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("current", "temperature_2m,weather_code".to_string()),
            ("temperature_unit", "fahrenheit".to_string()),
        ]);
        let resp: OmResponse = get_json(req, timeout).await?;
        self.parse(resp)
    }
}

/// OpenWeatherMap current weather. Needs `appid`.
pub struct OpenWeather {
    client: reqwest::Client,
    endpoint: String,
    key: Credential,
    city: String,
}

#[derive(Debug, Deserialize)]
struct OwResponse {
    name: Option<String>,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

impl OpenWeather {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        key: Credential,
        params: &FetchParams,
    ) -> Self {
        Self {
            client,
            endpoint,
            key,
            city: params.city.clone(),
        }
    }

    fn parse(&self, resp: OwResponse) -> Result<SourceRecord, FetchError> {
        let temperature = finite(resp.main.temp)?;
        let description = resp
            .weather
            .first()
            .map(|w| w.description.trim())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| FetchError::malformed("no weather description"))?;
        let location = resp
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.city.clone());
        Ok(SourceRecord::Weather(WeatherRecord {
            temperature,
            condition: title_case(description),
            location,
        }))
    }
}

#[async_trait]
impl SourceFetcher for OpenWeather {
    fn category(&self) -> Category {
        Category::Weather
    }

    fn name(&self) -> &'static str {
        "openweather"
    }

    async fn fetch(&self, timeout: Duration) -> Result<SourceRecord, FetchError> {
        let req = self.client.get(&self.endpoint).query(&[
            ("q", self.city.as_str()),
            ("appid", self.key.expose()),
            ("units", "imperial"),
        ]);
        let resp: OwResponse = get_json(req, timeout).await?;
        self.parse(resp)
    }
}

fn finite(v: f64) -> Result<f64, FetchError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(FetchError::malformed("non-finite temperature"))
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut cs = w.chars();
            match cs.next() {
                Some(first) => first.to_uppercase().chain(cs.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// WMO weather interpretation codes as used by Open-Meteo.
fn wmo_condition(code: u16) -> Option<&'static str> {
    Some(match code {
        0 => "Clear",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing Drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing Rain",
        71 | 73 | 75 => "Snow",
        77 => "Snow Grains",
        80..=82 => "Rain Showers",
        85 | 86 => "Snow Showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm With Hail",
        _ => return None,
    })
}
