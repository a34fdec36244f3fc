use crate::core::error::ProviderError;
use crate::core::rate::{OrderTaxParams, RateBreakdown, TaxRateProvider};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

pub const DEFAULT_BASE_URL: &str = "https://api.taxjar.com/v2";

pub struct TaxJarProvider {
    base_url: Url,
    api_token: String,
    client: Client,
}

impl TaxJarProvider {
    pub fn new(base_url: &str, api_token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("taxrate/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid TaxJar base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("Invalid TaxJar base URL: {base_url}");
        }

        Ok(Self {
            base_url,
            api_token: api_token.to_string(),
            client,
        })
    }

    /// Base URL extended by `segments`, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Transport(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ProviderError> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        debug!(%status, "Received TaxJar response");

        if !status.is_success() {
            let body: ErrorResponse = serde_json::from_str(&text).unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                error: body
                    .error
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("Error").to_string()),
                detail: body.detail.unwrap_or(text),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            error!(error = ?e, response = %text, "Failed to parse TaxJar response");
            ProviderError::Decode(e.to_string())
        })
    }
}

/// Rejects anything that cannot be a tax rate fraction.
fn check_rate(field: &str, rate: Decimal) -> Result<Decimal, ProviderError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        error!(field, %rate, "TaxJar returned a rate outside 0..=1");
        return Err(ProviderError::Decode(format!(
            "{field} {rate} is not a rate between 0 and 1"
        )));
    }
    Ok(rate)
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    from_country: &'a str,
    from_zip: &'a str,
    from_state: &'a str,
    to_country: &'a str,
    to_zip: &'a str,
    to_state: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    shipping: Decimal,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    tax: OrderTax,
}

#[derive(Debug, Deserialize)]
struct OrderTax {
    #[serde(default)]
    rate: Decimal,
}

#[derive(Debug, Deserialize)]
struct LocationResponse {
    rate: LocationRate,
}

/// Raw `/rates` payload. Only international locations carry `name`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocationRate {
    zip: Option<String>,
    country: Option<String>,
    name: Option<String>,
    state: Option<String>,
    county: Option<String>,
    city: Option<String>,
    country_rate: Option<Decimal>,
    state_rate: Option<Decimal>,
    county_rate: Option<Decimal>,
    city_rate: Option<Decimal>,
    combined_district_rate: Option<Decimal>,
    combined_rate: Option<Decimal>,
    standard_rate: Option<Decimal>,
    reduced_rate: Option<Decimal>,
    super_reduced_rate: Option<Decimal>,
    parking_rate: Option<Decimal>,
}

impl LocationRate {
    fn check_rates(&self) -> Result<(), ProviderError> {
        let rates = [
            ("country_rate", self.country_rate),
            ("state_rate", self.state_rate),
            ("county_rate", self.county_rate),
            ("city_rate", self.city_rate),
            ("combined_district_rate", self.combined_district_rate),
            ("combined_rate", self.combined_rate),
            ("standard_rate", self.standard_rate),
            ("reduced_rate", self.reduced_rate),
            ("super_reduced_rate", self.super_reduced_rate),
            ("parking_rate", self.parking_rate),
        ];
        for (field, rate) in rates {
            if let Some(rate) = rate {
                check_rate(field, rate)?;
            }
        }
        Ok(())
    }
}

impl From<LocationRate> for RateBreakdown {
    fn from(rate: LocationRate) -> Self {
        match rate.name {
            Some(name) => RateBreakdown::International {
                country: rate.country.unwrap_or_default(),
                name,
                standard_rate: rate.standard_rate.unwrap_or_default(),
                reduced_rate: rate.reduced_rate.unwrap_or_default(),
                super_reduced_rate: rate.super_reduced_rate.unwrap_or_default(),
                parking_rate: rate.parking_rate.unwrap_or_default(),
            },
            None => RateBreakdown::UsCanada {
                zip: rate.zip.unwrap_or_default(),
                country: rate.country.unwrap_or_default(),
                country_rate: rate.country_rate.unwrap_or_default(),
                state: rate.state.unwrap_or_default(),
                state_rate: rate.state_rate.unwrap_or_default(),
                county: rate.county.unwrap_or_default(),
                county_rate: rate.county_rate.unwrap_or_default(),
                city: rate.city.unwrap_or_default(),
                city_rate: rate.city_rate.unwrap_or_default(),
                combined_district_rate: rate.combined_district_rate.unwrap_or_default(),
                combined_rate: rate.combined_rate.unwrap_or_default(),
            },
        }
    }
}

#[async_trait]
impl TaxRateProvider for TaxJarProvider {
    #[instrument(name = "TaxJarOrderRate", skip(self, params), fields(to_zip = %params.to_zip))]
    async fn rate_for_order(&self, params: &OrderTaxParams) -> Result<Decimal, ProviderError> {
        let url = self.endpoint(&["taxes"])?;
        debug!("Requesting order tax from {}", url);

        let body = OrderRequest {
            from_country: &params.from_country,
            from_zip: &params.from_zip,
            from_state: &params.from_state,
            to_country: &params.to_country,
            to_zip: &params.to_zip,
            to_state: &params.to_state,
            amount: params.amount,
            shipping: params.shipping,
        };

        let response: OrderResponse = self.send(self.client.post(url).json(&body)).await?;
        check_rate("rate", response.tax.rate)
    }

    #[instrument(name = "TaxJarLocationRate", skip(self))]
    async fn rate_for_location(
        &self,
        zip: &str,
        city: &str,
        country: &str,
    ) -> Result<RateBreakdown, ProviderError> {
        let mut url = self.endpoint(&["rates", zip])?;
        url.query_pairs_mut()
            .append_pair("city", city)
            .append_pair("country", country);
        debug!("Requesting location rate from {}", url);

        let response: LocationResponse = self.send(self.client.get(url)).await?;
        response.rate.check_rates()?;
        Ok(response.rate.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "test-token";

    const NEW_YORK_JSON: &str = r#"{
        "rate": {
            "zip": "10001",
            "country": "US",
            "country_rate": "0.0",
            "state": "NY",
            "state_rate": "0.04",
            "county": "NEW YORK",
            "county_rate": "0.0",
            "city": "NEW YORK",
            "city_rate": "0.045",
            "combined_district_rate": "0.00375",
            "combined_rate": "0.08875",
            "freight_taxable": true
        }
    }"#;

    const FRANCE_JSON: &str = r#"{
        "rate": {
            "country": "FR",
            "name": "France",
            "standard_rate": "0.2",
            "reduced_rate": "0.1",
            "super_reduced_rate": "0.021",
            "parking_rate": "0.0",
            "distance_sale_threshold": "100000.0",
            "freight_taxable": true
        }
    }"#;

    fn provider(server: &MockServer) -> TaxJarProvider {
        TaxJarProvider::new(&server.uri(), TOKEN, Duration::from_secs(5)).unwrap()
    }

    fn order_params() -> OrderTaxParams {
        OrderTaxParams {
            from_country: "US".to_string(),
            from_zip: "90002".to_string(),
            from_state: "CA".to_string(),
            to_country: "US".to_string(),
            to_zip: "10001".to_string(),
            to_state: "NY".to_string(),
            amount: dec!(100.00),
            shipping: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn test_us_location_rate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates/10001"))
            .and(query_param("city", "New York"))
            .and(query_param("country", "US"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(NEW_YORK_JSON))
            .expect(1)
            .mount(&server)
            .await;

        let breakdown = provider(&server)
            .rate_for_location("10001", "New York", "US")
            .await
            .unwrap();

        match breakdown {
            RateBreakdown::UsCanada {
                state,
                combined_rate,
                city_rate,
                ..
            } => {
                assert_eq!(state, "NY");
                assert_eq!(combined_rate, dec!(0.08875));
                assert_eq!(city_rate, dec!(0.045));
            }
            other => panic!("Expected a US breakdown, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_international_location_rate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates/75002"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FRANCE_JSON))
            .mount(&server)
            .await;

        let breakdown = provider(&server)
            .rate_for_location("75002", "Paris", "FR")
            .await
            .unwrap();

        assert_eq!(
            breakdown,
            RateBreakdown::International {
                country: "FR".to_string(),
                name: "France".to_string(),
                standard_rate: dec!(0.2),
                reduced_rate: dec!(0.1),
                super_reduced_rate: dec!(0.021),
                parking_rate: dec!(0),
            }
        );
    }

    #[tokio::test]
    async fn test_order_rate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/taxes"))
            .and(body_json(serde_json::json!({
                "from_country": "US",
                "from_zip": "90002",
                "from_state": "CA",
                "to_country": "US",
                "to_zip": "10001",
                "to_state": "NY",
                "amount": 100.0,
                "shipping": 0.0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"tax": {"order_total_amount": 100.0, "amount_to_collect": 8.88, "rate": 0.08875}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let rate = provider(&server)
            .rate_for_order(&order_params())
            .await
            .unwrap();

        assert_eq!(rate, dec!(0.08875));
    }

    #[tokio::test]
    async fn test_api_error_is_structured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/taxes"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"error": "Unauthorized", "detail": "Not authorized for route 'POST /v2/taxes'", "status": 401}"#,
            ))
            .mount(&server)
            .await;

        let err = provider(&server)
            .rate_for_order(&order_params())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProviderError::Api {
                status: 401,
                error: "Unauthorized".to_string(),
                detail: "Not authorized for route 'POST /v2/taxes'".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_unstructured_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates/10001"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .rate_for_location("10001", "", "US")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "503 Service Unavailable: upstream unavailable"
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates/10001"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .rate_for_location("10001", "New York", "US")
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn test_zip_is_encoded_as_single_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(
                r#"{"error": "Not Found", "detail": "Resource can not be found", "status": 404}"#,
            ))
            .mount(&server)
            .await;
        let provider = provider(&server);

        for zip in ["../taxes", "10001/extra", "10001#frag", "10001?x=1"] {
            let err = provider
                .rate_for_location(zip, "New York", "US")
                .await
                .unwrap_err();
            assert!(matches!(err, ProviderError::Api { status: 404, .. }));
        }

        let requests = server.received_requests().await.unwrap();
        let paths: Vec<_> = requests
            .iter()
            .map(|r| (r.url.path().to_string(), r.url.query().map(str::to_string)))
            .collect();
        let query = Some("city=New+York&country=US".to_string());
        assert_eq!(
            paths,
            vec![
                ("/rates/..%2Ftaxes".to_string(), query.clone()),
                ("/rates/10001%2Fextra".to_string(), query.clone()),
                ("/rates/10001%23frag".to_string(), query.clone()),
                ("/rates/10001%3Fx=1".to_string(), query),
            ]
        );
    }

    #[tokio::test]
    async fn test_base_url_path_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/rates/10001"))
            .respond_with(ResponseTemplate::new(200).set_body_string(NEW_YORK_JSON))
            .expect(1)
            .mount(&server)
            .await;

        let provider = TaxJarProvider::new(
            &format!("{}/v2/", server.uri()),
            TOKEN,
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(provider.rate_for_location("10001", "", "US").await.is_ok());
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(TaxJarProvider::new("not a url", TOKEN, Duration::from_secs(5)).is_err());
        assert!(TaxJarProvider::new("mailto:ops@example.com", TOKEN, Duration::from_secs(5)).is_err());
    }

    #[tokio::test]
    async fn test_order_rate_outside_fraction_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/taxes"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"tax": {"rate": 79228162514264337593543950335}}"#,
            ))
            .mount(&server)
            .await;

        let err = provider(&server)
            .rate_for_order(&order_params())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn test_negative_location_rate_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates/10001"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"rate": {"zip": "10001", "country": "US", "combined_rate": "-0.5"}}"#,
            ))
            .mount(&server)
            .await;

        let err = provider(&server)
            .rate_for_location("10001", "New York", "US")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProviderError::Decode("combined_rate -0.5 is not a rate between 0 and 1".to_string())
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let provider =
            TaxJarProvider::new("http://127.0.0.1:1", TOKEN, Duration::from_millis(500)).unwrap();

        let err = provider
            .rate_for_location("10001", "New York", "US")
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
