use crate::domain::model::{DecodeResponse, DecodedResult};
use crate::domain::ports::VinDecoder;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://vpic.nhtsa.dot.gov/api/vehicles/DecodeVINValuesBatch/";

/// vPIC batch decode endpoint: form POST of `format=json` and `data=VIN1;VIN2;...`.
pub struct NhtsaClient {
    endpoint: String,
    client: Client,
}

impl NhtsaClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::new(),
        }
    }
}

pub fn parse_response(body: &str) -> Result<Vec<DecodedResult>> {
    let response: DecodeResponse = serde_json::from_str(body)
        .map_err(|e| EtlError::malformed(format!("unexpected JSON shape: {}", e)))?;

    tracing::debug!(
        "Decode response: count={:?}, message={:?}",
        response.count,
        response.message
    );

    Ok(response.results)
}

#[async_trait]
impl VinDecoder for NhtsaClient {
    async fn decode(&self, vins: &[String], timeout: Duration) -> Result<Vec<DecodedResult>> {
        let data = vins.join(";");
        let form = [("format", "json"), ("data", data.as_str())];

        tracing::debug!(
            "POST {} with {} VINs (timeout {:?})",
            self.endpoint,
            vins.len(),
            timeout
        );

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;

        let status = response.status();
        tracing::debug!("Decode service response status: {}", status);
        if !status.is_success() {
            return Err(EtlError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;

        parse_response(&body)
    }
}

fn classify_transport_error(error: reqwest::Error, timeout: Duration) -> EtlError {
    if error.is_timeout() {
        EtlError::NetworkTimeout {
            timeout_ms: timeout.as_millis(),
        }
    } else {
        EtlError::TransportError(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::retry::{BatchOutcome, RetryPolicy, RetryingDecoder};
    use crate::domain::model::{Batch, VinRecord};
    use httpmock::prelude::*;

    fn quick_retries() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(5),
            max_retries: 4,
            timeout_factor: 200,
        }
    }

    fn one_vin_batch() -> Batch {
        Batch {
            index: 0,
            records: vec![VinRecord::new("1N4AZ0CP5DC310000")],
        }
    }

    #[test]
    fn test_parse_response_with_missing_fields() {
        let body = r#"{
            "Count": 2,
            "Message": "Results returned successfully",
            "SearchCriteria": null,
            "Results": [
                {"Make": "NISSAN", "Model": "Leaf", "ModelYear": "2013",
                 "VIN": "1N4AZ0CP5DC310000", "FuelTypePrimary": "Electric",
                 "ElectrificationLevel": "BEV (Battery Electric Vehicle)", "ErrorCode": "0"},
                {"VIN": "1FA6P8TH5K5100000"}
            ]
        }"#;

        let results = parse_response(body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].make.as_deref(), Some("NISSAN"));
        assert_eq!(results[0].fuel_type_secondary, None);
        assert_eq!(results[1].electrification_level, None);
    }

    #[test]
    fn test_parse_response_without_results_is_malformed() {
        let err = parse_response(r#"{"Message": "Rate limited"}"#).unwrap_err();
        assert!(matches!(err, EtlError::MalformedResponse { .. }));

        let err = parse_response("<html>Service Unavailable</html>").unwrap_err();
        assert!(matches!(err, EtlError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_decode_posts_semicolon_joined_form() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/decode")
                .x_www_form_urlencoded_tuple("format", "json")
                .x_www_form_urlencoded_tuple("data", "AAA111;BBB222");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "Count": 1,
                    "Results": [{"VIN": "AAA111", "ElectrificationLevel": "HEV"}]
                }));
        });

        let client = NhtsaClient::new(server.url("/decode"));
        let vins = vec!["AAA111".to_string(), "BBB222".to_string()];
        let results = client.decode(&vins, Duration::from_secs(5)).await.unwrap();

        api_mock.assert();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].vin.as_deref(), Some("AAA111"));
    }

    #[tokio::test]
    async fn test_decode_maps_error_status() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/decode");
            then.status(503);
        });

        let client = NhtsaClient::new(server.url("/decode"));
        let err = client
            .decode(&["AAA111".to_string()], Duration::from_secs(5))
            .await
            .unwrap_err();

        api_mock.assert();
        assert!(matches!(err, EtlError::HttpStatus { status: 503 }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_decode_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/slow");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(serde_json::json!({"Results": []}));
        });

        let client = NhtsaClient::new(server.url("/slow"));
        let err = client
            .decode(&["AAA111".to_string()], Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(matches!(err, EtlError::NetworkTimeout { timeout_ms: 50 }));
    }

    #[tokio::test]
    async fn test_bad_request_is_not_resent() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/decode");
            then.status(400);
        });

        let decoder = RetryingDecoder::new(NhtsaClient::new(server.url("/decode")), quick_retries());
        let outcome = decoder.decode_batch(&one_vin_batch()).await;

        api_mock.assert_hits(1);
        match outcome {
            BatchOutcome::Dropped { attempts, reason } => {
                assert_eq!(attempts, 1);
                assert!(reason.contains("HTTP 400"));
            }
            other => panic!("expected dropped batch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limited_request_is_retried() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/decode");
            then.status(429);
        });

        let decoder = RetryingDecoder::new(NhtsaClient::new(server.url("/decode")), quick_retries());
        let outcome = decoder.decode_batch(&one_vin_batch()).await;

        api_mock.assert_hits(5);
        assert!(matches!(outcome, BatchOutcome::Dropped { attempts: 5, .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_retried_then_dropped() {
        // 取得一個未被監聽的埠
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = NhtsaClient::new(format!("http://127.0.0.1:{}/decode", port));
        let err = client
            .decode(&["AAA111".to_string()], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::TransportError(_)));

        let decoder = RetryingDecoder::new(client, quick_retries());
        match decoder.decode_batch(&one_vin_batch()).await {
            BatchOutcome::Dropped { attempts, reason } => {
                assert_eq!(attempts, 5);
                assert!(reason.starts_with("Transport error"));
            }
            other => panic!("expected dropped batch, got {:?}", other),
        }
    }
}
