//! NPK prediction oracle.
//!
//! The image model is opaque: given a stored image it returns three floats.
//! The oracle is built once at startup and handed to the router state; the
//! engines never see it.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::models::Npk;
use crate::validation::validate_npk;

// ---

/// Fallback prediction used when no inference service is configured.
pub const FALLBACK_PREDICTION: Npk = Npk {
    n: 150.0,
    p: 50.0,
    k: 200.0,
};

#[derive(Serialize)]
struct PredictRequest<'a> {
    image_url: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    n: f64,
    p: f64,
    k: f64,
}

/// Source of NPK predictions.
#[derive(Debug, Clone)]
pub enum Oracle {
    /// Remote inference service reached over HTTP.
    Remote { client: reqwest::Client, url: String },
    /// Constant prediction.
    Fixed(Npk),
}

impl Oracle {
    /// Build from an optional inference URL, falling back to a fixed prediction.
    pub fn from_url(url: Option<&str>) -> Self {
        // ---
        match url {
            Some(url) => {
                tracing::info!("Using remote NPK oracle at {}", url);
                Oracle::Remote {
                    client: reqwest::Client::new(),
                    url: url.to_string(),
                }
            }
            None => {
                tracing::warn!("ORACLE_URL not set, using fixed fallback predictions");
                Oracle::Fixed(FALLBACK_PREDICTION)
            }
        }
    }

    /// Predict NPK concentrations for an already-stored image.
    pub async fn predict(&self, image_url: &str) -> Result<Npk> {
        // ---
        let npk = match self {
            Oracle::Fixed(npk) => *npk,
            Oracle::Remote { client, url } => {
                tracing::debug!("Requesting prediction for {} from {}", image_url, url);
                let response: PredictResponse = client
                    .post(url)
                    .json(&PredictRequest { image_url })
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                Npk::new(response.n, response.p, response.k)
            }
        };

        validate_npk("prediction", &npk).map_err(|e| anyhow!("Oracle returned {}", e))?;
        Ok(npk)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_fallback_without_url() {
        // ---
        let oracle = Oracle::from_url(None);
        let npk = tokio_test::block_on(oracle.predict("images/a.jpg")).unwrap();
        assert_eq!(npk, FALLBACK_PREDICTION);
    }

    #[test]
    fn test_fixed_prediction_is_validated() {
        // ---
        let oracle = Oracle::Fixed(Npk::new(150.0, f64::NAN, 200.0));
        let err = tokio_test::block_on(oracle.predict("images/a.jpg")).unwrap_err();
        assert!(err.to_string().contains("prediction.p"));
    }

    #[test]
    fn test_remote_from_url() {
        // ---
        let oracle = Oracle::from_url(Some("http://localhost:9000/predict"));
        assert!(matches!(oracle, Oracle::Remote { ref url, .. } if url == "http://localhost:9000/predict"));
    }
}
