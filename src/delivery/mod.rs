//! Report delivery over WhatsApp.
//!
//! Sends the text document first, then one message per chart image. Every
//! send is independent: a failure is logged and counted, never fatal.

pub mod whatsapp;

pub use whatsapp::WhatsAppClient;

use crate::analysis::metric;
use crate::models::{DeliveryOutcome, ReportArtifact};
use tracing::{error, info};

/// Caption sent with each chart image, keyed by metric name.
const CHART_CAPTIONS: &[(&str, &str)] = &[
    (metric::SALES_BY_VEHICLE_ID, "Top Sales by Vehicle ID Chart"),
    (metric::SALES_BY_CHANNEL, "Sales by Channel Chart"),
    (metric::SALES_OVER_TIME, "Monthly Sales Trend Chart"),
    (metric::NET_SALES_BY_LOCATION, "Net Sales by Location Chart"),
    (metric::TOP_SELLING_MODELS, "Top Selling Models Chart"),
    (metric::SALES_COUNT_BY_CHANNEL, "Sales Count by Channel Chart"),
    (metric::CLIENT_SEGMENTS, "Client Segmentation Chart"),
    (metric::VEHICLES_BY_BRAND, "Vehicles by Brand Chart"),
    (metric::VEHICLES_BY_TYPE, "Vehicles by Type Chart"),
    (
        metric::REGISTRATIONS_OVER_TIME,
        "New Registrations Trend Chart",
    ),
];

fn caption_for(metric_name: &str, file_name: &str) -> String {
    CHART_CAPTIONS
        .iter()
        .find(|(name, _)| *name == metric_name)
        .map(|(_, caption)| (*caption).to_string())
        .unwrap_or_else(|| format!("Business Report Chart: {file_name}"))
}

/// Join the public base URL and an artifact file name.
fn public_url(base_url: &str, file_name: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), file_name)
}

/// Send the whole report. All artifacts are attempted even when earlier
/// sends fail; the outcome records how many made it.
pub async fn deliver_report(
    client: &WhatsAppClient,
    base_url: &str,
    text_artifact: Option<&ReportArtifact>,
    charts: &[ReportArtifact],
) -> DeliveryOutcome {
    let mut outcome = DeliveryOutcome::default();

    match text_artifact {
        Some(artifact) => {
            let url = public_url(base_url, &artifact.file_name());
            send_one(
                client,
                "Here is your business report:",
                &[url],
                "text report",
                &mut outcome,
            )
            .await;
        }
        None => {
            send_one(
                client,
                "Business report could not be generated.",
                &[],
                "fallback notice",
                &mut outcome,
            )
            .await;
        }
    }

    for artifact in charts {
        if let ReportArtifact::Chart { metric, .. } = artifact {
            let file_name = artifact.file_name();
            let caption = caption_for(metric, &file_name);
            let url = public_url(base_url, &file_name);
            send_one(client, &caption, &[url], metric, &mut outcome).await;
        }
    }

    outcome
}

async fn send_one(
    client: &WhatsAppClient,
    body: &str,
    media_urls: &[String],
    label: &str,
    outcome: &mut DeliveryOutcome,
) {
    match client.send(body, media_urls).await {
        Ok(sid) => {
            info!(label, sid = %sid, "message sent");
            outcome.record_success();
        }
        Err(err) => {
            error!(label, error = %err, "message failed");
            outcome.record_failure();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeliveryConfig;
    use std::path::PathBuf;

    #[test]
    fn test_caption_lookup_and_fallback() {
        assert_eq!(
            caption_for(metric::SALES_BY_CHANNEL, "x.png"),
            "Sales by Channel Chart"
        );
        assert_eq!(
            caption_for("unknown_metric", "report_chart_unknown_metric.png"),
            "Business Report Chart: report_chart_unknown_metric.png"
        );
    }

    #[test]
    fn test_public_url_join() {
        assert_eq!(
            public_url("https://example.ngrok.io/", "chart.png"),
            "https://example.ngrok.io/chart.png"
        );
        assert_eq!(
            public_url("https://example.ngrok.io", "chart.png"),
            "https://example.ngrok.io/chart.png"
        );
    }

    fn unreachable_client() -> WhatsAppClient {
        // Nothing listens on this port; every send fails fast.
        WhatsAppClient::new(&DeliveryConfig {
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            from: "whatsapp:+14155238886".to_string(),
            to: "whatsapp:+51999999999".to_string(),
            public_base_url: "https://example.ngrok.io".to_string(),
            api_base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 1,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_all_sends_attempted_despite_failures() {
        let client = unreachable_client();
        let text = ReportArtifact::Text {
            path: PathBuf::from("Reports/Business_Report.txt"),
        };
        let charts = vec![
            ReportArtifact::Chart {
                metric: metric::SALES_BY_CHANNEL.to_string(),
                path: PathBuf::from("Reports/report_chart_sales_by_channel.png"),
            },
            ReportArtifact::Chart {
                metric: metric::VEHICLES_BY_BRAND.to_string(),
                path: PathBuf::from("Reports/report_chart_vehicles_by_brand.png"),
            },
        ];

        let outcome = deliver_report(
            &client,
            "https://example.ngrok.io",
            Some(&text),
            &charts,
        )
        .await;

        // One text message plus two charts, all attempted, all failed.
        assert_eq!(outcome.attempted, 3);
        assert_eq!(outcome.delivered, 0);
        assert_eq!(outcome.failed, 3);
        assert!(!outcome.is_partial());
    }

    #[tokio::test]
    async fn test_missing_text_report_sends_fallback_notice() {
        let client = unreachable_client();
        let outcome = deliver_report(&client, "https://example.ngrok.io", None, &[]).await;
        assert_eq!(outcome.attempted, 1);
    }
}
