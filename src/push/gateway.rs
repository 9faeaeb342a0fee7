//! HTTP client for the web push gateway.
//!
//! This module provides the [`PushGateway`] struct that hands notifications
//! to the gateway owning the VAPID keys. Payload encryption and signing
//! happen behind the gateway.

use std::time::Duration;

use log::{debug, info, warn};
use mockall::automock;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::{alerts::Notification, push::Delivery};

/// Icon displayed by the browser next to the notification.
const ICON: &str = "/icon-192.png";

/// Trait for delivering notifications to one subscriber.
///
/// This trait abstracts the HTTP operations for easier testing with mocks.
#[automock]
pub trait Dispatcher {
    /// Delivers `notification` to the push subscription `subscription`.
    async fn send(&self, subscription: &Value, notification: &Notification) -> Delivery;
}

/// Body posted to the gateway.
#[derive(Serialize, Debug)]
struct PushRequest<'a> {
    subscription: &'a Value,
    title: &'a str,
    body: &'a str,
    icon: &'a str,
}

/// HTTP client posting notifications to the push gateway.
///
/// # Examples
///
/// ```no_run
/// let gateway = PushGateway::new("http://localhost:5000/api/push/deliver", 10)?;
/// let delivery = gateway.send(&subscription, &notification).await;
/// ```
pub struct PushGateway {
    /// Gateway url receiving notifications
    url: String,
    /// HTTP client
    client: Client,
}

impl PushGateway {
    /// Create a new [PushGateway].
    ///
    /// # Arguments
    ///
    /// * `url` - The URL notifications are posted to.
    /// * `timeout` - Timeout of every request, in seconds.
    pub fn new(url: &str, timeout: u64) -> Result<Self, anyhow::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;

        Ok(PushGateway {
            url: url.to_string(),
            client,
        })
    }
}

impl Dispatcher for PushGateway {
    /// Post the notification to the gateway.
    ///
    /// The gateway answers like the push service it relays to: `404` or `410`
    /// means the subscription expired and will never accept a message again.
    async fn send(&self, subscription: &Value, notification: &Notification) -> Delivery {
        let endpoint = subscription
            .get("endpoint")
            .and_then(Value::as_str)
            .unwrap_or_default();
        info!("send {} notification to {}", notification.kind, endpoint);

        let request = PushRequest {
            subscription,
            title: &notification.title,
            body: &notification.body,
            icon: ICON,
        };
        debug!("request {} -> {:?}", &self.url, &request);

        let response = match self.client.post(&self.url).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("failed to reach push gateway for {}: {}", endpoint, e);
                return Delivery::Failed(e.to_string());
            }
        };

        match response.status() {
            status if status.is_success() => Delivery::Delivered,
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                info!("subscription {} expired", endpoint);
                Delivery::Gone
            }
            status => {
                warn!("push gateway answered {} for {}", status, endpoint);
                Delivery::Failed(format!("push gateway answered {}", status))
            }
        }
    }
}
