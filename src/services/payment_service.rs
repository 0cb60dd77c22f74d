use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::domain::Booking,
    repositories::{BookingRepository, ContestRepository},
};

const GATEWAY_API_VERSION: &str = "2022-09-01";

#[derive(Debug, Serialize)]
struct CreateOrderBody {
    order_id: String,
    order_amount: f64,
    order_currency: String,
    customer_details: CustomerDetails,
    order_note: String,
}

#[derive(Debug, Serialize)]
struct CustomerDetails {
    customer_id: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
}

#[derive(Debug, Deserialize)]
struct CreateOrderReply {
    order_id: String,
    payment_session_id: String,
}

#[derive(Debug, Deserialize)]
struct GatewayPayment {
    payment_status: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Pending,
    Failed,
}

#[derive(Debug, Clone)]
pub struct PaymentSession {
    pub order_id: String,
    pub payment_session_id: String,
}

/// Synchronous client for the external payment gateway. Payment confirmation
/// only flips the booking's payment fields; it never touches the admission
/// counters.
pub struct PaymentService {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: SecretString,
    contests: Arc<dyn ContestRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl PaymentService {
    pub fn new(
        config: &Config,
        contests: Arc<dyn ContestRepository>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.payment_base_url.trim_end_matches('/').to_string(),
            client_id: config.payment_client_id.clone(),
            client_secret: config.payment_client_secret.clone(),
            contests,
            bookings,
        }
    }

    /// Open a gateway order for a booking's entry fee.
    pub async fn create_order(&self, booking_id: &str) -> AppResult<PaymentSession> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id '{}' not found", booking_id)))?;

        if booking.is_paid {
            return Err(AppError::Conflict(
                "Booking is already paid".to_string(),
            ));
        }

        let contest = self
            .contests
            .find_by_id(&booking.contest_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Contest with id '{}' not found", booking.contest_id))
            })?;

        let body = CreateOrderBody {
            order_id: format!("talent-{}", booking.id),
            order_amount: contest.entry_fee,
            order_currency: "INR".to_string(),
            customer_details: CustomerDetails {
                customer_id: booking.id.clone(),
                customer_name: booking.name.clone(),
                customer_email: booking.email.clone(),
                customer_phone: booking.phone.clone(),
            },
            order_note: format!("Talent Search entry for {}", contest.title),
        };

        let response = self
            .client
            .post(format!("{}/pg/orders", self.base_url))
            .header("x-client-id", &self.client_id)
            .header("x-client-secret", self.client_secret.expose_secret())
            .header("x-api-version", GATEWAY_API_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamError(format!(
                "payment gateway rejected order creation: {}",
                response.status()
            )));
        }

        let reply: CreateOrderReply = response.json().await?;
        Ok(PaymentSession {
            order_id: reply.order_id,
            payment_session_id: reply.payment_session_id,
        })
    }

    /// Ask the gateway for the payment outcome of an order.
    pub async fn verify_order(&self, order_id: &str) -> AppResult<PaymentStatus> {
        let response = self
            .client
            .get(format!("{}/pg/orders/{}/payments", self.base_url, order_id))
            .header("x-client-id", &self.client_id)
            .header("x-client-secret", self.client_secret.expose_secret())
            .header("x-api-version", GATEWAY_API_VERSION)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamError(format!(
                "payment gateway verification failed: {}",
                response.status()
            )));
        }

        let payments: Vec<GatewayPayment> = response.json().await?;
        Ok(classify_payments(&payments))
    }

    /// Verify an order with the gateway and record the outcome on the
    /// booking. Succeeds only for a settled payment.
    pub async fn confirm_payment(&self, booking_id: &str, order_id: &str) -> AppResult<Booking> {
        let status = self.verify_order(order_id).await?;

        match status {
            PaymentStatus::Paid => {
                let booking = self
                    .bookings
                    .mark_payment(booking_id, order_id, true, "Paid")
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "Booking with id '{}' not found (hold may have expired)",
                            booking_id
                        ))
                    })?;
                Ok(booking)
            }
            PaymentStatus::Failed => {
                self.bookings
                    .mark_payment(booking_id, order_id, false, "Failed")
                    .await?;
                Err(AppError::Conflict("Payment failed".to_string()))
            }
            PaymentStatus::Pending => Err(AppError::Conflict(
                "Payment is not completed yet".to_string(),
            )),
        }
    }
}

fn classify_payments(payments: &[GatewayPayment]) -> PaymentStatus {
    if payments
        .iter()
        .any(|payment| payment.payment_status.eq_ignore_ascii_case("SUCCESS"))
    {
        PaymentStatus::Paid
    } else if payments
        .iter()
        .all(|payment| payment.payment_status.eq_ignore_ascii_case("FAILED"))
        && !payments.is_empty()
    {
        PaymentStatus::Failed
    } else {
        PaymentStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(status: &str) -> GatewayPayment {
        GatewayPayment {
            payment_status: status.to_string(),
        }
    }

    #[test]
    fn any_successful_attempt_settles_the_order() {
        let payments = vec![payment("FAILED"), payment("success")];
        assert_eq!(classify_payments(&payments), PaymentStatus::Paid);
    }

    #[test]
    fn all_failed_attempts_fail_the_order() {
        let payments = vec![payment("FAILED"), payment("FAILED")];
        assert_eq!(classify_payments(&payments), PaymentStatus::Failed);
    }

    #[test]
    fn anything_else_is_still_pending() {
        assert_eq!(classify_payments(&[]), PaymentStatus::Pending);

        let payments = vec![payment("FAILED"), payment("PENDING")];
        assert_eq!(classify_payments(&payments), PaymentStatus::Pending);
    }
}
