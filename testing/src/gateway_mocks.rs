//! Scriptable payment gateway doubles
//!
//! Both mocks succeed by default. Queue failures with `fail_next` and inspect
//! what the checkout sent through `calls`.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use wedding_gateways::card::CardFuture;
use wedding_gateways::wallet::WalletFuture;
use wedding_gateways::{
    CaptureStatus, CardGateway, CreateIntent, CreateWalletOrder, GatewayError, IntentStatus,
    PaymentIntent, WalletGateway, WalletOrder,
};

/// A call observed by [`MockCardGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardCall {
    /// `create_intent`
    CreateIntent(CreateIntent),
    /// `confirm_intent(intent_id, payment_method)`
    Confirm(String, String),
    /// `retrieve_intent(intent_id)`
    Retrieve(String),
}

#[derive(Debug, Default)]
struct CardScript {
    calls: Vec<CardCall>,
    failures: VecDeque<GatewayError>,
    confirm_status: Option<IntentStatus>,
}

/// In-memory card gateway
///
/// Intents are numbered `pi_1`, `pi_2`, ... with client secret
/// `{id}_secret`. Confirmation returns `Succeeded` unless overridden.
///
/// ```
/// use wedding_testing::MockCardGateway;
/// use wedding_gateways::{CardGateway, GatewayError};
///
/// # async fn example() {
/// let card = MockCardGateway::new();
/// card.fail_next(GatewayError::Declined("insufficient funds".into()));
/// let err = card.confirm_intent("pi_1", "pm_card_visa").await.unwrap_err();
/// assert_eq!(err, GatewayError::Declined("insufficient funds".into()));
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockCardGateway {
    script: Arc<Mutex<CardScript>>,
}

impl MockCardGateway {
    /// Create a gateway that approves everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: GatewayError) {
        self.script.lock().unwrap().failures.push_back(error);
    }

    /// Status returned by later confirmations and lookups
    pub fn set_confirm_status(&self, status: IntentStatus) {
        self.script.lock().unwrap().confirm_status = Some(status);
    }

    /// Every call made so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<CardCall> {
        self.script.lock().unwrap().calls.clone()
    }

    fn record(&self, call: CardCall) -> Result<Option<IntentStatus>, GatewayError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(call);
        match script.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(script.confirm_status.clone()),
        }
    }

    fn intents_created(&self) -> usize {
        self.script
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| matches!(c, CardCall::CreateIntent(_)))
            .count()
    }
}

impl CardGateway for MockCardGateway {
    fn create_intent(&self, request: CreateIntent) -> CardFuture<'_, PaymentIntent> {
        Box::pin(async move {
            let amount = request.amount_minor;
            let currency = request.currency.clone();
            self.record(CardCall::CreateIntent(request))?;
            let id = format!("pi_{}", self.intents_created());
            Ok(PaymentIntent {
                client_secret: format!("{id}_secret"),
                id,
                status: IntentStatus::RequiresPaymentMethod,
                amount,
                currency,
            })
        })
    }

    fn confirm_intent<'a>(
        &'a self,
        intent_id: &'a str,
        payment_method: &'a str,
    ) -> CardFuture<'a, IntentStatus> {
        Box::pin(async move {
            let status = self.record(CardCall::Confirm(
                intent_id.to_string(),
                payment_method.to_string(),
            ))?;
            Ok(status.unwrap_or(IntentStatus::Succeeded))
        })
    }

    fn retrieve_intent<'a>(&'a self, intent_id: &'a str) -> CardFuture<'a, IntentStatus> {
        Box::pin(async move {
            let status = self.record(CardCall::Retrieve(intent_id.to_string()))?;
            Ok(status.unwrap_or(IntentStatus::Succeeded))
        })
    }
}

/// A call observed by [`MockWalletGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletCall {
    /// `create_order`
    CreateOrder(CreateWalletOrder),
    /// `capture_order(wallet_order_id)`
    Capture(String),
}

#[derive(Debug, Default)]
struct WalletScript {
    calls: Vec<WalletCall>,
    failures: VecDeque<GatewayError>,
    capture_status: Option<CaptureStatus>,
}

/// In-memory wallet gateway
///
/// Orders are numbered `WAL-1`, `WAL-2`, ... with approval link
/// `https://wallet.test/approve/{id}`. Capture returns `Completed` unless
/// overridden.
#[derive(Clone, Debug, Default)]
pub struct MockWalletGateway {
    script: Arc<Mutex<WalletScript>>,
}

impl MockWalletGateway {
    /// Create a gateway that approves everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: GatewayError) {
        self.script.lock().unwrap().failures.push_back(error);
    }

    /// Status returned by later captures
    pub fn set_capture_status(&self, status: CaptureStatus) {
        self.script.lock().unwrap().capture_status = Some(status);
    }

    /// Every call made so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<WalletCall> {
        self.script.lock().unwrap().calls.clone()
    }

    fn record(&self, call: WalletCall) -> Result<(usize, Option<CaptureStatus>), GatewayError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(call);
        if let Some(err) = script.failures.pop_front() {
            return Err(err);
        }
        let created = script
            .calls
            .iter()
            .filter(|c| matches!(c, WalletCall::CreateOrder(_)))
            .count();
        Ok((created, script.capture_status.clone()))
    }
}

impl WalletGateway for MockWalletGateway {
    fn create_order(&self, request: CreateWalletOrder) -> WalletFuture<'_, WalletOrder> {
        Box::pin(async move {
            let (created, _) = self.record(WalletCall::CreateOrder(request))?;
            let id = format!("WAL-{created}");
            Ok(WalletOrder {
                approval_url: format!("https://wallet.test/approve/{id}"),
                id,
            })
        })
    }

    fn capture_order<'a>(&'a self, wallet_order_id: &'a str) -> WalletFuture<'a, CaptureStatus> {
        Box::pin(async move {
            let (_, status) = self.record(WalletCall::Capture(wallet_order_id.to_string()))?;
            Ok(status.unwrap_or(CaptureStatus::Completed))
        })
    }
}
