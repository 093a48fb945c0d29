//! Three-step checkout wizard.
//!
//! ```text
//! CustomerInfo ──► PaymentMethod ──► Payment
//!                                      │
//!             card:   CreatingOrder ─► RequestingHandle ─► AwaitingCard ─► ConfirmingCard ─► Completed
//!             wallet: CreatingOrder ─► RequestingHandle ─► AwaitingApproval ─► Capturing ─► Completed
//! ```
//!
//! Every press of "pay" is a new attempt with its own order. Effect results
//! carry the attempt number they belong to and are dropped when the shopper
//! has since moved on, so a slow gateway reply can never overwrite a newer
//! attempt.
//!
//! Gateway and storage failures never roll anything back: an order that was
//! already written stays pending/pending and the error is shown inline.

use crate::cart::CartItem;
use crate::services::orders::NewOrder;
use crate::services::{OrderService, ServiceError};
use crate::types::{CustomerInfo, PaymentMethod};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use wedding_core::{async_effect, smallvec, Effect, Reducer, SmallVec};
use wedding_gateways::{
    CardGateway, CreateIntent, CreateWalletOrder, GatewayError, WalletGateway,
};
use wedding_runtime::metrics::{CheckoutMetrics, GatewayMetrics};

// ============================================================================
// State
// ============================================================================

/// Wizard step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutStep {
    /// Contact and delivery details
    #[default]
    CustomerInfo,
    /// Gateway choice
    PaymentMethod,
    /// Paying
    Payment,
}

/// Where the current payment attempt is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentPhase {
    /// Nothing started, or the last attempt ended without paying
    #[default]
    Idle,
    /// Writing the order document
    CreatingOrder,
    /// Asking the gateway for an intent or hosted order
    RequestingHandle,
    /// Waiting for the client to tokenize a card
    AwaitingCard,
    /// Charging the card
    ConfirmingCard,
    /// Waiting for the shopper to approve in the wallet
    AwaitingApproval,
    /// Capturing the approved wallet order
    Capturing,
    /// Paid
    Completed,
}

impl PaymentPhase {
    /// A gateway or storage call is outstanding.
    #[must_use]
    pub const fn in_flight(self) -> bool {
        matches!(
            self,
            Self::CreatingOrder | Self::RequestingHandle | Self::ConfirmingCard | Self::Capturing
        )
    }

    /// An order has been (or is being) written for the current attempt, so
    /// the lines being bought are fixed until the attempt ends.
    #[must_use]
    pub const fn holds_order(self) -> bool {
        !matches!(self, Self::Idle | Self::Completed)
    }
}

/// The order written for the current attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    /// Document id
    pub id: String,
    /// `ORD-...` reference
    pub order_ref: String,
    /// Total in kobo
    pub total: i64,
}

/// Card payment handle handed to the client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardHandle {
    /// Payment intent id
    pub intent_id: String,
    /// Secret the client uses to collect card details
    pub client_secret: String,
}

/// Wallet payment handle handed to the client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletHandle {
    /// Gateway order id
    pub wallet_order_id: String,
    /// Where the shopper approves the payment
    pub approval_url: String,
}

/// Checkout wizard state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutState {
    /// Current step
    pub step: CheckoutStep,
    /// Buyer details from step 1
    pub customer: CustomerInfo,
    /// Gateway from step 2
    pub payment_method: Option<PaymentMethod>,
    /// Cart lines being bought, kept in sync with the cart by the session
    pub line_items: Vec<CartItem>,
    /// Payment attempts started so far
    pub attempt: u64,
    /// Progress of the current attempt
    pub phase: PaymentPhase,
    /// Order of the current attempt
    pub order: Option<PendingOrder>,
    /// Card handle of the current attempt
    pub card: Option<CardHandle>,
    /// Wallet handle of the current attempt
    pub wallet: Option<WalletHandle>,
    /// Set once an attempt is paid
    pub completed_order_id: Option<String>,
    /// Inline error for the shopper
    pub error: Option<String>,
}

impl CheckoutState {
    /// Whether an effect result for `attempt` still applies.
    #[must_use]
    pub const fn is_current(&self, attempt: u64) -> bool {
        attempt == self.attempt
    }

    /// Sum of the line totals in kobo
    #[must_use]
    pub fn subtotal(&self) -> i64 {
        self.line_items.iter().map(CartItem::line_total).sum()
    }

    fn reject(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, step = ?self.step, phase = ?self.phase, "Checkout input rejected");
        self.error = Some(message);
    }

    fn clear_attempt(&mut self) {
        self.order = None;
        self.card = None;
        self.wallet = None;
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Checkout inputs: shopper intents and effect results
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutAction {
    /// Step 1: submit buyer details
    SetCustomerInfo(CustomerInfo),
    /// Step 2: choose a gateway
    SelectPaymentMethod(PaymentMethod),
    /// Go back one step
    Back,
    /// Step 3: start a payment attempt
    Pay,
    /// Charge the card with a tokenized payment method
    ConfirmCard {
        /// Token produced by the card widget
        payment_method: String,
    },
    /// The shopper approved the wallet order
    ApproveWallet {
        /// Gateway order id from the approval redirect
        wallet_order_id: String,
    },
    /// Start over at step 1
    Reset,

    /// The attempt's order was written
    OrderCreated {
        /// Attempt the result belongs to
        attempt: u64,
        /// The order
        order: PendingOrder,
    },
    /// The card gateway issued an intent
    CardIntentCreated {
        /// Attempt the result belongs to
        attempt: u64,
        /// Handle for the client
        handle: CardHandle,
    },
    /// The wallet gateway issued a hosted order
    WalletOrderCreated {
        /// Attempt the result belongs to
        attempt: u64,
        /// Handle for the client
        handle: WalletHandle,
    },
    /// The gateway gave a verdict and the order records it
    PaymentSettled {
        /// Attempt the result belongs to
        attempt: u64,
        /// Whether the money was taken
        succeeded: bool,
        /// Gateway status as reported
        status: String,
    },
    /// A call failed before the gateway gave a verdict
    PaymentFailed {
        /// Attempt the result belongs to
        attempt: u64,
        /// What went wrong
        error: String,
    },
}

impl CheckoutAction {
    /// Whether this action ends a wait on the client side: a handle is ready,
    /// the gateway has settled, or the attempt failed.
    #[must_use]
    pub const fn is_checkout_outcome(&self) -> bool {
        matches!(
            self,
            Self::CardIntentCreated { .. }
                | Self::WalletOrderCreated { .. }
                | Self::PaymentSettled { .. }
                | Self::PaymentFailed { .. }
        )
    }

    /// Attempt an effect result belongs to; `None` for shopper input.
    #[must_use]
    pub const fn attempt(&self) -> Option<u64> {
        match self {
            Self::OrderCreated { attempt, .. }
            | Self::CardIntentCreated { attempt, .. }
            | Self::WalletOrderCreated { attempt, .. }
            | Self::PaymentSettled { attempt, .. }
            | Self::PaymentFailed { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the checkout
#[derive(Clone)]
pub struct CheckoutEnvironment {
    /// Order records
    pub orders: OrderService,
    /// Card gateway
    pub card: Arc<dyn CardGateway>,
    /// Wallet gateway
    pub wallet: Arc<dyn WalletGateway>,
    /// ISO currency sent to the card gateway
    pub currency: String,
    /// Public site URL used for wallet return links, without trailing slash
    pub public_base_url: String,
}

impl CheckoutEnvironment {
    fn return_url(&self) -> String {
        format!("{}/payment/success", self.public_base_url)
    }

    fn cancel_url(&self) -> String {
        format!("{}/payment/cancel", self.public_base_url)
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Checkout wizard reducer
#[derive(Clone, Debug, Default)]
pub struct CheckoutReducer;

impl CheckoutReducer {
    /// Create a new checkout reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CheckoutReducer {
    type State = CheckoutState;
    type Action = CheckoutAction;
    type Environment = CheckoutEnvironment;

    #[allow(clippy::too_many_lines)] // one arm per action
    fn reduce(
        &self,
        state: &mut CheckoutState,
        action: CheckoutAction,
        env: &CheckoutEnvironment,
    ) -> SmallVec<[Effect<CheckoutAction>; 4]> {
        if let Some(attempt) = action.attempt() {
            if !state.is_current(attempt) {
                tracing::debug!(attempt, current = state.attempt, "Ignoring stale checkout result");
                return smallvec![Effect::None];
            }
        }

        match action {
            CheckoutAction::SetCustomerInfo(customer) => {
                if state.step != CheckoutStep::CustomerInfo {
                    state.reject("Customer details can only be changed on the first step");
                    return smallvec![Effect::None];
                }
                let missing = customer.first_missing_field();
                state.customer = customer;
                match missing {
                    Some(field) => state.reject(format!("Please fill in {field}")),
                    None => {
                        state.error = None;
                        state.step = CheckoutStep::PaymentMethod;
                    },
                }
            },

            CheckoutAction::SelectPaymentMethod(method) => {
                if state.step != CheckoutStep::PaymentMethod {
                    state.reject("Choose a payment method after entering your details");
                } else if state.line_items.is_empty() {
                    state.reject("Your cart is empty");
                } else {
                    state.payment_method = Some(method);
                    state.phase = PaymentPhase::Idle;
                    state.error = None;
                    state.step = CheckoutStep::Payment;
                }
            },

            CheckoutAction::Back => {
                if state.phase.in_flight() || state.phase == PaymentPhase::Completed {
                    state.reject("Payment is already under way");
                    return smallvec![Effect::None];
                }
                state.error = None;
                match state.step {
                    CheckoutStep::CustomerInfo => {},
                    CheckoutStep::PaymentMethod => state.step = CheckoutStep::CustomerInfo,
                    CheckoutStep::Payment => {
                        state.clear_attempt();
                        state.phase = PaymentPhase::Idle;
                        state.step = CheckoutStep::PaymentMethod;
                    },
                }
            },

            CheckoutAction::Pay => {
                if state.step != CheckoutStep::Payment {
                    state.reject("Complete the previous steps first");
                    return smallvec![Effect::None];
                }
                if state.phase.in_flight() || state.phase == PaymentPhase::Completed {
                    state.reject("Payment is already under way");
                    return smallvec![Effect::None];
                }
                let Some(payment_method) = state.payment_method else {
                    state.reject("Choose a payment method");
                    return smallvec![Effect::None];
                };
                if state.line_items.is_empty() {
                    state.reject("Your cart is empty");
                    return smallvec![Effect::None];
                }

                state.attempt += 1;
                state.phase = PaymentPhase::CreatingOrder;
                state.error = None;
                state.clear_attempt();

                let attempt = state.attempt;
                let orders = env.orders.clone();
                let request = NewOrder {
                    customer_info: state.customer.clone(),
                    items: state.line_items.iter().map(CartItem::to_order_item).collect(),
                    payment_method,
                };
                tracing::info!(attempt, method = %payment_method, "Starting payment attempt");

                return smallvec![async_effect! {
                    Some(match orders.create(request).await {
                        Ok(order) => CheckoutAction::OrderCreated {
                            attempt,
                            order: PendingOrder {
                                id: order.id,
                                order_ref: order.order_id,
                                total: order.total_amount,
                            },
                        },
                        Err(err) => failed(attempt, &err),
                    })
                }];
            },

            CheckoutAction::OrderCreated { attempt, order } => {
                if state.phase != PaymentPhase::CreatingOrder {
                    return smallvec![Effect::None];
                }
                let Some(method) = state.payment_method else {
                    return smallvec![Effect::None];
                };
                state.phase = PaymentPhase::RequestingHandle;
                state.order = Some(order.clone());

                let effect = match method {
                    PaymentMethod::Card => {
                        let card = Arc::clone(&env.card);
                        let request = CreateIntent {
                            amount_minor: order.total,
                            currency: env.currency.to_lowercase(),
                            order_id: order.id,
                        };
                        async_effect! {
                            let result = timed("card", "create_intent", card.create_intent(request)).await;
                            Some(match result {
                                Ok(intent) => CheckoutAction::CardIntentCreated {
                                    attempt,
                                    handle: CardHandle {
                                        intent_id: intent.id,
                                        client_secret: intent.client_secret,
                                    },
                                },
                                Err(err) => gateway_failed(attempt, PaymentMethod::Card, &err),
                            })
                        }
                    },
                    PaymentMethod::Wallet => {
                        let wallet = Arc::clone(&env.wallet);
                        let request = CreateWalletOrder {
                            order_id: order.id,
                            order_ref: order.order_ref,
                            amount_minor: order.total,
                            return_url: env.return_url(),
                            cancel_url: env.cancel_url(),
                        };
                        async_effect! {
                            let result = timed("wallet", "create_order", wallet.create_order(request)).await;
                            Some(match result {
                                Ok(created) => CheckoutAction::WalletOrderCreated {
                                    attempt,
                                    handle: WalletHandle {
                                        wallet_order_id: created.id,
                                        approval_url: created.approval_url,
                                    },
                                },
                                Err(err) => gateway_failed(attempt, PaymentMethod::Wallet, &err),
                            })
                        }
                    },
                };
                return smallvec![effect];
            },

            CheckoutAction::CardIntentCreated { handle, .. } => {
                if state.phase == PaymentPhase::RequestingHandle {
                    state.card = Some(handle);
                    state.phase = PaymentPhase::AwaitingCard;
                }
            },

            CheckoutAction::WalletOrderCreated { handle, .. } => {
                if state.phase == PaymentPhase::RequestingHandle {
                    state.wallet = Some(handle);
                    state.phase = PaymentPhase::AwaitingApproval;
                }
            },

            CheckoutAction::ConfirmCard { payment_method } => {
                let (Some(order), Some(handle)) = (state.order.clone(), state.card.clone()) else {
                    state.reject("No card payment is waiting for confirmation");
                    return smallvec![Effect::None];
                };
                if state.phase != PaymentPhase::AwaitingCard {
                    state.reject("No card payment is waiting for confirmation");
                    return smallvec![Effect::None];
                }
                if payment_method.trim().is_empty() {
                    state.reject("Card details are missing");
                    return smallvec![Effect::None];
                }
                state.phase = PaymentPhase::ConfirmingCard;
                state.error = None;

                let attempt = state.attempt;
                let card = Arc::clone(&env.card);
                let orders = env.orders.clone();
                return smallvec![async_effect! {
                    let verdict = timed(
                        "card",
                        "confirm_intent",
                        card.confirm_intent(&handle.intent_id, &payment_method),
                    )
                    .await
                    .map(|status| (status.is_success(), label(&status)));
                    Some(settle(attempt, PaymentMethod::Card, &orders, &order.id, &handle.intent_id, verdict).await)
                }];
            },

            CheckoutAction::ApproveWallet { wallet_order_id } => {
                let (Some(order), Some(handle)) = (state.order.clone(), state.wallet.clone()) else {
                    state.reject("No wallet payment is waiting for approval");
                    return smallvec![Effect::None];
                };
                if state.phase != PaymentPhase::AwaitingApproval {
                    state.reject("No wallet payment is waiting for approval");
                    return smallvec![Effect::None];
                }
                if handle.wallet_order_id != wallet_order_id {
                    state.reject("Approval does not match the current wallet order");
                    return smallvec![Effect::None];
                }
                state.phase = PaymentPhase::Capturing;
                state.error = None;

                let attempt = state.attempt;
                let wallet = Arc::clone(&env.wallet);
                let orders = env.orders.clone();
                return smallvec![async_effect! {
                    let verdict = timed(
                        "wallet",
                        "capture_order",
                        wallet.capture_order(&handle.wallet_order_id),
                    )
                    .await
                    .map(|status| (status.is_success(), label(&status)));
                    Some(settle(attempt, PaymentMethod::Wallet, &orders, &order.id, &handle.wallet_order_id, verdict).await)
                }];
            },

            CheckoutAction::PaymentSettled { succeeded, status, .. } => {
                if !matches!(state.phase, PaymentPhase::ConfirmingCard | PaymentPhase::Capturing) {
                    return smallvec![Effect::None];
                }
                if succeeded {
                    state.phase = PaymentPhase::Completed;
                    state.completed_order_id = state.order.as_ref().map(|order| order.id.clone());
                    state.line_items.clear();
                    state.error = None;
                    tracing::info!(order_id = ?state.completed_order_id, "Checkout completed");
                } else {
                    state.phase = PaymentPhase::Idle;
                    state.clear_attempt();
                    state.reject(format!("Payment was not completed ({status}). Please try again."));
                }
            },

            CheckoutAction::PaymentFailed { error, .. } => {
                if !state.phase.in_flight() {
                    return smallvec![Effect::None];
                }
                // The gateway handle, if any, is still usable
                state.phase = if state.card.is_some() {
                    PaymentPhase::AwaitingCard
                } else if state.wallet.is_some() {
                    PaymentPhase::AwaitingApproval
                } else {
                    PaymentPhase::Idle
                };
                state.reject(error);
            },

            CheckoutAction::Reset => {
                if state.phase.in_flight() {
                    state.reject("Payment is already under way");
                    return smallvec![Effect::None];
                }
                // The attempt counter survives so late results stay stale
                *state = CheckoutState {
                    attempt: state.attempt,
                    line_items: std::mem::take(&mut state.line_items),
                    ..CheckoutState::default()
                };
            },
        }

        smallvec![Effect::None]
    }
}

// ============================================================================
// Effect helpers
// ============================================================================

/// Gateway status as its wire name (`succeeded`, `COMPLETED`, ...).
fn label<T: Serialize>(status: &T) -> String {
    serde_json::to_value(status)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

async fn timed<T>(
    gateway: &'static str,
    operation: &'static str,
    call: impl std::future::Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    let start = Instant::now();
    let result = call.await;
    GatewayMetrics::record_call(gateway, operation, start.elapsed());
    if let Err(err) = &result {
        GatewayMetrics::record_error(gateway, operation, err.kind());
        tracing::warn!(gateway, operation, error = %err, "Gateway call failed");
    }
    result
}

fn failed(attempt: u64, err: &ServiceError) -> CheckoutAction {
    tracing::warn!(attempt, error = %err, "Checkout order could not be created");
    CheckoutAction::PaymentFailed {
        attempt,
        error: format!("We could not place your order: {err}"),
    }
}

fn gateway_failed(attempt: u64, method: PaymentMethod, err: &GatewayError) -> CheckoutAction {
    CheckoutMetrics::record_payment(method.as_str(), "error");
    CheckoutAction::PaymentFailed {
        attempt,
        error: format!("The payment provider could not be reached: {err}"),
    }
}

/// Write the gateway verdict onto the order.
///
/// A declined payment is a verdict; every other gateway error leaves the
/// order untouched.
async fn settle(
    attempt: u64,
    method: PaymentMethod,
    orders: &OrderService,
    order_id: &str,
    payment_id: &str,
    verdict: Result<(bool, String), GatewayError>,
) -> CheckoutAction {
    let (succeeded, status) = match verdict {
        Ok(verdict) => verdict,
        Err(GatewayError::Declined(reason)) => (false, format!("declined: {reason}")),
        Err(err) => return gateway_failed(attempt, method, &err),
    };

    if let Err(err) = orders.settle_payment(order_id, succeeded, payment_id).await {
        tracing::error!(order_id, error = %err, "Gateway settled but the order could not be updated");
        return CheckoutAction::PaymentFailed {
            attempt,
            error: format!("Your payment was processed but we could not update your order: {err}"),
        };
    }

    CheckoutMetrics::record_payment(method.as_str(), if succeeded { "succeeded" } else { "failed" });
    CheckoutAction::PaymentSettled {
        attempt,
        succeeded,
        status,
    }
}
