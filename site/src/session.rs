//! A shopper session: one cart and one checkout behind a single store.
//!
//! The cart and checkout reducers each own a slice of [`ShopState`]. A small
//! sync reducer sits between them: it hands the cart lines to the checkout
//! whenever the shopper touches the checkout, and takes the paid lines out of
//! the cart once a payment settles successfully. While an attempt holds an
//! order the checkout keeps the lines that order was written from.

use crate::cart::{CartAction, CartReducer, CartState};
use crate::checkout::{CheckoutAction, CheckoutEnvironment, CheckoutReducer, CheckoutState, PaymentPhase};
use serde::Serialize;
use wedding_core::composition::{combine_reducers, scope_reducer, CombinedReducer, Scope};
use wedding_core::{smallvec, Effect, Reducer, SmallVec};
use wedding_runtime::Store;

/// Everything a shopper session holds
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopState {
    /// The cart
    pub cart: CartState,
    /// The checkout wizard
    pub checkout: CheckoutState,
}

/// Session inputs
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShopAction {
    /// For the cart
    Cart(CartAction),
    /// For the checkout
    Checkout(CheckoutAction),
}

/// Session dependencies
#[derive(Clone)]
pub struct ShopEnvironment {
    /// Checkout dependencies
    pub checkout: CheckoutEnvironment,
}

/// A running shopper session
pub type ShopStore = Store<ShopState, ShopAction, ShopEnvironment, ShopReducer>;

/// Keeps the checkout's copy of the cart current
struct CartCheckoutSync;

impl Reducer for CartCheckoutSync {
    type State = ShopState;
    type Action = ShopAction;
    type Environment = ShopEnvironment;

    fn reduce(
        &self,
        state: &mut ShopState,
        action: ShopAction,
        _env: &ShopEnvironment,
    ) -> SmallVec<[Effect<ShopAction>; 4]> {
        let ShopAction::Checkout(action) = action else {
            return smallvec![Effect::None];
        };

        match action {
            CheckoutAction::PaymentSettled {
                attempt,
                succeeded: true,
                ..
            } if state.checkout.is_current(attempt)
                && matches!(
                    state.checkout.phase,
                    PaymentPhase::ConfirmingCard | PaymentPhase::Capturing
                ) =>
            {
                let purchased = state.checkout.line_items.clone();
                let _ = CartReducer::new().reduce(
                    &mut state.cart,
                    CartAction::RemovePurchased(purchased),
                    &(),
                );
            },
            action if action.attempt().is_none() && !state.checkout.phase.holds_order() => {
                state.checkout.line_items.clone_from(&state.cart.items);
            },
            _ => {},
        }

        smallvec![Effect::None]
    }
}

/// Cart, sync and checkout reducers run in that order
pub struct ShopReducer {
    inner: CombinedReducer<ShopState, ShopAction, ShopEnvironment>,
}

impl ShopReducer {
    /// Assemble the session reducer
    #[must_use]
    pub fn new() -> Self {
        let cart = scope_reducer(
            CartReducer::new(),
            Scope {
                get_state: |s: &ShopState| &s.cart,
                set_state: |s: &mut ShopState, cart| s.cart = cart,
                extract_action: |a| match a {
                    ShopAction::Cart(action) => Some(action),
                    ShopAction::Checkout(_) => None,
                },
                embed_action: ShopAction::Cart,
                get_env: |_: &ShopEnvironment| &(),
            },
        );
        let checkout = scope_reducer(
            CheckoutReducer::new(),
            Scope {
                get_state: |s: &ShopState| &s.checkout,
                set_state: |s: &mut ShopState, checkout| s.checkout = checkout,
                extract_action: |a| match a {
                    ShopAction::Checkout(action) => Some(action),
                    ShopAction::Cart(_) => None,
                },
                embed_action: ShopAction::Checkout,
                get_env: |e: &ShopEnvironment| &e.checkout,
            },
        );

        Self {
            inner: combine_reducers(vec![
                Box::new(cart),
                Box::new(CartCheckoutSync),
                Box::new(checkout),
            ]),
        }
    }
}

impl Default for ShopReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for ShopReducer {
    type State = ShopState;
    type Action = ShopAction;
    type Environment = ShopEnvironment;

    fn reduce(
        &self,
        state: &mut ShopState,
        action: ShopAction,
        env: &ShopEnvironment,
    ) -> SmallVec<[Effect<ShopAction>; 4]> {
        self.inner.reduce(state, action, env)
    }
}

/// Start a fresh session store
#[must_use]
pub fn new_session(env: ShopEnvironment) -> ShopStore {
    Store::new(ShopState::default(), ShopReducer::new(), env)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::CartItem;
    use crate::catalog;
    use crate::services::orders::tests::customer;
    use crate::services::OrderService;
    use crate::types::{PaymentMethod, PaymentStatus};
    use std::sync::Arc;
    use std::time::Duration;
    use wedding_testing::{test_clock, InMemoryDocumentStore, MockCardGateway, MockWalletGateway};

    const WAIT: Duration = Duration::from_secs(5);

    fn env(docs: &InMemoryDocumentStore) -> ShopEnvironment {
        ShopEnvironment {
            checkout: CheckoutEnvironment {
                orders: OrderService::new(Arc::new(docs.clone()), Arc::new(test_clock())),
                card: Arc::new(MockCardGateway::new()),
                wallet: Arc::new(MockWalletGateway::new()),
                currency: "NGN".into(),
                public_base_url: "http://localhost:8080".into(),
            },
        }
    }

    fn add(id: u32, quantity: u32) -> ShopAction {
        let item = catalog::find(id).unwrap();
        ShopAction::Cart(CartAction::Add(CartItem::from_catalog(
            item,
            item.sizes[0],
            item.colors[0],
            quantity,
        )))
    }

    fn outcome(action: &ShopAction) -> bool {
        matches!(action, ShopAction::Checkout(a) if a.is_checkout_outcome())
    }

    #[tokio::test]
    async fn paid_checkout_empties_the_cart() {
        let docs = InMemoryDocumentStore::new();
        let store = new_session(env(&docs));

        store.send(add(1, 1)).await.unwrap();
        store.send(add(5, 2)).await.unwrap();
        store
            .send(ShopAction::Checkout(CheckoutAction::SetCustomerInfo(customer())))
            .await
            .unwrap();
        store
            .send(ShopAction::Checkout(CheckoutAction::SelectPaymentMethod(PaymentMethod::Card)))
            .await
            .unwrap();
        assert_eq!(store.state(|s| s.checkout.line_items.len()).await, 2);

        let ready = store
            .send_and_wait_for(ShopAction::Checkout(CheckoutAction::Pay), outcome, WAIT)
            .await
            .unwrap();
        assert!(matches!(ready, ShopAction::Checkout(CheckoutAction::CardIntentCreated { .. })));

        let settled = store
            .send_and_wait_for(
                ShopAction::Checkout(CheckoutAction::ConfirmCard {
                    payment_method: "pm_card_visa".into(),
                }),
                outcome,
                WAIT,
            )
            .await
            .unwrap();
        assert!(matches!(
            settled,
            ShopAction::Checkout(CheckoutAction::PaymentSettled { succeeded: true, .. })
        ));

        let state = store.state(Clone::clone).await;
        assert!(state.cart.is_empty());
        assert_eq!(state.cart.total_amount, 0);
        assert_eq!(state.checkout.phase, PaymentPhase::Completed);

        let order_id = state.checkout.completed_order_id.unwrap();
        let order = env(&docs).checkout.orders.get(&order_id).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Completed);
        assert_eq!(order.total_amount, 4_500_000 + 2 * 1_500_000);
    }

    #[tokio::test]
    async fn lines_added_while_paying_stay_in_the_cart() {
        let docs = InMemoryDocumentStore::new();
        let store = new_session(env(&docs));

        store.send(add(1, 1)).await.unwrap();
        store
            .send(ShopAction::Checkout(CheckoutAction::SetCustomerInfo(customer())))
            .await
            .unwrap();
        store
            .send(ShopAction::Checkout(CheckoutAction::SelectPaymentMethod(PaymentMethod::Card)))
            .await
            .unwrap();
        store
            .send_and_wait_for(ShopAction::Checkout(CheckoutAction::Pay), outcome, WAIT)
            .await
            .unwrap();

        // Added after the order was written: one more gown and a new line
        store.send(add(1, 1)).await.unwrap();
        store.send(add(5, 2)).await.unwrap();

        store
            .send_and_wait_for(
                ShopAction::Checkout(CheckoutAction::ConfirmCard {
                    payment_method: "pm_card_visa".into(),
                }),
                outcome,
                WAIT,
            )
            .await
            .unwrap();

        let state = store.state(Clone::clone).await;
        assert_eq!(state.checkout.phase, PaymentPhase::Completed);
        let left: Vec<(u32, u32)> = state
            .cart
            .items
            .iter()
            .map(|line| (line.catalog_item_id, line.quantity))
            .collect();
        assert_eq!(left, vec![(1, 1), (5, 2)]);

        let order_id = state.checkout.completed_order_id.unwrap();
        let order = env(&docs).checkout.orders.get(&order_id).await.unwrap().unwrap();
        assert_eq!(order.total_amount, 4_500_000);
    }

    #[tokio::test]
    async fn cart_changes_reach_the_checkout_on_its_next_action() {
        let docs = InMemoryDocumentStore::new();
        let store = new_session(env(&docs));

        store
            .send(ShopAction::Checkout(CheckoutAction::SetCustomerInfo(customer())))
            .await
            .unwrap();
        store.send(add(2, 1)).await.unwrap();
        assert!(store.state(|s| s.checkout.line_items.is_empty()).await);

        store
            .send(ShopAction::Checkout(CheckoutAction::SelectPaymentMethod(PaymentMethod::Wallet)))
            .await
            .unwrap();
        let checkout = store.state(|s| s.checkout.clone()).await;
        assert_eq!(checkout.line_items.len(), 1);
        assert_eq!(checkout.payment_method, Some(PaymentMethod::Wallet));
    }
}
