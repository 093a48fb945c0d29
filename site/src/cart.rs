//! Shopping cart reducer.
//!
//! One cart per shopper session. The cart holds one line per distinct
//! (item, size, colour) and keeps its totals derived from the lines: every
//! mutation recomputes them from scratch.

use crate::catalog::{CatalogItem, Category};
use crate::types::OrderItem;
use serde::{Deserialize, Serialize};
use wedding_core::{smallvec, Effect, Reducer, SmallVec};

/// Most units a single line can hold
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Deterministic line id for an (item, size, colour) combination.
#[must_use]
pub fn cart_entry_id(catalog_item_id: u32, size: &str, color: &str) -> String {
    format!("{catalog_item_id}-{size}-{color}")
}

/// A line in the cart
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Catalog item id
    pub catalog_item_id: u32,
    /// Display name
    pub name: String,
    /// Price per unit in kobo
    pub unit_price: i64,
    /// Units, always at least 1 once in the cart
    pub quantity: u32,
    /// Chosen size
    pub size: String,
    /// Chosen colour
    pub color: String,
    /// Catalog section
    pub category: Category,
    /// Product image
    pub image: String,
    /// `{catalogItemId}-{size}-{color}`
    pub cart_entry_id: String,
}

impl CartItem {
    /// Build a line from a catalog entry.
    #[must_use]
    pub fn from_catalog(item: &CatalogItem, size: &str, color: &str, quantity: u32) -> Self {
        Self {
            catalog_item_id: item.id,
            name: item.name.to_string(),
            unit_price: item.price,
            quantity,
            size: size.to_string(),
            color: color.to_string(),
            category: item.category,
            image: item.image.to_string(),
            cart_entry_id: cart_entry_id(item.id, size, color),
        }
    }

    /// `unit_price * quantity`
    #[must_use]
    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }

    /// Snapshot for an order document.
    #[must_use]
    pub fn to_order_item(&self) -> OrderItem {
        OrderItem {
            id: self.catalog_item_id,
            name: self.name.clone(),
            unit_price: self.unit_price,
            quantity: self.quantity,
            size: self.size.clone(),
            color: self.color.clone(),
            category: self.category.as_str().to_string(),
            image: self.image.clone(),
        }
    }
}

/// Cart state with derived totals
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    /// Lines, in the order they were first added
    pub items: Vec<CartItem>,
    /// Whether the cart drawer is showing
    pub is_open: bool,
    /// Sum of line totals in kobo
    pub total_amount: i64,
    /// Sum of quantities
    pub total_items: u32,
}

impl CartState {
    /// Recompute the derived totals from the lines.
    pub fn recompute(&mut self) {
        self.total_amount = self
            .items
            .iter()
            .fold(0_i64, |total, item| total.saturating_add(item.line_total()));
        self.total_items = self
            .items
            .iter()
            .fold(0_u32, |total, item| total.saturating_add(item.quantity));
    }

    /// Whether there is nothing to buy.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line by entry id.
    #[must_use]
    pub fn entry(&self, cart_entry_id: &str) -> Option<&CartItem> {
        self.items
            .iter()
            .find(|item| item.cart_entry_id == cart_entry_id)
    }
}

/// Cart inputs
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartAction {
    /// Add units of an item; merges into an existing line for the same
    /// (item, size, colour). A quantity of 0 adds one unit; a line never
    /// holds more than [`MAX_LINE_QUANTITY`].
    Add(CartItem),
    /// Drop a line
    Remove {
        /// Line to drop
        cart_entry_id: String,
    },
    /// Set a line's quantity, capped at [`MAX_LINE_QUANTITY`]; zero or less
    /// drops the line
    SetQuantity {
        /// Line to change
        cart_entry_id: String,
        /// New quantity
        quantity: i64,
    },
    /// Take paid units out of the cart; lines left empty are dropped and
    /// anything added since the purchase stays
    RemovePurchased(Vec<CartItem>),
    /// Empty the cart
    Clear,
    /// Show the drawer
    Open,
    /// Hide the drawer
    Close,
    /// Flip the drawer
    Toggle,
}

/// Pure cart reducer; produces no effects
#[derive(Clone, Copy, Debug, Default)]
pub struct CartReducer;

impl CartReducer {
    /// Create a cart reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut CartState,
        action: CartAction,
        _env: &(),
    ) -> SmallVec<[Effect<CartAction>; 4]> {
        match action {
            CartAction::Add(mut item) => {
                let added = item.quantity.clamp(1, MAX_LINE_QUANTITY);
                item.cart_entry_id = cart_entry_id(item.catalog_item_id, &item.size, &item.color);

                if let Some(existing) = state
                    .items
                    .iter_mut()
                    .find(|line| line.cart_entry_id == item.cart_entry_id)
                {
                    existing.quantity = existing.quantity.saturating_add(added).min(MAX_LINE_QUANTITY);
                } else {
                    item.quantity = added;
                    state.items.push(item);
                }
            },
            CartAction::Remove { cart_entry_id } => {
                state
                    .items
                    .retain(|line| line.cart_entry_id != cart_entry_id);
            },
            CartAction::SetQuantity {
                cart_entry_id,
                quantity,
            } => {
                if quantity <= 0 {
                    state
                        .items
                        .retain(|line| line.cart_entry_id != cart_entry_id);
                } else if let Some(line) = state
                    .items
                    .iter_mut()
                    .find(|line| line.cart_entry_id == cart_entry_id)
                {
                    line.quantity = u32::try_from(quantity)
                        .unwrap_or(u32::MAX)
                        .min(MAX_LINE_QUANTITY);
                }
            },
            CartAction::RemovePurchased(purchased) => {
                for paid in &purchased {
                    if let Some(line) = state
                        .items
                        .iter_mut()
                        .find(|line| line.cart_entry_id == paid.cart_entry_id)
                    {
                        line.quantity = line.quantity.saturating_sub(paid.quantity);
                    }
                }
                state.items.retain(|line| line.quantity > 0);
            },
            CartAction::Clear => state.items.clear(),
            CartAction::Open => state.is_open = true,
            CartAction::Close => state.is_open = false,
            CartAction::Toggle => state.is_open = !state.is_open,
        }

        state.recompute();
        smallvec![Effect::None]
    }
}
