//! Cart and customer context for the checkout flow.
//!
//! The browsing client used to keep the cart and the signed-in user in
//! one page-global store. Here they are two plain values owned by the
//! caller and passed through the checkout call chain explicitly:
//! [`Cart`] accumulates line items, [`CustomerProfile`] carries contact
//! details and the loyalty discount, and [`Cart::checkout_request`]
//! folds both into the create-order request the lifecycle service
//! accepts. No shared state, no HTTP surface of its own.

use crate::core::order::{LineItem, discount_amount};
use crate::orders::{CreateOrderRequest, CustomerRequest};

/// Discount granted to signed-in customers.
pub const REGISTERED_DISCOUNT_PERCENT: u8 = 10;

/// An in-progress order. Lines are keyed by (name, variation, price):
/// adding the same dish in the same variation again bumps the quantity
/// instead of appending a duplicate row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: LineItem) {
        if item.quantity == 0 {
            return;
        }
        match self.position(&item.name, item.variation.as_deref(), item.price) {
            Some(i) => self.lines[i].quantity += item.quantity,
            None => self.lines.push(item),
        }
    }

    /// Set the quantity of an existing line; 0 removes it. Lines that are
    /// not in the cart are left untouched.
    pub fn update_quantity(&mut self, name: &str, variation: Option<&str>, quantity: u32) {
        let Some(i) = self
            .lines
            .iter()
            .position(|l| l.name == name && l.variation.as_deref() == variation)
        else {
            return;
        };
        if quantity == 0 {
            self.lines.remove(i);
        } else {
            self.lines[i].quantity = quantity;
        }
    }

    pub fn remove(&mut self, name: &str, variation: Option<&str>) {
        self.lines
            .retain(|l| !(l.name == name && l.variation.as_deref() == variation));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn subtotal(&self) -> i64 {
        self.lines.iter().map(LineItem::line_total).sum()
    }

    /// Total after the profile's discount, as the checkout screen shows it.
    pub fn total_for(&self, customer: &CustomerProfile) -> i64 {
        let subtotal = self.subtotal();
        subtotal - discount_amount(subtotal, customer.discount_percent)
    }

    /// Assemble the create-order request for this cart and customer. The
    /// declared total is the one shown to the customer, which the service
    /// re-derives and cross-checks on its side.
    pub fn checkout_request(&self, customer: &CustomerProfile) -> CreateOrderRequest {
        CreateOrderRequest {
            items: self.lines.clone(),
            total: self.total_for(customer),
            customer: CustomerRequest {
                name: customer.name.clone(),
                email: customer.email.clone(),
                phone: customer.phone.clone(),
                discount_percent: customer.discount_percent,
            },
        }
    }

    fn position(&self, name: &str, variation: Option<&str>, price: i64) -> Option<usize> {
        self.lines.iter().position(|l| {
            l.name == name && l.variation.as_deref() == variation && l.price == price
        })
    }
}

/// Who is checking out. Guests carry no discount; registered customers
/// get [`REGISTERED_DISCOUNT_PERCENT`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub discount_percent: u8,
}

impl CustomerProfile {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn registered(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            phone: None,
            discount_percent: REGISTERED_DISCOUNT_PERCENT,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}
