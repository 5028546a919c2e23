use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A priced, quantity-limited admission type for one event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub sold_count: i32,
    pub event_id: i64,
}

impl Ticket {
    pub fn remaining(&self) -> i32 {
        (self.quantity - self.sold_count).max(0)
    }

    pub fn is_sold_out(&self) -> bool {
        self.sold_count >= self.quantity
    }
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}
