//! Simulator position state.

/// Single-asset, all-in/all-out holding. Outside a trade boundary exactly
/// one of `quantity` and `cash` is non-zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub quantity: f64,
    pub cash: f64,
}

impl Position {
    pub fn new(cash: f64) -> Self {
        Position {
            quantity: 0.0,
            cash,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    /// Mark-to-market value at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.quantity * price
    }
}
