use crate::value_objects::side::Side;
use serde::{Deserialize, Serialize};

/// Why a sized order differs from what the raw action asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingNote {
    LeverageClamped,
    PositionLimitClamped,
    DegenerateStop,
    FlattenBeforeReverse,
    ShortDisabled,
    NoCapital,
    AffordabilityClamped,
}

impl SizingNote {
    /// Notes that mean the quantity was reduced rather than just annotated.
    pub fn is_clamp(self) -> bool {
        matches!(
            self,
            SizingNote::LeverageClamped
                | SizingNote::PositionLimitClamped
                | SizingNote::AffordabilityClamped
        )
    }
}

/// Risk-bounded instruction derived from a raw action. Lives for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizedOrder {
    /// `None` iff `quantity == 0`.
    pub side: Option<Side>,
    pub quantity: f64,
    pub stop_loss_price: Option<f64>,
    pub notes: Vec<SizingNote>,
}

impl SizedOrder {
    pub fn none() -> Self {
        Self {
            side: None,
            quantity: 0.0,
            stop_loss_price: None,
            notes: Vec::new(),
        }
    }

    pub fn none_with(note: SizingNote) -> Self {
        Self {
            notes: vec![note],
            ..Self::none()
        }
    }

    pub fn new(side: Side, quantity: f64, stop_loss_price: Option<f64>) -> Self {
        if quantity <= 0.0 || !quantity.is_finite() {
            return Self::none();
        }
        Self {
            side: Some(side),
            quantity,
            stop_loss_price,
            notes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.side.is_none()
    }

    /// Position change this order produces: positive for buys, negative for sells.
    pub fn signed_quantity(&self) -> f64 {
        match self.side {
            Some(side) => side.sign() * self.quantity,
            None => 0.0,
        }
    }

    pub fn note(&mut self, note: SizingNote) {
        if !self.notes.contains(&note) {
            self.notes.push(note);
        }
    }

    pub fn was_clamped(&self) -> bool {
        self.notes.iter().any(|n| n.is_clamp())
    }

    /// Shrinks the order to `quantity`, dropping it entirely when nothing is left.
    pub fn clamp_to(&mut self, quantity: f64, note: SizingNote) {
        if quantity >= self.quantity {
            return;
        }
        self.note(note);
        if quantity <= 0.0 {
            self.side = None;
            self.quantity = 0.0;
            self.stop_loss_price = None;
        } else {
            self.quantity = quantity;
        }
    }
}
