//! Automated opponent with a fixed acceptance threshold

use super::types::Offer;

/// Accepts any offer that leaves it at least `min_share`, and when it has to
/// propose, keeps exactly what would leave the other side `min_share`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThresholdResponder {
    min_share: u32,
}

impl ThresholdResponder {
    pub fn new(min_share: u32) -> Self {
        Self { min_share }
    }

    pub fn min_share(&self) -> u32 {
        self.min_share
    }

    /// Whether to accept `offer` out of a pie of `total_share`
    pub fn accepts(&self, offer: &Offer, total_share: u32) -> bool {
        total_share.saturating_sub(offer.amount_kept) >= self.min_share
    }

    /// Amount to keep when making an offer
    pub fn proposal(&self, total_share: u32) -> u32 {
        total_share.saturating_sub(self.min_share)
    }
}

impl Default for ThresholdResponder {
    fn default() -> Self {
        Self::new(30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Player;

    fn offer(kept: u32) -> Offer {
        Offer {
            offering_player: Player::Player1,
            amount_kept: kept,
        }
    }

    #[test]
    fn test_threshold_boundary() {
        let bot = ThresholdResponder::new(30);

        assert!(bot.accepts(&offer(70), 100));
        assert!(bot.accepts(&offer(50), 100));
        assert!(!bot.accepts(&offer(71), 100));
    }

    #[test]
    fn test_proposal() {
        assert_eq!(ThresholdResponder::new(30).proposal(100), 70);
        // Threshold above the pie: keep nothing
        assert_eq!(ThresholdResponder::new(150).proposal(100), 0);
    }

    #[test]
    fn test_bot_accepts_its_own_kind_of_offer() {
        let bot = ThresholdResponder::default();
        let kept = bot.proposal(100);
        assert!(bot.accepts(&offer(kept), 100));
    }
}
