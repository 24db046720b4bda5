use serde::{Deserialize, Serialize};

use crate::domain::DrinkKind;

/// Which drinks an offer is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "applies_to", content = "kind")]
pub enum PromotionTarget {
    /// Offers relevant to a single kind.
    Kind(DrinkKind),
    /// Offers relevant whatever the user drinks.
    All,
}

impl PromotionTarget {
    /// The target matching a most-consumed kind.
    ///
    /// When nothing has been consumed, wildcard offers are the relevant ones.
    #[must_use]
    pub fn for_kind(kind: Option<DrinkKind>) -> Self {
        kind.map_or(Self::All, Self::Kind)
    }
}

/// A static promotional offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionOffer {
    /// Identifier within the catalogue.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Longer description of the offer.
    pub description: String,
    /// Drinks the offer relates to.
    pub target: PromotionTarget,
    /// Whether the offer can currently be redeemed.
    pub active: bool,
    /// Redemption code.
    pub code: String,
    /// Image reference for display.
    pub image: String,
    /// The brand running the offer.
    pub brand: String,
}

/// The built-in offer catalogue.
#[must_use]
pub fn seed_promotions() -> Vec<PromotionOffer> {
    vec![
        PromotionOffer {
            id: "1".to_string(),
            title: "Craft 0.0% beer discount".to_string(),
            description: "All the flavour without the effects. 20% off your first order."
                .to_string(),
            target: PromotionTarget::Kind(DrinkKind::Beer),
            active: true,
            code: "MODERA20".to_string(),
            image: "https://picsum.photos/seed/beer0/400/200".to_string(),
            brand: "Free Brewing Co.".to_string(),
        },
        PromotionOffer {
            id: "2".to_string(),
            title: "2-for-1 mocktails at Central Bar".to_string(),
            description: "Show this code for 2-for-1 on the whole signature mocktail menu."
                .to_string(),
            target: PromotionTarget::Kind(DrinkKind::Mocktail),
            active: true,
            code: "MOCKTAIL2X1".to_string(),
            image: "https://picsum.photos/seed/mocktail/400/200".to_string(),
            brand: "Central Bar".to_string(),
        },
        PromotionOffer {
            id: "3".to_string(),
            title: "Premium kombucha subscription".to_string(),
            description: "A healthy, tasty alternative. 15% off your monthly subscription."
                .to_string(),
            target: PromotionTarget::All,
            active: true,
            code: "VIDA15".to_string(),
            image: "https://picsum.photos/seed/kombucha/400/200".to_string(),
            brand: "VidaKombucha".to_string(),
        },
        PromotionOffer {
            id: "4".to_string(),
            title: "De-alcoholised wine tasting".to_string(),
            description: "Discover alcohol-free wine. 2-for-1 entry this weekend.".to_string(),
            target: PromotionTarget::Kind(DrinkKind::Wine),
            active: true,
            code: "VINO00".to_string(),
            image: "https://picsum.photos/seed/wine0/400/200".to_string(),
            brand: "Clear Vineyard".to_string(),
        },
    ]
}

/// Order offers so that those matching `most_consumed` come first.
///
/// This is a stable partition: relative order is preserved within the
/// matching and the non-matching groups.
#[must_use]
pub fn rank_promotions<'a>(
    offers: &'a [PromotionOffer],
    most_consumed: Option<DrinkKind>,
) -> Vec<&'a PromotionOffer> {
    let target = PromotionTarget::for_kind(most_consumed);
    let (mut matching, rest): (Vec<_>, Vec<_>) =
        offers.iter().partition(|offer| offer.target == target);
    matching.extend(rest);
    matching
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(offers: &[&PromotionOffer]) -> Vec<String> {
        offers.iter().map(|offer| offer.id.clone()).collect()
    }

    #[test]
    fn matching_offers_come_first() {
        let offers = seed_promotions();
        let ranked = rank_promotions(&offers, Some(DrinkKind::Wine));
        assert_eq!(ids(&ranked), ["4", "1", "2", "3"]);
    }

    #[test]
    fn ranking_is_stable_among_both_groups() {
        let mut offers = seed_promotions();
        offers[2].target = PromotionTarget::Kind(DrinkKind::Beer);
        let ranked = rank_promotions(&offers, Some(DrinkKind::Beer));
        assert_eq!(ids(&ranked), ["1", "3", "2", "4"]);
    }

    #[test]
    fn no_consumption_promotes_wildcard_offers() {
        let offers = seed_promotions();
        let ranked = rank_promotions(&offers, None);
        assert_eq!(ids(&ranked), ["3", "1", "2", "4"]);
    }

    #[test]
    fn unmatched_kind_keeps_catalogue_order() {
        let offers = seed_promotions();
        let ranked = rank_promotions(&offers, Some(DrinkKind::Amaro));
        assert_eq!(ids(&ranked), ["1", "2", "3", "4"]);
    }

    #[test]
    fn target_serializes_with_tag() {
        let json = serde_json::to_string(&PromotionTarget::Kind(DrinkKind::Beer)).unwrap();
        assert_eq!(json, r#"{"applies_to":"kind","kind":"beer"}"#);
        let json = serde_json::to_string(&PromotionTarget::All).unwrap();
        assert_eq!(json, r#"{"applies_to":"all"}"#);
    }
}
