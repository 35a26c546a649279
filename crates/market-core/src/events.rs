//! Random market news events.

use serde::{Deserialize, Serialize};

use crate::commodities::CommodityId;

/// Directional effect of a news event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventEffect {
    Bullish,
    Bearish,
    MegaBullish,
    MegaBearish,
    /// No price effect; ticker noise.
    Flavor,
}

impl EventEffect {
    /// Whether the event moves a price at all.
    pub fn moves_price(self) -> bool {
        !matches!(self, EventEffect::Flavor)
    }

    /// Whether the shock pushes the price upward.
    pub fn is_bullish(self) -> bool {
        matches!(self, EventEffect::Bullish | EventEffect::MegaBullish)
    }
}

/// Static definition for one market event.
#[derive(Clone, Debug)]
pub struct MarketEventDef {
    /// News ticker text.
    pub text: &'static str,
    /// Directional effect.
    pub effect: EventEffect,
    /// Primary affected commodity; None for flavor events.
    pub target: Option<CommodityId>,
    /// Secondary affected commodity; mega events only.
    pub secondary: Option<CommodityId>,
    /// Fractional price shock magnitude.
    pub magnitude: f64,
    /// Scales the gap until the next event; big stories linger.
    pub duration_multiplier: f64,
}

const fn bullish(text: &'static str, target: CommodityId, magnitude: f64) -> MarketEventDef {
    MarketEventDef {
        text,
        effect: EventEffect::Bullish,
        target: Some(target),
        secondary: None,
        magnitude,
        duration_multiplier: 1.0,
    }
}

const fn bearish(text: &'static str, target: CommodityId, magnitude: f64) -> MarketEventDef {
    MarketEventDef {
        text,
        effect: EventEffect::Bearish,
        target: Some(target),
        secondary: None,
        magnitude,
        duration_multiplier: 1.0,
    }
}

const fn flavor(text: &'static str) -> MarketEventDef {
    MarketEventDef {
        text,
        effect: EventEffect::Flavor,
        target: None,
        secondary: None,
        magnitude: 0.0,
        duration_multiplier: 1.0,
    }
}

const fn mega(
    text: &'static str,
    effect: EventEffect,
    target: CommodityId,
    secondary: CommodityId,
    magnitude: f64,
    duration_multiplier: f64,
) -> MarketEventDef {
    MarketEventDef {
        text,
        effect,
        target: Some(target),
        secondary: Some(secondary),
        magnitude,
        duration_multiplier,
    }
}

/// All market events. Events targeting locked commodities are filtered out
/// at pick time.
pub const MARKET_EVENTS: &[MarketEventDef] = &[
    bullish(
        "ADVISORY: Email database demand forecast revised upward for Q4",
        CommodityId::Email,
        0.25,
    ),
    bullish(
        "REPORT: Independent analysts rate .com Domains a STRONG BUY",
        CommodityId::Dom,
        0.3,
    ),
    bullish(
        "BREAKING: Major corporation announces Bandwidth acquisition plan",
        CommodityId::Bw,
        0.2,
    ),
    bullish(
        "PRESS RELEASE: Government contract awarded for Software procurement",
        CommodityId::Soft,
        0.2,
    ),
    bullish(
        "NOTICE: Domain name registrations exceed 2 million. Supply limited.",
        CommodityId::Dom,
        0.2,
    ),
    bullish(
        "MARKET UPDATE: Bandwidth supply shortage reported by distributors",
        CommodityId::Bw,
        0.25,
    ),
    bullish(
        "BULLETIN: Venture Capital fundraising up 200% quarter-over-quarter",
        CommodityId::Vc,
        0.35,
    ),
    bullish(
        "ADVISORY: Email list quality standards tightened. Premium lists in demand.",
        CommodityId::Email,
        0.2,
    ),
    bullish(
        "REPORT: Banner ad click-through rates surpass industry projections",
        CommodityId::Ads,
        0.25,
    ),
    bullish(
        "BREAKING: Y2K compliance drives enterprise software demand",
        CommodityId::Soft,
        0.25,
    ),
    bearish(
        "WARNING: Banner Impression oversupply detected in secondary markets",
        CommodityId::Ads,
        0.25,
    ),
    bearish(
        "NOTICE: Regulatory review announced for Venture Capital trading",
        CommodityId::Vc,
        0.3,
    ),
    bearish(
        "ALERT: Software License quality concerns raised by industry watchdog",
        CommodityId::Soft,
        0.2,
    ),
    bearish(
        "UPDATE: Major Bandwidth supplier announces price reduction",
        CommodityId::Bw,
        0.2,
    ),
    bearish(
        "BULLETIN: Consumer demand for .com Domains below seasonal expectations",
        CommodityId::Dom,
        0.2,
    ),
    bearish(
        "ADVISORY: Email database accuracy rates under investigation",
        CommodityId::Email,
        0.25,
    ),
    bearish(
        "REPORT: Banner ad click-through rates declining industry-wide",
        CommodityId::Ads,
        0.2,
    ),
    bearish(
        "WARNING: Offshore development firms under regulatory scrutiny",
        CommodityId::Soft,
        0.15,
    ),
    bearish(
        "ALERT: Domain name speculation bubble concerns raised by analysts",
        CommodityId::Dom,
        0.25,
    ),
    bearish(
        "NOTICE: SEC opens inquiry into Venture Capital fund practices",
        CommodityId::Vc,
        0.35,
    ),
    flavor("SYSTEM: Market terminal connection stable. 28.8 kbps."),
    flavor("REMINDER: Past performance does not guarantee future results."),
    flavor("NOTICE: Trading hours extended through midnight EST."),
    flavor("SYSTEM: Price data refreshed. Connection OK."),
    flavor("DISCLAIMER: This terminal is provided as-is. No warranty expressed or implied."),
    flavor("TIP: Diversified portfolios reduce exposure to market volatility."),
    flavor("SYSTEM: Stable connection maintained. All systems operational."),
    flavor("TIP: Strong bonds yield better returns."),
    flavor("NOTICE: Adhesive futures trading volume up 15% quarter-over-quarter."),
    bullish(
        "ADVISORY: Livestock futures surge on record export deal with Pacific Rim",
        CommodityId::Live,
        0.25,
    ),
    bullish(
        "REPORT: Cattle ranching subsidies expanded. Livestock supply costs drop.",
        CommodityId::Live,
        0.2,
    ),
    bullish(
        "BREAKING: Industrial adhesive demand booms amid construction surge",
        CommodityId::Glue,
        0.25,
    ),
    bullish(
        "MARKET UPDATE: Glue stockpiles at historic lows. Buyers scramble.",
        CommodityId::Glue,
        0.3,
    ),
    bearish(
        "WARNING: Mad cow scare tanks livestock markets across all exchanges",
        CommodityId::Live,
        0.3,
    ),
    bearish(
        "ALERT: Livestock feed costs spike. Ranchers report negative margins.",
        CommodityId::Live,
        0.2,
    ),
    bearish(
        "NOTICE: Synthetic alternatives threaten traditional glue market share",
        CommodityId::Glue,
        0.25,
    ),
    bearish(
        "UPDATE: EPA regulations target rendering plant emissions. GLUE output falls.",
        CommodityId::Glue,
        0.2,
    ),
    bullish(
        "BREAKING: Bandwidth infrastructure bill passes. ISP capacity doubled.",
        CommodityId::Bw,
        0.35,
    ),
    bullish(
        "REPORT: VC-backed startups achieve record profitability ratios",
        CommodityId::Vc,
        0.25,
    ),
    bullish(
        "ADVISORY: Enterprise software migration wave creates supply crunch",
        CommodityId::Soft,
        0.3,
    ),
    bullish(
        "MARKET UPDATE: Premium .com domains appreciate 40% year-over-year",
        CommodityId::Dom,
        0.3,
    ),
    bullish(
        "BULLETIN: Programmatic ad exchanges report record CPM rates",
        CommodityId::Ads,
        0.2,
    ),
    bullish(
        "NOTICE: Email marketing ROI outpaces all digital channels",
        CommodityId::Email,
        0.3,
    ),
    bullish(
        "REPORT: Bandwidth futures contract trading volume hits all-time high",
        CommodityId::Bw,
        0.2,
    ),
    bearish(
        "ALERT: VC funding winter deepens. Series A deal volume plummets.",
        CommodityId::Vc,
        0.3,
    ),
    bearish(
        "WARNING: Open-source alternatives eroding Software License demand",
        CommodityId::Soft,
        0.25,
    ),
    bearish(
        "NOTICE: Bandwidth oversupply as fiber rollout accelerates globally",
        CommodityId::Bw,
        0.25,
    ),
    bearish(
        "UPDATE: Ad blockers reach 60% market penetration. ADS inventory questioned.",
        CommodityId::Ads,
        0.3,
    ),
    bearish(
        "ADVISORY: ICANN policy changes flood market with new domain TLDs",
        CommodityId::Dom,
        0.2,
    ),
    bearish(
        "REPORT: CAN-SPAM enforcement action targets bulk email operators",
        CommodityId::Email,
        0.3,
    ),
    bearish(
        "WARNING: Venture capital exits hit decade low. LP confidence shaken.",
        CommodityId::Vc,
        0.25,
    ),
    bearish(
        "ALERT: Enterprise software budget freeze announced by Fortune 500 consortium",
        CommodityId::Soft,
        0.2,
    ),
    mega(
        "BREAKING: Dot-com boom declared. Tech sector rallies across all commodities.",
        EventEffect::MegaBullish,
        CommodityId::Dom,
        CommodityId::Vc,
        0.4,
        1.5,
    ),
    mega(
        "CRISIS: Market-wide liquidity crunch. All trading desks report losses.",
        EventEffect::MegaBearish,
        CommodityId::Vc,
        CommodityId::Soft,
        0.35,
        1.5,
    ),
    mega(
        "BREAKING: Digital infrastructure spending surge. Bandwidth and Software soar.",
        EventEffect::MegaBullish,
        CommodityId::Bw,
        CommodityId::Soft,
        0.35,
        1.3,
    ),
    mega(
        "ALERT: Digital advertising recession. Ad and Email markets collapse together.",
        EventEffect::MegaBearish,
        CommodityId::Ads,
        CommodityId::Email,
        0.3,
        1.3,
    ),
    mega(
        "BREAKING: Agricultural-industrial complex booms. Livestock and Glue markets rally.",
        EventEffect::MegaBullish,
        CommodityId::Live,
        CommodityId::Glue,
        0.35,
        1.3,
    ),
    flavor("SYSTEM: Upgrading to 56k modem. Connection quality improving."),
    flavor("TIP: The best time to invest was yesterday. The second best time is now."),
    flavor("NOTICE: Market maker spread tightening initiative in effect."),
    flavor("REMINDER: Always read the prospectus before investing."),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_moving_events_have_targets() {
        for e in MARKET_EVENTS {
            if e.effect.moves_price() {
                assert!(e.target.is_some(), "{}", e.text);
                assert!(e.magnitude > 0.0 && e.magnitude < 1.0, "{}", e.text);
            } else {
                assert!(e.target.is_none(), "{}", e.text);
            }
        }
    }

    #[test]
    fn mega_events_have_secondaries() {
        for e in MARKET_EVENTS {
            let is_mega = matches!(
                e.effect,
                EventEffect::MegaBullish | EventEffect::MegaBearish
            );
            assert_eq!(e.secondary.is_some(), is_mega, "{}", e.text);
            if is_mega {
                assert!(e.duration_multiplier > 1.0, "{}", e.text);
            }
        }
    }
}
