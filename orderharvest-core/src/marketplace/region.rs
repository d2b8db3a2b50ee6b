//! Supported marketplaces and their Selling Partner API endpoints.

use serde::Serialize;
use std::fmt;

/// Selling Partner API region. Each region has its own endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Region {
    NorthAmerica,
    Europe,
    FarEast,
}

impl Region {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "https://sellingpartnerapi-na.amazon.com",
            Region::Europe => "https://sellingpartnerapi-eu.amazon.com",
            Region::FarEast => "https://sellingpartnerapi-fe.amazon.com",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::NorthAmerica => "NA",
            Region::Europe => "EU",
            Region::FarEast => "FE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Marketplace {
    /// ISO country code used to select the marketplace.
    pub country: &'static str,
    /// Marketplace identifier sent as `MarketplaceIds`.
    pub id: &'static str,
    pub region: Region,
}

pub const MARKETPLACES: &[Marketplace] = &[
    Marketplace { country: "CA", id: "A2EUQ1WTGCTBG2", region: Region::NorthAmerica },
    Marketplace { country: "US", id: "ATVPDKIKX0DER", region: Region::NorthAmerica },
    Marketplace { country: "MX", id: "A1AM78C64UM0Y8", region: Region::NorthAmerica },
    Marketplace { country: "BR", id: "A2Q3Y263D00KWC", region: Region::NorthAmerica },
    Marketplace { country: "ES", id: "A1RKKUPIHCS9HS", region: Region::Europe },
    Marketplace { country: "GB", id: "A1F83G8C2ARO7P", region: Region::Europe },
    Marketplace { country: "FR", id: "A13V1IB3VIYZZH", region: Region::Europe },
    Marketplace { country: "BE", id: "AMEN7PMS3EDWL", region: Region::Europe },
    Marketplace { country: "NL", id: "A1805IZSGTT6HS", region: Region::Europe },
    Marketplace { country: "DE", id: "A1PA6795UKMFR9", region: Region::Europe },
    Marketplace { country: "IT", id: "APJ6JRA9NG5V4", region: Region::Europe },
    Marketplace { country: "SE", id: "A2NODRKZP88ZB9", region: Region::Europe },
    Marketplace { country: "ZA", id: "AE08WJ6YKNBMC", region: Region::Europe },
    Marketplace { country: "PL", id: "A1C3SOZRARQ6R3", region: Region::Europe },
    Marketplace { country: "EG", id: "ARBP9OOSHTCHU", region: Region::Europe },
    Marketplace { country: "TR", id: "A33AVAJ2PDY3EV", region: Region::Europe },
    Marketplace { country: "SA", id: "A17E79C6D8DWNP", region: Region::Europe },
    Marketplace { country: "AE", id: "A2VIGQ35RCS4UG", region: Region::Europe },
    Marketplace { country: "IN", id: "A21TJRUUN4KGV", region: Region::Europe },
    Marketplace { country: "SG", id: "A19VAU5U5O7RUS", region: Region::FarEast },
    Marketplace { country: "AU", id: "A39IBJ37TRP1C6", region: Region::FarEast },
    Marketplace { country: "JP", id: "A1VC38T7YXB528", region: Region::FarEast },
];

/// Find a marketplace by country code, case-insensitively. `UK` maps to `GB`.
pub fn lookup_marketplace(code: &str) -> Option<&'static Marketplace> {
    let code = code.trim();
    let code = if code.eq_ignore_ascii_case("UK") { "GB" } else { code };
    MARKETPLACES
        .iter()
        .find(|m| m.country.eq_ignore_ascii_case(code))
}
