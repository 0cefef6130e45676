//! Index constituent listing, paged from the Sina market center.
//!
//! Pages are requested in order until one comes back empty. The listing is
//! deduplicated by ticker and normalized from native symbols (`sh600000`)
//! into exchange-qualified tickers (`600000.SS`).

use super::client::SourceClient;
use super::error::FetchError;
use super::fields::first_str;
use crate::domain::{ticker_from_native, Instrument};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

const NODE_DATA_URL: &str =
    "https://vip.stock.finance.sina.com.cn/quotes_service/api/json_v2.php/Market_Center.getHQNodeData";

const SYMBOL_FIELDS: &[&str] = &["symbol"];
const NAME_FIELDS: &[&str] = &["name"];

/// Substituted when the listing yields nothing, so later stages still run.
pub const SEED_UNIVERSE: [(&str, &str); 3] = [
    ("000001.SZ", "平安银行"),
    ("600036.SS", "招商银行"),
    ("600519.SS", "贵州茅台"),
];

/// Which index to list and how to pace the paging.
#[derive(Debug, Clone)]
pub struct IndexListing {
    pub node: String,
    pub page_size: u32,
    /// Pause between successful pages.
    pub page_pause: Duration,
    /// Pause before the single re-try of a failed page.
    pub retry_pause: Duration,
}

impl Default for IndexListing {
    fn default() -> Self {
        Self {
            node: "hs300".into(),
            page_size: 80,
            page_pause: Duration::from_millis(200),
            retry_pause: Duration::from_secs(1),
        }
    }
}

/// The instrument set a run works through.
#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    pub instruments: Vec<Instrument>,
    /// True when the listing failed and the seed list was substituted.
    pub from_seed: bool,
}

impl Universe {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self {
            instruments,
            from_seed: false,
        }
    }

    pub fn seed() -> Self {
        Self {
            instruments: SEED_UNIVERSE
                .iter()
                .map(|(t, n)| Instrument::new(*t, *n))
                .collect(),
            from_seed: true,
        }
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.instruments.iter().map(|i| i.ticker.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

pub struct UniversePager<'a> {
    client: &'a dyn SourceClient,
    listing: IndexListing,
}

impl<'a> UniversePager<'a> {
    pub fn new(client: &'a dyn SourceClient, listing: IndexListing) -> Self {
        Self { client, listing }
    }

    pub fn page_url(&self, page: u32) -> Result<Url, FetchError> {
        Ok(Url::parse_with_params(
            NODE_DATA_URL,
            &[
                ("page", page.to_string()),
                ("num", self.listing.page_size.to_string()),
                ("node", self.listing.node.clone()),
                ("sort", "symbol".to_string()),
                ("asc", "1".to_string()),
            ],
        )?)
    }

    /// One page of raw listing rows. A body that is not a JSON array counts
    /// as an empty page.
    fn fetch_page(&self, page: u32) -> Result<Vec<Value>, FetchError> {
        let text = self.client.get_text(&self.page_url(page)?)?;
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(Value::Array(rows)) => Ok(rows),
            _ => Ok(Vec::new()),
        }
    }

    /// Walk the listing. A failed page gets exactly one more try after
    /// `retry_pause`; a second failure ends the walk with what was gathered.
    pub fn enumerate(&self) -> Universe {
        let mut instruments = Vec::new();
        let mut seen = HashSet::new();
        let mut page = 1u32;

        loop {
            let rows = match self.fetch_page(page) {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(node = %self.listing.node, page, error = %e, "listing page failed, retrying once");
                    std::thread::sleep(self.listing.retry_pause);
                    match self.fetch_page(page) {
                        Ok(rows) => rows,
                        Err(e) => {
                            warn!(node = %self.listing.node, page, error = %e, "listing page failed again, stopping early");
                            break;
                        }
                    }
                }
            };
            if rows.is_empty() {
                break;
            }

            for row in &rows {
                let symbol = first_str(row, SYMBOL_FIELDS)
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                let Some(ticker) = ticker_from_native(&symbol) else {
                    continue;
                };
                if seen.insert(ticker.clone()) {
                    let name = first_str(row, NAME_FIELDS)
                        .map(|n| n.trim().to_string())
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| ticker.clone());
                    instruments.push(Instrument::new(ticker, name));
                }
            }
            info!(page, rows = rows.len(), total = instruments.len(), "listing page fetched");

            page += 1;
            std::thread::sleep(self.listing.page_pause);
        }

        if instruments.is_empty() {
            warn!(node = %self.listing.node, "listing returned nothing, using seed universe");
            return Universe::seed();
        }
        Universe::new(instruments)
    }
}
