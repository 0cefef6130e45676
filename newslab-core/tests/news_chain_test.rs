//! News source chain against a scripted transport.
//!
//! The fake client answers by exact URL; anything unscripted gets the
//! fallback body (or a connection error when none is set).

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;
use newslab_core::data::{FetchError, RetryPolicy, SourceClient};
use newslab_core::domain::Instrument;
use newslab_core::news::{ChainSettings, EastmoneySearch, NewsSource, NewsSourceChain, SinaCompanyNews};
use url::Url;

#[derive(Default)]
struct ScriptedClient {
    responses: HashMap<String, Vec<Result<String, FetchError>>>,
    fallback: Option<String>,
    requested: RefCell<Vec<String>>,
    cursor: RefCell<HashMap<String, usize>>,
}

impl ScriptedClient {
    fn with_fallback(body: &str) -> Self {
        Self {
            fallback: Some(body.to_string()),
            ..Self::default()
        }
    }

    /// Successive requests for `url` get successive entries; the last repeats.
    fn script(&mut self, url: &Url, replies: Vec<Result<String, FetchError>>) {
        self.responses.insert(url.to_string(), replies);
    }

    fn requests_to(&self, host_fragment: &str) -> usize {
        self.requested
            .borrow()
            .iter()
            .filter(|u| u.contains(host_fragment))
            .count()
    }
}

impl SourceClient for ScriptedClient {
    fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        let key = url.to_string();
        self.requested.borrow_mut().push(key.clone());
        if let Some(replies) = self.responses.get(&key) {
            let mut cursor = self.cursor.borrow_mut();
            let idx = cursor.entry(key).or_insert(0);
            let reply = &replies[(*idx).min(replies.len() - 1)];
            *idx += 1;
            return match reply {
                Ok(body) => Ok(body.clone()),
                Err(e) => Err(FetchError::Connect(e.to_string())),
            };
        }
        self.fallback
            .clone()
            .ok_or_else(|| FetchError::Connect(format!("unscripted {key}")))
    }
}

const EMPTY_SEARCH: &str = r#"{"Data":{"List":[]}}"#;

fn quick(max_pages: u32, retries: u32) -> ChainSettings {
    ChainSettings {
        max_pages,
        page_sleep: Duration::ZERO,
        retry: RetryPolicy::new(retries, Duration::ZERO),
    }
}

fn pingan() -> Instrument {
    Instrument::new("000001.SZ", "平安银行")
}

#[test]
fn sina_fallback_used_when_search_is_empty() {
    let mut client = ScriptedClient::with_fallback(EMPTY_SEARCH);
    let sina_page_1 = SinaCompanyNews::new(&client).page_url("sz000001", 1).unwrap();
    let sina_page_2 = SinaCompanyNews::new(&client).page_url("sz000001", 2).unwrap();
    client.script(
        &sina_page_1,
        vec![Ok(r#"[2024-01-02 16:05]&nbsp;<a href='x'>平安银行：年度业绩快报</a><br>
                    [2024-01-02 09:41]&nbsp;<a href='y'>早盘异动</a>"#
            .into())],
    );
    client.script(&sina_page_2, vec![Ok("<html>nothing here</html>".into())]);

    let eastmoney = EastmoneySearch::new(&client, 50);
    let sina = SinaCompanyNews::new(&client);
    let sources: Vec<&dyn NewsSource> = vec![&eastmoney, &sina];
    let chain = NewsSourceChain::new(sources, quick(5, 0));
    let items = chain.fetch(&pingan());

    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.source == "sina" && i.ticker == "000001.SZ"));
    // chronological after merge
    assert_eq!(items[0].title, "早盘异动");
    assert_eq!(items[1].title, "平安银行：年度业绩快报");
    // both eastmoney queries stopped at their first empty page
    assert_eq!(client.requests_to("eastmoney"), 2);
    assert_eq!(client.requests_to("sina"), 2);
}

#[test]
fn primary_results_are_deduped_across_queries() {
    let mut client = ScriptedClient::with_fallback(EMPTY_SEARCH);
    let eastmoney = EastmoneySearch::new(&client, 50);
    let by_code = eastmoney.search_url("000001", 1).unwrap();
    let by_name = eastmoney.search_url("平安银行", 1).unwrap();
    let shared = r#"{"Data":{"List":[
        {"Title":"<em>平安银行</em>发布公告","ShowTime":"2024-01-02 09:30:00","MediaName":"证券时报"}
    ]}}"#;
    client.script(&by_code, vec![Ok(shared.into())]);
    client.script(
        &by_name,
        vec![Ok(r#"{"Data":{"List":[
            {"Title":"平安银行发布公告","ShowTime":"2024-01-02T09:30:00.000Z"},
            {"Title":"另一条","ShowTime":"2024-01-01 20:00:00"}
        ]}}"#
            .into())],
    );

    let eastmoney = EastmoneySearch::new(&client, 50);
    let sina = SinaCompanyNews::new(&client);
    let sources: Vec<&dyn NewsSource> = vec![&eastmoney, &sina];
    let chain = NewsSourceChain::new(sources, quick(5, 0));
    let items = chain.fetch(&pingan());

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "另一条");
    assert_eq!(items[1].source, "证券时报");
    assert_eq!(client.requests_to("sina"), 0);
}

#[test]
fn failed_page_is_skipped_and_paging_continues() {
    let mut client = ScriptedClient::with_fallback(EMPTY_SEARCH);
    let eastmoney = EastmoneySearch::new(&client, 50);
    let page_1 = eastmoney.search_url("000001", 1).unwrap();
    let page_2 = eastmoney.search_url("000001", 2).unwrap();
    client.script(
        &page_1,
        vec![Err(FetchError::Connect("reset".into())), Err(FetchError::Connect("reset".into()))],
    );
    client.script(
        &page_2,
        vec![Ok(r#"{"Data":{"List":[{"Title":"second page","ShowTime":"2024-01-03 10:00"}]}}"#.into())],
    );

    let eastmoney = EastmoneySearch::new(&client, 50);
    let chain = NewsSourceChain::new(vec![&eastmoney], quick(5, 1));
    let items = chain.fetch(&Instrument::new("000001.SZ", ""));

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "second page");
    // page 1 twice (one retry), page 2 once, page 3 empty
    let page_1_hits = client
        .requested
        .borrow()
        .iter()
        .filter(|u| **u == page_1.to_string())
        .count();
    assert_eq!(page_1_hits, 2);
}

#[test]
fn unrecognised_body_ends_query_without_retry() {
    let mut client = ScriptedClient::with_fallback(EMPTY_SEARCH);
    let eastmoney = EastmoneySearch::new(&client, 50);
    let page_1 = eastmoney.search_url("000001", 1).unwrap();
    client.script(&page_1, vec![Ok("<html>maintenance</html>".into())]);

    let eastmoney = EastmoneySearch::new(&client, 50);
    let chain = NewsSourceChain::new(vec![&eastmoney], quick(5, 3));
    let items = chain.fetch(&Instrument::new("000001.SZ", ""));

    assert!(items.is_empty());
    assert_eq!(client.requests_to("eastmoney"), 1);
}

#[test]
fn sina_queries_use_native_symbol() {
    let client = ScriptedClient::default();
    let sina = SinaCompanyNews::new(&client);
    assert_eq!(sina.queries(&Instrument::new("600036.SS", "招商银行")), ["sh600036"]);
}
