//! MediaWiki action API client.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use wordsearch_shared::{LookupConfig, Result, WordSearchError};

use crate::{ContentLookup, PageFetch};

/// Maximum number of redirects to follow per request.
const MAX_REDIRECTS: usize = 3;

/// User-Agent string for lookup requests (MediaWiki asks clients to identify themselves).
const USER_AGENT: &str = concat!("wordsearch/", env!("CARGO_PKG_VERSION"));

/// Client settings.
#[derive(Debug, Clone)]
pub struct WikipediaOptions {
    /// Full action API endpoint, e.g. `https://en.wikipedia.org/w/api.php`.
    pub api_url: String,
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl From<&LookupConfig> for WikipediaOptions {
    fn from(config: &LookupConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Response shapes (formatversion=2)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiResponse<Q> {
    query: Option<Q>,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParsedPage>,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    pageprops: Option<PageProps>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    #[serde(default)]
    disambiguation: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// [`ContentLookup`] over Wikipedia.
pub struct WikipediaClient {
    client: Client,
    api_url: String,
}

impl WikipediaClient {
    pub fn new(opts: &WikipediaOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| WordSearchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: opts.api_url.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .map_err(|e| WordSearchError::Network(format!("{}: {e}", self.api_url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WordSearchError::Network(format!(
                "{}: HTTP {status}",
                self.api_url
            )));
        }

        response
            .json()
            .await
            .map_err(|e| WordSearchError::parse(format!("invalid lookup response: {e}")))
    }

    async fn query<Q: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<Option<Q>> {
        let body: ApiResponse<Q> = self.get(params).await?;
        Ok(body.query)
    }

    /// Suggested titles of a disambiguation page, in the order the page lists them.
    async fn disambiguation_options(&self, title: &str) -> Result<Vec<String>> {
        let body: ParseResponse = self
            .get(&[
                ("action", "parse"),
                ("page", title),
                ("prop", "text"),
                ("redirects", "1"),
            ])
            .await?;

        Ok(body
            .parse
            .map(|page| list_item_links(&page.text))
            .unwrap_or_default())
    }
}

/// First link of every list item in `html`, document order. Table-of-contents
/// entries are skipped.
fn list_item_links(html: &str) -> Vec<String> {
    static ITEM: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("li").expect("valid selector"));
    static LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

    let document = Html::parse_fragment(html);
    document
        .select(&ITEM)
        .filter(|item| !item.value().classes().any(|c| c.starts_with("tocsection")))
        .filter_map(|item| item.select(&LINK).next())
        .filter_map(|link| {
            let title = match link.value().attr("title") {
                Some(title) => title.to_string(),
                None => link.text().collect::<String>(),
            };
            let title = title.trim();
            (!title.is_empty()).then(|| title.to_string())
        })
        .collect()
}

#[async_trait]
impl ContentLookup for WikipediaClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let limit = limit.to_string();
        let result: Option<SearchQuery> = self
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", &limit),
                ("srprop", ""),
            ])
            .await?;

        let titles: Vec<String> = result
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default();

        debug!(hits = titles.len(), "search complete");
        Ok(titles)
    }

    #[instrument(skip(self))]
    async fn fetch(&self, title: &str) -> Result<PageFetch> {
        let result: Option<PagesQuery> = self
            .query(&[
                ("action", "query"),
                ("prop", "extracts|pageprops"),
                ("ppprop", "disambiguation"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;

        let Some(page) = result.and_then(|q| q.pages.into_iter().next()) else {
            return Ok(PageFetch::NotFound);
        };

        if page.missing || page.invalid {
            debug!("page missing");
            return Ok(PageFetch::NotFound);
        }

        let is_disambiguation = page
            .pageprops
            .as_ref()
            .is_some_and(|p| p.disambiguation.is_some());

        if is_disambiguation {
            let options = self.disambiguation_options(&page.title).await?;
            debug!(options = options.len(), "disambiguation page");
            return Ok(PageFetch::Disambiguation { options });
        }

        match page.extract {
            Some(text) if !text.trim().is_empty() => Ok(PageFetch::Content(text)),
            _ => Ok(PageFetch::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> WikipediaClient {
        WikipediaClient::new(&WikipediaOptions {
            api_url: format!("{}/w/api.php", server.uri()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn options_from_config() {
        let opts = WikipediaOptions::from(&LookupConfig::default());
        assert!(opts.api_url.ends_with("/w/api.php"));
        assert_eq!(opts.timeout_secs, 10);
    }

    #[tokio::test]
    async fn search_returns_titles_in_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("list", "search"))
            .and(query_param("srsearch", "heart"))
            .and(query_param("srlimit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "search": [
                    { "ns": 0, "title": "Heart" },
                    { "ns": 0, "title": "Heart valve" }
                ]}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let titles = client.search("heart", 5).await.unwrap();
        assert_eq!(titles, vec!["Heart", "Heart valve"]);
    }

    #[tokio::test]
    async fn search_without_query_block_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "batchcomplete": true
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.search("zzzz", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_returns_extract() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("prop", "extracts|pageprops"))
            .and(query_param("titles", "Heart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "pages": [
                    { "pageid": 1, "title": "Heart", "extract": "The heart is a muscular organ." }
                ]}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let page = client.fetch("Heart").await.unwrap();
        assert_eq!(
            page,
            PageFetch::Content("The heart is a muscular organ.".into())
        );
    }

    #[tokio::test]
    async fn fetch_missing_page_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "pages": [ { "title": "Nope", "missing": true } ] }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.fetch("Nope").await.unwrap(), PageFetch::NotFound);
    }

    #[tokio::test]
    async fn fetch_disambiguation_lists_options() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("prop", "extracts|pageprops"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "pages": [ {
                    "title": "Cell",
                    "extract": "Cell may refer to:",
                    "pageprops": { "disambiguation": "" }
                } ] }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("action", "parse"))
            .and(query_param("page", "Cell"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "parse": {
                    "title": "Cell",
                    "text": concat!(
                        "<div><p><b>Cell</b> may refer to:</p><ul>",
                        "<li class=\"toclevel-1 tocsection-1\">",
                        "<a href=\"#Science\">Science</a></li>",
                        "<li><a href=\"/wiki/Cell_(biology)\" ",
                        "title=\"Cell (biology)\">Cell (biology)</a>, ",
                        "the basic unit of life</li>",
                        "<li><a href=\"/wiki/Battery_(electricity)\" ",
                        "title=\"Battery (electricity)\">Electrochemical cell</a></li>",
                        "<li>Plain entry without a link</li>",
                        "<li><a href=\"/wiki/Cell_(music)\" title=\"Cell (music)\">Cell</a></li>",
                        "</ul></div>"
                    )
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let page = client.fetch("Cell").await.unwrap();
        assert_eq!(
            page,
            PageFetch::Disambiguation {
                options: vec![
                    "Cell (biology)".into(),
                    "Battery (electricity)".into(),
                    "Cell (music)".into(),
                ],
            }
        );
    }

    #[test]
    fn list_links_fall_back_to_link_text() {
        let html = r#"<ul><li><a href="/wiki/Spore">Spore</a></li></ul>"#;
        assert_eq!(list_item_links(html), vec!["Spore"]);
    }

    #[tokio::test]
    async fn server_error_is_network_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.search("heart", 3).await.unwrap_err();
        assert!(matches!(err, WordSearchError::Network(_)));
    }
}
