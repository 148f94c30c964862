use crate::fetcher::Fetcher;
use crate::parser::{FeedParser, ParsedEntry};
use crate::sources::truncate_chars;
use crate::traits::SourceAdapter;
use crate::types::{AggregatorError, Priority, RawItem, Result, SourceConfig};
use async_trait::async_trait;
use regex::Regex;
use tracing::info;

const DEFAULT_MAX: usize = 5;

pub const DEFAULT_CATEGORIES: &[&str] = &["cs.CL", "cs.AI", "cs.LG", "cs.MA"];

/// Keywords that mark a paper as relevant to people building with language models.
const RELEVANCE_PATTERNS: &[&str] = &[
    r"\bllm\b", r"\blarge language model", r"\bfoundation model", r"\btransformer\b", r"\battention\b",
    r"\bpre.?train", r"\bagent\b", r"\bagentic\b", r"\bmulti.?agent\b", r"\btool\s*(use|call|ing)\b",
    r"\bfunction call", r"\bplanning\b", r"\borchestrat", r"\bworkflow\b", r"\breason(ing)?\b",
    r"chain.of.thought", r"\bcot\b", r"\bthink(ing)?\b", r"\bself.?reflect", r"\bverif", r"\brag\b",
    r"\bretrieval", r"\bvector", r"\bembedding", r"\bknowledge.?(graph|base)\b", r"\bsemantic.?search",
    r"\bprompt", r"\binstruct", r"\bfine.?tun", r"\balign", r"\brlhf\b", r"\bdpo\b", r"\breinforcement",
    r"\bin.?context.?learn", r"\bfew.?shot", r"\bzero.?shot", r"\bgpt\b", r"\bclaude\b", r"\bllama\b",
    r"\bgemini\b", r"\bmistral\b", r"\bqwen\b", r"\bdeepseek\b", r"\binference\b", r"\bserving\b",
    r"\blatency\b", r"\bquantiz", r"\bdistill", r"\bprun", r"\bcontext.?window\b", r"\blong.?context",
    r"\bscaling\b", r"\befficien", r"\bbenchmark", r"\bevaluat", r"\bcode.?gen", r"\bcoding\b",
    r"\bprogram.?synth", r"\bsoftware.?eng", r"\bdebug", r"\bhallucin", r"\bground(ing|ed)\b",
    r"\bfaithful", r"\bsafety\b", r"\bjailbreak\b", r"\bred.?team", r"\bmemory\b", r"\bchat\b",
    r"\bconversat", r"\bsummariz", r"\bcompress", r"\bmultimodal\b", r"\bvision.?language\b", r"\bvlm\b",
    r"\bapi\b", r"\bdeployment\b", r"\bproduction\b", r"\bcost\b", r"\boptimiz", r"\bcach",
    r"\btokeniz", r"\btoken\b",
];

pub fn relevance_regex() -> Result<Regex> {
    Regex::new(&format!("(?i){}", RELEVANCE_PATTERNS.join("|")))
        .map_err(|e| AggregatorError::General(format!("bad relevance pattern: {}", e)))
}

fn priority_for(matches: usize) -> Priority {
    match matches {
        m if m >= 8 => Priority::Urgent,
        m if m >= 4 => Priority::High,
        _ => Priority::Medium,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rank entries by keyword hits (stable, so recency breaks ties) and keep `max`.
pub fn rank_entries(entries: Vec<ParsedEntry>, relevance: &Regex, max: usize) -> Vec<RawItem> {
    let mut scored: Vec<(usize, ParsedEntry)> = entries
        .into_iter()
        .map(|entry| {
            let text = format!("{} {}", entry.title, entry.summary.as_deref().unwrap_or(""));
            (relevance.find_iter(&text).count(), entry)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(max)
        .map(|(matches, entry)| {
            let abstract_text = collapse_whitespace(entry.summary.as_deref().unwrap_or(""));
            let authors = if entry.authors.len() > 3 {
                format!("{} et al.", entry.authors[..3].join(", "))
            } else {
                entry.authors.join(", ")
            };
            let url = if entry.url.is_empty() { entry.guid.clone().unwrap_or_default() } else { entry.url.clone() };

            RawItem {
                title: collapse_whitespace(&entry.title),
                url,
                summary: truncate_chars(&abstract_text, 250),
                body: format!("Authors: {}\n\n{}", authors, abstract_text),
                priority: priority_for(matches),
                timestamp: entry.timestamp(),
                category: Some("research".to_string()),
                tags: entry.categories.clone(),
                ..Default::default()
            }
        })
        .collect()
}

/// Recent arXiv submissions in a set of categories, ranked by keyword relevance.
pub struct ArxivSource {
    name: String,
    icon: String,
    categories: Vec<String>,
    fetcher: Fetcher,
    relevance: Regex,
}

impl ArxivSource {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, categories: Vec<String>, fetcher: Fetcher) -> Result<Self> {
        let categories = if categories.is_empty() {
            DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
        } else {
            categories
        };
        Ok(Self {
            name: name.into(),
            icon: icon.into(),
            categories,
            fetcher,
            relevance: relevance_regex()?,
        })
    }

    /// arXiv wants the boolean query unescaped, with `+` for spaces.
    pub fn query_url(&self, fetch_count: usize) -> String {
        let query = self
            .categories
            .iter()
            .map(|c| format!("cat:{}", c))
            .collect::<Vec<_>>()
            .join("+OR+");
        format!(
            "https://export.arxiv.org/api/query?search_query={}&sortBy=submittedDate&sortOrder=descending&max_results={}",
            query, fetch_count
        )
    }
}

#[async_trait]
impl SourceAdapter for ArxivSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn kind(&self) -> &str {
        "arxiv"
    }

    async fn fetch(&self, config: &SourceConfig) -> Result<Vec<RawItem>> {
        let max = config.max_items(DEFAULT_MAX);
        // over-fetch so the keyword ranking has something to choose from
        let fetch_count = (max * 10).max(50);

        let body = self.fetcher.get_text(&self.query_url(fetch_count)).await?;
        let entries = FeedParser::new().parse(&body)?;

        let items = rank_entries(entries, &self.relevance, max);
        info!("{}: fetched {} items", self.name, items.len());
        Ok(items)
    }
}
