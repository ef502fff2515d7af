use brandscope_core::{
    BrandConfig, JudgmentOrigin, PostJudgment, ProviderError, RedditPost, Sentiment,
};
use serde::Deserialize;
use std::fmt::Write;

/// Posts per classification call. Amortizes per-call overhead while keeping
/// one failure's blast radius to a single batch.
pub const BATCH_SIZE: usize = 10;

const TITLE_EXCERPT_CHARS: usize = 500;
const BODY_EXCERPT_CHARS: usize = 1000;

/// Char-boundary-safe prefix.
fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// One prompt per batch: brand context once, then the numbered posts, then
/// the JSON-array contract.
pub fn build_batch_prompt(posts: &[RedditPost], brand: &BrandConfig) -> String {
    let competitors = if brand.competitors.is_empty() {
        "none known".to_string()
    } else {
        brand.competitors.join(", ")
    };

    let mut prompt = format!(
        "You are analyzing Reddit posts to determine whether each one is about a \
         specific brand, and if so, what the sentiment is.\n\n\
         Brand: {}\n\
         Description: {}\n\
         Category: {}\n\
         Known competitors: {}\n\n\
         The brand name may also be a common word. Only mark a post relevant if it \
         is actually discussing the brand or its products.\n\nPosts:\n",
        brand.name, brand.description, brand.category, competitors
    );

    for (i, post) in posts.iter().enumerate() {
        let _ = write!(
            prompt,
            "\n{}. Subreddit: r/{} | Upvotes: {}\nTitle: {}\nBody: {}\n",
            i + 1,
            post.subreddit,
            post.score,
            excerpt(&post.title, TITLE_EXCERPT_CHARS),
            excerpt(&post.selftext, BODY_EXCERPT_CHARS),
        );
    }

    let _ = write!(
        prompt,
        "\nRespond with ONLY a JSON array of exactly {} objects, one per post in \
         order. Each object: {{\"relevant\": true/false, \"sentiment\": \
         \"positive\"|\"negative\"|\"neutral\", \"theme\": \"short label\", \
         \"summary\": \"one line\", \"competitor_mentions\": [\"names\"]}}. \
         For a post that is not about the brand, still include its object with \
         \"relevant\": false.",
        posts.len()
    );
    prompt
}

#[derive(Debug, Deserialize)]
struct RawJudgment {
    #[serde(default)]
    relevant: bool,
    sentiment: Option<String>,
    theme: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    competitor_mentions: Vec<String>,
}

/// Models wrap JSON in markdown fences often enough that stripping them is
/// cheaper than re-prompting.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Parse a provider's batch reply into judgments. A malformed reply or a
/// count mismatch is a Schema failure of that provider for that batch.
pub fn parse_batch_response(
    content: &str,
    posts: &[RedditPost],
    provider: &str,
) -> Result<Vec<PostJudgment>, ProviderError> {
    let cleaned = strip_code_fences(content);
    let raw: Vec<RawJudgment> =
        serde_json::from_str(cleaned).map_err(|e| ProviderError::Schema {
            provider: provider.to_string(),
            details: format!("invalid JSON: {e}"),
        })?;

    if raw.len() != posts.len() {
        return Err(ProviderError::Schema {
            provider: provider.to_string(),
            details: format!("expected {} judgments, got {}", posts.len(), raw.len()),
        });
    }

    Ok(raw
        .into_iter()
        .zip(posts)
        .map(|(r, post)| PostJudgment {
            post_id: post.id.clone(),
            relevant: r.relevant,
            sentiment: r
                .sentiment
                .as_deref()
                .map(Sentiment::parse_loose)
                .unwrap_or(Sentiment::Neutral),
            theme: r.theme.unwrap_or_else(|| "general discussion".to_string()),
            summary: r.summary.unwrap_or_default(),
            competitor_mentions: r.competitor_mentions,
            judged_by: JudgmentOrigin::Provider {
                name: provider.to_string(),
            },
        })
        .collect())
}
