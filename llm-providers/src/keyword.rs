use brandscope_core::{BrandConfig, JudgmentOrigin, PostJudgment, RedditPost, Sentiment};

/// Lexicon hits that read as praise.
const POSITIVE_WORDS: [&str; 12] = [
    "love",
    "great",
    "amazing",
    "best",
    "awesome",
    "excellent",
    "recommend",
    "good",
    "fantastic",
    "happy",
    "satisfied",
    "smooth",
];

/// Lexicon hits that read as complaints.
const NEGATIVE_WORDS: [&str; 17] = [
    "hate",
    "worst",
    "terrible",
    "bad",
    "awful",
    "scam",
    "fraud",
    "disappointed",
    "horrible",
    "poor",
    "waste",
    "trash",
    "bug",
    "crash",
    "slow",
    "stuck",
    "useless",
];

const SUMMARY_CHARS: usize = 100;

/// Deterministic classifier used when every inference provider is
/// exhausted. Never fails, terminates in time linear in the text length,
/// and produces the same schema as the providers, at degraded quality.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn judge(&self, post: &RedditPost, brand: &BrandConfig) -> PostJudgment {
        let text = post.full_text().to_lowercase();

        let has_product_term = brand
            .product_terms
            .iter()
            .any(|term| text.contains(&term.to_lowercase()));
        let in_hinted_subreddit = brand
            .subreddit_hints
            .iter()
            .any(|hint| hint.eq_ignore_ascii_case(&post.subreddit));
        let relevant = has_product_term || in_hinted_subreddit;

        let positive_hits = POSITIVE_WORDS.iter().filter(|w| text.contains(*w)).count();
        let negative_hits = NEGATIVE_WORDS.iter().filter(|w| text.contains(*w)).count();
        let sentiment = match positive_hits.cmp(&negative_hits) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        };

        let competitor_mentions: Vec<String> = brand
            .competitors
            .iter()
            .filter(|c| text.contains(&c.to_lowercase()))
            .cloned()
            .collect();

        PostJudgment {
            post_id: post.id.clone(),
            relevant,
            sentiment,
            theme: "general discussion".to_string(),
            summary: post.title.chars().take(SUMMARY_CHARS).collect(),
            competitor_mentions,
            judged_by: JudgmentOrigin::KeywordFallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandscope_core::SourceKind;

    fn post(title: &str, body: &str, subreddit: &str) -> RedditPost {
        RedditPost {
            id: "kw1".to_string(),
            title: title.to_string(),
            selftext: body.to_string(),
            subreddit: subreddit.to_string(),
            author: "tester".to_string(),
            url: String::new(),
            permalink: String::new(),
            score: 0,
            num_comments: 0,
            created_utc: 1_700_000_000,
            source: SourceKind::ArchiveSearch,
        }
    }

    fn brand() -> BrandConfig {
        BrandConfig {
            name: "Sahi".to_string(),
            category: "skincare".to_string(),
            keywords: vec!["sahi".to_string()],
            product_terms: vec!["sunscreen".to_string()],
            competitors: vec!["Minimalist".to_string()],
            subreddit_hints: vec!["IndianSkincareAddicts".to_string()],
            description: String::new(),
        }
    }

    #[test]
    fn test_relevance_from_product_term() {
        let classifier = KeywordClassifier::new();
        let judgment = classifier.judge(&post("Best Sunscreen?", "", "india"), &brand());
        assert!(judgment.relevant);
        assert_eq!(judgment.judged_by, JudgmentOrigin::KeywordFallback);
    }

    #[test]
    fn test_relevance_from_hinted_subreddit() {
        let classifier = KeywordClassifier::new();
        let judgment = classifier.judge(
            &post("Anyone tried this?", "", "indianskincareaddicts"),
            &brand(),
        );
        assert!(judgment.relevant);
    }

    #[test]
    fn test_irrelevant_post() {
        let classifier = KeywordClassifier::new();
        let judgment = classifier.judge(&post("Random topic", "nothing here", "india"), &brand());
        assert!(!judgment.relevant);
        // Still a complete judgment: totality over the batch.
        assert_eq!(judgment.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_sentiment_counting_and_tie() {
        let classifier = KeywordClassifier::new();

        let positive = classifier.judge(
            &post("Great sunscreen", "love it, highly recommend", "india"),
            &brand(),
        );
        assert_eq!(positive.sentiment, Sentiment::Positive);

        let negative = classifier.judge(
            &post("Terrible sunscreen", "waste of money, awful texture", "india"),
            &brand(),
        );
        assert_eq!(negative.sentiment, Sentiment::Negative);

        let tied = classifier.judge(
            &post("Good sunscreen but bad packaging", "", "india"),
            &brand(),
        );
        assert_eq!(tied.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_competitor_mentions_case_insensitive() {
        let classifier = KeywordClassifier::new();
        let judgment = classifier.judge(
            &post("Sunscreen compare", "switched from minimalist last month", "india"),
            &brand(),
        );
        assert_eq!(judgment.competitor_mentions, vec!["Minimalist"]);
    }

    #[test]
    fn test_summary_truncation_is_char_safe() {
        let classifier = KeywordClassifier::new();
        let long_title = "é".repeat(300);
        let judgment = classifier.judge(&post(&long_title, "sunscreen", "india"), &brand());
        assert_eq!(judgment.summary.chars().count(), 100);
    }

    #[test]
    fn test_empty_body_post() {
        let classifier = KeywordClassifier::new();
        let judgment = classifier.judge(&post("sunscreen", "", "india"), &brand());
        assert!(judgment.relevant);
        assert_eq!(judgment.summary, "sunscreen");
    }
}
