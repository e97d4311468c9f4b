//! Keyword-matching help assistant.

use crate::utils::error::{LookupError, Result};
use regex::Regex;

pub const DEFAULT_REPLY: &str = "I can help with HS codes, tariff and duty rates, supported \
countries, fast mode and AI summaries. Try asking \"what is an HS code?\"";

#[derive(Debug, Clone)]
pub struct ChatRule {
    pub name: &'static str,
    pub keywords: Vec<&'static str>,
    pub response: &'static str,
}

struct CompiledRule {
    rule: ChatRule,
    patterns: Vec<Regex>,
}

pub struct ChatBot {
    rules: Vec<CompiledRule>,
}

impl ChatBot {
    pub fn new(rules: Vec<ChatRule>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let patterns = rule
                    .keywords
                    .iter()
                    .map(|keyword| keyword_pattern(keyword))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompiledRule { rule, patterns })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn with_default_rules() -> Result<Self> {
        Self::new(default_rules())
    }

    /// Best matching rule: most keyword hits, earlier rule on ties.
    pub fn best_rule(&self, message: &str) -> Option<&ChatRule> {
        let mut best: Option<(&ChatRule, usize)> = None;
        for compiled in &self.rules {
            let hits = compiled
                .patterns
                .iter()
                .filter(|pattern| pattern.is_match(message))
                .count();
            if hits == 0 {
                continue;
            }
            if best.map(|(_, top)| hits > top).unwrap_or(true) {
                best = Some((&compiled.rule, hits));
            }
        }
        best.map(|(rule, _)| rule)
    }

    pub fn reply(&self, message: &str) -> &str {
        match self.best_rule(message) {
            Some(rule) => {
                tracing::debug!("💬 Matched chat rule '{}'", rule.name);
                rule.response
            }
            None => DEFAULT_REPLY,
        }
    }
}

fn keyword_pattern(keyword: &str) -> Result<Regex> {
    let words: Vec<String> = keyword.split_whitespace().map(regex::escape).collect();
    Regex::new(&format!(r"(?i)\b{}\b", words.join(r"\s+"))).map_err(|e| {
        LookupError::ValidationError {
            message: format!("invalid chat keyword '{}': {}", keyword, e),
        }
    })
}

pub fn default_rules() -> Vec<ChatRule> {
    vec![
        ChatRule {
            name: "greeting",
            keywords: vec!["hello", "hi", "hey"],
            response: "Hi! Describe your product and pick the countries you export to, and I'll \
find the matching HS codes and tariff rates.",
        },
        ChatRule {
            name: "hs_code",
            keywords: vec!["hs code", "hs", "harmonized", "classification", "classify"],
            response: "An HS (Harmonized System) code is the international numeric \
classification customs uses for your product. The first six digits are shared worldwide; \
countries add extra digits for their own tariff lines.",
        },
        ChatRule {
            name: "tariff",
            keywords: vec!["tariff", "duty", "duties", "rate", "tax", "customs"],
            response: "A tariff or duty rate is the percentage or fixed fee charged when your \
goods are imported. Run a search to see the rates that apply to your product in each \
destination.",
        },
        ChatRule {
            name: "countries",
            keywords: vec!["country", "countries", "region", "eu", "asean", "usmca", "export to"],
            response: "You can select individual countries or whole regional blocs such as the \
European Union, ASEAN and USMCA. Selecting a bloc selects all of its members.",
        },
        ChatRule {
            name: "fast_mode",
            keywords: vec!["fast", "fast mode", "speed", "slow"],
            response: "Fast mode asks the search service to skip AI reranking, so results come \
back quicker but may be ordered less precisely.",
        },
        ChatRule {
            name: "summary",
            keywords: vec!["summary", "summarize", "ai", "explain"],
            response: "Each result section gets an AI-written summary. If the AI service is \
busy, the app retries briefly and then shows a summary taken directly from the top match.",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot() -> ChatBot {
        ChatBot::with_default_rules().unwrap()
    }

    #[test]
    fn test_matches_whole_words_case_insensitively() {
        assert_eq!(bot().best_rule("What is an HS code?").unwrap().name, "hs_code");
        // "this" 不應觸發 "hi"
        assert!(bot().best_rule("this").is_none());
    }

    #[test]
    fn test_most_hits_wins() {
        let bot = bot();
        let rule = bot
            .best_rule("what duty rate and customs tax applies?")
            .unwrap();
        assert_eq!(rule.name, "tariff");
    }

    #[test]
    fn test_ties_go_to_earlier_rule() {
        let custom = ChatBot::new(vec![
            ChatRule {
                name: "first",
                keywords: vec!["steel"],
                response: "first",
            },
            ChatRule {
                name: "second",
                keywords: vec!["steel"],
                response: "second",
            },
        ])
        .unwrap();
        assert_eq!(custom.reply("Steel coils"), "first");
    }

    #[test]
    fn test_multi_word_keywords_allow_extra_spaces() {
        assert_eq!(bot().best_rule("can I export   to Japan").unwrap().name, "countries");
    }

    #[test]
    fn test_unknown_question_gets_default_reply() {
        assert_eq!(bot().reply("quantum pineapples"), DEFAULT_REPLY);
    }
}
