//! 回复分类服务 - 业务能力层
//!
//! 纯函数，不做任何 I/O。规则按顺序匹配，第一条命中的规则决定分类：
//! 1. RAW_JSON：泄露的内部工具调用 JSON
//! 2. GENERIC_REFUSAL：只能回答税务问题之类的样板拒答
//! 3. NOT_FOUND：以"找不到具体信息"开头的样板回复
//! 4. 关键词包含判断：PASS / FAIL

use std::sync::LazyLock;

use regex::Regex;

use crate::models::result::Classification;

/// 回复短于该长度直接判 FAIL
pub const MIN_RESPONSE_CHARS: usize = 5;

/// 样板规则只检查不短于该长度的回复
const MIN_PATTERN_CHARS: usize = 10;

static RESPONSE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^RC\s*").expect("valid prefix regex"));

/// 去掉机器人回复前的 "RC" 标记
pub fn strip_response_prefix(text: &str) -> &str {
    match RESPONSE_PREFIX.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// 规则作用的文本形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleInput {
    /// 原始回复
    Raw,
    /// 去前缀并小写
    Normalized,
    /// 去前缀并去空白
    Stripped,
}

/// 一条带标签的分类规则，任一模式命中即视为匹配
struct ClassificationRule {
    tag: Classification,
    input: RuleInput,
    patterns: Vec<Regex>,
}

impl ClassificationRule {
    fn new(tag: Classification, input: RuleInput, patterns: &[&str]) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p).expect("valid classification regex"))
            .collect();
        Self {
            tag,
            input,
            patterns,
        }
    }

    fn matches(&self, raw: &str) -> bool {
        if raw.chars().count() < MIN_PATTERN_CHARS {
            return false;
        }
        let normalized;
        let subject = match self.input {
            RuleInput::Raw => raw,
            RuleInput::Normalized => {
                normalized = strip_response_prefix(raw).to_lowercase();
                normalized.as_str()
            }
            RuleInput::Stripped => strip_response_prefix(raw).trim(),
        };
        self.patterns.iter().any(|p| p.is_match(subject))
    }
}

/// 分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationOutcome {
    pub classification: Classification,
    /// 按期望关键词的顺序，只保留命中的，统一小写
    pub matched_keywords: Vec<String>,
}

impl ClassificationOutcome {
    fn failed(classification: Classification) -> Self {
        Self {
            classification,
            matched_keywords: Vec::new(),
        }
    }
}

/// 回复分类器
pub struct ResponseClassifier {
    rules: Vec<ClassificationRule>,
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseClassifier {
    /// 使用默认规则集
    pub fn new() -> Self {
        let rules = vec![
            ClassificationRule::new(
                Classification::RawJson,
                RuleInput::Raw,
                &[
                    r#"(?i)\{\s*"action"\s*:"#,
                    r#"(?i)\{\s*"tool_name"\s*:"#,
                    r#"(?i)\{\s*"reasoning"\s*:"#,
                    r#"(?i)\{\s*"parameters"\s*:\s*\{"#,
                ],
            ),
            ClassificationRule::new(
                Classification::GenericRefusal,
                RuleInput::Normalized,
                &[
                    r"(?i)lo siento, solo puedo ayudarte con consultas relacionadas con impuestos",
                    r"(?i)solo puedo ayudarte con consultas relacionadas con impuestos",
                    r"(?i)para otros temas, puedes visitar.*rentascordoba\.gob\.ar",
                    r"(?i)no puedo ayudarte con.*consultas relacionadas con impuestos",
                ],
            ),
            ClassificationRule::new(
                Classification::NotFound,
                RuleInput::Stripped,
                &[r"(?i)^no pude encontrar información específica"],
            ),
        ];
        Self { rules }
    }

    /// 对回复分类，永不失败
    pub fn classify(&self, response_text: &str, expected_keywords: &[String]) -> ClassificationOutcome {
        if response_text.chars().count() < MIN_RESPONSE_CHARS {
            return ClassificationOutcome::failed(Classification::Fail);
        }

        if let Some(rule) = self.rules.iter().find(|rule| rule.matches(response_text)) {
            return ClassificationOutcome::failed(rule.tag);
        }

        let haystack = strip_response_prefix(response_text).to_lowercase();
        let matched_keywords: Vec<String> = expected_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty() && haystack.contains(k.as_str()))
            .collect();

        let classification = if matched_keywords.is_empty() {
            Classification::Fail
        } else {
            Classification::Pass
        };

        ClassificationOutcome {
            classification,
            matched_keywords,
        }
    }
}

static DEFAULT_CLASSIFIER: LazyLock<ResponseClassifier> = LazyLock::new(ResponseClassifier::new);

/// 使用默认规则集分类
pub fn classify(response_text: &str, expected_keywords: &[String]) -> ClassificationOutcome {
    DEFAULT_CLASSIFIER.classify(response_text, expected_keywords)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matched_keywords_follow_expected_order() {
        let outcome = classify(
            "El impuesto automotor vence en marzo",
            &keywords(&["vence", "impuesto"]),
        );
        assert_eq!(outcome.classification, Classification::Pass);
        assert_eq!(outcome.matched_keywords, keywords(&["vence", "impuesto"]));
    }

    #[test]
    fn raw_json_wins_over_keywords() {
        let outcome = classify(
            r#"RC {"action": "buscar", "impuesto": "automotor"}"#,
            &keywords(&["impuesto", "automotor"]),
        );
        assert_eq!(outcome.classification, Classification::RawJson);
        assert!(outcome.matched_keywords.is_empty());

        let outcome = classify(
            r#"Respuesta { "PARAMETERS" : { "q": "vence" } }"#,
            &keywords(&["vence"]),
        );
        assert_eq!(outcome.classification, Classification::RawJson);
    }

    #[test]
    fn generic_refusal_wins_over_keywords() {
        let outcome = classify(
            "RC Lo siento, solo puedo ayudarte con consultas relacionadas con impuestos.",
            &keywords(&["impuestos"]),
        );
        assert_eq!(outcome.classification, Classification::GenericRefusal);

        let outcome = classify(
            "Para otros temas, puedes visitar www.rentascordoba.gob.ar",
            &keywords(&["temas"]),
        );
        assert_eq!(outcome.classification, Classification::GenericRefusal);
    }

    #[test]
    fn not_found_requires_leading_boilerplate() {
        let outcome = classify(
            "RC  No pude encontrar información específica sobre el inmueble.",
            &keywords(&["inmueble"]),
        );
        assert_eq!(outcome.classification, Classification::NotFound);

        let outcome = classify(
            "El inmueble existe. No pude encontrar información específica sobre la deuda.",
            &keywords(&["inmueble"]),
        );
        assert_eq!(outcome.classification, Classification::Pass);
    }

    #[test]
    fn short_responses_fail_without_matches() {
        for text in ["", "RC", "{\"a", "abcd"] {
            let outcome = classify(text, &keywords(&["a", "ab", "RC"]));
            assert_eq!(outcome.classification, Classification::Fail);
            assert!(outcome.matched_keywords.is_empty());
        }
    }

    #[test]
    fn keyword_match_is_case_insensitive_and_ignores_prefix() {
        let outcome = classify("RC La TASA vence el 10", &keywords(&[" tasa ", "", "Vence"]));
        assert_eq!(outcome.classification, Classification::Pass);
        assert_eq!(outcome.matched_keywords, keywords(&["tasa", "vence"]));

        let outcome = classify("Respuesta sin relación", &keywords(&["impuesto"]));
        assert_eq!(outcome.classification, Classification::Fail);
    }

    #[test]
    fn prefix_stripping_only_touches_leading_marker() {
        assert_eq!(strip_response_prefix("RC   Hola"), "Hola");
        assert_eq!(strip_response_prefix("Hola RC"), "Hola RC");
    }

    #[test]
    fn matched_keywords_are_lower_cased() {
        let outcome = classify(
            "El IMPUESTO automotor vence en marzo",
            &keywords(&["Impuesto", "VENCE"]),
        );
        assert_eq!(outcome.classification, Classification::Pass);
        assert_eq!(outcome.matched_keywords, keywords(&["impuesto", "vence"]));
    }

    #[test]
    fn boilerplate_rules_skip_responses_under_ten_chars() {
        // 5 到 9 个字符：足够参与关键词判断，但不做样板规则检查
        let outcome = classify(r#"{"action""#, &keywords(&["impuesto"]));
        assert_eq!(outcome.classification, Classification::Fail);

        let outcome = classify(r#"{"action":"#, &keywords(&["action"]));
        assert_eq!(outcome.classification, Classification::RawJson);
    }
}
