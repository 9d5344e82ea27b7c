use serde::{Deserialize, Deserializer};

/// 题目文件中的原始一行
///
/// 所有字段都允许缺失，也允许写成数字或布尔值，校验在 [`QuestionFixture::from_row`] 中完成
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixtureRow {
    #[serde(deserialize_with = "cell_text")]
    pub id: String,
    #[serde(deserialize_with = "cell_text")]
    pub category: String,
    #[serde(deserialize_with = "cell_text")]
    pub question: String,
    /// 逗号分隔的期望关键词
    #[serde(deserialize_with = "cell_text")]
    pub keywords: String,
    #[serde(deserialize_with = "cell_text")]
    pub source: String,
    #[serde(deserialize_with = "cell_text")]
    pub valid_year: String,
}

/// 单元格按文本读取：`id = 1` 和 `id = "1"` 等价
fn cell_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match toml::Value::deserialize(deserializer)? {
        toml::Value::String(text) => text,
        toml::Value::Integer(n) => n.to_string(),
        toml::Value::Float(n) => n.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(d) => d.to_string(),
        other => other.to_string(),
    })
}

/// TOML 题目文件的整体结构
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureFile {
    #[serde(default)]
    pub questions: Vec<FixtureRow>,
}

/// 一道经过校验的测试题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFixture {
    pub id: String,
    pub category: String,
    pub question_text: String,
    /// 按原顺序保存的关键词，已去空白、去空项
    pub expected_keywords: Vec<String>,
    /// 关键词单元格的原文（仅去首尾空白），写入表格和结果库时原样使用
    pub keywords_text: String,
}

impl QuestionFixture {
    /// 把原始行转换为题目；问题或关键词为空时返回 None（被过滤，不算错误）
    pub fn from_row(row: &FixtureRow) -> Option<Self> {
        let question_text = row.question.trim();
        let expected_keywords = split_keywords(&row.keywords);

        if question_text.is_empty() || expected_keywords.is_empty() {
            return None;
        }

        Some(Self {
            id: row.id.trim().to_string(),
            category: row.category.trim().to_string(),
            question_text: question_text.to_string(),
            expected_keywords,
            keywords_text: row.keywords.trim().to_string(),
        })
    }
}

/// 按逗号拆分关键词，去掉首尾空白和空项
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// 一次运行的题目集合，加载后只读
#[derive(Debug, Clone, Default)]
pub struct FixtureSet {
    fixtures: Vec<QuestionFixture>,
    dropped: usize,
}

impl FixtureSet {
    /// 读取最多 `max_rows` 行并过滤掉无效行
    pub fn from_rows(rows: &[FixtureRow], max_rows: usize) -> Self {
        let considered = &rows[..rows.len().min(max_rows)];
        let fixtures: Vec<QuestionFixture> =
            considered.iter().filter_map(QuestionFixture::from_row).collect();
        let dropped = considered.len() - fixtures.len();
        Self { fixtures, dropped }
    }

    pub fn fixtures(&self) -> &[QuestionFixture] {
        &self.fixtures
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// 被过滤掉的行数
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl From<Vec<QuestionFixture>> for FixtureSet {
    fn from(fixtures: Vec<QuestionFixture>) -> Self {
        Self {
            fixtures,
            dropped: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, question: &str, keywords: &str) -> FixtureRow {
        FixtureRow {
            id: id.to_string(),
            category: "General".to_string(),
            question: question.to_string(),
            keywords: keywords.to_string(),
            ..FixtureRow::default()
        }
    }

    #[test]
    fn keywords_are_trimmed_and_empty_entries_dropped() {
        assert_eq!(
            split_keywords(" vence , impuesto,, ,marzo "),
            vec!["vence", "impuesto", "marzo"]
        );
    }

    #[test]
    fn raw_keyword_cell_is_kept_verbatim() {
        let fixture = QuestionFixture::from_row(&row("4", "¿Cuándo?", "  Vence ,marzo,, ")).unwrap();
        assert_eq!(fixture.expected_keywords, vec!["Vence", "marzo"]);
        assert_eq!(fixture.keywords_text, "Vence ,marzo,,");
    }

    #[test]
    fn rows_without_question_or_keywords_are_filtered() {
        let mut rows: Vec<FixtureRow> = (0..8)
            .map(|i| row(&i.to_string(), "¿Cuándo vence el impuesto?", "vence, marzo"))
            .collect();
        rows.push(row("8", "¿Pregunta sin clave?", "  "));
        rows.push(row("9", "   ", "vence"));

        let set = FixtureSet::from_rows(&rows, 1000);
        assert_eq!(set.len(), 8);
        assert_eq!(set.dropped(), 2);
    }

    #[test]
    fn row_cap_is_applied_before_filtering() {
        let rows = vec![
            row("1", "", "x"),
            row("2", "¿Uno?", "uno"),
            row("3", "¿Dos?", "dos"),
        ];
        let set = FixtureSet::from_rows(&rows, 2);
        assert_eq!(set.len(), 1);
        assert_eq!(set.fixtures()[0].id, "2");
    }
}
