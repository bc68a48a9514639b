/// 提交时解析得到的查询, 子句之间以连接词相连
///
/// `connectives.len() == clauses.len() - 1`
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub clauses: Vec<Clause>,
    pub connectives: Vec<Connective>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// 按 OR 切分成若干组, 组内子句以 AND 相连 (AND 优先级高于 OR)
    pub fn or_groups(&self) -> Vec<Vec<&Clause>> {
        let mut groups: Vec<Vec<&Clause>> = Vec::new();
        let mut current: Vec<&Clause> = Vec::new();
        for (index, clause) in self.clauses.iter().enumerate() {
            current.push(clause);
            if self.connectives.get(index) == Some(&Connective::Or) {
                groups.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }
}

/// 连接词
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    /// 忽略大小写
    pub fn parse(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("and") {
            Some(Connective::And)
        } else if text.eq_ignore_ascii_case("or") {
            Some(Connective::Or)
        } else {
            None
        }
    }
}

/// 单个子句, 例如：`severity : 1` 或者不带字段的 `"disk full"`
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `field method value`
    Match {
        field: Identifier,
        method: String,
        value: Literal,
    },
    /// 没有字段的全文检索
    FullText(Literal),
}

/// 字段标识, 已尽量解析为字段 id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

/// 字面量值
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// 带双引号, 精确搜索
    Exact(String),
    /// 不带引号, 模糊匹配
    Fuzzy(String),
}

impl Literal {
    pub fn from_text(text: &str) -> Self {
        let quoted = text.len() >= 2 && text.starts_with('"') && text.ends_with('"');
        if quoted {
            Literal::Exact(text[1..text.len() - 1].to_string())
        } else {
            Literal::Fuzzy(text.to_string())
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Literal::Exact(text) | Literal::Fuzzy(text) => text,
        }
    }
}
