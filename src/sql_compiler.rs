//! SQL compiler that turns a committed filter query into a SELECT statement using sea-query.

use crate::ast::{Clause, Literal, Query as AstQuery};
use crate::catalog::SearchType;
use crate::config::FilterInputConfig;
use sea_query::{Asterisk, Cond, Expr, Iden, PostgresQueryBuilder, SelectStatement, SimpleExpr};
use thiserror::Error;

/// Table identifier for sea-query
#[derive(Debug, Clone)]
pub struct TableName(pub String);

impl Iden for TableName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = write!(s, "{}", self.0);
    }
}

/// Column identifier wrapper
#[derive(Debug, Clone)]
pub struct ColumnName(pub String);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = write!(s, "{}", self.0);
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("unsupported method '{method}' on field '{field}'")]
    UnsupportedMethod { field: String, method: String },
}

/// SQL Compiler for one search type
pub struct SqlCompiler {
    table: String,
    /// Column matched by clauses without a field
    full_text_column: String,
}

impl SqlCompiler {
    pub fn new(table: impl Into<String>, full_text_column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            full_text_column: full_text_column.into(),
        }
    }

    pub fn from_config(config: &FilterInputConfig, search_type: SearchType) -> Self {
        Self::new(config.get_table_name(search_type), config.full_text_column.clone())
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Compile a Query AST into SQL
    ///
    /// Clauses joined by AND are grouped first, the groups are then joined by OR.
    pub fn compile(&self, query: &AstQuery) -> Result<String, CompileError> {
        let mut select = SelectStatement::new();
        select.column(Asterisk).from(TableName(self.table.clone()));

        if !query.is_empty() {
            let mut any = Cond::any();
            for group in query.or_groups() {
                let mut all = Cond::all();
                for clause in group {
                    all = all.add(self.compile_clause(clause)?);
                }
                any = any.add(all);
            }
            select.cond_where(any);
        }

        Ok(select.to_string(PostgresQueryBuilder))
    }

    fn compile_clause(&self, clause: &Clause) -> Result<SimpleExpr, CompileError> {
        match clause {
            Clause::Match { field, method, value } => {
                if method != ":" {
                    return Err(CompileError::UnsupportedMethod {
                        field: field.0.clone(),
                        method: method.clone(),
                    });
                }
                Ok(compile_match(&field.0, value))
            }
            Clause::FullText(value) => {
                let col = Expr::col(ColumnName(self.full_text_column.clone()));
                Ok(match value {
                    Literal::Exact(text) => col.eq(text.as_str()),
                    Literal::Fuzzy(text) => col.like(format!("%{}%", text)),
                })
            }
        }
    }
}

/// 精确搜索为等值比较, 模糊匹配时整数按数值比较, 其余为 LIKE
fn compile_match(field: &str, value: &Literal) -> SimpleExpr {
    let col = Expr::col(ColumnName(field.to_string()));
    match value {
        Literal::Exact(text) => col.eq(text.as_str()),
        Literal::Fuzzy(text) => match text.parse::<i64>() {
            Ok(number) => col.eq(number),
            Err(_) => col.like(format!("%{}%", text)),
        },
    }
}
