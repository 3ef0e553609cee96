//! Read-only gate between generated SQL and the database.
//!
//! Every statement produced by the completion service passes through
//! [`SqlPolicy::validate`] before it is executed. The check is an allow-list
//! over the token stream: one statement, starting with `SELECT`/`WITH`, no
//! mutating keywords, no denied functions, and every table reference inside
//! the registry schema.

pub mod lexer;

use serde::Serialize;

use crate::types::REGISTRY_SCHEMA;
use lexer::{tokenize, LexError, Token, TokenKind};

/// Keywords that may not appear anywhere as a bare word.
///
/// `INTO` blocks `SELECT ... INTO new_table`; `UPDATE` also blocks the
/// `FOR UPDATE` row lock.
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "TRUNCATE", "GRANT", "REVOKE",
    "MERGE", "COPY", "CALL", "DO", "EXECUTE", "VACUUM", "ANALYZE", "LOCK", "COMMENT",
    "REINDEX", "CLUSTER", "REFRESH", "SET", "RESET", "LISTEN", "NOTIFY", "INTO", "PREPARE",
    "DEALLOCATE", "DISCARD", "IMPORT", "SECURITY",
];

/// Functions with side effects or access to server internals.
const DENIED_FUNCTIONS: &[&str] = &[
    "pg_sleep",
    "pg_sleep_for",
    "pg_sleep_until",
    "pg_read_file",
    "pg_read_binary_file",
    "pg_ls_dir",
    "pg_stat_file",
    "lo_import",
    "lo_export",
    "dblink",
    "dblink_exec",
    "set_config",
    "current_setting",
    "pg_terminate_backend",
    "pg_cancel_backend",
    "pg_reload_conf",
    "query_to_xml",
    "nextval",
    "setval",
];

/// Schemas other than the registry one that callers commonly reach for.
const FOREIGN_SCHEMAS: &[&str] = &["public", "pg_catalog", "information_schema", "pg_toast"];

/// Words that end a FROM item instead of naming its alias.
const CLAUSE_KEYWORDS: &[&str] = &[
    "WHERE", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS", "NATURAL", "ON",
    "USING", "GROUP", "ORDER", "LIMIT", "OFFSET", "HAVING", "WINDOW", "UNION", "INTERSECT",
    "EXCEPT", "FETCH", "FOR", "LATERAL", "TABLESAMPLE", "RETURNING", "WITH",
];

/// Why a statement was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlRejection {
    #[error("statement is empty")]
    Empty,

    #[error("statement could not be tokenized: {0}")]
    Lex(#[from] LexError),

    #[error("only a single statement is allowed")]
    MultipleStatements,

    #[error("only SELECT queries are allowed, found '{0}'")]
    NotAReadQuery(String),

    #[error("keyword '{0}' is not allowed")]
    ForbiddenKeyword(String),

    #[error("function '{0}' is not allowed")]
    ForbiddenFunction(String),

    #[error("schema '{0}' is outside the registry schema")]
    ForeignSchema(String),

    #[error("system catalog '{0}' is not allowed")]
    SensitiveCatalog(String),

    #[error("reference '{0}' is not a schema.table name")]
    UnsupportedReference(String),
}

impl SqlRejection {
    /// Stable machine-readable reason for API payloads and logs.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Lex(_) => "unparseable",
            Self::MultipleStatements => "multiple_statements",
            Self::NotAReadQuery(_) => "not_a_read_query",
            Self::ForbiddenKeyword(_) => "forbidden_keyword",
            Self::ForbiddenFunction(_) => "forbidden_function",
            Self::ForeignSchema(_) => "foreign_schema",
            Self::SensitiveCatalog(_) => "sensitive_catalog",
            Self::UnsupportedReference(_) => "unsupported_reference",
        }
    }
}

/// A statement that passed [`SqlPolicy::validate`], with any trailing
/// semicolon removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedSql(String);

impl ValidatedSql {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ValidatedSql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The read-only, single-schema policy.
#[derive(Debug, Clone)]
pub struct SqlPolicy {
    schema: String,
    allowed_catalogs: Vec<String>,
}

impl Default for SqlPolicy {
    fn default() -> Self {
        Self::new(REGISTRY_SCHEMA)
    }
}

impl SqlPolicy {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into().to_lowercase(),
            allowed_catalogs: Vec::new(),
        }
    }

    /// Permit unqualified references to the given `pg_*` catalogs.
    pub fn allow_catalogs<I, S>(mut self, catalogs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_catalogs
            .extend(catalogs.into_iter().map(|c| c.into().to_lowercase()));
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn is_allowed(&self, sql: &str) -> bool {
        self.validate(sql).is_ok()
    }

    /// Accept or reject `sql`.
    pub fn validate(&self, sql: &str) -> Result<ValidatedSql, SqlRejection> {
        let mut tokens = tokenize(sql)?;

        let mut end = sql.trim_end().len();
        if let Some(last) = tokens.last() {
            if last.kind == TokenKind::Semicolon {
                end = last.offset;
                tokens.pop();
            }
        }

        if tokens.is_empty() {
            return Err(SqlRejection::Empty);
        }
        if tokens.iter().any(|t| t.kind == TokenKind::Semicolon) {
            return Err(SqlRejection::MultipleStatements);
        }

        check_statement_start(&tokens)?;
        check_keywords(&tokens)?;
        check_functions(&tokens)?;
        self.check_qualifiers(&tokens)?;
        self.check_from_items(&tokens)?;

        Ok(ValidatedSql(sql[..end].trim().to_string()))
    }

    /// Any `x.y` whose qualifier is a known foreign schema is refused, no
    /// matter where it appears. A qualified call `x.f(..)` must name the
    /// registry schema.
    fn check_qualifiers(&self, tokens: &[Token]) -> Result<(), SqlRejection> {
        for (i, window) in tokens.windows(2).enumerate() {
            if window[1].kind != TokenKind::Dot {
                continue;
            }
            let Some(name) = ident_name(&window[0]) else {
                continue;
            };
            if name == self.schema {
                continue;
            }
            if FOREIGN_SCHEMAS.contains(&name.as_str()) || name.starts_with("pg_") {
                return Err(SqlRejection::ForeignSchema(name));
            }
            let is_call = tokens.get(i + 2).and_then(ident_name).is_some()
                && tokens.get(i + 3).map(|t| &t.kind) == Some(&TokenKind::LParen);
            if is_call {
                return Err(SqlRejection::ForeignSchema(name));
            }
        }
        Ok(())
    }

    /// Walk every FROM / JOIN / TABLE item and check the table it names.
    fn check_from_items(&self, tokens: &[Token]) -> Result<(), SqlRejection> {
        for (i, token) in tokens.iter().enumerate() {
            if ["FROM", "JOIN", "TABLE"].iter().any(|k| is_keyword(token, k)) {
                self.check_from_list(tokens, i + 1)?;
            }
        }
        Ok(())
    }

    fn check_from_list(&self, tokens: &[Token], mut i: usize) -> Result<(), SqlRejection> {
        loop {
            while tokens
                .get(i)
                .is_some_and(|t| is_keyword(t, "LATERAL") || is_keyword(t, "ONLY"))
            {
                i += 1;
            }

            let Some(first) = tokens.get(i) else {
                return Ok(());
            };
            if first.kind == TokenKind::LParen {
                // A subquery's own FROM is reached by the outer loop. A
                // parenthesised join has none, so its leading item is
                // checked here.
                if !opens_subquery(tokens, i) {
                    self.check_from_list(tokens, i + 1)?;
                }
                i = skip_parens(tokens, i);
            } else {
                let mut parts = Vec::new();
                while let Some(name) = tokens.get(i).and_then(ident_name) {
                    parts.push(name);
                    i += 1;
                    if tokens.get(i).map(|t| &t.kind) == Some(&TokenKind::Dot) {
                        i += 1;
                    } else {
                        break;
                    }
                }

                if parts.is_empty() {
                    return Ok(());
                }

                if tokens.get(i).map(|t| &t.kind) == Some(&TokenKind::LParen) {
                    // Set-returning function, e.g. generate_series(1, 3).
                    self.check_function_reference(&parts)?;
                    i = skip_parens(tokens, i);
                } else {
                    self.check_table_reference(&parts)?;
                }
            }

            if tokens.get(i).is_some_and(|t| is_keyword(t, "AS")) {
                i += 1;
            }
            if tokens.get(i).is_some_and(is_alias) {
                i += 1;
            }
            if tokens.get(i).map(|t| &t.kind) == Some(&TokenKind::LParen) {
                i = skip_parens(tokens, i);
            }

            if tokens.get(i).map(|t| &t.kind) == Some(&TokenKind::Comma) {
                i += 1;
                continue;
            }
            return Ok(());
        }
    }

    fn check_function_reference(&self, parts: &[String]) -> Result<(), SqlRejection> {
        match parts {
            [_function] => Ok(()),
            [schema, _function] if *schema == self.schema => Ok(()),
            [schema, _function] => Err(SqlRejection::ForeignSchema(schema.clone())),
            _ => Err(SqlRejection::UnsupportedReference(parts.join("."))),
        }
    }

    fn check_table_reference(&self, parts: &[String]) -> Result<(), SqlRejection> {
        match parts {
            [table] => {
                if table.starts_with("pg_") && !self.allowed_catalogs.contains(table) {
                    return Err(SqlRejection::SensitiveCatalog(table.clone()));
                }
                Ok(())
            }
            [schema, _table] => {
                if *schema != self.schema {
                    return Err(SqlRejection::ForeignSchema(schema.clone()));
                }
                Ok(())
            }
            _ => Err(SqlRejection::UnsupportedReference(parts.join("."))),
        }
    }
}

fn check_statement_start(tokens: &[Token]) -> Result<(), SqlRejection> {
    let first = tokens
        .iter()
        .find(|t| t.kind != TokenKind::LParen)
        .ok_or(SqlRejection::Empty)?;

    if is_keyword(first, "SELECT") || is_keyword(first, "WITH") {
        return Ok(());
    }

    let found = match &first.kind {
        TokenKind::Word(w) => w.to_uppercase(),
        other => format!("{other:?}"),
    };
    Err(SqlRejection::NotAReadQuery(found))
}

fn check_keywords(tokens: &[Token]) -> Result<(), SqlRejection> {
    for token in tokens {
        if let TokenKind::Word(word) = &token.kind {
            let upper = word.to_uppercase();
            if FORBIDDEN_KEYWORDS.contains(&upper.as_str()) {
                return Err(SqlRejection::ForbiddenKeyword(upper));
            }
        }
    }
    Ok(())
}

fn check_functions(tokens: &[Token]) -> Result<(), SqlRejection> {
    for window in tokens.windows(2) {
        if window[1].kind != TokenKind::LParen {
            continue;
        }
        if let Some(name) = ident_name(&window[0]) {
            if DENIED_FUNCTIONS.contains(&name.as_str()) {
                return Err(SqlRejection::ForbiddenFunction(name));
            }
        }
    }
    Ok(())
}

/// Identifier as PostgreSQL resolves it: bare words fold to lowercase,
/// quoted identifiers are taken verbatim.
fn ident_name(token: &Token) -> Option<String> {
    match &token.kind {
        TokenKind::Word(w) => Some(w.to_lowercase()),
        TokenKind::QuotedIdent(q) => Some(q.clone()),
        _ => None,
    }
}

fn is_keyword(token: &Token, keyword: &str) -> bool {
    matches!(&token.kind, TokenKind::Word(w) if w.eq_ignore_ascii_case(keyword))
}

fn is_alias(token: &Token) -> bool {
    match &token.kind {
        TokenKind::Word(w) => !CLAUSE_KEYWORDS.contains(&w.to_uppercase().as_str()),
        TokenKind::QuotedIdent(_) => true,
        _ => false,
    }
}

/// Whether the group opening at `open` holds a query rather than a join.
fn opens_subquery(tokens: &[Token], open: usize) -> bool {
    tokens[open..]
        .iter()
        .find(|t| t.kind != TokenKind::LParen)
        .is_some_and(|t| ["SELECT", "WITH", "VALUES"].iter().any(|k| is_keyword(t, k)))
}

/// Index just past the parenthesised group opening at `open`.
fn skip_parens(tokens: &[Token], open: usize) -> usize {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    tokens.len()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::prompt::FALLBACK_SQL;

    fn policy() -> SqlPolicy {
        SqlPolicy::default()
    }

    #[test]
    fn accepts_single_select_with_trailing_semicolon() {
        let validated = policy().validate("SELECT 1;").unwrap();
        assert_eq!(validated.as_str(), "SELECT 1");
    }

    #[test]
    fn rejects_stacked_statements() {
        assert_matches!(
            policy().validate("SELECT * FROM patrimoni.actius; DROP TABLE patrimoni.actius;"),
            Err(SqlRejection::MultipleStatements)
        );
    }

    #[test]
    fn rejects_delete() {
        assert_matches!(
            policy().validate("DELETE FROM patrimoni.actius"),
            Err(SqlRejection::NotAReadQuery(k)) if k == "DELETE"
        );
    }

    #[test]
    fn rejects_other_schema() {
        assert_matches!(
            policy().validate("SELECT * FROM public.users"),
            Err(SqlRejection::ForeignSchema(s)) if s == "public"
        );
        assert_matches!(
            policy().validate("SELECT * FROM other.actius"),
            Err(SqlRejection::ForeignSchema(s)) if s == "other"
        );
        assert_matches!(
            policy().validate(r#"SELECT * FROM "public"."users""#),
            Err(SqlRejection::ForeignSchema(_))
        );
    }

    #[test]
    fn accepts_registry_queries() {
        let accepted = [
            "SELECT COUNT(*) AS total FROM patrimoni.actius WHERE subtipus = 'Dutxa'",
            "select guid, updated_at from patrimoni.actius order by updated_at desc limit 5",
            "SELECT a.guid, f.numero FROM patrimoni.actius a JOIN patrimoni.ifcdoor_fire f ON f.actiu_id = a.guid",
            "SELECT * FROM patrimoni.actius AS a, patrimoni.ifcspace s WHERE a.guid = s.guid",
            "WITH d AS (SELECT * FROM patrimoni.ifcdoor) SELECT COUNT(*) FROM d",
            "SELECT * FROM (SELECT guid FROM patrimoni.actius) AS sub",
            "SELECT EXTRACT(YEAR FROM created_at) FROM patrimoni.actius",
            "SELECT ';' AS semicolon, 'DROP TABLE x' AS text FROM patrimoni.actius",
            "  -- leading comment\n /* block */ SELECT 1",
            "SELECT * FROM actius",
            "SELECT n FROM generate_series(1, 3) AS g(n)",
            "(SELECT 1) UNION (SELECT 2)",
            FALLBACK_SQL,
        ];
        for sql in accepted {
            assert!(policy().is_allowed(sql), "should accept: {sql}: {:?}", policy().validate(sql));
        }
    }

    #[test]
    fn rejects_mutating_keywords_anywhere() {
        let rejected = [
            "SELECT * INTO patrimoni.copia FROM patrimoni.actius",
            "WITH d AS (DELETE FROM patrimoni.actius RETURNING *) SELECT * FROM d",
            "WITH u AS (UPDATE patrimoni.actius SET tipus = 'x' RETURNING *) SELECT 1",
            "SELECT * FROM patrimoni.actius FOR UPDATE",
            "select 1 where exists (select 1) and drop",
            "SELECT truncate FROM patrimoni.actius",
        ];
        for sql in rejected {
            assert_matches!(
                policy().validate(sql),
                Err(SqlRejection::ForbiddenKeyword(_)),
                "should reject: {sql}"
            );
        }
    }

    #[test]
    fn rejects_non_select_statements() {
        for sql in [
            "INSERT INTO patrimoni.actius (guid) VALUES ('x')",
            "UPDATE patrimoni.actius SET tipus = 'x'",
            "DROP TABLE patrimoni.actius",
            "TRUNCATE patrimoni.actius",
            "GRANT ALL ON patrimoni.actius TO public",
            "EXPLAIN ANALYZE SELECT 1",
            "VALUES (1)",
            "'SELECT 1'",
        ] {
            assert_matches!(
                policy().validate(sql),
                Err(SqlRejection::NotAReadQuery(_)),
                "should reject: {sql}"
            );
        }
    }

    #[test]
    fn rejects_empty_input() {
        for sql in ["", "   ", ";", "-- only a comment", "/* */ ;"] {
            assert_matches!(policy().validate(sql), Err(SqlRejection::Empty), "sql: {sql:?}");
        }
    }

    #[test]
    fn separators_hidden_from_naive_checks_are_found() {
        for sql in [
            "SELECT 1;/* */DROP TABLE patrimoni.actius",
            "SELECT '\\';DELETE FROM patrimoni.actius;--'",
            "SELECT 1;;",
            "SELECT 1; SELECT 2",
        ] {
            assert_matches!(
                policy().validate(sql),
                Err(SqlRejection::MultipleStatements),
                "should reject: {sql}"
            );
        }
    }

    #[test]
    fn literals_and_comments_do_not_hide_keywords_from_being_ignored() {
        // Inside literals these are data, not SQL.
        assert!(policy().is_allowed("SELECT E'\\';DROP TABLE x;--' AS t"));
        assert!(policy().is_allowed("SELECT $body$; DELETE FROM x$body$ AS t"));
        assert!(policy().is_allowed("SELECT 1 -- ; DROP TABLE patrimoni.actius"));
    }

    #[test]
    fn rejects_unterminated_quoting() {
        assert_matches!(policy().validate("SELECT 'x"), Err(SqlRejection::Lex(_)));
        assert_matches!(policy().validate("SELECT 1 /* ; DROP"), Err(SqlRejection::Lex(_)));
        assert_matches!(policy().validate("SELECT $a$ ; DROP"), Err(SqlRejection::Lex(_)));
    }

    #[test]
    fn rejects_denied_functions() {
        for sql in [
            "SELECT pg_sleep(10)",
            "SELECT PG_SLEEP (10)",
            r#"SELECT "pg_sleep"(10)"#,
            "SELECT pg_read_file('/etc/passwd')",
            "SELECT current_setting('data_directory')",
            "SELECT * FROM patrimoni.actius WHERE dblink('x', 'y') IS NULL",
        ] {
            assert_matches!(
                policy().validate(sql),
                Err(SqlRejection::ForbiddenFunction(_)),
                "should reject: {sql}"
            );
        }
    }

    #[test]
    fn rejects_system_catalogs() {
        assert_matches!(
            policy().validate("SELECT * FROM pg_shadow"),
            Err(SqlRejection::SensitiveCatalog(c)) if c == "pg_shadow"
        );
        assert_matches!(
            policy().validate("SELECT usename FROM patrimoni.actius, pg_user"),
            Err(SqlRejection::SensitiveCatalog(_))
        );
        assert_matches!(
            policy().validate("SELECT * FROM pg_catalog.pg_user"),
            Err(SqlRejection::ForeignSchema(s)) if s == "pg_catalog"
        );
        assert_matches!(
            policy().validate("SELECT table_name FROM information_schema.tables"),
            Err(SqlRejection::ForeignSchema(_))
        );
        assert_matches!(
            policy().validate("SELECT pg_catalog.version()"),
            Err(SqlRejection::ForeignSchema(_))
        );
    }

    #[test]
    fn parenthesised_joins_are_checked() {
        assert_matches!(
            policy().validate("SELECT * FROM (secret.users CROSS JOIN patrimoni.actius)"),
            Err(SqlRejection::ForeignSchema(s)) if s == "secret"
        );
        assert_matches!(
            policy().validate("SELECT * FROM ((pg_authid CROSS JOIN patrimoni.actius)) AS j"),
            Err(SqlRejection::SensitiveCatalog(c)) if c == "pg_authid"
        );
        assert_matches!(
            policy().validate(
                "SELECT * FROM (patrimoni.actius a JOIN patrimoni.ifcdoor d ON d.actiu_id = a.guid), other.t"
            ),
            Err(SqlRejection::ForeignSchema(s)) if s == "other"
        );
        assert!(policy().is_allowed(
            "SELECT * FROM (patrimoni.actius a JOIN patrimoni.ifcdoor d ON d.actiu_id = a.guid) AS j"
        ));
    }

    #[test]
    fn table_shorthand_is_checked() {
        assert_matches!(
            policy().validate("SELECT * FROM patrimoni.actius WHERE EXISTS (TABLE pg_shadow)"),
            Err(SqlRejection::SensitiveCatalog(c)) if c == "pg_shadow"
        );
        assert!(policy()
            .is_allowed("SELECT * FROM patrimoni.actius WHERE EXISTS (TABLE patrimoni.ifcdoor)"));
    }

    #[test]
    fn qualified_functions_must_use_the_registry_schema() {
        assert_matches!(
            policy().validate("SELECT * FROM secret.get_users()"),
            Err(SqlRejection::ForeignSchema(s)) if s == "secret"
        );
        assert_matches!(
            policy().validate("SELECT secret.leak(guid) FROM patrimoni.actius"),
            Err(SqlRejection::ForeignSchema(s)) if s == "secret"
        );
        assert_matches!(
            policy().validate("SELECT n FROM generate_series(1, 3) AS g(n), other.t"),
            Err(SqlRejection::ForeignSchema(s)) if s == "other"
        );
    }

    #[test]
    fn allow_listed_catalog_is_accepted() {
        let policy = SqlPolicy::default().allow_catalogs(["pg_stat_user_tables"]);
        assert!(policy.is_allowed("SELECT relname FROM pg_stat_user_tables"));
        assert!(!policy.is_allowed("SELECT * FROM pg_authid"));
    }

    #[test]
    fn rejects_three_part_names() {
        assert_matches!(
            policy().validate("SELECT * FROM db.patrimoni.actius"),
            Err(SqlRejection::UnsupportedReference(r)) if r == "db.patrimoni.actius"
        );
    }

    #[test]
    fn reason_codes_are_stable() {
        assert_eq!(SqlRejection::MultipleStatements.reason_code(), "multiple_statements");
        assert_eq!(
            SqlRejection::ForeignSchema("public".into()).reason_code(),
            "foreign_schema"
        );
    }

    /// Deterministic mutation fuzzing: dangerous statements disguised with
    /// random casing, whitespace and comments must all stay rejected.
    #[test]
    fn disguised_attacks_stay_rejected() {
        let attacks = [
            "select 1; drop table patrimoni.actius",
            "select * into patrimoni.x from patrimoni.actius",
            "delete from patrimoni.actius",
            "select * from public.users",
            "select pg_sleep(5)",
            "with x as (insert into patrimoni.actius(guid) values ('g') returning guid) select * from x",
            "select * from pg_authid",
            "select 1; update patrimoni.actius set tipus = null",
            "select * from (secret.users cross join patrimoni.actius)",
            "select * from (pg_authid cross join patrimoni.actius)",
            "select * from patrimoni.actius where exists (table pg_shadow)",
            "select * from secret.get_users()",
        ];
        let separators = [" ", "\n", "\t", " /* c */ ", "/**/", " --c\n "];

        let mut seed: u64 = 0x5eed_1234_abcd_0001;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as usize
        };

        for attack in attacks {
            for _ in 0..50 {
                let mut disguised = String::new();
                for (i, word) in attack.split(' ').enumerate() {
                    if i > 0 {
                        disguised.push_str(separators[next() % separators.len()]);
                    }
                    for c in word.chars() {
                        if next() % 2 == 0 {
                            disguised.extend(c.to_uppercase());
                        } else {
                            disguised.push(c);
                        }
                    }
                }
                assert!(
                    !policy().is_allowed(&disguised),
                    "disguised attack accepted: {disguised:?}"
                );
            }
        }
    }
}
