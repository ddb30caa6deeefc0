//! Query parameters, the dynamic query builder and pagination utilities
//!
//! [`build_query`] turns the raw, untrusted [`QueryParams`] of a list request
//! into a [`QuerySpec`] that is safe to hand to any
//! [`DocumentStore`](crate::core::store::DocumentStore):
//!
//! - search only ever touches fields from the resource's allowlist,
//! - sorting only ever uses the allowlist plus `created_at` and `id`,
//! - the search text is escaped so it always matches literally,
//! - the page window is clamped into a sane range.
//!
//! ```rust,ignore
//! // GET /users?search=alice&fields=username,email
//! // GET /users?orderByField=username&orderBy=asc
//! // GET /users?page=2&limit=20
//! let spec = build_query(&params, Account::search_config(), &paging);
//! ```

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hard upper bound for the page size, whatever the configuration says
pub const MAX_PAGE_LIMIT: usize = 100;

/// Page size used when a request does not ask for a usable one
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Fields every resource can be sorted by, on top of its search allowlist
pub const IMPLICIT_SORT_FIELDS: &[&str] = &["created_at", "id"];

/// Characters with a special meaning in pattern syntax
const PATTERN_SPECIAL_CHARS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// Raw query-string directives of a list request
///
/// Every value is kept as text: nothing here is trusted, and parsing failures
/// degrade to defaults inside [`build_query`] instead of rejecting the request.
///
/// # Example
/// ```text
/// search=alice&fields=username,email&orderByField=username&orderBy=desc&page=2&limit=10
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryParams {
    /// Free text matched as a substring against the selected fields
    pub search: Option<String>,

    /// Comma-separated field names restricting the search
    pub fields: Option<String>,

    /// Field to sort by (ignored unless allowlisted)
    pub order_by_field: Option<String>,

    /// `asc` or `desc`, case-insensitive
    pub order_by: Option<String>,

    /// Page number (starts at 1)
    pub page: Option<String>,

    /// Number of items per page
    pub limit: Option<String>,
}

impl QueryParams {
    /// Resolved page number, floored to 1
    pub fn page(&self) -> usize {
        parse_positive(self.page.as_deref()).unwrap_or(1)
    }

    /// Resolved page size, clamped into `[1, paging.max_limit()]`
    pub fn limit(&self, paging: &PagingConfig) -> usize {
        parse_positive(self.limit.as_deref())
            .unwrap_or(paging.default_limit)
            .clamp(1, paging.max_limit())
    }

    /// Sort direction requested by `orderBy`
    pub fn direction(&self) -> SortDirection {
        match self.order_by.as_deref() {
            Some(dir) if dir.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

/// Parse a strictly positive integer, rejecting anything else
fn parse_positive(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
}

/// Deployment-wide paging defaults
///
/// This is the single authority for the default page size: services pass it
/// to [`build_query`] instead of keeping a default of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Page size used when the request gives none (or an unusable one)
    pub default_limit: usize,

    /// Largest page size a request may ask for (never above [`MAX_PAGE_LIMIT`])
    pub max_limit: usize,
}

impl PagingConfig {
    /// Effective upper bound, always within `[1, MAX_PAGE_LIMIT]`
    pub fn max_limit(&self) -> usize {
        self.max_limit.clamp(1, MAX_PAGE_LIMIT)
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

/// Sort direction for one sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Document-store convention: `1` ascending, `-1` descending
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// One entry of an ordered sort specification
pub type SortKey = (&'static str, SortDirection);

/// Per-resource search configuration
///
/// Field names are compile-time constants. Caller input only ever *selects*
/// among them, so no request can reach a field outside the allowlist.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSearchConfig {
    /// Fields eligible for text search (and sorting)
    pub allowlist: &'static [&'static str],

    /// Field holding telephone numbers, searched by digits only
    pub phone_field: Option<&'static str>,

    /// Whether search patterns ignore case
    pub case_insensitive: bool,

    /// Sort applied when the request asks for none
    pub default_sort: &'static [SortKey],
}

impl ResourceSearchConfig {
    /// Newest first
    pub const DEFAULT_SORT: &'static [SortKey] = &[("created_at", SortDirection::Desc)];

    pub const fn new(allowlist: &'static [&'static str]) -> Self {
        Self {
            allowlist,
            phone_field: None,
            case_insensitive: true,
            default_sort: Self::DEFAULT_SORT,
        }
    }

    pub const fn with_phone_field(self, field: &'static str) -> Self {
        Self {
            phone_field: Some(field),
            ..self
        }
    }

    pub const fn case_sensitive(self) -> Self {
        Self {
            case_insensitive: false,
            ..self
        }
    }

    pub const fn with_default_sort(self, default_sort: &'static [SortKey]) -> Self {
        Self {
            default_sort,
            ..self
        }
    }

    /// Look a caller-supplied name up in the search allowlist
    pub fn searchable(&self, name: &str) -> Option<&'static str> {
        self.allowlist.iter().copied().find(|f| *f == name)
    }

    /// Look a caller-supplied name up in the sort allowlist
    pub fn sortable(&self, name: &str) -> Option<&'static str> {
        self.searchable(name)
            .or_else(|| IMPLICIT_SORT_FIELDS.iter().copied().find(|f| *f == name))
    }
}

/// Substring match of one field against an escaped pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCondition {
    pub field: &'static str,
    /// Already escaped: matches the search text literally
    pub pattern: String,
    pub case_insensitive: bool,
}

impl FieldCondition {
    pub fn to_regex(&self) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&self.pattern)
            .case_insensitive(self.case_insensitive)
            .build()
    }
}

/// Disjunction of field conditions; empty means "match everything"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    any_of: Vec<FieldCondition>,
}

impl Filter {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn any_of(conditions: Vec<FieldCondition>) -> Self {
        Self { any_of: conditions }
    }

    pub fn is_match_all(&self) -> bool {
        self.any_of.is_empty()
    }

    pub fn conditions(&self) -> &[FieldCondition] {
        &self.any_of
    }

    /// Compile every pattern once, for stores that evaluate filters themselves
    pub fn compile(&self) -> Result<CompiledFilter, regex::Error> {
        let any_of = self
            .any_of
            .iter()
            .map(|c| Ok((c.field, c.to_regex()?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(CompiledFilter { any_of })
    }
}

/// A [`Filter`] ready to be evaluated against JSON documents
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    any_of: Vec<(&'static str, Regex)>,
}

impl CompiledFilter {
    pub fn matches(&self, document: &Value) -> bool {
        if self.any_of.is_empty() {
            return true;
        }

        self.any_of.iter().any(|(field, regex)| {
            match document.get(*field) {
                Some(Value::String(s)) => regex.is_match(s),
                Some(Value::Number(n)) => regex.is_match(&n.to_string()),
                _ => false,
            }
        })
    }
}

/// Normalized, safe-to-execute description of a list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub filter: Filter,
    pub sort: Vec<SortKey>,
    pub limit: usize,
    pub skip: usize,
    pub page: usize,
}

/// Escape every pattern-special character so `input` matches literally
pub fn escape_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if PATTERN_SPECIAL_CHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Strip everything but ASCII digits (`"084-123-4567"` -> `"0841234567"`)
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Translate request parameters into a [`QuerySpec`]
///
/// Never fails: malformed input falls back to no filter, the default sort,
/// page 1 and the default page size.
pub fn build_query(
    params: &QueryParams,
    config: &ResourceSearchConfig,
    paging: &PagingConfig,
) -> QuerySpec {
    let fields = select_fields(params.fields.as_deref(), config);
    let filter = build_filter(params.search.as_deref(), &fields, config);
    let sort = resolve_sort(params, config);

    let limit = params.limit(paging);
    let page = params.page();
    let skip = (page - 1).saturating_mul(limit);

    tracing::debug!(
        conditions = filter.conditions().len(),
        ?sort,
        limit,
        skip,
        "built list query"
    );

    QuerySpec {
        filter,
        sort,
        limit,
        skip,
        page,
    }
}

/// Intersect the requested field list with the allowlist
///
/// The requested order is kept; without a request the whole allowlist is used.
fn select_fields(requested: Option<&str>, config: &ResourceSearchConfig) -> Vec<&'static str> {
    let Some(requested) = requested else {
        return config.allowlist.to_vec();
    };

    let mut selected: Vec<&'static str> = Vec::new();
    for field in requested.split(',').filter_map(|f| config.searchable(f.trim())) {
        if !selected.contains(&field) {
            selected.push(field);
        }
    }
    selected
}

fn build_filter(
    search: Option<&str>,
    fields: &[&'static str],
    config: &ResourceSearchConfig,
) -> Filter {
    let raw = search.map(str::trim).unwrap_or_default();
    if raw.is_empty() || fields.is_empty() {
        return Filter::match_all();
    }

    let digits = digits_only(raw);
    let conditions = fields
        .iter()
        .map(|&field| {
            let text = if config.phone_field == Some(field) && !digits.is_empty() {
                digits.as_str()
            } else {
                raw
            };
            FieldCondition {
                field,
                pattern: escape_pattern(text),
                case_insensitive: config.case_insensitive,
            }
        })
        .collect();

    Filter::any_of(conditions)
}

fn resolve_sort(params: &QueryParams, config: &ResourceSearchConfig) -> Vec<SortKey> {
    let mut sort = config.default_sort.to_vec();

    let Some(field) = params
        .order_by_field
        .as_deref()
        .and_then(|f| config.sortable(f.trim()))
    else {
        return sort;
    };

    let direction = params.direction();
    match sort.iter_mut().find(|(f, _)| *f == field) {
        Some(entry) => entry.1 = direction,
        None => sort.push((field, direction)),
    }
    sort
}

/// Envelope returned by every list operation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    /// Number of matching records, ignoring paging
    pub total: u64,

    /// `ceil(total / limit)`, 0 when nothing matched
    pub last_page: u64,

    /// Page that was served (starts at 1)
    pub curr_page: u64,

    /// Records of the served page
    pub rows: Vec<T>,
}

impl<T> PaginatedResult<T> {
    pub fn new(rows: Vec<T>, total: u64, spec: &QuerySpec) -> Self {
        // limit is at least 1 after build_query, max() only guards hand-built specs
        let limit = spec.limit.max(1) as u64;

        Self {
            total,
            last_page: total.div_ceil(limit),
            curr_page: spec.page as u64,
            rows,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            total: self.total,
            last_page: self.last_page,
            curr_page: self.curr_page,
            rows: self.rows.into_iter().map(f).collect(),
        }
    }
}
