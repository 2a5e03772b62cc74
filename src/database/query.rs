use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Text,
    Bool,
    Timestamp,
}

/// 资源中允许过滤、排序和投影的字段
///
/// 名称同时是 JSON 字段名和数据库列名，只有枚举出的字段才会进入 SQL。
pub trait Column: Copy + Eq + std::fmt::Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    fn kind(self) -> ColumnKind;

    fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int(i64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl FilterValue {
    fn parse(kind: ColumnKind, raw: &str) -> Option<Self> {
        match kind {
            ColumnKind::Int => raw.trim().parse().ok().map(FilterValue::Int),
            ColumnKind::Text => Some(FilterValue::Text(raw.to_string())),
            ColumnKind::Bool => match raw.trim() {
                "true" | "1" => Some(FilterValue::Bool(true)),
                "false" | "0" => Some(FilterValue::Bool(false)),
                _ => None,
            },
            ColumnKind::Timestamp => DateTime::parse_from_rfc3339(raw.trim())
                .ok()
                .map(|t| FilterValue::Timestamp(t.with_timezone(&Utc))),
        }
    }

    /// 与序列化后的字段值比较
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FilterValue::Int(expected) => value.as_i64() == Some(*expected),
            FilterValue::Text(expected) => value.as_str() == Some(expected.as_str()),
            FilterValue::Bool(expected) => value.as_bool() == Some(*expected),
            FilterValue::Timestamp(expected) => json_time(value) == Some(*expected),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// 列表接口的原始查询参数
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ListParams {
    /// 过滤条件 `col1:v1,col2:v2`
    pub query: Option<String>,
    /// 返回字段 `col1,col2`
    pub fields: Option<String>,
    /// 排序字段 `col1,col2`
    pub sortby: Option<String>,
    /// 与排序字段对应的方向 `desc,asc`，只给一个时作用于所有排序字段
    pub order: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// 校验后的列表查询
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<C> {
    pub filters: Vec<(C, FilterValue)>,
    pub fields: Vec<C>,
    pub sort: Vec<(C, SortOrder)>,
    pub limit: i64,
    pub offset: i64,
}

impl<C: Column> Default for ListQuery<C> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            fields: Vec::new(),
            sort: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// 解析 `k:v,k:v` 形式的过滤条件，只按第一个冒号切分
pub fn parse_filter_pairs(raw: &str) -> Result<BTreeMap<String, String>, AppError> {
    let mut pairs = BTreeMap::new();
    for cond in raw.split(',') {
        let Some((k, v)) = cond.split_once(':') else {
            return Err(AppError::InvalidQuery("invalid query key/value pair".into()));
        };
        pairs.insert(k.to_string(), v.to_string());
    }
    Ok(pairs)
}

fn split_list(raw: Option<&str>) -> Vec<&str> {
    match raw {
        Some(s) if !s.is_empty() => s.split(',').map(str::trim).collect(),
        _ => Vec::new(),
    }
}

fn parse_column<C: Column>(name: &str) -> Result<C, AppError> {
    C::parse(name).ok_or_else(|| AppError::InvalidQuery(format!("unknown field '{}'", name)))
}

fn parse_order(raw: &str) -> Result<SortOrder, AppError> {
    match raw {
        "asc" => Ok(SortOrder::Asc),
        "desc" => Ok(SortOrder::Desc),
        _ => Err(AppError::InvalidQuery(
            "Invalid order. Must be either [asc|desc]".into(),
        )),
    }
}

impl<C: Column> ListQuery<C> {
    pub fn from_params(params: &ListParams) -> Result<Self, AppError> {
        let mut filters = Vec::new();
        if let Some(raw) = params.query.as_deref().filter(|s| !s.is_empty()) {
            for (key, raw_value) in parse_filter_pairs(raw)? {
                let column: C = parse_column(&key)?;
                let value = FilterValue::parse(column.kind(), &raw_value).ok_or_else(|| {
                    AppError::InvalidQuery(format!("invalid value '{}' for '{}'", raw_value, key))
                })?;
                filters.push((column, value));
            }
        }

        let fields = split_list(params.fields.as_deref())
            .into_iter()
            .map(parse_column)
            .collect::<Result<Vec<C>, _>>()?;

        let sortby = split_list(params.sortby.as_deref());
        let order = split_list(params.order.as_deref());
        let mut sort = Vec::with_capacity(sortby.len());
        if !sortby.is_empty() {
            if sortby.len() == order.len() {
                for (field, dir) in sortby.iter().zip(&order) {
                    sort.push((parse_column(field)?, parse_order(dir)?));
                }
            } else if order.len() == 1 {
                let dir = parse_order(order[0])?;
                for field in &sortby {
                    sort.push((parse_column(field)?, dir));
                }
            } else {
                return Err(AppError::InvalidQuery(
                    "'sortby', 'order' sizes mismatch or 'order' size is not 1".into(),
                ));
            }
        } else if !order.is_empty() {
            return Err(AppError::InvalidQuery("unused 'order' fields".into()));
        }

        let limit = params
            .limit
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_LIMIT);
        let offset = params
            .offset
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v >= 0)
            .unwrap_or(0);

        Ok(Self {
            filters,
            fields,
            sort,
            limit,
            offset,
        })
    }

    /// 在内存中完成过滤、排序和分页，行按 id 升序传入
    pub fn apply(&self, rows: Vec<Value>) -> Vec<Value> {
        let mut rows: Vec<Value> = rows
            .into_iter()
            .filter(|row| {
                self.filters
                    .iter()
                    .all(|(column, value)| value.matches(&row[column.name()]))
            })
            .collect();

        rows.sort_by(|a, b| {
            self.sort
                .iter()
                .map(|(column, dir)| {
                    let ord = compare(column.kind(), &a[column.name()], &b[column.name()]);
                    match dir {
                        SortOrder::Asc => ord,
                        SortOrder::Desc => ord.reverse(),
                    }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        rows.into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

fn json_time(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn compare(kind: ColumnKind, a: &Value, b: &Value) -> Ordering {
    match kind {
        ColumnKind::Int => a.as_i64().cmp(&b.as_i64()),
        ColumnKind::Text => a.as_str().cmp(&b.as_str()),
        ColumnKind::Bool => a.as_bool().cmp(&b.as_bool()),
        ColumnKind::Timestamp => json_time(a).cmp(&json_time(b)),
    }
}

/// 按请求的字段裁剪每一行，未指定字段时原样返回
pub fn project<T: Serialize, C: Column>(rows: Vec<T>, fields: &[C]) -> Result<Vec<Value>, AppError> {
    rows.into_iter()
        .map(|row| {
            let value = serde_json::to_value(row).map_err(|e| AppError::Internal(e.to_string()))?;
            match value {
                Value::Object(mut map) if !fields.is_empty() => Ok(Value::Object(
                    fields
                        .iter()
                        .filter_map(|c| map.remove_entry(c.name()))
                        .collect::<Map<String, Value>>(),
                )),
                other => Ok(other),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::database::models::PostColumn;

    fn params(query: &str, fields: &str, sortby: &str, order: &str) -> ListParams {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        ListParams {
            query: opt(query),
            fields: opt(fields),
            sortby: opt(sortby),
            order: opt(order),
            ..ListParams::default()
        }
    }

    #[test]
    fn filter_pairs_resolve_to_map() {
        let pairs = parse_filter_pairs("status:1,type:2").unwrap();
        let expected: BTreeMap<String, String> = [("status", "1"), ("type", "2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(pairs, expected);

        // 只按第一个冒号切分
        let pairs = parse_filter_pairs("title:a:b").unwrap();
        assert_eq!(pairs["title"], "a:b");
    }

    #[test]
    fn pair_without_colon_is_rejected() {
        let err = parse_filter_pairs("badpair").unwrap_err();
        assert_eq!(err.to_string(), "Error: invalid query key/value pair");
        let err = parse_filter_pairs("status:1,badpair").unwrap_err();
        assert!(matches!(err, AppError::InvalidQuery(_)));
    }

    #[test]
    fn typed_filters_and_defaults() {
        let query = ListQuery::<PostColumn>::from_params(&params("status:1,type:2", "", "", "")).unwrap();
        assert_eq!(
            query.filters,
            vec![
                (PostColumn::Status, FilterValue::Int(1)),
                (PostColumn::Type, FilterValue::Int(2)),
            ]
        );
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.offset, 0);

        assert!(ListQuery::<PostColumn>::from_params(&params("status:abc", "", "", "")).is_err());
        assert!(ListQuery::<PostColumn>::from_params(&params("password:x", "", "", "")).is_err());
    }

    #[test]
    fn unparsable_paging_falls_back_to_defaults() {
        let mut p = ListParams::default();
        p.limit = Some("many".into());
        p.offset = Some("5".into());
        let query = ListQuery::<PostColumn>::from_params(&p).unwrap();
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.offset, 5);
    }

    #[test]
    fn order_is_positional_or_broadcast() {
        let query =
            ListQuery::<PostColumn>::from_params(&params("", "", "likes,id", "desc,asc")).unwrap();
        assert_eq!(
            query.sort,
            vec![(PostColumn::Likes, SortOrder::Desc), (PostColumn::Id, SortOrder::Asc)]
        );

        let query = ListQuery::<PostColumn>::from_params(&params("", "", "likes,id", "desc")).unwrap();
        assert_eq!(
            query.sort,
            vec![(PostColumn::Likes, SortOrder::Desc), (PostColumn::Id, SortOrder::Desc)]
        );
    }

    #[test]
    fn order_rules_are_enforced() {
        let cases = [
            (params("", "", "likes,id,visit", "desc,asc"), "sizes mismatch"),
            (params("", "", "likes", ""), "sizes mismatch"),
            (params("", "", "", "desc"), "unused 'order' fields"),
            (params("", "", "likes", "up"), "Must be either [asc|desc]"),
        ];
        for (p, fragment) in cases {
            let err = ListQuery::<PostColumn>::from_params(&p).unwrap_err();
            assert!(err.to_string().contains(fragment), "{}", err);
        }
    }

    #[test]
    fn apply_filters_sorts_and_pages() {
        let rows = vec![
            json!({"id": 1, "status": 1, "likes": 3}),
            json!({"id": 2, "status": 0, "likes": 9}),
            json!({"id": 3, "status": 1, "likes": 7}),
            json!({"id": 4, "status": 1, "likes": 7}),
        ];
        let mut query =
            ListQuery::<PostColumn>::from_params(&params("status:1", "", "likes", "desc")).unwrap();
        let ids: Vec<i64> = query.apply(rows.clone()).iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![3, 4, 1]);

        query.offset = 1;
        query.limit = 1;
        let ids: Vec<i64> = query.apply(rows).iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn projection_keeps_requested_fields_only() {
        #[derive(Serialize)]
        struct Row {
            id: i64,
            title: &'static str,
            status: i32,
        }
        let rows = vec![Row { id: 1, title: "hello", status: 1 }];
        let projected = project(rows, &[PostColumn::Title, PostColumn::Id]).unwrap();
        assert_eq!(projected, vec![json!({"id": 1, "title": "hello"})]);
    }
}
