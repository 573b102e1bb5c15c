//! Goods feed files accepted by `ezbuy ingest`

use domain_goods::NewGood;
use eyre::{Result, WrapErr};
use serde::Deserialize;
use std::path::Path;

/// A bare array of goods, or a Graph API page with the goods under `data`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Feed {
    Goods(Vec<NewGood>),
    Page { data: Vec<NewGood> },
}

pub fn parse(raw: &str) -> Result<Vec<NewGood>> {
    let feed: Feed = serde_json::from_str(raw).wrap_err("feed is not a goods array or page")?;
    Ok(match feed {
        Feed::Goods(goods) | Feed::Page { data: goods } => goods,
    })
}

pub async fn load(path: &Path) -> Result<Vec<NewGood>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    parse(&raw).wrap_err_with(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let goods = parse(
            r#"[{"id": "p1", "message": "二手球拍", "update_time": "2018-06-01T10:00:00Z"}]"#,
        )
        .unwrap();
        assert_eq!(goods.len(), 1);
        assert_eq!(goods[0].id, "p1");
        assert_eq!(goods[0].update_time.to_rfc3339(), "2018-06-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_page_with_missing_message() {
        let goods = parse(
            r#"{"data": [{"id": "p2", "update_time": "2018-06-01T10:00:00+08:00"}], "paging": {}}"#,
        )
        .unwrap();
        assert_eq!(goods[0].message, "");
        assert_eq!(goods[0].update_time.to_rfc3339(), "2018-06-01T02:00:00+00:00");
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(parse(r#"{"goods": []}"#).is_err());
        assert!(parse(r#"[{"message": "no id"}]"#).is_err());
    }
}
