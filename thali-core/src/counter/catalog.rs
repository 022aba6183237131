//! Counter catalog
//!
//! 商品编码在“可售”商品中唯一（不区分大小写）；下架商品的编码可以复用。

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{CounterItem, CounterItemCreate, CounterItemUpdate};
use std::sync::Arc;

use crate::store::{Collection, DocumentStore, DocumentStoreExt, Query, Record, TenantScope};
use crate::utils::money::validate_price;
use crate::utils::validation::{
    MAX_CODE_LEN, MAX_NAME_LEN, validate_optional_text, validate_required_text,
};

/// Counter item repository
#[derive(Clone)]
pub struct CounterCatalog {
    store: Arc<dyn DocumentStore>,
}

impl CounterCatalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All items ordered by name
    pub async fn list(&self, scope: &TenantScope) -> AppResult<Vec<Record<CounterItem>>> {
        let mut items = self
            .store
            .list_as::<CounterItem>(scope, Collection::CounterItems, &Query::all())
            .await?;
        items.sort_by(|a, b| a.data.name.to_lowercase().cmp(&b.data.name.to_lowercase()));
        Ok(items)
    }

    pub async fn available(&self, scope: &TenantScope) -> AppResult<Vec<Record<CounterItem>>> {
        let mut items = self.list(scope).await?;
        items.retain(|r| r.data.availability);
        Ok(items)
    }

    pub async fn add(&self, scope: &TenantScope, data: CounterItemCreate) -> AppResult<String> {
        let item = CounterItem {
            name: data.name.trim().to_string(),
            name_local: normalize_optional(data.name_local),
            price: data.price,
            code: normalize_optional(data.code),
            availability: true,
        };
        validate_item(&item)?;
        self.ensure_code_unique(scope, &item, None).await?;

        let id = self
            .store
            .add_as(scope, Collection::CounterItems, &item)
            .await?;
        tracing::info!(tenant = %scope, id = %id, name = %item.name, "Counter item created");
        Ok(id)
    }

    pub async fn update(
        &self,
        scope: &TenantScope,
        id: &str,
        data: CounterItemUpdate,
    ) -> AppResult<CounterItem> {
        let mut item = self.get(scope, id).await?;
        if let Some(name) = data.name {
            item.name = name.trim().to_string();
        }
        if let Some(name_local) = data.name_local {
            item.name_local = normalize_optional(Some(name_local));
        }
        if let Some(price) = data.price {
            item.price = price;
        }
        if let Some(code) = data.code {
            item.code = normalize_optional(Some(code));
        }
        if let Some(availability) = data.availability {
            item.availability = availability;
        }
        validate_item(&item)?;
        self.ensure_code_unique(scope, &item, Some(id)).await?;

        self.store
            .set_as(scope, Collection::CounterItems, id, &item)
            .await?;
        tracing::debug!(tenant = %scope, id, "Counter item updated");
        Ok(item)
    }

    pub async fn set_availability(
        &self,
        scope: &TenantScope,
        id: &str,
        availability: bool,
    ) -> AppResult<CounterItem> {
        self.update(
            scope,
            id,
            CounterItemUpdate {
                availability: Some(availability),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete(&self, scope: &TenantScope, id: &str) -> AppResult<()> {
        self.store
            .delete(scope, Collection::CounterItems, id)
            .await?;
        tracing::info!(tenant = %scope, id, "Counter item deleted");
        Ok(())
    }

    async fn get(&self, scope: &TenantScope, id: &str) -> AppResult<CounterItem> {
        self.store
            .get_as::<CounterItem>(scope, Collection::CounterItems, id)
            .await?
            .map(|r| r.data)
            .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound).with_detail("id", id))
    }

    async fn ensure_code_unique(
        &self,
        scope: &TenantScope,
        item: &CounterItem,
        self_id: Option<&str>,
    ) -> AppResult<()> {
        let Some(code) = item.code.as_deref() else {
            return Ok(());
        };
        if !item.availability {
            return Ok(());
        }
        let existing = self.available(scope).await?;
        let taken = existing.iter().any(|r| {
            Some(r.id.as_str()) != self_id
                && r.data
                    .code
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(code))
        });
        if taken {
            return Err(AppError::with_message(
                ErrorCode::ProductCodeExists,
                format!("Code {} is already used by an available item", code),
            ));
        }
        Ok(())
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_item(item: &CounterItem) -> AppResult<()> {
    validate_required_text(&item.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&item.name_local, "nameLocal", MAX_NAME_LEN)?;
    validate_optional_text(&item.code, "code", MAX_CODE_LEN)?;
    validate_price(item.price, "price")?;
    Ok(())
}

/// Multi-code search
///
/// 输入按空格拆分，任一编码片段（不区分大小写）是商品编码的子串即命中；
/// 空输入不返回任何商品。
pub fn search<'a>(items: &'a [Record<CounterItem>], input: &str) -> Vec<&'a Record<CounterItem>> {
    let codes: Vec<String> = input
        .split_whitespace()
        .map(|c| c.to_lowercase())
        .collect();
    if codes.is_empty() {
        return Vec::new();
    }
    items
        .iter()
        .filter(|r| {
            r.data.code.as_deref().is_some_and(|code| {
                let code = code.to_lowercase();
                codes.iter().any(|c| code.contains(c.as_str()))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn create(name: &str, price: f64, code: Option<&str>) -> CounterItemCreate {
        CounterItemCreate {
            name: name.into(),
            name_local: None,
            price,
            code: code.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_code_unique_among_available() {
        let catalog = CounterCatalog::new(Arc::new(MemoryStore::new()));
        let t = TenantScope::new("t1");

        let tea = catalog.add(&t, create("Tea", 10.0, Some("T1"))).await.unwrap();
        let err = catalog
            .add(&t, create("Masala Tea", 15.0, Some("t1")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductCodeExists);

        // 下架后编码可复用
        catalog.set_availability(&t, &tea, false).await.unwrap();
        catalog
            .add(&t, create("Masala Tea", 15.0, Some("T1")))
            .await
            .unwrap();

        // 重新上架会冲突
        let err = catalog.set_availability(&t, &tea, true).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductCodeExists);
    }

    #[tokio::test]
    async fn test_validation_and_update() {
        let catalog = CounterCatalog::new(Arc::new(MemoryStore::new()));
        let t = TenantScope::new("t1");
        let err = catalog.add(&t, create("  ", 10.0, None)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
        let err = catalog.add(&t, create("Tea", -1.0, None)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);

        let id = catalog.add(&t, create("Tea", 10.0, None)).await.unwrap();
        let updated = catalog
            .update(
                &t,
                &id,
                CounterItemUpdate {
                    price: Some(12.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 12.0);

        catalog.delete(&t, &id).await.unwrap();
        let err = catalog
            .update(&t, &id, CounterItemUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
    }

    #[test]
    fn test_multi_code_search() {
        let item = |id: &str, code: Option<&str>| Record {
            id: id.into(),
            data: CounterItem {
                name: id.into(),
                name_local: None,
                price: 10.0,
                code: code.map(String::from),
                availability: true,
            },
        };
        let items = vec![
            item("tea", Some("T1")),
            item("samosa", Some("S12")),
            item("vada", None),
        ];
        let hits: Vec<_> = search(&items, "t1  s1")
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(hits, vec!["tea", "samosa"]);
        assert!(search(&items, "   ").is_empty());
    }
}
